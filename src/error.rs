// src/error.rs
//! Failure taxonomy for one experiment run.
//!
//! Propagation runs through `anyhow` like everywhere else in the crate;
//! these variants mark which contract was broken, so callers and tests can
//! tell the categories apart with `downcast_ref`.

use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    /// Bad or missing configuration. Caught before side effects wherever
    /// the information is available that early.
    #[error("configuration error: {0}")]
    Config(String),

    /// An external tool exited unsuccessfully.
    #[error("`{command}` failed ({status}): {stderr}")]
    Execution {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    /// An external tool claimed success but violated its contract: no PID
    /// file after mounting, wrong log-file count at collection time, a
    /// workload that ended before it started.
    #[error("integrity error: {0}")]
    Integrity(String),
}

impl HarnessError {
    pub fn config(msg: impl Into<String>) -> anyhow::Error {
        HarnessError::Config(msg.into()).into()
    }

    pub fn integrity(msg: impl Into<String>) -> anyhow::Error {
        HarnessError::Integrity(msg.into()).into()
    }
}
