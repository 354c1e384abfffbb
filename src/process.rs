// src/process.rs
//! Checked subprocess invocation.
//!
//! Every external tool the harness drives goes through [`check_output`]:
//! block until the child exits, capture its output, and turn a non-zero exit
//! into a [`HarnessError::Execution`] carrying the captured stderr.

use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::HarnessError;

/// Run `cmd` to completion and return its stdout as UTF-8 text.
///
/// The child inherits the harness environment plus whatever the caller set
/// on `cmd`. Stdout and stderr are both captured; stderr only surfaces in
/// the error on a non-zero exit.
pub fn check_output(cmd: &mut Command) -> Result<String> {
    let command = render(cmd);
    debug!("Running: {}", command);

    let output = cmd
        .output()
        .with_context(|| format!("failed to launch `{}`", command))?;

    if !output.status.success() {
        return Err(HarnessError::Execution {
            command,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    String::from_utf8(output.stdout)
        .with_context(|| format!("`{}` produced non-UTF-8 output", command))
}

/// The command line as one displayable string, for logs and error messages.
pub fn render(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
