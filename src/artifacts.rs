// src/artifacts.rs
//! Run directory management and post-run artifact handling.
//!
//! One directory per experiment holds everything the run produces:
//! - metadata.json (timing + mount tool version)
//! - mountpoint-s3.log (relocated mount tool log)
//! - fio-output.json (fio's native output, unparsed)
//! - mount-s3.pid (the readiness signal from the mount tool)

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants;
use crate::error::HarnessError;
use crate::workload::WorkloadResult;

/// Metadata record for one successful experiment. Immutable once composed,
/// written exactly once, all fields as text.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExperimentMetadata {
    pub start_time: String,
    pub end_time: String,
    pub elapsed: String,
    pub mp_version: String,
}

impl ExperimentMetadata {
    /// Compose the record from workload timing and the mount tool version.
    /// A workload that ended before it started means some clock contract was
    /// broken, and the record is refused.
    pub fn compose(result: &WorkloadResult, mp_version: String) -> Result<Self> {
        let elapsed = result.elapsed().to_std().map_err(|_| {
            HarnessError::Integrity(format!(
                "workload ended ({}) before it started ({})",
                result.ended_at, result.started_at
            ))
        })?;
        Ok(Self {
            start_time: result.started_at.to_rfc3339(),
            end_time: result.ended_at.to_rfc3339(),
            elapsed: humantime::format_duration(elapsed).to_string(),
            mp_version,
        })
    }
}

/// The output directory for one experiment and the well-known paths inside it.
#[derive(Debug, Clone)]
pub struct RunDir {
    path: PathBuf,
}

impl RunDir {
    /// Create a timestamped run directory under `base`:
    /// mpbench-{YYYYMMDD}-{HHMM}
    pub fn create(base: &Path) -> Result<Self> {
        let dir_name = format!(
            "{}-{}",
            constants::RUN_DIR_PREFIX,
            Local::now().format("%Y%m%d-%H%M")
        );
        Self::at(base.join(dir_name))
    }

    /// Adopt `path` as the run directory, creating it if needed.
    pub fn at(path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&path)
            .with_context(|| format!("create run directory {}", path.display()))?;
        info!("Run directory: {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The mount tool's private log directory for this run.
    pub fn mount_logs_dir(&self) -> PathBuf {
        self.path.join(constants::MOUNT_LOGS_DIR)
    }

    /// Where the mount tool must write its PID.
    pub fn pid_file_path(&self) -> PathBuf {
        self.path.join(constants::PID_FILE_NAME)
    }

    /// Where fio writes its JSON output.
    pub fn fio_output_path(&self) -> PathBuf {
        self.path.join(constants::FIO_OUTPUT_FILE)
    }

    /// Final resting place of the mount tool log after collection.
    pub fn final_log_path(&self) -> PathBuf {
        self.path.join(constants::FINAL_MOUNT_LOG)
    }

    /// The metadata record.
    pub fn metadata_path(&self) -> PathBuf {
        self.path.join(constants::METADATA_FILE)
    }

    /// Move the mount tool's log file to its final well-known name and drop
    /// the then-empty log directory.
    ///
    /// Exactly one entry in the log directory is the contract; zero or many
    /// aborts with nothing renamed.
    pub fn collect_logs(&self) -> Result<()> {
        let logs_dir = self.mount_logs_dir();
        let entries: Vec<PathBuf> = fs::read_dir(&logs_dir)
            .with_context(|| format!("read mount log directory {}", logs_dir.display()))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()
            .with_context(|| format!("read mount log directory {}", logs_dir.display()))?;

        if entries.len() != 1 {
            return Err(HarnessError::integrity(format!(
                "expected exactly one log file in {}, found {}",
                logs_dir.display(),
                entries.len()
            )));
        }

        let final_path = self.final_log_path();
        debug!("Renaming {} to {}", entries[0].display(), final_path.display());
        fs::rename(&entries[0], &final_path).with_context(|| {
            format!(
                "rename {} to {}",
                entries[0].display(),
                final_path.display()
            )
        })?;
        fs::remove_dir(&logs_dir)
            .with_context(|| format!("remove {}", logs_dir.display()))?;
        Ok(())
    }

    /// Serialize the metadata record. Whole file or error.
    pub fn write_metadata(&self, metadata: &ExperimentMetadata) -> Result<()> {
        let path = self.metadata_path();
        let json = serde_json::to_string(metadata).context("serialize metadata")?;
        fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
        info!("Wrote {}", path.display());
        Ok(())
    }
}
