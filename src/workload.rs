// src/workload.rs
//! Workload Runner: interchangeable fio / dd drivers.
//!
//! Each variant is one blocking subprocess invocation bracketed by wall-clock
//! timestamps. The invoked tool may fan out its own workers; this harness
//! models none of that and only keeps the start/end instants.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::artifacts::RunDir;
use crate::config::{ExperimentConfig, WorkloadKind};
use crate::constants;
use crate::process;

/// Wall-clock bracket around one workload invocation.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadResult {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl WorkloadResult {
    /// Derived, never stored. The metadata writer refuses a negative value.
    pub fn elapsed(&self) -> chrono::Duration {
        self.ended_at - self.started_at
    }
}

/// Run the configured workload against the mount and return its timing.
pub fn run(cfg: &ExperimentConfig, run: &RunDir, mount_point: &Path) -> Result<WorkloadResult> {
    match cfg.workload {
        WorkloadKind::Fio => run_fio(cfg, run, mount_point),
        WorkloadKind::Dd => run_dd(cfg, mount_point),
    }
}

fn run_fio(cfg: &ExperimentConfig, run: &RunDir, mount_point: &Path) -> Result<WorkloadResult> {
    let mut cmd = Command::new(&cfg.fio_binary);
    cmd.args(fio_args(cfg, run, mount_point))
        .envs(fio_env(cfg));
    invoke("FIO", &mut cmd)
}

fn run_dd(cfg: &ExperimentConfig, mount_point: &Path) -> Result<WorkloadResult> {
    let mut cmd = Command::new(&cfg.bash_binary);
    cmd.args(dd_args(cfg, mount_point));
    invoke("DD", &mut cmd)
}

/// fio flags plus the job file, with the JSON output routed into the run
/// directory.
fn fio_args(cfg: &ExperimentConfig, run: &RunDir, mount_point: &Path) -> Vec<String> {
    vec![
        format!("--output={}", run.fio_output_path().display()),
        "--output-format=json".to_string(),
        "--eta=never".to_string(),
        format!("--directory={}", mount_point.display()),
        cfg.fio_job_file.display().to_string(),
    ]
}

/// The job file reads its knobs from the environment.
fn fio_env(cfg: &ExperimentConfig) -> Vec<(&'static str, String)> {
    vec![
        ("NUMJOBS", cfg.application_workers.to_string()),
        ("SIZE_GIB", constants::FIO_SIZE_GIB.to_string()),
        ("DIRECT", direct_io_flag(cfg.direct_io).to_string()),
    ]
}

/// The dd script takes everything positionally: mount path, worker count,
/// direct-I/O toggle.
fn dd_args(cfg: &ExperimentConfig, mount_point: &Path) -> Vec<String> {
    vec![
        cfg.dd_script.display().to_string(),
        mount_point.display().to_string(),
        cfg.application_workers.to_string(),
        direct_io_flag(cfg.direct_io).to_string(),
    ]
}

/// `1`/`0` toggle shared by both drivers.
fn direct_io_flag(direct_io: bool) -> &'static str {
    if direct_io {
        "1"
    } else {
        "0"
    }
}

/// Blocking invocation with the shared timestamp-capture discipline.
fn invoke(label: &str, cmd: &mut Command) -> Result<WorkloadResult> {
    debug!("Running {} workload: {}", label, process::render(cmd));
    let started_at = Utc::now();
    info!("{} workload starting now at {}", label, started_at);
    process::check_output(cmd).with_context(|| format!("{} workload failed", label))?;
    let ended_at = Utc::now();
    info!("{} workload complete now at {}", label, ended_at);
    Ok(WorkloadResult {
        started_at,
        ended_at,
    })
}
