// src/mount.rs
//! Mount Manager: drives the Mountpoint binary and owns the readiness
//! contract around it.
//!
//! The tool is expected to background itself and return from the foreground
//! invocation only once mounted, writing its PID to the file named by the
//! PID_FILE environment variable. A missing PID file after a successful
//! invocation is an integrity failure, not a retryable condition.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::artifacts::RunDir;
use crate::config::ExperimentConfig;
use crate::constants;
use crate::error::HarnessError;
use crate::process;

/// An active mount.
///
/// Created only by [`mount`] and consumed by [`unmount`]; the move keeps a
/// torn-down handle from being used twice.
#[derive(Debug)]
pub struct MountHandle {
    mount_point: PathBuf,
    pid: u32,
    logs_dir: PathBuf,
}

impl MountHandle {
    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }
}

/// Mount the configured bucket at `mount_point`.
///
/// Returns the handle plus the tool's `--version` output. The version query
/// must succeed before anything is mounted; a tool that cannot report its
/// version fails the whole experiment up front.
pub fn mount(
    cfg: &ExperimentConfig,
    run: &RunDir,
    mount_point: &Path,
) -> Result<(MountHandle, String)> {
    if !cfg.mountpoint_binary.is_file() {
        return Err(HarnessError::config(format!(
            "mountpoint binary not found: {}",
            cfg.mountpoint_binary.display()
        )));
    }

    // Fresh, single-use log directory. A leftover from an earlier run would
    // break the exactly-one-file collection contract, so pre-existing is an
    // error here rather than something to merge into.
    let logs_dir = run.mount_logs_dir();
    fs::create_dir(&logs_dir)
        .with_context(|| format!("create mount log directory {}", logs_dir.display()))?;

    let version = process::check_output(Command::new(&cfg.mountpoint_binary).arg("--version"))
        .context("query mountpoint version")?
        .trim()
        .to_string();
    info!("Mountpoint version: {}", version);

    let pid_file = run.pid_file_path();
    let mut cmd = Command::new(&cfg.mountpoint_binary);
    cmd.args(mount_args(cfg, mount_point, &logs_dir))
        .env(constants::PID_FILE_ENV, &pid_file);

    info!(
        "Mounting S3 bucket {} using the following command: {}",
        cfg.s3_bucket,
        process::render(&cmd)
    );
    let stdout = process::check_output(&mut cmd)?;
    if !stdout.trim().is_empty() {
        info!("From Mountpoint: {}", stdout.trim());
    }

    let pid = read_pid_file(&pid_file)?;
    debug!("Mountpoint PID: {}", pid);

    if cfg.wait_for_perf_attach {
        pause_for_attach(pid)?;
    }

    Ok((
        MountHandle {
            mount_point: mount_point.to_path_buf(),
            pid,
            logs_dir,
        },
        version,
    ))
}

/// Tear the mount down. Consumes the handle.
///
/// A failure here is a leaked mount and escalates to the caller; it is never
/// downgraded to a warning.
pub fn unmount(cfg: &ExperimentConfig, handle: MountHandle) -> Result<()> {
    process::check_output(Command::new(&cfg.umount_binary).arg(&handle.mount_point))
        .with_context(|| format!("unmount {}", handle.mount_point.display()))?;
    info!("{} unmounted", handle.mount_point.display());
    Ok(())
}

/// The mount tool argument vector: positional bucket and mount point, then
/// the fixed flags, then the conditional ones. Kept pure so the flag
/// combinations stay testable.
fn mount_args(cfg: &ExperimentConfig, mount_point: &Path, logs_dir: &Path) -> Vec<String> {
    let mut args = vec![
        cfg.s3_bucket.clone(),
        mount_point.display().to_string(),
        format!("--metadata-ttl={}", cfg.metadata_ttl.as_secs()),
        "--log-metrics".to_string(),
        format!("--log-directory={}", logs_dir.display()),
        format!("--write-part-size={}", constants::WRITE_PART_SIZE),
        format!("--upload-checksums={}", constants::UPLOAD_CHECKSUMS),
    ];
    if let Some(prefix) = &cfg.s3_prefix {
        args.push(format!("--prefix={}", prefix));
    }
    if cfg.mountpoint_debug {
        args.push("--debug".to_string());
    }
    if cfg.mountpoint_debug_crt {
        args.push("--debug-crt".to_string());
    }
    if let Some(threads) = cfg.fuse_threads {
        args.push(format!("--max-threads={}", threads));
    }
    if let Some(network) = &cfg.network {
        for interface in &network.interface_names {
            args.push(format!("--bind={}", interface));
        }
        if let Some(gbps) = network.maximum_throughput_gbps {
            args.push(format!("--maximum-throughput-gbps={}", gbps));
        }
    }
    args
}

fn read_pid_file(path: &Path) -> Result<u32> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            return Err(HarnessError::integrity(format!(
                "mountpoint reported success but its PID file {} is unreadable: {}",
                path.display(),
                err
            )));
        }
    };
    contents.trim().parse::<u32>().map_err(|_| {
        HarnessError::Integrity(format!(
            "PID file {} does not contain a PID: {:?}",
            path.display(),
            contents.trim()
        ))
        .into()
    })
}

/// Deliberate synchronous suspension point: block until the operator presses
/// Enter so a profiler can attach to the mount process first. No timeout;
/// only a signal to the whole harness gets past it.
fn pause_for_attach(pid: u32) -> Result<()> {
    info!(
        "Mountpoint is running with PID {}. Press Enter to start the workload...",
        pid
    );
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("read confirmation from stdin")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NetworkConfig, WorkloadKind};
    use std::time::Duration;

    fn base_config() -> ExperimentConfig {
        ExperimentConfig {
            s3_bucket: "bench-bucket".to_string(),
            s3_prefix: None,
            mountpoint_binary: PathBuf::from("/opt/mount-s3"),
            metadata_ttl: Duration::from_secs(60),
            mountpoint_debug: false,
            mountpoint_debug_crt: false,
            fuse_threads: None,
            network: None,
            workload: WorkloadKind::Fio,
            application_workers: 8,
            direct_io: false,
            wait_for_perf_attach: false,
            fio_binary: PathBuf::from("/usr/bin/fio"),
            fio_job_file: PathBuf::from("sequential_read.fio"),
            bash_binary: PathBuf::from("/usr/bin/bash"),
            dd_script: PathBuf::from("dd_bench.bash"),
            umount_binary: PathBuf::from("/usr/bin/umount"),
        }
    }

    #[test]
    fn minimal_args_carry_the_fixed_flags_in_order() {
        let args = mount_args(&base_config(), Path::new("/mnt/x"), Path::new("/runs/mp_logs"));
        assert_eq!(
            args,
            vec![
                "bench-bucket",
                "/mnt/x",
                "--metadata-ttl=60",
                "--log-metrics",
                "--log-directory=/runs/mp_logs",
                "--write-part-size=16777216",
                "--upload-checksums=off",
            ]
        );
    }

    #[test]
    fn optional_flags_appear_only_when_configured() {
        let mut cfg = base_config();
        cfg.s3_prefix = Some("runs/a/".to_string());
        cfg.mountpoint_debug = true;
        cfg.mountpoint_debug_crt = true;
        cfg.fuse_threads = Some(16);

        let args = mount_args(&cfg, Path::new("/mnt/x"), Path::new("/runs/mp_logs"));
        assert!(args.contains(&"--prefix=runs/a/".to_string()));
        assert!(args.contains(&"--debug".to_string()));
        assert!(args.contains(&"--debug-crt".to_string()));
        assert!(args.contains(&"--max-threads=16".to_string()));
    }

    #[test]
    fn network_binding_repeats_bind_per_interface() {
        let mut cfg = base_config();
        cfg.network = Some(NetworkConfig {
            interface_names: vec!["ens5".to_string(), "ens6".to_string()],
            maximum_throughput_gbps: Some(100),
        });

        let args = mount_args(&cfg, Path::new("/mnt/x"), Path::new("/runs/mp_logs"));
        let binds: Vec<_> = args.iter().filter(|a| a.starts_with("--bind=")).collect();
        assert_eq!(binds, vec!["--bind=ens5", "--bind=ens6"]);
        assert!(args.contains(&"--maximum-throughput-gbps=100".to_string()));
    }

    #[test]
    fn throughput_cap_is_omitted_without_a_value() {
        let mut cfg = base_config();
        cfg.network = Some(NetworkConfig {
            interface_names: vec!["ens5".to_string()],
            maximum_throughput_gbps: None,
        });

        let args = mount_args(&cfg, Path::new("/mnt/x"), Path::new("/runs/mp_logs"));
        assert!(!args.iter().any(|a| a.starts_with("--maximum-throughput")));
    }

    #[test]
    fn pid_file_parse_failures_are_integrity_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("mount-s3.pid");
        let err = read_pid_file(&missing).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Integrity(_))
        ));

        let garbage = dir.path().join("garbage.pid");
        fs::write(&garbage, "not-a-pid\n").unwrap();
        let err = read_pid_file(&garbage).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Integrity(_))
        ));

        let good = dir.path().join("good.pid");
        fs::write(&good, "4242\n").unwrap();
        assert_eq!(read_pid_file(&good).unwrap(), 4242);
    }
}
