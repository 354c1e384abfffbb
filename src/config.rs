// src/config.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// One experiment, fully described. Immutable once loaded; validated once at
/// startup so nothing deep in the run can trip over a bad field.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExperimentConfig {
    /// Bucket to mount.
    pub s3_bucket: String,

    /// Optional key prefix exposed at the mount root.
    #[serde(default)]
    pub s3_prefix: Option<String>,

    /// Path to the Mountpoint binary.
    pub mountpoint_binary: PathBuf,

    /// Metadata/cache TTL handed to the mount tool (e.g. "60s", "5m").
    /// Rendered in whole seconds on the mount command line.
    #[serde(with = "humantime_serde")]
    pub metadata_ttl: Duration,

    /// Mount tool debug logging (--debug).
    #[serde(default)]
    pub mountpoint_debug: bool,

    /// CRT transport debug logging (--debug-crt).
    #[serde(default)]
    pub mountpoint_debug_crt: bool,

    /// Cap on the mount tool's FUSE worker threads (--max-threads).
    #[serde(default)]
    pub fuse_threads: Option<u32>,

    /// Optional network interface binding and throughput cap.
    #[serde(default)]
    pub network: Option<NetworkConfig>,

    /// Which synthetic workload to drive against the mount.
    pub workload: WorkloadKind,

    /// Worker count handed to the workload tool.
    pub application_workers: u32,

    /// Ask the workload to use direct I/O.
    #[serde(default)]
    pub direct_io: bool,

    /// Block after mounting until the operator presses Enter, so an external
    /// profiler can attach to the mount process first.
    #[serde(default)]
    pub wait_for_perf_attach: bool,

    /// Location of the fio binary.
    #[serde(default = "default_fio_binary")]
    pub fio_binary: PathBuf,

    /// fio job description file.
    #[serde(default = "default_fio_job_file")]
    pub fio_job_file: PathBuf,

    /// Shell used to run the dd benchmark script.
    #[serde(default = "default_bash_binary")]
    pub bash_binary: PathBuf,

    /// The dd benchmark script.
    #[serde(default = "default_dd_script")]
    pub dd_script: PathBuf,

    /// System unmount binary.
    #[serde(default = "default_umount_binary")]
    pub umount_binary: PathBuf,
}

/// Network binding for the mount tool.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NetworkConfig {
    /// Interfaces the mount tool binds its connections to (--bind, repeated).
    pub interface_names: Vec<String>,

    /// Aggregate throughput cap across the bound interfaces
    /// (--maximum-throughput-gbps).
    #[serde(default)]
    pub maximum_throughput_gbps: Option<u32>,
}

/// The known workload variants. Anything else in the config file is rejected
/// at deserialization time, before any side effect.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    Fio,
    Dd,
}

impl WorkloadKind {
    pub fn name(&self) -> &'static str {
        match self {
            WorkloadKind::Fio => "fio",
            WorkloadKind::Dd => "dd",
        }
    }
}

impl ExperimentConfig {
    /// Load a config from a YAML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let buf = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Self = serde_yaml::from_slice(&buf)
            .map_err(|e| HarnessError::Config(format!("{}: {}", path.display(), e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject impossible experiments before anything side-effecting runs.
    pub fn validate(&self) -> Result<()> {
        if self.application_workers == 0 {
            return Err(HarnessError::config("application_workers must be at least 1"));
        }
        if self.metadata_ttl.as_secs() == 0 {
            // The mount flag carries whole seconds.
            return Err(HarnessError::config(
                "metadata_ttl must be at least one second",
            ));
        }
        if !self.mountpoint_binary.is_file() {
            return Err(HarnessError::config(format!(
                "mountpoint binary not found: {}",
                self.mountpoint_binary.display()
            )));
        }
        if !self.umount_binary.is_file() {
            return Err(HarnessError::config(format!(
                "umount binary not found: {}",
                self.umount_binary.display()
            )));
        }
        match self.workload {
            WorkloadKind::Fio => {
                if !self.fio_binary.is_file() {
                    return Err(HarnessError::config(format!(
                        "fio binary not found: {}",
                        self.fio_binary.display()
                    )));
                }
                if !self.fio_job_file.is_file() {
                    return Err(HarnessError::config(format!(
                        "fio job file not found: {}",
                        self.fio_job_file.display()
                    )));
                }
            }
            WorkloadKind::Dd => {
                if !self.bash_binary.is_file() {
                    return Err(HarnessError::config(format!(
                        "bash binary not found: {}",
                        self.bash_binary.display()
                    )));
                }
                if !self.dd_script.is_file() {
                    return Err(HarnessError::config(format!(
                        "dd script not found: {}",
                        self.dd_script.display()
                    )));
                }
            }
        }
        if let Some(network) = &self.network {
            if network.interface_names.is_empty() {
                return Err(HarnessError::config(
                    "network.interface_names must name at least one interface",
                ));
            }
            if network.maximum_throughput_gbps == Some(0) {
                return Err(HarnessError::config(
                    "network.maximum_throughput_gbps must be positive",
                ));
            }
        }
        Ok(())
    }
}

fn default_fio_binary() -> PathBuf {
    PathBuf::from(crate::constants::DEFAULT_FIO_BINARY)
}

fn default_fio_job_file() -> PathBuf {
    PathBuf::from(crate::constants::DEFAULT_FIO_JOB_FILE)
}

fn default_bash_binary() -> PathBuf {
    PathBuf::from(crate::constants::DEFAULT_BASH_BINARY)
}

fn default_dd_script() -> PathBuf {
    PathBuf::from(crate::constants::DEFAULT_DD_SCRIPT)
}

fn default_umount_binary() -> PathBuf {
    PathBuf::from(crate::constants::DEFAULT_UMOUNT_BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_YAML: &str = r#"
s3_bucket: bench-bucket
mountpoint_binary: /opt/mount-s3
metadata_ttl: 60s
workload: fio
application_workers: 8
"#;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let cfg: ExperimentConfig = serde_yaml::from_str(MINIMAL_YAML).unwrap();
        assert_eq!(cfg.s3_bucket, "bench-bucket");
        assert_eq!(cfg.workload, WorkloadKind::Fio);
        assert_eq!(cfg.metadata_ttl, Duration::from_secs(60));
        assert_eq!(cfg.application_workers, 8);
        assert!(!cfg.direct_io);
        assert!(!cfg.mountpoint_debug);
        assert!(!cfg.wait_for_perf_attach);
        assert!(cfg.s3_prefix.is_none());
        assert!(cfg.network.is_none());
        assert_eq!(cfg.fio_binary, PathBuf::from("/usr/bin/fio"));
        assert_eq!(cfg.umount_binary, PathBuf::from("/usr/bin/umount"));
    }

    #[test]
    fn unknown_workload_is_rejected_at_parse_time() {
        let yaml = MINIMAL_YAML.replace("workload: fio", "workload: zzz");
        let err = serde_yaml::from_str::<ExperimentConfig>(&yaml).unwrap_err();
        assert!(err.to_string().contains("zzz"), "unexpected error: {err}");
    }

    #[test]
    fn load_maps_parse_failures_to_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiment.yaml");
        std::fs::write(&path, MINIMAL_YAML.replace("workload: fio", "workload: zzz")).unwrap();

        let err = ExperimentConfig::load(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Config(_))
        ));
    }

    #[test]
    fn network_section_parses() {
        let yaml = format!(
            "{}network:\n  interface_names: [ens5, ens6]\n  maximum_throughput_gbps: 100\n",
            MINIMAL_YAML
        );
        let cfg: ExperimentConfig = serde_yaml::from_str(&yaml).unwrap();
        let network = cfg.network.unwrap();
        assert_eq!(network.interface_names, vec!["ens5", "ens6"]);
        assert_eq!(network.maximum_throughput_gbps, Some(100));
    }

    fn existing_file(dir: &std::path::Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "").unwrap();
        path
    }

    fn valid_config(dir: &std::path::Path) -> ExperimentConfig {
        ExperimentConfig {
            s3_bucket: "bench-bucket".to_string(),
            s3_prefix: None,
            mountpoint_binary: existing_file(dir, "mount-s3"),
            metadata_ttl: Duration::from_secs(60),
            mountpoint_debug: false,
            mountpoint_debug_crt: false,
            fuse_threads: None,
            network: None,
            workload: WorkloadKind::Dd,
            application_workers: 4,
            direct_io: false,
            wait_for_perf_attach: false,
            fio_binary: existing_file(dir, "fio"),
            fio_job_file: existing_file(dir, "job.fio"),
            bash_binary: existing_file(dir, "bash"),
            dd_script: existing_file(dir, "dd_bench.bash"),
            umount_binary: existing_file(dir, "umount"),
        }
    }

    #[test]
    fn validate_accepts_a_complete_config() {
        let dir = tempfile::tempdir().unwrap();
        valid_config(dir.path()).validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = valid_config(dir.path());
        cfg.application_workers = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("application_workers"));
    }

    #[test]
    fn validate_rejects_subsecond_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = valid_config(dir.path());
        cfg.metadata_ttl = Duration::from_millis(200);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("metadata_ttl"));
    }

    #[test]
    fn validate_rejects_missing_mountpoint_binary() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = valid_config(dir.path());
        cfg.mountpoint_binary = dir.path().join("no-such-binary");
        let err = cfg.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Config(_))
        ));
    }

    #[test]
    fn validate_rejects_missing_dd_script() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = valid_config(dir.path());
        cfg.dd_script = dir.path().join("no-such-script");
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("dd script"));
    }

    #[test]
    fn validate_rejects_empty_interface_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = valid_config(dir.path());
        cfg.network = Some(NetworkConfig {
            interface_names: vec![],
            maximum_throughput_gbps: None,
        });
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("interface_names"));
    }
}
