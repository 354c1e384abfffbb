// src/constants.rs
//
// Central location for all constants used throughout mp-bench
// Keeps the external tool contracts (flag values, file names, environment
// variables) in one place instead of scattered through the call sites.

// =============================================================================
// Mount tool contract
// =============================================================================

/// Environment variable naming the file where the mount tool must write its
/// own process id once the mount is ready.
pub const PID_FILE_ENV: &str = "PID_FILE";

/// File the mount tool writes its PID into, under the run directory.
pub const PID_FILE_NAME: &str = "mount-s3.pid";

/// Private log directory handed to the mount tool via --log-directory.
/// Owned by the tool for the duration of the mount; must hold exactly one
/// file by the time logs are collected.
pub const MOUNT_LOGS_DIR: &str = "mp_logs";

/// Fixed --write-part-size value (16 MiB).
pub const WRITE_PART_SIZE: u64 = 16777216;

/// Fixed --upload-checksums value.
pub const UPLOAD_CHECKSUMS: &str = "off";

/// Suffix for the uniquely named scratch mount point directory.
pub const MOUNT_DIR_SUFFIX: &str = ".mountpoint-s3";

// =============================================================================
// Workload contracts
// =============================================================================

/// Total data-size target handed to fio via the SIZE_GIB environment variable.
pub const FIO_SIZE_GIB: u32 = 100;

/// fio's native JSON output, left in the run directory unparsed.
pub const FIO_OUTPUT_FILE: &str = "fio-output.json";

/// Default location of the fio binary.
/// User can override via config: fio_binary
pub const DEFAULT_FIO_BINARY: &str = "/usr/bin/fio";

/// Default fio job description file, resolved relative to the invocation
/// directory. User can override via config: fio_job_file
pub const DEFAULT_FIO_JOB_FILE: &str = "sequential_read.fio";

/// Default shell used to run the dd benchmark script.
/// User can override via config: bash_binary
pub const DEFAULT_BASH_BINARY: &str = "/usr/bin/bash";

/// Default dd benchmark script, resolved relative to the invocation
/// directory. User can override via config: dd_script
pub const DEFAULT_DD_SCRIPT: &str = "dd_bench.bash";

// =============================================================================
// Teardown
// =============================================================================

/// Default location of the system unmount binary.
/// User can override via config: umount_binary
pub const DEFAULT_UMOUNT_BINARY: &str = "/usr/bin/umount";

// =============================================================================
// Artifacts
// =============================================================================

/// Final metadata record, written once per successful experiment.
pub const METADATA_FILE: &str = "metadata.json";

/// Final resting name of the mount tool's log file after collection.
pub const FINAL_MOUNT_LOG: &str = "mountpoint-s3.log";

/// Prefix for the timestamped run directory: mpbench-{YYYYMMDD}-{HHMM}
pub const RUN_DIR_PREFIX: &str = "mpbench";
