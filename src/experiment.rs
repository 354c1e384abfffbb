// src/experiment.rs
//! Lifecycle Controller: mount → workload → unmount → collect.
//!
//! The crux is teardown discipline: once the mount succeeds, unmount and
//! scratch-directory removal run on every exit path before any workload
//! error propagates. A mount that never happened is never unmounted, but the
//! scratch directory still goes away.

use anyhow::{Context, Result};
use tempfile::Builder;
use tracing::{error, info};

use crate::artifacts::{ExperimentMetadata, RunDir};
use crate::config::ExperimentConfig;
use crate::constants;
use crate::{mount, workload};

/// Run one experiment end to end, returning the composed metadata record.
///
/// On return, successful or not, the scratch mount point no longer exists
/// and no mount is active under it. At most one experiment runs per call;
/// nothing here is reentrant.
pub fn run(cfg: &ExperimentConfig, run: &RunDir) -> Result<ExperimentMetadata> {
    info!("Experiment starting");

    // Fresh, uniquely named mount point under the run directory. The guard
    // removes it on drop, so no early exit can leak the directory; the
    // deliberate paths close it explicitly so removal failures surface.
    let scratch = Builder::new()
        .prefix("mnt-")
        .suffix(constants::MOUNT_DIR_SUFFIX)
        .tempdir_in(run.path())
        .context("create scratch mount point")?;

    let (handle, mp_version) = match mount::mount(cfg, run, scratch.path()) {
        Ok(mounted) => mounted,
        Err(err) => {
            // Nothing got mounted: skip unmount, drop the scratch directory,
            // and let the mount error through.
            if let Err(close_err) = scratch.close() {
                error!(
                    "Failed to remove scratch mount point after mount failure: {:#}",
                    close_err
                );
            }
            return Err(err);
        }
    };
    info!(
        "Mounted {} at {} (mount PID {})",
        cfg.s3_bucket,
        handle.mount_point().display(),
        handle.pid()
    );

    // The workload outcome must not short-circuit teardown: compute it,
    // tear everything down, and only then decide which error wins.
    let outcome = workload::run(cfg, run, handle.mount_point());

    let unmounted = mount::unmount(cfg, handle);
    let removed = scratch.close().context("remove scratch mount point");
    let teardown = unmounted.and(removed);

    let result = match (outcome, teardown) {
        (Ok(result), Ok(())) => result,
        // Workload failed; teardown worked. Propagate the workload error.
        (Err(workload_err), Ok(())) => return Err(workload_err),
        // Workload fine, but we leaked something. That must surface loudly.
        (Ok(_), Err(teardown_err)) => return Err(teardown_err),
        // Both failed: the workload error is the primary one, but the
        // teardown failure is never silently dropped.
        (Err(workload_err), Err(teardown_err)) => {
            error!(
                "Teardown after failed workload also failed: {:#}",
                teardown_err
            );
            return Err(workload_err);
        }
    };

    let metadata = ExperimentMetadata::compose(&result, mp_version)?;
    run.collect_logs()?;
    run.write_metadata(&metadata)?;

    info!("Experiment complete");
    Ok(metadata)
}
