use std::future::Future;
use std::time::Duration;

use anyhow::Context;

/// How long shutdown waits for blocking work still running after the report
/// is out. A probe stuck in a syscall (a hung NFS `statvfs`) is abandoned.
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

/// Runs `future` to completion on a fresh multi-thread runtime and shuts the
/// runtime down without waiting on abandoned `spawn_blocking` tasks beyond
/// [`SHUTDOWN_GRACE`].
///
/// # Errors
///
/// Returns an error if the runtime cannot be built.
pub fn run_to_completion<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    Ok(output)
}
