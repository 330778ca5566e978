use std::process::Output;

use tokio::process::Command;

use crate::domain::ports::probe::ProbeError;

/// Runs `program` to completion. The child is killed if the future is
/// dropped (probe timeout, budget, interrupt).
///
/// A missing binary maps to `ProbeError::Unavailable`; the exit status is
/// left to the caller.
pub(crate) async fn run(program: &str, args: &[&str]) -> Result<Output, ProbeError> {
    Command::new(program)
        .args(args)
        .env("LC_ALL", "C")
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProbeError::Unavailable(format!("{program} not found"))
            } else {
                ProbeError::CommandFailed(format!("failed to run {program}: {e}"))
            }
        })
}

/// Like [`run`], but a non-zero exit is an error and stdout is returned as text.
pub(crate) async fn stdout_of(program: &str, args: &[&str]) -> Result<String, ProbeError> {
    let output = run(program, args).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProbeError::CommandFailed(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
