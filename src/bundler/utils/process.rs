//! External tool invocation.

use crate::bundler::error::{Error, Result};
use std::ffi::OsStr;
use std::process::Output;
use tokio::process::Command;

/// Runs `program` with `args` and waits for it to finish.
///
/// Spawn failures map to [`Error::CommandFailed`], non-zero exits to
/// [`Error::ToolFailed`] carrying the trimmed stderr. On success the full
/// output is returned, since some tools (codesign) report on stderr.
pub async fn run<I, S>(program: &str, args: I) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args);
    log::debug!("Running {:?}", cmd.as_std());

    let output = cmd.output().await.map_err(|error| Error::CommandFailed {
        command: program.to_string(),
        error,
    })?;

    if !output.status.success() {
        return Err(Error::ToolFailed {
            command: program.to_string(),
            stderr: failure_message(&output),
        });
    }

    Ok(output)
}

/// Runs `program` and returns its stdout as a string.
pub async fn run_stdout<I, S>(program: &str, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = run(program, args).await?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr.to_string()
    }
}
