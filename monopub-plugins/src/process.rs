//! Child process helpers.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Output;

use monopub_core::error::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// Runs `program` in `cwd` and returns its trimmed stdout.
///
/// A spawn failure or a non-zero exit becomes a plugin error for `plugin`
/// carrying the captured stderr.
pub(crate) async fn run<I, S>(
    plugin: &str,
    program: &str,
    args: I,
    cwd: &Path,
    envs: &[(&str, &str)],
) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args).current_dir(cwd).kill_on_drop(true);
    for (key, value) in envs {
        command.env(key, value);
    }
    debug!("Running {:?} in {}", command.as_std(), cwd.display());

    let output = command
        .output()
        .await
        .map_err(|e| Error::plugin(plugin, format!("Failed to run {}: {}", program, e)))?;
    check_status(plugin, program, output)
}

fn check_status(plugin: &str, program: &str, output: Output) -> Result<String> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => format!("{} exited with {}", program, output.status),
            stderr => format!("{} exited with {}: {}", program, output.status, stderr),
        };
        return Err(Error::plugin(plugin, message));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
