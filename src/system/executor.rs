// src/system/executor.rs

use crate::constants::SCRIPT_FILE_PREFIX;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, ExitStatus, Stdio};
use tempfile::TempPath;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Could not create a temporary script file: {0}")]
    TempFile(#[source] std::io::Error),
    #[error("Could not write the script to '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Shell '{shell}' could not be started: {source}")]
    Spawn {
        shell: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Script exited with a non-zero status ({code}).")]
    ScriptFailed { code: i32 },
}

/// Writes `content` to a fresh temporary file. The file is removed when the
/// returned path is dropped or closed.
pub fn write_script(content: &str) -> Result<TempPath, ExecutionError> {
    let mut file = tempfile::Builder::new()
        .prefix(SCRIPT_FILE_PREFIX)
        .suffix(".sh")
        .tempfile()
        .map_err(ExecutionError::TempFile)?;

    file.write_all(content.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|source| ExecutionError::Write {
            path: file.path().to_path_buf(),
            source,
        })?;

    // Closing the handle keeps the file on disk until the TempPath goes away.
    Ok(file.into_temp_path())
}

/// Runs `content` as a script under `shell` and waits for it.
///
/// The child inherits stdin, stdout and stderr, so interactive programs work as if
/// typed in the terminal. The temporary file is deleted once the shell exits,
/// whatever its status.
pub fn run_script(content: &str, shell: &Path) -> Result<ExitStatus, ExecutionError> {
    let script = write_script(content)?;
    log::debug!(
        "Running script '{}' with '{}'",
        script.display(),
        shell.display()
    );

    let status = StdCommand::new(shell)
        .arg(script.as_os_str())
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| ExecutionError::Spawn {
            shell: shell.to_path_buf(),
            source,
        });

    if let Err(e) = script.close() {
        log::warn!("Failed to remove temporary script: {}", e);
    }

    status
}

/// Like `run_script`, but a non-zero exit becomes `ExecutionError::ScriptFailed`.
pub fn execute_script(content: &str, shell: &Path) -> Result<(), ExecutionError> {
    let status = run_script(content, shell)?;
    log::debug!("Script finished with {}", status);
    if status.success() {
        return Ok(());
    }
    Err(ExecutionError::ScriptFailed {
        code: exit_code(status),
    })
}

/// The code to exit with after a child finished with `status`. A child killed
/// by a signal maps to `128 + signal`, as shells report it.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
