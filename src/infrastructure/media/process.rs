use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// How long a killed child gets to exit before we stop waiting for it.
const KILL_GRACE: Duration = Duration::from_secs(2);

pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug)]
pub enum ToolRunError {
    Spawn(std::io::Error),
    NonZero { code: Option<i32>, stderr: String },
    TimedOut,
    Cancelled,
}

/// Run one external tool to completion, bounded by `timeout` and the
/// cancellation token. Output pipes are drained concurrently so a chatty
/// child cannot deadlock on a full pipe. On timeout or cancellation the
/// child is killed and given `KILL_GRACE` to be reaped.
pub async fn run_tool(
    mut command: Command,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<ToolOutput, ToolRunError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(ToolRunError::Spawn)?;

    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let stdout_task = tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(pipe) = stdout_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut buf).await;
        }
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut buf).await;
        }
        buf
    });

    let status = tokio::select! {
        status = child.wait() => status.map_err(ToolRunError::Spawn)?,
        _ = tokio::time::sleep(timeout) => {
            kill_with_grace(&mut child).await;
            return Err(ToolRunError::TimedOut);
        }
        _ = cancel.cancelled() => {
            kill_with_grace(&mut child).await;
            return Err(ToolRunError::Cancelled);
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    if status.success() {
        Ok(ToolOutput { stdout, stderr })
    } else {
        Err(ToolRunError::NonZero {
            code: status.code(),
            stderr,
        })
    }
}

async fn kill_with_grace(child: &mut tokio::process::Child) {
    if let Err(e) = child.start_kill() {
        tracing::warn!(error = %e, "Failed to signal child process");
    }
    if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_err() {
        tracing::warn!("Child process did not exit within the kill grace period");
    }
}

/// Summarize a non-zero exit for an error message: exit code plus the
/// tail of stderr.
pub fn describe_failure(code: Option<i32>, stderr: &str) -> String {
    let code = code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    let tail: String = stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
        .chars()
        .take(200)
        .collect();
    if tail.is_empty() {
        format!("exit status {}", code)
    } else {
        format!("exit status {}: {}", code, tail)
    }
}
