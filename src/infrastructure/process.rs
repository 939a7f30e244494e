//! Thin wrapper around `tokio::process` for the external tools the service
//! drives (TTS scripts, espeak, ffmpeg).

use std::ffi::OsStr;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Lines of stderr kept when reporting a failed process
const DIAGNOSTIC_TAIL_LINES: usize = 20;

#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Last few stderr lines, for error messages
    pub fn diagnostics(&self) -> String {
        tail_lines(&self.stderr, DIAGNOSTIC_TAIL_LINES)
    }
}

/// Run a program to completion, optionally feeding `stdin`.
///
/// stderr is treated purely as diagnostic text: it is forwarded to the log
/// line by line and returned, never interpreted.
pub async fn run_process<I, S>(
    program: &OsStr,
    args: I,
    stdin: Option<&str>,
    tool: &'static str,
) -> std::io::Result<ProcessOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn()?;

    if let Some(input) = stdin {
        if let Some(mut pipe) = child.stdin.take() {
            pipe.write_all(input.as_bytes()).await?;
            pipe.shutdown().await?;
        }
    }

    let output = child.wait_with_output().await?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    for line in stderr.lines().map(str::trim).filter(|l| !l.is_empty()) {
        tracing::debug!(tool = tool, "{}", line);
    }

    Ok(ProcessOutput {
        status: output.status,
        stdout,
        stderr,
    })
}

pub fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}
