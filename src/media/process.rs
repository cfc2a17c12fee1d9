use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{ReelError, Result};
use crate::jobs::{JobState, Poll, PollPolicy, poll_until};

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const STDERR_TAIL_LINES: usize = 12;

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `program` to completion under a hard timeout.
///
/// Output pipes are drained on helper threads so a chatty child cannot block
/// on a full pipe. A non-zero exit, a wait error or an expired deadline is an
/// `ExternalCallFailure`; the child is killed before returning on expiry.
pub fn run_bounded(program: &Path, args: &[String], timeout: Duration) -> Result<ProcessOutput> {
    let tool = tool_name(program);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| ReelError::external(&tool, format!("failed to start: {err}")))?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let state = poll_until(
        PollPolicy::with_deadline(POLL_INTERVAL, timeout),
        |_| match child.try_wait() {
            Ok(Some(status)) => Poll::Ready(status),
            Ok(None) => Poll::Pending,
            Err(err) => Poll::Failed(err.to_string()),
        },
    );

    let outcome = match state {
        JobState::Succeeded(status) => Ok(status),
        JobState::TimedOut { .. } => Err(true),
        _ => Err(false),
    };
    if outcome.is_err() {
        let _ = child.kill();
        let _ = child.wait();
    }

    let stdout = collect(stdout);
    let stderr = collect(stderr);

    match outcome {
        Ok(status) if status.success() => Ok(ProcessOutput {
            stdout,
            stderr,
        }),
        Ok(status) => Err(ReelError::external(
            tool,
            format!("exited with {status}: {}", stderr_tail(&stderr)),
        )),
        Err(timed_out) => Err(ReelError::ExternalCallFailure {
            tool,
            reason: if timed_out {
                format!("killed after {:.1}s", timeout.as_secs_f64())
            } else {
                format!("lost track of process: {}", stderr_tail(&stderr))
            },
            timed_out,
        }),
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

pub(crate) fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return "no error output".to_string();
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}
