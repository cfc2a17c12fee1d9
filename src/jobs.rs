//! Bounded polling for work that completes outside this process.
//!
//! A job moves `Submitted -> Polling { attempt } -> Succeeded | Failed | TimedOut`.
//! The loop stops at the attempt cap or the deadline, whichever comes first.

use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl PollPolicy {
    /// Poll as often as `interval` allows until `timeout` elapses.
    pub fn with_deadline(interval: Duration, timeout: Duration) -> Self {
        let interval_ms = interval.as_millis().max(1);
        let attempts = timeout.as_millis() / interval_ms + 1;
        Self {
            interval,
            max_attempts: u32::try_from(attempts).unwrap_or(u32::MAX),
            timeout,
        }
    }
}

/// What one observation of the job reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll<T> {
    Pending,
    Ready(T),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState<T> {
    Submitted,
    Polling { attempt: u32 },
    Succeeded(T),
    Failed(String),
    TimedOut { attempts: u32, elapsed: Duration },
}

impl<T> JobState<T> {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded(_) | JobState::Failed(_) | JobState::TimedOut { .. }
        )
    }
}

/// Drive `step` until it resolves or the policy is exhausted.
///
/// `step` receives the 1-based attempt number. The returned state is always terminal.
pub fn poll_until<T, F>(policy: PollPolicy, mut step: F) -> JobState<T>
where
    F: FnMut(u32) -> Poll<T>,
{
    let started = Instant::now();
    let mut state = JobState::Submitted;

    loop {
        let attempt = match state {
            JobState::Submitted => 1,
            JobState::Polling { attempt } => attempt + 1,
            terminal => return terminal,
        };
        if attempt > policy.max_attempts || started.elapsed() > policy.timeout {
            return JobState::TimedOut {
                attempts: attempt - 1,
                elapsed: started.elapsed(),
            };
        }

        state = match step(attempt) {
            Poll::Ready(value) => JobState::Succeeded(value),
            Poll::Failed(reason) => JobState::Failed(reason),
            Poll::Pending => {
                if attempt < policy.max_attempts {
                    thread::sleep(policy.interval);
                }
                JobState::Polling { attempt }
            }
        };
    }
}
