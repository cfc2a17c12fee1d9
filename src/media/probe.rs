use std::path::{Path, PathBuf};
use std::time::Duration;

use super::process::run_bounded;
use crate::config::ReelConfig;
use crate::error::{ReelError, Result};

/// Read-only inspection of rendered media.
pub trait MediaProbe {
    fn probe_duration(&self, path: &Path) -> Result<f64>;
    fn probe_frame_count(&self, path: &Path) -> Result<u64>;
}

#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: PathBuf,
    timeout: Duration,
}

impl FfprobeProbe {
    /// Resolve `tool` on `PATH` (or as a path) once, up front.
    pub fn locate(tool: &str, timeout: Duration) -> Result<Self> {
        let binary = which::which(tool).map_err(|_| ReelError::ProbeUnavailable {
            tool: tool.to_string(),
        })?;
        Ok(Self { binary, timeout })
    }

    pub fn from_config(config: &ReelConfig) -> Result<Self> {
        Self::locate(&config.ffprobe, config.probe_timeout())
    }

    fn query(&self, path: &Path, args: &[&str]) -> Result<String> {
        if !path.is_file() {
            return Err(ReelError::MissingArtifact {
                path: path.to_path_buf(),
            });
        }
        let mut full: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        full.push(path.to_string_lossy().into_owned());

        let output = run_bounded(&self.binary, &full, self.timeout).map_err(|err| match err {
            ReelError::ExternalCallFailure { reason, .. } => ReelError::ProbeFailed {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;
        Ok(output.stdout.trim().to_string())
    }
}

pub fn duration_args() -> [&'static str; 6] {
    [
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ]
}

pub fn frame_count_args() -> [&'static str; 9] {
    [
        "-v",
        "error",
        "-select_streams",
        "v:0",
        "-count_packets",
        "-show_entries",
        "stream=nb_read_packets",
        "-of",
        "csv=p=0",
    ]
}

impl MediaProbe for FfprobeProbe {
    fn probe_duration(&self, path: &Path) -> Result<f64> {
        let raw = self.query(path, &duration_args())?;
        parse_duration(&raw).ok_or_else(|| ReelError::ProbeFailed {
            path: path.to_path_buf(),
            reason: format!("unreadable duration '{raw}'"),
        })
    }

    fn probe_frame_count(&self, path: &Path) -> Result<u64> {
        let raw = self.query(path, &frame_count_args())?;
        parse_frame_count(&raw).ok_or_else(|| ReelError::ProbeFailed {
            path: path.to_path_buf(),
            reason: format!("unreadable frame count '{raw}'"),
        })
    }
}

fn parse_duration(raw: &str) -> Option<f64> {
    let value: f64 = raw.lines().next()?.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

fn parse_frame_count(raw: &str) -> Option<u64> {
    raw.lines()
        .next()?
        .trim()
        .trim_end_matches(',')
        .parse()
        .ok()
}
