use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReelError {
    #[error("Missing input file: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("Schema error in {context}: {reason}")]
    Schema { context: String, reason: String },

    #[error("Refusing to overwrite {} with different content (use --force)", path.display())]
    ImmutabilityViolation { path: PathBuf },

    #[error(
        "Duration of {} out of tolerance: measured {actual:.4}s, expected {target:.4}s ± {tolerance:.4}s",
        path.display()
    )]
    DurationOutOfTolerance {
        path: PathBuf,
        actual: f64,
        target: f64,
        tolerance: f64,
    },

    #[error(
        "Frame count of {} out of tolerance: measured {actual}, expected {expected} ± {tolerance_frames}",
        path.display()
    )]
    FrameCountOutOfTolerance {
        path: PathBuf,
        actual: u64,
        expected: u64,
        tolerance_frames: u64,
    },

    #[error("Media probe tool '{tool}' is not available on this system")]
    ProbeUnavailable { tool: String },

    #[error("Failed to probe {}: {reason}", path.display())]
    ProbeFailed { path: PathBuf, reason: String },

    #[error("{tool} failed{}: {reason}", if *timed_out { " (timed out)" } else { "" })]
    ExternalCallFailure {
        tool: String,
        reason: String,
        timed_out: bool,
    },

    #[error("Missing artifact: {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("No clip could be assembled ({attempted} attempted)")]
    NoClipsAssembled { attempted: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ReelError {
    pub fn schema(context: impl Into<String>, reason: impl Into<String>) -> Self {
        ReelError::Schema {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub fn external(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        ReelError::ExternalCallFailure {
            tool: tool.into(),
            reason: reason.into(),
            timed_out: false,
        }
    }

    /// Per-unit failures are recorded and skipped; everything else stops the stage.
    pub fn is_unit_failure(&self) -> bool {
        matches!(
            self,
            ReelError::ExternalCallFailure { .. }
                | ReelError::MissingArtifact { .. }
                | ReelError::ProbeFailed { .. }
                | ReelError::DurationOutOfTolerance { .. }
                | ReelError::FrameCountOutOfTolerance { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ReelError>;
