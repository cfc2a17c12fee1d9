//! Typed model for the production inputs and the plan contract.
//!
//! Untyped JSON is converted here, at the boundary, and every later stage
//! works on these structs only.

mod claim;
mod dataset;
mod plan;

pub use claim::{AuditLevel, Claim, MAX_CLAIM_WORDS, load_claim};
pub use dataset::{ChartJobInput, Dataset, load_dataset};
pub use plan::{
    Beat, ChartJob, Overlay, OverlayKind, Plan, Segment, SoundReset, Subsegment, Visual, Voice,
    load_plan,
};

/// Schema version written into every plan.
pub const PLAN_VERSION: &str = "2.0";

/// Working frame rate for every rendered artifact.
pub const FPS: u32 = 30;

/// Length of one subsegment block.
pub const BLOCK_SECONDS: f64 = 10.0;

pub const BLOCK_FRAMES: u64 = 300;

/// Allowed deviation for fixed-length artifacts, in frames.
pub const TOLERANCE_FRAMES: u32 = 1;

/// Every chart overlay is exactly one block long.
pub const CHART_FRAMES: u64 = BLOCK_FRAMES;

/// Background color chart renders are keyed out on.
pub const CHROMA_KEY: &str = "#00FF00";

pub(crate) fn read_json_value(
    path: &std::path::Path,
) -> crate::error::Result<serde_json::Value> {
    use crate::error::ReelError;

    if !path.is_file() {
        return Err(ReelError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|err| ReelError::schema(path.display().to_string(), format!("invalid JSON: {err}")))
}
