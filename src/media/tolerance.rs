use std::path::Path;

use super::MediaProbe;
use crate::error::{ReelError, Result};
use crate::model::{FPS, TOLERANCE_FRAMES};

/// Absorbs float noise in probe output right at the one-frame edge.
const EPSILON: f64 = 1e-9;

pub fn tolerance_seconds(fps: u32, tolerance_frames: u32) -> f64 {
    f64::from(tolerance_frames) / f64::from(fps.max(1))
}

/// Fails when `|actual - target|` exceeds `tolerance_frames / fps`.
pub fn validate_duration(
    path: &Path,
    actual: f64,
    target: f64,
    fps: u32,
    tolerance_frames: u32,
) -> Result<()> {
    let tolerance = tolerance_seconds(fps, tolerance_frames);
    if !actual.is_finite() || (actual - target).abs() > tolerance + EPSILON {
        return Err(ReelError::DurationOutOfTolerance {
            path: path.to_path_buf(),
            actual,
            target,
            tolerance,
        });
    }
    Ok(())
}

pub fn validate_frame_count(
    path: &Path,
    actual: u64,
    expected: u64,
    tolerance_frames: u32,
) -> Result<()> {
    let tolerance_frames = u64::from(tolerance_frames);
    if actual.abs_diff(expected) > tolerance_frames {
        return Err(ReelError::FrameCountOutOfTolerance {
            path: path.to_path_buf(),
            actual,
            expected,
            tolerance_frames,
        });
    }
    Ok(())
}

/// Probe `path` and hold it to `target` seconds at the working frame rate.
pub fn check_duration(probe: &dyn MediaProbe, path: &Path, target: f64) -> Result<f64> {
    let actual = probe.probe_duration(path)?;
    validate_duration(path, actual, target, FPS, TOLERANCE_FRAMES)?;
    Ok(actual)
}

/// Narration may be shorter than its block but never longer than one frame past it.
pub fn check_max_duration(probe: &dyn MediaProbe, path: &Path, limit: f64) -> Result<f64> {
    let actual = probe.probe_duration(path)?;
    let tolerance = tolerance_seconds(FPS, TOLERANCE_FRAMES);
    if !actual.is_finite() || actual <= 0.0 || actual > limit + tolerance + EPSILON {
        return Err(ReelError::DurationOutOfTolerance {
            path: path.to_path_buf(),
            actual,
            target: limit,
            tolerance,
        });
    }
    Ok(actual)
}

pub fn check_frame_count(probe: &dyn MediaProbe, path: &Path, expected: u64) -> Result<u64> {
    let actual = probe.probe_frame_count(path)?;
    validate_frame_count(path, actual, expected, TOLERANCE_FRAMES)?;
    Ok(actual)
}
