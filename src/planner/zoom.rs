use crate::error::{ReelError, Result};

pub const ZOOM_FRACTIONS: [f64; 3] = [0.15, 0.45, 0.75];

/// Minimum distance between a zoom cue and either segment edge.
pub const ZOOM_EDGE_MARGIN: f64 = 0.1;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Three strictly increasing cues inside `[0.1, duration - 0.1]`.
///
/// A cue that would not advance past its predecessor after clamping is pushed
/// forward by 0.1s; a segment too short to hold three such cues is rejected.
pub fn compute_zoom_plan(duration_seconds: f64) -> Result<Vec<f64>> {
    let lo = ZOOM_EDGE_MARGIN;
    let hi = round1(duration_seconds - ZOOM_EDGE_MARGIN);
    if !duration_seconds.is_finite() || hi < lo + 0.2 - 1e-9 {
        return Err(ReelError::schema(
            "zoom_plan",
            format!("segment of {duration_seconds}s is too short for three zoom cues"),
        ));
    }

    let mut cues: Vec<f64> = Vec::with_capacity(ZOOM_FRACTIONS.len());
    for fraction in ZOOM_FRACTIONS {
        let mut cue = round1(duration_seconds * fraction).clamp(lo, hi);
        if let Some(&prev) = cues.last()
            && cue <= prev
        {
            cue = round1(prev + 0.1);
        }
        if cue > hi + 1e-9 {
            return Err(ReelError::schema(
                "zoom_plan",
                format!("cannot place zoom cues inside a {duration_seconds}s segment"),
            ));
        }
        cues.push(cue);
    }
    Ok(cues)
}
