use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AuditLevel, BLOCK_SECONDS, read_json_value};
use crate::error::{ReelError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Beat {
    HookClaim,
    SupportProof,
    ImplicationCost,
    LandingReframe,
}

impl Beat {
    pub fn as_str(self) -> &'static str {
        match self {
            Beat::HookClaim => "hook_claim",
            Beat::SupportProof => "support_proof",
            Beat::ImplicationCost => "implication_cost",
            Beat::LandingReframe => "landing_reframe",
        }
    }
}

impl fmt::Display for Beat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundReset {
    pub sfx_id: String,
    /// Seconds from the segment start.
    pub offset_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub beat: Beat,
    pub start_seconds: u32,
    pub duration_seconds: u32,
    pub subsegments: Vec<String>,
    /// Zoom cue timestamps, relative to the segment start.
    #[serde(default)]
    pub zoom_plan: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_reset: Option<SoundReset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visual {
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub prompt_ref: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    Emotional,
    Informational,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub kind: OverlayKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chart_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartJob {
    pub chart_id: String,
    pub frames: u64,
    pub fps: u32,
    pub background: String,
    pub props: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subsegment {
    pub id: String,
    pub segment_id: String,
    pub start_seconds: u32,
    pub duration_seconds: f64,
    pub voice: Voice,
    pub visual: Visual,
    #[serde(default)]
    pub overlays: Vec<Overlay>,
    #[serde(default)]
    pub charts: Vec<ChartJob>,
}

impl Subsegment {
    pub fn overlay_count(&self, kind: OverlayKind) -> usize {
        self.overlays.iter().filter(|o| o.kind == kind).count()
    }
}

/// The production contract every later stage reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub version: String,
    pub reel_id: String,
    pub claim_id: String,
    pub audit_level: AuditLevel,
    pub fps: u32,
    pub duration_seconds: u32,
    pub segments: Vec<Segment>,
    pub subsegments: Vec<Subsegment>,
}

impl Plan {
    pub fn subsegment(&self, id: &str) -> Option<&Subsegment> {
        self.subsegments.iter().find(|s| s.id == id)
    }

    pub fn chart_jobs(&self) -> impl Iterator<Item = (&Subsegment, &ChartJob)> {
        self.subsegments
            .iter()
            .flat_map(|sub| sub.charts.iter().map(move |chart| (sub, chart)))
    }

    /// Structural timing and identity violations, in a stable order.
    ///
    /// Instruction-level checks (zoom cues, sound resets, overlays) belong to
    /// the quality gate and are not repeated here.
    pub fn structural_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let block = BLOCK_SECONDS as u32;

        if self.subsegments.len() as u32 * block != self.duration_seconds {
            errors.push(format!(
                "{} subsegments do not fill {}s",
                self.subsegments.len(),
                self.duration_seconds
            ));
        }
        let segment_total: u32 = self.segments.iter().map(|s| s.duration_seconds).sum();
        if segment_total != self.duration_seconds {
            errors.push(format!(
                "segment durations sum to {segment_total}s, expected {}s",
                self.duration_seconds
            ));
        }

        let mut seen = BTreeSet::new();
        for id in self
            .segments
            .iter()
            .map(|s| &s.id)
            .chain(self.subsegments.iter().map(|s| &s.id))
        {
            if !seen.insert(id.as_str()) {
                errors.push(format!("duplicate id '{id}'"));
            }
        }

        let listed: Vec<&str> = self
            .segments
            .iter()
            .flat_map(|s| s.subsegments.iter().map(String::as_str))
            .collect();
        let actual: Vec<&str> = self.subsegments.iter().map(|s| s.id.as_str()).collect();
        if listed != actual {
            errors.push("segment subsegment lists do not match subsegment order".to_string());
        }

        for segment in &self.segments {
            if segment.duration_seconds != segment.subsegments.len() as u32 * block {
                errors.push(format!(
                    "segment {} lasts {}s but holds {} subsegments",
                    segment.id,
                    segment.duration_seconds,
                    segment.subsegments.len()
                ));
            }
        }

        for (idx, sub) in self.subsegments.iter().enumerate() {
            if (sub.duration_seconds - BLOCK_SECONDS).abs() > f64::EPSILON {
                errors.push(format!(
                    "subsegment {} lasts {}s, expected {BLOCK_SECONDS}s",
                    sub.id, sub.duration_seconds
                ));
            }
            if sub.start_seconds != idx as u32 * block {
                errors.push(format!(
                    "subsegment {} starts at {}s, expected {}s",
                    sub.id,
                    sub.start_seconds,
                    idx as u32 * block
                ));
            }
        }

        errors
    }
}

/// Read `plan.json` and reject structurally broken plans.
pub fn load_plan(path: &Path) -> Result<Plan> {
    let value = read_json_value(path)?;
    let context = path.display().to_string();
    let plan: Plan = serde_json::from_value(value)
        .map_err(|err| ReelError::schema(context.as_str(), err.to_string()))?;
    let errors = plan.structural_errors();
    if !errors.is_empty() {
        return Err(ReelError::schema(context, errors.join("; ")));
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sub(id: &str, segment: &str, start: u32) -> Subsegment {
        Subsegment {
            id: id.to_string(),
            segment_id: segment.to_string(),
            start_seconds: start,
            duration_seconds: 10.0,
            voice: Voice {
                text: "words".to_string(),
            },
            visual: Visual {
                kind: "generated_video".to_string(),
                source: "image_to_video".to_string(),
                prompt_ref: format!("prompts/{id}.txt"),
            },
            overlays: Vec::new(),
            charts: Vec::new(),
        }
    }

    fn two_block_plan() -> Plan {
        Plan {
            version: "2.0".to_string(),
            reel_id: "reel-x".to_string(),
            claim_id: "x".to_string(),
            audit_level: AuditLevel::Basic,
            fps: 30,
            duration_seconds: 20,
            segments: vec![Segment {
                id: "seg01".to_string(),
                beat: Beat::HookClaim,
                start_seconds: 0,
                duration_seconds: 20,
                subsegments: vec!["s01".to_string(), "s02".to_string()],
                zoom_plan: vec![3.0, 9.0, 15.0],
                sound_reset: None,
            }],
            subsegments: vec![sub("s01", "seg01", 0), sub("s02", "seg01", 10)],
        }
    }

    #[test]
    fn consistent_plan_has_no_structural_errors() {
        assert!(two_block_plan().structural_errors().is_empty());
    }

    #[test]
    fn detects_duration_mismatch_and_reordering() {
        let mut plan = two_block_plan();
        plan.duration_seconds = 30;
        plan.subsegments.swap(0, 1);
        let errors = plan.structural_errors();
        assert!(errors.iter().any(|e| e.contains("do not fill")));
        assert!(errors.iter().any(|e| e.contains("order")));
    }

    #[test]
    fn sound_reset_is_optional_on_read() {
        let value = json!({
            "id": "seg01", "beat": "hook_claim", "start_seconds": 0,
            "duration_seconds": 10, "subsegments": ["s01"], "zoom_plan": [1.5, 4.5, 7.5]
        });
        let segment: Segment = serde_json::from_value(value).unwrap();
        assert!(segment.sound_reset.is_none());
    }
}
