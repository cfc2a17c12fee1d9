//! Terminal structural check of a production folder.
//!
//! Every failed check adds its own reason; nothing short-circuits and
//! nothing is modified except the gate's own report.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::captions::{parse_srt, within_one_block};
use crate::context::ProductionContext;
use crate::error::{ReelError, Result};
use crate::media::{MediaProbe, check_duration, check_frame_count, check_max_duration};
use crate::model::{BLOCK_SECONDS, OverlayKind, Plan};
use crate::planner::ZOOM_EDGE_MARGIN;
use crate::provenance::write_report;
use crate::report::StageLog;

pub const GATE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateCounters {
    pub segments: usize,
    pub subsegments: usize,
    pub chart_jobs: usize,
    pub caption_entries: usize,
    pub artifacts_checked: usize,
    pub reasons: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateReport {
    pub schema_version: u32,
    pub reel_id: String,
    pub pass: bool,
    pub reasons: Vec<String>,
    pub counters: GateCounters,
}

struct Findings<'a> {
    ctx: &'a ProductionContext,
    reasons: Vec<String>,
    counters: GateCounters,
}

impl Findings<'_> {
    fn fail(&mut self, reason: impl Into<String>) {
        self.reasons.push(reason.into());
    }

    fn rel(&self, path: &Path) -> String {
        path.strip_prefix(self.ctx.root())
            .unwrap_or(path)
            .display()
            .to_string()
    }

    /// Record a probe-backed check. Only a missing probe tool aborts the gate.
    fn artifact<T>(&mut self, owner: &str, what: &str, path: &Path, check: Result<T>) -> Result<()> {
        self.counters.artifacts_checked += 1;
        match check {
            Ok(_) => Ok(()),
            Err(err @ ReelError::ProbeUnavailable { .. }) => Err(err),
            Err(ReelError::MissingArtifact { .. }) => {
                self.fail(format!("{owner}: {what} artifact missing ({})", self.rel(path)));
                Ok(())
            }
            Err(err) => {
                self.fail(format!("{owner}: {what} artifact invalid: {err}"));
                Ok(())
            }
        }
    }

    fn exists(&mut self, owner: &str, what: &str, path: &Path) -> bool {
        self.counters.artifacts_checked += 1;
        if path.is_file() {
            return true;
        }
        self.fail(format!("{owner}: {what} missing ({})", self.rel(path)));
        false
    }
}

fn check_instructions(plan: &Plan, findings: &mut Findings<'_>) {
    for segment in &plan.segments {
        let id = &segment.id;
        if segment.zoom_plan.len() != 3 {
            findings.fail(format!(
                "segment {id}: expected 3 zoom timestamps, found {}",
                segment.zoom_plan.len()
            ));
        } else {
            let hi = f64::from(segment.duration_seconds) - ZOOM_EDGE_MARGIN + 1e-9;
            let lo = ZOOM_EDGE_MARGIN - 1e-9;
            let ordered = segment.zoom_plan.windows(2).all(|w| w[0] < w[1]);
            let inside = segment.zoom_plan.iter().all(|&t| t >= lo && t <= hi);
            if !ordered || !inside {
                findings.fail(format!(
                    "segment {id}: zoom timestamps {:?} are not strictly increasing inside the segment",
                    segment.zoom_plan
                ));
            }
        }
        if segment.sound_reset.is_none() {
            findings.fail(format!("segment {id}: missing sound reset instruction"));
        }
    }

    for sub in &plan.subsegments {
        let id = &sub.id;
        let emotional = sub.overlay_count(OverlayKind::Emotional);
        let informational = sub.overlay_count(OverlayKind::Informational);
        if emotional > 1 {
            findings.fail(format!("subsegment {id}: {emotional} emotional overlays (max 1)"));
        }
        if informational > 1 {
            findings.fail(format!(
                "subsegment {id}: {informational} informational overlays (max 1)"
            ));
        }
        if !sub.charts.is_empty() && informational == 0 {
            findings.fail(format!(
                "subsegment {id}: has chart jobs but no informational overlay"
            ));
        }
    }
}

fn check_media(plan: &Plan, probe: &dyn MediaProbe, findings: &mut Findings<'_>) -> Result<()> {
    let ctx = findings.ctx;
    for sub in &plan.subsegments {
        let owner = format!("subsegment {}", sub.id);
        let video = ctx.video_path(&sub.id);
        findings.artifact(&owner, "video", &video, check_duration(probe, &video, BLOCK_SECONDS))?;
        let voice = ctx.voice_path(&sub.id);
        findings.artifact(
            &owner,
            "voice",
            &voice,
            check_max_duration(probe, &voice, BLOCK_SECONDS),
        )?;
    }

    for (_, chart) in plan.chart_jobs() {
        let owner = format!("chart {}", chart.chart_id);
        let path = ctx.chart_path(&chart.chart_id);
        findings.artifact(&owner, "render", &path, check_frame_count(probe, &path, chart.frames))?;
    }
    Ok(())
}

fn check_captions(findings: &mut Findings<'_>) {
    let path = findings.ctx.captions_path();
    if !findings.exists("captions", "caption file", &path) {
        return;
    }
    let cues = match fs::read_to_string(&path)
        .map_err(ReelError::from)
        .and_then(|text| parse_srt(&text))
    {
        Ok(cues) => cues,
        Err(err) => {
            findings.fail(format!("captions: unreadable caption file: {err}"));
            return;
        }
    };
    findings.counters.caption_entries = cues.len();
    for cue in &cues {
        let (start, end) = (cue.start.as_secs_f64(), cue.end.as_secs_f64());
        if !within_one_block(start, end) {
            findings.fail(format!(
                "captions: entry {} ({start:.3}s to {end:.3}s) crosses a {BLOCK_SECONDS}s block boundary",
                cue.index
            ));
        }
    }
}

fn check_delivery(findings: &mut Findings<'_>) {
    let ctx = findings.ctx;
    findings.exists("delivery", "assembly guide", &ctx.assembly_guide_path());
    findings.exists("delivery", "checklist", &ctx.checklist_path());
    findings.exists("delivery", "thumbnail", &ctx.thumbnail_path());
}

/// Check `plan` against the artifacts under `ctx`.
pub fn evaluate(plan: &Plan, ctx: &ProductionContext, probe: &dyn MediaProbe) -> Result<GateReport> {
    let mut findings = Findings {
        ctx,
        reasons: Vec::new(),
        counters: GateCounters {
            segments: plan.segments.len(),
            subsegments: plan.subsegments.len(),
            chart_jobs: plan.chart_jobs().count(),
            ..GateCounters::default()
        },
    };

    for error in plan.structural_errors() {
        findings.fail(format!("plan: {error}"));
    }
    check_instructions(plan, &mut findings);
    check_media(plan, probe, &mut findings)?;
    check_captions(&mut findings);
    check_delivery(&mut findings);

    findings.counters.reasons = findings.reasons.len();
    Ok(GateReport {
        schema_version: GATE_SCHEMA_VERSION,
        reel_id: plan.reel_id.clone(),
        pass: findings.reasons.is_empty(),
        reasons: findings.reasons,
        counters: findings.counters,
    })
}

/// Evaluate the production folder and write `quality_gate.json`.
pub fn gate_production(
    ctx: &ProductionContext,
    probe: &dyn MediaProbe,
    log: &mut StageLog,
) -> Result<GateReport> {
    let plan = ctx.load_plan()?;
    let report = evaluate(&plan, ctx, probe)?;
    write_report(&ctx.gate_report_path(), &report)?;

    for reason in &report.reasons {
        log.warn("reel.gate.reason", reason.as_str());
    }
    let summary = format!(
        "{} artifact(s) checked, {} reason(s)",
        report.counters.artifacts_checked, report.counters.reasons
    );
    if report.pass {
        log.success("reel.gate.pass", format!("quality gate passed: {summary}"));
    } else {
        log.error("reel.gate.fail", format!("quality gate failed: {summary}"));
    }
    Ok(report)
}
