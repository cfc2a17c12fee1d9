//! Delivery documents rendered from the plan.

use std::fmt::Write as _;

use crate::context::ProductionContext;
use crate::error::Result;
use crate::model::{OverlayKind, Plan};
use crate::provenance::{WriteOutcome, write_text_immutable};
use crate::report::StageLog;

fn time_range(start: u32, duration: u32) -> String {
    format!("{start}s to {}s", start + duration)
}

pub fn render_assembly_guide(plan: &Plan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Assembly guide: {}", plan.reel_id);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Claim `{}`, audit level `{}`, {}s at {} fps.",
        plan.claim_id,
        plan.audit_level.as_str(),
        plan.duration_seconds,
        plan.fps
    );

    for segment in &plan.segments {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "## {} · {} ({})",
            segment.id,
            segment.beat,
            time_range(segment.start_seconds, segment.duration_seconds)
        );
        let _ = writeln!(out);
        let cues: Vec<String> = segment
            .zoom_plan
            .iter()
            .map(|t| format!("{:.1}s", f64::from(segment.start_seconds) + t))
            .collect();
        let _ = writeln!(out, "- Zoom cues: {}", cues.join(", "));
        match &segment.sound_reset {
            Some(reset) => {
                let _ = writeln!(
                    out,
                    "- Sound reset: `{}` at {:.1}s",
                    reset.sfx_id,
                    f64::from(segment.start_seconds) + reset.offset_seconds
                );
            }
            None => {
                let _ = writeln!(out, "- Sound reset: none");
            }
        }

        for sub in plan
            .subsegments
            .iter()
            .filter(|s| s.segment_id == segment.id)
        {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "### {} ({})",
                sub.id,
                time_range(sub.start_seconds, sub.duration_seconds as u32)
            );
            let _ = writeln!(out);
            let _ = writeln!(out, "- Voice: \"{}\"", sub.voice.text);
            let _ = writeln!(
                out,
                "- Visual: {} via {} (`{}`)",
                sub.visual.kind, sub.visual.source, sub.visual.prompt_ref
            );
            for overlay in &sub.overlays {
                let kind = match overlay.kind {
                    OverlayKind::Emotional => "emotional",
                    OverlayKind::Informational => "informational",
                };
                let mut line = format!("- Overlay ({kind})");
                if let Some(text) = &overlay.text {
                    let _ = write!(line, ": \"{text}\"");
                }
                if !overlay.chart_ids.is_empty() {
                    let _ = write!(line, " for {}", overlay.chart_ids.join(", "));
                }
                let _ = writeln!(out, "{line}");
            }
            for chart in &sub.charts {
                let _ = writeln!(
                    out,
                    "- Chart `{}`: {} frames @ {} fps on {}",
                    chart.chart_id, chart.frames, chart.fps, chart.background
                );
            }
        }
    }
    out
}

pub fn render_checklist(plan: &Plan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Delivery checklist: {}", plan.reel_id);

    let _ = writeln!(out);
    let _ = writeln!(out, "## Per-block media");
    let _ = writeln!(out);
    for sub in &plan.subsegments {
        let _ = writeln!(out, "- [ ] `video/{}.mp4` (10.0s ± 1 frame)", sub.id);
        let _ = writeln!(out, "- [ ] `voice/{}.mp3` (at most 10.0s)", sub.id);
        let _ = writeln!(out, "- [ ] `sfx/{}.mp3`", sub.id);
    }

    let charts: Vec<_> = plan.chart_jobs().collect();
    if !charts.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Charts");
        let _ = writeln!(out);
        for (sub, chart) in charts {
            let _ = writeln!(
                out,
                "- [ ] `charts/{}.mp4` ({} frames, {} background, block {})",
                chart.chart_id, chart.frames, chart.background, sub.id
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Outputs");
    let _ = writeln!(out);
    for item in [
        "`captions.srt`",
        "`final_raw.mp4`",
        "`delivery/assembly_guide.md`",
        "`delivery/thumbnail.png`",
        "`quality_gate.json` with `pass: true`",
    ] {
        let _ = writeln!(out, "- [ ] {item}");
    }
    out
}

#[derive(Debug, Clone, Copy)]
pub struct KitOutcome {
    pub guide: WriteOutcome,
    pub checklist: WriteOutcome,
}

pub fn kit_production(ctx: &ProductionContext, force: bool, log: &mut StageLog) -> Result<KitOutcome> {
    let plan = ctx.load_plan()?;
    let guide = write_text_immutable(&ctx.assembly_guide_path(), &render_assembly_guide(&plan), force)?;
    let checklist = write_text_immutable(&ctx.checklist_path(), &render_checklist(&plan), force)?;
    log.success(
        "reel.kit.written",
        format!(
            "assembly_guide.md {}, checklist.md {}",
            guide.as_str(),
            checklist.as_str()
        ),
    );
    if !ctx.thumbnail_path().is_file() {
        log.warn(
            "reel.kit.thumbnail",
            "delivery/thumbnail.png is not there yet; the quality gate will flag it",
        );
    }
    Ok(KitOutcome { guide, checklist })
}
