//! Claim + dataset to `plan.json`.

mod charts;
mod zoom;

use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::context::ProductionContext;
use crate::error::Result;
use crate::model::{
    BLOCK_SECONDS, Beat, CHART_FRAMES, CHROMA_KEY, ChartJob, Claim, Dataset, FPS, Overlay,
    OverlayKind, PLAN_VERSION, Plan, Segment, SoundReset, Subsegment, Visual, Voice, load_claim,
    load_dataset,
};
use crate::provenance::{
    RuntimeInfo, WriteOutcome, build_provenance, write_deterministic, write_provenance,
};
use crate::report::StageLog;

pub use charts::{ChartAssignment, assign_charts};
pub use zoom::{ZOOM_EDGE_MARGIN, ZOOM_FRACTIONS, compute_zoom_plan};

struct BeatTemplate {
    beat: Beat,
    blocks: u32,
    sound_reset: &'static str,
}

/// Five blocks over four beats: 10s / 20s / 10s / 10s.
const TEMPLATE: [BeatTemplate; 4] = [
    BeatTemplate {
        beat: Beat::HookClaim,
        blocks: 1,
        sound_reset: "impact_hit",
    },
    BeatTemplate {
        beat: Beat::SupportProof,
        blocks: 2,
        sound_reset: "paper_swipe",
    },
    BeatTemplate {
        beat: Beat::ImplicationCost,
        blocks: 1,
        sound_reset: "low_drone",
    },
    BeatTemplate {
        beat: Beat::LandingReframe,
        blocks: 1,
        sound_reset: "soft_whoosh",
    },
];

fn placeholder_voice(beat: Beat, position: u32, claim: &Claim) -> String {
    match (beat, position) {
        (Beat::HookClaim, _) => claim.claim_text.clone(),
        (Beat::SupportProof, 0) => format!(
            "Here is what the numbers in {} actually show.",
            claim.supporting_data_ref
        ),
        (Beat::SupportProof, _) => "Put side by side, the pattern is hard to miss.".to_string(),
        (Beat::ImplicationCost, _) => {
            "That gap has a real cost, and someone is already paying it.".to_string()
        }
        (Beat::LandingReframe, _) => {
            "So next time you hear this, ask where the data points.".to_string()
        }
    }
}

/// Pure function of its inputs: the same claim and dataset always give the same plan.
pub fn generate_plan(claim: &Claim, dataset: &Dataset) -> Result<Plan> {
    let block = BLOCK_SECONDS as u32;
    let mut segments = Vec::with_capacity(TEMPLATE.len());
    let mut subsegments = Vec::new();
    let mut cursor = 0u32;

    for (seg_idx, template) in TEMPLATE.iter().enumerate() {
        let segment_id = format!("seg{:02}", seg_idx + 1);
        let duration = template.blocks * block;
        let mut child_ids = Vec::with_capacity(template.blocks as usize);

        for position in 0..template.blocks {
            let id = format!("s{:02}", subsegments.len() + 1);
            let start = cursor + position * block;
            let mut overlays = Vec::new();
            if template.beat == Beat::HookClaim
                && let Some(text) = &claim.thumbnail_text
            {
                overlays.push(Overlay {
                    kind: OverlayKind::Emotional,
                    text: Some(text.clone()),
                    chart_ids: Vec::new(),
                });
            }
            subsegments.push(Subsegment {
                id: id.clone(),
                segment_id: segment_id.clone(),
                start_seconds: start,
                duration_seconds: BLOCK_SECONDS,
                voice: Voice {
                    text: placeholder_voice(template.beat, position, claim),
                },
                visual: Visual {
                    kind: "generated_video".to_string(),
                    source: "image_to_video".to_string(),
                    prompt_ref: format!("prompts/{id}.md"),
                },
                overlays,
                charts: Vec::new(),
            });
            child_ids.push(id);
        }

        segments.push(Segment {
            id: segment_id,
            beat: template.beat,
            start_seconds: cursor,
            duration_seconds: duration,
            subsegments: child_ids,
            zoom_plan: compute_zoom_plan(f64::from(duration))?,
            sound_reset: Some(SoundReset {
                sfx_id: template.sound_reset.to_string(),
                offset_seconds: 0.0,
            }),
        });
        cursor += duration;
    }

    let ids: Vec<String> = subsegments.iter().map(|s| s.id.clone()).collect();
    let assignments = assign_charts(&dataset.charts, &ids)?;
    for (input, assignment) in dataset.charts.iter().zip(&assignments) {
        let Some(sub) = subsegments
            .iter_mut()
            .find(|s| s.id == assignment.subsegment_id)
        else {
            continue;
        };
        sub.charts.push(ChartJob {
            chart_id: input.chart_id.clone(),
            frames: CHART_FRAMES,
            fps: FPS,
            background: CHROMA_KEY.to_string(),
            props: input.props.clone(),
        });
        tag_informational(sub, &input.chart_id, &input.props);
    }

    Ok(Plan {
        version: PLAN_VERSION.to_string(),
        reel_id: format!("reel-{}", claim.claim_id),
        claim_id: claim.claim_id.clone(),
        audit_level: claim.audit_level,
        fps: FPS,
        duration_seconds: cursor,
        segments,
        subsegments,
    })
}

/// Each subsegment carries one informational overlay listing all of its charts.
fn tag_informational(sub: &mut Subsegment, chart_id: &str, props: &Value) {
    if let Some(overlay) = sub
        .overlays
        .iter_mut()
        .find(|o| o.kind == OverlayKind::Informational)
    {
        overlay.chart_ids.push(chart_id.to_string());
        return;
    }
    sub.overlays.push(Overlay {
        kind: OverlayKind::Informational,
        text: props
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string),
        chart_ids: vec![chart_id.to_string()],
    });
}

#[derive(Debug)]
pub struct PlanOutcome {
    pub plan: Plan,
    pub plan_write: WriteOutcome,
    pub provenance_write: WriteOutcome,
}

pub fn plan_flags() -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("block_seconds".to_string(), json!(BLOCK_SECONDS)),
        ("fps".to_string(), json!(FPS)),
    ])
}

/// Load inputs from the production folder and write the plan plus its provenance.
pub fn plan_production(
    ctx: &ProductionContext,
    force: bool,
    log: &mut StageLog,
) -> Result<PlanOutcome> {
    let claim_path = ctx.claim_path();
    let data_path = ctx.data_path();
    let claim = load_claim(&claim_path)?;
    let dataset = load_dataset(&data_path)?;
    log.debug(
        "reel.plan.inputs",
        format!(
            "claim {} ({} chart job(s) declared)",
            claim.claim_id,
            dataset.charts.len()
        ),
    );

    let plan = generate_plan(&claim, &dataset)?;
    let plan_path = ctx.plan_path();
    let plan_write = write_deterministic(&plan_path, &plan, force)?;
    log.success(
        "reel.plan.written",
        format!(
            "plan.json {} ({} segments, {} subsegments, {}s)",
            plan_write.as_str(),
            plan.segments.len(),
            plan.subsegments.len(),
            plan.duration_seconds
        ),
    );

    let record = build_provenance(
        "plan",
        &[("claim", claim_path.as_path()), ("data", data_path.as_path())],
        plan_flags(),
        RuntimeInfo::current(),
    )?;
    let provenance_write = write_provenance(&ctx.provenance_path("plan"), &record, force)?;
    log.info(
        "reel.plan.provenance",
        format!("provenance {} (signature {})", provenance_write.as_str(), &record.signature[..12]),
    );

    Ok(PlanOutcome {
        plan,
        plan_write,
        provenance_write,
    })
}
