mod common;

use std::fs;

use anyhow::Result;
use claimreel::ReelError;
use claimreel::assembly::{AssemblyOptions, assemble_final};
use claimreel::captions::caption_production;
use claimreel::gate::{GateReport, evaluate, gate_production};
use claimreel::kit::kit_production;
use claimreel::model::Plan;
use claimreel::planner::plan_production;
use claimreel::report::StageLog;
use common::{FakeProbe, FakeTranscoder, MissingProbe, TestProduction, fake_media};

/// Run every stage over complete fake media.
fn produced() -> Result<(TestProduction, Plan)> {
    let prod = TestProduction::new()?;
    prod.write_inputs()?;
    let plan = plan_production(&prod.ctx, false, &mut StageLog::new("plan"))?.plan;
    prod.write_all_clips(&plan, 7.5)?;
    prod.write_charts(&plan)?;
    prod.write_thumbnail()?;
    assemble_final(
        &prod.ctx,
        &plan,
        &FakeProbe,
        &FakeTranscoder::default(),
        AssemblyOptions::from_config(prod.ctx.config(), false),
        &mut StageLog::new("assemble"),
    )?;
    caption_production(&prod.ctx, &FakeProbe, false, &mut StageLog::new("captions"))?;
    kit_production(&prod.ctx, false, &mut StageLog::new("kit"))?;
    Ok((prod, plan))
}

fn gate(prod: &TestProduction) -> Result<GateReport> {
    Ok(gate_production(&prod.ctx, &FakeProbe, &mut StageLog::new("gate"))?)
}

#[test]
fn missing_sound_reset_and_chart_give_two_reasons() -> Result<()> {
    let (prod, plan) = produced()?;
    let chart_id = plan.subsegments[1].charts[0].chart_id.clone();
    fs::remove_file(prod.ctx.chart_path(&chart_id))?;

    let mut edited = plan.clone();
    edited.segments[2].sound_reset = None;
    fs::write(prod.ctx.plan_path(), serde_json::to_string_pretty(&edited)?)?;

    let report = gate(&prod)?;
    assert!(!report.pass);
    assert_eq!(report.reasons.len(), 2, "reasons: {:?}", report.reasons);
    assert_eq!(report.counters.reasons, 2);
    assert!(report.reasons.iter().any(|r| r.contains("seg03") && r.contains("sound reset")));
    assert!(report.reasons.iter().any(|r| r.contains(&chart_id) && r.contains("missing")));

    let written: GateReport = serde_json::from_slice(&fs::read(prod.ctx.gate_report_path())?)?;
    assert_eq!(written, report);
    Ok(())
}

#[test]
fn off_length_media_is_reported_per_artifact() -> Result<()> {
    let (prod, plan) = produced()?;
    fake_media(&prod.ctx.video_path("s02"), 9.9, Some(297))?;
    fake_media(&prod.ctx.voice_path("s05"), 10.2, None)?;
    let chart_id = plan.subsegments[2].charts[0].chart_id.clone();
    fake_media(&prod.ctx.chart_path(&chart_id), 10.0, Some(290))?;

    let report = gate(&prod)?;
    assert_eq!(report.reasons.len(), 3, "reasons: {:?}", report.reasons);
    assert!(report.reasons[0].starts_with("subsegment s02: video artifact invalid"));
    assert!(report.reasons[1].starts_with("subsegment s05: voice artifact invalid"));
    assert!(report.reasons[2].starts_with(&format!("chart {chart_id}: render artifact invalid")));
    Ok(())
}

#[test]
fn caption_crossing_a_block_boundary_fails() -> Result<()> {
    let (prod, _) = produced()?;
    fs::write(
        prod.ctx.captions_path(),
        "1\n00:00:01,000 --> 00:00:04,000\nfirst words\n\n2\n00:00:09,500 --> 00:00:10,500\nspills over\n",
    )?;

    let report = gate(&prod)?;
    assert_eq!(report.counters.caption_entries, 2);
    assert_eq!(report.reasons.len(), 1, "reasons: {:?}", report.reasons);
    assert!(report.reasons[0].starts_with("captions: entry 2"));
    Ok(())
}

#[test]
fn missing_delivery_files_are_listed() -> Result<()> {
    let (prod, _) = produced()?;
    fs::remove_file(prod.ctx.thumbnail_path())?;
    fs::remove_file(prod.ctx.checklist_path())?;

    let report = gate(&prod)?;
    assert_eq!(
        report.reasons,
        vec![
            "delivery: checklist missing (delivery/checklist.md)".to_string(),
            "delivery: thumbnail missing (delivery/thumbnail.png)".to_string(),
        ]
    );
    Ok(())
}

#[test]
fn gate_aborts_without_a_probe_tool() -> Result<()> {
    let (prod, plan) = produced()?;
    let err = evaluate(&plan, &prod.ctx, &MissingProbe).unwrap_err();
    assert!(matches!(err, ReelError::ProbeUnavailable { .. }));
    Ok(())
}

#[test]
fn gate_needs_a_plan() -> Result<()> {
    let prod = TestProduction::new()?;
    let err = gate_production(&prod.ctx, &FakeProbe, &mut StageLog::new("gate")).unwrap_err();
    assert!(matches!(err, ReelError::MissingInput { .. }));
    Ok(())
}
