mod common;

use std::fs;

use anyhow::Result;
use claimreel::ReelError;
use claimreel::assembly::{AssemblyOptions, assemble_final};
use claimreel::captions::{caption_production, parse_srt, within_one_block};
use claimreel::config::ReelConfig;
use claimreel::context::ProductionContext;
use claimreel::gate::gate_production;
use claimreel::kit::kit_production;
use claimreel::planner::plan_production;
use claimreel::provenance::{ProvenanceRecord, WriteOutcome};
use claimreel::report::StageLog;
use common::{FakeProbe, FakeTranscoder, TestProduction, write_json};
use serde_json::json;

#[test]
fn planning_twice_leaves_everything_unchanged() -> Result<()> {
    let prod = TestProduction::new()?;
    prod.write_inputs()?;

    let first = plan_production(&prod.ctx, false, &mut StageLog::new("plan"))?;
    assert_eq!(first.plan_write, WriteOutcome::Created);
    assert_eq!(first.provenance_write, WriteOutcome::Created);
    let plan_bytes = fs::read(prod.ctx.plan_path())?;
    let record_bytes = fs::read(prod.ctx.provenance_path("plan"))?;

    let second = plan_production(&prod.ctx, false, &mut StageLog::new("plan"))?;
    assert_eq!(second.plan_write, WriteOutcome::Unchanged);
    assert_eq!(second.provenance_write, WriteOutcome::Unchanged);
    assert_eq!(fs::read(prod.ctx.plan_path())?, plan_bytes);
    assert_eq!(fs::read(prod.ctx.provenance_path("plan"))?, record_bytes);
    Ok(())
}

#[test]
fn replanning_through_another_root_spelling_is_a_no_op() -> Result<()> {
    let prod = TestProduction::new()?;
    prod.write_inputs()?;
    plan_production(&prod.ctx, false, &mut StageLog::new("plan"))?;
    let record_bytes = fs::read(prod.ctx.provenance_path("plan"))?;

    let dotted = ProductionContext::new(prod.path().join("."), ReelConfig::default());
    let again = plan_production(&dotted, false, &mut StageLog::new("plan"))?;
    assert_eq!(again.plan_write, WriteOutcome::Unchanged);
    assert_eq!(again.provenance_write, WriteOutcome::Unchanged);
    assert_eq!(fs::read(prod.ctx.provenance_path("plan"))?, record_bytes);
    Ok(())
}

#[test]
fn changed_claim_needs_force_to_replan() -> Result<()> {
    let prod = TestProduction::new()?;
    prod.write_inputs()?;
    plan_production(&prod.ctx, false, &mut StageLog::new("plan"))?;

    write_json(
        &prod.ctx.claim_path(),
        &json!({
            "claim_id": "c-101",
            "claim_text": "Leaks cost cities more than they admit.",
            "supporting_data_ref": "utility audit 2023",
            "audit_level": "basic"
        }),
    )?;
    let before = fs::read(prod.ctx.plan_path())?;
    let err = plan_production(&prod.ctx, false, &mut StageLog::new("plan")).unwrap_err();
    assert!(matches!(err, ReelError::ImmutabilityViolation { .. }));
    assert_eq!(fs::read(prod.ctx.plan_path())?, before);

    let forced = plan_production(&prod.ctx, true, &mut StageLog::new("plan"))?;
    assert_eq!(forced.plan_write, WriteOutcome::Overwritten);
    assert_eq!(forced.plan.subsegments[0].voice.text, "Leaks cost cities more than they admit.");
    Ok(())
}

#[test]
fn provenance_hashes_the_plan_inputs() -> Result<()> {
    let prod = TestProduction::new()?;
    prod.write_inputs()?;
    plan_production(&prod.ctx, false, &mut StageLog::new("plan"))?;

    let record: ProvenanceRecord =
        serde_json::from_slice(&fs::read(prod.ctx.provenance_path("plan"))?)?;
    assert_eq!(record.stage, "plan");
    let labels: Vec<&str> = record.inputs.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, vec!["claim", "data"]);
    assert_eq!(
        record.inputs[0].sha256,
        claimreel::provenance::file_sha256(&prod.ctx.claim_path())?
    );
    Ok(())
}

#[test]
fn full_production_passes_the_gate() -> Result<()> {
    let prod = TestProduction::new()?;
    prod.write_inputs()?;
    let plan = plan_production(&prod.ctx, false, &mut StageLog::new("plan"))?.plan;
    prod.write_all_clips(&plan, 6.0)?;
    prod.write_charts(&plan)?;
    prod.write_thumbnail()?;

    let transcoder = FakeTranscoder::default();
    let options = AssemblyOptions::from_config(prod.ctx.config(), false);
    let report = assemble_final(
        &prod.ctx,
        &plan,
        &FakeProbe,
        &transcoder,
        options,
        &mut StageLog::new("assemble"),
    )?;
    assert_eq!(report.included, vec!["s01", "s02", "s03", "s04", "s05"]);
    assert_eq!(report.final_write, Some(WriteOutcome::Created));
    assert_eq!(report.final_duration_seconds, Some(50.0));
    assert_eq!(transcoder.count("concat"), 5);
    assert!(prod.ctx.final_raw_path().is_file());
    assert!(!prod.ctx.work_dir().exists());
    for clip in &report.clips {
        assert_eq!(clip.padding_seconds, Some(2.0));
    }

    let captions = caption_production(&prod.ctx, &FakeProbe, false, &mut StageLog::new("captions"))?;
    assert_eq!(captions.included.len(), 5);
    let cues = parse_srt(&fs::read_to_string(prod.ctx.captions_path())?)?;
    assert_eq!(cues.len(), captions.build.entries.len());
    assert!(!cues.is_empty());
    for cue in &cues {
        assert!(within_one_block(cue.start.as_secs_f64(), cue.end.as_secs_f64()));
    }
    // Narration for block 0 starts after two seconds of centering.
    let first = &captions.build.words[0];
    assert_eq!(first.block_index, 0);
    assert_eq!(first.start_frame, 60);

    kit_production(&prod.ctx, false, &mut StageLog::new("kit"))?;

    let gate = gate_production(&prod.ctx, &FakeProbe, &mut StageLog::new("gate"))?;
    assert!(gate.pass, "unexpected reasons: {:?}", gate.reasons);
    assert_eq!(gate.counters.segments, 4);
    assert_eq!(gate.counters.subsegments, 5);
    assert_eq!(gate.counters.chart_jobs, 2);
    assert_eq!(gate.counters.caption_entries, cues.len());
    assert!(prod.ctx.gate_report_path().is_file());
    Ok(())
}

#[test]
fn rerunning_every_stage_is_a_no_op() -> Result<()> {
    let prod = TestProduction::new()?;
    prod.write_inputs()?;
    let plan = plan_production(&prod.ctx, false, &mut StageLog::new("plan"))?.plan;
    prod.write_all_clips(&plan, 8.0)?;

    let options = AssemblyOptions::from_config(prod.ctx.config(), false);
    for expected in [WriteOutcome::Created, WriteOutcome::Unchanged] {
        let report = assemble_final(
            &prod.ctx,
            &plan,
            &FakeProbe,
            &FakeTranscoder::default(),
            options,
            &mut StageLog::new("assemble"),
        )?;
        assert_eq!(report.final_write, Some(expected));

        let captions =
            caption_production(&prod.ctx, &FakeProbe, false, &mut StageLog::new("captions"))?;
        assert_eq!(captions.srt_write, expected);
        assert_eq!(captions.timings_write, expected);

        let kit = kit_production(&prod.ctx, false, &mut StageLog::new("kit"))?;
        assert_eq!(kit.guide, expected);
        assert_eq!(kit.checklist, expected);
    }
    Ok(())
}
