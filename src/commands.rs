use anyhow::{Context, Result};
use serde_json::json;

use crate::assembly::{AssemblyOptions, assemble_final};
use crate::captions::caption_production;
use crate::cli::{AssembleArgs, Cli, ForceArgs, InitArgs, ProbeArgs, ReelCommands};
use crate::config::ReelConfig;
use crate::context::ProductionContext;
use crate::gate::gate_production;
use crate::kit::kit_production;
use crate::media::{FfmpegTranscoder, FfprobeProbe, MediaProbe};
use crate::planner::plan_production;
use crate::provenance::{WriteOutcome, write_text_immutable};
use crate::report::StageLog;
use crate::ui::prelude::{Level, emit};

/// Run the parsed command and return the process exit code.
pub fn handle_command(cli: &Cli) -> Result<i32> {
    let mut ctx = ProductionContext::open(&cli.root)
        .with_context(|| format!("Failed to open production folder {}", cli.root.display()))?;

    match &cli.command {
        ReelCommands::Init(args) => handle_init(&ctx, args),
        ReelCommands::Plan(args) => handle_plan(&ctx, args),
        ReelCommands::Captions(args) => handle_captions(&ctx, args),
        ReelCommands::Assemble(args) => handle_assemble(&mut ctx, args),
        ReelCommands::Kit(args) => handle_kit(&ctx, args),
        ReelCommands::Gate => handle_gate(&ctx),
        ReelCommands::Probe(args) => handle_probe(&ctx, args),
    }
}

/// Run `body` with a fresh stage log and keep `logs/<stage>.log` whatever the outcome.
fn run_stage<T>(
    ctx: &ProductionContext,
    stage: &'static str,
    body: impl FnOnce(&mut StageLog) -> crate::Result<T>,
) -> Result<T> {
    let mut log = StageLog::new(stage);
    let result = body(&mut log);
    if let Err(err) = &result {
        log.record(Level::Error, "reel.stage.failed", err.to_string());
    }
    if let Err(err) = log.write_to(&ctx.log_path(log.stage())) {
        emit(
            Level::Warn,
            "reel.log.write_failed",
            &format!("Could not write {stage} log: {err}"),
            None,
        );
    }
    result.with_context(|| format!("{stage} stage failed"))
}

const CLAIM_TEMPLATE: &str = r#"{
  "claim_id": "claim-001",
  "claim_text": "Replace this with the claim the reel will prove.",
  "supporting_data_ref": "Where the supporting numbers come from",
  "audit_level": "basic",
  "tags": [],
  "risk_notes": [],
  "thumbnail_text": "SHORT HOOK"
}
"#;

const DATA_TEMPLATE: &str = r#"{
  "charts": [
    {
      "chart_id": "chart-01",
      "props": {
        "title": "Replace with the chart title"
      }
    }
  ]
}
"#;

fn write_template(
    log: &mut StageLog,
    path: &std::path::Path,
    contents: &str,
    force: bool,
) -> crate::Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if path.exists() && !force {
        log.info("reel.init.kept", format!("{name} kept"));
        return Ok(());
    }
    let outcome = write_text_immutable(path, contents, true)?;
    if outcome != WriteOutcome::Unchanged {
        log.success("reel.init.template", format!("{name} {}", outcome.as_str()));
    }
    Ok(())
}

fn handle_init(ctx: &ProductionContext, args: &InitArgs) -> Result<i32> {
    run_stage(ctx, "init", |log| {
        if args.fresh {
            let removed = ctx.wipe_derived()?;
            log.info(
                "reel.init.fresh",
                format!("removed {} derived output(s)", removed.len()),
            );
            for path in &removed {
                log.debug("reel.init.removed", path.display().to_string());
            }
        }
        ctx.ensure_layout()?;
        write_template(log, &ctx.claim_path(), CLAIM_TEMPLATE, args.force)?;
        write_template(log, &ctx.data_path(), DATA_TEMPLATE, args.force)?;
        let config = ReelConfig::default().to_toml()?;
        write_template(log, &ctx.config_path(), &config, args.force)?;
        log.success(
            "reel.init.ready",
            format!("production folder ready at {}", ctx.root().display()),
        );
        Ok(0)
    })
}

fn handle_plan(ctx: &ProductionContext, args: &ForceArgs) -> Result<i32> {
    run_stage(ctx, "plan", |log| {
        plan_production(ctx, args.force, log)?;
        Ok(0)
    })
}

fn handle_captions(ctx: &ProductionContext, args: &ForceArgs) -> Result<i32> {
    run_stage(ctx, "captions", |log| {
        let probe = FfprobeProbe::from_config(ctx.config())?;
        caption_production(ctx, &probe, args.force, log)?;
        Ok(0)
    })
}

fn handle_assemble(ctx: &mut ProductionContext, args: &AssembleArgs) -> Result<i32> {
    let config = ctx.config_mut();
    if let Some(volume) = args.voice_volume {
        config.voice_volume = volume;
    }
    if let Some(volume) = args.sfx_volume {
        config.sfx_volume = volume;
    }
    if args.keep_intermediates {
        config.keep_intermediates = true;
    }

    let ctx = &*ctx;
    run_stage(ctx, "assemble", |log| {
        let probe = FfprobeProbe::from_config(ctx.config())?;
        let transcoder = FfmpegTranscoder::from_config(ctx.config())?;
        let plan = ctx.load_plan()?;
        let options = AssemblyOptions::from_config(ctx.config(), args.force);
        log.debug(
            "reel.assemble.levels",
            format!(
                "voice volume {}, sfx volume {}",
                options.levels.voice_volume, options.levels.sfx_volume
            ),
        );
        assemble_final(ctx, &plan, &probe, &transcoder, options, log)?;
        Ok(0)
    })
}

fn handle_kit(ctx: &ProductionContext, args: &ForceArgs) -> Result<i32> {
    run_stage(ctx, "kit", |log| {
        kit_production(ctx, args.force, log)?;
        Ok(0)
    })
}

fn handle_gate(ctx: &ProductionContext) -> Result<i32> {
    run_stage(ctx, "gate", |log| {
        let probe = FfprobeProbe::from_config(ctx.config())?;
        let report = gate_production(ctx, &probe, log)?;
        Ok(if report.pass { 0 } else { 1 })
    })
}

fn handle_probe(ctx: &ProductionContext, args: &ProbeArgs) -> Result<i32> {
    let probe = FfprobeProbe::from_config(ctx.config())?;
    let path = &args.file;
    let duration = probe
        .probe_duration(path)
        .with_context(|| format!("Failed to probe {}", path.display()))?;
    // Audio-only files have no video stream to count.
    let frames = probe.probe_frame_count(path).ok();

    let frames_text = frames.map_or_else(|| "n/a".to_string(), |f| f.to_string());
    emit(
        Level::Info,
        "reel.probe.result",
        &format!(
            "{}: {duration:.3}s, {frames_text} frame(s)",
            path.display()
        ),
        Some(json!({
            "path": path.display().to_string(),
            "duration_seconds": duration,
            "frames": frames,
        })),
    );
    Ok(0)
}
