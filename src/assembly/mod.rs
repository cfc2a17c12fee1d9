//! Per-clip audio mixing and final concatenation.

mod clips;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::ReelConfig;
use crate::context::ProductionContext;
use crate::error::{ReelError, Result};
use crate::media::{MediaProbe, MediaTranscoder, check_duration};
use crate::model::{BLOCK_SECONDS, Plan};
use crate::provenance::{
    RuntimeInfo, WriteOutcome, build_provenance, publish_file_immutable, write_provenance,
    write_report,
};
use crate::report::StageLog;

pub use clips::{AssembledClip, ClipSources, ClipWork, MixLevels, assemble_clip};

pub const ASSEMBLY_REPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipStatus {
    Assembled,
    Missing,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipReport {
    pub clip_id: String,
    pub status: ClipStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Failure manifest and result of one assembly run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyReport {
    pub schema_version: u32,
    pub reel_id: String,
    pub voice_volume: f32,
    pub sfx_volume: f32,
    pub clips: Vec<ClipReport>,
    /// Clip ids in final playback order.
    pub included: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_write: Option<WriteOutcome>,
}

impl AssemblyReport {
    pub fn count(&self, status: ClipStatus) -> usize {
        self.clips.iter().filter(|c| c.status == status).count()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AssemblyOptions {
    pub levels: MixLevels,
    pub keep_intermediates: bool,
    pub force: bool,
}

impl AssemblyOptions {
    pub fn from_config(config: &ReelConfig, force: bool) -> Self {
        Self {
            levels: MixLevels {
                voice_volume: config.voice_volume(),
                sfx_volume: config.sfx_volume(),
            },
            keep_intermediates: config.keep_intermediates,
            force,
        }
    }
}

/// Assemble every complete clip in ascending id order into `final_raw.mp4`.
///
/// Clips with a missing source are skipped as `missing`; clips whose media
/// steps fail are skipped as `failed`. The run only fails as a whole when no
/// clip survives or the final file itself cannot be produced. The report is
/// written in every case that reaches the end of the clip loop.
pub fn assemble_final(
    ctx: &ProductionContext,
    plan: &Plan,
    probe: &dyn MediaProbe,
    transcoder: &dyn MediaTranscoder,
    options: AssemblyOptions,
    log: &mut StageLog,
) -> Result<AssemblyReport> {
    let mut clip_ids: Vec<&str> = plan.subsegments.iter().map(|s| s.id.as_str()).collect();
    clip_ids.sort_unstable();

    let mut report = AssemblyReport {
        schema_version: ASSEMBLY_REPORT_VERSION,
        reel_id: plan.reel_id.clone(),
        voice_volume: options.levels.voice_volume,
        sfx_volume: options.levels.sfx_volume,
        clips: Vec::with_capacity(clip_ids.len()),
        included: Vec::new(),
        final_path: None,
        final_duration_seconds: None,
        final_write: None,
    };
    let mut assembled: Vec<AssembledClip> = Vec::new();
    let mut sources_used: Vec<ClipSources> = Vec::new();

    for clip_id in &clip_ids {
        let sources = ClipSources::for_clip(ctx, clip_id);
        let missing = sources.missing();
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|p| relative(ctx, p)).collect();
            log.warn(
                "reel.assemble.clip_missing",
                format!("{clip_id}: missing {}", names.join(", ")),
            );
            report.clips.push(ClipReport {
                clip_id: clip_id.to_string(),
                status: ClipStatus::Missing,
                voice_seconds: None,
                padding_seconds: None,
                missing: names,
                reason: None,
            });
            continue;
        }

        let work = ClipWork::new(ctx, clip_id);
        match assemble_clip(&sources, &work, probe, transcoder, options.levels) {
            Ok(clip) => {
                log.info(
                    "reel.assemble.clip_ok",
                    format!(
                        "{clip_id}: voice {:.3}s centered with {:.3}s padding",
                        clip.voice_seconds, clip.padding_seconds
                    ),
                );
                report.clips.push(ClipReport {
                    clip_id: clip_id.to_string(),
                    status: ClipStatus::Assembled,
                    voice_seconds: Some(clip.voice_seconds),
                    padding_seconds: Some(clip.padding_seconds),
                    missing: Vec::new(),
                    reason: None,
                });
                report.included.push(clip_id.to_string());
                assembled.push(clip);
                sources_used.push(sources);
            }
            Err(err) if err.is_unit_failure() => {
                log.error("reel.assemble.clip_failed", format!("{clip_id}: {err}"));
                report.clips.push(ClipReport {
                    clip_id: clip_id.to_string(),
                    status: ClipStatus::Failed,
                    voice_seconds: None,
                    padding_seconds: None,
                    missing: Vec::new(),
                    reason: Some(err.to_string()),
                });
            }
            Err(err) => return Err(err),
        }
    }

    if assembled.is_empty() {
        write_report(&ctx.assembly_report_path(), &report)?;
        log.error(
            "reel.assemble.none",
            format!("no clip could be assembled out of {}", clip_ids.len()),
        );
        return Err(ReelError::NoClipsAssembled {
            attempted: clip_ids.len(),
        });
    }

    let finalized = finalize(ctx, probe, transcoder, &assembled, options.force);
    let (final_write, final_seconds) = match finalized {
        Ok(done) => done,
        Err(err) => {
            write_report(&ctx.assembly_report_path(), &report)?;
            return Err(err);
        }
    };
    report.final_path = Some(relative(ctx, &ctx.final_raw_path()));
    report.final_duration_seconds = Some(final_seconds);
    report.final_write = Some(final_write);
    log.success(
        "reel.assemble.final",
        format!(
            "final_raw.mp4 {} ({} clip(s), {:.3}s)",
            final_write.as_str(),
            assembled.len(),
            final_seconds
        ),
    );

    if !options.keep_intermediates
        && let Err(err) = fs::remove_dir_all(ctx.work_dir())
    {
        log.warn(
            "reel.assemble.cleanup",
            format!("could not remove intermediates: {err}"),
        );
    }

    let plan_path = ctx.plan_path();
    let mut labelled: Vec<(String, PathBuf)> = Vec::new();
    for sources in &sources_used {
        labelled.push((format!("sfx:{}", sources.clip_id), sources.sfx.clone()));
        labelled.push((format!("video:{}", sources.clip_id), sources.video.clone()));
        labelled.push((format!("voice:{}", sources.clip_id), sources.voice.clone()));
    }
    let mut inputs: Vec<(&str, &Path)> = vec![("plan", plan_path.as_path())];
    inputs.extend(labelled.iter().map(|(label, path)| (label.as_str(), path.as_path())));
    let flags = BTreeMap::from([
        ("clips".to_string(), json!(report.included)),
        ("sfx_volume".to_string(), json!(options.levels.sfx_volume)),
        ("voice_volume".to_string(), json!(options.levels.voice_volume)),
    ]);
    let record = build_provenance("assemble", &inputs, flags, RuntimeInfo::current())?;
    write_provenance(&ctx.provenance_path("assemble"), &record, options.force)?;

    write_report(&ctx.assembly_report_path(), &report)?;
    Ok(report)
}

/// Produce the final file in `work/`, validate its length, then publish it.
fn finalize(
    ctx: &ProductionContext,
    probe: &dyn MediaProbe,
    transcoder: &dyn MediaTranscoder,
    assembled: &[AssembledClip],
    force: bool,
) -> Result<(WriteOutcome, f64)> {
    let work_dir = ctx.work_dir();
    fs::create_dir_all(&work_dir)?;
    let scratch = work_dir.join("final_raw.mp4");

    if let [single] = assembled {
        fs::copy(&single.path, &scratch)?;
    } else {
        let paths: Vec<PathBuf> = assembled.iter().map(|c| c.path.clone()).collect();
        transcoder.concat(&paths, &work_dir.join("concat.txt"), &scratch)?;
    }

    let expected = BLOCK_SECONDS * assembled.len() as f64;
    let actual = check_duration(probe, &scratch, expected)?;
    let outcome = publish_file_immutable(&scratch, &ctx.final_raw_path(), force)?;
    Ok((outcome, actual))
}

fn relative(ctx: &ProductionContext, path: &Path) -> String {
    path.strip_prefix(ctx.root())
        .unwrap_or(path)
        .display()
        .to_string()
}
