//! Word timing and caption chunks for the assembled timeline.
//!
//! Included clips occupy consecutive 10s blocks in playback order. Each
//! clip's narration is centered in its block exactly as assembly centers the
//! audio, so caption times and the mixed audio agree by construction.

mod chunk;
mod srt;
mod timing;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::assembly::AssemblyReport;
use crate::config::CaptionSettings;
use crate::context::ProductionContext;
use crate::error::{ReelError, Result};
use crate::media::MediaProbe;
use crate::model::{BLOCK_FRAMES, BLOCK_SECONDS, FPS, Plan};
use crate::provenance::{
    RuntimeInfo, WriteOutcome, build_provenance, write_deterministic, write_provenance,
    write_text_immutable,
};
use crate::report::StageLog;

pub use chunk::chunk_words;
pub use srt::{SrtCue, format_srt, format_timestamp, parse_srt, parse_timestamp};
pub use timing::{allocate_frames, centered_padding, word_weight};

/// Measured narration length of one included clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipVoice {
    pub subsegment_id: String,
    pub voice_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub subsegment_id: String,
    pub block_index: usize,
    pub word: String,
    pub start_frame: u64,
    pub end_frame: u64,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionEntry {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct CaptionBuild {
    pub entries: Vec<CaptionEntry>,
    pub words: Vec<WordTiming>,
}

impl CaptionBuild {
    pub fn to_srt(&self) -> String {
        format_srt(
            self.entries
                .iter()
                .map(|e| (e.start_seconds, e.end_seconds, e.text.as_str())),
        )
    }
}

fn frames_to_seconds(frames: u64) -> f64 {
    frames as f64 / f64::from(FPS)
}

/// Lay out every included clip's words on the shared frame grid.
pub fn build_captions(
    plan: &Plan,
    clips: &[ClipVoice],
    settings: &CaptionSettings,
) -> Result<CaptionBuild> {
    let mut build = CaptionBuild::default();
    let fps = f64::from(FPS);

    for (block_index, clip) in clips.iter().enumerate() {
        let sub = plan.subsegment(&clip.subsegment_id).ok_or_else(|| {
            ReelError::schema(
                "captions",
                format!("clip '{}' is not a plan subsegment", clip.subsegment_id),
            )
        })?;
        let words: Vec<&str> = sub.voice.text.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let voice = clip.voice_seconds.clamp(0.0, BLOCK_SECONDS);
        let block_start = block_index as u64 * BLOCK_FRAMES;
        let block_end = block_start + BLOCK_FRAMES;
        let speech_start = block_start + (centered_padding(voice) * fps).round() as u64;
        let budget = ((voice * fps).round() as u64).max(words.len() as u64);

        let weights: Vec<u64> = words.iter().map(|w| word_weight(w)).collect();
        let frames = allocate_frames(&weights, budget);

        let first_word = build.words.len();
        let mut cursor = speech_start;
        for (word, count) in words.iter().zip(frames) {
            let start = cursor.min(block_end);
            let end = (cursor + count).min(block_end);
            cursor += count;
            build.words.push(WordTiming {
                subsegment_id: sub.id.clone(),
                block_index,
                word: (*word).to_string(),
                start_frame: start,
                end_frame: end,
                start_seconds: frames_to_seconds(start),
                end_seconds: frames_to_seconds(end),
            });
        }

        let clip_words = &build.words[first_word..];
        for range in chunk_words(&words, settings) {
            let start = clip_words[range.start].start_frame;
            let end = clip_words[range.end - 1].end_frame.min(block_end);
            if start >= block_end || end <= start {
                continue;
            }
            build.entries.push(CaptionEntry {
                start_seconds: frames_to_seconds(start),
                end_seconds: frames_to_seconds(end),
                text: words[range].join(" "),
            });
        }
    }
    Ok(build)
}

/// True when `[start, end)` stays inside one block.
pub fn within_one_block(start_seconds: f64, end_seconds: f64) -> bool {
    let block_of = |t: f64| (t / BLOCK_SECONDS).floor() as i64;
    end_seconds >= start_seconds && block_of(start_seconds) == block_of(end_seconds - 1e-6)
}

#[derive(Debug, Serialize)]
struct WordTimingsDocument<'a> {
    reel_id: &'a str,
    fps: u32,
    block_seconds: f64,
    clips: &'a [String],
    words: &'a [WordTiming],
}

#[derive(Debug)]
pub struct CaptionOutcome {
    pub build: CaptionBuild,
    pub included: Vec<String>,
    pub srt_write: WriteOutcome,
    pub timings_write: WriteOutcome,
}

/// Clips the final video will contain: the assembly report's list if there
/// is one, otherwise every subsegment whose narration exists, in plan order.
pub fn included_clips(ctx: &ProductionContext, plan: &Plan) -> Result<Vec<String>> {
    let report_path = ctx.assembly_report_path();
    if report_path.is_file() {
        let report: AssemblyReport = serde_json::from_slice(&std::fs::read(&report_path)?)
            .map_err(|err| ReelError::schema(report_path.display().to_string(), err.to_string()))?;
        return Ok(report.included);
    }
    Ok(plan
        .subsegments
        .iter()
        .filter(|sub| ctx.voice_path(&sub.id).is_file())
        .map(|sub| sub.id.clone())
        .collect())
}

pub fn caption_production(
    ctx: &ProductionContext,
    probe: &dyn MediaProbe,
    force: bool,
    log: &mut StageLog,
) -> Result<CaptionOutcome> {
    let plan = ctx.load_plan()?;
    let included = included_clips(ctx, &plan)?;
    if included.is_empty() {
        log.warn("reel.captions.empty", "no narrated clips found; captions will be empty");
    }

    let mut clips = Vec::with_capacity(included.len());
    let mut voice_paths = Vec::with_capacity(included.len());
    for id in &included {
        let path = ctx.voice_path(id);
        if !path.is_file() {
            return Err(ReelError::MissingArtifact { path });
        }
        let voice_seconds = probe.probe_duration(&path)?;
        log.debug(
            "reel.captions.voice",
            format!("{id}: voice {voice_seconds:.3}s, padding {:.3}s", centered_padding(voice_seconds)),
        );
        clips.push(ClipVoice {
            subsegment_id: id.clone(),
            voice_seconds,
        });
        voice_paths.push((format!("voice:{id}"), path));
    }

    let build = build_captions(&plan, &clips, &ctx.config().captions)?;
    let srt_write = write_text_immutable(&ctx.captions_path(), &build.to_srt(), force)?;
    let timings_write = write_deterministic(
        &ctx.word_timings_path(),
        &WordTimingsDocument {
            reel_id: &plan.reel_id,
            fps: FPS,
            block_seconds: BLOCK_SECONDS,
            clips: &included,
            words: &build.words,
        },
        force,
    )?;
    log.success(
        "reel.captions.written",
        format!(
            "captions.srt {} ({} entries over {} clip(s)), word_timings.json {}",
            srt_write.as_str(),
            build.entries.len(),
            included.len(),
            timings_write.as_str()
        ),
    );

    let plan_path = ctx.plan_path();
    let mut inputs: Vec<(&str, &Path)> = vec![("plan", plan_path.as_path())];
    inputs.extend(voice_paths.iter().map(|(label, path)| (label.as_str(), path.as_path())));
    let settings = &ctx.config().captions;
    let flags = BTreeMap::from([
        ("clips".to_string(), json!(included)),
        ("max_chars".to_string(), json!(settings.max_chars)),
        ("max_words".to_string(), json!(settings.max_words)),
        (
            "sentence_break_min_words".to_string(),
            json!(settings.sentence_break_min_words),
        ),
    ]);
    let record = build_provenance("captions", &inputs, flags, RuntimeInfo::current())?;
    write_provenance(&ctx.provenance_path("captions"), &record, force)?;

    Ok(CaptionOutcome {
        build,
        included,
        srt_write,
        timings_write,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AuditLevel, Claim, Dataset};
    use crate::planner::generate_plan;

    fn plan() -> Plan {
        let claim = Claim {
            claim_id: "c".to_string(),
            claim_text:
                "Most city trees are younger than the buildings around them. Look again."
                    .to_string(),
            supporting_data_ref: "tree census".to_string(),
            audit_level: AuditLevel::Basic,
            tags: Vec::new(),
            risk_notes: Vec::new(),
            thumbnail_text: None,
        };
        let dataset = Dataset::from_value(serde_json::json!({}), "data.json").unwrap();
        generate_plan(&claim, &dataset).unwrap()
    }

    fn clip(id: &str, seconds: f64) -> ClipVoice {
        ClipVoice {
            subsegment_id: id.to_string(),
            voice_seconds: seconds,
        }
    }

    #[test]
    fn speech_starts_after_centering_padding() {
        let build = build_captions(&plan(), &[clip("s01", 7.6)], &CaptionSettings::default())
            .unwrap();
        let first = &build.words[0];
        assert_eq!(first.start_frame, 36);
        let last = build.words.last().unwrap();
        assert_eq!(last.end_frame, 36 + 228);
        assert!((build.entries[0].start_seconds - 1.2).abs() < 1e-9);
    }

    #[test]
    fn word_spans_are_contiguous_within_a_clip() {
        let build = build_captions(&plan(), &[clip("s01", 9.0)], &CaptionSettings::default())
            .unwrap();
        for pair in build.words.windows(2) {
            assert_eq!(pair[0].end_frame, pair[1].start_frame);
            assert!(pair[0].end_frame > pair[0].start_frame);
        }
        let total: u64 = build.words.iter().map(|w| w.end_frame - w.start_frame).sum();
        assert_eq!(total, 270);
    }

    #[test]
    fn entries_never_cross_block_boundaries() {
        let clips = [
            clip("s01", 10.0),
            clip("s02", 12.3),
            clip("s03", 0.2),
            clip("s04", 9.99),
            clip("s05", 4.0),
        ];
        let build = build_captions(&plan(), &clips, &CaptionSettings::default()).unwrap();
        assert!(!build.entries.is_empty());
        for entry in &build.entries {
            assert!(
                within_one_block(entry.start_seconds, entry.end_seconds),
                "{entry:?} crosses a block boundary"
            );
        }
        for cue in parse_srt(&build.to_srt()).unwrap() {
            assert!(within_one_block(cue.start.as_secs_f64(), cue.end.as_secs_f64()));
        }
    }

    #[test]
    fn exclusion_shifts_later_clips_forward() {
        let build = build_captions(
            &plan(),
            &[clip("s01", 8.0), clip("s03", 8.0)],
            &CaptionSettings::default(),
        )
        .unwrap();
        let s03_first = build.words.iter().find(|w| w.subsegment_id == "s03").unwrap();
        assert_eq!(s03_first.block_index, 1);
        assert_eq!(s03_first.start_frame, 300 + 30);
    }

    #[test]
    fn unknown_clip_is_a_schema_error() {
        let err = build_captions(&plan(), &[clip("s42", 5.0)], &CaptionSettings::default())
            .unwrap_err();
        assert!(matches!(err, ReelError::Schema { .. }));
    }
}
