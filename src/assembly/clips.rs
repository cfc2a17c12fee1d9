use std::fs;
use std::path::PathBuf;

use crate::captions::centered_padding;
use crate::context::ProductionContext;
use crate::error::{ReelError, Result};
use crate::media::{MediaProbe, MediaTranscoder, check_duration};
use crate::model::BLOCK_SECONDS;

/// Source triple for one clip.
#[derive(Debug, Clone)]
pub struct ClipSources {
    pub clip_id: String,
    pub video: PathBuf,
    pub voice: PathBuf,
    pub sfx: PathBuf,
}

impl ClipSources {
    pub fn for_clip(ctx: &ProductionContext, clip_id: &str) -> Self {
        Self {
            clip_id: clip_id.to_string(),
            video: ctx.video_path(clip_id),
            voice: ctx.voice_path(clip_id),
            sfx: ctx.sfx_path(clip_id),
        }
    }

    pub fn missing(&self) -> Vec<PathBuf> {
        [&self.video, &self.voice, &self.sfx]
            .into_iter()
            .filter(|path| !path.is_file())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ClipWork {
    pub dir: PathBuf,
    pub centered_voice: PathBuf,
    pub mix: PathBuf,
    pub clip: PathBuf,
}

impl ClipWork {
    pub fn new(ctx: &ProductionContext, clip_id: &str) -> Self {
        let dir = ctx.clip_work_dir(clip_id);
        Self {
            centered_voice: dir.join("voice_centered.wav"),
            mix: dir.join("mix.wav"),
            clip: dir.join("clip.mp4"),
            dir,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssembledClip {
    pub clip_id: String,
    pub path: PathBuf,
    pub voice_seconds: f64,
    pub padding_seconds: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct MixLevels {
    pub voice_volume: f32,
    pub sfx_volume: f32,
}

/// Center, mix and bind one clip, validating the input video and the bound result.
pub fn assemble_clip(
    sources: &ClipSources,
    work: &ClipWork,
    probe: &dyn MediaProbe,
    transcoder: &dyn MediaTranscoder,
    levels: MixLevels,
) -> Result<AssembledClip> {
    check_duration(probe, &sources.video, BLOCK_SECONDS)?;
    let voice_seconds = probe.probe_duration(&sources.voice)?;
    let padding_seconds = centered_padding(voice_seconds);

    fs::create_dir_all(&work.dir).map_err(|err| {
        ReelError::external(
            "assemble",
            format!("cannot create work dir {}: {err}", work.dir.display()),
        )
    })?;
    transcoder.center_voice(&sources.voice, padding_seconds, &work.centered_voice)?;
    transcoder.mix_audio(
        &work.centered_voice,
        &sources.sfx,
        levels.voice_volume,
        levels.sfx_volume,
        &work.mix,
    )?;
    transcoder.bind_audio(&sources.video, &work.mix, &work.clip)?;
    check_duration(probe, &work.clip, BLOCK_SECONDS)?;

    Ok(AssembledClip {
        clip_id: sources.clip_id.clone(),
        path: work.clip.clone(),
        voice_seconds,
        padding_seconds,
    })
}
