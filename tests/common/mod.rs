#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use claimreel::config::ReelConfig;
use claimreel::context::ProductionContext;
use claimreel::media::{MediaProbe, MediaTranscoder, concat_list_contents};
use claimreel::model::Plan;
use claimreel::{ReelError, Result as ReelResult};
use serde_json::json;
use tempfile::TempDir;

/// A throwaway production folder with the default config.
pub struct TestProduction {
    temp_dir: TempDir,
    pub ctx: ProductionContext,
}

impl TestProduction {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let ctx = ProductionContext::new(temp_dir.path(), ReelConfig::default());
        ctx.ensure_layout()?;
        Ok(Self { temp_dir, ctx })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_inputs(&self) -> Result<()> {
        write_json(
            &self.ctx.claim_path(),
            &json!({
                "claim_id": "c-101",
                "claim_text": "Cities lose more water to leaks than they bill.",
                "supporting_data_ref": "utility audit 2023",
                "audit_level": "strict",
                "tags": ["water", "infrastructure"],
                "thumbnail_text": "LEAKS"
            }),
        )?;
        write_json(
            &self.ctx.data_path(),
            &json!({
                "charts": [
                    {"chart_id": "loss", "props": {"title": "Water lost"}},
                    {"chart_id": "billed", "props": {"title": "Water billed"}}
                ]
            }),
        )
    }

    /// Video, voice and sfx for one block.
    pub fn write_clip(&self, clip_id: &str, video_seconds: f64, voice_seconds: f64) -> Result<()> {
        fake_media(&self.ctx.video_path(clip_id), video_seconds, Some(300))?;
        fake_media(&self.ctx.voice_path(clip_id), voice_seconds, None)?;
        fake_media(&self.ctx.sfx_path(clip_id), 10.0, None)
    }

    pub fn write_all_clips(&self, plan: &Plan, voice_seconds: f64) -> Result<()> {
        for sub in &plan.subsegments {
            self.write_clip(&sub.id, 10.0, voice_seconds)?;
        }
        Ok(())
    }

    pub fn write_charts(&self, plan: &Plan) -> Result<()> {
        for (_, chart) in plan.chart_jobs() {
            fake_media(&self.ctx.chart_path(&chart.chart_id), 10.0, Some(chart.frames))?;
        }
        Ok(())
    }

    pub fn write_thumbnail(&self) -> Result<()> {
        fs::write(self.ctx.thumbnail_path(), b"png")?;
        Ok(())
    }
}

pub fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Stand-in media file the fakes understand: `key=value` lines.
pub fn fake_media(path: &Path, seconds: f64, frames: Option<u64>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut text = format!("duration={seconds}\n");
    if let Some(frames) = frames {
        text.push_str(&format!("frames={frames}\n"));
    }
    fs::write(path, text)?;
    Ok(())
}

/// Append a `fail=<operation>` marker so the fake transcoder rejects this input.
pub fn mark_failing(path: &Path, operation: &str) -> Result<()> {
    let mut text = fs::read_to_string(path)?;
    text.push_str(&format!("fail={operation}\n"));
    fs::write(path, text)?;
    Ok(())
}

fn field(path: &Path, key: &str) -> ReelResult<Option<String>> {
    if !path.is_file() {
        return Err(ReelError::MissingArtifact {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path)?;
    Ok(text.lines().find_map(|line| {
        line.strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
            .map(str::to_string)
    }))
}

fn probe_failed(path: &Path, reason: &str) -> ReelError {
    ReelError::ProbeFailed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

pub struct FakeProbe;

impl MediaProbe for FakeProbe {
    fn probe_duration(&self, path: &Path) -> ReelResult<f64> {
        field(path, "duration")?
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| probe_failed(path, "no duration"))
    }

    fn probe_frame_count(&self, path: &Path) -> ReelResult<u64> {
        field(path, "frames")?
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| probe_failed(path, "no video stream"))
    }
}

/// Probe whose tool is never installed.
pub struct MissingProbe;

impl MediaProbe for MissingProbe {
    fn probe_duration(&self, _path: &Path) -> ReelResult<f64> {
        Err(ReelError::ProbeUnavailable {
            tool: "ffprobe".to_string(),
        })
    }

    fn probe_frame_count(&self, _path: &Path) -> ReelResult<u64> {
        Err(ReelError::ProbeUnavailable {
            tool: "ffprobe".to_string(),
        })
    }
}

/// Writes fake media and records every call as `op:<file name>`.
#[derive(Default)]
pub struct FakeTranscoder {
    pub calls: RefCell<Vec<String>>,
}

impl FakeTranscoder {
    fn note(&self, op: &str, input: &Path) -> ReelResult<()> {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.calls.borrow_mut().push(format!("{op}:{name}"));
        if field(input, "fail")?.as_deref() == Some(op) {
            return Err(ReelError::external("ffmpeg", format!("{op} rejected {name}")));
        }
        Ok(())
    }

    pub fn count(&self, op: &str) -> usize {
        let prefix = format!("{op}:");
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.starts_with(&prefix))
            .count()
    }
}

fn write_out(out: &Path, text: String) -> ReelResult<()> {
    fs::write(out, text)?;
    Ok(())
}

impl MediaTranscoder for FakeTranscoder {
    fn center_voice(&self, voice: &Path, _padding_seconds: f64, out: &Path) -> ReelResult<()> {
        self.note("center", voice)?;
        write_out(out, "duration=10\n".to_string())
    }

    fn mix_audio(
        &self,
        voice_track: &Path,
        sfx: &Path,
        voice_volume: f32,
        sfx_volume: f32,
        out: &Path,
    ) -> ReelResult<()> {
        self.note("mix", voice_track)?;
        self.note("mix", sfx)?;
        write_out(
            out,
            format!("duration=10\nvoice_volume={voice_volume}\nsfx_volume={sfx_volume}\n"),
        )
    }

    fn bind_audio(&self, video: &Path, audio: &Path, out: &Path) -> ReelResult<()> {
        self.note("bind", video)?;
        let seconds = field(video, "duration")?.unwrap_or_default();
        let frames = field(video, "frames")?.unwrap_or_default();
        let audio = fs::read_to_string(audio)?;
        write_out(out, format!("duration={seconds}\nframes={frames}\n{audio}"))
    }

    fn concat(&self, clips: &[PathBuf], list_file: &Path, out: &Path) -> ReelResult<()> {
        fs::write(list_file, concat_list_contents(clips))?;
        let mut total = 0.0;
        for clip in clips {
            self.note("concat", clip)?;
            total += FakeProbe.probe_duration(clip)?;
        }
        write_out(out, format!("duration={total}\nclips={}\n", clips.len()))
    }
}
