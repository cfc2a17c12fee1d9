use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::process::run_bounded;
use crate::config::ReelConfig;
use crate::error::{ReelError, Result};
use crate::model::BLOCK_SECONDS;

/// The four media operations assembly needs. Each writes exactly `out`.
pub trait MediaTranscoder {
    /// Delay `voice` by `padding_seconds` and pad/trim it to one block.
    fn center_voice(&self, voice: &Path, padding_seconds: f64, out: &Path) -> Result<()>;

    fn mix_audio(
        &self,
        voice_track: &Path,
        sfx: &Path,
        voice_volume: f32,
        sfx_volume: f32,
        out: &Path,
    ) -> Result<()>;

    /// Attach `audio` to the video stream of `video` without re-encoding video.
    fn bind_audio(&self, video: &Path, audio: &Path, out: &Path) -> Result<()>;

    /// Stream-copy `clips` into `out` in the given order.
    fn concat(&self, clips: &[PathBuf], list_file: &Path, out: &Path) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn locate(tool: &str, timeout: Duration) -> Result<Self> {
        let binary = which::which(tool)
            .map_err(|_| ReelError::external(tool, "not found on PATH"))?;
        Ok(Self { binary, timeout })
    }

    pub fn from_config(config: &ReelConfig) -> Result<Self> {
        Self::locate(&config.ffmpeg, config.transcode_timeout())
    }

    fn run(&self, args: Vec<String>) -> Result<()> {
        run_bounded(&self.binary, &args, self.timeout).map(|_| ())
    }
}

impl MediaTranscoder for FfmpegTranscoder {
    fn center_voice(&self, voice: &Path, padding_seconds: f64, out: &Path) -> Result<()> {
        self.run(center_voice_args(voice, padding_seconds, out))
    }

    fn mix_audio(
        &self,
        voice_track: &Path,
        sfx: &Path,
        voice_volume: f32,
        sfx_volume: f32,
        out: &Path,
    ) -> Result<()> {
        self.run(mix_args(voice_track, sfx, voice_volume, sfx_volume, out))
    }

    fn bind_audio(&self, video: &Path, audio: &Path, out: &Path) -> Result<()> {
        self.run(bind_args(video, audio, out))
    }

    fn concat(&self, clips: &[PathBuf], list_file: &Path, out: &Path) -> Result<()> {
        fs::write(list_file, concat_list_contents(&absolute_paths(clips)?))?;
        self.run(concat_args(list_file, out))
    }
}

fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn base_args() -> Vec<String> {
    vec!["-y".to_string(), "-v".to_string(), "error".to_string()]
}

pub fn center_voice_args(voice: &Path, padding_seconds: f64, out: &Path) -> Vec<String> {
    let delay_ms = (padding_seconds.max(0.0) * 1000.0).round() as u64;
    let filter = format!(
        "adelay=delays={delay_ms}:all=1,apad=whole_dur={BLOCK_SECONDS},atrim=end={BLOCK_SECONDS}"
    );
    let mut args = base_args();
    args.extend([
        "-i".to_string(),
        arg(voice),
        "-af".to_string(),
        filter,
        "-ac".to_string(),
        "2".to_string(),
        "-ar".to_string(),
        "48000".to_string(),
        arg(out),
    ]);
    args
}

pub fn mix_filter(voice_volume: f32, sfx_volume: f32) -> String {
    format!(
        "[0:a]volume={voice_volume}[v];[1:a]volume={sfx_volume}[s];\
         [v][s]amix=inputs=2:duration=first:dropout_transition=0:normalize=0,\
         atrim=end={BLOCK_SECONDS}[aout]"
    )
}

pub fn mix_args(
    voice_track: &Path,
    sfx: &Path,
    voice_volume: f32,
    sfx_volume: f32,
    out: &Path,
) -> Vec<String> {
    let mut args = base_args();
    args.extend([
        "-i".to_string(),
        arg(voice_track),
        "-i".to_string(),
        arg(sfx),
        "-filter_complex".to_string(),
        mix_filter(voice_volume, sfx_volume),
        "-map".to_string(),
        "[aout]".to_string(),
        "-ac".to_string(),
        "2".to_string(),
        "-ar".to_string(),
        "48000".to_string(),
        arg(out),
    ]);
    args
}

pub fn bind_args(video: &Path, audio: &Path, out: &Path) -> Vec<String> {
    let mut args = base_args();
    args.extend([
        "-i".to_string(),
        arg(video),
        "-i".to_string(),
        arg(audio),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "1:a:0".to_string(),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "192k".to_string(),
        "-t".to_string(),
        BLOCK_SECONDS.to_string(),
        "-fflags".to_string(),
        "+bitexact".to_string(),
        arg(out),
    ]);
    args
}

pub fn concat_args(list_file: &Path, out: &Path) -> Vec<String> {
    let mut args = base_args();
    args.extend([
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        arg(list_file),
        "-c".to_string(),
        "copy".to_string(),
        "-fflags".to_string(),
        "+bitexact".to_string(),
        arg(out),
    ]);
    args
}

/// The concat demuxer resolves relative entries against the list file's directory.
pub fn absolute_paths(clips: &[PathBuf]) -> Result<Vec<PathBuf>> {
    clips
        .iter()
        .map(|clip| std::path::absolute(clip).map_err(ReelError::from))
        .collect()
}

/// Concat demuxer list; single quotes in paths are escaped the way the demuxer expects.
pub fn concat_list_contents(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|clip| format!("file '{}'\n", arg(clip).replace('\'', "'\\''")))
        .collect()
}
