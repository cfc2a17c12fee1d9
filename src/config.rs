use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const CONFIG_FILE_NAME: &str = "reel.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionSettings {
    /// Words per caption chunk before a forced break
    pub max_words: usize,
    /// Characters per caption chunk before a forced break
    pub max_chars: usize,
    /// Minimum words before sentence punctuation closes a chunk
    pub sentence_break_min_words: usize,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            max_words: 7,
            max_chars: 38,
            sentence_break_min_words: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    /// Narration gain in the per-clip mix
    pub voice_volume: f32,
    /// Sound-effect bed gain in the per-clip mix
    pub sfx_volume: f32,
    pub ffmpeg: String,
    pub ffprobe: String,
    pub probe_timeout_secs: u64,
    pub transcode_timeout_secs: u64,
    /// Keep `work/` intermediates after a successful assembly
    pub keep_intermediates: bool,
    pub captions: CaptionSettings,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            voice_volume: Self::DEFAULT_VOICE_VOLUME,
            sfx_volume: Self::DEFAULT_SFX_VOLUME,
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            probe_timeout_secs: 30,
            transcode_timeout_secs: 180,
            keep_intermediates: false,
            captions: CaptionSettings::default(),
        }
    }
}

impl ReelConfig {
    pub const DEFAULT_VOICE_VOLUME: f32 = 1.0;
    pub const DEFAULT_SFX_VOLUME: f32 = 0.25;

    /// Production-local `reel.toml`, then the user config, then defaults.
    pub fn load_for(root: &Path) -> Result<Self> {
        let local = root.join(CONFIG_FILE_NAME);
        if local.is_file() {
            return Self::load_from_path(&local);
        }
        if let Some(user) = user_config_path()
            && user.is_file()
        {
            return Self::load_from_path(&user);
        }
        Ok(Self::default())
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let mut config: Self = toml::from_str(&contents)?;
        config.voice_volume = sanitize_volume(config.voice_volume, Self::DEFAULT_VOICE_VOLUME);
        config.sfx_volume = sanitize_volume(config.sfx_volume, Self::DEFAULT_SFX_VOLUME);
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|err| crate::error::ReelError::schema("reel.toml", err.to_string()))
    }

    pub fn voice_volume(&self) -> f32 {
        sanitize_volume(self.voice_volume, Self::DEFAULT_VOICE_VOLUME)
    }

    pub fn sfx_volume(&self) -> f32 {
        sanitize_volume(self.sfx_volume, Self::DEFAULT_SFX_VOLUME)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs.max(1))
    }
}

fn sanitize_volume(value: f32, fallback: f32) -> f32 {
    if !value.is_finite() || value < 0.0 {
        fallback
    } else {
        value
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("claimreel").join("config.toml"))
}
