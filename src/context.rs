//! Production folder layout.
//!
//! Every operation receives a [`ProductionContext`] from its caller; nothing in
//! the library resolves an ambient "current production".

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{CONFIG_FILE_NAME, ReelConfig};
use crate::error::Result;
use crate::model::{Plan, load_plan};

/// Directories holding externally generated media. `--fresh` never touches them.
const MEDIA_DIRS: [&str; 4] = ["video", "voice", "sfx", "charts"];

#[derive(Debug, Clone)]
pub struct ProductionContext {
    root: PathBuf,
    config: ReelConfig,
}

impl ProductionContext {
    pub fn new(root: impl Into<PathBuf>, config: ReelConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Build a context for `root`, reading its configuration chain.
    ///
    /// The root is made absolute so paths handed to external tools do not
    /// depend on their working directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = std::path::absolute(root.into())?;
        let config = ReelConfig::load_for(&root)?;
        Ok(Self { root, config })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ReelConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ReelConfig {
        &mut self.config
    }

    pub fn claim_path(&self) -> PathBuf {
        self.root.join("claim.json")
    }

    pub fn data_path(&self) -> PathBuf {
        self.root.join("data.json")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    pub fn plan_path(&self) -> PathBuf {
        self.root.join("plan.json")
    }

    pub fn provenance_dir(&self) -> PathBuf {
        self.root.join("provenance")
    }

    pub fn provenance_path(&self, stage: &str) -> PathBuf {
        self.provenance_dir()
            .join(format!("{stage}.provenance.json"))
    }

    pub fn video_path(&self, subsegment_id: &str) -> PathBuf {
        self.root.join("video").join(format!("{subsegment_id}.mp4"))
    }

    pub fn voice_path(&self, subsegment_id: &str) -> PathBuf {
        self.root.join("voice").join(format!("{subsegment_id}.mp3"))
    }

    pub fn sfx_path(&self, subsegment_id: &str) -> PathBuf {
        self.root.join("sfx").join(format!("{subsegment_id}.mp3"))
    }

    pub fn chart_path(&self, chart_id: &str) -> PathBuf {
        self.root.join("charts").join(format!("{chart_id}.mp4"))
    }

    pub fn captions_path(&self) -> PathBuf {
        self.root.join("captions.srt")
    }

    pub fn word_timings_path(&self) -> PathBuf {
        self.root.join("word_timings.json")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.root.join("work")
    }

    pub fn clip_work_dir(&self, clip_id: &str) -> PathBuf {
        self.work_dir().join(clip_id)
    }

    pub fn final_raw_path(&self) -> PathBuf {
        self.root.join("final_raw.mp4")
    }

    pub fn assembly_report_path(&self) -> PathBuf {
        self.root.join("assembly_report.json")
    }

    pub fn delivery_dir(&self) -> PathBuf {
        self.root.join("delivery")
    }

    pub fn assembly_guide_path(&self) -> PathBuf {
        self.delivery_dir().join("assembly_guide.md")
    }

    pub fn checklist_path(&self) -> PathBuf {
        self.delivery_dir().join("checklist.md")
    }

    pub fn thumbnail_path(&self) -> PathBuf {
        self.delivery_dir().join("thumbnail.png")
    }

    pub fn gate_report_path(&self) -> PathBuf {
        self.root.join("quality_gate.json")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn log_path(&self, stage: &str) -> PathBuf {
        self.logs_dir().join(format!("{stage}.log"))
    }

    pub fn load_plan(&self) -> Result<Plan> {
        load_plan(&self.plan_path())
    }

    /// Create every directory the layout names.
    pub fn ensure_layout(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        for dir in MEDIA_DIRS {
            fs::create_dir_all(self.root.join(dir))?;
        }
        for dir in [self.provenance_dir(), self.delivery_dir(), self.logs_dir()] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Paths a fresh start removes: everything the pipeline derives.
    pub fn derived_outputs(&self) -> Vec<PathBuf> {
        vec![
            self.plan_path(),
            self.provenance_dir(),
            self.captions_path(),
            self.word_timings_path(),
            self.work_dir(),
            self.final_raw_path(),
            self.assembly_report_path(),
            self.assembly_guide_path(),
            self.checklist_path(),
            self.gate_report_path(),
            self.logs_dir(),
        ]
    }

    /// Remove derived outputs, keeping operator inputs and generated media.
    pub fn wipe_derived(&self) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for path in self.derived_outputs() {
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
                removed.push(path);
            } else if path.exists() {
                fs::remove_file(&path)?;
                removed.push(path);
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn layout_paths_are_keyed_by_id() {
        let ctx = ProductionContext::new("/prod", ReelConfig::default());
        assert_eq!(ctx.video_path("s03"), PathBuf::from("/prod/video/s03.mp4"));
        assert_eq!(ctx.voice_path("s03"), PathBuf::from("/prod/voice/s03.mp3"));
        assert_eq!(ctx.chart_path("bar"), PathBuf::from("/prod/charts/bar.mp4"));
        assert_eq!(
            ctx.provenance_path("plan"),
            PathBuf::from("/prod/provenance/plan.provenance.json")
        );
    }

    #[test]
    fn opened_root_is_absolute() {
        let ctx = ProductionContext::open(".").unwrap();
        assert!(ctx.root().is_absolute());
        assert!(ctx.clip_work_dir("s01").is_absolute());
        assert_eq!(ctx.root(), std::env::current_dir().unwrap());
    }

    #[test]
    fn wipe_keeps_inputs_and_media() {
        let dir = TempDir::new().unwrap();
        let ctx = ProductionContext::new(dir.path(), ReelConfig::default());
        ctx.ensure_layout().unwrap();
        fs::write(ctx.claim_path(), "{}").unwrap();
        fs::write(ctx.video_path("s01"), "v").unwrap();
        fs::write(ctx.thumbnail_path(), "png").unwrap();
        fs::write(ctx.plan_path(), "{}").unwrap();
        fs::write(ctx.checklist_path(), "- [ ]").unwrap();

        let removed = ctx.wipe_derived().unwrap();
        assert!(removed.contains(&ctx.plan_path()));
        assert!(!ctx.plan_path().exists());
        assert!(!ctx.checklist_path().exists());
        assert!(ctx.claim_path().exists());
        assert!(ctx.video_path("s01").exists());
        assert!(ctx.thumbnail_path().exists());
    }
}
