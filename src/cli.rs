use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

/// Plan and assemble claim-driven vertical videos
#[derive(Parser, Debug)]
#[command(name = "claimreel", author, version, about, long_about = None)]
pub struct Cli {
    /// Production folder to operate on
    #[arg(long, global = true, default_value = ".", value_hint = ValueHint::DirPath)]
    pub root: PathBuf,

    /// Print one JSON event per line instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: ReelCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ReelCommands {
    /// Create the production folder layout and input templates
    Init(InitArgs),
    /// Generate plan.json from claim.json and data.json
    Plan(ForceArgs),
    /// Build captions.srt and word_timings.json from the narration
    Captions(ForceArgs),
    /// Mix and concatenate per-clip media into final_raw.mp4
    Assemble(AssembleArgs),
    /// Write the assembly guide and delivery checklist
    Kit(ForceArgs),
    /// Run the quality gate and write quality_gate.json
    Gate,
    /// Print the measured duration and frame count of a media file
    Probe(ProbeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Overwrite existing templates
    #[arg(long)]
    pub force: bool,

    /// Remove every derived output first (inputs and media are kept)
    #[arg(long)]
    pub fresh: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ForceArgs {
    /// Overwrite existing outputs whose content would change
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AssembleArgs {
    /// Overwrite an existing final_raw.mp4 whose content would change
    #[arg(long)]
    pub force: bool,

    /// Keep work/ intermediates for debugging
    #[arg(long)]
    pub keep_intermediates: bool,

    /// Narration gain (default from reel.toml, 1.0)
    #[arg(long)]
    pub voice_volume: Option<f32>,

    /// Sound-effect gain (default from reel.toml, 0.25)
    #[arg(long)]
    pub sfx_volume: Option<f32>,
}

#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    /// Media file to inspect
    #[arg(value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}
