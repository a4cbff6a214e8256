pub mod completions;
pub mod fix;
pub mod init;
pub mod run;
pub mod slice;
pub mod stitch;
pub mod tailor;

use clap::{Parser, Subcommand};

use crate::error::TailorError;

/// tailor - LPC spritesheet slicing, compositing and stitching
#[derive(Parser, Debug)]
#[command(name = "tailor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Print extra detail, including exact violation coordinates
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cut spritesheets into per-cell frames
    Slice(slice::SliceArgs),

    /// Composite garment layers over a body and validate coverage
    Tailor(tailor::TailorArgs),

    /// Reassemble frames into a spritesheet
    Stitch(stitch::StitchArgs),

    /// Run slice, tailor and stitch from a job config
    Run(run::RunArgs),

    /// Widen specific garment frames to hide the body
    Fix(fix::FixArgs),

    /// Write a starter tailor.json
    Init(init::InitArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Error for a direct-mode flag that has to be given.
pub(crate) fn missing_flag(flag: &str) -> TailorError {
    TailorError::Config {
        message: format!("{} is required without --config", flag),
        help: Some(format!("Pass --config <path> or {}", flag)),
    }
}
