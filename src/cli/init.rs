//! Init command implementation.
//!
//! Writes a starter `tailor.json` with one body/robe job and every optional
//! section filled in with its defaults.

use std::fs;
use std::path::PathBuf;

use clap::Args;

use crate::error::{TailorError, Result};
use crate::job::{PipelineJob, DEFAULT_JOB_FILENAME};
use crate::output::{display_path, Printer};

/// Write a starter tailor.json
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to write the config in (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing tailor.json
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<()> {
    let config_path = args.path.join(DEFAULT_JOB_FILENAME);

    if config_path.exists() && !args.force {
        return Err(TailorError::Config {
            message: format!("{} already exists", DEFAULT_JOB_FILENAME),
            help: Some("Use --force to overwrite".to_string()),
        });
    }

    fs::create_dir_all(&args.path).map_err(|e| TailorError::Io {
        path: args.path.clone(),
        message: format!("Failed to create directory: {}", e),
    })?;

    let json = PipelineJob::example().to_json()?;
    fs::write(&config_path, json + "\n").map_err(|e| TailorError::Io {
        path: config_path.clone(),
        message: format!("Failed to write config: {}", e),
    })?;

    printer.success("Created", &display_path(&config_path));
    printer.info("Next", "put body.png and robe.png in sheets/, then run `tailor run`");

    Ok(())
}
