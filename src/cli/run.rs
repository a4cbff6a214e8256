//! Run command implementation: the whole pipeline from one job config.

use std::path::PathBuf;

use clap::Args;

use crate::error::Result;
use crate::job::{PipelineJob, DEFAULT_JOB_FILENAME};
use crate::output::{display_path, Printer};
use crate::pipeline::{Pipeline, PipelineOptions};

/// Run slice, tailor and stitch from a job config
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Job config (JSON, or YAML with a .yaml/.yml extension)
    #[arg(long, short, default_value = DEFAULT_JOB_FILENAME)]
    pub config: PathBuf,

    /// Reuse frames already sliced into the workspace
    #[arg(long)]
    pub skip_slice: bool,

    /// Check garment thinness only; nothing is sliced, composited or stitched
    #[arg(long)]
    pub validate_only: bool,

    /// Exit non-zero when any frame fails validation
    #[arg(long)]
    pub strict: bool,

    /// Write the validation report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

pub fn run(args: RunArgs, printer: &Printer) -> Result<()> {
    let job = PipelineJob::load(&args.config)?;
    printer.status("Loading", &display_path(&args.config));

    let options = PipelineOptions {
        skip_slice: args.skip_slice,
        validate_only: args.validate_only,
        strict: args.strict,
        report: args.report,
    };
    let outcome = Pipeline::new(&job, options, printer).run()?;

    printer.success("Finished", &format!("pipeline {}", outcome.state));
    Ok(())
}
