//! Tailor command implementation.
//!
//! Composites garment layers over a body frame by frame and reports skin
//! leaks, or with `--validate-only` checks garment frames for thin coverage
//! without writing anything.

use std::path::PathBuf;

use clap::Args;

use crate::composite::stack_from_dirs;
use crate::error::Result;
use crate::grid::LPC_TILE_SIZE;
use crate::job::PipelineJob;
use crate::output::Printer;
use crate::pipeline::{check_phases, enforce_strict, run_tailor_phase};
use crate::tailor::{tailor_stack, validate_layer};
use crate::validation::{print_report, write_report, ValidationReport, ValidationSettings, Validator};

use super::missing_flag;

/// Composite garment layers over a body and validate coverage
#[derive(Args, Debug)]
pub struct TailorArgs {
    /// Job config; runs every tailor job it declares
    #[arg(long, conflicts_with_all = ["body", "robe", "layer"])]
    pub config: Option<PathBuf>,

    /// Body frame directory (bottom layer)
    #[arg(long)]
    pub body: Option<PathBuf>,

    /// Robe frame directory; on its own implies --validate-only
    #[arg(long)]
    pub robe: Option<PathBuf>,

    /// Extra overlay directories above the robe, bottom first
    #[arg(long = "layer")]
    pub layer: Vec<PathBuf>,

    /// Directory for composited frames
    #[arg(long, short, default_value = "workspace/frames/composite")]
    pub output: PathBuf,

    /// Check garment thinness only; nothing is written
    #[arg(long)]
    pub validate_only: bool,

    /// Exit non-zero when any frame fails validation
    #[arg(long)]
    pub strict: bool,

    /// Write the validation report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Rows to validate (default: the walk rows 7,8,9,10)
    #[arg(long, value_delimiter = ',')]
    pub rows: Vec<u32>,

    /// Cell size in pixels
    #[arg(long, default_value_t = LPC_TILE_SIZE)]
    pub tile_size: u32,
}

pub fn run(args: TailorArgs, printer: &Printer) -> Result<()> {
    if let Some(config) = &args.config {
        let job = PipelineJob::load(config)?;
        let (outcome, report) = run_tailor_phase(&job, args.validate_only, &[], printer);
        finish(&report, args.report.as_ref(), printer)?;
        check_phases(&[("tailor", &outcome)])?;
        return enforce_strict(&report, args.strict || job.validation.strict);
    }

    let settings = ValidationSettings::default();
    settings.validate(args.tile_size)?;
    let mut validator = Validator::new(&settings);
    if !args.rows.is_empty() {
        validator = validator.with_rows(args.rows.clone());
    }

    let validate_only = args.validate_only || (args.body.is_none() && args.robe.is_some());
    let report = if validate_only {
        let robe = args.robe.as_ref().ok_or_else(|| missing_flag("--robe"))?;
        let mut report = ValidationReport::new();
        for dir in std::iter::once(robe).chain(&args.layer) {
            report.merge(validate_layer(dir, &validator, args.tile_size, printer)?);
        }
        report
    } else {
        let body = args.body.clone().ok_or_else(|| missing_flag("--body"))?;
        let dirs: Vec<PathBuf> = std::iter::once(body)
            .chain(args.robe.clone())
            .chain(args.layer.iter().cloned())
            .collect();
        let stack = stack_from_dirs(&dirs, args.tile_size)?;
        tailor_stack(&stack, &args.output, &validator, printer)?.report
    };

    finish(&report, args.report.as_ref(), printer)?;
    enforce_strict(&report, args.strict)
}

fn finish(report: &ValidationReport, path: Option<&PathBuf>, printer: &Printer) -> Result<()> {
    print_report(report, printer);
    if let Some(path) = path {
        write_report(report, path, printer)?;
    }
    Ok(())
}
