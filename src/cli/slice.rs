//! Slice command implementation.
//!
//! Cuts one sheet (or every sheet in a job config) into
//! `{output}/{label}/{row}_{col}.png` frames.

use std::path::PathBuf;

use clap::Args;

use crate::error::Result;
use crate::grid::{SheetGrid, LPC_COLUMNS, LPC_ROWS, LPC_TILE_SIZE};
use crate::job::PipelineJob;
use crate::output::Printer;
use crate::pipeline::{check_phases, run_slice_phase};
use crate::slice::slice_sheet;

use super::missing_flag;

/// Cut spritesheets into per-cell frames
#[derive(Args, Debug)]
pub struct SliceArgs {
    /// Job config; slices every sheet it declares
    #[arg(long, conflicts_with = "sheet")]
    pub config: Option<PathBuf>,

    /// Sheet to slice
    #[arg(long)]
    pub sheet: Option<PathBuf>,

    /// Name of the frame directory to create
    #[arg(long, default_value = "frames")]
    pub label: String,

    /// Workspace directory the frame directory is created in
    #[arg(long, short, default_value = "workspace/frames")]
    pub output: PathBuf,

    /// Cell size in pixels
    #[arg(long, default_value_t = LPC_TILE_SIZE)]
    pub tile_size: u32,

    /// Cells per row
    #[arg(long, default_value_t = LPC_COLUMNS)]
    pub columns: u32,

    /// Rows of cells
    #[arg(long, default_value_t = LPC_ROWS)]
    pub rows: u32,
}

pub fn run(args: SliceArgs, printer: &Printer) -> Result<()> {
    if let Some(config) = &args.config {
        let job = PipelineJob::load(config)?;
        let outcome = run_slice_phase(&job, printer);
        return check_phases(&[("slice", &outcome)]);
    }

    let sheet = args.sheet.as_ref().ok_or_else(|| missing_flag("--sheet"))?;
    let grid = SheetGrid::new(args.tile_size, args.columns, args.rows);
    grid.validate()?;

    slice_sheet(sheet, &args.label, &args.output, &grid, printer)?;
    Ok(())
}
