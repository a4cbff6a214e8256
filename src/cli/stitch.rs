//! Stitch command implementation.

use std::path::PathBuf;

use clap::Args;

use crate::error::Result;
use crate::grid::{SheetGrid, LPC_COLUMNS, LPC_ROWS, LPC_TILE_SIZE};
use crate::job::PipelineJob;
use crate::output::Printer;
use crate::pipeline::{check_phases, list_outputs, run_stitch_phase};
use crate::stitch::stitch_sheet;

use super::missing_flag;

/// Reassemble frames into a spritesheet
#[derive(Args, Debug)]
pub struct StitchArgs {
    /// Job config; stitches every output it declares
    #[arg(long, conflicts_with = "input")]
    pub config: Option<PathBuf>,

    /// Directory of {row}_{col}.png frames
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Sheet to write
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Rows of cells
    #[arg(long, default_value_t = LPC_ROWS)]
    pub rows: u32,

    /// Cells per row
    #[arg(long, default_value_t = LPC_COLUMNS)]
    pub cols: u32,

    /// Cell size in pixels
    #[arg(long, default_value_t = LPC_TILE_SIZE)]
    pub tile_size: u32,
}

pub fn run(args: StitchArgs, printer: &Printer) -> Result<()> {
    if let Some(config) = &args.config {
        let job = PipelineJob::load(config)?;
        let outcome = run_stitch_phase(&job, &[], printer);
        list_outputs(&job, printer);
        return check_phases(&[("stitch", &outcome)]);
    }

    let input = args.input.as_ref().ok_or_else(|| missing_flag("--input"))?;
    let output = args.output.as_ref().ok_or_else(|| missing_flag("--output"))?;
    let grid = SheetGrid::new(args.tile_size, args.cols, args.rows);
    grid.validate()?;

    stitch_sheet(input, output, &grid, printer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn test_stitch_direct() {
        let dir = tempdir().unwrap();
        let frames = dir.path().join("frames");
        std::fs::create_dir_all(&frames).unwrap();
        RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255]))
            .save(frames.join("1_0.png"))
            .unwrap();

        let args = StitchArgs {
            config: None,
            input: Some(frames),
            output: Some(dir.path().join("sheet.png")),
            rows: 2,
            cols: 3,
            tile_size: 8,
        };
        run(args, &Printer::new()).unwrap();

        let sheet = image::open(dir.path().join("sheet.png")).unwrap().to_rgba8();
        assert_eq!(sheet.dimensions(), (24, 16));
        assert_eq!(sheet.get_pixel(0, 8).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_stitch_requires_output() {
        let dir = tempdir().unwrap();
        let args = StitchArgs {
            config: None,
            input: Some(dir.path().to_path_buf()),
            output: None,
            rows: 21,
            cols: 13,
            tile_size: 64,
        };
        assert!(run(args, &Printer::new()).is_err());
    }
}
