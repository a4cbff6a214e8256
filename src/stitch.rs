//! Sheet stitching: the inverse of slicing.
//!
//! Reads `{row}_{col}.png` frames from a directory and places each at its
//! cell origin on a transparent canvas. Cells with no frame stay
//! transparent.

use std::path::Path;

use image::RgbaImage;

use crate::error::{TailorError, Result};
use crate::frame::{conform_to_tile, frame_path, load_rgba, save_png};
use crate::grid::SheetGrid;
use crate::output::{display_path, plural, Printer};

/// Outcome of stitching one sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StitchStats {
    pub placed: usize,
    pub empty: usize,
    pub failed: usize,
}

/// Assemble frames from `input_dir` into a sheet of `grid`'s size.
///
/// Frames that cannot be read are reported and left transparent.
pub fn assemble(input_dir: &Path, grid: &SheetGrid, printer: &Printer) -> Result<(RgbaImage, StitchStats)> {
    if !input_dir.is_dir() {
        return Err(TailorError::MissingInput {
            what: "frame directory",
            path: input_dir.to_path_buf(),
        });
    }

    let mut sheet = RgbaImage::new(grid.sheet_width(), grid.sheet_height());
    let mut stats = StitchStats::default();

    for key in grid.keys() {
        let path = frame_path(input_dir, key);
        if !path.is_file() {
            stats.empty += 1;
            continue;
        }

        let tile = match load_rgba(&path) {
            Ok(img) => conform_to_tile(img, grid.tile_size, &path, printer),
            Err(e) => {
                printer.error("Error", &format!("frame {}: {}", key, e));
                stats.failed += 1;
                continue;
            }
        };

        let rect = grid.cell_rect(key);
        image::imageops::replace(&mut sheet, &tile, rect.x as i64, rect.y as i64);
        stats.placed += 1;
    }

    Ok((sheet, stats))
}

/// Stitch `input_dir` into a sheet written to `output`.
pub fn stitch_sheet(
    input_dir: &Path,
    output: &Path,
    grid: &SheetGrid,
    printer: &Printer,
) -> Result<StitchStats> {
    let (sheet, stats) = assemble(input_dir, grid, printer)?;
    save_png(&sheet, output)?;

    printer.success(
        "Stitched",
        &format!(
            "{} -> {} ({}x{})",
            plural(stats.placed, "frame", "frames"),
            display_path(output),
            sheet.width(),
            sheet.height()
        ),
    );
    if stats.empty > 0 {
        printer.verbose("Empty", &format!("{} cells left transparent", stats.empty));
    }

    Ok(stats)
}
