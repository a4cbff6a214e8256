//! Sheet slicing.
//!
//! Explodes a spritesheet into one PNG per non-empty cell under
//! `{workspace}/{label}/{row}_{col}.png`.

use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::error::Result;
use crate::frame::{frame_path, is_fully_transparent, load_rgba, save_png};
use crate::grid::{FrameKey, SheetGrid};
use crate::output::{display_path, plural, Printer};

/// A single non-empty cell extracted from a spritesheet.
pub struct SlicedCell {
    pub key: FrameKey,
    pub image: RgbaImage,
}

/// Outcome of slicing one sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceStats {
    pub written: usize,
    pub skipped: usize,
    pub output_dir: PathBuf,
}

/// Split an image into grid cells, dropping fully transparent ones.
///
/// Only whole cells are extracted; trailing pixels that do not fill a
/// cell are ignored.
pub fn slice_image(img: &RgbaImage, grid: &SheetGrid) -> (Vec<SlicedCell>, usize) {
    let fitted = grid.fitted_to(img.width(), img.height());
    let mut cells = Vec::new();
    let mut skipped = 0;

    for key in fitted.keys() {
        let rect = fitted.cell_rect(key);
        let sub = image::imageops::crop_imm(img, rect.x, rect.y, rect.width, rect.height)
            .to_image();

        if is_fully_transparent(&sub) {
            skipped += 1;
            continue;
        }

        cells.push(SlicedCell { key, image: sub });
    }

    (cells, skipped)
}

/// Slice `sheet` into `{workspace}/{label}/`.
///
/// A sheet whose size disagrees with `grid` is warned about and sliced
/// with as many whole cells as fit.
pub fn slice_sheet(
    sheet: &Path,
    label: &str,
    workspace: &Path,
    grid: &SheetGrid,
    printer: &Printer,
) -> Result<SliceStats> {
    let img = load_rgba(sheet)?;
    let display = display_path(sheet);

    if let Some(mismatch) = grid.dimension_mismatch(img.width(), img.height()) {
        printer.warning("Warning", &format!("{}: {}", display, mismatch));
    }

    let output_dir = workspace.join(label);
    let (cells, skipped) = slice_image(&img, grid);

    for cell in &cells {
        save_png(&cell.image, &frame_path(&output_dir, cell.key))?;
    }

    printer.success(
        "Sliced",
        &format!(
            "{} -> {} in {}",
            display,
            plural(cells.len(), "frame", "frames"),
            display_path(&output_dir)
        ),
    );
    if skipped > 0 {
        printer.verbose("Skipped", &format!("{} empty cells", skipped));
    }

    Ok(SliceStats {
        written: cells.len(),
        skipped,
        output_dir,
    })
}
