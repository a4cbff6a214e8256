//! Spritesheet geometry and frame addressing.
//!
//! A sheet is a `columns x rows` grid of square cells of `tile_size` pixels.
//! Every phase addresses a cell by [`FrameKey`], whose canonical text form
//! `"{row}_{col}"` is also the frame's file stem on disk.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TailorError, Result};

/// LPC standard cell size.
pub const LPC_TILE_SIZE: u32 = 64;
/// LPC standard column count.
pub const LPC_COLUMNS: u32 = 13;
/// LPC standard row count (extended sheets use 46).
pub const LPC_ROWS: u32 = 21;

/// Extension used for every frame file.
pub const FRAME_EXTENSION: &str = "png";

/// Fixed grid geometry of a spritesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetGrid {
    pub tile_size: u32,
    pub columns: u32,
    pub rows: u32,
}

impl Default for SheetGrid {
    fn default() -> Self {
        Self::lpc()
    }
}

/// Pixel rectangle of one cell within a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SheetGrid {
    pub fn new(tile_size: u32, columns: u32, rows: u32) -> Self {
        Self {
            tile_size,
            columns,
            rows,
        }
    }

    /// The 13x21 grid of 64px cells used by LPC character sheets.
    pub fn lpc() -> Self {
        Self::new(LPC_TILE_SIZE, LPC_COLUMNS, LPC_ROWS)
    }

    /// Same tile size, different row/column counts.
    pub fn with_shape(self, rows: u32, columns: u32) -> Self {
        Self {
            rows,
            columns,
            ..self
        }
    }

    pub fn sheet_width(&self) -> u32 {
        self.columns * self.tile_size
    }

    pub fn sheet_height(&self) -> u32 {
        self.rows * self.tile_size
    }

    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    pub fn cell_rect(&self, key: FrameKey) -> CellRect {
        CellRect {
            x: key.col * self.tile_size,
            y: key.row * self.tile_size,
            width: self.tile_size,
            height: self.tile_size,
        }
    }

    /// Iterate every cell in row-major order.
    pub fn keys(&self) -> impl Iterator<Item = FrameKey> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |row| (0..columns).map(move |col| FrameKey::new(row, col)))
    }

    /// Grid that fits inside an image of the given size (partial cells dropped).
    pub fn fitted_to(&self, width: u32, height: u32) -> SheetGrid {
        Self::new(self.tile_size, width / self.tile_size, height / self.tile_size)
    }

    /// Describe how an image's dimensions differ from this grid.
    ///
    /// Returns `None` when the image is exactly `columns*tile x rows*tile`.
    pub fn dimension_mismatch(&self, width: u32, height: u32) -> Option<String> {
        let mut problems = Vec::new();
        if width != self.sheet_width() {
            problems.push(format!("width {} != expected {}", width, self.sheet_width()));
        }
        if height != self.sheet_height() {
            problems.push(format!("height {} != expected {}", height, self.sheet_height()));
        }
        if problems.is_empty() {
            None
        } else {
            Some(problems.join(", "))
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 || self.columns == 0 || self.rows == 0 {
            return Err(TailorError::Config {
                message: format!(
                    "Grid must be non-zero, got {}px tiles in a {}x{} grid",
                    self.tile_size, self.columns, self.rows
                ),
                help: Some("Set tile_size, columns and rows to at least 1".to_string()),
            });
        }
        let fits = self
            .columns
            .checked_mul(self.tile_size)
            .zip(self.rows.checked_mul(self.tile_size))
            .and_then(|(w, h)| (w as usize).checked_mul(h as usize))
            .and_then(|pixels| pixels.checked_mul(4))
            .is_some();
        if !fits {
            return Err(TailorError::Config {
                message: format!(
                    "A {}x{} grid of {}px tiles is too large for one sheet",
                    self.columns, self.rows, self.tile_size
                ),
                help: Some("Sheet width and height must each fit in 32 bits".to_string()),
            });
        }
        Ok(())
    }
}

/// Grid address of a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameKey {
    pub row: u32,
    pub col: u32,
}

impl FrameKey {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// File name of this frame, e.g. `9_0.png`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self, FRAME_EXTENSION)
    }

    /// Recover the key from a frame path. Anything that is not a
    /// canonical `{row}_{col}.png` name yields `None`.
    pub fn from_path(path: &Path) -> Option<FrameKey> {
        if path.extension().and_then(|e| e.to_str()) != Some(FRAME_EXTENSION) {
            return None;
        }
        path.file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse().ok())
    }
}

impl fmt::Display for FrameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.row, self.col)
    }
}

impl FromStr for FrameKey {
    type Err = TailorError;

    /// Parse the canonical `{row}_{col}` form. Zero-padded or signed
    /// numbers are rejected so one cell can only have one name.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TailorError::Parse {
            message: format!("Invalid frame key '{}'", s),
            help: Some("Frame keys look like ROW_COL, e.g. 9_0".to_string()),
        };

        let (row, col) = s.split_once('_').ok_or_else(invalid)?;
        Ok(FrameKey::new(
            parse_index(row).ok_or_else(invalid)?,
            parse_index(col).ok_or_else(invalid)?,
        ))
    }
}

fn parse_index(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}
