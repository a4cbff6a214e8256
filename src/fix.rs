//! Garment frame repair.
//!
//! Widens a garment frame sideways so it hides the body beneath it. For each
//! scanline between the shoulders and the hem, the outermost opaque pixel on
//! the chosen side is extended with a shadow colour and capped with one
//! outline pixel.

use std::path::Path;
use std::str::FromStr;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::colour::Colour;
use crate::error::{TailorError, Result};
use crate::frame::{frame_path, load_rgba, save_png};
use crate::grid::FrameKey;
use crate::output::{display_path, plural, Printer};

/// Per-frame widening amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameFix {
    pub row: u32,
    pub col: u32,
    #[serde(default)]
    pub expand_left: u32,
    #[serde(default)]
    pub expand_right: u32,
}

impl FrameFix {
    pub fn key(&self) -> FrameKey {
        FrameKey::new(self.row, self.col)
    }
}

impl FromStr for FrameFix {
    type Err = TailorError;

    /// Parse `ROW_COL:LEFT:RIGHT`, e.g. `8_3:0:6`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TailorError::Parse {
            message: format!("Invalid frame fix '{}'", s),
            help: Some("Use ROW_COL:LEFT:RIGHT, e.g. 8_3:0:6".to_string()),
        };

        let mut parts = s.split(':');
        let key: FrameKey = parts.next().ok_or_else(invalid)?.parse()?;
        let mut amount = || -> Result<u32> {
            parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())
        };
        let expand_left = amount()?;
        let expand_right = amount()?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(FrameFix {
            row: key.row,
            col: key.col,
            expand_left,
            expand_right,
        })
    }
}

/// Repair settings as they appear in a job config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixSettings {
    /// Frames directory to read, relative to the workspace.
    pub input_label: Option<String>,
    /// Frames directory to write, relative to the workspace.
    pub output_label: Option<String>,
    pub shadow: Colour,
    pub outline: Colour,
    /// First scanline widened.
    pub shoulder_y: u32,
    /// Scanline after the last one widened.
    pub hem_y: u32,
    /// Scanline sampled to decide whether the frame has a garment at all.
    pub chest_y: u32,
    pub frames: Vec<FrameFix>,
}

impl Default for FixSettings {
    fn default() -> Self {
        Self {
            input_label: None,
            output_label: None,
            shadow: Colour::rgb(53, 53, 69),
            outline: Colour::rgb(26, 26, 46),
            shoulder_y: 24,
            hem_y: 58,
            chest_y: 38,
            frames: Vec::new(),
        }
    }
}

/// Outcome of a repair pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixStats {
    pub fixed: usize,
    pub missing: usize,
    /// Frames that could not be read or written.
    pub failed: usize,
}

/// Widen one garment frame. Frames with nothing on the chest line are
/// returned unchanged.
pub fn widen_frame(img: &RgbaImage, fix: &FrameFix, settings: &FixSettings) -> RgbaImage {
    let mut out = img.clone();
    let (width, height) = img.dimensions();
    let opaque = |x: u32, y: u32| img.get_pixel(x, y)[3] > 0;

    if settings.chest_y >= height || !(0..width).any(|x| opaque(x, settings.chest_y)) {
        return out;
    }

    let shadow = settings.shadow.to_rgba();
    let outline = settings.outline.to_rgba();
    let rows = settings.shoulder_y..settings.hem_y.min(height);

    if fix.expand_left > 0 {
        for y in rows.clone() {
            let Some(edge) = (0..width).find(|&x| opaque(x, y)) else {
                continue;
            };
            for dx in 1..=fix.expand_left {
                if let Some(x) = edge.checked_sub(dx) {
                    out.put_pixel(x, y, shadow);
                }
            }
            if let Some(x) = edge.checked_sub(fix.expand_left + 1) {
                out.put_pixel(x, y, outline);
            }
        }
    }

    if fix.expand_right > 0 {
        for y in rows {
            let Some(edge) = (0..width).rev().find(|&x| opaque(x, y)) else {
                continue;
            };
            for dx in 1..=fix.expand_right {
                let x = edge + dx;
                if x < width {
                    out.put_pixel(x, y, shadow);
                }
            }
            let x = edge + fix.expand_right + 1;
            if x < width {
                out.put_pixel(x, y, outline);
            }
        }
    }

    out
}

/// Apply every configured fix from `input_dir`, writing to `output_dir`.
///
/// A frame that cannot be loaded or saved is reported and counted in
/// `failed`; the remaining frames are still repaired.
pub fn fix_frames(
    input_dir: &Path,
    output_dir: &Path,
    settings: &FixSettings,
    printer: &Printer,
) -> Result<FixStats> {
    let mut stats = FixStats::default();

    for fix in &settings.frames {
        let key = fix.key();
        let source = frame_path(input_dir, key);
        if !source.is_file() {
            printer.warning("Missing", &format!("frame {} not found in {}", key, display_path(input_dir)));
            stats.missing += 1;
            continue;
        }

        let result = load_rgba(&source).and_then(|img| {
            let fixed = widen_frame(&img, fix, settings);
            save_png(&fixed, &frame_path(output_dir, key))
        });
        if let Err(e) = result {
            printer.error("Failed", &format!("frame {}: {}", key, e));
            stats.failed += 1;
            continue;
        }

        printer.success(
            "Fixed",
            &format!("{} (L+{}, R+{})", key, fix.expand_left, fix.expand_right),
        );
        stats.fixed += 1;
    }

    printer.info(
        "Finished",
        &format!("{} -> {}", plural(stats.fixed, "frame", "frames"), display_path(output_dir)),
    );
    Ok(stats)
}
