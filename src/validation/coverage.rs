//! Coverage checks over a fixed region of a frame.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::grid::FrameKey;

use super::classifier::PixelClassifier;
use super::report::{ValidationMode, ValidationResult};

/// Alpha above which a garment pixel counts as covering.
pub const COVERED_ALPHA: u8 = 200;

/// Axis-aligned rectangle in frame-local pixels. Both corners are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRegion {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Default for CoverageRegion {
    /// Chest box of a 64px LPC body.
    fn default() -> Self {
        Self::new(24, 28, 42, 48)
    }
}

impl CoverageRegion {
    pub const fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2.saturating_add(1).saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_add(1).saturating_sub(self.y1)
    }

    /// True when the whole region lies inside a `tile_size` square frame.
    pub fn fits_in(&self, tile_size: u32) -> bool {
        self.x2 < tile_size && self.y2 < tile_size
    }

    pub fn area(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Pixels of the region that lie inside a `width x height` frame, row-major.
    ///
    /// With `stride > 1` only every `stride`-th pixel of a diagonal
    /// checkerboard is visited, so stride 2 samples alternating pixels.
    pub fn points(&self, width: u32, height: u32, stride: u32) -> impl Iterator<Item = (u32, u32)> {
        let stride = stride.max(1);
        let (x1, y1) = (self.x1, self.y1);
        let x_end = self.x2.saturating_add(1).min(width);
        let y_end = self.y2.saturating_add(1).min(height);

        (y1..y_end).flat_map(move |y| {
            (x1..x_end)
                .filter(move |x| ((x - x1) + (y - y1)) % stride == 0)
                .map(move |x| (x, y))
        })
    }
}

/// How much of the region a garment must cover on its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoverageThreshold {
    /// Fraction of sampled pixels that must be covered.
    Ratio {
        min_ratio: f32,
        #[serde(default = "default_stride")]
        stride: u32,
    },
    /// Absolute number of covered pixels, scanning every pixel.
    Pixels { min_pixels: usize },
}

fn default_stride() -> u32 {
    2
}

impl Default for CoverageThreshold {
    fn default() -> Self {
        CoverageThreshold::Ratio {
            min_ratio: 0.85,
            stride: default_stride(),
        }
    }
}

impl CoverageThreshold {
    fn stride(&self) -> u32 {
        match self {
            CoverageThreshold::Ratio { stride, .. } => *stride,
            CoverageThreshold::Pixels { .. } => 1,
        }
    }

    fn is_met(&self, covered: usize, sampled: usize) -> bool {
        match *self {
            CoverageThreshold::Ratio { min_ratio, .. } => {
                if sampled == 0 {
                    return false;
                }
                covered as f64 >= min_ratio as f64 * sampled as f64
            }
            CoverageThreshold::Pixels { min_pixels } => covered >= min_pixels,
        }
    }
}

/// Leak mode: count region pixels the classifier says should be hidden.
///
/// Passes when at most `tolerance` pixels match.
pub fn check_leaks(
    img: &RgbaImage,
    key: FrameKey,
    region: &CoverageRegion,
    classifier: &dyn PixelClassifier,
    tolerance: usize,
) -> ValidationResult {
    let mut sampled = 0;
    let violations: Vec<(u32, u32)> = region
        .points(img.width(), img.height(), 1)
        .inspect(|_| sampled += 1)
        .filter(|&(x, y)| classifier.matches(*img.get_pixel(x, y)))
        .collect();

    ValidationResult::new(key, ValidationMode::Leak, violations.len() <= tolerance, sampled, violations)
}

/// Thinness mode: check a garment layer alone covers enough of the region.
///
/// Violations are the sampled pixels that are not covered.
pub fn check_thinness(
    img: &RgbaImage,
    key: FrameKey,
    region: &CoverageRegion,
    threshold: &CoverageThreshold,
) -> ValidationResult {
    let mut sampled = 0;
    let uncovered: Vec<(u32, u32)> = region
        .points(img.width(), img.height(), threshold.stride())
        .inspect(|_| sampled += 1)
        .filter(|&(x, y)| img.get_pixel(x, y)[3] <= COVERED_ALPHA)
        .collect();

    let covered = sampled - uncovered.len();
    let passed = threshold.is_met(covered, sampled);
    ValidationResult::new(key, ValidationMode::Thinness, passed, sampled, uncovered)
}
