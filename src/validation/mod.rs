//! Frame coverage validation.
//!
//! Checks a fixed region of selected frames in one of two modes:
//!
//! - **leak**: on a composited frame, count pixels the classifier flags
//!   (visible skin by default) and fail above a small tolerance;
//! - **thinness**: on a garment layer alone, fail when too little of the
//!   region is opaque.
//!
//! Failures are advisory. They are collected into a [`ValidationReport`]
//! and never stop compositing or stitching.

mod classifier;
mod coverage;
mod report;

pub use classifier::{
    default_tone_ranges, ClassifierConfig, HsvClassifier, PixelClassifier, ToneRange,
    ToneRangeClassifier, DEFAULT_MIN_ALPHA,
};
pub use coverage::{check_leaks, check_thinness, CoverageRegion, CoverageThreshold, COVERED_ALPHA};
pub use report::{print_report, write_report, ValidationMode, ValidationReport, ValidationResult};

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::{TailorError, Result};
use crate::grid::FrameKey;

/// Walk animation rows of an LPC sheet: up, left, down, right.
pub const WALK_ROWS: [u32; 4] = [7, 8, 9, 10];

/// Default leak tolerance in pixels.
pub const DEFAULT_TOLERANCE: usize = 5;

/// Validation parameters as they appear in a job config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Rows whose frames are validated.
    pub rows: Vec<u32>,
    pub region: CoverageRegion,
    pub tolerance: usize,
    pub classifier: ClassifierConfig,
    pub coverage: CoverageThreshold,
    /// Treat any failed frame as a fatal error.
    pub strict: bool,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            rows: WALK_ROWS.to_vec(),
            region: CoverageRegion::default(),
            tolerance: DEFAULT_TOLERANCE,
            classifier: ClassifierConfig::default(),
            coverage: CoverageThreshold::default(),
            strict: false,
        }
    }
}

impl ValidationSettings {
    /// Check the settings against the frame size they will be applied to.
    pub fn validate(&self, tile_size: u32) -> Result<()> {
        let r = &self.region;
        if r.x2 < r.x1 || r.y2 < r.y1 {
            return Err(TailorError::Config {
                message: format!(
                    "Coverage region ({},{})-({},{}) is inverted",
                    r.x1, r.y1, r.x2, r.y2
                ),
                help: Some("x2/y2 must be at least x1/y1 (corners are inclusive)".to_string()),
            });
        }
        if !r.fits_in(tile_size) {
            return Err(TailorError::Config {
                message: format!(
                    "Coverage region ({},{})-({},{}) does not fit in a {}px frame",
                    r.x1, r.y1, r.x2, r.y2, tile_size
                ),
                help: Some(format!("x2 and y2 must be below {}", tile_size)),
            });
        }
        if let CoverageThreshold::Ratio { min_ratio, .. } = self.coverage {
            if !(0.0..=1.0).contains(&min_ratio) {
                return Err(TailorError::Config {
                    message: format!("Coverage ratio {} is outside 0..1", min_ratio),
                    help: Some("Use a fraction such as 0.85".to_string()),
                });
            }
        }
        Ok(())
    }
}

/// Validator built from settings, holding the chosen classifier.
pub struct Validator {
    rows: Vec<u32>,
    region: CoverageRegion,
    tolerance: usize,
    coverage: CoverageThreshold,
    classifier: Box<dyn PixelClassifier>,
}

impl Validator {
    pub fn new(settings: &ValidationSettings) -> Self {
        Self {
            rows: settings.rows.clone(),
            region: settings.region,
            tolerance: settings.tolerance,
            coverage: settings.coverage,
            classifier: settings.classifier.build(),
        }
    }

    /// Replace the leak classifier.
    pub fn with_classifier(mut self, classifier: impl PixelClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Restrict validation to a different set of rows.
    pub fn with_rows(mut self, rows: Vec<u32>) -> Self {
        self.rows = rows;
        self
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// True if frames at `key` are subject to validation.
    pub fn covers(&self, key: FrameKey) -> bool {
        self.rows.contains(&key.row)
    }

    pub fn check_leaks(&self, img: &RgbaImage, key: FrameKey) -> ValidationResult {
        check_leaks(img, key, &self.region, self.classifier.as_ref(), self.tolerance)
    }

    pub fn check_thinness(&self, img: &RgbaImage, key: FrameKey) -> ValidationResult {
        check_thinness(img, key, &self.region, &self.coverage)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&ValidationSettings::default())
    }
}
