//! The tailoring phase: composite a layer stack frame by frame and validate
//! the frames in the watched rows.

use std::path::Path;

use crate::composite::LayerStack;
use crate::error::Result;
use crate::frame::{conform_to_tile, frame_path, list_frames, load_rgba, save_png};
use crate::output::{display_path, plural, Printer};
use crate::validation::{ValidationReport, ValidationResult, Validator};

/// Outcome of tailoring one stack.
#[derive(Debug, Clone, Default)]
pub struct TailorOutcome {
    pub composited: usize,
    /// Frames skipped because they could not be read or written.
    pub failed: usize,
    pub report: ValidationReport,
}

/// Composite every base frame of `stack` into `output_dir`, running the
/// leak check on frames the validator covers.
///
/// Validation failures are reported but the frame is still written.
pub fn tailor_stack(
    stack: &LayerStack,
    output_dir: &Path,
    validator: &Validator,
    printer: &Printer,
) -> Result<TailorOutcome> {
    let frames = stack.base_frames()?;
    stack.warn_missing_overlays(printer);

    let mut outcome = TailorOutcome::default();
    for frame in &frames {
        let composited = match stack.composite(frame.key, printer) {
            Ok(img) => img,
            Err(e) => {
                printer.error("Error", &format!("frame {}: {}", frame.key, e));
                outcome.failed += 1;
                continue;
            }
        };

        if validator.covers(frame.key) {
            let result = validator.check_leaks(&composited, frame.key);
            if !result.passed {
                printer.warning("Leak", &result.describe());
                print_coordinates(&result, printer);
            }
            outcome.report.push(result);
        }

        match save_png(&composited, &frame_path(output_dir, frame.key)) {
            Ok(()) => outcome.composited += 1,
            Err(e) => {
                printer.error("Error", &format!("frame {}: {}", frame.key, e));
                outcome.failed += 1;
            }
        }
    }

    printer.success(
        "Tailored",
        &format!(
            "{} -> {}",
            plural(outcome.composited, "frame", "frames"),
            display_path(output_dir)
        ),
    );
    Ok(outcome)
}

/// Check a garment layer on its own: thinness only, nothing is written.
pub fn validate_layer(
    layer_dir: &Path,
    validator: &Validator,
    tile_size: u32,
    printer: &Printer,
) -> Result<ValidationReport> {
    let mut report = ValidationReport::new();

    for frame in list_frames(layer_dir)? {
        if !validator.covers(frame.key) {
            continue;
        }

        let img = match load_rgba(&frame.path) {
            Ok(img) => conform_to_tile(img, tile_size, &frame.path, printer),
            Err(e) => {
                printer.error("Error", &format!("frame {}: {}", frame.key, e));
                continue;
            }
        };

        let result = validator.check_thinness(&img, frame.key);
        if !result.passed {
            printer.warning("Thin", &result.describe());
            print_coordinates(&result, printer);
        }
        report.push(result);
    }

    printer.success(
        "Checked",
        &format!(
            "{} in {}",
            plural(report.len(), "frame", "frames"),
            display_path(layer_dir)
        ),
    );
    Ok(report)
}

fn print_coordinates(result: &ValidationResult, printer: &Printer) {
    if printer.is_verbose() && !result.violation_pixels.is_empty() {
        printer.verbose("at", &result.coordinates());
    }
}
