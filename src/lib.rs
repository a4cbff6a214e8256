//! tailor - LPC spritesheet tailoring pipeline
//!
//! Slices Universal LPC spritesheets into per-cell frames, composites
//! garment layers over a body frame by frame, validates that the garment
//! hides the body, and stitches the result back into a sheet.

pub mod cli;
pub mod colour;
pub mod composite;
pub mod error;
pub mod fix;
pub mod frame;
pub mod grid;
pub mod job;
pub mod output;
pub mod pipeline;
pub mod slice;
pub mod stitch;
pub mod tailor;
pub mod validation;

pub use colour::Colour;
pub use composite::{alpha_over, blend_over, stack_from_dirs, Layer, LayerStack};
pub use error::{Result, TailorError};
pub use fix::{fix_frames, widen_frame, FixSettings, FixStats, FrameFix};
pub use grid::{FrameKey, SheetGrid};
pub use job::{OutputTask, PipelineJob, SheetTask, TailorTask};
pub use pipeline::{Pipeline, PipelineOptions, PipelineOutcome, PipelineState, PhaseOutcome};
pub use slice::{slice_image, slice_sheet, SliceStats, SlicedCell};
pub use stitch::{assemble, stitch_sheet, StitchStats};
pub use tailor::{tailor_stack, validate_layer, TailorOutcome};
pub use validation::{
    ClassifierConfig, CoverageRegion, CoverageThreshold, PixelClassifier, ValidationMode,
    ValidationReport, ValidationResult, ValidationSettings, Validator,
};
