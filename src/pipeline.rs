//! Pipeline orchestration: slice, tailor, stitch.
//!
//! Phases run strictly in order and communicate only through the workspace
//! on disk, so any phase can be re-run on its own. Gating is per job: a
//! tailor task runs only when every sheet feeding its labels sliced, and an
//! output is stitched only when the task producing it succeeded. Unrelated
//! jobs always run to completion, and the failures are reported together at
//! the end.

use std::fmt;
use std::path::PathBuf;

use crate::error::{TailorError, Result};
use crate::job::PipelineJob;
use crate::output::{display_path, plural, Printer};
use crate::slice::slice_sheet;
use crate::stitch::stitch_sheet;
use crate::tailor::{tailor_stack, validate_layer};
use crate::validation::{print_report, write_report, ValidationReport, Validator};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Slicing,
    Tailoring,
    Stitching,
    Done,
    /// Validate-only runs stop here instead of stitching.
    ValidationReported,
}

impl PipelineState {
    pub fn can_advance_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Slicing)
                | (Idle, Tailoring)
                | (Slicing, Tailoring)
                | (Tailoring, Stitching)
                | (Tailoring, ValidationReported)
                | (Stitching, Done)
        )
    }

    pub fn is_finished(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::ValidationReported)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Slicing => "slicing",
            PipelineState::Tailoring => "tailoring",
            PipelineState::Stitching => "stitching",
            PipelineState::Done => "done",
            PipelineState::ValidationReported => "validation reported",
        };
        f.write_str(name)
    }
}

/// Switches for a single run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Reuse frames already in the workspace.
    pub skip_slice: bool,
    /// Check garment thinness only; nothing is composited, stitched or sliced.
    pub validate_only: bool,
    /// Fail the run when any frame fails validation.
    pub strict: bool,
    /// Write the validation report as JSON here.
    pub report: Option<PathBuf>,
}

/// Task results for one phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseOutcome {
    pub succeeded: usize,
    /// Labels of tasks that failed or were skipped for a failed input.
    pub failed: Vec<String>,
}

impl PhaseOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record<T>(&mut self, result: Result<T>, task: &str, printer: &Printer) -> Option<T> {
        match result {
            Ok(value) => {
                self.succeeded += 1;
                Some(value)
            }
            Err(e) => {
                printer.error("Failed", &format!("{}: {}", task, e));
                self.failed.push(task.to_string());
                None
            }
        }
    }

    fn skip(&mut self, task: &str, reason: &str, printer: &Printer) {
        printer.warning("Skipping", &format!("{}: {}", task, reason));
        self.failed.push(task.to_string());
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub state: PipelineState,
    pub slice: Option<PhaseOutcome>,
    pub tailor: PhaseOutcome,
    pub stitch: Option<PhaseOutcome>,
    pub report: ValidationReport,
}

/// Slice every declared sheet into the workspace.
pub fn run_slice_phase(job: &PipelineJob, printer: &Printer) -> PhaseOutcome {
    let workspace = job.workspace();
    let mut outcome = PhaseOutcome::default();

    for sheet in &job.sheets {
        let path = job.resolve(&sheet.path);
        let result = slice_sheet(&path, &sheet.label, &workspace, &job.grid, printer);
        outcome.record(result, &sheet.label, printer);
    }
    outcome
}

/// Composite and leak-check every tailor task. With `validate_only` the
/// garment layers are checked for thinness instead and nothing is written.
///
/// Tasks reading any label in `unsliced` are skipped and counted as failed.
pub fn run_tailor_phase(
    job: &PipelineJob,
    validate_only: bool,
    unsliced: &[String],
    printer: &Printer,
) -> (PhaseOutcome, ValidationReport) {
    let mut outcome = PhaseOutcome::default();
    let mut report = ValidationReport::new();

    for task in &job.tailor_jobs {
        let missing = std::iter::once(task.body_label.as_str())
            .chain(task.overlay_labels())
            .find(|label| unsliced.iter().any(|s| s.as_str() == *label));
        if let Some(label) = missing {
            outcome.skip(&task.output_label, &format!("layer '{}' was not sliced", label), printer);
            continue;
        }

        let validator = Validator::new(&job.validation).with_rows(job.rows_for(task));

        if validate_only {
            let result = task.overlay_labels().try_fold(ValidationReport::new(), |mut acc, label| {
                let layer = validate_layer(&job.layer_dir(label), &validator, job.grid.tile_size, printer)?;
                acc.merge(layer);
                Ok(acc)
            });
            if let Some(layers) = outcome.record(result, &task.output_label, printer) {
                report.merge(layers);
            }
            continue;
        }

        let stack = job.layer_stack(task);
        let output_dir = job.composite_dir(&task.output_label);
        let result = tailor_stack(&stack, &output_dir, &validator, printer);
        if let Some(tailored) = outcome.record(result, &task.output_label, printer) {
            report.merge(tailored.report);
        }
    }

    (outcome, report)
}

/// Stitch every declared output from its composite directory, skipping
/// outputs whose label is in `untailored`.
pub fn run_stitch_phase(job: &PipelineJob, untailored: &[String], printer: &Printer) -> PhaseOutcome {
    let mut outcome = PhaseOutcome::default();

    for output in &job.outputs {
        if untailored.contains(&output.label) {
            outcome.skip(&output.label, "its tailor job failed", printer);
            continue;
        }
        let input_dir = job.composite_dir(&output.label);
        let path = job.resolve(&output.path);
        let grid = job.output_grid(output);
        let result = stitch_sheet(&input_dir, &path, &grid, printer);
        outcome.record(result, &output.label, printer);
    }
    outcome
}

/// Print each declared output with an exists/missing marker.
pub fn list_outputs(job: &PipelineJob, printer: &Printer) {
    for output in &job.outputs {
        let path = job.resolve(&output.path);
        printer.info(
            "Output",
            &format!("{} {}", printer.mark(path.is_file()), printer.cyan(&display_path(&path))),
        );
    }
}

/// Turn failed tasks into one error naming each of them, so the process
/// exits non-zero after every independent task has run.
pub fn check_phases(phases: &[(&str, &PhaseOutcome)]) -> Result<()> {
    let failed: Vec<String> = phases
        .iter()
        .flat_map(|(phase, outcome)| outcome.failed.iter().map(move |task| format!("{} {}", phase, task)))
        .collect();
    if failed.is_empty() {
        return Ok(());
    }
    Err(TailorError::Pipeline {
        message: format!("{} failed: {}", plural(failed.len(), "task", "tasks"), failed.join(", ")),
        help: Some("Fix the errors above and re-run; frames already written are kept".to_string()),
    })
}

/// Fail the run when strict mode is on and any frame failed validation.
pub fn enforce_strict(report: &ValidationReport, strict: bool) -> Result<()> {
    if strict && report.has_failures() {
        return Err(TailorError::Validation {
            message: report.to_string(),
            help: Some("Fix the reported frames (see `tailor fix`) or run without --strict".to_string()),
        });
    }
    Ok(())
}

/// A single orchestrated run over one job.
pub struct Pipeline<'a> {
    job: &'a PipelineJob,
    options: PipelineOptions,
    printer: &'a Printer,
    state: PipelineState,
}

impl<'a> Pipeline<'a> {
    pub fn new(job: &'a PipelineJob, options: PipelineOptions, printer: &'a Printer) -> Self {
        Self {
            job,
            options,
            printer,
            state: PipelineState::Idle,
        }
    }

    fn advance(&mut self, next: PipelineState) -> Result<()> {
        if !self.state.can_advance_to(next) {
            return Err(TailorError::Pipeline {
                message: format!("cannot move from {} to {}", self.state, next),
                help: None,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Run every phase the options call for.
    pub fn run(mut self) -> Result<PipelineOutcome> {
        let job = self.job;
        let printer = self.printer;
        let strict = self.options.strict || job.validation.strict;

        let mut slice = None;
        if !self.options.skip_slice && !self.options.validate_only {
            self.advance(PipelineState::Slicing)?;
            printer.status("Slicing", &plural(job.sheets.len(), "sheet", "sheets"));
            slice = Some(run_slice_phase(job, printer));
        } else {
            printer.verbose("Skipping", "slice phase");
        }
        let unsliced = slice.as_ref().map(|s| s.failed.as_slice()).unwrap_or(&[]);

        self.advance(PipelineState::Tailoring)?;
        printer.status("Tailoring", &plural(job.tailor_jobs.len(), "job", "jobs"));
        let (tailor, report) = run_tailor_phase(job, self.options.validate_only, unsliced, printer);
        print_report(&report, printer);
        if let Some(path) = &self.options.report {
            write_report(&report, path, printer)?;
        }

        if self.options.validate_only {
            self.advance(PipelineState::ValidationReported)?;
            check_phases(&[("tailor", &tailor)])?;
            enforce_strict(&report, strict)?;
            return Ok(PipelineOutcome {
                state: self.state,
                slice,
                tailor,
                stitch: None,
                report,
            });
        }

        self.advance(PipelineState::Stitching)?;
        printer.status("Stitching", &plural(job.outputs.len(), "output", "outputs"));
        let stitch = run_stitch_phase(job, &tailor.failed, printer);
        self.advance(PipelineState::Done)?;

        list_outputs(job, printer);
        let empty = PhaseOutcome::default();
        check_phases(&[
            ("slice", slice.as_ref().unwrap_or(&empty)),
            ("tailor", &tailor),
            ("stitch", &stitch),
        ])?;
        enforce_strict(&report, strict)?;

        Ok(PipelineOutcome {
            state: self.state,
            slice,
            tailor,
            stitch: Some(stitch),
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{OutputTask, SheetTask, TailorTask};
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    const SKIN: Rgba<u8> = Rgba([210, 170, 150, 255]);
    const ROBE: Rgba<u8> = Rgba([40, 40, 58, 255]);

    #[test]
    fn test_state_transitions() {
        use PipelineState::*;
        assert!(Idle.can_advance_to(Slicing));
        assert!(Idle.can_advance_to(Tailoring));
        assert!(Tailoring.can_advance_to(ValidationReported));
        assert!(!Slicing.can_advance_to(Stitching));
        assert!(!Done.can_advance_to(Slicing));
        assert!(!ValidationReported.can_advance_to(Stitching));
        assert!(Done.is_finished());
        assert!(!Stitching.is_finished());
    }

    /// A 2x2 grid of 64px tiles: body everywhere, robe only in row 1.
    fn small_job(root: &std::path::Path) -> PipelineJob {
        let grid = crate::grid::SheetGrid::new(64, 2, 2);
        let body = RgbaImage::from_pixel(128, 128, SKIN);
        let mut robe = RgbaImage::new(128, 128);
        for y in 64..128 {
            for x in 0..128 {
                robe.put_pixel(x, y, ROBE);
            }
        }
        body.save(root.join("body.png")).unwrap();
        robe.save(root.join("robe.png")).unwrap();

        let mut job = PipelineJob {
            grid,
            sheets: vec![
                SheetTask {
                    path: "body.png".into(),
                    label: "body".to_string(),
                },
                SheetTask {
                    path: "robe.png".into(),
                    label: "robe".to_string(),
                },
            ],
            tailor_jobs: vec![TailorTask {
                body_label: "body".to_string(),
                robe_label: "robe".to_string(),
                output_label: "robed".to_string(),
                layers: vec![],
                validate_rows: None,
            }],
            outputs: vec![OutputTask {
                label: "robed".to_string(),
                path: "out/robed.png".into(),
                rows: None,
                cols: None,
            }],
            ..Default::default()
        };
        job.validation.rows = vec![0, 1];
        job.base_dir = root.to_path_buf();
        job
    }

    #[test]
    fn test_run_reaches_done_with_advisory_failures() {
        let dir = tempdir().unwrap();
        let job = small_job(dir.path());

        let outcome = Pipeline::new(&job, PipelineOptions::default(), &Printer::new())
            .run()
            .unwrap();

        assert_eq!(outcome.state, PipelineState::Done);
        assert_eq!(
            outcome.slice,
            Some(PhaseOutcome {
                succeeded: 2,
                failed: vec![]
            })
        );
        assert_eq!(outcome.report.len(), 4);
        assert_eq!(outcome.report.failed_count(), 2);
        assert!(dir.path().join("out/robed.png").is_file());
    }

    #[test]
    fn test_strict_fails_after_stitching() {
        let dir = tempdir().unwrap();
        let job = small_job(dir.path());
        let options = PipelineOptions {
            strict: true,
            ..Default::default()
        };

        let err = Pipeline::new(&job, options, &Printer::new()).run().unwrap_err();
        assert!(matches!(err, TailorError::Validation { .. }));
        assert!(dir.path().join("out/robed.png").is_file());
    }

    #[test]
    fn test_failed_sheet_only_blocks_its_own_job() {
        let dir = tempdir().unwrap();
        let mut job = small_job(dir.path());
        // Job "a" reads a sheet that does not exist; job "robed" is intact.
        job.sheets.push(SheetTask {
            path: "missing.png".into(),
            label: "body_a".to_string(),
        });
        job.tailor_jobs.insert(
            0,
            TailorTask {
                body_label: "body_a".to_string(),
                robe_label: "robe".to_string(),
                output_label: "a".to_string(),
                layers: vec![],
                validate_rows: None,
            },
        );
        job.outputs.insert(
            0,
            OutputTask {
                label: "a".to_string(),
                path: "out/a.png".into(),
                rows: None,
                cols: None,
            },
        );

        let err = Pipeline::new(&job, PipelineOptions::default(), &Printer::new())
            .run()
            .unwrap_err();

        match err {
            TailorError::Pipeline { message, .. } => {
                assert_eq!(message, "3 tasks failed: slice body_a, tailor a, stitch a");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(dir.path().join("out/robed.png").is_file());
        assert!(dir.path().join("workspace/frames/composite_robed/1_0.png").is_file());
        assert!(!dir.path().join("workspace/frames/composite_a").exists());
        assert!(!dir.path().join("out/a.png").exists());
    }

    #[test]
    fn test_check_phases() {
        let ok = PhaseOutcome {
            succeeded: 3,
            failed: vec![],
        };
        assert!(check_phases(&[("slice", &ok), ("stitch", &ok)]).is_ok());

        let bad = PhaseOutcome {
            succeeded: 1,
            failed: vec!["robed".to_string()],
        };
        let err = check_phases(&[("slice", &ok), ("stitch", &bad)]).unwrap_err();
        assert_eq!(err.to_string(), "Pipeline error: 1 task failed: stitch robed");
    }

    #[test]
    fn test_validate_only_writes_nothing() {
        let dir = tempdir().unwrap();
        let job = small_job(dir.path());
        let ws = job.workspace();

        Pipeline::new(&job, PipelineOptions::default(), &Printer::new())
            .run()
            .unwrap();
        std::fs::remove_dir_all(job.composite_dir("robed")).unwrap();
        std::fs::remove_file(dir.path().join("out/robed.png")).unwrap();

        let options = PipelineOptions {
            validate_only: true,
            report: Some(dir.path().join("report.json")),
            ..Default::default()
        };
        let outcome = Pipeline::new(&job, options, &Printer::new()).run().unwrap();

        assert_eq!(outcome.state, PipelineState::ValidationReported);
        assert!(outcome.slice.is_none());
        assert!(outcome.stitch.is_none());
        // Empty robe cells were never sliced; row 1 is fully covered.
        assert_eq!(outcome.report.len(), 2);
        assert_eq!(outcome.report.failed_count(), 0);
        assert!(!ws.join("composite_robed").exists());
        assert!(!dir.path().join("out/robed.png").exists());
        assert!(dir.path().join("report.json").is_file());
    }

    #[test]
    fn test_enforce_strict() {
        let report = ValidationReport::new();
        assert!(enforce_strict(&report, true).is_ok());
    }
}
