//! Pipeline job configuration.
//!
//! A job file (`tailor.json`, or YAML with a `.yaml`/`.yml` extension)
//! declares slice, tailor and stitch tasks that share one workspace.
//! Relative paths resolve against the job file's directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::composite::{Layer, LayerStack};
use crate::error::{TailorError, Result};
use crate::fix::FixSettings;
use crate::grid::SheetGrid;
use crate::validation::ValidationSettings;

/// Default job file name looked up by `tailor run`.
pub const DEFAULT_JOB_FILENAME: &str = "tailor.json";

/// Prefix of composited frame directories inside the workspace.
pub const COMPOSITE_PREFIX: &str = "composite_";

/// A sheet to slice into `{workspace}/{label}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetTask {
    pub path: PathBuf,
    pub label: String,
}

/// A body layer dressed with a robe (and optional extra layers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailorTask {
    pub body_label: String,
    pub robe_label: String,
    pub output_label: String,
    /// Further overlays above the robe, bottom first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<String>,
    /// Overrides the validated rows for this task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_rows: Option<Vec<u32>>,
}

impl TailorTask {
    /// Overlay labels in compositing order.
    pub fn overlay_labels(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.robe_label.as_str()).chain(self.layers.iter().map(String::as_str))
    }
}

/// A composited layer to stitch into a final sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTask {
    pub label: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cols: Option<u32>,
}

/// A complete pipeline job. Read once, immutable during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineJob {
    pub workspace_dir: PathBuf,
    pub grid: SheetGrid,
    pub sheets: Vec<SheetTask>,
    pub tailor_jobs: Vec<TailorTask>,
    pub outputs: Vec<OutputTask>,
    pub validation: ValidationSettings,
    pub fix: FixSettings,

    /// Directory relative paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_workspace() -> PathBuf {
    PathBuf::from("workspace/frames")
}

impl Default for PipelineJob {
    fn default() -> Self {
        Self {
            workspace_dir: default_workspace(),
            grid: SheetGrid::lpc(),
            sheets: vec![],
            tailor_jobs: vec![],
            outputs: vec![],
            validation: ValidationSettings::default(),
            fix: FixSettings::default(),
            base_dir: PathBuf::new(),
        }
    }
}

impl PipelineJob {
    /// Load a job file, choosing JSON or YAML by extension.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(TailorError::MissingInput {
                what: "config",
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| TailorError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read config: {}", e),
        })?;

        let mut job = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::parse_yaml(&content)?,
            _ => Self::parse_json(&content)?,
        };
        job.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        job.validate()?;
        Ok(job)
    }

    pub fn parse_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| TailorError::Config {
            message: format!("Invalid job config: {}", e),
            help: Some("Check the JSON syntax and key names".to_string()),
        })
    }

    pub fn parse_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| TailorError::Config {
            message: format!("Invalid job config: {}", e),
            help: Some("Check the YAML syntax and key names".to_string()),
        })
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.validation.validate(self.grid.tile_size)?;
        for output in &self.outputs {
            self.output_grid(output).validate()?;
        }

        let bad_label = |label: &str| {
            label.is_empty() || label.contains(['/', '\\']) || label == "." || label == ".."
        };
        let labels = self
            .sheets
            .iter()
            .map(|s| s.label.as_str())
            .chain(self.tailor_jobs.iter().flat_map(|t| {
                [t.body_label.as_str(), t.output_label.as_str()]
                    .into_iter()
                    .chain(t.overlay_labels())
            }))
            .chain(self.outputs.iter().map(|o| o.label.as_str()));

        for label in labels {
            if bad_label(label) {
                return Err(TailorError::Config {
                    message: format!("Invalid layer label '{}'", label),
                    help: Some("Labels name a single workspace directory, e.g. body or robe".to_string()),
                });
            }
        }
        Ok(())
    }

    /// Resolve a config-relative path.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn workspace(&self) -> PathBuf {
        self.resolve(&self.workspace_dir)
    }

    pub fn layer_dir(&self, label: &str) -> PathBuf {
        self.workspace().join(label)
    }

    /// `{workspace}/composite_{label}`.
    pub fn composite_dir(&self, output_label: &str) -> PathBuf {
        self.workspace().join(format!("{}{}", COMPOSITE_PREFIX, output_label))
    }

    /// Layer stack for a tailor task, body first.
    pub fn layer_stack(&self, task: &TailorTask) -> LayerStack {
        let workspace = self.workspace();
        task.overlay_labels().fold(
            LayerStack::new(Layer::in_workspace(&workspace, &task.body_label), self.grid.tile_size),
            |stack, label| stack.push(Layer::in_workspace(&workspace, label)),
        )
    }

    /// Grid for an output sheet, falling back to the job grid.
    pub fn output_grid(&self, output: &OutputTask) -> SheetGrid {
        self.grid.with_shape(
            output.rows.unwrap_or(self.grid.rows),
            output.cols.unwrap_or(self.grid.columns),
        )
    }

    /// Rows validated for a tailor task.
    pub fn rows_for(&self, task: &TailorTask) -> Vec<u32> {
        task.validate_rows
            .clone()
            .unwrap_or_else(|| self.validation.rows.clone())
    }

    /// A starter job with one body/robe pair, used by `tailor init`.
    pub fn example() -> Self {
        Self {
            sheets: vec![
                SheetTask {
                    path: PathBuf::from("sheets/body.png"),
                    label: "body".to_string(),
                },
                SheetTask {
                    path: PathBuf::from("sheets/robe.png"),
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
                path: PathBuf::from("dist/robed.png"),
                rows: None,
                cols: None,
            }],
            ..Default::default()
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| TailorError::Config {
            message: format!("Failed to serialize job config: {}", e),
            help: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const JOB_JSON: &str = r#"{
        "workspace_dir": "workspace/frames",
        "sheets": [
            {"path": "../../vendor/lpc/body.png", "label": "body"},
            {"path": "../../vendor/lpc/justice_robes.png", "label": "robe"}
        ],
        "tailor_jobs": [
            {"body_label": "body", "robe_label": "robe", "output_label": "justice"}
        ],
        "outputs": [
            {"label": "justice", "path": "out/justice.png", "rows": 21, "cols": 13}
        ]
    }"#;

    #[test]
    fn test_parse_recognized_keys() {
        let job = PipelineJob::parse_json(JOB_JSON).unwrap();
        assert_eq!(job.sheets.len(), 2);
        assert_eq!(job.sheets[1].label, "robe");
        assert_eq!(job.tailor_jobs[0].output_label, "justice");
        assert_eq!(job.outputs[0].rows, Some(21));
        assert_eq!(job.grid, SheetGrid::lpc());
        assert_eq!(job.validation, ValidationSettings::default());
    }

    #[test]
    fn test_parse_empty_object_uses_defaults() {
        let job = PipelineJob::parse_json("{}").unwrap();
        assert_eq!(job.workspace_dir, PathBuf::from("workspace/frames"));
        assert!(job.sheets.is_empty());
    }

    #[test]
    fn test_parse_yaml() {
        let job = PipelineJob::parse_yaml(
            "workspace_dir: ws\nsheets:\n  - path: body.png\n    label: body\ngrid:\n  rows: 46\n",
        )
        .unwrap();
        assert_eq!(job.workspace_dir, PathBuf::from("ws"));
        assert_eq!(job.grid.rows, 46);
        assert_eq!(job.grid.tile_size, 64);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(PipelineJob::parse_json("{not json").is_err());
        assert!(PipelineJob::parse_json(r#"{"sheets": [{"path": "x.png"}]}"#).is_err());
    }

    #[test]
    fn test_load_resolves_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tailor.json");
        std::fs::write(&path, JOB_JSON).unwrap();

        let job = PipelineJob::load(&path).unwrap();
        assert_eq!(job.workspace(), dir.path().join("workspace/frames"));
        assert_eq!(
            job.composite_dir("justice"),
            dir.path().join("workspace/frames/composite_justice")
        );
        assert_eq!(job.resolve(Path::new("/abs/sheet.png")), PathBuf::from("/abs/sheet.png"));
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = PipelineJob::load(&dir.path().join("none.json")).unwrap_err();
        assert!(err.is_missing_input());
    }

    #[test]
    fn test_rejects_path_like_labels() {
        let job = PipelineJob::parse_json(r#"{"sheets": [{"path": "a.png", "label": "../body"}]}"#).unwrap();
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_output_grid() {
        let mut job = PipelineJob::parse_json(JOB_JSON).unwrap();
        assert!(job.validate().is_ok());
        job.outputs[0].cols = Some(u32::MAX);
        assert!(job.validate().is_err());
        job.outputs[0].cols = Some(0);
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_rejects_region_outside_tile() {
        let mut job = PipelineJob::parse_json(JOB_JSON).unwrap();
        job.grid.tile_size = 32;
        let err = job.validate().unwrap_err();
        assert!(err.to_string().contains("does not fit in a 32px frame"));
    }

    #[test]
    fn test_layer_stack_order() {
        let mut job = PipelineJob::parse_json(JOB_JSON).unwrap();
        job.tailor_jobs[0].layers = vec!["belt".to_string(), "cape".to_string()];
        let stack = job.layer_stack(&job.tailor_jobs[0]);

        assert_eq!(stack.base().label, "body");
        let labels: Vec<&str> = stack.overlays().iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["robe", "belt", "cape"]);
    }

    #[test]
    fn test_output_grid_and_rows() {
        let mut job = PipelineJob::parse_json(JOB_JSON).unwrap();
        job.outputs[0].rows = Some(46);
        job.outputs[0].cols = None;
        let grid = job.output_grid(&job.outputs[0]);
        assert_eq!((grid.rows, grid.columns, grid.tile_size), (46, 13, 64));

        assert_eq!(job.rows_for(&job.tailor_jobs[0]), vec![7, 8, 9, 10]);
        job.tailor_jobs[0].validate_rows = Some(vec![8]);
        assert_eq!(job.rows_for(&job.tailor_jobs[0]), vec![8]);
    }

    #[test]
    fn test_example_round_trips() {
        let example = PipelineJob::example();
        let parsed = PipelineJob::parse_json(&example.to_json().unwrap()).unwrap();
        assert_eq!(parsed, example);
        assert!(parsed.validate().is_ok());
    }
}
