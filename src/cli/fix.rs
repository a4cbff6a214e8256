//! Fix command implementation.
//!
//! Applies the frame repair pass, either from the `fix` section of a job
//! config or from `--frame` flags.

use std::path::PathBuf;

use clap::Args;

use crate::colour::Colour;
use crate::error::{TailorError, Result};
use crate::fix::{fix_frames, FixSettings, FixStats, FrameFix};
use crate::job::PipelineJob;
use crate::output::Printer;

use super::missing_flag;

/// Widen specific garment frames to hide the body
#[derive(Args, Debug)]
pub struct FixArgs {
    /// Job config with a `fix` section
    #[arg(long, conflicts_with_all = ["input", "frame"])]
    pub config: Option<PathBuf>,

    /// Garment frame directory to read
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Directory to write repaired frames (default: overwrite the input)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Frame to widen as ROW_COL:LEFT:RIGHT, e.g. 8_3:0:6
    #[arg(long)]
    pub frame: Vec<FrameFix>,

    /// Fill colour for the widened area
    #[arg(long)]
    pub shadow: Option<Colour>,

    /// Colour of the one-pixel edge
    #[arg(long)]
    pub outline: Option<Colour>,
}

pub fn run(args: FixArgs, printer: &Printer) -> Result<()> {
    if let Some(config) = &args.config {
        let job = PipelineJob::load(config)?;
        let input_label = job.fix.input_label.as_deref().ok_or_else(|| TailorError::Config {
            message: "fix.input_label is not set".to_string(),
            help: Some("Name the garment layer to repair, e.g. \"input_label\": \"robe\"".to_string()),
        })?;
        let output_label = job.fix.output_label.as_deref().unwrap_or(input_label);

        let stats = fix_frames(
            &job.layer_dir(input_label),
            &job.layer_dir(output_label),
            &job.fix,
            printer,
        )?;
        return check_failed(stats);
    }

    let input = args.input.as_ref().ok_or_else(|| missing_flag("--input"))?;
    if args.frame.is_empty() {
        return Err(missing_flag("--frame"));
    }
    let output = args.output.as_ref().unwrap_or(input);

    let defaults = FixSettings::default();
    let settings = FixSettings {
        shadow: args.shadow.unwrap_or(defaults.shadow),
        outline: args.outline.unwrap_or(defaults.outline),
        frames: args.frame.clone(),
        ..defaults
    };

    let stats = fix_frames(input, output, &settings, printer)?;
    check_failed(stats)
}

/// Exit non-zero once every frame was attempted if any could not be repaired.
fn check_failed(stats: FixStats) -> Result<()> {
    if stats.failed == 0 {
        return Ok(());
    }
    Err(TailorError::Pipeline {
        message: format!("{} of the requested frames could not be repaired", stats.failed),
        help: Some("Check the errors above; the other frames were written".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn robe_frame() -> RgbaImage {
        let mut img = RgbaImage::new(64, 64);
        for y in 20..60 {
            for x in 24..40 {
                img.put_pixel(x, y, Rgba([40, 40, 58, 255]));
            }
        }
        img
    }

    #[test]
    fn test_fix_in_place() {
        let dir = tempdir().unwrap();
        let robe = dir.path().join("robe");
        std::fs::create_dir_all(&robe).unwrap();
        robe_frame().save(robe.join("10_6.png")).unwrap();

        let args = FixArgs {
            config: None,
            input: Some(robe.clone()),
            output: None,
            frame: vec!["10_6:5:0".parse().unwrap()],
            shadow: None,
            outline: Some("#ff0000".parse().unwrap()),
        };
        run(args, &Printer::new()).unwrap();

        let fixed = image::open(robe.join("10_6.png")).unwrap().to_rgba8();
        assert_eq!(fixed.get_pixel(19, 30).0, [0x35, 0x35, 0x45, 255]);
        assert_eq!(fixed.get_pixel(18, 30).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_fix_from_config() {
        let dir = tempdir().unwrap();
        let robe = dir.path().join("ws/robe");
        std::fs::create_dir_all(&robe).unwrap();
        robe_frame().save(robe.join("8_0.png")).unwrap();
        std::fs::write(
            dir.path().join("tailor.json"),
            r#"{
                "workspace_dir": "ws",
                "fix": {
                    "input_label": "robe",
                    "output_label": "robe_fixed",
                    "frames": [{"row": 8, "col": 0, "expand_right": 3}]
                }
            }"#,
        )
        .unwrap();

        let args = FixArgs {
            config: Some(dir.path().join("tailor.json")),
            input: None,
            output: None,
            frame: vec![],
            shadow: None,
            outline: None,
        };
        run(args, &Printer::new()).unwrap();

        let fixed = image::open(dir.path().join("ws/robe_fixed/8_0.png")).unwrap().to_rgba8();
        assert_eq!(fixed.get_pixel(42, 30).0, [0x35, 0x35, 0x45, 255]);
        assert_eq!(fixed.get_pixel(43, 30).0, [0x1A, 0x1A, 0x2E, 255]);
    }

    #[test]
    fn test_fix_requires_frames() {
        let dir = tempdir().unwrap();
        let args = FixArgs {
            config: None,
            input: Some(dir.path().to_path_buf()),
            output: None,
            frame: vec![],
            shadow: None,
            outline: None,
        };
        assert!(run(args, &Printer::new()).is_err());
    }
}
