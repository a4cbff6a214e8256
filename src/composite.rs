//! Layer compositing.
//!
//! A [`LayerStack`] is an ordered list of frame directories, bottom first.
//! Every frame present in the base layer is composited with the matching
//! frame of each overlay, in declared order, using Porter-Duff "over".

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

use crate::error::{TailorError, Result};
use crate::frame::{conform_to_tile, frame_path, list_frames, load_rgba, FrameFile};
use crate::grid::FrameKey;
use crate::output::{display_path, Printer};

/// A named stack position backed by a directory of frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub label: String,
    pub dir: PathBuf,
}

impl Layer {
    pub fn new(label: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            dir: dir.into(),
        }
    }

    /// Layer `label` inside a workspace, i.e. `{workspace}/{label}`.
    pub fn in_workspace(workspace: &Path, label: &str) -> Self {
        Self::new(label, workspace.join(label))
    }
}

/// Layers ordered bottom to top.
#[derive(Debug, Clone)]
pub struct LayerStack {
    layers: Vec<Layer>,
    tile_size: u32,
}

impl LayerStack {
    pub fn new(base: Layer, tile_size: u32) -> Self {
        Self {
            layers: vec![base],
            tile_size,
        }
    }

    /// Add a layer on top of everything pushed so far.
    pub fn push(mut self, overlay: Layer) -> Self {
        self.layers.push(overlay);
        self
    }

    pub fn base(&self) -> &Layer {
        &self.layers[0]
    }

    pub fn overlays(&self) -> &[Layer] {
        &self.layers[1..]
    }

    /// Frames that drive compositing: every file in the base layer.
    pub fn base_frames(&self) -> Result<Vec<FrameFile>> {
        list_frames(&self.base().dir)
    }

    /// Warn about overlay directories that do not exist at all.
    pub fn warn_missing_overlays(&self, printer: &Printer) {
        for layer in self.overlays() {
            if !layer.dir.is_dir() {
                printer.warning(
                    "Warning",
                    &format!(
                        "layer '{}' has no frames at {}",
                        layer.label,
                        display_path(&layer.dir)
                    ),
                );
            }
        }
    }

    /// Composite one cell. Overlays without a frame for `key` contribute nothing.
    pub fn composite(&self, key: FrameKey, printer: &Printer) -> Result<RgbaImage> {
        let base_path = frame_path(&self.base().dir, key);
        let mut canvas = conform_to_tile(load_rgba(&base_path)?, self.tile_size, &base_path, printer);

        for layer in self.overlays() {
            let path = frame_path(&layer.dir, key);
            if !path.is_file() {
                continue;
            }
            let overlay = conform_to_tile(load_rgba(&path)?, self.tile_size, &path, printer);
            alpha_over(&mut canvas, &overlay);
        }

        Ok(canvas)
    }
}

/// Composite `overlay` over `base` in place. Both must have the same size.
pub fn alpha_over(base: &mut RgbaImage, overlay: &RgbaImage) {
    debug_assert_eq!(base.dimensions(), overlay.dimensions());

    for (dst, src) in base.pixels_mut().zip(overlay.pixels()) {
        *dst = blend_over(*dst, *src);
    }
}

/// Porter-Duff "source over" for a single pixel.
///
/// A fully transparent `src` leaves `dst` untouched and a fully opaque
/// `src` replaces it exactly.
pub fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    match src[3] {
        0 => return dst,
        255 => return src,
        _ => {}
    }

    let src_a = src[3] as f32 / 255.0;
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    let channel = |s: u8, d: u8| -> u8 {
        let s = s as f32 / 255.0;
        let d = d as f32 / 255.0;
        let out = (s * src_a + d * dst_a * (1.0 - src_a)) / out_a;
        (out.clamp(0.0, 1.0) * 255.0).round() as u8
    };

    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

/// Build a stack from explicit directories, bottom first.
pub fn stack_from_dirs(dirs: &[PathBuf], tile_size: u32) -> Result<LayerStack> {
    let Some((base, overlays)) = dirs.split_first() else {
        return Err(TailorError::Config {
            message: "A layer stack needs at least a base layer".to_string(),
            help: None,
        });
    };

    let label_of = |dir: &PathBuf| {
        dir.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("layer")
            .to_string()
    };

    let mut stack = LayerStack::new(Layer::new(label_of(base), base.clone()), tile_size);
    for dir in overlays {
        stack = stack.push(Layer::new(label_of(dir), dir.clone()));
    }
    Ok(stack)
}
