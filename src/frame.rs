//! Frame files on disk.
//!
//! A layer directory holds one `{row}_{col}.png` per non-empty cell. The mere
//! presence of a file means the cell has content.

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbaImage;
use walkdir::WalkDir;

use crate::error::{TailorError, Result};
use crate::grid::FrameKey;
use crate::output::{display_path, Printer};

/// A frame file found in a layer directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFile {
    pub key: FrameKey,
    pub path: PathBuf,
}

pub fn frame_path(dir: &Path, key: FrameKey) -> PathBuf {
    dir.join(key.file_name())
}

/// List the frames in a layer directory, sorted by key.
///
/// Files whose names are not canonical frame keys are ignored.
pub fn list_frames(dir: &Path) -> Result<Vec<FrameFile>> {
    if !dir.is_dir() {
        return Err(TailorError::MissingInput {
            what: "frame directory",
            path: dir.to_path_buf(),
        });
    }

    let mut frames: Vec<FrameFile> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            FrameKey::from_path(e.path()).map(|key| FrameFile {
                key,
                path: e.into_path(),
            })
        })
        .collect();

    frames.sort_by_key(|f| f.key);
    Ok(frames)
}

/// Load an image as RGBA.
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    if !path.exists() {
        return Err(TailorError::MissingInput {
            what: "image",
            path: path.to_path_buf(),
        });
    }

    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|e| TailorError::Image {
            path: path.to_path_buf(),
            message: format!("Failed to load image: {}", e),
        })
}

/// Write an RGBA image as PNG, creating parent directories as needed.
pub fn save_png(img: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| TailorError::Io {
                path: parent.to_path_buf(),
                message: format!("Failed to create directory: {}", e),
            })?;
        }
    }

    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| TailorError::Image {
            path: path.to_path_buf(),
            message: format!("Failed to write PNG: {}", e),
        })
}

/// Returns true if every pixel has alpha == 0.
pub fn is_fully_transparent(img: &RgbaImage) -> bool {
    img.pixels().all(|p| p[3] == 0)
}

/// Force a frame to `tile x tile`, warning when it had to be resized.
///
/// Uses nearest-neighbour sampling so pixel art stays crisp.
pub fn conform_to_tile(img: RgbaImage, tile: u32, path: &Path, printer: &Printer) -> RgbaImage {
    if img.dimensions() == (tile, tile) {
        return img;
    }

    printer.warning(
        "Resizing",
        &format!(
            "{} is {}x{}, expected {}x{}",
            display_path(path),
            img.width(),
            img.height(),
            tile,
            tile
        ),
    );
    imageops::resize(&img, tile, tile, FilterType::Nearest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    #[test]
    fn test_list_frames_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        for name in ["10_2.png", "2_10.png", "2_3.png", "notes.png", "07_1.png"] {
            img.save(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("readme.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("5_5.png")).unwrap();

        let keys: Vec<String> = list_frames(dir.path())
            .unwrap()
            .iter()
            .map(|f| f.key.to_string())
            .collect();
        assert_eq!(keys, vec!["2_3", "2_10", "10_2"]);
    }

    #[test]
    fn test_list_frames_missing_dir() {
        let dir = tempdir().unwrap();
        let err = list_frames(&dir.path().join("nope")).unwrap_err();
        assert!(err.is_missing_input());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/layer/0_0.png");
        let mut img = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 1, Rgba([10, 20, 30, 128]));

        save_png(&img, &path).unwrap();
        assert_eq!(load_rgba(&path).unwrap(), img);
    }

    #[test]
    fn test_load_missing_is_missing_input() {
        let dir = tempdir().unwrap();
        assert!(load_rgba(&dir.path().join("x.png")).unwrap_err().is_missing_input());
    }

    #[test]
    fn test_conform_to_tile_nearest() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 255]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));

        let out = conform_to_tile(img, 4, Path::new("0_0.png"), &Printer::new());
        assert_eq!(out.dimensions(), (4, 4));
        assert_eq!(out.get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(2, 2).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_is_fully_transparent() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 0]));
        assert!(is_fully_transparent(&img));
        img.put_pixel(3, 3, Rgba([0, 0, 0, 1]));
        assert!(!is_fully_transparent(&img));
    }
}
