//! Grayscale image loading and saving.
//!
//! Every image entering the metric engine is reduced to a single 8-bit luma
//! plane. Color inputs are converted on load, so a stego image written as RGB
//! is compared on the same footing as a grayscale cover.
//!
//! # Example
//!
//! ```ignore
//! use stego_eval::decode::load_grayscale;
//!
//! let cover = load_grayscale("test/in/medical_image.png")?;
//! println!("{}x{}", cover.width(), cover.height());
//! ```

use std::path::Path;

use imgref::ImgVec;

use crate::error::{Error, Result};

/// 8-bit grayscale image, row-major.
pub type GrayImage = ImgVec<u8>;

/// Load a raster file from disk as 8-bit grayscale.
///
/// # Errors
///
/// Returns [`Error::ImageLoad`] if the file is missing, unreadable, or not a
/// supported raster format.
pub fn load_grayscale(path: impl AsRef<Path>) -> Result<GrayImage> {
    let path = path.as_ref();

    let luma = image::open(path)
        .map_err(|e| Error::ImageLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
        .into_luma8();

    let width = luma.width() as usize;
    let height = luma.height() as usize;

    Ok(ImgVec::new(luma.into_raw(), width, height))
}

/// Save an 8-bit grayscale image. The format follows the file extension.
pub fn save_grayscale(path: impl AsRef<Path>, img: &GrayImage) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    // ImgVec may carry a stride wider than the width; pack rows first.
    let packed: Vec<u8> = img.rows().flat_map(|row| row.iter().copied()).collect();

    let buffer = image::GrayImage::from_raw(img.width() as u32, img.height() as u32, packed)
        .ok_or_else(|| Error::ImageSave {
            path: path.to_path_buf(),
            reason: "pixel buffer does not match dimensions".to_string(),
        })?;

    buffer.save(path).map_err(|e| Error::ImageSave {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load_gray() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradient.png");

        let pixels: Vec<u8> = (0..16 * 8).map(|i| (i * 2) as u8).collect();
        let img = ImgVec::new(pixels.clone(), 16, 8);
        save_grayscale(&path, &img).unwrap();

        let loaded = load_grayscale(&path).unwrap();
        assert_eq!(loaded.width(), 16);
        assert_eq!(loaded.height(), 8);
        assert_eq!(loaded.buf(), &pixels);
    }

    #[test]
    fn test_rgb_converted_to_luma() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.png");

        let rgb = image::RgbImage::from_pixel(4, 3, image::Rgb([90, 90, 90]));
        rgb.save(&path).unwrap();

        let loaded = load_grayscale(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (4, 3));
        assert!(loaded.pixels().all(|p| p == 90));
    }

    #[test]
    fn test_missing_file() {
        let result = load_grayscale("/nonexistent/cover.png");
        assert!(matches!(result, Err(Error::ImageLoad { .. })));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/flat.png");

        save_grayscale(&path, &ImgVec::new(vec![7u8; 9], 3, 3)).unwrap();
        assert!(path.exists());
    }
}
