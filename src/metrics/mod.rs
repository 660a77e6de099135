//! Fidelity metrics for cover/stego comparison.
//!
//! All metrics operate on 8-bit grayscale images of identical shape:
//!
//! - **MSE**: Mean squared error (lower is better, 0 = identical)
//! - **PSNR**: Peak signal-to-noise ratio in dB (higher is better, infinite
//!   for identical images)
//! - **SSIM**: Gaussian-windowed structural similarity (1 = identical)
//!
//! ## MSE normalization
//!
//! Two conventions are in use for the MSE denominator and they differ by a
//! factor of the pixel count, so the choice is always explicit:
//!
//! | Convention | Denominator | +1 offset on 100x100 |
//! |------------|-------------|----------------------|
//! | [`MseNormalization::PixelCount`] | `rows * cols` | 1.0 |
//! | [`MseNormalization::PixelCountSquared`] | `(rows * cols)^2` | 0.0001 |
//!
//! PSNR is derived from whichever MSE the engine produced.

pub mod ssim;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::decode::GrayImage;
use crate::error::{Error, Result};

pub use ssim::calculate_ssim;

/// Peak sample value of 8-bit images.
pub const MAX_PIXEL_8BIT: f64 = 255.0;

/// Denominator convention for MSE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MseNormalization {
    /// Divide the squared error sum by the pixel count (per-pixel average).
    #[default]
    PixelCount,
    /// Divide the squared error sum by the squared pixel count.
    PixelCountSquared,
}

impl MseNormalization {
    /// Denominator applied to the squared error sum for an image of
    /// `pixel_count` pixels.
    #[must_use]
    pub fn denominator(self, pixel_count: usize) -> f64 {
        let n = pixel_count as f64;
        match self {
            Self::PixelCount => n,
            Self::PixelCountSquared => n * n,
        }
    }

    /// Short name used on the command line.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::PixelCount => "pixel",
            Self::PixelCountSquared => "pixel-squared",
        }
    }
}

impl fmt::Display for MseNormalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for MseNormalization {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pixel" | "pixel-count" => Ok(Self::PixelCount),
            "pixel-squared" | "pixel-count-squared" => Ok(Self::PixelCountSquared),
            other => Err(Error::InvalidConfig(format!(
                "unknown MSE normalization '{other}' (expected pixel or pixel-squared)"
            ))),
        }
    }
}

/// Configuration for the metric engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricConfig {
    /// MSE denominator convention.
    pub normalization: MseNormalization,
    /// Peak sample value, used by PSNR and the SSIM constants.
    pub max_pixel: f64,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            normalization: MseNormalization::PixelCount,
            max_pixel: MAX_PIXEL_8BIT,
        }
    }
}

impl MetricConfig {
    /// Use the given MSE normalization.
    #[must_use]
    pub fn with_normalization(mut self, normalization: MseNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Use the given peak sample value.
    #[must_use]
    pub fn with_max_pixel(mut self, max_pixel: f64) -> Self {
        self.max_pixel = max_pixel;
        self
    }
}

/// Metric values for one cover/stego comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fidelity {
    /// Mean squared error.
    pub mse: f64,
    /// PSNR in dB; `inf` when the images are identical.
    pub psnr: f64,
    /// Mean SSIM.
    pub ssim: f64,
}

/// Computes all three metrics under one [`MetricConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricEngine {
    config: MetricConfig,
}

impl MetricEngine {
    /// Create an engine with the given configuration.
    #[must_use]
    pub fn new(config: MetricConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &MetricConfig {
        &self.config
    }

    /// Compare a cover image against a stego image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the shapes differ.
    pub fn compare(&self, cover: &GrayImage, stego: &GrayImage) -> Result<Fidelity> {
        let mse = calculate_mse(cover, stego, self.config.normalization)?;
        let psnr = calculate_psnr(mse, self.config.max_pixel);
        let ssim = calculate_ssim(cover, stego, self.config.max_pixel)?;

        Ok(Fidelity { mse, psnr, ssim })
    }
}

/// Fail unless both images have the same width and height.
pub(crate) fn ensure_same_shape(a: &GrayImage, b: &GrayImage) -> Result<()> {
    if a.width() != b.width() || a.height() != b.height() {
        return Err(Error::DimensionMismatch {
            expected: (a.width(), a.height()),
            actual: (b.width(), b.height()),
        });
    }
    Ok(())
}

pub(crate) fn ensure_nonempty(metric: &str, width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::MetricCalculation {
            metric: metric.to_string(),
            reason: "image has no pixels".to_string(),
        });
    }
    Ok(())
}

/// Calculate MSE between two grayscale images.
///
/// Samples are widened to `f64` before subtraction.
///
/// # Returns
///
/// Squared error sum divided by the denominator chosen by `normalization`.
/// Exactly 0.0 for pixel-identical images.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if the images differ in size and
/// [`Error::MetricCalculation`] for empty images.
pub fn calculate_mse(
    reference: &GrayImage,
    test: &GrayImage,
    normalization: MseNormalization,
) -> Result<f64> {
    ensure_same_shape(reference, test)?;

    ensure_nonempty("MSE", reference.width(), reference.height())?;
    let pixel_count = reference.width() * reference.height();

    let mut squared_error = 0.0;
    for (ref_row, test_row) in reference.rows().zip(test.rows()) {
        for (r, t) in ref_row.iter().zip(test_row) {
            let diff = f64::from(*r) - f64::from(*t);
            squared_error += diff * diff;
        }
    }

    Ok(squared_error / normalization.denominator(pixel_count))
}

/// Calculate PSNR from an MSE value.
///
/// # Returns
///
/// `10 * log10(max_pixel^2 / mse)` in decibels. Returns `f64::INFINITY` when
/// `mse` is zero and NaN when `mse` is negative or NaN.
#[must_use]
pub fn calculate_psnr(mse: f64, max_pixel: f64) -> f64 {
    if mse.is_nan() || mse < 0.0 {
        return f64::NAN;
    }
    if mse == 0.0 {
        return f64::INFINITY;
    }
    10.0 * (max_pixel * max_pixel / mse).log10()
}
