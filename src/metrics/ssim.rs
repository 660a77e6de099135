//! Gaussian-windowed SSIM on grayscale images.
//!
//! Local statistics come from an 11x11 Gaussian window (sigma 1.5) applied as
//! two separable 1-D passes. Borders use reflect-101 extension
//! (`gfedcb|abcdefgh|gfedcba`), so the dense map covers every pixel and the
//! scalar score is the plain mean over that map.

use imgref::ImgVec;

use crate::decode::GrayImage;
use crate::error::Result;

/// Window size of the Gaussian kernel.
pub const WINDOW_SIZE: usize = 11;

/// Standard deviation of the Gaussian kernel.
pub const WINDOW_SIGMA: f64 = 1.5;

const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// Calculate SSIM between two grayscale images.
///
/// # Arguments
///
/// * `reference` - Cover image.
/// * `test` - Stego image.
/// * `max_pixel` - Dynamic range of the samples (255 for 8-bit). The
///   regularization constants are derived from it.
///
/// # Returns
///
/// Mean of the SSIM map: 1.0 for identical images, lower as structure
/// diverges.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`](crate::Error::DimensionMismatch) if
/// the images differ in size and
/// [`Error::MetricCalculation`](crate::Error::MetricCalculation) for empty
/// images.
pub fn calculate_ssim(reference: &GrayImage, test: &GrayImage, max_pixel: f64) -> Result<f64> {
    super::ensure_same_shape(reference, test)?;

    let width = reference.width();
    let height = reference.height();
    super::ensure_nonempty("SSIM", width, height)?;

    let c1 = (K1 * max_pixel).powi(2);
    let c2 = (K2 * max_pixel).powi(2);

    let kernel = gaussian_kernel(WINDOW_SIZE, WINDOW_SIGMA);

    let img1 = to_f64_plane(reference);
    let img2 = to_f64_plane(test);

    let mu1 = blur(&img1, &kernel);
    let mu2 = blur(&img2, &kernel);

    let sq1 = blur(&zip_map(&img1, &img1, |a, b| a * b), &kernel);
    let sq2 = blur(&zip_map(&img2, &img2, |a, b| a * b), &kernel);
    let cross = blur(&zip_map(&img1, &img2, |a, b| a * b), &kernel);

    let mut sum = 0.0;
    for i in 0..width * height {
        let m1 = mu1.buf()[i];
        let m2 = mu2.buf()[i];
        let mu1_sq = m1 * m1;
        let mu2_sq = m2 * m2;
        let mu1_mu2 = m1 * m2;

        let sigma1_sq = sq1.buf()[i] - mu1_sq;
        let sigma2_sq = sq2.buf()[i] - mu2_sq;
        let sigma12 = cross.buf()[i] - mu1_mu2;

        let numerator = (2.0 * mu1_mu2 + c1) * (2.0 * sigma12 + c2);
        let denominator = (mu1_sq + mu2_sq + c1) * (sigma1_sq + sigma2_sq + c2);
        sum += numerator / denominator;
    }

    Ok(sum / (width * height) as f64)
}

/// Normalized 1-D Gaussian kernel of the given odd size.
#[must_use]
pub fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f64> {
    let center = (size / 2) as f64;
    let scale = -0.5 / (sigma * sigma);

    let mut kernel: Vec<f64> = (0..size)
        .map(|i| {
            let x = i as f64 - center;
            (scale * x * x).exp()
        })
        .collect();

    let total: f64 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= total;
    }
    kernel
}

/// Map an out-of-range index back into `0..len` by reflect-101.
fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * len as isize - 2;
    let folded = index.rem_euclid(period);
    if folded >= len as isize {
        (period - folded) as usize
    } else {
        folded as usize
    }
}

fn to_f64_plane(img: &GrayImage) -> ImgVec<f64> {
    let buf: Vec<f64> = img
        .rows()
        .flat_map(|row| row.iter().map(|&p| f64::from(p)))
        .collect();
    ImgVec::new(buf, img.width(), img.height())
}

fn zip_map(a: &ImgVec<f64>, b: &ImgVec<f64>, f: impl Fn(f64, f64) -> f64) -> ImgVec<f64> {
    let buf = a.buf().iter().zip(b.buf()).map(|(&x, &y)| f(x, y)).collect();
    ImgVec::new(buf, a.width(), a.height())
}

/// Separable convolution: horizontal pass, then vertical pass.
fn blur(src: &ImgVec<f64>, kernel: &[f64]) -> ImgVec<f64> {
    let width = src.width();
    let height = src.height();
    let radius = (kernel.len() / 2) as isize;
    let data = src.buf();

    let mut horizontal = vec![0.0; width * height];
    for y in 0..height {
        let row = &data[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = reflect_101(x as isize + k as isize - radius, width);
                acc += weight * row[sx];
            }
            horizontal[y * width + x] = acc;
        }
    }

    let mut out = vec![0.0; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = reflect_101(y as isize + k as isize - radius, height);
                acc += weight * horizontal[sy * width + x];
            }
            out[y * width + x] = acc;
        }
    }

    ImgVec::new(out, width, height)
}
