//! Direct image comparison command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use stego_eval::{MetricConfig, MetricEngine, load_grayscale};

use crate::MetricArgs;

pub fn run(reference: PathBuf, test: PathBuf, metrics: &MetricArgs, json: bool) -> Result<()> {
    let reference_img = load_grayscale(&reference)
        .with_context(|| format!("Failed to load {}", reference.display()))?;
    let test_img =
        load_grayscale(&test).with_context(|| format!("Failed to load {}", test.display()))?;

    let config = MetricConfig::default()
        .with_normalization(metrics.normalization.into())
        .with_max_pixel(metrics.max_pixel);

    let fidelity = MetricEngine::new(config)
        .compare(&reference_img, &test_img)
        .with_context(|| {
            format!("Cannot compare {} with {}", reference.display(), test.display())
        })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&fidelity)?);
        return Ok(());
    }

    println!("Reference: {} ({}x{})", reference.display(), reference_img.width(), reference_img.height());
    println!("Test:      {}", test.display());
    println!("MSE ({}): {:.10}", config.normalization, fidelity.mse);
    println!("PSNR:      {:.2} dB", fidelity.psnr);
    println!("SSIM:      {:.4}", fidelity.ssim);

    Ok(())
}
