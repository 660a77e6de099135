//! # stego-eval
//!
//! Fidelity assessment for steganographic embedding.
//!
//! An external embedder hides payloads of increasing size in a cover image;
//! this library measures how far each resulting stego image drifts from the
//! cover (MSE, PSNR, SSIM) and writes the results as a table.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stego_eval::{BatchConfig, BatchRunner, ReportSchema, ReportWriter};
//!
//! let config = BatchConfig::builder()
//!     .cover_image("test/in/medical_image.png")
//!     .key_path("public_key.pem")
//!     .payload_dir("test_texts")
//!     .output_dir("test_out")
//!     .build()?;
//!
//! let runner = BatchRunner::new(config, |payload, cover, output, key| {
//!     // Your embedding logic here
//!     Ok(())
//! });
//!
//! let outcome = runner.run()?;
//! ReportWriter::new(ReportSchema::Compact)
//!     .write_csv(&outcome.report, "assessment_metrics.csv".as_ref())?;
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`decode`]: Grayscale image loading and saving
//! - [`metrics`]: MSE, PSNR and SSIM
//! - [`payload`]: Payload file discovery and naming
//! - [`eval`]: Batch runner and report generation
//! - [`stats`]: Summary statistics over a report

pub mod decode;
pub mod error;
pub mod eval;
pub mod metrics;
pub mod payload;
pub mod stats;

// Re-export commonly used types
pub use decode::{GrayImage, load_grayscale, save_grayscale};
pub use error::{EmbedError, Error, Result};
pub use eval::{
    batch::{BatchConfig, BatchOutcome, BatchRunner, CommandEmbedder, Embedder, SkipReason},
    report::{MetricResult, Report, ReportSchema, ReportWriter},
};
pub use metrics::{
    Fidelity, MetricConfig, MetricEngine, MseNormalization, calculate_mse, calculate_psnr,
    calculate_ssim,
};
pub use payload::{NamingConvention, PayloadFile, discover_payloads};
pub use stats::{ReportSummary, Summary};
