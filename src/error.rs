//! Error types for stego-eval operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for stego-eval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a fidelity assessment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Failed to load an image file.
    #[error("Image load failed: {path}: {reason}")]
    ImageLoad {
        /// Path to the image that failed to load.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Failed to write an image file.
    #[error("Image save failed: {path}: {reason}")]
    ImageSave {
        /// Destination path.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Image dimensions don't match between cover and stego images.
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height).
        expected: (usize, usize),
        /// Actual dimensions (width, height).
        actual: (usize, usize),
    },

    /// Failed to calculate a quality metric.
    #[error("Metric calculation failed: {metric}: {reason}")]
    MetricCalculation {
        /// Name of the metric that failed.
        metric: String,
        /// Reason for the failure.
        reason: String,
    },

    /// The embedder failed for a payload.
    #[error("Embedding failed for {payload}: {source}")]
    Embed {
        /// Payload that was being embedded.
        payload: PathBuf,
        /// Underlying embedder error.
        #[source]
        source: EmbedError,
    },

    /// Payload directory could not be enumerated.
    #[error("Payload discovery error: {0}")]
    PayloadDiscovery(String),

    /// Required configuration is missing or invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error writing report files.
    #[error("Report error: {0}")]
    Report(String),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Error returned by an [`Embedder`](crate::eval::batch::Embedder).
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The embedder could not be started or hit an I/O error.
    #[error("embedder I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedder ran but reported failure.
    #[error("embedder exited with {status}: {stderr}")]
    Exit {
        /// Exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// Any other embedder-specific failure.
    #[error("{0}")]
    Other(String),
}
