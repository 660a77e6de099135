//! Batch evaluation and report generation.
//!
//! - [`batch::BatchRunner`]: Drives the embedder across payload files
//! - [`batch::BatchConfig`]: Configuration for a run
//! - [`batch::Embedder`]: The external embedding capability
//! - [`report`]: Report rows, schemas and writers

pub mod batch;
pub mod report;

pub use batch::{
    BatchConfig, BatchConfigBuilder, BatchOutcome, BatchRunner, CommandEmbedder, Embedder,
    SkipReason, SkippedPayload,
};
pub use report::{MetricResult, Report, ReportSchema, ReportWriter};
