//! Batch evaluation over payload files.
//!
//! [`BatchRunner`] is the main entry point. For every payload it calls an
//! external [`Embedder`], reloads the stego image the embedder wrote, and
//! measures it against the cover image. Failures of a single payload are
//! logged and recorded as [`SkippedPayload`]s; the batch always moves on to
//! the next payload.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::decode::{GrayImage, load_grayscale};
use crate::error::{EmbedError, Error, Result};
use crate::eval::report::{MetricResult, Report};
use crate::metrics::{MetricConfig, MetricEngine};
use crate::payload::{NamingConvention, PayloadFile, discover_payloads};

/// The steganographic embedding capability.
///
/// Implementations hide the payload at `payload` inside the image at `cover`
/// and write the result to `output`. `key` is forwarded untouched.
pub trait Embedder {
    /// Embed one payload.
    fn embed(&self, payload: &Path, cover: &Path, output: &Path, key: &Path)
    -> std::result::Result<(), EmbedError>;
}

impl<F> Embedder for F
where
    F: Fn(&Path, &Path, &Path, &Path) -> std::result::Result<(), EmbedError>,
{
    fn embed(
        &self,
        payload: &Path,
        cover: &Path,
        output: &Path,
        key: &Path,
    ) -> std::result::Result<(), EmbedError> {
        self(payload, cover, output, key)
    }
}

/// Runs an external program as the embedder.
///
/// Arguments may contain the placeholders `{payload}`, `{cover}`, `{output}`
/// and `{key}`, which are replaced by the corresponding paths.
///
/// ```ignore
/// let embedder = CommandEmbedder::new("python3")
///     .args(["hide.py", "{payload}", "{cover}", "{output}", "{key}"]);
/// ```
#[derive(Debug, Clone)]
pub struct CommandEmbedder {
    program: String,
    args: Vec<String>,
}

impl CommandEmbedder {
    /// Create an embedder running `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append argument templates.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn expand(template: &str, payload: &Path, cover: &Path, output: &Path, key: &Path) -> String {
        template
            .replace("{payload}", &payload.to_string_lossy())
            .replace("{cover}", &cover.to_string_lossy())
            .replace("{output}", &output.to_string_lossy())
            .replace("{key}", &key.to_string_lossy())
    }
}

impl Embedder for CommandEmbedder {
    fn embed(
        &self,
        payload: &Path,
        cover: &Path,
        output: &Path,
        key: &Path,
    ) -> std::result::Result<(), EmbedError> {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| Self::expand(a, payload, cover, output, key))
            .collect();

        log::debug!("Running embedder: {} {}", self.program, args.join(" "));
        let out = Command::new(&self.program).args(&args).output()?;

        if out.status.success() {
            Ok(())
        } else {
            Err(EmbedError::Exit {
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            })
        }
    }
}

/// Configuration for a batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Cover image every payload is embedded into.
    pub cover_image: PathBuf,

    /// Key artifact forwarded to the embedder.
    pub key_path: PathBuf,

    /// Directory holding payload files.
    pub payload_dir: PathBuf,

    /// Directory receiving stego images.
    pub output_dir: PathBuf,

    /// Payload and stego naming rules.
    pub naming: NamingConvention,

    /// Metric configuration.
    pub metrics: MetricConfig,

    /// Name recorded in the report.
    pub report_name: String,
}

impl BatchConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder::default()
    }

    /// Path of the stego image for a payload.
    #[must_use]
    pub fn output_path(&self, payload: &PayloadFile) -> PathBuf {
        self.output_dir
            .join(self.naming.output_file_name(&payload.size_label))
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug, Default)]
pub struct BatchConfigBuilder {
    cover_image: Option<PathBuf>,
    key_path: Option<PathBuf>,
    payload_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    naming: Option<NamingConvention>,
    metrics: Option<MetricConfig>,
    report_name: Option<String>,
}

impl BatchConfigBuilder {
    /// Set the cover image path.
    #[must_use]
    pub fn cover_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.cover_image = Some(path.into());
        self
    }

    /// Set the key artifact path.
    #[must_use]
    pub fn key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    /// Set the payload directory.
    #[must_use]
    pub fn payload_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.payload_dir = Some(path.into());
        self
    }

    /// Set the stego output directory.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the naming convention.
    #[must_use]
    pub fn naming(mut self, naming: NamingConvention) -> Self {
        self.naming = Some(naming);
        self
    }

    /// Set the metric configuration.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricConfig) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Set the report name.
    #[must_use]
    pub fn report_name(mut self, name: impl Into<String>) -> Self {
        self.report_name = Some(name.into());
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the cover image, key path,
    /// payload directory or output directory is not set, or if the peak
    /// pixel value is not positive.
    pub fn build(self) -> Result<BatchConfig> {
        let missing = |field: &str| Error::InvalidConfig(format!("{field} is required"));

        let metrics = self.metrics.unwrap_or_default();
        if metrics.max_pixel.is_nan() || metrics.max_pixel <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "max_pixel must be positive, got {}",
                metrics.max_pixel
            )));
        }

        Ok(BatchConfig {
            cover_image: self.cover_image.ok_or_else(|| missing("cover_image"))?,
            key_path: self.key_path.ok_or_else(|| missing("key_path"))?,
            payload_dir: self.payload_dir.ok_or_else(|| missing("payload_dir"))?,
            output_dir: self.output_dir.ok_or_else(|| missing("output_dir"))?,
            naming: self.naming.unwrap_or_default(),
            metrics,
            report_name: self
                .report_name
                .unwrap_or_else(|| "assessment_metrics".to_string()),
        })
    }
}

/// Why a payload produced no report row.
#[derive(Debug)]
pub enum SkipReason {
    /// The embedder returned an error.
    EmbedFailed(EmbedError),
    /// The stego image could not be loaded.
    LoadFailed(Error),
    /// The stego image does not match the cover dimensions.
    DimensionMismatch {
        /// Cover dimensions (width, height).
        cover: (usize, usize),
        /// Stego dimensions (width, height).
        stego: (usize, usize),
    },
    /// A metric could not be computed.
    MetricFailed(Error),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmbedFailed(e) => write!(f, "embedding failed: {}", e),
            Self::LoadFailed(e) => write!(f, "failed to load stego image: {}", e),
            Self::DimensionMismatch { cover, stego } => write!(
                f,
                "dimension mismatch (cover: {}x{}, stego: {}x{})",
                cover.0, cover.1, stego.0, stego.1
            ),
            Self::MetricFailed(e) => write!(f, "metric failed: {}", e),
        }
    }
}

/// A payload that was dropped from the report.
#[derive(Debug)]
pub struct SkippedPayload {
    /// Payload file name.
    pub file_name: String,
    /// Stego path the embedder was asked to write.
    pub output_path: PathBuf,
    /// Reason the payload was skipped.
    pub reason: SkipReason,
}

/// Result of a batch run.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Measured rows in processing order.
    pub report: Report,
    /// Payloads that produced no row, in processing order.
    pub skipped: Vec<SkippedPayload>,
}

impl BatchOutcome {
    /// Total number of payloads attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.report.len() + self.skipped.len()
    }
}

/// Sequential evaluation of payloads against one cover image.
///
/// # Example
///
/// ```rust,ignore
/// use stego_eval::{BatchConfig, BatchRunner, CommandEmbedder};
///
/// let config = BatchConfig::builder()
///     .cover_image("test/in/medical_image.png")
///     .key_path("public_key.pem")
///     .payload_dir("test_texts")
///     .output_dir("test_out")
///     .build()?;
///
/// let embedder = CommandEmbedder::new("./hide")
///     .args(["{payload}", "{cover}", "{output}", "{key}"]);
///
/// let outcome = BatchRunner::new(config, embedder).run()?;
/// ```
pub struct BatchRunner<E> {
    config: BatchConfig,
    embedder: E,
    engine: MetricEngine,
}

impl<E: Embedder> BatchRunner<E> {
    /// Create a runner.
    #[must_use]
    pub fn new(config: BatchConfig, embedder: E) -> Self {
        let engine = MetricEngine::new(config.metrics);
        Self {
            config,
            embedder,
            engine,
        }
    }

    /// The runner's configuration.
    #[must_use]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Run the batch.
    ///
    /// # Errors
    ///
    /// Fails only when the run cannot start: the cover image cannot be
    /// loaded, the payload directory cannot be read, or the output directory
    /// cannot be created. Per-payload failures end up in
    /// [`BatchOutcome::skipped`].
    pub fn run(&self) -> Result<BatchOutcome> {
        let cover = load_grayscale(&self.config.cover_image)?;
        log::info!(
            "Loaded cover image {} ({}x{})",
            self.config.cover_image.display(),
            cover.width(),
            cover.height()
        );

        let payloads = discover_payloads(&self.config.payload_dir, &self.config.naming)?;
        std::fs::create_dir_all(&self.config.output_dir)?;

        let cover_name = self
            .config
            .cover_image
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("cover")
            .to_string();
        let mut report = Report::new(self.config.report_name.clone(), cover_name, self.config.metrics);
        let mut skipped = Vec::new();

        for payload in &payloads {
            let output_path = self.config.output_path(payload);
            match self.evaluate_payload(&cover, payload, &output_path) {
                Ok(result) => {
                    log::debug!(
                        "{}: MSE {:.4}, PSNR {:.2} dB, SSIM {:.4}",
                        payload.file_name,
                        result.mse,
                        result.psnr,
                        result.ssim
                    );
                    report.results.push(result);
                }
                Err(reason) => {
                    log::warn!(
                        "Skipping {} ({}): {}",
                        payload.file_name,
                        output_path.display(),
                        reason
                    );
                    skipped.push(SkippedPayload {
                        file_name: payload.file_name.clone(),
                        output_path,
                        reason,
                    });
                }
            }
        }

        log::info!(
            "Measured {} of {} payloads ({} skipped)",
            report.len(),
            payloads.len(),
            skipped.len()
        );

        Ok(BatchOutcome { report, skipped })
    }

    fn evaluate_payload(
        &self,
        cover: &GrayImage,
        payload: &PayloadFile,
        output_path: &Path,
    ) -> std::result::Result<MetricResult, SkipReason> {
        log::info!(
            "Embedding {} ({} bytes) into {}",
            payload.file_name,
            payload.byte_len,
            output_path.display()
        );

        remove_stale_output(output_path).map_err(|e| SkipReason::EmbedFailed(EmbedError::Io(e)))?;

        self.embedder
            .embed(
                &payload.path,
                &self.config.cover_image,
                output_path,
                &self.config.key_path,
            )
            .map_err(SkipReason::EmbedFailed)?;

        let stego = load_grayscale(output_path).map_err(SkipReason::LoadFailed)?;

        if (stego.width(), stego.height()) != (cover.width(), cover.height()) {
            return Err(SkipReason::DimensionMismatch {
                cover: (cover.width(), cover.height()),
                stego: (stego.width(), stego.height()),
            });
        }

        let fidelity = self
            .engine
            .compare(cover, &stego)
            .map_err(SkipReason::MetricFailed)?;

        let stego_file = output_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        Ok(MetricResult::new(
            payload.size_label.clone(),
            stego_file,
            payload.byte_len,
            fidelity,
        ))
    }
}

// A stego image left over from an earlier run must not be measured in place
// of the embedder's output.
fn remove_stale_output(output_path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(output_path) {
        Ok(()) => {
            log::debug!("Removed stale {}", output_path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
