//! stego-eval CLI - steganography fidelity assessment tool

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use stego_eval::{MseNormalization, ReportSchema};

mod commands;

/// Measure how much steganographic embedding distorts a cover image.
#[derive(Parser)]
#[command(name = "stego-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed every payload with an external command and report MSE/PSNR/SSIM
    Run(RunArgs),

    /// Compare two images directly
    Compare {
        /// Reference (cover) image
        reference: PathBuf,

        /// Test (stego) image
        test: PathBuf,

        #[command(flatten)]
        metrics: MetricArgs,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Arguments of the `run` subcommand.
#[derive(clap::Args)]
pub struct RunArgs {
    /// Cover image
    #[arg(long, env = "STEGO_EVAL_COVER", default_value = "test/in/medical_image.png")]
    pub cover: PathBuf,

    /// Key artifact forwarded to the embedder
    #[arg(long, env = "STEGO_EVAL_KEY", default_value = "./public_key.pem")]
    pub key: PathBuf,

    /// Directory of payload files named <prefix>_<size>.<ext>
    #[arg(long, env = "STEGO_EVAL_PAYLOADS", default_value = "test_texts")]
    pub payloads: PathBuf,

    /// Directory for generated stego images
    #[arg(long, env = "STEGO_EVAL_OUTPUT_DIR", default_value = "test_out")]
    pub output_dir: PathBuf,

    /// CSV report destination (overwritten)
    #[arg(long, env = "STEGO_EVAL_REPORT", default_value = "assessment_metrics.csv")]
    pub report: PathBuf,

    /// Also write the report as JSON next to the CSV
    #[arg(long)]
    pub json: bool,

    /// Report column layout
    #[arg(long, value_enum, default_value_t = SchemaArg::Compact)]
    pub schema: SchemaArg,

    /// Payload file extension
    #[arg(long, default_value = "txt")]
    pub payload_ext: String,

    #[command(flatten)]
    pub metrics: MetricArgs,

    /// Embedder program followed by its arguments. Placeholders {payload},
    /// {cover}, {output} and {key} are substituted per payload.
    #[arg(last = true, required = true, num_args = 1..)]
    pub embedder: Vec<String>,
}

/// Metric options shared by subcommands.
#[derive(clap::Args)]
pub struct MetricArgs {
    /// MSE denominator convention
    #[arg(long, value_enum, default_value_t = NormalizationArg::Pixel)]
    pub normalization: NormalizationArg,

    /// Peak sample value
    #[arg(long, default_value_t = 255.0)]
    pub max_pixel: f64,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum NormalizationArg {
    /// Divide by rows*cols
    Pixel,
    /// Divide by (rows*cols)^2
    PixelSquared,
}

impl From<NormalizationArg> for MseNormalization {
    fn from(arg: NormalizationArg) -> Self {
        match arg {
            NormalizationArg::Pixel => Self::PixelCount,
            NormalizationArg::PixelSquared => Self::PixelCountSquared,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SchemaArg {
    /// Size, MSE, PSNR, SSIM
    Compact,
    /// Stego image, message length, MSE (10 decimals), PSNR, SSIM
    Detailed,
}

impl From<SchemaArg> for ReportSchema {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Compact => Self::Compact,
            SchemaArg::Detailed => Self::Detailed,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_target(false)
        .init();

    match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Compare { reference, test, metrics, json } => {
            commands::compare::run(reference, test, &metrics, json)
        }
    }
}
