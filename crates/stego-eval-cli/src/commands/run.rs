//! Batch assessment command.

use anyhow::{Context, Result};
use stego_eval::{
    BatchConfig, BatchRunner, CommandEmbedder, MetricConfig, NamingConvention, ReportSchema,
    ReportSummary, ReportWriter, Summary,
};

use crate::RunArgs;

pub fn run(args: RunArgs) -> Result<()> {
    let metrics = MetricConfig::default()
        .with_normalization(args.metrics.normalization.into())
        .with_max_pixel(args.metrics.max_pixel);

    let naming = NamingConvention {
        payload_extension: args.payload_ext.trim_start_matches('.').to_string(),
        ..NamingConvention::default()
    };

    let report_name = args
        .report
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("assessment_metrics")
        .to_string();

    let config = BatchConfig::builder()
        .cover_image(&args.cover)
        .key_path(&args.key)
        .payload_dir(&args.payloads)
        .output_dir(&args.output_dir)
        .naming(naming)
        .metrics(metrics)
        .report_name(report_name)
        .build()?;

    let (program, rest) = args
        .embedder
        .split_first()
        .context("No embedder command given")?;
    log::debug!("Embedder command: {} {}", program, rest.join(" "));
    let embedder = CommandEmbedder::new(program.as_str()).args(rest.iter().cloned());

    let outcome = BatchRunner::new(config, embedder)
        .run()
        .with_context(|| format!("Assessment of {} failed", args.cover.display()))?;

    let schema = ReportSchema::from(args.schema);
    let writer = ReportWriter::new(schema);
    writer
        .write_csv(&outcome.report, &args.report)
        .with_context(|| format!("Failed to write {}", args.report.display()))?;

    if args.json {
        let json_path = args.report.with_extension("json");
        writer
            .write_json(&outcome.report, &json_path)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
        log::info!("JSON report written to {}", json_path.display());
    }

    print_summary(&ReportSummary::from_report(&outcome.report), outcome.skipped.len());

    for skipped in &outcome.skipped {
        log::warn!(
            "No row for {} ({}): {}",
            skipped.file_name,
            skipped.output_path.display(),
            skipped.reason
        );
    }

    println!();
    println!("Assessment metrics have been saved to {}", args.report.display());

    Ok(())
}

fn print_summary(summary: &ReportSummary, skipped: usize) {
    println!("Measured {} payloads, skipped {}", summary.rows, skipped);
    println!("{:-<60}", "");

    print_line("MSE", summary.mse.as_ref(), 4);
    print_line("PSNR (dB)", summary.psnr.as_ref(), 2);
    if summary.infinite_psnr > 0 {
        println!("  ({} rows with infinite PSNR)", summary.infinite_psnr);
    }
    print_line("SSIM", summary.ssim.as_ref(), 4);
}

fn print_line(name: &str, summary: Option<&Summary>, precision: usize) {
    if let Some(s) = summary {
        println!(
            "{:<10} mean {:.*}  min {:.*}  max {:.*}",
            name, precision, s.mean, precision, s.min, precision, s.max
        );
    }
}
