//! End-to-end: payload directory -> embedder -> metrics -> CSV report.

use std::fs;
use std::path::Path;

use imgref::ImgVec;
use stego_eval::{
    BatchConfig, BatchRunner, EmbedError, MetricConfig, MseNormalization, ReportSchema,
    ReportWriter, load_grayscale, save_grayscale,
};

fn setup(dir: &Path, payloads: &[(&str, usize)]) {
    save_grayscale(
        dir.join("in/cover.png"),
        &ImgVec::new(vec![128u8; 100 * 100], 100, 100),
    )
    .unwrap();

    fs::create_dir_all(dir.join("texts")).unwrap();
    for (name, len) in payloads {
        fs::write(dir.join("texts").join(name), vec![b'm'; *len]).unwrap();
    }
}

fn config(dir: &Path, metrics: MetricConfig) -> BatchConfig {
    BatchConfig::builder()
        .cover_image(dir.join("in/cover.png"))
        .key_path(dir.join("public_key.pem"))
        .payload_dir(dir.join("texts"))
        .output_dir(dir.join("out"))
        .metrics(metrics)
        .build()
        .unwrap()
}

/// Flips the low bit of the first `len` pixels, where `len` is the payload size.
fn lsb_embedder(
    payload: &Path,
    cover: &Path,
    output: &Path,
    _key: &Path,
) -> Result<(), EmbedError> {
    let len = fs::metadata(payload)?.len() as usize;
    let img = load_grayscale(cover).map_err(|e| EmbedError::Other(e.to_string()))?;
    let pixels: Vec<u8> = img
        .pixels()
        .enumerate()
        .map(|(i, p)| if i < len { p ^ 1 } else { p })
        .collect();
    save_grayscale(output, &ImgVec::new(pixels, img.width(), img.height()))
        .map_err(|e| EmbedError::Other(e.to_string()))
}

#[test]
fn identical_stego_reports_infinite_psnr() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path(), &[("text_0000.txt", 0)]);

    let outcome = BatchRunner::new(config(dir.path(), MetricConfig::default()), lsb_embedder)
        .run()
        .unwrap();

    let report_path = dir.path().join("assessment_metrics.csv");
    ReportWriter::new(ReportSchema::Compact)
        .write_csv(&outcome.report, &report_path)
        .unwrap();

    let csv = fs::read_to_string(&report_path).unwrap();
    assert_eq!(csv, "Size,MSE,PSNR (dB),SSIM\n0000,0.00,inf,1.0000\n");
}

#[test]
fn rows_follow_file_name_order_and_grow_with_payload() {
    let dir = tempfile::tempdir().unwrap();
    setup(
        dir.path(),
        &[("text_1000.txt", 1000), ("text_0010.txt", 10), ("text_0100.txt", 100)],
    );

    let outcome = BatchRunner::new(config(dir.path(), MetricConfig::default()), lsb_embedder)
        .run()
        .unwrap();

    let rows = &outcome.report.results;
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows.iter().map(|r| r.label.as_str()).collect::<Vec<_>>(),
        ["0010", "0100", "1000"]
    );
    // Each flipped pixel contributes exactly 1 to the squared error sum
    assert!((rows[0].mse - 10.0 / 10_000.0).abs() < 1e-12);
    assert!((rows[2].mse - 1000.0 / 10_000.0).abs() < 1e-12);
    assert!(rows[0].psnr > rows[1].psnr && rows[1].psnr > rows[2].psnr);
    assert!(rows[0].ssim > rows[2].ssim);
    assert_eq!(rows[1].message_length, 100);
}

#[test]
fn detailed_schema_with_squared_normalization() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path(), &[("text_0100.txt", 100)]);

    let metrics = MetricConfig::default().with_normalization(MseNormalization::PixelCountSquared);
    let outcome = BatchRunner::new(config(dir.path(), metrics), lsb_embedder)
        .run()
        .unwrap();

    let report_path = dir.path().join("reports/detailed.csv");
    ReportWriter::new(ReportSchema::Detailed)
        .write_csv(&outcome.report, &report_path)
        .unwrap();

    let csv = fs::read_to_string(&report_path).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("Stego Image,Message Length (bytes),MSE,PSNR (dB),SSIM")
    );
    let fields: Vec<&str> = lines.next().unwrap().split(',').collect();
    assert_eq!(fields[0], "stego_0100.png");
    assert_eq!(fields[1], "100");
    // 100 / (10_000^2)
    assert_eq!(fields[2], "0.0000010000");
    assert!(lines.next().is_none());
}

#[test]
fn failing_payload_is_left_out() {
    let dir = tempfile::tempdir().unwrap();
    setup(
        dir.path(),
        &[("text_0001.txt", 1), ("text_0002.txt", 2), ("text_0003.txt", 3)],
    );

    let embedder = |payload: &Path, cover: &Path, output: &Path, key: &Path| {
        if payload.ends_with("text_0002.txt") {
            return Err(EmbedError::Other("capacity exceeded".to_string()));
        }
        lsb_embedder(payload, cover, output, key)
    };

    let outcome = BatchRunner::new(config(dir.path(), MetricConfig::default()), embedder)
        .run()
        .unwrap();

    assert_eq!(outcome.attempted(), 3);
    assert_eq!(outcome.report.len(), 2);
    assert!(outcome.report.result_for("0002").is_none());
    assert_eq!(outcome.skipped[0].file_name, "text_0002.txt");
}
