//! Report types and writers for batch results.
//!
//! A [`Report`] holds one [`MetricResult`] row per measured payload, in the
//! order the payloads were processed. [`ReportWriter`] serializes it as CSV
//! under a fixed [`ReportSchema`], or as JSON.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics::{Fidelity, MetricConfig};

/// Measurements for a single payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    /// Size label taken from the payload file name.
    pub label: String,

    /// File name of the stego image.
    pub stego_file: String,

    /// Payload length in bytes.
    pub message_length: u64,

    /// Mean squared error.
    pub mse: f64,

    /// PSNR in dB. Serialized as `null` in JSON when infinite.
    #[serde(with = "psnr_serde")]
    pub psnr: f64,

    /// Mean SSIM.
    pub ssim: f64,
}

impl MetricResult {
    /// Build a row from a fidelity measurement.
    #[must_use]
    pub fn new(label: String, stego_file: String, message_length: u64, fidelity: Fidelity) -> Self {
        Self {
            label,
            stego_file,
            message_length,
            mse: fidelity.mse,
            psnr: fidelity.psnr,
            ssim: fidelity.ssim,
        }
    }
}

/// Ordered results of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report name.
    pub name: String,

    /// File name of the cover image.
    pub cover_image: String,

    /// Metric configuration the rows were measured with.
    pub metric_config: MetricConfig,

    /// Rows in processing order.
    pub results: Vec<MetricResult>,

    /// When this report was generated.
    #[serde(with = "chrono_serde")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Report {
    /// Create an empty report.
    #[must_use]
    pub fn new(name: String, cover_image: String, metric_config: MetricConfig) -> Self {
        Self {
            name,
            cover_image,
            metric_config,
            results: Vec::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Number of measured rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no payload was measured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Look up a row by size label.
    #[must_use]
    pub fn result_for(&self, label: &str) -> Option<&MetricResult> {
        self.results.iter().find(|r| r.label == label)
    }
}

/// Column layout of the CSV report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSchema {
    /// `Size, MSE, PSNR (dB), SSIM` with MSE at 2 decimals.
    #[default]
    Compact,
    /// `Stego Image, Message Length (bytes), MSE, PSNR (dB), SSIM` with MSE
    /// at 10 decimals, for the squared-count MSE convention.
    Detailed,
}

impl ReportSchema {
    /// Header row.
    #[must_use]
    pub fn header(self) -> &'static [&'static str] {
        match self {
            Self::Compact => &["Size", "MSE", "PSNR (dB)", "SSIM"],
            Self::Detailed => &[
                "Stego Image",
                "Message Length (bytes)",
                "MSE",
                "PSNR (dB)",
                "SSIM",
            ],
        }
    }

    /// Decimal places used for MSE.
    #[must_use]
    pub fn mse_precision(self) -> usize {
        match self {
            Self::Compact => 2,
            Self::Detailed => 10,
        }
    }

    /// Render one result as a record matching [`header`](Self::header).
    #[must_use]
    pub fn record(self, result: &MetricResult) -> Vec<String> {
        let mse = format!("{:.*}", self.mse_precision(), result.mse);
        let psnr = format!("{:.2}", result.psnr);
        let ssim = format!("{:.4}", result.ssim);

        match self {
            Self::Compact => vec![result.label.clone(), mse, psnr, ssim],
            Self::Detailed => vec![
                result.stego_file.clone(),
                result.message_length.to_string(),
                mse,
                psnr,
                ssim,
            ],
        }
    }
}

impl fmt::Display for ReportSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compact => write!(f, "compact"),
            Self::Detailed => write!(f, "detailed"),
        }
    }
}

impl FromStr for ReportSchema {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "detailed" => Ok(Self::Detailed),
            other => Err(Error::InvalidConfig(format!(
                "unknown report schema '{other}' (expected compact or detailed)"
            ))),
        }
    }
}

/// Writes reports to disk, replacing any previous file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportWriter {
    schema: ReportSchema,
}

impl ReportWriter {
    /// Create a writer for the given schema.
    #[must_use]
    pub fn new(schema: ReportSchema) -> Self {
        Self { schema }
    }

    /// The writer's schema.
    #[must_use]
    pub fn schema(&self) -> ReportSchema {
        self.schema
    }

    /// Write the report as CSV.
    pub fn write_csv(&self, report: &Report, path: &Path) -> Result<()> {
        ensure_parent(path)?;

        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(self.schema.header())?;
        for result in &report.results {
            wtr.write_record(self.schema.record(result))?;
        }
        wtr.flush()?;

        log::info!(
            "Wrote {} rows to {}",
            report.results.len(),
            path.display()
        );
        Ok(())
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, report: &Report, path: &Path) -> Result<()> {
        ensure_parent(path)?;

        let json = serde_json::to_string_pretty(report)?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            Error::Report(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }
    Ok(())
}

// JSON has no infinity; identical images serialize PSNR as null.
mod psnr_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(psnr: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if psnr.is_finite() {
            Some(*psnr).serialize(serializer)
        } else {
            None::<f64>.serialize(serializer)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<f64> = Option::deserialize(deserializer)?;
        Ok(value.unwrap_or(f64::INFINITY))
    }
}

mod chrono_serde {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        dt.to_rfc3339().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, mse: f64, psnr: f64, ssim: f64) -> MetricResult {
        MetricResult {
            label: label.to_string(),
            stego_file: format!("stego_{label}.png"),
            message_length: 64,
            mse,
            psnr,
            ssim,
        }
    }

    fn sample_report() -> Report {
        let mut report = Report::new(
            "assessment".to_string(),
            "cover.png".to_string(),
            MetricConfig::default(),
        );
        report.results.push(row("0064", 0.0, f64::INFINITY, 1.0));
        report.results.push(row("0128", 1.0, 48.130_803_608, 0.999_87));
        report
    }

    #[test]
    fn test_compact_record() {
        let record = ReportSchema::Compact.record(&row("0128", 1.0, 48.130_803_608, 0.999_87));
        assert_eq!(record, ["0128", "1.00", "48.13", "0.9999"]);
    }

    #[test]
    fn test_infinite_psnr_renders_inf() {
        let record = ReportSchema::Compact.record(&row("0064", 0.0, f64::INFINITY, 1.0));
        assert_eq!(record, ["0064", "0.00", "inf", "1.0000"]);
    }

    #[test]
    fn test_detailed_record() {
        let record = ReportSchema::Detailed.record(&row("0064", 0.000_123_456_789_1, 87.2, 0.5));
        assert_eq!(
            record,
            ["stego_0064.png", "64", "0.0001234568", "87.20", "0.5000"]
        );
        assert_eq!(ReportSchema::Detailed.header().len(), record.len());
    }

    #[test]
    fn test_write_csv_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/assessment.csv");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "stale,contents\n1,2\n3,4\n5,6\n").unwrap();

        let writer = ReportWriter::new(ReportSchema::Compact);
        writer.write_csv(&sample_report(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "Size,MSE,PSNR (dB),SSIM",
                "0064,0.00,inf,1.0000",
                "0128,1.00,48.13,0.9999",
            ]
        );
    }

    #[test]
    fn test_write_csv_empty_report_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let report = Report::new("empty".to_string(), "cover.png".to_string(), MetricConfig::default());

        ReportWriter::new(ReportSchema::Detailed).write_csv(&report, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_end(), "Stego Image,Message Length (bytes),MSE,PSNR (dB),SSIM");
    }

    #[test]
    fn test_json_infinite_psnr() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assessment.json");
        ReportWriter::default().write_json(&sample_report(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let parsed: Report = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert!(parsed.results[0].psnr.is_infinite());
        assert!((parsed.results[1].psnr - 48.130_803_608).abs() < 1e-9);
        assert_eq!(parsed.cover_image, "cover.png");
    }

    #[test]
    fn test_report_lookup() {
        let report = sample_report();
        assert_eq!(report.len(), 2);
        assert!(!report.is_empty());
        assert_eq!(report.result_for("0128").map(|r| r.mse), Some(1.0));
        assert!(report.result_for("9999").is_none());
    }

    #[test]
    fn test_schema_parse() {
        assert_eq!("Detailed".parse::<ReportSchema>().unwrap(), ReportSchema::Detailed);
        assert!("wide".parse::<ReportSchema>().is_err());
    }
}
