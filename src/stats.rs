//! Descriptive statistics over batch results.
//!
//! - [`Summary`]: count, mean, median, standard deviation, min and max
//! - [`ReportSummary`]: one [`Summary`] per metric column of a [`Report`]
//!
//! Infinite PSNR values (identical images) have no place in a mean, so they
//! are counted separately and left out of the PSNR summary.

use serde::{Deserialize, Serialize};

use crate::eval::report::Report;

/// Descriptive statistics for a set of measurements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    /// Number of values.
    pub count: usize,
    /// Mean value.
    pub mean: f64,
    /// Median value.
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
}

impl Summary {
    /// Compute summary statistics for a slice of values.
    ///
    /// Returns `None` if the slice is empty.
    #[must_use]
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;

        Some(Self {
            count,
            mean,
            median: median_sorted(&sorted),
            std_dev: variance.sqrt(),
            min: sorted[0],
            max: sorted[count - 1],
        })
    }
}

fn median_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Per-metric statistics of a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of rows.
    pub rows: usize,
    /// MSE statistics.
    pub mse: Option<Summary>,
    /// Statistics over the finite PSNR values.
    pub psnr: Option<Summary>,
    /// Rows whose PSNR is infinite.
    pub infinite_psnr: usize,
    /// SSIM statistics.
    pub ssim: Option<Summary>,
}

impl ReportSummary {
    /// Summarize every metric column of `report`.
    #[must_use]
    pub fn from_report(report: &Report) -> Self {
        let mse: Vec<f64> = report.results.iter().map(|r| r.mse).collect();
        let ssim: Vec<f64> = report.results.iter().map(|r| r.ssim).collect();
        let psnr: Vec<f64> = report
            .results
            .iter()
            .map(|r| r.psnr)
            .filter(|p| p.is_finite())
            .collect();

        Self {
            rows: report.results.len(),
            mse: Summary::compute(&mse),
            infinite_psnr: report.results.len() - psnr.len(),
            psnr: Summary::compute(&psnr),
            ssim: Summary::compute(&ssim),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::report::MetricResult;
    use crate::metrics::MetricConfig;

    #[test]
    fn test_summary_compute() {
        let values = vec![5.0, 1.0, 4.0, 2.0, 3.0];
        let summary = Summary::compute(&values).unwrap();

        assert_eq!(summary.count, 5);
        assert!((summary.mean - 3.0).abs() < 0.001);
        assert!((summary.median - 3.0).abs() < 0.001);
        assert!((summary.min - 1.0).abs() < 0.001);
        assert!((summary.max - 5.0).abs() < 0.001);
        assert!((summary.std_dev - 2.0_f64.sqrt()).abs() < 0.001);
    }

    #[test]
    fn test_summary_even_median() {
        let summary = Summary::compute(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(summary.median, 2.5);
    }

    #[test]
    fn test_summary_empty() {
        assert!(Summary::compute(&[]).is_none());
    }

    #[test]
    fn test_report_summary_skips_infinite_psnr() {
        let mut report = Report::new("r".to_string(), "cover.png".to_string(), MetricConfig::default());
        for (label, mse, psnr, ssim) in [
            ("0064", 0.0, f64::INFINITY, 1.0),
            ("0128", 1.0, 48.13, 0.999),
            ("0256", 2.0, 45.12, 0.997),
        ] {
            report.results.push(MetricResult {
                label: label.to_string(),
                stego_file: format!("stego_{label}.png"),
                message_length: 0,
                mse,
                psnr,
                ssim,
            });
        }

        let summary = ReportSummary::from_report(&report);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.infinite_psnr, 1);
        let psnr = summary.psnr.unwrap();
        assert_eq!(psnr.count, 2);
        assert!((psnr.min - 45.12).abs() < 1e-9);
        assert!((summary.mse.unwrap().mean - 1.0).abs() < 1e-9);
        assert!((summary.ssim.unwrap().min - 0.997).abs() < 1e-9);
    }

    #[test]
    fn test_report_summary_empty() {
        let report = Report::new("r".to_string(), "cover.png".to_string(), MetricConfig::default());
        let summary = ReportSummary::from_report(&report);
        assert_eq!(summary.rows, 0);
        assert!(summary.mse.is_none() && summary.psnr.is_none() && summary.ssim.is_none());
    }
}
