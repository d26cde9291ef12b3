//! Summary statistics of a single gene's copy-number distribution

use crate::data::{NUM_QUANTILES, TOTAL_FEATURES};

/// Percentiles reported as quantile features
pub const QUANTILE_PERCENTILES: [f64; NUM_QUANTILES] =
    [0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0];

/// Summary of one gene's copy-number distribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionSummary {
    pub mean: f64,
    /// Population variance
    pub variance: f64,
    /// Variance-to-mean ratio
    pub dispersion: f64,
    pub quantiles: [f64; NUM_QUANTILES],
    /// 75th minus 25th percentile
    pub iqr: f64,
}

impl DistributionSummary {
    /// All-NaN summary for distributions with too few observations
    pub fn undefined() -> Self {
        Self {
            mean: f64::NAN,
            variance: f64::NAN,
            dispersion: f64::NAN,
            quantiles: [f64::NAN; NUM_QUANTILES],
            iqr: f64::NAN,
        }
    }

    pub fn is_defined(&self) -> bool {
        !self.to_feature_row().iter().any(|v| v.is_nan())
    }

    /// Pack as `[mean, variance, dispersion, iqr, q0..q90]`
    pub fn to_feature_row(&self) -> [f64; TOTAL_FEATURES] {
        let mut row = [0.0; TOTAL_FEATURES];
        row[0] = self.mean;
        row[1] = self.variance;
        row[2] = self.dispersion;
        row[3] = self.iqr;
        row[4..].copy_from_slice(&self.quantiles);
        row
    }
}

/// Summarize copy numbers strictly above `min_count`.
///
/// Fewer than two qualifying values yields [`DistributionSummary::undefined`].
/// NaN values never qualify, so the statistics below operate on finite data only.
pub fn summarize_count_distribution(counts: &[f64], min_count: f64) -> DistributionSummary {
    let mut values: Vec<f64> = counts.iter().copied().filter(|&v| v > min_count).collect();
    if values.len() < 2 {
        return DistributionSummary::undefined();
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

    let dispersion = if mean == 0.0 {
        f64::NAN
    } else {
        let ratio = variance / mean;
        if ratio.is_finite() { ratio } else { f64::NAN }
    };

    values.sort_by(|a, b| a.total_cmp(b));

    let mut quantiles = [0.0; NUM_QUANTILES];
    for (q, &p) in quantiles.iter_mut().zip(QUANTILE_PERCENTILES.iter()) {
        *q = percentile_sorted(&values, p);
    }

    let iqr = percentile_sorted(&values, 75.0) - percentile_sorted(&values, 25.0);

    DistributionSummary {
        mean,
        variance,
        dispersion,
        quantiles,
        iqr,
    }
}

/// Percentile of ascending-sorted data, interpolating linearly between ranks.
///
/// `p` is in [0, 100]. Returns NaN for empty input.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }

    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
    }
}

/// Percentile of unsorted data. Any NaN in the input makes the result NaN.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    percentile_sorted(&sorted, p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_too_few_values_is_undefined() {
        let summary = summarize_count_distribution(&[1.0, 1.5, 3.0], 2.0);
        assert!(!summary.is_defined());
        assert!(summary.mean.is_nan());
        assert!(summary.quantiles.iter().all(|q| q.is_nan()));

        let empty = summarize_count_distribution(&[], 2.0);
        assert!(!empty.is_defined());
    }

    #[test]
    fn test_threshold_is_strict() {
        // Values equal to min_count are excluded
        let summary = summarize_count_distribution(&[2.0, 2.0, 2.0, 5.0], 2.0);
        assert!(!summary.is_defined());
    }

    #[test]
    fn test_nan_values_never_qualify() {
        let summary = summarize_count_distribution(&[f64::NAN, 4.0, f64::NAN, 6.0], 2.0);
        assert!(summary.is_defined());
        assert_close(summary.mean, 5.0);
    }

    #[test]
    fn test_moments() {
        let summary = summarize_count_distribution(&[3.0, 5.0, 7.0, 9.0], 2.0);
        assert_close(summary.mean, 6.0);
        // population variance: (9 + 1 + 1 + 9) / 4
        assert_close(summary.variance, 5.0);
        assert_close(summary.dispersion, 5.0 / 6.0);
    }

    #[test]
    fn test_quantiles_and_iqr() {
        let counts: Vec<f64> = (1..=11).map(|v| v as f64).collect();
        let summary = summarize_count_distribution(&counts, 0.0);

        assert_close(summary.quantiles[0], 1.0);
        assert_close(summary.quantiles[5], 6.0);
        assert_close(summary.quantiles[9], 10.0);
        assert_close(summary.iqr, 8.5 - 3.5);
    }

    #[test]
    fn test_iqr_non_negative() {
        let inputs: [&[f64]; 4] = [
            &[3.0, 3.0, 3.0],
            &[10.0, 2.5, 7.0, 100.0, 4.2],
            &[50.0, 3.0],
            &[9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0],
        ];
        for counts in inputs {
            let summary = summarize_count_distribution(counts, 2.0);
            assert!(summary.is_defined());
            assert!(summary.iqr >= 0.0);
        }
    }

    #[test]
    fn test_zero_mean_dispersion_is_nan() {
        let summary = summarize_count_distribution(&[-1.0, 1.0], -5.0);
        assert_close(summary.mean, 0.0);
        assert!(summary.dispersion.is_nan());
        assert!(!summary.is_defined());
    }

    #[test]
    fn test_feature_row_layout() {
        let summary = summarize_count_distribution(&[3.0, 5.0, 7.0, 9.0], 2.0);
        let row = summary.to_feature_row();
        assert_eq!(row[0], summary.mean);
        assert_eq!(row[1], summary.variance);
        assert_eq!(row[2], summary.dispersion);
        assert_eq!(row[3], summary.iqr);
        assert_eq!(&row[4..], &summary.quantiles);
    }

    #[test]
    fn test_percentile_interpolation() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_close(percentile(&values, 0.0), 1.0);
        assert_close(percentile(&values, 100.0), 4.0);
        assert_close(percentile(&values, 50.0), 2.5);
        assert_close(percentile(&values, 99.0), 3.97);
        assert!(percentile(&[1.0, f64::NAN], 50.0).is_nan());
        assert!(percentile(&[], 50.0).is_nan());
    }
}
