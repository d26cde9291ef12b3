//! Feature engineering: copy-number matrix to per-gene distribution features

use crate::data::summary::{percentile, summarize_count_distribution};
use crate::data::{CopyNumberMatrix, FeatureMatrix, TOTAL_FEATURES};
use crate::error::{Result, ScampError};
use crate::utils::validation::in_range;
use ndarray::{Array2, ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Thresholds used when summarizing copy-number distributions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Cell-level cutoff: only copy numbers strictly above this enter the summary
    pub min_copy_number: f64,
    /// Percentile above which a gene's copy numbers are treated as missing
    pub max_percentile: f64,
    /// Gene-level cutoff: genes whose mean copy number is below this are dropped
    pub filter_copy_number: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            min_copy_number: 2.0,
            max_percentile: 99.0,
            filter_copy_number: 2.5,
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<()> {
        in_range(self.max_percentile, 0.0, 100.0, "max_percentile")?;
        if self.min_copy_number.is_nan() || self.filter_copy_number.is_nan() {
            return Err(ScampError::Configuration(
                "copy-number thresholds must not be NaN".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builds the per-gene feature matrix from a cell-by-gene copy-number matrix
pub struct FeatureBuilder {
    config: FeatureConfig,
}

impl FeatureBuilder {
    /// Create new feature builder
    pub fn new() -> Self {
        Self {
            config: FeatureConfig::default(),
        }
    }

    /// Create with custom config
    pub fn with_config(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Build features for every gene of a loaded matrix
    pub fn build_from_matrix(&self, matrix: &CopyNumberMatrix) -> Result<FeatureMatrix> {
        self.build(matrix.values(), matrix.genes())
    }

    /// Build features from raw values (rows = cells, columns = genes).
    ///
    /// Genes whose mean copy number is below `filter_copy_number` are dropped
    /// first. Each remaining column is capped at its `max_percentile`-th
    /// percentile, summarized, and discarded if any feature is NaN. Output rows
    /// keep the input gene order.
    pub fn build(&self, values: ArrayView2<'_, f64>, genes: &[String]) -> Result<FeatureMatrix> {
        self.config.validate()?;

        if values.ncols() != genes.len() {
            return Err(ScampError::shape_mismatch(
                "gene identifiers for matrix columns",
                values.ncols(),
                genes.len(),
            ));
        }

        if values.nrows() == 0 {
            debug!("Copy-number matrix has no cells");
            return Ok(FeatureMatrix::empty());
        }

        let means = values
            .mean_axis(Axis(0))
            .unwrap_or_else(|| ndarray::Array1::from_elem(values.ncols(), f64::NAN));

        let kept: Vec<usize> = means
            .iter()
            .enumerate()
            .filter(|(_, &mean)| mean >= self.config.filter_copy_number)
            .map(|(i, _)| i)
            .collect();

        info!(
            "{} of {} genes pass mean copy-number filter ({})",
            kept.len(),
            genes.len(),
            self.config.filter_copy_number
        );

        if kept.is_empty() {
            return Ok(FeatureMatrix::empty());
        }

        let rows: Vec<[f64; TOTAL_FEATURES]> = kept
            .par_iter()
            .map(|&col| self.gene_features(values.column(col).to_vec()))
            .collect();

        let mut features = Array2::<f64>::zeros((kept.len(), TOTAL_FEATURES));
        for (mut target, row) in features.axis_iter_mut(Axis(0)).zip(&rows) {
            for (dst, &src) in target.iter_mut().zip(row.iter()) {
                *dst = src;
            }
        }

        let mask: Vec<bool> = rows
            .iter()
            .map(|row| !row.iter().any(|v| v.is_nan()))
            .collect();

        let surviving: Vec<usize> = (0..kept.len()).filter(|&i| mask[i]).collect();
        let features = features.select(Axis(0), &surviving);
        let genes: Vec<String> = surviving.iter().map(|&i| genes[kept[i]].clone()).collect();

        debug!(
            "Dropped {} genes with undefined distribution features",
            kept.len() - genes.len()
        );

        FeatureMatrix::new(features, genes)
    }

    /// Cap one gene's column at the configured percentile and summarize it
    fn gene_features(&self, mut column: Vec<f64>) -> [f64; TOTAL_FEATURES] {
        let cap = percentile(&column, self.config.max_percentile);
        for value in column.iter_mut() {
            if *value > cap {
                *value = f64::NAN;
            }
        }
        summarize_count_distribution(&column, self.config.min_copy_number).to_feature_row()
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}
