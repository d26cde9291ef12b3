pub mod pipeline;
pub mod plot;

use crate::error::{Result, ScampError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Column header of the predictions file
pub const PREDICTION_COLUMNS: [&str; 6] = ["gene", "mean", "var", "dispersion", "proba", "pred"];

/// Prediction result for a single gene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenePrediction {
    pub gene: String,
    /// Mean copy number over qualifying cells
    pub mean: f64,
    /// Population variance of copy number
    pub var: f64,
    /// Variance over mean
    pub dispersion: f64,
    /// Probability of ecDNA
    pub proba: f64,
    /// `proba >= decision rule`
    pub pred: bool,
}

impl GenePrediction {
    /// Get prediction as string
    pub fn prediction_label(&self) -> &'static str {
        if self.pred {
            "ecDNA"
        } else {
            "non-ecDNA"
        }
    }
}

/// Per-gene decision table, in feature-matrix row order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionTable {
    rows: Vec<GenePrediction>,
}

impl PredictionTable {
    /// Join features (n x 14), genes and ecDNA probabilities into a decision table.
    ///
    /// Row i takes mean, variance and dispersion from feature row i and is
    /// positive when `probabilities[i] >= threshold`.
    pub fn assemble(
        features: &Array2<f64>,
        genes: &[String],
        probabilities: &[f64],
        threshold: f64,
    ) -> Result<Self> {
        let n = features.nrows();
        if genes.len() != n {
            return Err(ScampError::shape_mismatch("genes for feature rows", n, genes.len()));
        }
        if probabilities.len() != n {
            return Err(ScampError::shape_mismatch(
                "probabilities for feature rows",
                n,
                probabilities.len(),
            ));
        }
        if features.ncols() < 3 {
            return Err(ScampError::shape_mismatch("feature columns", 3, features.ncols()));
        }

        let rows = genes
            .iter()
            .zip(features.rows())
            .zip(probabilities)
            .map(|((gene, row), &proba)| GenePrediction {
                gene: gene.clone(),
                mean: row[0],
                var: row[1],
                dispersion: row[2],
                proba,
                pred: proba >= threshold,
            })
            .collect();

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[GenePrediction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get positive predictions only
    pub fn positives(&self) -> impl Iterator<Item = &GenePrediction> {
        self.rows.iter().filter(|p| p.pred)
    }

    pub fn summary(&self) -> PredictionSummary {
        PredictionSummary::from_predictions(&self.rows)
    }

    /// Write the table as tab-separated text with a header row
    pub fn write_tsv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(writer);

        // Header is written even for an empty table
        wtr.write_record(PREDICTION_COLUMNS)?;
        for row in &self.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn save_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.write_tsv(File::create(path)?)?;
        info!("Wrote {} predictions to {:?}", self.len(), path);
        Ok(())
    }
}

/// Prediction summary statistics
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PredictionSummary {
    pub total_predictions: usize,
    pub positive_predictions: usize,
    pub negative_predictions: usize,
    /// Proportion of positive predictions
    pub positive_rate: f64,
    pub avg_probability: f64,
}

impl PredictionSummary {
    pub fn from_predictions(predictions: &[GenePrediction]) -> Self {
        let total = predictions.len();
        let positive = predictions.iter().filter(|p| p.pred).count();

        let (positive_rate, avg_probability) = if total > 0 {
            (
                positive as f64 / total as f64,
                predictions.iter().map(|p| p.proba).sum::<f64>() / total as f64,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            total_predictions: total,
            positive_predictions: positive,
            negative_predictions: total - positive,
            positive_rate,
            avg_probability,
        }
    }

    pub fn log(&self) {
        info!("=== Prediction Summary ===");
        info!("Total predictions: {}", self.total_predictions);
        info!(
            "ecDNA predictions: {} ({:.2}%)",
            self.positive_predictions,
            self.positive_rate * 100.0
        );
        info!("non-ecDNA predictions: {}", self.negative_predictions);
        info!("Average probability: {:.4}", self.avg_probability);
    }
}
