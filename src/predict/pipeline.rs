//! End-to-end prediction: copy-number file to decision table on disk

use crate::data::feature_engineering::{FeatureBuilder, FeatureConfig};
use crate::data::loader::CopyNumberLoader;
use crate::data::{CopyNumberMatrix, ECDNA_CLASS};
use crate::model::classifier::ScampModel;
use crate::predict::plot::write_prediction_scatter;
use crate::predict::PredictionTable;
use crate::utils::validation::in_range;
use anyhow::{Context, Result};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const PREDICTIONS_FILE: &str = "model_predictions.tsv";
pub const PLOT_FILE: &str = "model_predictions.html";

/// Prediction options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictConfig {
    pub features: FeatureConfig,
    /// Minimum ecDNA probability for a positive call
    pub decision_rule: f64,
    /// Skip the HTML scatter plot
    pub no_plot: bool,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            features: FeatureConfig::default(),
            decision_rule: 0.5,
            no_plot: false,
        }
    }
}

impl PredictConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        self.features.validate()?;
        in_range(self.decision_rule, 0.0, 1.0, "decision rule")
    }
}

/// Files produced by [`run_prediction`]
#[derive(Debug, Clone)]
pub struct PredictionOutputs {
    pub table: PredictionTable,
    pub predictions_path: PathBuf,
    pub plot_path: Option<PathBuf>,
}

/// Summarize, classify and threshold every gene of a copy-number matrix
pub fn predict_ecdna_from_copy_number<B: AutodiffBackend>(
    matrix: &CopyNumberMatrix,
    model: &ScampModel<B>,
    config: &PredictConfig,
) -> crate::error::Result<PredictionTable> {
    config.validate()?;
    model.ensure_trained()?;

    let features = FeatureBuilder::with_config(config.features).build_from_matrix(matrix)?;
    debug!("{} of {} genes passed filtering", features.len(), matrix.n_genes());

    let probabilities = model.proba(features.features())?;
    let ecdna: Vec<f64> = probabilities.column(ECDNA_CLASS).to_vec();

    PredictionTable::assemble(
        features.features(),
        features.genes(),
        &ecdna,
        config.decision_rule,
    )
}

/// Load a copy-number file, predict, and write results into `output_dir`
pub fn run_prediction<B: AutodiffBackend>(
    copy_numbers_file: &Path,
    model: &ScampModel<B>,
    output_dir: &Path,
    config: &PredictConfig,
) -> Result<PredictionOutputs> {
    config.validate()?;

    info!("Loading copy numbers from {:?}", copy_numbers_file);
    let matrix = CopyNumberLoader::new()
        .load(copy_numbers_file)
        .with_context(|| format!("Failed to load copy numbers from {:?}", copy_numbers_file))?;

    let table =
        predict_ecdna_from_copy_number(&matrix, model, config).context("Prediction failed")?;
    table.summary().log();

    crate::utils::ensure_dir(output_dir)?;
    let predictions_path = output_dir.join(PREDICTIONS_FILE);
    table
        .save_tsv(&predictions_path)
        .with_context(|| format!("Failed to write {:?}", predictions_path))?;

    let plot_path = if config.no_plot {
        None
    } else {
        let path = output_dir.join(PLOT_FILE);
        write_prediction_scatter(&table, &path, None)
            .with_context(|| format!("Failed to write {:?}", path))?;
        Some(path)
    };

    Ok(PredictionOutputs {
        table,
        predictions_path,
        plot_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{NUM_CLASSES, TOTAL_FEATURES};
    use crate::error::ScampError;
    use crate::model::ClassifierConfig;
    use crate::training::TrainingConfig;
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::backend::Backend;
    use ndarray::Array2;
    use std::fs;
    use tempfile::TempDir;

    type TestBackend = Autodiff<NdArray<f32>>;

    fn device() -> <TestBackend as Backend>::Device {
        <TestBackend as Backend>::Device::default()
    }

    fn trained_model() -> ScampModel<TestBackend> {
        let mut model = ScampModel::<TestBackend>::new(ClassifierConfig::new(), device()).unwrap();
        let x = Array2::from_shape_fn((8, TOTAL_FEATURES), |(i, j)| {
            (i % 2) as f64 * 3.0 + j as f64 * 0.1
        });
        let y = Array2::from_shape_fn((8, NUM_CLASSES), |(i, j)| {
            if i % 2 == j { 1.0 } else { 0.0 }
        });
        model.fit(&x, &y, &TrainingConfig::quick_test()).unwrap();
        model
    }

    /// Three genes: A and B have broad distributions, C stays at baseline ploidy
    fn matrix() -> CopyNumberMatrix {
        let values = Array2::from_shape_fn((40, 3), |(cell, gene)| match gene {
            0 => 3.0 + (cell % 8) as f64,
            1 => 2.5 + (cell % 5) as f64 * 0.5,
            _ => 2.0,
        });
        CopyNumberMatrix::new(values, vec!["A".into(), "B".into(), "C".into()]).unwrap()
    }

    #[test]
    fn test_predict_from_copy_number() {
        let table =
            predict_ecdna_from_copy_number(&matrix(), &trained_model(), &PredictConfig::default())
                .unwrap();

        let genes: Vec<&str> = table.rows().iter().map(|r| r.gene.as_str()).collect();
        assert_eq!(genes, vec!["A", "B"]);
        for row in table.rows() {
            assert!((0.0..=1.0).contains(&row.proba));
            assert_eq!(row.pred, row.proba >= 0.5);
        }
    }

    #[test]
    fn test_untrained_model_rejected() {
        let model = ScampModel::<TestBackend>::new(ClassifierConfig::new(), device()).unwrap();
        let err = predict_ecdna_from_copy_number(&matrix(), &model, &PredictConfig::default())
            .unwrap_err();
        assert!(matches!(err, ScampError::NotTrained(_)));
    }

    #[test]
    fn test_invalid_decision_rule() {
        let config = PredictConfig {
            decision_rule: 1.5,
            ..PredictConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_run_prediction_writes_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("copy_numbers.tsv");
        let mut text = String::from("A\tB\tC\n");
        for cell in 0..40 {
            text.push_str(&format!(
                "{}\t{}\t2.0\n",
                3.0 + (cell % 8) as f64,
                2.5 + (cell % 5) as f64 * 0.5
            ));
        }
        fs::write(&input, text).unwrap();

        let output_dir = temp_dir.path().join("out");
        let outputs = run_prediction(
            &input,
            &trained_model(),
            &output_dir,
            &PredictConfig::default(),
        )
        .unwrap();

        assert_eq!(outputs.table.len(), 2);
        let tsv = fs::read_to_string(&outputs.predictions_path).unwrap();
        assert!(tsv.starts_with("gene\tmean\tvar\tdispersion\tproba\tpred\n"));
        assert_eq!(tsv.lines().count(), 3);
        assert!(outputs.plot_path.unwrap().is_file());
    }

    #[test]
    fn test_run_prediction_without_plot() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("copy_numbers.csv");
        fs::write(&input, "A,B\n4.0,3.0\n6.0,5.0\n8.0,3.5\n").unwrap();

        let config = PredictConfig {
            no_plot: true,
            ..PredictConfig::default()
        };
        let outputs = run_prediction(&input, &trained_model(), temp_dir.path(), &config).unwrap();

        assert!(outputs.plot_path.is_none());
        assert!(!temp_dir.path().join(PLOT_FILE).exists());
        assert!(temp_dir.path().join(PREDICTIONS_FILE).is_file());
    }
}
