pub mod batcher;
pub mod trainer;

use crate::data::{FeatureMatrix, ECDNA_CLASS, NUM_CLASSES, TOTAL_FEATURES};
use crate::error::{Result, ScampError};
use crate::utils::validation::positive;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Optimization algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    Sgd,
}

impl FromStr for OptimizerKind {
    type Err = ScampError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "adam" => Ok(OptimizerKind::Adam),
            "sgd" => Ok(OptimizerKind::Sgd),
            other => Err(ScampError::Configuration(format!(
                "unknown optimizer `{}`; expected adam or sgd",
                other
            ))),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizerKind::Adam => write!(f, "adam"),
            OptimizerKind::Sgd => write!(f, "sgd"),
        }
    }
}

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of training epochs
    pub epochs: usize,
    /// Learning rate
    pub learning_rate: f64,
    /// Minibatch size
    pub batch_size: usize,
    /// Optimization algorithm
    pub optimizer: OptimizerKind,
    /// Threads assembling minibatches (0 = rayon default)
    pub num_workers: usize,
    /// Log training accuracy on the reporting cadence
    pub verbose: bool,
    /// Epochs between accuracy reports (0 = never)
    pub reporting_freq: usize,
    /// Random seed for shuffling and dropout
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            learning_rate: 1e-3,
            batch_size: 128,
            optimizer: OptimizerKind::Adam,
            num_workers: 1,
            verbose: true,
            reporting_freq: 10,
            seed: 2026,
        }
    }
}

impl TrainingConfig {
    /// Create configuration for quick testing
    pub fn quick_test() -> Self {
        Self {
            epochs: 5,
            batch_size: 16,
            learning_rate: 0.01,
            verbose: false,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        positive(self.epochs, "epochs")?;
        positive(self.batch_size, "batch size")?;
        positive(self.learning_rate, "learning rate")?;
        if !self.learning_rate.is_finite() {
            return Err(ScampError::Configuration(
                "learning rate must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Statistics recorded at the end of one epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: usize,
    /// Sum of minibatch losses over the epoch
    pub loss: f64,
    /// Training-set accuracy, present on reporting epochs
    pub accuracy: Option<f64>,
}

/// Append-only record of a training run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    records: Vec<EpochRecord>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: EpochRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[EpochRecord] {
        &self.records
    }

    /// Per-epoch loss curve
    pub fn losses(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.loss).collect()
    }

    pub fn last(&self) -> Option<&EpochRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Features joined with binary ecDNA labels
#[derive(Debug, Clone)]
pub struct TrainingSet {
    /// Feature rows (n x 14)
    pub features: Array2<f64>,
    /// One-hot labels (n x 2), column 1 is ecDNA
    pub labels: Array2<f64>,
    /// Genes, index-aligned with rows
    pub genes: Vec<String>,
}

impl TrainingSet {
    /// Keep the genes that have a label; unlabeled genes are skipped
    pub fn from_labeled_features(features: &FeatureMatrix, labels: &HashMap<String, u8>) -> Self {
        let mut rows = Vec::new();
        let mut genes = Vec::new();
        let mut one_hot = Vec::new();

        for (i, gene) in features.genes().iter().enumerate() {
            match labels.get(gene) {
                Some(&label) => {
                    rows.push(i);
                    genes.push(gene.clone());
                    let mut target = [0.0; NUM_CLASSES];
                    target[usize::from(label == 1)] = 1.0;
                    one_hot.extend_from_slice(&target);
                }
                None => warn!("No label for gene {}; excluded from training", gene),
            }
        }

        let n = genes.len();
        let set = Self {
            features: features.features().select(Axis(0), &rows),
            labels: Array2::from_shape_vec((n, NUM_CLASSES), one_hot)
                .unwrap_or_else(|_| Array2::zeros((0, NUM_CLASSES))),
            genes,
        };

        info!(
            "Training set: {} genes ({} ecDNA, {} non-ecDNA)",
            set.len(),
            set.positive_count(),
            set.len() - set.positive_count()
        );
        set
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn positive_count(&self) -> usize {
        self.labels
            .column(ECDNA_CLASS)
            .iter()
            .filter(|&&v| v > 0.5)
            .count()
    }
}

/// Check the shapes of a training matrix pair
pub fn validate_training_data(features: &Array2<f64>, labels: &Array2<f64>) -> Result<()> {
    if features.ncols() != TOTAL_FEATURES {
        return Err(ScampError::shape_mismatch(
            "feature columns",
            TOTAL_FEATURES,
            features.ncols(),
        ));
    }
    if labels.ncols() != NUM_CLASSES {
        return Err(ScampError::shape_mismatch(
            "label columns",
            NUM_CLASSES,
            labels.ncols(),
        ));
    }
    if features.nrows() != labels.nrows() {
        return Err(ScampError::shape_mismatch(
            "label rows",
            features.nrows(),
            labels.nrows(),
        ));
    }
    if features.nrows() == 0 {
        return Err(ScampError::Configuration(
            "cannot train on an empty dataset".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature_matrix(genes: &[&str]) -> FeatureMatrix {
        let features =
            Array2::from_shape_fn((genes.len(), TOTAL_FEATURES), |(i, j)| (i * 100 + j) as f64);
        FeatureMatrix::new(features, genes.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_optimizer_parsing() {
        assert_eq!("Adam".parse::<OptimizerKind>().unwrap(), OptimizerKind::Adam);
        assert_eq!("sgd".parse::<OptimizerKind>().unwrap(), OptimizerKind::Sgd);
        assert!("rmsprop".parse::<OptimizerKind>().is_err());
    }

    #[test]
    fn test_config_validation() {
        assert!(TrainingConfig::default().validate().is_ok());
        let config = TrainingConfig {
            batch_size: 0,
            ..TrainingConfig::default()
        };
        assert!(config.validate().is_err());
        let config = TrainingConfig {
            learning_rate: 0.0,
            ..TrainingConfig::default()
        };
        assert!(config.validate().is_err());
        let config = TrainingConfig {
            epochs: 0,
            ..TrainingConfig::default()
        };
        assert!(matches!(config.validate(), Err(ScampError::Configuration(_))));
    }

    #[test]
    fn test_history_is_append_only() {
        let mut history = TrainingHistory::new();
        history.push(EpochRecord { epoch: 0, loss: 2.0, accuracy: Some(0.5) });
        history.push(EpochRecord { epoch: 1, loss: 1.5, accuracy: None });

        assert_eq!(history.len(), 2);
        assert_eq!(history.losses(), vec![2.0, 1.5]);
        assert_eq!(history.last().unwrap().epoch, 1);
    }

    #[test]
    fn test_training_set_join() {
        let features = feature_matrix(&["MYC", "EGFR", "GAPDH"]);
        let labels: HashMap<String, u8> = [("MYC".to_string(), 1), ("GAPDH".to_string(), 0)]
            .into_iter()
            .collect();

        let set = TrainingSet::from_labeled_features(&features, &labels);

        assert_eq!(set.genes, vec!["MYC".to_string(), "GAPDH".to_string()]);
        assert_eq!(set.labels.row(0).to_vec(), vec![0.0, 1.0]);
        assert_eq!(set.labels.row(1).to_vec(), vec![1.0, 0.0]);
        assert_eq!(set.features.row(1), features.row(2));
        assert_eq!(set.positive_count(), 1);
    }

    #[test]
    fn test_validate_training_data() {
        let x = Array2::zeros((3, TOTAL_FEATURES));
        let y = Array2::zeros((3, NUM_CLASSES));
        assert!(validate_training_data(&x, &y).is_ok());

        let short = Array2::zeros((2, NUM_CLASSES));
        assert!(matches!(
            validate_training_data(&x, &short),
            Err(ScampError::ShapeMismatch(_))
        ));

        let empty_x = Array2::zeros((0, TOTAL_FEATURES));
        let empty_y = Array2::zeros((0, NUM_CLASSES));
        assert!(matches!(
            validate_training_data(&empty_x, &empty_y),
            Err(ScampError::Configuration(_))
        ));
    }
}
