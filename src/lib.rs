//! # scAmp: ecDNA prediction from single-cell copy numbers
//!
//! scAmp classifies genes as ecDNA-amplified or not from the distribution of
//! their copy numbers across single cells.
//!
//! ## Features
//!
//! - Per-gene distribution features (moments, dispersion, deciles, IQR)
//! - Small configurable MLP classifier trained with burn
//! - Thresholded per-gene decision tables and an interactive scatter plot
//! - Support for various input formats (CSV, TSV, gzipped)
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use scamp::data::feature_engineering::FeatureBuilder;
//! use scamp::data::loader::CopyNumberLoader;
//! use scamp::model::classifier::ScampModel;
//! use scamp::predict::pipeline::{predict_ecdna_from_copy_number, PredictConfig};
//! use scamp::DefaultBackend;
//!
//! let matrix = CopyNumberLoader::new().load("copy_numbers.tsv").unwrap();
//! let device = burn_ndarray::NdArrayDevice::default();
//! let model = ScampModel::<DefaultBackend>::load("saved_model", device).unwrap();
//!
//! let table = predict_ecdna_from_copy_number(&matrix, &model, &PredictConfig::default()).unwrap();
//! for row in table.positives() {
//!     println!("{}\t{:.3}", row.gene, row.proba);
//! }
//! ```

pub mod cli;
pub mod data;
pub mod error;
pub mod model;
pub mod predict;
pub mod training;
pub mod utils;

use burn::backend::Autodiff;
use burn_ndarray::NdArray;

/// Default backend type
pub type DefaultBackend = Autodiff<NdArray<f32>>;

pub use data::feature_engineering::{FeatureBuilder, FeatureConfig};
pub use data::summary::{summarize_count_distribution, DistributionSummary};
pub use data::{CopyNumberMatrix, FeatureMatrix};
pub use error::{Result, ScampError};
pub use model::classifier::ScampModel;
pub use model::{Activation, ClassifierConfig};
pub use predict::{GenePrediction, PredictionTable};
pub use training::{TrainingConfig, TrainingHistory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!(
        "{} v{} - ecDNA prediction from single-cell copy numbers",
        NAME, VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_info() {
        let info_str = info();
        assert!(info_str.contains("scamp"));
        assert!(info_str.contains(VERSION));
    }
}
