use burn::module::Module;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::data::{NUM_CLASSES, TOTAL_FEATURES};
use crate::error::{Result, ScampError};
use crate::model::architecture::{
    expected_layer_shapes, init_network, record_layer_shapes, ScampNetworkRecord,
};
use crate::model::classifier::ScampModel;
use crate::model::ClassifierConfig;
use crate::training::TrainingHistory;

/// Weight file stem inside a model directory; the recorder adds `.mpk`
pub const WEIGHTS_FILE_STEM: &str = "model";

/// Metadata file inside a model directory
pub const METADATA_FILE: &str = "model.json";

/// Model metadata stored next to the weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Crate version that wrote the model
    pub version: String,
    /// Network input width
    pub input_size: usize,
    /// Network output width
    pub output_size: usize,
    /// Architecture needed to rebuild the network
    pub model_config: ClassifierConfig,
    /// Training curve of the saved model
    pub history: TrainingHistory,
}

impl ModelMetadata {
    fn check_dimensions(&self) -> Result<()> {
        if self.input_size != TOTAL_FEATURES {
            return Err(ScampError::shape_mismatch(
                "model input size",
                TOTAL_FEATURES,
                self.input_size,
            ));
        }
        if self.output_size != NUM_CLASSES {
            return Err(ScampError::shape_mismatch(
                "model output size",
                NUM_CLASSES,
                self.output_size,
            ));
        }
        Ok(())
    }
}

fn recorder() -> NamedMpkFileRecorder<FullPrecisionSettings> {
    NamedMpkFileRecorder::<FullPrecisionSettings>::new()
}

/// Saves and loads model directories
pub struct ModelSaver;

impl ModelSaver {
    /// Save a trained model into `dir`, returning the metadata path.
    ///
    /// Untrained models are rejected before anything is written.
    pub fn save<B: AutodiffBackend, P: AsRef<Path>>(
        model: &ScampModel<B>,
        dir: P,
    ) -> Result<PathBuf> {
        model.ensure_trained()?;

        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        model
            .network()
            .clone()
            .save_file(dir.join(WEIGHTS_FILE_STEM), &recorder())
            .map_err(|e| ScampError::Persistence(format!("failed to save weights: {:?}", e)))?;

        let metadata = ModelMetadata {
            version: crate::VERSION.to_string(),
            input_size: TOTAL_FEATURES,
            output_size: NUM_CLASSES,
            model_config: model.config().clone(),
            history: model.history().clone(),
        };
        let metadata_path = dir.join(METADATA_FILE);
        fs::write(&metadata_path, serde_json::to_string_pretty(&metadata)?)?;

        info!("Saved model to {:?}", dir);
        Ok(metadata_path)
    }

    /// Load a model directory, rebuilding the saved architecture before the weights
    pub fn load<B: AutodiffBackend, P: AsRef<Path>>(
        dir: P,
        device: B::Device,
    ) -> Result<ScampModel<B>> {
        let dir = dir.as_ref();
        info!("Loading model from {:?}", dir);

        let metadata = Self::read_metadata(dir)?;
        metadata.check_dimensions()?;
        metadata.model_config.validate()?;
        debug!("Model configuration: {}", metadata.model_config);

        let record: ScampNetworkRecord<B> =
            Recorder::<B>::load(&recorder(), dir.join(WEIGHTS_FILE_STEM), &device)
                .map_err(|e| ScampError::Persistence(format!("failed to load weights: {:?}", e)))?;

        // Checked before the record reaches the network, which asserts on layer count
        let expected = expected_layer_shapes(&metadata.model_config);
        let actual = record_layer_shapes(&record);
        if expected != actual {
            return Err(ScampError::ShapeMismatch(format!(
                "saved weights have layer shapes {:?}, configuration expects {:?}",
                actual, expected
            )));
        }

        let network = init_network::<B>(&metadata.model_config, &device).load_record(record);

        info!("Loaded model trained for {} epochs", metadata.history.len());
        Ok(ScampModel::from_trained(
            metadata.model_config,
            network,
            device,
            metadata.history,
        ))
    }

    /// Read the metadata of a model directory
    pub fn read_metadata(dir: &Path) -> Result<ModelMetadata> {
        let metadata_path = dir.join(METADATA_FILE);
        if !metadata_path.is_file() {
            return Err(ScampError::Persistence(format!(
                "no model metadata found at {:?}",
                metadata_path
            )));
        }
        let json = fs::read_to_string(&metadata_path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
