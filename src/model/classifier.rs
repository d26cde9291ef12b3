//! The scAmp classifier: network, hyperparameters and training state

use crate::error::{Result, ScampError};
use crate::model::architecture::{class_probabilities, init_network, ScampNetwork};
use crate::model::checkpoint::ModelSaver;
use crate::model::ClassifierConfig;
use crate::training::trainer::Trainer;
use crate::training::{TrainingConfig, TrainingHistory};
use burn::module::AutodiffModule;
use burn::tensor::backend::AutodiffBackend;
use ndarray::Array2;
use std::path::{Path, PathBuf};
use tracing::info;

/// Count-based MLP predicting ecDNA status from copy-number distribution features.
///
/// Created untrained. [`ScampModel::fit`] trains it in place; only trained
/// models can be saved.
#[derive(Debug)]
pub struct ScampModel<B: AutodiffBackend> {
    config: ClassifierConfig,
    network: ScampNetwork<B>,
    device: B::Device,
    trained: bool,
    history: TrainingHistory,
}

impl<B: AutodiffBackend> ScampModel<B> {
    /// Build an untrained model, rejecting invalid configurations
    pub fn new(config: ClassifierConfig, device: B::Device) -> Result<Self> {
        config.validate()?;
        let network = init_network::<B>(&config, &device);
        Ok(Self {
            config,
            network,
            device,
            trained: false,
            history: TrainingHistory::new(),
        })
    }

    /// Build an untrained model with seeded weight initialization
    pub fn new_seeded(config: ClassifierConfig, device: B::Device, seed: u64) -> Result<Self> {
        B::seed(seed);
        Self::new(config, device)
    }

    /// Reassemble a trained model from persisted parts
    pub(crate) fn from_trained(
        config: ClassifierConfig,
        network: ScampNetwork<B>,
        device: B::Device,
        history: TrainingHistory,
    ) -> Self {
        Self {
            config,
            network,
            device,
            trained: true,
            history,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn network(&self) -> &ScampNetwork<B> {
        &self.network
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Training curve of the last `fit`
    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    /// Class probabilities (n x 2) for features (n x 14); column 1 is ecDNA.
    ///
    /// Runs on the inner backend, so dropout is disabled and no gradients are tracked.
    pub fn proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        class_probabilities(
            &self.network.valid(),
            self.config.activation,
            features,
            &self.device,
        )
    }

    /// Train on features (n x 14) and two-column labels (n x 2)
    pub fn fit(
        &mut self,
        features: &Array2<f64>,
        labels: &Array2<f64>,
        config: &TrainingConfig,
    ) -> Result<&TrainingHistory> {
        let trainer = Trainer::new(config.clone());
        let (network, history) = trainer.train(
            self.network.clone(),
            self.config.activation,
            features,
            labels,
            &self.device,
        )?;

        self.network = network;
        self.history = history;
        self.trained = true;

        if let Some(last) = self.history.last() {
            info!("Final training loss: {:.6}", last.loss);
        }
        Ok(&self.history)
    }

    /// Fail unless the model has been trained
    pub fn ensure_trained(&self) -> Result<()> {
        if self.trained {
            Ok(())
        } else {
            Err(ScampError::NotTrained(
                "train the model before saving or predicting".to_string(),
            ))
        }
    }

    /// Save weights and metadata into `dir`
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        ModelSaver::save(self, dir)
    }

    /// Load a trained model saved with [`ScampModel::save`]
    pub fn load<P: AsRef<Path>>(dir: P, device: B::Device) -> Result<Self> {
        ModelSaver::load(dir, device)
    }
}
