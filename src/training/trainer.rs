use crate::data::{NUM_CLASSES, TOTAL_FEATURES};
use crate::error::Result;
use crate::model::architecture::{class_probabilities, ScampNetwork};
use crate::model::loss::{metrics, soft_cross_entropy};
use crate::model::Activation;
use crate::training::batcher::MinibatchLoader;
use crate::training::{
    validate_training_data, EpochRecord, OptimizerKind, TrainingConfig, TrainingHistory,
};
use crate::utils::format_duration;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Array2;
use std::time::Instant;
use tracing::{debug, info};

/// Minibatch trainer for the scAmp network
pub struct Trainer {
    /// Training configuration
    config: TrainingConfig,
}

impl Trainer {
    /// Create new trainer
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train `network` on features (n x 14) and class targets (n x 2).
    ///
    /// Returns the updated network with its per-epoch history.
    pub fn train<B: AutodiffBackend>(
        &self,
        network: ScampNetwork<B>,
        activation: Activation,
        features: &Array2<f64>,
        labels: &Array2<f64>,
        device: &B::Device,
    ) -> Result<(ScampNetwork<B>, TrainingHistory)> {
        self.config.validate()?;
        validate_training_data(features, labels)?;

        info!(
            "Training on {} genes for {} epochs ({} optimizer, lr={}, batch size={})",
            features.nrows(),
            self.config.epochs,
            self.config.optimizer,
            self.config.learning_rate,
            self.config.batch_size
        );

        B::seed(self.config.seed);

        match self.config.optimizer {
            OptimizerKind::Adam => {
                let optim = AdamConfig::new().init();
                self.run(network, optim, activation, features, labels, device)
            }
            OptimizerKind::Sgd => {
                let optim = SgdConfig::new().init();
                self.run(network, optim, activation, features, labels, device)
            }
        }
    }

    fn run<B, O>(
        &self,
        mut network: ScampNetwork<B>,
        mut optim: O,
        activation: Activation,
        features: &Array2<f64>,
        labels: &Array2<f64>,
        device: &B::Device,
    ) -> Result<(ScampNetwork<B>, TrainingHistory)>
    where
        B: AutodiffBackend,
        O: Optimizer<ScampNetwork<B>, B>,
    {
        let start_time = Instant::now();
        let mut loader = MinibatchLoader::new(
            features,
            labels,
            self.config.batch_size,
            self.config.num_workers,
            self.config.seed,
        )?;
        let mut history = TrainingHistory::new();
        let progress = self.progress_bar();

        for epoch in 0..self.config.epochs {
            let mut running_loss = 0.0;

            for batch in loader.next_epoch() {
                let x = batch.features_tensor::<B>(TOTAL_FEATURES, device);
                let y = batch.labels_tensor::<B>(NUM_CLASSES, device);

                let logits = network.forward(x, activation);
                let loss = soft_cross_entropy(logits, y);
                running_loss += loss.clone().into_scalar().elem::<f64>();

                // Gradients are consumed by the step, nothing carries into the next batch
                let grads = GradientsParams::from_grads(loss.backward(), &network);
                network = optim.step(self.config.learning_rate, network, grads);
            }

            let accuracy = if self.is_reporting_epoch(epoch) {
                let probabilities =
                    class_probabilities(&network.valid(), activation, features, device)?;
                let accuracy = metrics::subset_accuracy(&probabilities, labels);
                info!(
                    "[epoch:{}]: training loss={:.6}, accuracy={:.4}",
                    epoch, running_loss, accuracy
                );
                Some(accuracy)
            } else {
                debug!("[epoch:{}]: training loss={:.6}", epoch, running_loss);
                None
            };

            history.push(EpochRecord {
                epoch,
                loss: running_loss,
                accuracy,
            });
            progress.inc(1);
        }

        progress.finish_and_clear();
        info!(
            "Training finished in {}",
            format_duration(start_time.elapsed().as_secs_f64())
        );

        Ok((network, history))
    }

    fn is_reporting_epoch(&self, epoch: usize) -> bool {
        self.config.verbose
            && self.config.reporting_freq > 0
            && epoch % self.config.reporting_freq == 0
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.config.verbose {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(self.config.epochs as u64);
        let template = "{bar:40} {pos}/{len} epochs [{elapsed_precise}]";
        if let Ok(style) = ProgressStyle::with_template(template) {
            bar.set_style(style);
        }
        bar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::architecture::init_network;
    use crate::model::ClassifierConfig;
    use crate::error::ScampError;
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::backend::Backend;

    type TestBackend = Autodiff<NdArray<f32>>;

    /// Two separable classes: low-mean genes are negative, high-mean genes positive
    fn separable_data(n: usize) -> (Array2<f64>, Array2<f64>) {
        let features = Array2::from_shape_fn((n, TOTAL_FEATURES), |(i, j)| {
            let base = if i % 2 == 0 { -1.0 } else { 1.0 };
            base + 0.01 * j as f64
        });
        let labels = Array2::from_shape_fn((n, NUM_CLASSES), |(i, j)| {
            if (i % 2) == j { 1.0 } else { 0.0 }
        });
        (features, labels)
    }

    #[test]
    fn test_trainer_creation() {
        let trainer = Trainer::new(TrainingConfig::quick_test());
        assert_eq!(trainer.config().epochs, 5);
    }

    #[test]
    fn test_history_has_one_record_per_epoch() {
        let device = <TestBackend as Backend>::Device::default();
        let config = ClassifierConfig::new().with_dropout(0.0);
        let network = init_network::<TestBackend>(&config, &device);
        let (x, y) = separable_data(32);

        let trainer = Trainer::new(TrainingConfig {
            epochs: 3,
            batch_size: 8,
            reporting_freq: 2,
            verbose: true,
            ..TrainingConfig::default()
        });
        let (_, history) = trainer.train(network, config.activation, &x, &y, &device).unwrap();

        assert_eq!(history.len(), 3);
        let epochs: Vec<usize> = history.records().iter().map(|r| r.epoch).collect();
        assert_eq!(epochs, vec![0, 1, 2]);
        assert!(history.records()[0].accuracy.is_some());
        assert!(history.records()[1].accuracy.is_none());
        assert!(history.records()[2].accuracy.is_some());
        assert!(history.losses().iter().all(|l| l.is_finite() && *l > 0.0));
    }

    #[test]
    fn test_training_reduces_loss() {
        let device = <TestBackend as Backend>::Device::default();
        let config = ClassifierConfig::new().with_n_hidden(8).with_dropout(0.0);
        let network = init_network::<TestBackend>(&config, &device);
        let (x, y) = separable_data(64);

        let trainer = Trainer::new(TrainingConfig {
            epochs: 60,
            batch_size: 16,
            learning_rate: 0.05,
            verbose: false,
            ..TrainingConfig::default()
        });
        let (network, history) = trainer
            .train(network, config.activation, &x, &y, &device)
            .unwrap();

        let losses = history.losses();
        assert!(losses[losses.len() - 1] < losses[0]);

        let probabilities =
            class_probabilities(&network.valid(), config.activation, &x, &device).unwrap();
        assert!(metrics::subset_accuracy(&probabilities, &y) > 0.9);
    }

    #[test]
    fn test_sgd_optimizer() {
        let device = <TestBackend as Backend>::Device::default();
        let config = ClassifierConfig::new();
        let network = init_network::<TestBackend>(&config, &device);
        let (x, y) = separable_data(16);

        let trainer = Trainer::new(TrainingConfig {
            optimizer: OptimizerKind::Sgd,
            ..TrainingConfig::quick_test()
        });
        let (_, history) = trainer.train(network, config.activation, &x, &y, &device).unwrap();
        assert_eq!(history.len(), 5);
    }

    #[test]
    fn test_rejects_mismatched_labels() {
        let device = <TestBackend as Backend>::Device::default();
        let config = ClassifierConfig::new();
        let network = init_network::<TestBackend>(&config, &device);
        let (x, _) = separable_data(8);
        let y = Array2::zeros((7, NUM_CLASSES));

        let err = Trainer::new(TrainingConfig::quick_test())
            .train(network, config.activation, &x, &y, &device)
            .unwrap_err();
        assert!(matches!(err, ScampError::ShapeMismatch(_)));
    }
}
