//! Shuffled minibatches for the training loop

use crate::error::{Result, ScampError};
use crate::utils::random::seeded_rng;
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use ndarray::Array2;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Row-major batch of features and labels, ready for tensor creation
#[derive(Debug, Clone, PartialEq)]
pub struct Minibatch {
    pub features: Vec<f32>,
    pub labels: Vec<f32>,
    /// Row indices in the source matrices, in batch order
    pub indices: Vec<usize>,
}

impl Minibatch {
    fn gather(features: &Array2<f64>, labels: &Array2<f64>, indices: &[usize]) -> Self {
        let mut batch_features = Vec::with_capacity(indices.len() * features.ncols());
        let mut batch_labels = Vec::with_capacity(indices.len() * labels.ncols());
        for &i in indices {
            batch_features.extend(features.row(i).iter().map(|&v| v as f32));
            batch_labels.extend(labels.row(i).iter().map(|&v| v as f32));
        }
        Self {
            features: batch_features,
            labels: batch_labels,
            indices: indices.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn features_tensor<B: Backend>(
        &self,
        n_features: usize,
        device: &B::Device,
    ) -> Tensor<B, 2> {
        Tensor::from_data(
            TensorData::new(self.features.clone(), [self.len(), n_features]),
            device,
        )
    }

    pub fn labels_tensor<B: Backend>(&self, n_classes: usize, device: &B::Device) -> Tensor<B, 2> {
        Tensor::from_data(
            TensorData::new(self.labels.clone(), [self.len(), n_classes]),
            device,
        )
    }
}

/// Produces a freshly shuffled set of minibatches every epoch.
///
/// Batches are gathered on a dedicated thread pool; their order and content
/// depend only on the seed.
pub struct MinibatchLoader<'a> {
    features: &'a Array2<f64>,
    labels: &'a Array2<f64>,
    batch_size: usize,
    rng: ChaCha8Rng,
    pool: ThreadPool,
}

impl<'a> MinibatchLoader<'a> {
    pub fn new(
        features: &'a Array2<f64>,
        labels: &'a Array2<f64>,
        batch_size: usize,
        num_workers: usize,
        seed: u64,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(ScampError::Configuration(
                "batch size must be positive".to_string(),
            ));
        }
        if features.nrows() != labels.nrows() {
            return Err(ScampError::shape_mismatch(
                "label rows",
                features.nrows(),
                labels.nrows(),
            ));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .build()
            .map_err(|e| {
                ScampError::Configuration(format!("failed to start data workers: {}", e))
            })?;

        Ok(Self {
            features,
            labels,
            batch_size,
            rng: seeded_rng(seed),
            pool,
        })
    }

    pub fn num_batches(&self) -> usize {
        self.features.nrows().div_ceil(self.batch_size)
    }

    /// Shuffle and split into batches for the next epoch
    pub fn next_epoch(&mut self) -> Vec<Minibatch> {
        let mut order: Vec<usize> = (0..self.features.nrows()).collect();
        order.shuffle(&mut self.rng);

        let features = self.features;
        let labels = self.labels;
        let batch_size = self.batch_size;
        self.pool.install(|| {
            order
                .par_chunks(batch_size)
                .map(|chunk| Minibatch::gather(features, labels, chunk))
                .collect()
        })
    }
}
