use burn::tensor::activation::log_softmax;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Cross-entropy between logits and per-class target probabilities.
///
/// Targets may be one-hot or soft labels; each row should sum to one.
///
/// # Arguments
/// * `logits` - Model output logits [batch_size, num_classes]
/// * `targets` - Target class probabilities [batch_size, num_classes]
pub fn soft_cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    log_softmax(logits, 1)
        .mul(targets)
        .sum_dim(1)
        .neg()
        .mean()
}

/// Metrics for evaluation
pub mod metrics {
    use ndarray::Array2;

    /// Fraction of rows whose rounded probabilities match the labels in every column
    pub fn subset_accuracy(probabilities: &Array2<f64>, labels: &Array2<f64>) -> f64 {
        let total = probabilities.nrows().min(labels.nrows());
        if total == 0 {
            return 0.0;
        }

        let correct = probabilities
            .rows()
            .into_iter()
            .zip(labels.rows())
            .filter(|(p, y)| p.iter().zip(y.iter()).all(|(a, b)| a.round() == b.round()))
            .count();

        correct as f64 / total as f64
    }
}
