use crate::data::{NUM_CLASSES, TOTAL_FEATURES};
use crate::error::{Result, ScampError};
use crate::model::{Activation, ClassifierConfig};
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::tensor::activation::softmax;
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use ndarray::Array2;

/// Feed-forward network mapping 14 distribution features to 2 class logits
#[derive(Module, Debug)]
pub struct ScampNetwork<B: Backend> {
    /// Hidden fully connected layers
    hidden: Vec<Linear<B>>,
    /// Output layer (logits)
    output: Linear<B>,
    /// Dropout after each hidden layer, absent when the rate is zero
    dropout: Option<Dropout>,
}

impl<B: Backend> ScampNetwork<B> {
    /// Forward pass returning logits.
    ///
    /// Each hidden block is linear, activation, then dropout. Dropout is only
    /// active on autodiff backends, so the inner backend gives inference behaviour.
    pub fn forward(&self, input: Tensor<B, 2>, activation: Activation) -> Tensor<B, 2> {
        let mut x = input;
        for layer in &self.hidden {
            x = layer.forward(x);
            x = activation.apply(x);
            if let Some(dropout) = &self.dropout {
                x = dropout.forward(x);
            }
        }
        self.output.forward(x)
    }

    /// Weight shapes `[d_input, d_output]` of every linear layer, input to output
    pub fn layer_shapes(&self) -> Vec<[usize; 2]> {
        self.hidden
            .iter()
            .chain(std::iter::once(&self.output))
            .map(|layer| layer.weight.val().dims())
            .collect()
    }
}

/// Weight shapes stored in a network record, in the order of [`ScampNetwork::layer_shapes`]
pub fn record_layer_shapes<B: Backend>(record: &ScampNetworkRecord<B>) -> Vec<[usize; 2]> {
    record
        .hidden
        .iter()
        .chain(std::iter::once(&record.output))
        .map(|layer| layer.weight.val().dims())
        .collect()
}

/// Initialize network from configuration
pub fn init_network<B: Backend>(config: &ClassifierConfig, device: &B::Device) -> ScampNetwork<B> {
    let dims = config.layer_dims();
    let n_linear = dims.len() - 1;

    let hidden = dims
        .windows(2)
        .take(n_linear - 1)
        .map(|pair| LinearConfig::new(pair[0], pair[1]).with_bias(true).init(device))
        .collect();

    let output = LinearConfig::new(dims[n_linear - 1], dims[n_linear])
        .with_bias(true)
        .init(device);

    let dropout = (config.dropout > 0.0).then(|| DropoutConfig::new(config.dropout).init());

    ScampNetwork {
        hidden,
        output,
        dropout,
    }
}

/// Expected weight shapes for a configuration, matching [`ScampNetwork::layer_shapes`]
pub fn expected_layer_shapes(config: &ClassifierConfig) -> Vec<[usize; 2]> {
    config
        .layer_dims()
        .windows(2)
        .map(|pair| [pair[0], pair[1]])
        .collect()
}

/// Convert a feature matrix into a float tensor
pub fn features_to_tensor<B: Backend>(features: &Array2<f64>, device: &B::Device) -> Tensor<B, 2> {
    let (rows, cols) = features.dim();
    let values: Vec<f32> = features.iter().map(|&v| v as f32).collect();
    Tensor::from_data(TensorData::new(values, [rows, cols]), device)
}

/// Copy a 2D float tensor back into an ndarray matrix
pub fn tensor_to_array<B: Backend>(tensor: Tensor<B, 2>) -> Result<Array2<f64>> {
    let [rows, cols] = tensor.dims();
    let values = tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| ScampError::InvalidInput(format!("failed to read tensor data: {:?}", e)))?;

    Array2::from_shape_vec((rows, cols), values.into_iter().map(f64::from).collect())
        .map_err(|e| ScampError::ShapeMismatch(e.to_string()))
}

/// Softmax class probabilities (n x 2) for a feature matrix (n x 14)
pub fn class_probabilities<B: Backend>(
    network: &ScampNetwork<B>,
    activation: Activation,
    features: &Array2<f64>,
    device: &B::Device,
) -> Result<Array2<f64>> {
    if features.ncols() != TOTAL_FEATURES {
        return Err(ScampError::shape_mismatch(
            "feature columns",
            TOTAL_FEATURES,
            features.ncols(),
        ));
    }
    if features.nrows() == 0 {
        return Ok(Array2::zeros((0, NUM_CLASSES)));
    }

    let input = features_to_tensor::<B>(features, device);
    let logits = network.forward(input, activation);
    tensor_to_array(softmax(logits, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_network_forward() {
        let device = <TestBackend as Backend>::Device::default();
        let config = ClassifierConfig::scamp_default();
        let network = init_network::<TestBackend>(&config, &device);

        let input = Tensor::<TestBackend, 2>::zeros([3, TOTAL_FEATURES], &device);
        let output = network.forward(input, config.activation);

        assert_eq!(output.dims(), [3, NUM_CLASSES]);
    }

    #[test]
    fn test_layer_shapes() {
        let device = <TestBackend as Backend>::Device::default();
        let config = ClassifierConfig::new().with_n_layers(2).with_n_hidden(8);
        let network = init_network::<TestBackend>(&config, &device);

        assert_eq!(network.layer_shapes(), vec![[14, 8], [8, 8], [8, 2]]);
        assert_eq!(network.layer_shapes(), expected_layer_shapes(&config));
    }

    #[test]
    fn test_record_layer_shapes() {
        let device = <TestBackend as Backend>::Device::default();
        let config = ClassifierConfig::new().with_n_layers(3).with_n_hidden(5);
        let network = init_network::<TestBackend>(&config, &device);
        let expected = network.layer_shapes();

        assert_eq!(record_layer_shapes(&network.into_record()), expected);
    }

    #[test]
    fn test_linear_only_network() {
        let device = <TestBackend as Backend>::Device::default();
        let config = ClassifierConfig::new()
            .with_n_layers(0)
            .with_activation(Activation::Identity)
            .with_dropout(0.0);
        let network = init_network::<TestBackend>(&config, &device);

        assert_eq!(network.layer_shapes(), vec![[14, 2]]);
        assert!(network.dropout.is_none());
    }

    #[test]
    fn test_class_probabilities_sum_to_one() {
        let device = <TestBackend as Backend>::Device::default();
        let config = ClassifierConfig::new().with_activation(Activation::Tanh);
        let network = init_network::<TestBackend>(&config, &device);

        let features = Array2::from_shape_fn((4, TOTAL_FEATURES), |(i, j)| (i + j) as f64 * 0.1);
        let probs = class_probabilities(&network, config.activation, &features, &device).unwrap();

        assert_eq!(probs.dim(), (4, NUM_CLASSES));
        for row in probs.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-5);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn test_class_probabilities_rejects_wrong_width() {
        let device = <TestBackend as Backend>::Device::default();
        let network = init_network::<TestBackend>(&ClassifierConfig::new(), &device);
        let features = Array2::zeros((2, 5));

        let err = class_probabilities(&network, Activation::Relu, &features, &device).unwrap_err();
        assert!(matches!(err, ScampError::ShapeMismatch(_)));
    }

    #[test]
    fn test_tensor_round_trip() {
        let device = <TestBackend as Backend>::Device::default();
        let features = Array2::from_shape_fn((2, 3), |(i, j)| (i * 3 + j) as f64);
        let tensor = features_to_tensor::<TestBackend>(&features, &device);
        assert_eq!(tensor.dims(), [2, 3]);
        assert_eq!(tensor_to_array(tensor).unwrap(), features);
    }
}
