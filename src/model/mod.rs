pub mod architecture;
pub mod checkpoint;
pub mod classifier;
pub mod loss;

use crate::error::ScampError;
use burn::config::Config;
use burn::tensor::activation::{relu, sigmoid};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hidden-layer activation function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Tanh,
    Sigmoid,
    /// No activation; only valid for networks without hidden layers
    #[serde(rename = "none")]
    Identity,
}

impl Activation {
    /// Apply the activation element-wise
    pub fn apply<B: Backend, const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Activation::Relu => relu(x),
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => sigmoid(x),
            Activation::Identity => x,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Activation::Relu => "relu",
            Activation::Tanh => "tanh",
            Activation::Sigmoid => "sigmoid",
            Activation::Identity => "none",
        }
    }
}

impl FromStr for Activation {
    type Err = ScampError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.to_lowercase().as_str() {
            "relu" => Ok(Activation::Relu),
            "tanh" => Ok(Activation::Tanh),
            "sigmoid" => Ok(Activation::Sigmoid),
            "none" => Ok(Activation::Identity),
            other => Err(ScampError::Configuration(format!(
                "unknown activation `{}`; expected one of relu, tanh, sigmoid, none",
                other
            ))),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classifier configuration
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    /// Number of hidden layers
    #[config(default = "1")]
    pub n_layers: usize,

    /// Hidden units per layer
    #[config(default = "10")]
    pub n_hidden: usize,

    /// Activation applied after every hidden layer
    #[config(default = "Activation::Relu")]
    pub activation: Activation,

    /// Dropout rate after every hidden layer
    #[config(default = "0.1")]
    pub dropout: f64,
}

impl ClassifierConfig {
    /// Default scAmp classifier: one hidden layer of 10 ReLU units
    pub fn scamp_default() -> Self {
        Self::new()
    }

    /// Reject configurations that cannot build a meaningful network
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.activation == Activation::Identity && self.n_layers > 0 {
            return Err(ScampError::Configuration(format!(
                "{} hidden layers requested without an activation function",
                self.n_layers
            )));
        }
        if self.n_layers > 0 && self.n_hidden == 0 {
            return Err(ScampError::Configuration(
                "hidden width must be positive when hidden layers are requested".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ScampError::Configuration(format!(
                "dropout rate must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }

    /// Layer widths from input to output, e.g. `[14, 10, 2]`
    pub fn layer_dims(&self) -> Vec<usize> {
        let mut dims = Vec::with_capacity(self.n_layers + 2);
        dims.push(crate::data::TOTAL_FEATURES);
        dims.extend(std::iter::repeat(self.n_hidden).take(self.n_layers));
        dims.push(crate::data::NUM_CLASSES);
        dims
    }
}
