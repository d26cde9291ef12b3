use crate::data::feature_engineering::FeatureConfig;
use crate::model::{Activation, ClassifierConfig};
use crate::predict::pipeline::PredictConfig;
use crate::training::{OptimizerKind, TrainingConfig};
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

/// scAmp: ecDNA prediction from single-cell copy-number distributions
#[derive(Parser, Debug)]
#[command(name = "scamp")]
#[command(about = "ecDNA prediction from single-cell copy-number distributions")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Predict ecDNA status of every gene with a trained model
    Predict(PredictArgs),

    /// Train a new model from copy numbers and gene labels
    Train(TrainArgs),
}

/// Thresholds for turning copy numbers into features
#[derive(Args, Debug, Clone)]
pub struct FeatureArgs {
    /// Copy numbers at or below this value are ignored per cell
    #[arg(long, default_value = "2.0")]
    pub min_copy_number: f64,

    /// Copy numbers above this percentile of a gene are treated as missing
    #[arg(long, default_value = "99.0")]
    pub max_percentile: f64,

    /// Genes with a mean copy number below this value are skipped
    #[arg(long, default_value = "2.5")]
    pub filter_copy_number: f64,
}

impl FeatureArgs {
    pub fn to_config(&self) -> FeatureConfig {
        FeatureConfig {
            min_copy_number: self.min_copy_number,
            max_percentile: self.max_percentile,
            filter_copy_number: self.filter_copy_number,
        }
    }
}

/// Prediction arguments
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["copy_numbers_file", "anndata"])))]
pub struct PredictArgs {
    /// Directory for model_predictions.tsv and the plot
    pub output_dir: PathBuf,

    /// Directory of a saved model
    pub model: PathBuf,

    /// Cell-by-gene copy-number table (tsv, csv, optionally gzipped)
    #[arg(long)]
    pub copy_numbers_file: Option<PathBuf>,

    /// Annotated matrix file with copy numbers
    #[arg(long)]
    pub anndata: Option<PathBuf>,

    /// Minimum ecDNA probability for a positive call
    #[arg(long, default_value = "0.5")]
    pub decision_rule: f64,

    #[command(flatten)]
    pub features: FeatureArgs,

    /// Skip the HTML scatter plot
    #[arg(long)]
    pub no_plot: bool,
}

impl PredictArgs {
    pub fn to_config(&self) -> PredictConfig {
        PredictConfig {
            features: self.features.to_config(),
            decision_rule: self.decision_rule,
            no_plot: self.no_plot,
        }
    }
}

/// Training arguments
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Cell-by-gene copy-number table (tsv, csv, optionally gzipped)
    #[arg(long, required = true)]
    pub copy_numbers_file: PathBuf,

    /// Table with `gene` and `label` (0/1) columns
    #[arg(long, required = true)]
    pub labels: PathBuf,

    /// Directory to save the trained model into
    #[arg(short, long, default_value = "./model")]
    pub output: PathBuf,

    /// Number of hidden layers
    #[arg(long, default_value = "1")]
    pub n_layers: usize,

    /// Width of each hidden layer
    #[arg(long, default_value = "10")]
    pub n_hidden: usize,

    /// Hidden activation (relu, tanh, sigmoid, none)
    #[arg(long, default_value = "relu")]
    pub activation: Activation,

    /// Dropout rate after each hidden layer
    #[arg(long, default_value = "0.1")]
    pub dropout: f64,

    /// Number of training epochs
    #[arg(short, long, default_value = "100")]
    pub epochs: usize,

    /// Learning rate
    #[arg(long, default_value = "0.001")]
    pub learning_rate: f64,

    /// Batch size
    #[arg(short, long, default_value = "128")]
    pub batch_size: usize,

    /// Optimizer (adam, sgd)
    #[arg(long, default_value = "adam")]
    pub optimizer: OptimizerKind,

    /// Threads assembling minibatches (0 = one per core)
    #[arg(long, default_value = "1")]
    pub num_workers: usize,

    /// Epochs between accuracy reports
    #[arg(long, default_value = "10")]
    pub reporting_freq: usize,

    /// Random seed
    #[arg(long, default_value = "2026")]
    pub seed: u64,

    #[command(flatten)]
    pub features: FeatureArgs,
}

impl TrainArgs {
    pub fn model_config(&self) -> ClassifierConfig {
        ClassifierConfig::new()
            .with_n_layers(self.n_layers)
            .with_n_hidden(self.n_hidden)
            .with_activation(self.activation)
            .with_dropout(self.dropout)
    }

    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            epochs: self.epochs,
            learning_rate: self.learning_rate,
            batch_size: self.batch_size,
            optimizer: self.optimizer,
            num_workers: self.num_workers,
            verbose: true,
            reporting_freq: self.reporting_freq,
            seed: self.seed,
        }
    }
}

/// Parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Setup logging based on verbosity
pub fn setup_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
