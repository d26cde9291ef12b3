use anyhow::{Context, Result};
use burn_ndarray::NdArrayDevice;
use scamp::cli::{parse_args, setup_logging, Commands, PredictArgs, TrainArgs};
use scamp::data::feature_engineering::FeatureBuilder;
use scamp::data::loader::{load_labels, CopyNumberLoader};
use scamp::error::ScampError;
use scamp::model::classifier::ScampModel;
use scamp::predict::pipeline::run_prediction;
use scamp::training::TrainingSet;
use scamp::DefaultBackend;
use tracing::{error, info};

fn main() {
    let cli = parse_args();

    setup_logging(cli.verbose);

    info!("{}", scamp::info());

    let result = match cli.command {
        Commands::Predict(args) => run_predict(args),
        Commands::Train(args) => run_train(args),
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let copy_numbers_file = match (&args.copy_numbers_file, &args.anndata) {
        (Some(path), _) => path.clone(),
        (None, Some(path)) => {
            return Err(ScampError::Configuration(format!(
                "cannot read {:?}: annotated matrix input is not supported, export the copy \
                 numbers to a tsv or csv table and pass it with --copy-numbers-file",
                path
            ))
            .into());
        }
        (None, None) => {
            return Err(ScampError::Configuration(
                "one of --copy-numbers-file or --anndata is required".to_string(),
            )
            .into());
        }
    };

    info!("Starting prediction...");
    info!("Model: {:?}", args.model);
    info!("Output directory: {:?}", args.output_dir);

    let config = args.to_config();
    let model = ScampModel::<DefaultBackend>::load(&args.model, NdArrayDevice::default())
        .with_context(|| format!("Failed to load model from {:?}", args.model))?;

    let outputs = run_prediction(&copy_numbers_file, &model, &args.output_dir, &config)?;

    info!("Predictions saved to: {:?}", outputs.predictions_path);
    if let Some(plot) = outputs.plot_path {
        info!("Plot saved to: {:?}", plot);
    }
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    info!("Starting training...");
    info!("Input file: {:?}", args.copy_numbers_file);
    info!("Output directory: {:?}", args.output);

    let model_config = args.model_config();
    let training_config = args.training_config();
    model_config.validate()?;
    training_config.validate()?;

    let matrix = CopyNumberLoader::new()
        .load(&args.copy_numbers_file)
        .with_context(|| format!("Failed to load copy numbers from {:?}", args.copy_numbers_file))?;
    let labels = load_labels(&args.labels)
        .with_context(|| format!("Failed to load labels from {:?}", args.labels))?;

    let features = FeatureBuilder::with_config(args.features.to_config())
        .build_from_matrix(&matrix)
        .context("Failed to build features")?;
    let training_set = TrainingSet::from_labeled_features(&features, &labels);

    let mut model = ScampModel::<DefaultBackend>::new_seeded(
        model_config,
        NdArrayDevice::default(),
        training_config.seed,
    )?;
    model
        .fit(&training_set.features, &training_set.labels, &training_config)
        .context("Training failed")?;

    model
        .save(&args.output)
        .with_context(|| format!("Failed to save model to {:?}", args.output))?;

    info!("Model saved to: {:?}", args.output);
    Ok(())
}
