//! RainFlux offline pipeline: data processing and model training

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rainflux::{
    config::{Config, PipelineConfig},
    logging,
    services::{DataProcessingService, ModelTrainingService},
};

#[derive(Parser)]
#[command(name = "rainflux-pipeline")]
#[command(about = "RainFlux data processing and model training", long_about = None)]
struct Cli {
    /// Skip the confusion matrix and ROC images
    #[arg(long, global = true)]
    no_charts: bool,

    /// Seed for the stratified split (overrides configuration)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean, encode and split a raw weather CSV
    Process {
        #[arg(value_name = "INPUT_CSV")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT_DIR")]
        output: PathBuf,
    },

    /// Train and evaluate a model on processed splits
    Train {
        #[arg(value_name = "PROCESSED_DIR")]
        processed: PathBuf,

        #[arg(value_name = "MODEL_DIR")]
        model: PathBuf,
    },

    /// Process and train using the configured artifact paths
    Run,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::load()?;
    logging::init(&config.logging)?;

    let mut settings: PipelineConfig = config.pipeline.clone();
    if cli.no_charts {
        settings.render_charts = false;
    }
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }

    match cli.command {
        Commands::Process { input, output } => {
            let report = DataProcessingService::new(input, output, &settings)?.run()?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Train { processed, model } => {
            let metrics = ModelTrainingService::new(processed, model, &settings)?.run()?;
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
        Commands::Run => {
            let artifacts = &config.artifacts;
            let report = DataProcessingService::new(
                &artifacts.raw_data,
                &artifacts.processed_dir,
                &settings,
            )?
            .run()?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            let metrics =
                ModelTrainingService::new(&artifacts.processed_dir, &artifacts.models_dir, &settings)?
                    .run()?;
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
    }

    Ok(())
}
