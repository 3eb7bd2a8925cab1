//! AgriPredict CLI
//!
//! A command-line tool for requesting price predictions, inspecting model
//! performance, and driving the maintenance jobs of an AgriPredict server.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{jobs, models, predict};

/// AgriPredict CLI
#[derive(Parser)]
#[command(name = "agrictl")]
#[command(author, version, about = "CLI for the AgriPredict price prediction service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via AGRIPREDICT_API_URL env var)
    #[arg(long, env = "AGRIPREDICT_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Request a price prediction
    Predict {
        /// Year for the prediction (2020-2030)
        #[arg(long)]
        year: i32,

        /// Month for the prediction (1-12)
        #[arg(long)]
        month: u32,

        /// Market city (e.g. Bangalore, Delhi)
        #[arg(long)]
        city: String,

        /// Chilli variety (e.g. Guntur, Byadgi)
        #[arg(long)]
        variety: String,

        /// Model to use (random_forest, xgboost, linear_regression)
        #[arg(long, default_value = "random_forest")]
        model: String,

        /// Expected arrivals in quintals
        #[arg(long, default_value_t = 2000.0)]
        arrivals: f64,

        /// Expected rainfall in mm
        #[arg(long, default_value_t = 50.0)]
        rainfall: f64,

        /// Expected temperature in °C
        #[arg(long, default_value_t = 28.0)]
        temperature: f64,
    },

    /// Show performance metrics for all models
    Models,

    /// Show server health and loaded models
    Health,

    /// Show maintenance job status
    Status {
        /// Job kind to inspect (dataset or training)
        kind: jobs::KindArg,

        /// Poll until the job finishes
        #[arg(long, short)]
        watch: bool,
    },

    /// Trigger dataset generation
    GenerateDataset,

    /// Trigger model training
    Train,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = client::ApiClient::new(&cli.api_url)?;

    match cli.command {
        Commands::Predict {
            year,
            month,
            city,
            variety,
            model,
            arrivals,
            rainfall,
            temperature,
        } => {
            predict::run(
                &client,
                predict::PredictArgs {
                    year,
                    month,
                    city,
                    variety,
                    model,
                    arrivals,
                    rainfall,
                    temperature,
                },
                cli.format,
            )
            .await
        }
        Commands::Models => models::list(&client, cli.format).await,
        Commands::Health => models::health(&client, cli.format).await,
        Commands::Status { kind, watch } => jobs::status(&client, kind, watch, cli.format).await,
        Commands::GenerateDataset => jobs::start(&client, jobs::KindArg::Dataset).await,
        Commands::Train => jobs::start(&client, jobs::KindArg::Training).await,
    }
}
