//! Model performance and health commands

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, Health, ModelPerformance};
use crate::output::{color_status, format_percent, print_info, print_table, OutputFormat};

/// Row for the models table
#[derive(Tabled, serde::Serialize)]
struct ModelRow {
    #[tabled(rename = "Model")]
    name: String,
    #[tabled(rename = "Accuracy")]
    accuracy: String,
    #[tabled(rename = "MAE")]
    mae: String,
    #[tabled(rename = "RMSE")]
    rmse: String,
    #[tabled(rename = "R²")]
    r2_score: String,
    #[tabled(rename = "Samples")]
    training_samples: u64,
}

/// List performance metrics for all models
pub async fn list(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let models: Vec<ModelPerformance> = client.get("api/models").await?;

    let rows: Vec<ModelRow> = models
        .into_iter()
        .map(|m| ModelRow {
            name: m.name,
            accuracy: format_percent(m.accuracy),
            mae: format!("{:.2}", m.mae),
            rmse: format!("{:.2}", m.rmse),
            r2_score: format!("{:.3}", m.r2_score),
            training_samples: m.training_samples,
        })
        .collect();
    print_table(&rows, format);

    Ok(())
}

/// Show server health and loaded models
pub async fn health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: Health = client.get("health").await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        OutputFormat::Table => {
            println!("Status:  {}", color_status(&health.status));
            println!("Message: {}", health.message);
            if health.models_loaded.is_empty() {
                print_info("No models loaded; predictions use the analytic fallback");
            } else {
                println!("Loaded:  {}", health.models_loaded.join(", "));
            }
        }
    }

    Ok(())
}
