//! Price prediction command

use anyhow::Result;
use serde_json::json;
use tabled::Tabled;

use crate::client::{ApiClient, Prediction};
use crate::output::{format_percent, format_price, print_table, OutputFormat};

/// Arguments for a prediction request
pub struct PredictArgs {
    pub year: i32,
    pub month: u32,
    pub city: String,
    pub variety: String,
    pub model: String,
    pub arrivals: f64,
    pub rainfall: f64,
    pub temperature: f64,
}

/// Row for the prediction result table
#[derive(Tabled, serde::Serialize)]
struct PredictionRow {
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "MAE")]
    mae: String,
    #[tabled(rename = "R²")]
    r2_score: String,
}

/// Request a prediction and print the result
pub async fn run(client: &ApiClient, args: PredictArgs, format: OutputFormat) -> Result<()> {
    let body = json!({
        "year": args.year,
        "month": args.month,
        "city": args.city,
        "variety": args.variety,
        "model": args.model,
        "arrivals": args.arrivals,
        "rainfall": args.rainfall,
        "temperature": args.temperature,
    });

    let prediction: Prediction = client.post("api/predict", &body).await?;

    let rows = vec![PredictionRow {
        price: format_price(prediction.predicted_price),
        model: prediction.model_used.clone(),
        confidence: format_percent(prediction.confidence),
        mae: format!("{:.2}", prediction.mae),
        r2_score: format!("{:.3}", prediction.r2_score),
    }];
    print_table(&rows, format);

    Ok(())
}
