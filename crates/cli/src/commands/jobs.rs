//! Maintenance job commands

use anyhow::Result;
use clap::ValueEnum;
use std::time::Duration;

use crate::client::{ApiClient, JobStatus, StartedResponse};
use crate::output::{color_status, print_error, print_info, print_success, OutputFormat};

/// Job kind argument
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Dataset,
    Training,
}

impl KindArg {
    fn status_path(self) -> &'static str {
        match self {
            KindArg::Dataset => "api/admin/dataset-status",
            KindArg::Training => "api/admin/training-status",
        }
    }

    fn start_path(self) -> &'static str {
        match self {
            KindArg::Dataset => "api/admin/generate-dataset",
            KindArg::Training => "api/admin/train-models",
        }
    }

    fn label(self) -> &'static str {
        match self {
            KindArg::Dataset => "dataset generation",
            KindArg::Training => "model training",
        }
    }
}

fn print_status(status: &JobStatus) {
    let state = if status.running {
        color_status("running")
    } else if status.last_error.is_some() {
        color_status("failed")
    } else if status.completed_at.is_some() {
        color_status("complete")
    } else {
        "idle".to_string()
    };

    println!("State:    {}", state);
    println!("Progress: {}%", status.progress);
    if !status.step.is_empty() {
        println!("Step:     {}", status.step);
    }
    if !status.message.is_empty() {
        println!("Message:  {}", status.message);
    }
    if let Some(err) = &status.last_error {
        print_error(err);
    }
}

/// Show (and optionally watch) the status of a job slot
pub async fn status(
    client: &ApiClient,
    kind: KindArg,
    watch: bool,
    format: OutputFormat,
) -> Result<()> {
    loop {
        let status: JobStatus = client.get(kind.status_path()).await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
            OutputFormat::Table => print_status(&status),
        }

        if !watch || !status.running {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
}

/// Start a maintenance job
pub async fn start(client: &ApiClient, kind: KindArg) -> Result<()> {
    let response: StartedResponse = client
        .post(kind.start_path(), &serde_json::json!({}))
        .await?;

    print_success(&format!("{} {}", kind.label(), response.status));
    print_info(&format!(
        "Poll with: agrictl status {}",
        match kind {
            KindArg::Dataset => "dataset",
            KindArg::Training => "training",
        }
    ));

    Ok(())
}
