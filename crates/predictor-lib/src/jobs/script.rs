//! External job procedure invoked as a subprocess
//!
//! The generation and training pipelines live outside this service; the
//! runner only knows how to launch them and report exit status plus captured
//! stderr as the diagnostic.

use super::{JobKind, JobOutcome, JobRunner};
use std::process::Command;
use tracing::info;

/// Runs the configured generation/training commands as child processes
pub struct ScriptRunner {
    dataset_command: Vec<String>,
    training_command: Vec<String>,
}

impl ScriptRunner {
    pub fn new(dataset_command: Vec<String>, training_command: Vec<String>) -> Self {
        Self {
            dataset_command,
            training_command,
        }
    }

    fn command_for(&self, kind: JobKind) -> &[String] {
        match kind {
            JobKind::Dataset => &self.dataset_command,
            JobKind::Training => &self.training_command,
        }
    }
}

impl JobRunner for ScriptRunner {
    fn run(&self, kind: JobKind) -> JobOutcome {
        let command = self.command_for(kind);
        let Some((program, args)) = command.split_first() else {
            return JobOutcome::failure(format!("no command configured for {kind}"));
        };

        info!(job = %kind, program = %program, "Launching job process");
        match Command::new(program).args(args).output() {
            Ok(output) if output.status.success() => JobOutcome::success(),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                if stderr.is_empty() {
                    JobOutcome::failure(format!("{kind} process exited with {}", output.status))
                } else {
                    JobOutcome::failure(stderr)
                }
            }
            Err(e) => JobOutcome::failure(format!("failed to launch '{program}': {e}")),
        }
    }
}
