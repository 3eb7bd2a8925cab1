//! Maintenance job orchestration
//!
//! Two long-running maintenance jobs exist: dataset generation and model
//! training. Both may read and write the same dataset/model directories, so
//! the tracker enforces mutual exclusion across the two kinds, not just within
//! one. The actual generation/training work is delegated to a [`JobRunner`]
//! collaborator treated as a black box.

mod script;
mod tracker;

pub use script::ScriptRunner;
pub use tracker::JobTracker;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two mutually exclusive maintenance job kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Dataset,
    Training,
}

impl JobKind {
    /// The opposing kind, for the cross-kind exclusion check
    pub fn other(self) -> Self {
        match self {
            JobKind::Dataset => JobKind::Training,
            JobKind::Training => JobKind::Dataset,
        }
    }

    /// Human-readable label used in messages and errors
    pub fn label(self) -> &'static str {
        match self {
            JobKind::Dataset => "dataset generation",
            JobKind::Training => "model training",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of one job slot.
///
/// Invariants: `running` implies `completed_at` is unset; `last_error` set
/// implies `running` is false. Terminal shapes stay in place until the next
/// start overwrites the slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobState {
    pub running: bool,
    pub progress: u8,
    /// Coarse step label; only the training job uses it
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub step: String,
    pub message: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Result reported by the delegated external procedure
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub success: bool,
    pub diagnostic: String,
}

impl JobOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            diagnostic: String::new(),
        }
    }

    pub fn failure(diagnostic: impl Into<String>) -> Self {
        Self {
            success: false,
            diagnostic: diagnostic.into(),
        }
    }
}

/// Black-box collaborator that performs the actual generation/training work.
///
/// `run` blocks the calling thread until the procedure finishes; the tracker
/// dispatches it on a blocking task so request handling never waits on it.
pub trait JobRunner: Send + Sync + 'static {
    fn run(&self, kind: JobKind) -> JobOutcome;
}
