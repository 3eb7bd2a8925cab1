//! Error taxonomy for the prediction service
//!
//! Synchronously detectable errors (conflict, precondition, validation) are
//! returned directly to the caller. Faults inside an asynchronous job body are
//! written into the job slot and observed through status polls, never thrown
//! back to the caller that started the job. Artifact faults on the prediction
//! path are recovered locally via the fallback formula and only logged.

use thiserror::Error;

/// Errors surfaced to callers of the service core
#[derive(Debug, Error)]
pub enum Error {
    /// A maintenance operation attempted while another job is active
    #[error("{0}")]
    Conflict(String),

    /// A required artifact is missing before the operation can begin
    #[error("{0}")]
    Precondition(String),

    /// Malformed input (bad payload format, out-of-range parameter)
    #[error("{0}")]
    Validation(String),

    /// Requested model key is not in the known set
    #[error("invalid model '{key}'; available models: {available:?}")]
    InvalidModel {
        key: String,
        available: Vec<&'static str>,
    },

    /// Requested artifact does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Filesystem failure while managing artifacts
    #[error("artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Fault raised by the model-invocation step of a prediction.
///
/// Never propagated to prediction callers; the designated recovery branch is
/// the analytic fallback price.
#[derive(Debug, Error)]
#[error("model invocation failed: {0}")]
pub struct ArtifactFault(pub String);
