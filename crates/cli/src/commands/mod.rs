//! CLI command implementations

pub mod jobs;
pub mod models;
pub mod predict;
