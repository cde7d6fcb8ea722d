//! Error types for the accumulation engine.

use thiserror::Error;

/// Errors from a remote snapshot source.
///
/// All variants are non-fatal to the batch: `Unavailable` and `Transport`
/// skip the probe or step, `Decode` skips the step.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Artifact not available: {0}")]
    Unavailable(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Failed to decode grid file: {0}")]
    Decode(String),
}

/// Run resolution failure. Reported and the model is skipped for the
/// cycle; never fatal to the whole ingestion job.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("No recent {model} run found in the last {probed} cycles")]
    NoRecentRun { model: String, probed: u32 },
}
