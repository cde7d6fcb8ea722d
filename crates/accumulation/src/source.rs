//! Seam between the engine and remote forecast storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rain_common::ModelProfile;

use crate::dataset::Dataset;
use crate::error::SourceError;

/// Remote access to one model's published artifacts.
///
/// Implementations perform blocking I/O with bounded timeouts and a small
/// fixed retry budget; the engine never retries on top of them.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Does the run's canonical first artifact exist?
    async fn run_exists(
        &self,
        profile: &ModelProfile,
        run_time: DateTime<Utc>,
    ) -> Result<bool, SourceError>;

    /// Fetch and decode one lead time's grid file into datasets.
    async fn fetch_step(
        &self,
        profile: &ModelProfile,
        run_time: DateTime<Utc>,
        lead_hours: u32,
    ) -> Result<Vec<Dataset>, SourceError>;
}
