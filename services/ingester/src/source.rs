//! HTTP access to public model output buckets.

use std::time::Duration;

use accumulation::{Dataset, SnapshotSource, SourceError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rain_common::ModelProfile;
use tracing::{debug, warn};

use crate::grib::decode_datasets;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_TIMEOUT: Duration = Duration::from_secs(600);
const FETCH_ATTEMPTS: u32 = 3;

/// Fetches GRIB2 artifacts over anonymous HTTP from public S3 buckets.
pub struct HttpGribSource {
    client: reqwest::Client,
}

impl HttpGribSource {
    pub fn new() -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Transport(format!("HTTP client init failed: {e}")))?;
        Ok(Self { client })
    }

    fn object_url(profile: &ModelProfile, key: &str) -> String {
        format!("https://{}.s3.amazonaws.com/{}", profile.source.bucket, key)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<bytes::Bytes, SourceError> {
        let mut delay = Duration::from_secs(2);
        let mut last_error = String::new();

        for attempt in 1..=FETCH_ATTEMPTS {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(SourceError::Unavailable(format!("object not found: {url}")));
                    }
                    if status.is_success() {
                        return response
                            .bytes()
                            .await
                            .map_err(|e| SourceError::Transport(format!("body read failed: {e}")));
                    }
                    last_error = format!("HTTP {status}");
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }
            if attempt < FETCH_ATTEMPTS {
                warn!(url, attempt, error = %last_error, "Fetch failed, retrying");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }

        Err(SourceError::Transport(format!(
            "fetch failed after {FETCH_ATTEMPTS} attempts: {last_error}"
        )))
    }
}

#[async_trait]
impl SnapshotSource for HttpGribSource {
    async fn run_exists(
        &self,
        profile: &ModelProfile,
        run_time: DateTime<Utc>,
    ) -> Result<bool, SourceError> {
        let key = profile.first_artifact_key(run_time);
        let url = Self::object_url(profile, &key);
        debug!(model = %profile.id, %url, "Probing candidate run");

        let response = self
            .client
            .head(&url)
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        Ok(response.status().is_success())
    }

    async fn fetch_step(
        &self,
        profile: &ModelProfile,
        run_time: DateTime<Utc>,
        lead_hours: u32,
    ) -> Result<Vec<Dataset>, SourceError> {
        let key = profile.object_key(run_time, lead_hours);
        let url = Self::object_url(profile, &key);
        debug!(model = %profile.id, lead_hours, %url, "Fetching forecast step");

        let body = self.fetch_bytes(&url).await?;
        decode_datasets(body)
    }
}
