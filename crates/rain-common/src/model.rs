//! Numerical weather model profiles and remote-source addressing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a model's precipitation field accumulates over lead time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accumulation {
    /// Field holds the running total since the run started; a remainder only
    /// needs the two endpoint snapshots.
    Cumulative,
    /// Field holds the total within one step-sized bucket; every overlapping
    /// bucket must be visited and fractionally weighted.
    Incremental,
}

/// Remote addressing for one model's published artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Public S3 bucket the model publishes to
    pub bucket: String,
    /// Object key template with {date}, {cycle} and {step} placeholders
    pub prefix_template: String,
    /// Zero-pad width for the {step} placeholder (0 = unpadded decimal)
    #[serde(default)]
    pub step_label_width: usize,
}

/// One named attempt at locating the precipitation variable in a decoded
/// grid file. Strategies are tried in order; the first hit wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeStrategy {
    /// Label used in logs when this strategy matches or all fail
    pub name: String,
    /// Variable name to look for in the decoded datasets
    pub variable: String,
}

pub fn default_decode() -> Vec<DecodeStrategy> {
    vec![
        DecodeStrategy {
            name: "apcp-surface".into(),
            variable: "apcp".into(),
        },
        DecodeStrategy {
            name: "tp-fallback".into(),
            variable: "tp".into(),
        },
    ]
}

/// Static profile of one forecast model.
///
/// Loaded from `config/models/<id>.yaml`; immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelProfile {
    pub id: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Hours between consecutive runs (6 for synoptic models, 1 for
    /// rapid-refresh models). Distinct from `step_hours`: a model can run
    /// hourly while publishing 3-hourly forecast steps.
    pub cycle_interval_hours: u32,
    /// Forecast step granularity in hours
    pub step_hours: u32,
    /// Longest available lead time in hours
    pub max_horizon_hours: u32,
    pub semantics: Accumulation,
    /// Lead time of the earliest published artifact. Usually 0, but some
    /// models' first file is not analysis time.
    #[serde(default)]
    pub first_lead_hours: u32,
    pub source: SourceSpec,
    /// Ordered decode strategies for locating the precipitation variable
    #[serde(default = "default_decode")]
    pub decode: Vec<DecodeStrategy>,
}

fn default_enabled() -> bool {
    true
}

impl ModelProfile {
    /// Format a lead-time hour the way this model labels its artifacts
    /// (e.g. "6" for unpadded, "06", "006").
    pub fn step_label(&self, lead_hours: u32) -> String {
        format!(
            "{:0width$}",
            lead_hours,
            width = self.source.step_label_width
        )
    }

    /// Object key for one (run, lead time) artifact.
    pub fn object_key(&self, run_time: DateTime<Utc>, lead_hours: u32) -> String {
        self.source
            .prefix_template
            .replace("{date}", &run_time.format("%Y%m%d").to_string())
            .replace("{cycle}", &run_time.format("%H").to_string())
            .replace("{step}", &self.step_label(lead_hours))
    }

    /// Object key for the run's canonical first artifact, used by the
    /// run resolver's existence probes.
    pub fn first_artifact_key(&self, run_time: DateTime<Utc>) -> String {
        self.object_key(run_time, self.first_lead_hours)
    }
}
