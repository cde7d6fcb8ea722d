//! Per-cycle ingestion orchestration.
//!
//! One cycle walks every enabled model: resolve its newest available run,
//! plan the lead times covering the rest of the month, fetch and extract
//! each step, accumulate per station, and upsert one forecast row per
//! station. Failures stay inside the model that raised them; one broken
//! model never blocks the others.

use std::collections::BTreeMap;
use std::sync::Arc;

use accumulation::{
    accumulate, extract_values, mm_to_inches, plan_steps, resolve_latest_run, select_variable,
    SnapshotSource, SourceError,
};
use anyhow::Result;
use chrono::Utc;
use forecast_store::ForecastStore;
use rain_common::{CoverageWindow, ModelProfile, Station};
use tracing::{error, info, warn};

pub struct Ingester {
    stations: Vec<Station>,
    profiles: Vec<ModelProfile>,
    source: Arc<dyn SnapshotSource>,
    store: Arc<ForecastStore>,
}

impl Ingester {
    pub fn new(
        stations: Vec<Station>,
        profiles: Vec<ModelProfile>,
        source: Arc<dyn SnapshotSource>,
        store: Arc<ForecastStore>,
    ) -> Self {
        Self {
            stations,
            profiles,
            source,
            store,
        }
    }

    /// Run one ingestion cycle over every enabled model.
    pub async fn run_all(&self) -> Result<()> {
        let now = Utc::now();
        for profile in self.profiles.iter().filter(|p| p.enabled) {
            if let Err(e) = self.run_model(profile, now).await {
                error!(model = %profile.id, error = %e, "Model ingestion failed");
            }
        }
        Ok(())
    }

    /// Ingest one model's latest run into the store.
    pub async fn run_model(
        &self,
        profile: &ModelProfile,
        now: chrono::DateTime<Utc>,
    ) -> Result<()> {
        let window = match CoverageWindow::remaining_month(now) {
            Some(w) => w,
            None => {
                info!(model = %profile.id, "No remaining coverage window this month");
                return Ok(());
            }
        };

        let run_time = match resolve_latest_run(self.source.as_ref(), profile, now).await {
            Ok(t) => t,
            Err(e) => {
                warn!(model = %profile.id, error = %e, "Skipping model");
                return Ok(());
            }
        };

        let plan = plan_steps(profile, run_time, &window);
        if plan.steps.is_empty() {
            info!(model = %profile.id, run = %run_time, "No steps to fetch for window");
            return Ok(());
        }
        info!(
            model = %profile.id,
            run = %run_time,
            steps = plan.steps.len(),
            is_partial = plan.is_partial,
            "Planned forecast steps"
        );

        // station id -> lead hour -> inches
        let mut per_station: BTreeMap<String, BTreeMap<u32, f64>> = self
            .stations
            .iter()
            .map(|s| (s.id.clone(), BTreeMap::new()))
            .collect();

        for &lead_hours in &plan.steps {
            let datasets = match self.source.fetch_step(profile, run_time, lead_hours).await {
                Ok(d) => d,
                Err(SourceError::Unavailable(msg)) => {
                    warn!(model = %profile.id, lead_hours, %msg, "Step missing, skipping");
                    continue;
                }
                Err(e) => {
                    warn!(model = %profile.id, lead_hours, error = %e, "Step fetch failed, skipping");
                    continue;
                }
            };

            let (ds, variable) = match select_variable(&datasets, &profile.decode) {
                Some(found) => found,
                None => {
                    warn!(
                        model = %profile.id,
                        lead_hours,
                        "No decode strategy yielded a precipitation field, skipping step"
                    );
                    continue;
                }
            };

            for (station_id, mm) in extract_values(ds, variable, &self.stations) {
                if let Some(steps) = per_station.get_mut(&station_id) {
                    steps.insert(lead_hours, mm_to_inches(mm));
                }
            }
        }

        for station in &self.stations {
            let values = &per_station[&station.id];
            let remainder = accumulate(profile, &plan, values);
            let observed = self.store.latest_observed(&station.id).await?;

            self.store
                .upsert_forecast(
                    &station.id,
                    &profile.id,
                    run_time,
                    observed,
                    remainder,
                    plan.is_partial,
                )
                .await?;

            info!(
                station = %station.id,
                model = %profile.id,
                observed,
                remainder,
                total = observed + remainder.max(0.0),
                "Stored forecast"
            );
        }

        Ok(())
    }
}
