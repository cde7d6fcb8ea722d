//! Model run resolution against remote storage.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use rain_common::ModelProfile;
use tracing::{debug, info};

use crate::error::{ResolveError, SourceError};
use crate::source::SnapshotSource;

/// How many cycles to probe backward before giving up on a model.
const PROBE_DEPTH: u32 = 12;

/// Find the most recent run whose data actually exists on remote storage.
///
/// Runs are announced on a fixed cycle but appear with variable delay, so
/// the newest cycle boundary often has no data yet. Starting at the
/// boundary at or before `now`, probe candidates backward at the model's
/// cycle interval and return the first whose canonical first artifact
/// exists. A probe's transport error counts as a miss.
pub async fn resolve_latest_run<S>(
    source: &S,
    profile: &ModelProfile,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ResolveError>
where
    S: SnapshotSource + ?Sized,
{
    let boundary = cycle_boundary(now, profile.cycle_interval_hours);

    for i in 0..PROBE_DEPTH {
        let candidate = boundary - Duration::hours((profile.cycle_interval_hours * i) as i64);

        match source.run_exists(profile, candidate).await {
            Ok(true) => {
                info!(model = %profile.id, run = %candidate, "Resolved latest run");
                return Ok(candidate);
            }
            Ok(false) => {
                debug!(model = %profile.id, run = %candidate, "Run not yet available");
            }
            Err(SourceError::Unavailable(_)) => {
                debug!(model = %profile.id, run = %candidate, "Run not yet available");
            }
            Err(e) => {
                debug!(
                    model = %profile.id,
                    run = %candidate,
                    error = %e,
                    "Probe failed, treating run as missing"
                );
            }
        }
    }

    Err(ResolveError::NoRecentRun {
        model: profile.id.clone(),
        probed: PROBE_DEPTH,
    })
}

/// Most recent cycle boundary at or before `now`.
fn cycle_boundary(now: DateTime<Utc>, cycle_interval_hours: u32) -> DateTime<Utc> {
    let interval = cycle_interval_hours.max(1);
    let hour = now.hour() - now.hour() % interval;
    // Truncating an existing UTC timestamp to the hour cannot produce an
    // invalid or ambiguous time
    Utc.with_ymd_and_hms(
        now.date_naive().year(),
        now.date_naive().month(),
        now.date_naive().day(),
        hour,
        0,
        0,
    )
    .single()
    .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rain_common::{Accumulation, SourceSpec};
    use std::collections::HashSet;

    use crate::dataset::Dataset;

    struct FixedSource {
        available: HashSet<DateTime<Utc>>,
    }

    #[async_trait]
    impl SnapshotSource for FixedSource {
        async fn run_exists(
            &self,
            _profile: &ModelProfile,
            run_time: DateTime<Utc>,
        ) -> Result<bool, SourceError> {
            Ok(self.available.contains(&run_time))
        }

        async fn fetch_step(
            &self,
            _profile: &ModelProfile,
            _run_time: DateTime<Utc>,
            _lead_hours: u32,
        ) -> Result<Vec<Dataset>, SourceError> {
            Err(SourceError::Unavailable("not used".into()))
        }
    }

    fn profile(cycle_interval: u32) -> ModelProfile {
        ModelProfile {
            id: "gfs".into(),
            name: "GFS".into(),
            enabled: true,
            cycle_interval_hours: cycle_interval,
            step_hours: 6,
            max_horizon_hours: 384,
            semantics: Accumulation::Incremental,
            first_lead_hours: 0,
            source: SourceSpec {
                bucket: "bucket".into(),
                prefix_template: "{date}/{cycle}/f{step}".into(),
                step_label_width: 3,
            },
            decode: Vec::new(),
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_cycle_boundary_floors_to_interval() {
        let now = Utc.with_ymd_and_hms(2024, 11, 18, 14, 35, 12).unwrap();
        assert_eq!(cycle_boundary(now, 6), at(18, 12));
        assert_eq!(cycle_boundary(now, 1), at(18, 14));
    }

    #[tokio::test]
    async fn test_resolves_newest_available_cycle() {
        let source = FixedSource {
            available: HashSet::from([at(18, 6), at(18, 0)]),
        };
        // 14:35 floors to 12z, which is missing; 06z is the first hit
        let now = Utc.with_ymd_and_hms(2024, 11, 18, 14, 35, 0).unwrap();
        let run = resolve_latest_run(&source, &profile(6), now).await.unwrap();
        assert_eq!(run, at(18, 6));
    }

    #[tokio::test]
    async fn test_probes_across_day_boundary() {
        let source = FixedSource {
            available: HashSet::from([at(17, 22)]),
        };
        let now = Utc.with_ymd_and_hms(2024, 11, 18, 2, 10, 0).unwrap();
        let run = resolve_latest_run(&source, &profile(1), now).await.unwrap();
        assert_eq!(run.day(), 17);
        assert_eq!(run.hour(), 22);
    }

    #[tokio::test]
    async fn test_no_recent_run_after_probe_depth() {
        let source = FixedSource {
            available: HashSet::new(),
        };
        let now = Utc.with_ymd_and_hms(2024, 11, 18, 14, 0, 0).unwrap();
        let err = resolve_latest_run(&source, &profile(6), now)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoRecentRun { probed: 12, .. }));
    }

    #[tokio::test]
    async fn test_run_just_beyond_probe_depth_is_missed() {
        // 12 probes at 6h spacing reach back 66h inclusive; 72h is too old
        let now = Utc.with_ymd_and_hms(2024, 11, 18, 12, 0, 0).unwrap();
        let source = FixedSource {
            available: HashSet::from([now - Duration::hours(72)]),
        };
        assert!(resolve_latest_run(&source, &profile(6), now).await.is_err());
    }
}
