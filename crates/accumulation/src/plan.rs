//! Lead-time planning for one model run against a coverage window.

use chrono::{DateTime, Utc};
use rain_common::{Accumulation, CoverageWindow, ModelProfile};

/// The lead times one run must fetch, plus the window geometry the
/// accumulator needs to weight them.
#[derive(Debug, Clone, PartialEq)]
pub struct StepPlan {
    /// Ascending lead times in hours. Empty when the window is entirely
    /// beyond the model's horizon.
    pub steps: Vec<u32>,
    /// Window start, hours after run start
    pub start_offset: f64,
    /// Window end, hours after run start (may exceed the horizon)
    pub end_offset: f64,
    /// True when the model's horizon ends before the window does; the
    /// stored projection is a known underestimate.
    pub is_partial: bool,
}

/// Compute the minimal set of lead times covering `window`.
///
/// Cumulative fields encode the running total since run start, so only the
/// two boundary steps are needed for a delta. Incremental fields encode
/// independent per-bucket totals, so every bucket overlapping the window
/// is needed, including partially-overlapped edge buckets which the
/// accumulator weights fractionally.
pub fn plan_steps(
    profile: &ModelProfile,
    run_time: DateTime<Utc>,
    window: &CoverageWindow,
) -> StepPlan {
    let (start_offset, end_offset) = window.offsets_from(run_time);
    let step = profile.step_hours;
    let horizon = profile.max_horizon_hours;

    let steps = match profile.semantics {
        Accumulation::Cumulative => {
            let step_start = (start_offset / step as f64).floor() as u32 * step;
            let step_end = ((end_offset / step as f64).floor() as u32 * step).min(horizon);

            if step_start >= horizon {
                // Whole window is unreachable for this model
                Vec::new()
            } else if step_start == step_end {
                vec![step_start]
            } else {
                vec![step_start, step_end]
            }
        }
        Accumulation::Incremental => (step..=horizon)
            .step_by(step as usize)
            .filter(|&h| {
                let bucket_start = (h - step) as f64;
                let bucket_end = h as f64;
                bucket_end > start_offset && bucket_start < end_offset
            })
            .collect(),
    };

    StepPlan {
        steps,
        start_offset,
        end_offset,
        is_partial: end_offset > horizon as f64,
    }
}
