//! Remainder accumulation from recovered per-step station values.

use std::collections::BTreeMap;

use rain_common::{Accumulation, ModelProfile};

use crate::plan::StepPlan;

/// 1 mm of precipitation in inches. Applied once, immediately after
/// extraction, so all accumulation math runs in a single unit system.
pub const MM_TO_INCHES: f64 = 0.0393701;

pub fn mm_to_inches(mm: f64) -> f64 {
    mm * MM_TO_INCHES
}

/// Combine one station's recovered step values into a remaining-window
/// total, in inches.
///
/// `values` maps recovered lead hours to inches and may be sparse: any
/// planned step whose fetch or decode failed is simply absent.
///
/// Cumulative fields take the clamped difference of the recovered
/// endpoints. A lone recovered step counts only when its lead is past
/// hour 0 (the missing start is then taken as zero); a lone hour-0 step is
/// ambiguous and deliberately contributes nothing. Incremental fields sum
/// every planned bucket weighted by its fractional overlap with the
/// window; missing buckets contribute zero.
pub fn accumulate(profile: &ModelProfile, plan: &StepPlan, values: &BTreeMap<u32, f64>) -> f64 {
    match profile.semantics {
        Accumulation::Cumulative => {
            let recovered: Vec<(u32, f64)> = values.iter().map(|(&h, &v)| (h, v)).collect();
            match recovered.as_slice() {
                [] => 0.0,
                [(first, value)] => {
                    if *first > 0 {
                        *value
                    } else {
                        0.0
                    }
                }
                [(_, first), .., (_, last)] => (last - first).max(0.0),
            }
        }
        Accumulation::Incremental => {
            let step = profile.step_hours as f64;
            plan.steps
                .iter()
                .map(|&h| {
                    let value = values.get(&h).copied().unwrap_or(0.0);
                    let overlap = (h as f64).min(plan.end_offset)
                        - ((h as f64) - step).max(plan.start_offset);
                    value * overlap.max(0.0) / step
                })
                .sum()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rain_common::SourceSpec;

    fn profile(semantics: Accumulation, step: u32, horizon: u32) -> ModelProfile {
        ModelProfile {
            id: "test".into(),
            name: "Test".into(),
            enabled: true,
            cycle_interval_hours: 6,
            step_hours: step,
            max_horizon_hours: horizon,
            semantics,
            first_lead_hours: 0,
            source: SourceSpec {
                bucket: "bucket".into(),
                prefix_template: "{date}/{cycle}/f{step}".into(),
                step_label_width: 3,
            },
            decode: Vec::new(),
        }
    }

    fn plan(steps: Vec<u32>, start: f64, end: f64, horizon: u32) -> StepPlan {
        StepPlan {
            steps,
            start_offset: start,
            end_offset: end,
            is_partial: end > horizon as f64,
        }
    }

    #[test]
    fn test_cumulative_endpoint_difference() {
        let p = profile(Accumulation::Cumulative, 6, 240);
        let values = BTreeMap::from([(6, 0.10), (168, 1.35)]);
        let remainder = accumulate(&p, &plan(vec![6, 168], 3.5, 168.0, 240), &values);
        assert!((remainder - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_cumulative_negative_delta_clamped() {
        // Numerical noise upstream can make the later snapshot smaller
        let p = profile(Accumulation::Cumulative, 6, 240);
        let values = BTreeMap::from([(0, 0.30), (48, 0.29)]);
        assert_eq!(accumulate(&p, &plan(vec![0, 48], 0.0, 48.0, 240), &values), 0.0);
    }

    #[test]
    fn test_cumulative_single_step_past_zero_used_directly() {
        let p = profile(Accumulation::Cumulative, 6, 240);
        let values = BTreeMap::from([(168, 1.35)]);
        let remainder = accumulate(&p, &plan(vec![0, 168], 0.0, 168.0, 240), &values);
        assert!((remainder - 1.35).abs() < 1e-9);
    }

    #[test]
    fn test_cumulative_single_step_at_zero_is_conservative() {
        let p = profile(Accumulation::Cumulative, 6, 240);
        let values = BTreeMap::from([(0, 0.40)]);
        assert_eq!(accumulate(&p, &plan(vec![0, 168], 0.0, 168.0, 240), &values), 0.0);
    }

    #[test]
    fn test_cumulative_nothing_recovered() {
        let p = profile(Accumulation::Cumulative, 6, 240);
        assert_eq!(
            accumulate(&p, &plan(vec![0, 168], 0.0, 168.0, 240), &BTreeMap::new()),
            0.0
        );
    }

    #[test]
    fn test_incremental_fractional_edge_weights() {
        // Offsets (0.5, 2.5) over 1h buckets {1,2,3}
        // weight the recovered values by {0.5, 1.0, 0.5}
        let p = profile(Accumulation::Incremental, 1, 48);
        let values = BTreeMap::from([(1, 1.0), (2, 1.0), (3, 1.0)]);
        let remainder = accumulate(&p, &plan(vec![1, 2, 3], 0.5, 2.5, 48), &values);
        assert!((remainder - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_incremental_missing_steps_contribute_zero() {
        let p = profile(Accumulation::Incremental, 6, 384);
        let values = BTreeMap::from([(6, 0.12), (18, 0.30)]);
        let remainder = accumulate(&p, &plan(vec![6, 12, 18], 0.0, 18.0, 384), &values);
        assert!((remainder - 0.42).abs() < 1e-9);
    }

    #[test]
    fn test_accumulation_is_idempotent() {
        let p = profile(Accumulation::Incremental, 1, 48);
        let values = BTreeMap::from([(1, 0.2), (2, 0.7), (3, 0.1)]);
        let plan = plan(vec![1, 2, 3], 0.5, 2.5, 48);
        assert_eq!(accumulate(&p, &plan, &values), accumulate(&p, &plan, &values));
    }

    #[test]
    fn test_mm_conversion() {
        assert!((mm_to_inches(25.4) - 1.0).abs() < 1e-3);
    }
}
