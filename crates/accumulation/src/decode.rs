//! Precipitation variable selection over decoded datasets.
//!
//! A fetched grid file decodes into one or more [`Dataset`]s; which of them
//! holds the precipitation field, and under what name, varies by provider.
//! Each model profile carries an ordered list of named decode strategies
//! tried in sequence; exhaustion is an explicit not-found signal that the
//! caller treats as a decode failure for that step.

use rain_common::DecodeStrategy;
use tracing::debug;

use crate::dataset::Dataset;

/// Find the first (dataset, variable) pair matched by `strategies`.
pub fn select_variable<'a>(
    datasets: &'a [Dataset],
    strategies: &'a [DecodeStrategy],
) -> Option<(&'a Dataset, &'a str)> {
    for strategy in strategies {
        for ds in datasets {
            if ds.vars.contains_key(&strategy.variable) {
                debug!(
                    strategy = %strategy.name,
                    variable = %strategy.variable,
                    "Decode strategy matched"
                );
                return Some((ds, strategy.variable.as_str()));
            }
        }
    }
    None
}
