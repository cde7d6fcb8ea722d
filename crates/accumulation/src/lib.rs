//! Forecast accumulation engine.
//!
//! Turns multi-model forecast output into one remaining-month precipitation
//! estimate per station:
//!
//! 1. [`resolve::resolve_latest_run`] finds the newest run that actually
//!    exists on remote storage by probing candidate cycles backward.
//! 2. [`plan::plan_steps`] decides which lead times cover "now through end
//!    of month" given the model's step size, horizon and accumulation
//!    semantics.
//! 3. [`decode::select_variable`] locates the precipitation variable in a
//!    decoded grid file via the model's ordered decode strategies.
//! 4. [`extract::extract_values`] pulls one nearest-neighbor value per
//!    station out of the grid, handling 1-D and 2-D coordinates and both
//!    longitude conventions.
//! 5. [`accumulate::accumulate`] combines the recovered per-step values into
//!    a single remainder, endpoint-difference for cumulative fields and
//!    fractional-overlap summation for incremental fields.
//!
//! Remote transport is behind the [`source::SnapshotSource`] trait; the
//! ingester service provides the HTTP/S3 implementation.

pub mod accumulate;
pub mod dataset;
pub mod decode;
pub mod error;
pub mod extract;
pub mod plan;
pub mod resolve;
pub mod source;

pub use accumulate::{accumulate, mm_to_inches, MM_TO_INCHES};
pub use dataset::{CoordArray, Dataset};
pub use decode::select_variable;
pub use error::{ResolveError, SourceError};
pub use extract::extract_values;
pub use plan::{plan_steps, StepPlan};
pub use resolve::resolve_latest_run;
pub use source::SnapshotSource;
