//! Common types shared across the rain-totals crates.
//!
//! Everything here is static reference data: the station catalog and model
//! profiles are loaded once at startup and injected by shared reference into
//! the components that need them. Nothing in this crate mutates after load.

pub mod model;
pub mod station;
pub mod time;

pub use model::{default_decode, Accumulation, DecodeStrategy, ModelProfile, SourceSpec};
pub use station::Station;
pub use time::CoverageWindow;
