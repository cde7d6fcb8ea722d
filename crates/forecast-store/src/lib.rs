//! Forecast record persistence.
//!
//! A thin keyed upsert store on SQLite: one row per
//! (location, model, run time), replaced wholesale on re-ingestion.

mod store;

pub use store::{ForecastRecord, ForecastStore, Result, StoreError, OBSERVATION_MODEL};
