//! Loosely-typed decoded grid fields.
//!
//! Upstream grid files carry their coordinate and variable names in-band,
//! and different models disagree on both the names and the shapes. A
//! [`Dataset`] keeps that looseness at the boundary: named coordinate
//! arrays (1-D axes or full 2-D fields) plus named flat value arrays.
//! Coordinate/variable discovery happens at extraction time, never at
//! decode time.

use std::collections::HashMap;

/// A named coordinate array.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordArray {
    /// Rectilinear axis: one value per grid line
    OneD(Vec<f64>),
    /// Curvilinear field: one value per grid cell, row-major,
    /// shape = (rows, cols)
    TwoD {
        values: Vec<f64>,
        shape: (usize, usize),
    },
}

impl CoordArray {
    pub fn len(&self) -> usize {
        match self {
            CoordArray::OneD(v) => v.len(),
            CoordArray::TwoD { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One decoded field for one (model, run, lead time) fetch.
///
/// Transient: owned by the extraction call that created it and dropped
/// immediately afterwards. Values are in the grid's native units
/// (millimeters for the precipitation fields handled here).
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub coords: HashMap<String, CoordArray>,
    pub vars: HashMap<String, Vec<f64>>,
}

impl Dataset {
    /// Look up a coordinate by candidate names, first match wins.
    pub fn coord<'a>(&'a self, candidates: &[&str]) -> Option<&'a CoordArray> {
        candidates.iter().find_map(|name| self.coords.get(*name))
    }
}
