//! Nearest-neighbor spatial extraction of station values from grids.
//!
//! Handles both grid families the upstream models publish: 1-D rectilinear
//! axes (global lat/lon models) and 2-D curvilinear coordinate fields
//! (projected regional models), plus both longitude conventions. Station
//! counts are small (tens), so the 2-D path is a brute-force scan; a
//! spatial index could replace it without changing the contract.

use std::collections::HashMap;

use rain_common::Station;
use tracing::warn;

use crate::dataset::{CoordArray, Dataset};

const LAT_NAMES: &[&str] = &["latitude", "lat"];
const LON_NAMES: &[&str] = &["longitude", "lon"];

/// Extract one value per station from a decoded dataset, in the grid's
/// native units.
///
/// Never fails: unidentifiable coordinates degrade the whole batch to
/// zeros, and any single station's lookup failure degrades that station
/// to zero. Both paths log a warning.
pub fn extract_values(
    ds: &Dataset,
    variable: &str,
    stations: &[Station],
) -> HashMap<String, f64> {
    let zeros = || -> HashMap<String, f64> {
        stations.iter().map(|s| (s.id.clone(), 0.0)).collect()
    };

    let values = match ds.vars.get(variable) {
        Some(v) => v,
        None => {
            warn!(variable, "Variable missing from dataset, degrading to zeros");
            return zeros();
        }
    };

    let (lats, lons) = match (ds.coord(LAT_NAMES), ds.coord(LON_NAMES)) {
        (Some(lats), Some(lons)) => (lats, lons),
        _ => {
            warn!(variable, "No lat/lon coordinates found, degrading to zeros");
            return zeros();
        }
    };

    match (lats, lons) {
        (CoordArray::OneD(lats), CoordArray::OneD(lons)) => {
            if values.len() != lats.len() * lons.len() {
                warn!(
                    expected = lats.len() * lons.len(),
                    actual = values.len(),
                    "Grid value count does not match axes, degrading to zeros"
                );
                return zeros();
            }
            extract_rectilinear(lats, lons, values, stations)
        }
        (
            CoordArray::TwoD {
                values: lats,
                shape,
            },
            CoordArray::TwoD { values: lons, .. },
        ) => {
            if lats.len() != lons.len()
                || lats.len() != shape.0 * shape.1
                || values.len() != lats.len()
            {
                warn!(
                    lats = lats.len(),
                    lons = lons.len(),
                    values = values.len(),
                    "Curvilinear coordinate shape mismatch, degrading to zeros"
                );
                return zeros();
            }
            extract_curvilinear(lats, lons, values, stations)
        }
        _ => {
            warn!(
                variable,
                "Mismatched coordinate dimensionality, degrading to zeros"
            );
            zeros()
        }
    }
}

/// Separable nearest-neighbor on a rectilinear grid, values row-major with
/// latitude as the slow axis.
fn extract_rectilinear(
    lats: &[f64],
    lons: &[f64],
    values: &[f64],
    stations: &[Station],
) -> HashMap<String, f64> {
    // A single longitude past 180 marks the whole grid as 0-360
    let grid_is_0_360 = lons.iter().any(|&l| l > 180.0);

    let mut out = HashMap::with_capacity(stations.len());
    for station in stations {
        let target_lon = if grid_is_0_360 {
            station.lon.rem_euclid(360.0)
        } else {
            station.lon
        };

        let value = match (
            nearest_index(lats, station.lat),
            nearest_index(lons, target_lon),
        ) {
            (Some(li), Some(oi)) => {
                let idx = li * lons.len() + oi;
                match values.get(idx) {
                    Some(v) => *v,
                    None => {
                        warn!(
                            station = %station.id,
                            idx,
                            len = values.len(),
                            "Grid index out of range, substituting zero"
                        );
                        0.0
                    }
                }
            }
            _ => {
                warn!(station = %station.id, "Empty coordinate axis, substituting zero");
                0.0
            }
        };
        out.insert(station.id.clone(), value);
    }
    out
}

/// Brute-force nearest-neighbor over a 2-D coordinate field. Squared
/// distance in degree space; the first minimum in row-major scan order
/// wins ties.
fn extract_curvilinear(
    lats: &[f64],
    lons: &[f64],
    values: &[f64],
    stations: &[Station],
) -> HashMap<String, f64> {
    let wrapped: Vec<f64>;
    let lons = if lons.iter().any(|&l| l > 180.0) {
        wrapped = lons.iter().map(|&l| to_signed_lon(l)).collect();
        &wrapped[..]
    } else {
        lons
    };

    let mut out = HashMap::with_capacity(stations.len());
    for station in stations {
        let mut best: Option<(usize, f64)> = None;
        for (idx, (&lat, &lon)) in lats.iter().zip(lons).enumerate() {
            let dist = (lat - station.lat).powi(2) + (lon - station.lon).powi(2);
            match best {
                None => best = Some((idx, dist)),
                // Strict < keeps the earliest cell on exact ties
                Some((_, d)) if dist < d => best = Some((idx, dist)),
                _ => {}
            }
        }

        let value = match best {
            Some((idx, _)) => values[idx],
            None => {
                warn!(station = %station.id, "Empty curvilinear grid, substituting zero");
                0.0
            }
        };
        out.insert(station.id.clone(), value);
    }
    out
}

/// Index of the axis value closest to `target`; first minimum wins.
fn nearest_index(axis: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &v) in axis.iter().enumerate() {
        let dist = (v - target).abs();
        match best {
            None => best = Some((idx, dist)),
            Some((_, d)) if dist < d => best = Some((idx, dist)),
            _ => {}
        }
    }
    best.map(|(idx, _)| idx)
}

/// Wrap a 0-360 longitude into the signed ±180 convention.
fn to_signed_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: &str, lat: f64, lon: f64) -> Station {
        Station {
            id: id.into(),
            name: id.into(),
            lat,
            lon,
            market_ticker: None,
            obs_station_id: None,
        }
    }

    fn rectilinear(lats: Vec<f64>, lons: Vec<f64>, values: Vec<f64>) -> Dataset {
        let mut ds = Dataset::default();
        ds.coords.insert("latitude".into(), CoordArray::OneD(lats));
        ds.coords.insert("longitude".into(), CoordArray::OneD(lons));
        ds.vars.insert("apcp".into(), values);
        ds
    }

    #[test]
    fn test_rectilinear_same_cell_under_both_lon_conventions() {
        let lats = vec![30.0, 32.0, 34.0, 36.0];
        let values: Vec<f64> = (0..16).map(|v| v as f64).collect();
        let stations = [station("KLOX", 34.2, -119.0)];

        // 0-360 grid: -119 wraps to 241, nearest line is 240 (index 1)
        let ds = rectilinear(lats.clone(), vec![236.0, 240.0, 244.0, 248.0], values.clone());
        let unsigned = extract_values(&ds, "apcp", &stations);

        // Signed grid covering the same lines
        let ds = rectilinear(lats, vec![-124.0, -120.0, -116.0, -112.0], values);
        let signed = extract_values(&ds, "apcp", &stations);

        assert_eq!(unsigned["KLOX"], 2.0 * 4.0 + 1.0);
        assert_eq!(unsigned["KLOX"], signed["KLOX"]);
    }

    #[test]
    fn test_rectilinear_signed_grid_uses_signed_lon_directly() {
        let ds = rectilinear(
            vec![40.0, 41.0],
            vec![-74.0, -73.0],
            vec![1.0, 2.0, 3.0, 4.0],
        );
        let stations = [station("KNYC", 40.9, -73.9)];
        let out = extract_values(&ds, "apcp", &stations);
        assert_eq!(out["KNYC"], 3.0);
    }

    #[test]
    fn test_curvilinear_normalizes_grid_into_signed() {
        let mut ds = Dataset::default();
        ds.coords.insert(
            "latitude".into(),
            CoordArray::TwoD {
                values: vec![34.0, 34.0],
                shape: (1, 2),
            },
        );
        ds.coords.insert(
            "longitude".into(),
            CoordArray::TwoD {
                values: vec![240.0, 241.0],
                shape: (1, 2),
            },
        );
        ds.vars.insert("apcp".into(), vec![5.0, 7.0]);

        // -119.5 sits nearer the wrapped -119 (cell 1) than -120 (cell 0)
        let out = extract_values(&ds, "apcp", &[station("KLOX", 34.0, -119.5)]);
        assert_eq!(out["KLOX"], 7.0);
    }

    #[test]
    fn test_curvilinear_tie_breaks_to_first_in_scan_order() {
        let mut ds = Dataset::default();
        ds.coords.insert(
            "lat".into(),
            CoordArray::TwoD {
                values: vec![34.0, 34.0],
                shape: (2, 1),
            },
        );
        ds.coords.insert(
            "lon".into(),
            CoordArray::TwoD {
                values: vec![-119.0, -119.0],
                shape: (2, 1),
            },
        );
        ds.vars.insert("apcp".into(), vec![1.0, 9.0]);

        let out = extract_values(&ds, "apcp", &[station("KLOX", 34.0, -119.0)]);
        assert_eq!(out["KLOX"], 1.0);
    }

    #[test]
    fn test_missing_coordinates_degrades_to_zeros() {
        let mut ds = Dataset::default();
        ds.vars.insert("apcp".into(), vec![1.0, 2.0]);

        let stations = [station("KNYC", 40.8, -74.0), station("KMIA", 25.8, -80.3)];
        let out = extract_values(&ds, "apcp", &stations);
        assert_eq!(out.len(), 2);
        assert!(out.values().all(|&v| v == 0.0));
    }

    #[test]
    fn test_missing_variable_degrades_to_zeros() {
        let ds = rectilinear(vec![40.0], vec![-74.0], vec![1.0]);
        let out = extract_values(&ds, "tp", &[station("KNYC", 40.8, -74.0)]);
        assert_eq!(out["KNYC"], 0.0);
    }

    #[test]
    fn test_value_shape_mismatch_degrades_to_zeros() {
        // 2x2 axes but only 3 values
        let ds = rectilinear(vec![40.0, 41.0], vec![-74.0, -73.0], vec![1.0, 2.0, 3.0]);
        let out = extract_values(&ds, "apcp", &[station("KNYC", 40.8, -74.0)]);
        assert_eq!(out["KNYC"], 0.0);
    }
}
