//! GRIB2 decoding into loosely-typed datasets.
//!
//! Each fetched artifact is scanned for precipitation submessages only;
//! everything else in the file is skipped without unpacking. Regular
//! lat/lon grids come out as 1-D axes, projected grids as full 2-D
//! coordinate fields, so the extractor can apply the right
//! nearest-neighbor rule.

use std::io::Cursor;

use accumulation::{CoordArray, Dataset, SourceError};
use bytes::Bytes;
use tracing::{debug, warn};

/// GRIB2 grid definition template 0: regular latitude/longitude grid.
const TMPL_REGULAR_LATLON: u64 = 0;

/// Decode all precipitation fields in a GRIB2 file.
pub fn decode_datasets(data: Bytes) -> Result<Vec<Dataset>, SourceError> {
    let grib2 = grib::from_reader(Cursor::new(data))
        .map_err(|e| SourceError::Decode(format!("GRIB2 parse failed: {e:?}")))?;

    let mut datasets = Vec::new();

    for (_index, submsg) in grib2.iter() {
        let discipline = submsg.indicator().discipline;
        let prod_def = submsg.prod_def();
        let variable = match precip_variable(
            discipline,
            prod_def.parameter_category(),
            prod_def.parameter_number(),
        ) {
            Some(v) => v,
            None => continue,
        };

        let grid_tmpl = submsg.grid_def().grid_tmpl_num() as u64;

        let latlons: Vec<(f32, f32)> = match submsg.latlons() {
            Ok(iter) => iter.collect(),
            Err(e) => {
                warn!(variable, error = ?e, "Failed to compute grid coordinates, skipping submessage");
                continue;
            }
        };

        let decoder = match grib::Grib2SubmessageDecoder::from(submsg) {
            Ok(d) => d,
            Err(e) => {
                warn!(variable, error = ?e, "Failed to create submessage decoder, skipping");
                continue;
            }
        };
        let values: Vec<f64> = match decoder.dispatch() {
            Ok(iter) => iter.map(|v| v as f64).collect(),
            Err(e) => {
                warn!(variable, error = ?e, "Failed to unpack grid values, skipping");
                continue;
            }
        };

        if values.len() != latlons.len() {
            warn!(
                variable,
                values = values.len(),
                points = latlons.len(),
                "Value count does not match grid points, skipping"
            );
            continue;
        }

        let mut ds = Dataset::default();
        match rectilinear_axes(&latlons) {
            Some((lats, lons)) if grid_tmpl == TMPL_REGULAR_LATLON => {
                ds.coords.insert("latitude".into(), CoordArray::OneD(lats));
                ds.coords.insert("longitude".into(), CoordArray::OneD(lons));
            }
            _ => {
                let shape = grid_shape(&latlons);
                ds.coords.insert(
                    "latitude".into(),
                    CoordArray::TwoD {
                        values: latlons.iter().map(|&(lat, _)| lat as f64).collect(),
                        shape,
                    },
                );
                ds.coords.insert(
                    "longitude".into(),
                    CoordArray::TwoD {
                        values: latlons.iter().map(|&(_, lon)| lon as f64).collect(),
                        shape,
                    },
                );
            }
        }
        ds.vars.insert(variable.to_string(), values);

        debug!(variable, points = latlons.len(), "Decoded precipitation field");
        datasets.push(ds);
    }

    Ok(datasets)
}

/// Map a GRIB2 parameter triple onto a precipitation variable name, or
/// `None` for everything that isn't precipitation.
fn precip_variable(
    discipline: u8,
    category: Option<u8>,
    number: Option<u8>,
) -> Option<&'static str> {
    // Discipline 0 = meteorological, category 1 = moisture
    match (discipline, category?, number?) {
        (0, 1, 8) => Some("apcp"),
        // Total-precipitation entries used by non-NCEP centres
        (0, 1, 52) | (0, 1, 193) => Some("tp"),
        _ => None,
    }
}

/// Recover 1-D axes from a row-major point list, if the grid is separable.
fn rectilinear_axes(latlons: &[(f32, f32)]) -> Option<(Vec<f64>, Vec<f64>)> {
    if latlons.is_empty() {
        return None;
    }

    let first_lat = latlons[0].0;
    let cols = latlons
        .iter()
        .take_while(|(lat, _)| (lat - first_lat).abs() < 1e-6)
        .count();
    if cols == 0 || latlons.len() % cols != 0 {
        return None;
    }
    let rows = latlons.len() / cols;

    let lons: Vec<f64> = latlons[..cols].iter().map(|&(_, lon)| lon as f64).collect();
    let lats: Vec<f64> = (0..rows).map(|r| latlons[r * cols].0 as f64).collect();

    // Every row must repeat the same longitudes at a constant latitude
    for r in 0..rows {
        for c in 0..cols {
            let (lat, lon) = latlons[r * cols + c];
            if (lat as f64 - lats[r]).abs() > 1e-6 || (lon as f64 - lons[c]).abs() > 1e-6 {
                return None;
            }
        }
    }

    Some((lats, lons))
}

/// Best-effort (rows, cols) for a point list that is not separable.
fn grid_shape(latlons: &[(f32, f32)]) -> (usize, usize) {
    if latlons.is_empty() {
        return (0, 0);
    }
    let first_lat = latlons[0].0;
    let cols = latlons
        .iter()
        .take_while(|(lat, _)| (lat - first_lat).abs() < 1e-6)
        .count();
    if cols > 0 && latlons.len() % cols == 0 {
        (latlons.len() / cols, cols)
    } else {
        (1, latlons.len())
    }
}
