//! Fixed observing stations that monthly totals are projected for.

use serde::{Deserialize, Serialize};

/// A fixed geographic station (decimal degrees, WGS84).
///
/// Stations come from `config/stations.yaml` and never change during a
/// process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    /// Location identifier used as the storage key (e.g. "KNYC")
    pub id: String,
    /// Human-readable name for logs and downstream display
    pub name: String,
    pub lat: f64,
    /// Signed longitude; grids using a 0-360 convention are handled at
    /// extraction time, never here
    pub lon: f64,
    /// Market ticker tied to this station's monthly total, if any
    #[serde(default)]
    pub market_ticker: Option<String>,
    /// Identifier of the observing station in the upstream bulletin feed
    #[serde(default)]
    pub obs_station_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_station_yaml() {
        let yaml = r#"
id: KLOX
name: "Los Angeles (KLOX), CA"
lat: 34.2008
lon: -119.2006
market_ticker: KXRAINLAXM
"#;
        let station: Station = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(station.id, "KLOX");
        assert!((station.lon + 119.2006).abs() < 1e-9);
        assert_eq!(station.market_ticker.as_deref(), Some("KXRAINLAXM"));
        assert!(station.obs_station_id.is_none());
    }
}
