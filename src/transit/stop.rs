//! Stop records as returned upstream and as handed to the display.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::agency::TransitAgency;

/// A scalar that 511.org sends either quoted or bare, depending on the feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Number(n) => write!(f, "{n}"),
        }
    }
}

impl Scalar {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Number(n) => n.as_u64(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Number(n) => n.as_f64(),
        }
    }
}

/// One element of `Contents.dataObjects.ScheduledStopPoint`, kept as raw
/// JSON.
///
/// Only the parent station is read up front. The remaining fields are decoded
/// by [`StopPoint::fields`] once a record is known to be wanted, so a broken
/// record for an unrequested station never fails the whole response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct StopPoint(pub serde_json::Value);

impl StopPoint {
    /// The parent station key, if the record carries a non-empty one.
    pub fn parent_station(&self) -> Option<&str> {
        self.0
            .pointer("/Extensions/ParentStations")
            .and_then(serde_json::Value::as_str)
            .filter(|ps| !ps.is_empty())
    }

    /// Decodes the fields needed to build a [`Stop`].
    pub fn fields(&self) -> Result<StopPointFields, serde_json::Error> {
        StopPointFields::deserialize(&self.0)
    }
}

/// The strictly typed part of a [`StopPoint`].
#[derive(Debug, Clone, Deserialize)]
pub struct StopPointFields {
    pub id: Scalar,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Location")]
    pub location: StopLocation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopLocation {
    #[serde(rename = "Latitude")]
    pub latitude: Scalar,
    #[serde(rename = "Longitude")]
    pub longitude: Scalar,
}

/// A normalized stop belonging to a requested parent station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub agency: TransitAgency,
    pub id: u64,
    pub name: String,
    pub parent_station: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Stops keyed by parent station, in the order the stations were requested.
///
/// Every requested station has an entry, even when upstream returned nothing
/// for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopGroups {
    entries: Vec<(String, Vec<Stop>)>,
}

impl StopGroups {
    /// Creates an empty group for each station, collapsing repeated names.
    pub fn with_stations<S: AsRef<str>>(stations: &[S]) -> Self {
        let mut groups = Self::default();
        for station in stations {
            let station = station.as_ref();
            if groups.get(station).is_none() {
                groups.entries.push((station.to_string(), Vec::new()));
            }
        }
        groups
    }

    pub fn get(&self, station: &str) -> Option<&[Stop]> {
        self.entries
            .iter()
            .find(|(k, _)| k == station)
            .map(|(_, stops)| stops.as_slice())
    }

    pub(crate) fn get_mut(&mut self, station: &str) -> Option<&mut Vec<Stop>> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == station)
            .map(|(_, stops)| stops)
    }

    pub fn contains(&self, station: &str) -> bool {
        self.get(station).is_some()
    }

    pub fn stations(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Stop])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of stops across all stations.
    pub fn stop_count(&self) -> usize {
        self.entries.iter().map(|(_, v)| v.len()).sum()
    }
}

// Serialized as a JSON object so key order matches the request.
impl Serialize for StopGroups {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (station, stops) in &self.entries {
            map.serialize_entry(station, stops)?;
        }
        map.end()
    }
}
