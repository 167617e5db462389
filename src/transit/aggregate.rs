//! Grouping of the flat upstream stop list by parent station.

use tracing::trace;

use super::agency::TransitAgency;
use super::stop::{Scalar, Stop, StopGroups, StopPoint};

/// A field of a matching record that could not be coerced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot read `{path}` from value {value:?}")]
pub struct MalformedField {
    pub path: String,
    pub value: String,
}

/// Groups `records` under the requested `parent_stations`.
///
/// Records without a parent station, or whose station was not requested, are
/// dropped. Matching records keep upstream order within their group. Every
/// requested station is present in the result.
pub fn group_by_parent_station<S: AsRef<str>>(
    agency: TransitAgency,
    records: &[StopPoint],
    parent_stations: &[S],
) -> Result<StopGroups, MalformedField> {
    let mut groups = StopGroups::with_stations(parent_stations);

    for (index, record) in records.iter().enumerate() {
        let Some(station) = record.parent_station() else {
            continue;
        };
        let Some(stops) = groups.get_mut(station) else {
            continue;
        };

        let fields = record.fields().map_err(|e| MalformedField {
            path: format!("ScheduledStopPoint[{index}]"),
            value: e.to_string(),
        })?;

        let stop = Stop {
            agency,
            id: coerce(&fields.id, Scalar::as_u64, index, "id")?,
            name: fields.name,
            parent_station: station.to_string(),
            latitude: coerce(&fields.location.latitude, Scalar::as_f64, index, "Location.Latitude")?,
            longitude: coerce(&fields.location.longitude, Scalar::as_f64, index, "Location.Longitude")?,
        };
        trace!(station, stop_id = stop.id, "Matched stop");
        stops.push(stop);
    }

    Ok(groups)
}

fn coerce<T>(
    value: &Scalar,
    read: impl Fn(&Scalar) -> Option<T>,
    index: usize,
    field: &str,
) -> Result<T, MalformedField> {
    read(value).ok_or_else(|| MalformedField {
        path: format!("ScheduledStopPoint[{index}].{field}"),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, station: Option<&str>, lat: &str, lon: &str) -> StopPoint {
        let extensions = match station {
            Some(s) => serde_json::json!({ "ParentStations": s }),
            None => serde_json::json!({}),
        };
        serde_json::from_value(serde_json::json!({
            "id": id,
            "Name": format!("Stop {id}"),
            "Extensions": extensions,
            "Location": { "Latitude": lat, "Longitude": lon },
        }))
        .unwrap()
    }

    fn sample() -> Vec<StopPoint> {
        vec![
            record("70162", Some("menlo_park"), "37.454745", "-122.182405"),
            record("70011", Some("san_francisco"), "37.776390", "-122.394992"),
            record("99999", None, "37.0", "-122.0"),
            record("70161", Some("menlo_park"), "37.454856", "-122.182297"),
        ]
    }

    #[test]
    fn test_keys_match_requested_stations() {
        let groups = group_by_parent_station(
            TransitAgency::Caltrain,
            &sample(),
            &["menlo_park", "palo_alto"],
        )
        .unwrap();

        assert_eq!(
            groups.stations().collect::<Vec<_>>(),
            vec!["menlo_park", "palo_alto"]
        );
        assert_eq!(groups.get("palo_alto"), Some(&[][..]));
        assert!(!groups.contains("san_francisco"));
    }

    #[test]
    fn test_keys_present_with_no_records() {
        let groups =
            group_by_parent_station(TransitAgency::Caltrain, &[], &["menlo_park"]).unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups.get("menlo_park").unwrap().is_empty());
    }

    #[test]
    fn test_filters_unrequested_and_ungrouped_stops() {
        let groups =
            group_by_parent_station(TransitAgency::Caltrain, &sample(), &["menlo_park"]).unwrap();

        let ids: Vec<u64> = groups.iter().flat_map(|(_, s)| s.iter().map(|s| s.id)).collect();
        assert_eq!(ids, vec![70162, 70161]);
    }

    #[test]
    fn test_coerces_coordinates_exactly() {
        let groups =
            group_by_parent_station(TransitAgency::Caltrain, &sample(), &["menlo_park"]).unwrap();

        let mut stops = groups.get("menlo_park").unwrap().to_vec();
        stops.sort_by_key(|s| s.id);
        assert_eq!(
            stops[0],
            Stop {
                agency: TransitAgency::Caltrain,
                id: 70161,
                name: "Stop 70161".to_string(),
                parent_station: "menlo_park".to_string(),
                latitude: 37.454856,
                longitude: -122.182297,
            }
        );
        assert_eq!(stops[1].latitude, 37.454745);
    }

    #[test]
    fn test_bad_coordinate_on_matching_record() {
        let records = vec![record("1", Some("a"), "north", "0")];
        let err = group_by_parent_station(TransitAgency::Caltrain, &records, &["a"]).unwrap_err();
        assert_eq!(err.path, "ScheduledStopPoint[0].Location.Latitude");
        assert_eq!(err.value, "north");
    }

    #[test]
    fn test_bad_record_ignored_when_not_requested() {
        let records = vec![record("abc", Some("b"), "x", "y")];
        let groups = group_by_parent_station(TransitAgency::Caltrain, &records, &["a"]).unwrap();
        assert_eq!(groups.stop_count(), 0);
    }

    #[test]
    fn test_incomplete_record_ignored_when_not_requested() {
        let records: Vec<StopPoint> = serde_json::from_value(serde_json::json!([
            { "id": "70161", "Name": "Menlo Park Northbound",
              "Extensions": { "ParentStations": "menlo_park" },
              "Location": { "Latitude": "37.454856", "Longitude": "-122.182297" } },
            { "id": "999", "Name": null, "Extensions": { "ParentStations": "other" } },
            null,
        ]))
        .unwrap();

        let groups =
            group_by_parent_station(TransitAgency::Caltrain, &records, &["menlo_park"]).unwrap();
        let ids: Vec<u64> = groups.get("menlo_park").unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![70161]);
    }

    #[test]
    fn test_incomplete_record_rejected_when_requested() {
        let records: Vec<StopPoint> = serde_json::from_value(serde_json::json!([
            { "id": "999", "Name": "No location", "Extensions": { "ParentStations": "a" } },
        ]))
        .unwrap();

        let err = group_by_parent_station(TransitAgency::Caltrain, &records, &["a"]).unwrap_err();
        assert_eq!(err.path, "ScheduledStopPoint[0]");
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let records = sample();
        let first =
            group_by_parent_station(TransitAgency::Caltrain, &records, &["menlo_park"]).unwrap();
        let second =
            group_by_parent_station(TransitAgency::Caltrain, &records, &["menlo_park"]).unwrap();
        assert_eq!(first, second);
    }
}
