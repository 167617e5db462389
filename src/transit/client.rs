use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::StopSource;
use super::aggregate::group_by_parent_station;
use super::agency::TransitAgency;
use super::error::TransitError;
use super::stop::{StopGroups, StopPoint};
use crate::fetch::{self, HttpClient, auth::UrlParam};

pub const TRANSIT_API_HOST: &str = "http://api.511.org";

const STOP_POINTS_PATH: [&str; 3] = ["Contents", "dataObjects", "ScheduledStopPoint"];

/// Client for the 511.org bay area transit API.
///
/// The API key is attached to every request as the `api_key` query parameter
/// by a [`UrlParam`] wrapper around the injected transport.
pub struct BayAreaTransitClient<C> {
    http: UrlParam<C>,
    host: String,
}

impl<C: HttpClient> BayAreaTransitClient<C> {
    pub fn new(api_key: impl Into<String>, http: C) -> Self {
        Self::with_host(api_key, http, TRANSIT_API_HOST)
    }

    /// Points the client at a different API host (no trailing slash).
    pub fn with_host(api_key: impl Into<String>, http: C, host: impl Into<String>) -> Self {
        Self {
            http: UrlParam::new(http, "api_key", api_key),
            host: host.into(),
        }
    }

    /// Fetches every stop the agency publishes.
    ///
    /// The upstream API cannot filter by station, so this is the only way to
    /// look stops up.
    pub async fn get_stops_for_agency(
        &self,
        agency: TransitAgency,
    ) -> Result<Vec<StopPoint>, TransitError> {
        let (_, points) = self.fetch_stop_points(agency).await?;
        Ok(points)
    }

    /// Fetches the agency's stops once and groups them by `parent_stations`.
    pub async fn get_stops_for_parent_stations<S: AsRef<str> + Sync>(
        &self,
        agency: TransitAgency,
        parent_stations: &[S],
    ) -> Result<StopGroups, TransitError> {
        let (url, points) = self.fetch_stop_points(agency).await?;

        group_by_parent_station(agency, &points, parent_stations).map_err(|field| {
            debug!(path = %field.path, value = %field.value, "Matching stop failed to decode");
            TransitError::MalformedResponse {
                url: url.into(),
                missing_path: field.path,
            }
        })
    }

    /// Queries real-time arrivals and departures.
    ///
    /// Only the status code is checked; the StopMonitoring body is not
    /// decoded yet.
    #[instrument(skip_all, fields(agency = %agency, ?stopcode))]
    pub async fn get_real_time_arrival_departures(
        &self,
        agency: TransitAgency,
        stopcode: Option<&str>,
    ) -> Result<(), TransitError> {
        let mut params = vec![("agency", agency.code()), ("format", "JSON")];
        if let Some(code) = stopcode {
            params.push(("stopcode", code));
        }
        let url = self.build_url("transit/StopMonitoring", &params)?;
        self.make_request(url).await?;
        Ok(())
    }

    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, TransitError> {
        let raw = format!("{}/{}", self.host, path);
        Url::parse_with_params(&raw, params).map_err(|e| TransitError::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })
    }

    /// Requests the agency's stop list, returning the key-free request URL
    /// alongside the raw records.
    #[instrument(skip_all, fields(agency = %agency))]
    async fn fetch_stop_points(
        &self,
        agency: TransitAgency,
    ) -> Result<(Url, Vec<StopPoint>), TransitError> {
        let url = self.build_url("transit/stops", &[("agency", agency.code()), ("format", "JSON")])?;
        let body = self.request_json(url.clone()).await?;

        let points = decode_stop_points(url.as_str(), body)?;
        debug!(count = points.len(), "Stops decoded");
        Ok((url, points))
    }

    async fn make_request(&self, url: Url) -> Result<reqwest::Response, TransitError> {
        let resp = fetch::get(&self.http, url.clone()).await?;

        if resp.status() != StatusCode::OK {
            warn!(url = %url, status = resp.status().as_u16(), "Non-ok status from transit API");
            return Err(TransitError::UpstreamRequest {
                url: url.into(),
                status: resp.status().as_u16(),
            });
        }

        Ok(resp)
    }

    async fn request_json(&self, url: Url) -> Result<Value, TransitError> {
        let resp = self.make_request(url.clone()).await?;
        let text = resp.text().await?;

        // 511.org prefixes its JSON with a byte-order mark.
        let text = text.trim_start_matches('\u{feff}');
        serde_json::from_str(text).map_err(|e| {
            debug!(error = %e, "Response body is not JSON");
            TransitError::MalformedResponse {
                url: url.into(),
                missing_path: "$".to_string(),
            }
        })
    }
}

#[async_trait]
impl<C: HttpClient> StopSource for BayAreaTransitClient<C> {
    async fn stops_for_parent_stations(
        &self,
        agency: TransitAgency,
        parent_stations: &[String],
    ) -> Result<StopGroups, TransitError> {
        self.get_stops_for_parent_stations(agency, parent_stations).await
    }
}

/// Pulls `Contents.dataObjects.ScheduledStopPoint` out of a stops response.
fn decode_stop_points(url: &str, body: Value) -> Result<Vec<StopPoint>, TransitError> {
    let malformed = |path: String| TransitError::MalformedResponse {
        url: url.to_string(),
        missing_path: path,
    };

    let mut node = body;
    for (depth, key) in STOP_POINTS_PATH.iter().enumerate() {
        node = match node {
            Value::Object(mut map) => map
                .remove(*key)
                .ok_or_else(|| malformed(STOP_POINTS_PATH[..=depth].join(".")))?,
            _ => return Err(malformed(STOP_POINTS_PATH[..=depth].join("."))),
        };
    }

    let items = match node {
        Value::Array(items) => items,
        // A lone stop comes back as an object rather than a one-element array.
        obj @ Value::Object(_) => vec![obj],
        _ => return Err(malformed(STOP_POINTS_PATH.join("."))),
    };

    // Individual records are only decoded once they are known to be wanted.
    Ok(items.into_iter().map(StopPoint).collect())
}
