//! 511.org transit API access and stop grouping.
//!
//! [`BayAreaTransitClient`] issues the HTTP requests and decodes the response
//! envelopes; [`aggregate::group_by_parent_station`] narrows the agency-wide
//! stop list down to the requested parent stations. [`StopSource`] is the
//! seam the refresh loop consumes.

pub mod agency;
pub mod aggregate;
pub mod client;
pub mod error;
pub mod stop;

pub use agency::TransitAgency;
pub use client::BayAreaTransitClient;
pub use error::TransitError;
pub use stop::{Stop, StopGroups, StopPoint};

/// Anything that can produce stops grouped by parent station.
#[async_trait::async_trait]
pub trait StopSource: Send + Sync {
    async fn stops_for_parent_stations(
        &self,
        agency: TransitAgency,
        parent_stations: &[String],
    ) -> Result<StopGroups, TransitError>;
}

#[async_trait::async_trait]
impl<T: StopSource + ?Sized> StopSource for std::sync::Arc<T> {
    async fn stops_for_parent_stations(
        &self,
        agency: TransitAgency,
        parent_stations: &[String],
    ) -> Result<StopGroups, TransitError> {
        (**self).stops_for_parent_stations(agency, parent_stations).await
    }
}
