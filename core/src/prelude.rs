use crate::map::feature::{Feature, FeatureId};
use crate::map::geometry::Coordinate;
use crate::model::{DeviceId, PositionRecord};
use std::future::Future;
use std::time::Duration;

/// Failure of a single batch request. Recovered by the live loop.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Common error type for map operations.
#[derive(thiserror::Error, Debug)]
pub enum MapError {
    #[error("unknown device {0}")]
    UnknownDevice(DeviceId),
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
}

pub type MapResult<T> = Result<T, MapError>;

/// Drawing surface holding the overlays placed on the map.
///
/// Features are addressed by their [`FeatureId`]; adding an id that is
/// already present replaces it in place.
pub trait MapSurface {
    fn add_feature(&mut self, feature: &Feature);
    fn update_feature(&mut self, feature: &Feature);
    fn remove_feature(&mut self, id: FeatureId);
    fn pan_to(&mut self, center: Coordinate, duration: Duration);
}

/// Converts geographic longitude/latitude into surface coordinates.
pub trait Projection {
    fn project(&self, longitude: f64, latitude: f64) -> Coordinate;
}

/// Request/response primitive used by the live update loop.
///
/// `first` is set on the first request of a session only.
pub trait PositionTransport {
    fn fetch_updates(
        &self,
        first: bool,
    ) -> impl Future<Output = Result<Vec<PositionRecord>, TransportError>> + Send;
}
