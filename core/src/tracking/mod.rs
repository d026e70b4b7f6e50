//! Marker, report and selection management driven by the live feed.

pub mod controller;
pub mod live;
pub mod markers;
pub mod report;
pub mod selection;

pub use controller::{BatchSummary, MapController, MapEvent};
pub use live::{LiveStop, LiveUpdates, PollOutcome};
pub use markers::{LiveMarkers, MarkerSync};
pub use report::ReportOverlay;
pub use selection::{OverlayKey, Selection, SelectionState};

use crate::map::{Coordinate, FeatureIds, StyleConfig};
use crate::model::PositionRecord;
use crate::prelude::Projection;

/// Everything an overlay manager needs to draw: the surface, the projection,
/// the style presets and the feature id allocator.
#[derive(Debug)]
pub struct MapContext<S, P> {
    pub surface: S,
    pub projection: P,
    pub styles: StyleConfig,
    pub ids: FeatureIds,
}

impl<S, P: Projection> MapContext<S, P> {
    pub fn new(surface: S, projection: P, styles: StyleConfig) -> Self {
        Self {
            surface,
            projection,
            styles,
            ids: FeatureIds::default(),
        }
    }

    pub fn project(&self, record: &PositionRecord) -> Coordinate {
        self.projection.project(record.longitude, record.latitude)
    }
}
