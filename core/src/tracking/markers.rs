use super::MapContext;
use crate::map::{Feature, FeatureId, Geometry, VisualClass};
use crate::model::{DeviceId, PositionRecord};
use crate::prelude::{MapError, MapResult, MapSurface, Projection};
use crate::store::DeviceStore;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSync {
    Created(FeatureId),
    Updated(FeatureId),
}

#[derive(Debug)]
struct LiveMarker {
    feature: Feature,
    label: String,
}

/// One marker per device seen this session. Entries are never removed.
#[derive(Debug, Default)]
pub struct LiveMarkers {
    index: HashMap<DeviceId, LiveMarker>,
}

impl LiveMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the device's marker to `record`, creating it on first sighting.
    ///
    /// Existing markers always get fresh geometry and live style, with the
    /// original style recomputed alongside. Creation fails with
    /// [`MapError::UnknownDevice`] when the device directory has no entry.
    pub fn sync<S: MapSurface, P: Projection>(
        &mut self,
        record: &PositionRecord,
        devices: &DeviceStore,
        ctx: &mut MapContext<S, P>,
    ) -> MapResult<MarkerSync> {
        let geometry = Geometry::Point(ctx.project(record));

        if let Some(marker) = self.index.get_mut(&record.device_id) {
            let style = ctx
                .styles
                .marker(VisualClass::Live, record.course, Some(&marker.label));
            marker.feature.geometry = geometry;
            marker.feature.original_style = style.clone();
            marker.feature.style = style;
            ctx.surface.update_feature(&marker.feature);
            return Ok(MarkerSync::Updated(marker.feature.id));
        }

        let device = devices
            .find(record.device_id)
            .ok_or(MapError::UnknownDevice(record.device_id))?;
        let style = ctx
            .styles
            .marker(VisualClass::Live, record.course, Some(&device.name));
        let feature = Feature::new(ctx.ids.allocate(), geometry, style);
        ctx.surface.add_feature(&feature);

        let id = feature.id;
        self.index.insert(
            record.device_id,
            LiveMarker {
                feature,
                label: device.name.clone(),
            },
        );
        Ok(MarkerSync::Created(id))
    }

    pub fn get(&self, device_id: DeviceId) -> Option<&Feature> {
        self.index.get(&device_id).map(|marker| &marker.feature)
    }

    pub fn get_mut(&mut self, device_id: DeviceId) -> Option<&mut Feature> {
        self.index.get_mut(&device_id).map(|marker| &mut marker.feature)
    }

    pub fn contains(&self, device_id: DeviceId) -> bool {
        self.index.contains_key(&device_id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Coordinate, FeatureStyle, StyleConfig, VectorLayer, WebMercator};
    use crate::model::DeviceRecord;
    use chrono::{TimeZone, Utc};

    fn context() -> MapContext<VectorLayer, WebMercator> {
        MapContext::new(VectorLayer::default(), WebMercator, StyleConfig::default())
    }

    fn devices() -> DeviceStore {
        [DeviceRecord::new(1, "Truck 1")].into_iter().collect()
    }

    fn record(device_id: DeviceId, longitude: f64, course: f64) -> PositionRecord {
        PositionRecord::new(
            0,
            device_id,
            Utc.timestamp_opt(1_000, 0).unwrap(),
            longitude,
            20.0,
            course,
        )
    }

    #[test]
    fn first_sighting_creates_one_marker() {
        let mut ctx = context();
        let mut markers = LiveMarkers::new();

        let sync = markers.sync(&record(1, 10.0, 90.0), &devices(), &mut ctx).unwrap();
        assert!(matches!(sync, MarkerSync::Created(_)));
        assert_eq!(markers.len(), 1);
        assert_eq!(ctx.surface.len(), 1);

        let feature = markers.get(1).unwrap();
        let style = feature.style.as_marker().unwrap();
        assert!((style.rotation - 90f64.to_radians()).abs() < 1e-12);
        assert_eq!(style.label_text(), Some("Truck 1"));
        assert_eq!(feature.style, feature.original_style);
    }

    #[test]
    fn later_sightings_update_in_place() {
        let mut ctx = context();
        let mut markers = LiveMarkers::new();
        let devices = devices();

        let created = markers.sync(&record(1, 10.0, 90.0), &devices, &mut ctx).unwrap();
        let updated = markers.sync(&record(1, 11.0, 180.0), &devices, &mut ctx).unwrap();

        let (MarkerSync::Created(a), MarkerSync::Updated(b)) = (created, updated) else {
            panic!("unexpected sync results {created:?} {updated:?}");
        };
        assert_eq!(a, b);
        assert_eq!(markers.len(), 1);
        assert_eq!(ctx.surface.len(), 1);

        let drawn = ctx.surface.get(a).unwrap();
        let expected = ctx.projection.project(11.0, 20.0);
        assert_eq!(drawn.geometry, Geometry::Point(expected));
        assert_eq!(drawn.label_text(), Some("Truck 1"));
    }

    #[test]
    fn original_style_follows_latest_course() {
        let mut ctx = context();
        let mut markers = LiveMarkers::new();
        let devices = devices();
        markers.sync(&record(1, 10.0, 90.0), &devices, &mut ctx).unwrap();
        markers.sync(&record(1, 10.0, 270.0), &devices, &mut ctx).unwrap();

        let feature = markers.get(1).unwrap();
        let FeatureStyle::Marker(original) = &feature.original_style else {
            panic!("live marker without marker style");
        };
        assert!((original.rotation - 270f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn unknown_device_fails_without_drawing() {
        let mut ctx = context();
        let mut markers = LiveMarkers::new();

        let err = markers
            .sync(&record(42, 0.0, 0.0), &devices(), &mut ctx)
            .unwrap_err();
        assert!(matches!(err, MapError::UnknownDevice(42)));
        assert!(markers.is_empty());
        assert!(ctx.surface.is_empty());
        assert_eq!(ctx.surface.center(), Coordinate::default());
    }
}
