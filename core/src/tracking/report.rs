use super::MapContext;
use crate::map::{Feature, Geometry, VisualClass};
use crate::model::{PositionId, PositionRecord};
use crate::prelude::{MapSurface, Projection};
use crate::telemetry::LogManager;
use std::collections::HashMap;

/// Route line plus per-point markers of the historical report on screen.
///
/// The line and the points are always created and removed together.
#[derive(Debug)]
pub struct ReportOverlay {
    route: Option<Feature>,
    points: HashMap<PositionId, Feature>,
    order: Vec<PositionId>,
    logger: LogManager,
}

impl Default for ReportOverlay {
    fn default() -> Self {
        Self {
            route: None,
            points: HashMap::new(),
            order: Vec::new(),
            logger: LogManager::new("report"),
        }
    }
}

impl ReportOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever report is shown with `records`.
    ///
    /// The route follows the slice order as given. Points are keyed by
    /// record id; a repeated id keeps only its last marker.
    pub fn show<S: MapSurface, P: Projection>(
        &mut self,
        records: &[PositionRecord],
        ctx: &mut MapContext<S, P>,
    ) {
        self.clear(ctx);

        let mut path = Vec::with_capacity(records.len());
        for record in records {
            let point = ctx.project(record);
            path.push(point);

            let style = ctx.styles.marker(VisualClass::Report, record.course, None);
            let feature = Feature::new(ctx.ids.allocate(), Geometry::Point(point), style);
            if self.points.insert(record.id, feature).is_none() {
                self.order.push(record.id);
            }
        }

        let route = Feature::new(
            ctx.ids.allocate(),
            Geometry::LineString(path),
            ctx.styles.route(),
        );
        ctx.surface.add_feature(&route);
        self.route = Some(route);

        for id in &self.order {
            if let Some(point) = self.points.get(id) {
                ctx.surface.add_feature(point);
            }
        }

        self.logger.record(&format!(
            "showing route with {} points",
            self.order.len()
        ));
    }

    /// Removes the route and its points. Does nothing when no report is shown.
    pub fn clear<S: MapSurface, P>(&mut self, ctx: &mut MapContext<S, P>) {
        let mut removed = 0;

        if let Some(route) = self.route.take() {
            ctx.surface.remove_feature(route.id);
            removed += 1;
        }

        for id in self.order.drain(..) {
            if let Some(point) = self.points.remove(&id) {
                ctx.surface.remove_feature(point.id);
                removed += 1;
            }
        }
        self.points.clear();

        if removed > 0 {
            self.logger
                .record(&format!("cleared route, {} overlays removed", removed));
        }
    }

    pub fn is_shown(&self) -> bool {
        self.route.is_some()
    }

    pub fn route(&self) -> Option<&Feature> {
        self.route.as_ref()
    }

    pub fn point(&self, id: PositionId) -> Option<&Feature> {
        self.points.get(&id)
    }

    pub fn point_mut(&mut self, id: PositionId) -> Option<&mut Feature> {
        self.points.get_mut(&id)
    }

    /// Point ids in the order the markers were added.
    pub fn point_ids(&self) -> &[PositionId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Coordinate, StyleConfig, VectorLayer, WebMercator};
    use chrono::{TimeZone, Utc};

    fn context() -> MapContext<VectorLayer, WebMercator> {
        MapContext::new(VectorLayer::default(), WebMercator, StyleConfig::default())
    }

    fn point(id: PositionId, lon_lat: f64, secs: i64) -> PositionRecord {
        PositionRecord::new(id, 1, Utc.timestamp_opt(secs, 0).unwrap(), lon_lat, lon_lat, 0.0)
    }

    #[test]
    fn show_adds_line_then_points() {
        let mut ctx = context();
        let mut report = ReportOverlay::new();
        report.show(&[point(1, 1.0, 10), point(2, 2.0, 20)], &mut ctx);

        assert_eq!(ctx.surface.len(), 3);
        assert_eq!(report.len(), 2);
        assert!(report.point(1).is_some());
        assert!(report.point(2).is_some());

        let drawn: Vec<_> = ctx.surface.features().collect();
        assert!(matches!(drawn[0].geometry, Geometry::LineString(_)));
        assert_eq!(drawn[0].id, report.route().unwrap().id);
        assert!(drawn[1..]
            .iter()
            .all(|feature| matches!(feature.geometry, Geometry::Point(_))));
    }

    #[test]
    fn route_keeps_given_order() {
        let mut ctx = context();
        let mut report = ReportOverlay::new();
        // Deliberately not chronological.
        report.show(&[point(5, 3.0, 30), point(6, 1.0, 10), point(7, 2.0, 20)], &mut ctx);

        let Some(Geometry::LineString(path)) = report.route().map(|f| f.geometry.clone()) else {
            panic!("route missing");
        };
        let expected: Vec<Coordinate> = [3.0, 1.0, 2.0]
            .iter()
            .map(|v| ctx.projection.project(*v, *v))
            .collect();
        assert_eq!(path, expected);
        assert_eq!(report.point_ids(), &[5, 6, 7]);
    }

    #[test]
    fn report_points_use_report_class() {
        let mut ctx = context();
        let mut report = ReportOverlay::new();
        report.show(&[point(1, 1.0, 10)], &mut ctx);

        let style = report.point(1).unwrap().style.as_marker().unwrap().clone();
        assert_eq!(style.radius, ctx.styles.report.radius);
        assert_eq!(style.fill, ctx.styles.report.color);
        assert_eq!(style.label_text(), None);
    }

    #[test]
    fn show_then_clear_leaves_nothing() {
        let mut ctx = context();
        let mut report = ReportOverlay::new();
        report.show(&[point(1, 1.0, 10), point(2, 2.0, 20)], &mut ctx);
        report.clear(&mut ctx);

        assert!(ctx.surface.is_empty());
        assert!(report.route().is_none());
        assert!(report.is_empty());
        assert!(!report.is_shown());
    }

    #[test]
    fn clear_twice_is_a_no_op() {
        let mut ctx = context();
        let mut report = ReportOverlay::new();
        report.clear(&mut ctx);
        report.show(&[point(1, 1.0, 10)], &mut ctx);
        report.clear(&mut ctx);
        report.clear(&mut ctx);
        assert!(ctx.surface.is_empty());
    }

    #[test]
    fn showing_again_replaces_previous_report() {
        let mut ctx = context();
        let mut report = ReportOverlay::new();
        report.show(&[point(1, 1.0, 10), point(2, 2.0, 20)], &mut ctx);
        report.show(&[point(3, 3.0, 30)], &mut ctx);

        assert_eq!(ctx.surface.len(), 2);
        assert!(report.point(1).is_none());
        assert!(report.point(3).is_some());
    }

    #[test]
    fn repeated_record_id_keeps_last_marker() {
        let mut ctx = context();
        let mut report = ReportOverlay::new();
        report.show(&[point(1, 1.0, 10), point(1, 2.0, 20)], &mut ctx);

        assert_eq!(report.len(), 1);
        assert_eq!(ctx.surface.len(), 2);
        let expected = ctx.projection.project(2.0, 2.0);
        assert_eq!(report.point(1).unwrap().geometry, Geometry::Point(expected));
    }
}
