use super::markers::{LiveMarkers, MarkerSync};
use super::report::ReportOverlay;
use super::selection::{highlight, OverlayKey, Selection, SelectionState};
use super::MapContext;
use crate::map::StyleConfig;
use crate::model::{DeviceId, DeviceRecord, PositionId, PositionRecord};
use crate::prelude::{MapResult, MapSurface, Projection};
use crate::store::{ApplyOutcome, DeviceStore, PositionStore};
use crate::telemetry::{FeedMetrics, LogManager};

/// Requests the surrounding application sends to the map.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    ReportShow(Vec<PositionRecord>),
    ReportClear,
    SelectDevice(DeviceId),
    SelectReport(PositionId),
}

/// Per-batch reconciliation counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub applied: usize,
    pub stale: usize,
    /// Records stored but not drawn because their device is unknown.
    pub skipped: usize,
}

/// Session state of the live map: stores, overlay managers and selection.
#[derive(Debug)]
pub struct MapController<S, P> {
    ctx: MapContext<S, P>,
    positions: PositionStore,
    devices: DeviceStore,
    markers: LiveMarkers,
    report: ReportOverlay,
    selection: Selection,
    metrics: FeedMetrics,
    logger: LogManager,
}

impl<S: MapSurface, P: Projection> MapController<S, P> {
    pub fn new(surface: S, projection: P, styles: StyleConfig, devices: DeviceStore) -> Self {
        Self {
            ctx: MapContext::new(surface, projection, styles),
            positions: PositionStore::new(),
            devices,
            markers: LiveMarkers::new(),
            report: ReportOverlay::new(),
            selection: Selection::new(),
            metrics: FeedMetrics::new(),
            logger: LogManager::new("markers"),
        }
    }

    /// Reconciles one record into the store and, when accepted, its marker.
    ///
    /// The store is updated even when the marker cannot be created.
    pub fn apply_position(&mut self, record: &PositionRecord) -> MapResult<ApplyOutcome> {
        let outcome = self.positions.apply(record);
        self.metrics.record_apply(outcome);
        if !outcome.accepted() {
            self.logger.trace(&format!(
                "device {} fix {} older than stored, dropped",
                record.device_id, record.fix_time
            ));
            return Ok(outcome);
        }

        match self.markers.sync(record, &self.devices, &mut self.ctx)? {
            MarkerSync::Created(_) => self.metrics.record_marker_created(),
            MarkerSync::Updated(_) => {
                if self.selection.current() == Some(OverlayKey::Live(record.device_id)) {
                    if let Some(feature) = self.markers.get_mut(record.device_id) {
                        highlight(feature, &mut self.ctx);
                    }
                }
            }
        }
        Ok(outcome)
    }

    /// Applies a batch in array order. Unknown devices are logged and skipped.
    pub fn apply_batch(&mut self, batch: &[PositionRecord]) -> BatchSummary {
        self.metrics.record_batch();
        let mut summary = BatchSummary::default();

        for record in batch {
            match self.apply_position(record) {
                Ok(ApplyOutcome::Stale) => summary.stale += 1,
                Ok(_) => summary.applied += 1,
                Err(err) => {
                    self.metrics.record_unknown_device();
                    self.logger
                        .anomaly(&format!("skipping marker for position {}: {}", record.id, err));
                    summary.skipped += 1;
                }
            }
        }

        self.logger.trace(&format!(
            "batch of {}: {} applied, {} stale, {} skipped",
            batch.len(),
            summary.applied,
            summary.stale,
            summary.skipped
        ));
        summary
    }

    pub fn handle(&mut self, event: MapEvent) {
        match event {
            MapEvent::ReportShow(records) => self.on_report_show(&records),
            MapEvent::ReportClear => self.on_report_clear(),
            MapEvent::SelectDevice(device_id) => self.on_select_device(device_id),
            MapEvent::SelectReport(position_id) => self.on_select_report(position_id),
        }
    }

    pub fn on_report_show(&mut self, records: &[PositionRecord]) {
        self.on_report_clear();
        self.report.show(records, &mut self.ctx);
    }

    pub fn on_report_clear(&mut self) {
        self.selection.release_report();
        self.report.clear(&mut self.ctx);
    }

    /// Highlights the device's live marker. Devices without a marker are ignored.
    pub fn on_select_device(&mut self, device_id: DeviceId) {
        if self.markers.contains(device_id) {
            self.select_overlay(Some(OverlayKey::Live(device_id)));
        }
    }

    /// Highlights a report point. Points not currently shown are ignored.
    pub fn on_select_report(&mut self, position_id: PositionId) {
        if self.report.point(position_id).is_some() {
            self.select_overlay(Some(OverlayKey::Report(position_id)));
        }
    }

    pub fn select_overlay(&mut self, target: Option<OverlayKey>) {
        self.selection
            .select(target, &mut self.markers, &mut self.report, &mut self.ctx);
    }

    pub fn set_devices(&mut self, devices: impl IntoIterator<Item = DeviceRecord>) {
        self.devices.extend(devices);
    }

    pub fn surface(&self) -> &S {
        &self.ctx.surface
    }

    pub fn styles(&self) -> &StyleConfig {
        &self.ctx.styles
    }

    pub fn positions(&self) -> &PositionStore {
        &self.positions
    }

    pub fn devices(&self) -> &DeviceStore {
        &self.devices
    }

    pub fn markers(&self) -> &LiveMarkers {
        &self.markers
    }

    pub fn report(&self) -> &ReportOverlay {
        &self.report
    }

    pub fn selection(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn metrics(&self) -> &FeedMetrics {
        &self.metrics
    }
}
