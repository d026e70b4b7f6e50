use super::markers::LiveMarkers;
use super::report::ReportOverlay;
use super::MapContext;
use crate::map::{Feature, VisualClass};
use crate::model::{DeviceId, PositionId};
use crate::prelude::MapSurface;
use crate::telemetry::LogManager;

/// Reference to an overlay owned by one of the managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKey {
    Live(DeviceId),
    Report(PositionId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Unselected,
    Selected(OverlayKey),
}

/// Tracks the single highlighted overlay.
#[derive(Debug)]
pub struct Selection {
    state: SelectionState,
    logger: LogManager,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            state: SelectionState::Unselected,
            logger: LogManager::new("selection"),
        }
    }
}

fn overlay_mut<'a>(
    key: OverlayKey,
    markers: &'a mut LiveMarkers,
    report: &'a mut ReportOverlay,
) -> Option<&'a mut Feature> {
    match key {
        OverlayKey::Live(device_id) => markers.get_mut(device_id),
        OverlayKey::Report(position_id) => report.point_mut(position_id),
    }
}

/// Applies the selected style, keeping the label the feature currently shows.
pub(crate) fn highlight<S: MapSurface, P>(feature: &mut Feature, ctx: &mut MapContext<S, P>) {
    let label = feature.label_text().map(str::to_owned);
    feature.style = ctx
        .styles
        .marker(VisualClass::Selected, 0.0, label.as_deref());
    ctx.surface.update_feature(feature);
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn current(&self) -> Option<OverlayKey> {
        match self.state {
            SelectionState::Selected(key) => Some(key),
            SelectionState::Unselected => None,
        }
    }

    /// Moves the highlight to `target`, or drops it when `target` is `None`.
    ///
    /// The previous overlay gets its original style back. A target that no
    /// longer resolves to an overlay leaves the selection empty.
    pub fn select<S: MapSurface, P>(
        &mut self,
        target: Option<OverlayKey>,
        markers: &mut LiveMarkers,
        report: &mut ReportOverlay,
        ctx: &mut MapContext<S, P>,
    ) {
        if let SelectionState::Selected(previous) = self.state {
            if let Some(feature) = overlay_mut(previous, markers, report) {
                feature.restore_original();
                ctx.surface.update_feature(feature);
            }
        }
        self.state = SelectionState::Unselected;

        let Some(key) = target else {
            self.logger.trace("selection cleared");
            return;
        };
        let Some(feature) = overlay_mut(key, markers, report) else {
            self.logger.trace(&format!("{:?} has no overlay", key));
            return;
        };

        highlight(feature, ctx);
        if let Some(anchor) = feature.geometry.anchor() {
            let duration = ctx.styles.pan_duration();
            ctx.surface.pan_to(anchor, duration);
        }
        self.state = SelectionState::Selected(key);
        self.logger.record(&format!("selected {:?}", key));
    }

    /// Forgets a report point selection; its overlay is about to disappear.
    pub fn release_report(&mut self) {
        if let SelectionState::Selected(OverlayKey::Report(_)) = self.state {
            self.state = SelectionState::Unselected;
        }
    }
}
