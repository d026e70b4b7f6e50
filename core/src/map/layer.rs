use super::feature::{Feature, FeatureId};
use super::geometry::Coordinate;
use crate::prelude::MapSurface;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// View centre transition started by a pan request.
#[derive(Debug, Clone, Copy)]
pub struct PanAnimation {
    pub from: Coordinate,
    pub to: Coordinate,
    pub started: Instant,
    pub duration: Duration,
}

impl PanAnimation {
    pub fn center_at(&self, now: Instant) -> Coordinate {
        if self.duration.is_zero() {
            return self.to;
        }
        let elapsed = now.saturating_duration_since(self.started);
        let progress = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.from.lerp(self.to, progress)
    }

    pub fn finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= self.duration
    }
}

/// In-memory vector source: features in draw order plus the view centre.
#[derive(Debug, Default)]
pub struct VectorLayer {
    features: HashMap<FeatureId, Feature>,
    order: Vec<FeatureId>,
    center: Coordinate,
    animation: Option<PanAnimation>,
}

impl VectorLayer {
    pub fn new(center: Coordinate) -> Self {
        Self {
            center,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(&id)
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.features.contains_key(&id)
    }

    /// Features in the order they were added; later ones draw on top.
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.order.iter().filter_map(|id| self.features.get(id))
    }

    /// Target centre of the view, ignoring any running animation.
    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn center_at(&self, now: Instant) -> Coordinate {
        match &self.animation {
            Some(animation) if !animation.finished(now) => animation.center_at(now),
            _ => self.center,
        }
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.animation
            .as_ref()
            .is_some_and(|animation| !animation.finished(now))
    }
}

impl MapSurface for VectorLayer {
    fn add_feature(&mut self, feature: &Feature) {
        if self.features.insert(feature.id, feature.clone()).is_none() {
            self.order.push(feature.id);
        }
    }

    fn update_feature(&mut self, feature: &Feature) {
        if let Some(existing) = self.features.get_mut(&feature.id) {
            *existing = feature.clone();
        }
    }

    fn remove_feature(&mut self, id: FeatureId) {
        if self.features.remove(&id).is_some() {
            self.order.retain(|existing| *existing != id);
        }
    }

    fn pan_to(&mut self, center: Coordinate, duration: Duration) {
        let now = Instant::now();
        let from = self.center_at(now);
        self.animation = Some(PanAnimation {
            from,
            to: center,
            started: now,
            duration,
        });
        self.center = center;
    }
}
