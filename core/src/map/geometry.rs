use serde::{Deserialize, Serialize};

/// Point in projected surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation, `t` clamped to 0..=1.
    pub fn lerp(self, to: Coordinate, t: f64) -> Coordinate {
        let t = t.clamp(0.0, 1.0);
        Coordinate::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
}

impl Geometry {
    /// Coordinate the view centres on when the feature is selected.
    pub fn anchor(&self) -> Option<Coordinate> {
        match self {
            Geometry::Point(point) => Some(*point),
            Geometry::LineString(points) => points.first().copied(),
        }
    }
}
