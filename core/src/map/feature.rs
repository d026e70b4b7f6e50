use super::geometry::Geometry;
use super::style::FeatureStyle;

/// Stable arena key of an overlay on the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(pub u64);

/// Allocates feature ids for one map session.
#[derive(Debug, Default)]
pub struct FeatureIds {
    next: u64,
}

impl FeatureIds {
    pub fn allocate(&mut self) -> FeatureId {
        self.next += 1;
        FeatureId(self.next)
    }
}

/// A drawable overlay: a point marker or a route line.
///
/// `original_style` is what the feature returns to when it stops being
/// highlighted. It is stored as its own value, never shared with `style`.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
    pub style: FeatureStyle,
    pub original_style: FeatureStyle,
}

impl Feature {
    pub fn new(id: FeatureId, geometry: Geometry, style: FeatureStyle) -> Self {
        Self {
            id,
            geometry,
            original_style: style.clone(),
            style,
        }
    }

    pub fn restore_original(&mut self) {
        self.style = self.original_style.clone();
    }

    /// Label text currently rendered with the feature, if any.
    pub fn label_text(&self) -> Option<&str> {
        match &self.style {
            FeatureStyle::Marker(marker) => marker.label_text(),
            FeatureStyle::Line(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_per_allocator() {
        let mut ids = FeatureIds::default();
        let a = ids.allocate();
        let b = ids.allocate();
        assert_ne!(a, b);
    }
}
