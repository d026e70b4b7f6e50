pub mod feature;
pub mod geometry;
pub mod layer;
pub mod projection;
pub mod style;

pub use feature::{Feature, FeatureId, FeatureIds};
pub use geometry::{Coordinate, Geometry};
pub use layer::{PanAnimation, VectorLayer};
pub use projection::WebMercator;
pub use style::{FeatureStyle, MarkerStyle, Rgba, StyleConfig, VisualClass};
