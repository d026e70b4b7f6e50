use super::geometry::Coordinate;
use crate::prelude::Projection;
use std::f64::consts::PI;

const EARTH_RADIUS_M: f64 = 6_378_137.0;
const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Spherical Web Mercator (EPSG:3857), metres.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl Projection for WebMercator {
    fn project(&self, longitude: f64, latitude: f64) -> Coordinate {
        let latitude = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let x = EARTH_RADIUS_M * longitude.to_radians();
        let y = EARTH_RADIUS_M * (PI / 4.0 + latitude.to_radians() / 2.0).tan().ln();
        Coordinate::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_maps_to_origin() {
        let point = WebMercator.project(0.0, 0.0);
        assert!(point.x.abs() < 1e-9);
        assert!(point.y.abs() < 1e-9);
    }

    #[test]
    fn antimeridian_maps_to_half_circumference() {
        let point = WebMercator.project(180.0, 0.0);
        assert!((point.x - 20_037_508.342_789_244).abs() < 1e-6);
    }

    #[test]
    fn poles_are_clamped() {
        let north = WebMercator.project(0.0, 90.0);
        assert!(north.y.is_finite());
        assert!((north.y - 20_037_508.342_789_244).abs() < 1.0);
    }
}
