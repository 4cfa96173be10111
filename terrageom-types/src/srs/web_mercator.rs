use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::coord::Coord;
use crate::srs::Projection;

/// Spherical Mercator projection (EPSG:3857) of longitude/latitude degrees.
#[derive(Debug, Copy, Clone)]
pub struct WebMercator {
    radius: f64,
}

impl WebMercator {
    /// Latitude at which the projection becomes a square.
    pub const MAX_LATITUDE: f64 = 85.06;

    /// Semimajor axis of the WGS84 ellipsoid in meters, used as the sphere radius of EPSG:3857.
    pub const WGS84_RADIUS: f64 = 6_378_137.0;

    /// Creates a new projection onto a sphere of the given radius.
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }
}

impl Default for WebMercator {
    fn default() -> Self {
        Self::new(Self::WGS84_RADIUS)
    }
}

impl Projection for WebMercator {
    fn project(&self, input: &Coord) -> Option<Coord> {
        let x = self.radius * input.x.to_radians();
        let y = self.radius * (FRAC_PI_4 + input.y.to_radians() / 2.0).tan().ln();

        if x.is_finite() && y.is_finite() {
            Some(Coord { x, y, ..*input })
        } else {
            None
        }
    }

    fn unproject(&self, input: &Coord) -> Option<Coord> {
        let lon = (input.x / self.radius).to_degrees();
        let lat = (2.0 * (input.y / self.radius).exp().atan() - FRAC_PI_2).to_degrees();

        if lon.is_finite() && lat.is_finite() {
            Some(Coord {
                x: lon,
                y: lat,
                ..*input
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn project_known_points() {
        let projection = WebMercator::default();

        let origin = projection.project(&Coord::xy(0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(origin, Coord::xy(0.0, 0.0), epsilon = 1e-9);

        let corner = projection
            .project(&Coord::xy(180.0, WebMercator::MAX_LATITUDE))
            .unwrap();
        assert_abs_diff_eq!(corner.x, 20_037_508.342789244, epsilon = 1e-6);
        assert_abs_diff_eq!(corner.y, 20_000_000.0, epsilon = 50_000.0);

        assert!(projection.project(&Coord::xy(0.0, 90.0)).is_none());
    }

    #[test]
    fn unit_sphere() {
        let projection = WebMercator::new(1.0);
        let projected = projection.project(&Coord::xy(180.0, 0.0)).unwrap();
        assert_abs_diff_eq!(projected.x, std::f64::consts::PI, epsilon = 1e-12);
        assert_abs_diff_eq!(projected.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn unproject_restores_degrees() {
        let projection = WebMercator::default();
        let input = Coord::xyz(37.6, 55.75, 120.0);
        let projected = projection.project(&input).unwrap();
        assert_eq!(projected.z, 120.0);

        let restored = projection.unproject(&projected).unwrap();
        assert_abs_diff_eq!(restored, input, epsilon = 1e-9);
    }
}
