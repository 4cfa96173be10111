use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use super::{check_count, GeometricTransformation, TiePoint};
use crate::coord::Coord;
use crate::error::GeometryError;

pub(super) const NAME: &str = "Affine";

const SINGULAR_EPSILON: f64 = 1e-12;

/// Affine transformation
///
/// ```text
/// x' = a * x + b * y + c
/// y' = d * x + e * y + f
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    params: [f64; 6],
}

/// Components of an affine transformation, see [`AffineTransform::decompose`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffineDecomposition {
    /// Shift along `x`.
    pub translation_x: f64,
    /// Shift along `y`.
    pub translation_y: f64,
    /// Length of the image of the unit `x` vector.
    pub scaling_factor_x: f64,
    /// Length of the image of the unit `y` vector.
    pub scaling_factor_y: f64,
    /// Shear of the second axis relative to the first one.
    pub skew: f64,
    /// Ratio of the axis scales, `1` if both axes are scaled equally.
    pub squeeze: f64,
    /// Square root of the area scale.
    pub scaling: f64,
    /// Rotation in radians, counter-clockwise.
    pub rotation: f64,
}

impl AffineTransform {
    /// Creates the transformation from parameters `[a, b, c, d, e, f]`.
    pub const fn new(params: [f64; 6]) -> Self {
        Self { params }
    }

    /// Transformation that does nothing.
    pub const fn identity() -> Self {
        Self::new([1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
    }

    /// Shift by `(dx, dy)`.
    pub const fn translation(dx: f64, dy: f64) -> Self {
        Self::new([1.0, 0.0, dx, 0.0, 1.0, dy])
    }

    /// Scaling relative to the origin.
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new([sx, 0.0, 0.0, 0.0, sy, 0.0])
    }

    /// Counter-clockwise rotation around the origin, angle in radians.
    pub fn rotation(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new([cos, -sin, 0.0, sin, cos, 0.0])
    }

    /// Parameters `[a, b, c, d, e, f]`.
    pub fn params(&self) -> [f64; 6] {
        self.params
    }

    fn determinant(&self) -> f64 {
        let [a, b, _, d, e, _] = self.params;
        a * e - b * d
    }

    /// Splits the transformation into translation, scales, skew and rotation.
    ///
    /// A transformation that mirrors the plane is decomposed with its axes swapped, and its
    /// rotation is given in `(-π/2, π/2]`. Returns `None` for a singular transformation.
    pub fn decompose(&self) -> Option<AffineDecomposition> {
        let [a, b, c, d, e, f] = self.params;
        let det = self.determinant();
        if det.abs() < SINGULAR_EPSILON {
            return None;
        }

        let (first, second) = if det > 0.0 {
            ((a, d), (b, e))
        } else {
            ((b, e), (a, d))
        };
        let first_len = first.0.hypot(first.1);
        let scaling = det.abs().sqrt();

        let mut rotation = d.atan2(a);
        if det < 0.0 {
            if rotation > FRAC_PI_2 {
                rotation -= PI;
            } else if rotation <= -FRAC_PI_2 {
                rotation += PI;
            }
        }

        Some(AffineDecomposition {
            translation_x: c,
            translation_y: f,
            scaling_factor_x: a.hypot(d),
            scaling_factor_y: b.hypot(e),
            skew: (first.0 * second.0 + first.1 * second.1) / (first_len * first_len),
            squeeze: first_len / scaling,
            scaling,
            rotation,
        })
    }
}

impl GeometricTransformation for AffineTransform {
    fn name(&self) -> &'static str {
        NAME
    }

    /// Needs at least three tie points that do not lie on one line in the source plane.
    fn fit(tie_points: &[TiePoint]) -> Result<Self, GeometryError> {
        check_count(NAME, tie_points, 3)?;

        let mut normal = Matrix3::<f64>::zeros();
        let mut rhs_x = Vector3::<f64>::zeros();
        let mut rhs_y = Vector3::<f64>::zeros();
        for tie_point in tie_points {
            let row = Vector3::new(tie_point.source.x, tie_point.source.y, 1.0);
            normal += row * row.transpose();
            rhs_x += row * tie_point.target.x;
            rhs_y += row * tie_point.target.y;
        }

        let inverse = normal.try_inverse().ok_or_else(|| {
            GeometryError::InvalidState("tie points are collinear".to_string())
        })?;
        let px = inverse * rhs_x;
        let py = inverse * rhs_y;

        let transform = Self::new([px[0], px[1], px[2], py[0], py[1], py[2]]);
        log::debug!(
            "Fitted affine transformation to {} tie points, rmse {}",
            tie_points.len(),
            transform.direct_rmse(tie_points)
        );

        Ok(transform)
    }

    fn direct_map(&self, coord: &Coord) -> Option<Coord> {
        let [a, b, c, d, e, f] = self.params;
        Some(Coord {
            x: a * coord.x + b * coord.y + c,
            y: d * coord.x + e * coord.y + f,
            ..*coord
        })
    }

    /// `None` if the transformation is singular.
    fn inverse_map(&self, coord: &Coord) -> Option<Coord> {
        let [a, b, c, d, e, f] = self.params;
        let det = self.determinant();
        if det.abs() < SINGULAR_EPSILON {
            return None;
        }

        let (x, y) = (coord.x - c, coord.y - f);
        Some(Coord {
            x: (e * x - b * y) / det,
            y: (a * y - d * x) / det,
            ..*coord
        })
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, LineString};
    use crate::transformation::tests::{check_fit, tie_points};
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    fn map(transform: &AffineTransform, coord: Coord) -> Coord {
        transform.direct_map(&coord).unwrap()
    }

    #[test]
    fn simple_transforms() {
        let coord = Coord::xyz(1.0, 2.0, 3.0);
        assert_eq!(map(&AffineTransform::identity(), coord), coord);
        assert_eq!(
            map(&AffineTransform::translation(1.0, -1.0), coord),
            Coord::xyz(2.0, 1.0, 3.0)
        );
        assert_eq!(
            map(&AffineTransform::scale(2.0, 3.0), coord),
            Coord::xyz(2.0, 6.0, 3.0)
        );
        assert_abs_diff_eq!(
            map(&AffineTransform::rotation(FRAC_PI_2), coord),
            Coord::xyz(-2.0, 1.0, 3.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn inverse_map() {
        let transform = AffineTransform::new([2.0, 1.0, 5.0, -1.0, 3.0, 7.0]);
        let coord = Coord::xy(3.5, -1.25);
        let restored = transform.inverse_map(&map(&transform, coord)).unwrap();
        assert_abs_diff_eq!(restored, coord, epsilon = 1e-12);

        assert!(AffineTransform::scale(0.0, 1.0)
            .inverse_map(&coord)
            .is_none());
    }

    #[test]
    fn fit_by_name() {
        check_fit(
            "Affine",
            &tie_points(&[
                ((0.0, 0.0), (1.0, 0.0)),
                ((0.0, 1.0), (-1.0, -2.0)),
                ((1.0, 1.0), (-1.0, 0.0)),
            ]),
        );
    }

    #[test]
    fn fit_exact_tie_points() {
        let expected = AffineTransform::new([2.0, 0.5, 10.0, -0.5, 2.0, 20.0]);
        let tie_points: Vec<_> = [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)]
            .into_iter()
            .map(|(x, y)| {
                let source = Coord::xy(x, y);
                TiePoint::new(source, map(&expected, source))
            })
            .collect();

        let fitted = AffineTransform::fit(&tie_points).unwrap();
        for (actual, expected) in fitted.params().iter().zip(expected.params()) {
            assert_abs_diff_eq!(*actual, expected, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(fitted.direct_rmse(&tie_points), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fitted.max_direct_error(&tie_points), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fitted.max_inverse_error(&tie_points), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn fit_reports_residuals() {
        let tie_points = tie_points(&[
            ((0.0, 0.0), (0.0, 0.0)),
            ((1.0, 0.0), (1.0, 0.0)),
            ((0.0, 1.0), (0.0, 1.0)),
            ((1.0, 1.0), (1.2, 1.0)),
        ]);
        let fitted = AffineTransform::fit(&tie_points).unwrap();
        let rmse = fitted.direct_rmse(&tie_points);
        let max = fitted.max_direct_error(&tie_points);
        assert!(rmse > 0.0);
        assert!(max >= rmse);
        assert!(fitted.inverse_rmse(&tie_points) > 0.0);
    }

    #[test]
    fn invalid_tie_points() {
        let two = tie_points(&[((0.0, 0.0), (0.0, 0.0)), ((1.0, 0.0), (1.0, 0.0))]);
        assert_matches!(
            AffineTransform::fit(&two),
            Err(GeometryError::InvalidState(_))
        );

        let collinear = tie_points(&[
            ((0.0, 0.0), (0.0, 0.0)),
            ((1.0, 1.0), (1.0, 0.0)),
            ((2.0, 2.0), (2.0, 0.0)),
        ]);
        assert_matches!(
            AffineTransform::fit(&collinear),
            Err(GeometryError::InvalidState(_))
        );
    }

    fn decompose(pairs: &[((f64, f64), (f64, f64))]) -> AffineDecomposition {
        AffineTransform::fit(&tie_points(pairs))
            .unwrap()
            .decompose()
            .unwrap()
    }

    fn assert_decomposition(actual: AffineDecomposition, expected: AffineDecomposition) {
        assert_abs_diff_eq!(actual.translation_x, expected.translation_x, epsilon = 1e-10);
        assert_abs_diff_eq!(actual.translation_y, expected.translation_y, epsilon = 1e-10);
        assert_abs_diff_eq!(
            actual.scaling_factor_x,
            expected.scaling_factor_x,
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(
            actual.scaling_factor_y,
            expected.scaling_factor_y,
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(actual.skew, expected.skew, epsilon = 1e-10);
        assert_abs_diff_eq!(actual.squeeze, expected.squeeze, epsilon = 1e-4);
        assert_abs_diff_eq!(actual.scaling, expected.scaling, epsilon = 1e-4);
        assert_abs_diff_eq!(actual.rotation, expected.rotation, epsilon = 1e-10);
    }

    const UNCHANGED: AffineDecomposition = AffineDecomposition {
        translation_x: 0.0,
        translation_y: 0.0,
        scaling_factor_x: 1.0,
        scaling_factor_y: 1.0,
        skew: 0.0,
        squeeze: 1.0,
        scaling: 1.0,
        rotation: 0.0,
    };

    #[test]
    fn decompose_translation_and_rotation() {
        assert_decomposition(
            decompose(&[
                ((0.0, 0.0), (1.0, 0.0)),
                ((0.0, 1.0), (1.0, 1.0)),
                ((1.0, 1.0), (2.0, 1.0)),
            ]),
            AffineDecomposition {
                translation_x: 1.0,
                ..UNCHANGED
            },
        );

        assert_decomposition(
            decompose(&[
                ((0.0, 0.0), (0.0, 0.0)),
                ((0.0, 1.0), (1.0, 0.0)),
                ((1.0, 1.0), (1.0, -1.0)),
            ]),
            AffineDecomposition {
                rotation: -FRAC_PI_2,
                ..UNCHANGED
            },
        );

        assert_decomposition(
            decompose(&[
                ((0.0, 0.0), (0.0, 0.0)),
                ((0.0, 1.0), (-1.0, 0.0)),
                ((1.0, 1.0), (-1.0, 1.0)),
            ]),
            AffineDecomposition {
                rotation: FRAC_PI_2,
                ..UNCHANGED
            },
        );
    }

    #[test]
    fn decompose_scaling() {
        let scaled_x = AffineDecomposition {
            scaling_factor_x: 2.0,
            squeeze: 2f64.sqrt(),
            scaling: 2f64.sqrt(),
            ..UNCHANGED
        };
        let scaled_y = AffineDecomposition {
            scaling_factor_y: 2.0,
            squeeze: 0.5f64.sqrt(),
            scaling: 2f64.sqrt(),
            ..UNCHANGED
        };

        assert_decomposition(
            decompose(&[
                ((0.0, 0.0), (0.0, 0.0)),
                ((0.0, 1.0), (0.0, 1.0)),
                ((1.0, 1.0), (2.0, 1.0)),
            ]),
            scaled_x,
        );
        assert_decomposition(
            decompose(&[
                ((0.0, 0.0), (0.0, 0.0)),
                ((0.0, 1.0), (0.0, 2.0)),
                ((1.0, 1.0), (1.0, 2.0)),
            ]),
            scaled_y,
        );

        // Mirrored axes swap the squeeze.
        assert_decomposition(
            decompose(&[
                ((0.0, 0.0), (0.0, 0.0)),
                ((0.0, 1.0), (0.0, 1.0)),
                ((1.0, 1.0), (-2.0, 1.0)),
            ]),
            AffineDecomposition {
                squeeze: scaled_y.squeeze,
                ..scaled_x
            },
        );
        assert_decomposition(
            decompose(&[
                ((0.0, 0.0), (0.0, 0.0)),
                ((0.0, 1.0), (0.0, -2.0)),
                ((1.0, 1.0), (1.0, -2.0)),
            ]),
            AffineDecomposition {
                squeeze: scaled_x.squeeze,
                ..scaled_y
            },
        );
    }

    #[test]
    fn singular_transform_has_no_decomposition() {
        assert!(AffineTransform::scale(1.0, 0.0).decompose().is_none());
    }

    #[test]
    fn apply_to_geometry() {
        let mut geometry = Geometry::polygon(
            vec![LineString::new(vec![
                Coord::xy(0.0, 0.0),
                Coord::xy(1.0, 0.0),
                Coord::xy(1.0, 1.0),
                Coord::xy(0.0, 0.0),
            ])],
            4326,
        );
        let _ = geometry.mbr();

        geometry
            .apply_transformation(&AffineTransform::translation(10.0, 20.0))
            .unwrap();
        assert!(!geometry.has_cached_mbr());
        assert_eq!(geometry.srid(), 4326);
        assert_eq!(geometry.mbr().x_min(), 10.0);
        assert_eq!(geometry.mbr().y_max(), 21.0);
    }
}
