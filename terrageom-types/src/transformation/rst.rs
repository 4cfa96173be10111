use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use super::{check_count, least_squares, GeometricTransformation, TiePoint};
use crate::coord::Coord;
use crate::error::GeometryError;

pub(super) const NAME: &str = "RST";

/// Rotation, uniform scaling and translation
///
/// ```text
/// x' = a * x - b * y + c
/// y' = b * x + a * y + d
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RstTransform {
    params: [f64; 4],
}

impl RstTransform {
    /// Creates the transformation from parameters `[a, b, c, d]`.
    pub const fn new(params: [f64; 4]) -> Self {
        Self { params }
    }

    /// Parameters `[a, b, c, d]`.
    pub fn params(&self) -> [f64; 4] {
        self.params
    }

    /// Counter-clockwise rotation angle in radians.
    pub fn rotation(&self) -> f64 {
        self.params[1].atan2(self.params[0])
    }

    /// Scale factor applied to both axes.
    pub fn scaling(&self) -> f64 {
        self.params[0].hypot(self.params[1])
    }
}

impl GeometricTransformation for RstTransform {
    fn name(&self) -> &'static str {
        NAME
    }

    /// Needs at least two distinct tie points.
    fn fit(tie_points: &[TiePoint]) -> Result<Self, GeometryError> {
        check_count(NAME, tie_points, 2)?;

        let rows = tie_points.len() * 2;
        let mut design = DMatrix::zeros(rows, 4);
        let mut rhs = DMatrix::zeros(rows, 1);
        for (i, TiePoint { source, target }) in tie_points.iter().enumerate() {
            let (x_row, y_row) = (2 * i, 2 * i + 1);
            design[(x_row, 0)] = source.x;
            design[(x_row, 1)] = -source.y;
            design[(x_row, 2)] = 1.0;
            rhs[(x_row, 0)] = target.x;

            design[(y_row, 0)] = source.y;
            design[(y_row, 1)] = source.x;
            design[(y_row, 3)] = 1.0;
            rhs[(y_row, 0)] = target.y;
        }

        let solution = least_squares(NAME, design, rhs, true)?;
        let transform = Self::new([solution[0], solution[1], solution[2], solution[3]]);
        log::debug!(
            "Fitted RST transformation to {} tie points, rmse {}",
            tie_points.len(),
            transform.direct_rmse(tie_points)
        );

        Ok(transform)
    }

    fn direct_map(&self, coord: &Coord) -> Option<Coord> {
        let [a, b, c, d] = self.params;
        Some(Coord {
            x: a * coord.x - b * coord.y + c,
            y: b * coord.x + a * coord.y + d,
            ..*coord
        })
    }

    /// `None` if the scale is zero.
    fn inverse_map(&self, coord: &Coord) -> Option<Coord> {
        let [a, b, c, d] = self.params;
        let det = a * a + b * b;
        if det == 0.0 {
            return None;
        }

        let (x, y) = (coord.x - c, coord.y - d);
        Some(Coord {
            x: (a * x + b * y) / det,
            y: (a * y - b * x) / det,
            ..*coord
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformation::tests::{check_fit, tie_points};
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn fit_two_tie_points() {
        let points = tie_points(&[((0.0, 0.0), (0.0, -1.0)), ((0.0, 1.0), (-1.0, 0.0))]);
        check_fit("RST", &points);

        let rst = RstTransform::fit(&points).unwrap();
        assert_abs_diff_eq!(rst.rotation(), FRAC_PI_4, epsilon = 1e-9);
        assert_abs_diff_eq!(rst.scaling(), 2f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn keeps_shapes() {
        let points = tie_points(&[
            ((0.0, 0.0), (10.0, 0.0)),
            ((1.0, 0.0), (10.0, 2.0)),
            ((1.0, 1.0), (8.1, 2.0)),
        ]);
        let rst = RstTransform::fit(&points).unwrap();
        assert!(rst.max_direct_error(&points) > 0.0);
        assert_abs_diff_eq!(rst.rotation(), std::f64::consts::FRAC_PI_2, epsilon = 0.05);

        let mapped = rst.direct_map(&Coord::xyzm(2.0, 3.0, 7.0, 8.0)).unwrap();
        assert_eq!((mapped.z, mapped.m), (7.0, 8.0));
        let restored = rst.inverse_map(&mapped).unwrap();
        assert_abs_diff_eq!(restored, Coord::xyzm(2.0, 3.0, 7.0, 8.0), epsilon = 1e-9);
    }

    #[test]
    fn coincident_tie_points_are_rejected() {
        let points = tie_points(&[((1.0, 1.0), (0.0, 0.0)), ((1.0, 1.0), (2.0, 2.0))]);
        assert!(RstTransform::fit(&points).is_err());
    }
}
