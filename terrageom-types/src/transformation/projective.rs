use nalgebra::{DMatrix, Matrix3};
use serde::{Deserialize, Serialize};

use super::{check_count, least_squares, GeometricTransformation, TiePoint};
use crate::coord::Coord;
use crate::error::GeometryError;

pub(super) const NAME: &str = "Projective";

const HORIZON_EPSILON: f64 = 1e-12;

/// Projective transformation (plane homography)
///
/// ```text
/// x' = (a * x + b * y + c) / (g * x + h * y + 1)
/// y' = (d * x + e * y + f) / (g * x + h * y + 1)
/// ```
///
/// Points on the line `g * x + h * y + 1 = 0` have no image.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectiveTransform {
    direct: [f64; 9],
    inverse: [f64; 9],
}

impl ProjectiveTransform {
    /// Creates the transformation from parameters `[a, b, c, d, e, f, g, h]`.
    ///
    /// Returns `None` if the transformation cannot be inverted.
    pub fn new(params: [f64; 8]) -> Option<Self> {
        let [a, b, c, d, e, f, g, h] = params;
        let direct = Matrix3::new(a, b, c, d, e, f, g, h, 1.0);
        let inverse = direct.try_inverse()?;
        let scale = inverse[(2, 2)];
        if scale.abs() < HORIZON_EPSILON {
            return None;
        }

        let mut result = Self {
            direct: [0.0; 9],
            inverse: [0.0; 9],
        };
        for row in 0..3 {
            for column in 0..3 {
                result.direct[row * 3 + column] = direct[(row, column)];
                result.inverse[row * 3 + column] = inverse[(row, column)] / scale;
            }
        }

        Some(result)
    }

    /// Parameters `[a, b, c, d, e, f, g, h]`.
    pub fn params(&self) -> [f64; 8] {
        let mut params = [0.0; 8];
        params.copy_from_slice(&self.direct[..8]);
        params
    }
}

fn apply(matrix: &[f64; 9], coord: &Coord) -> Option<Coord> {
    let w = matrix[6] * coord.x + matrix[7] * coord.y + matrix[8];
    if w.abs() < HORIZON_EPSILON {
        return None;
    }

    Some(Coord {
        x: (matrix[0] * coord.x + matrix[1] * coord.y + matrix[2]) / w,
        y: (matrix[3] * coord.x + matrix[4] * coord.y + matrix[5]) / w,
        ..*coord
    })
}

impl GeometricTransformation for ProjectiveTransform {
    fn name(&self) -> &'static str {
        NAME
    }

    /// Needs at least four tie points, no three of them on one line.
    fn fit(tie_points: &[TiePoint]) -> Result<Self, GeometryError> {
        check_count(NAME, tie_points, 4)?;

        let rows = tie_points.len() * 2;
        let mut design = DMatrix::zeros(rows, 8);
        let mut rhs = DMatrix::zeros(rows, 1);
        for (i, TiePoint { source, target }) in tie_points.iter().enumerate() {
            let (x_row, y_row) = (2 * i, 2 * i + 1);
            design[(x_row, 0)] = source.x;
            design[(x_row, 1)] = source.y;
            design[(x_row, 2)] = 1.0;
            design[(x_row, 6)] = -source.x * target.x;
            design[(x_row, 7)] = -source.y * target.x;
            rhs[(x_row, 0)] = target.x;

            design[(y_row, 3)] = source.x;
            design[(y_row, 4)] = source.y;
            design[(y_row, 5)] = 1.0;
            design[(y_row, 6)] = -source.x * target.y;
            design[(y_row, 7)] = -source.y * target.y;
            rhs[(y_row, 0)] = target.y;
        }

        let solution = least_squares(NAME, design, rhs, true)?;
        let mut params = [0.0; 8];
        params
            .iter_mut()
            .zip(solution.iter())
            .for_each(|(param, value)| *param = *value);

        let transform = Self::new(params).ok_or_else(|| {
            GeometryError::InvalidState("fitted projective transformation is singular".into())
        })?;
        log::debug!(
            "Fitted projective transformation to {} tie points, rmse {}",
            tie_points.len(),
            transform.direct_rmse(tie_points)
        );

        Ok(transform)
    }

    fn direct_map(&self, coord: &Coord) -> Option<Coord> {
        apply(&self.direct, coord)
    }

    fn inverse_map(&self, coord: &Coord) -> Option<Coord> {
        apply(&self.inverse, coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformation::tests::{check_fit, tie_points};
    use approx::assert_abs_diff_eq;

    #[test]
    fn fit_four_tie_points() {
        check_fit(
            "Projective",
            &tie_points(&[
                ((0.0, 0.0), (1.0, -2.0)),
                ((0.0, 1.0), (-1.0, -1.0)),
                ((1.0, 1.0), (-1.0, 1.0)),
                ((1.0, 0.0), (1.0, 2.0)),
            ]),
        );
    }

    #[test]
    fn maps_lines_to_lines() {
        let transform = ProjectiveTransform::new([1.0, 0.2, 3.0, -0.1, 2.0, 1.0, 0.01, 0.02])
            .unwrap();
        let mapped: Vec<_> = [0.0, 1.0, 2.5]
            .into_iter()
            .map(|t| transform.direct_map(&Coord::xy(t, 2.0 * t)).unwrap())
            .collect();

        let cross = (mapped[1].x - mapped[0].x) * (mapped[2].y - mapped[0].y)
            - (mapped[1].y - mapped[0].y) * (mapped[2].x - mapped[0].x);
        assert_abs_diff_eq!(cross, 0.0, epsilon = 1e-9);

        let restored = transform.inverse_map(&mapped[2]).unwrap();
        assert_abs_diff_eq!(restored, Coord::xy(2.5, 5.0), epsilon = 1e-9);
    }

    #[test]
    fn horizon_has_no_image() {
        let transform =
            ProjectiveTransform::new([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, -0.5]).unwrap();
        assert!(transform.direct_map(&Coord::xy(3.0, 2.0)).is_none());
        assert!(transform.direct_map(&Coord::xy(3.0, 1.0)).is_some());
    }

    #[test]
    fn collinear_tie_points_are_rejected() {
        let points = tie_points(&[
            ((0.0, 0.0), (0.0, 0.0)),
            ((1.0, 1.0), (1.0, 0.0)),
            ((2.0, 2.0), (2.0, 0.0)),
            ((3.0, 3.0), (3.0, 0.0)),
        ]);
        assert!(ProjectiveTransform::fit(&points).is_err());
    }
}
