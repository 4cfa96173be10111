use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use super::{check_count, least_squares, GeometricTransformation, TiePoint};
use crate::coord::Coord;
use crate::error::GeometryError;

pub(super) const SECOND_DEGREE_NAME: &str = "SecondDegreePolynomial";
pub(super) const THIRD_DEGREE_NAME: &str = "ThirdDegreePolynomial";

/// Polynomial transformation with terms up to the second degree.
pub type SecondDegreePolynomial = PolynomialTransform<2>;
/// Polynomial transformation with terms up to the third degree.
pub type ThirdDegreePolynomial = PolynomialTransform<3>;

/// Polynomial mapping of both coordinates with terms `x^i * y^j`, `i + j <= DEGREE`.
///
/// The inverse mapping is a separate polynomial fitted to the tie points with source and target
/// swapped, so it inverts the direct one only approximately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialTransform<const DEGREE: usize> {
    direct: Polynomial,
    inverse: Polynomial,
}

/// Coefficients for `x'` and `y'` over coordinates shifted by `origin` and divided by `unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Polynomial {
    origin: (f64, f64),
    unit: f64,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Polynomial {
    fn fit(
        name: &str,
        degree: usize,
        pairs: impl Iterator<Item = (Coord, Coord)> + Clone,
    ) -> Result<Self, GeometryError> {
        let count = pairs.clone().count();
        let (sum_x, sum_y) = pairs
            .clone()
            .fold((0.0, 0.0), |(x, y), (from, _)| (x + from.x, y + from.y));
        let origin = (sum_x / count as f64, sum_y / count as f64);
        let unit = pairs
            .clone()
            .map(|(from, _)| (from.x - origin.0).abs().max((from.y - origin.1).abs()))
            .fold(0.0, f64::max);
        let unit = if unit > 0.0 { unit } else { 1.0 };

        let mut polynomial = Self {
            origin,
            unit,
            x: vec![],
            y: vec![],
        };

        let terms = term_count(degree);
        let mut design = DMatrix::zeros(count, terms);
        let mut rhs = DMatrix::zeros(count, 2);
        for (row, (from, to)) in pairs.enumerate() {
            for (column, term) in polynomial.terms(degree, &from).enumerate() {
                design[(row, column)] = term;
            }
            rhs[(row, 0)] = to.x;
            rhs[(row, 1)] = to.y;
        }

        let solution = least_squares(name, design, rhs, false)?;
        polynomial.x = solution.column(0).iter().copied().collect();
        polynomial.y = solution.column(1).iter().copied().collect();

        Ok(polynomial)
    }

    fn terms(&self, degree: usize, coord: &Coord) -> impl Iterator<Item = f64> {
        let x = (coord.x - self.origin.0) / self.unit;
        let y = (coord.y - self.origin.1) / self.unit;
        (0..=degree).flat_map(move |total| {
            (0..=total).map(move |y_power| {
                x.powi((total - y_power) as i32) * y.powi(y_power as i32)
            })
        })
    }

    fn map(&self, degree: usize, coord: &Coord) -> Coord {
        let (x, y) = self
            .terms(degree, coord)
            .zip(self.x.iter().zip(&self.y))
            .fold((0.0, 0.0), |(x, y), (term, (cx, cy))| {
                (x + term * cx, y + term * cy)
            });

        Coord { x, y, ..*coord }
    }
}

const fn term_count(degree: usize) -> usize {
    (degree + 1) * (degree + 2) / 2
}

impl<const DEGREE: usize> PolynomialTransform<DEGREE> {
    /// Number of coefficients per coordinate, which is also the least number of tie points.
    pub const TERMS: usize = term_count(DEGREE);

    const NAME: &'static str = match DEGREE {
        2 => SECOND_DEGREE_NAME,
        3 => THIRD_DEGREE_NAME,
        _ => "Polynomial",
    };
}

impl<const DEGREE: usize> GeometricTransformation for PolynomialTransform<DEGREE> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Needs at least [`PolynomialTransform::TERMS`] tie points.
    ///
    /// If the tie points do not determine all coefficients, the smallest ones reproducing the
    /// tie points best are used.
    fn fit(tie_points: &[TiePoint]) -> Result<Self, GeometryError> {
        let name = Self::NAME;
        check_count(name, tie_points, Self::TERMS)?;

        let direct = Polynomial::fit(
            name,
            DEGREE,
            tie_points.iter().map(|tie_point| (tie_point.source, tie_point.target)),
        )?;
        let inverse = Polynomial::fit(
            name,
            DEGREE,
            tie_points.iter().map(|tie_point| (tie_point.target, tie_point.source)),
        )?;

        let transform = Self { direct, inverse };
        log::debug!(
            "Fitted {name} transformation to {} tie points, rmse {} / {}",
            tie_points.len(),
            transform.direct_rmse(tie_points),
            transform.inverse_rmse(tie_points)
        );

        Ok(transform)
    }

    fn direct_map(&self, coord: &Coord) -> Option<Coord> {
        Some(self.direct.map(DEGREE, coord))
    }

    fn inverse_map(&self, coord: &Coord) -> Option<Coord> {
        Some(self.inverse.map(DEGREE, coord))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformation::tests::{check_fit, tie_points};
    use approx::assert_abs_diff_eq;

    #[test]
    fn term_counts() {
        assert_eq!(SecondDegreePolynomial::TERMS, 6);
        assert_eq!(ThirdDegreePolynomial::TERMS, 10);
    }

    #[test]
    fn second_degree() {
        let points = tie_points(&[
            ((0.0, 0.0), (1.0, -1.0)),
            ((1.0, 0.0), (0.0, 0.0)),
            ((2.0, 0.0), (1.0, 1.0)),
            ((2.0, 2.0), (-1.0, 1.0)),
            ((1.0, 2.0), (-2.0, 0.0)),
            ((0.0, 2.0), (-1.0, -1.0)),
            ((1.0, 1.0), (-1.0, 0.0)),
        ]);
        let transformation = check_fit("SecondDegreePolynomial", &points);

        // x' = (x - 1)^2 - y, y' = x - 1
        let mapped = transformation.direct_map(&Coord::xy(3.0, 0.5)).unwrap();
        assert_abs_diff_eq!(mapped.x, 3.5, epsilon = 1e-9);
        assert_abs_diff_eq!(mapped.y, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn third_degree() {
        let points = tie_points(&[
            ((0.0, 2.0), (0.0, 3.0)),
            ((1.0, 2.0), (1.0, 2.0)),
            ((2.0, 2.0), (2.0, 2.0)),
            ((3.0, 2.0), (3.0, 3.0)),
            ((0.0, 1.0), (0.0, 2.0)),
            ((1.0, 1.0), (1.0, 1.0)),
            ((2.0, 1.0), (2.0, 1.0)),
            ((0.0, 0.0), (0.0, 1.0)),
            ((1.0, 0.0), (1.0, 0.0)),
            ((2.0, 0.0), (2.0, 0.0)),
            ((3.0, 0.0), (3.0, 1.0)),
        ]);
        check_fit("ThirdDegreePolynomial", &points);
    }

    #[test]
    fn large_coordinates() {
        let points: Vec<_> = (0..4)
            .flat_map(|i| (0..4).map(move |j| (f64::from(i), f64::from(j))))
            .map(|(i, j)| {
                let source = Coord::xy(500_000.0 + i * 1000.0, 7_000_000.0 + j * 1000.0);
                let target = Coord::xy(i * 10.0, j * 10.0 + i * i);
                TiePoint::new(source, target)
            })
            .collect();

        let transformation = ThirdDegreePolynomial::fit(&points).unwrap();
        assert!(transformation.max_direct_error(&points) < 1e-6);
        assert!(transformation.max_inverse_error(&points) < 1e-3);
    }
}
