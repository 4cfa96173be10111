//! Geometric transformations between two planes, fitted to tie points.
//!
//! Every transformation implements [`GeometricTransformation`]: it maps coordinates from the
//! source plane to the target plane and back, and reports how well it matches the tie points it
//! was fitted to. Transformations can also be created by name with [`fit_transformation`].
//!
//! ```
//! use terrageom_types::Coord;
//! use terrageom_types::transformation::{fit_transformation, GeometricTransformation, TiePoint};
//!
//! let tie_points = [
//!     TiePoint::new(Coord::xy(0.0, 0.0), Coord::xy(10.0, 10.0)),
//!     TiePoint::new(Coord::xy(1.0, 0.0), Coord::xy(11.0, 10.0)),
//! ];
//! let rst = fit_transformation("RST", &tie_points).unwrap();
//! let mapped = rst.direct_map(&Coord::xy(0.0, 1.0)).unwrap();
//! assert!((mapped.x - 10.0).abs() < 1e-9 && (mapped.y - 11.0).abs() < 1e-9);
//! ```
//!
//! `z` and `m` are passed through by all transformations.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::error::GeometryError;
use crate::geometry::Geometry;

mod affine;
mod polynomial;
mod projective;
mod rst;

pub use affine::{AffineDecomposition, AffineTransform};
pub use polynomial::{PolynomialTransform, SecondDegreePolynomial, ThirdDegreePolynomial};
pub use projective::ProjectiveTransform;
pub use rst::RstTransform;

/// Pair of corresponding positions in the source and target planes.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TiePoint {
    /// Position in the source plane.
    pub source: Coord,
    /// Position in the target plane.
    pub target: Coord,
}

impl TiePoint {
    /// Creates a new tie point.
    pub fn new(source: Coord, target: Coord) -> Self {
        Self { source, target }
    }

    /// Tie point with source and target swapped.
    pub fn swapped(&self) -> Self {
        Self::new(self.target, self.source)
    }
}

/// Mapping between a source and a target plane.
pub trait GeometricTransformation: Send + Sync {
    /// Name the transformation is created with by [`fit_transformation`].
    fn name(&self) -> &'static str;

    /// Least squares fit to the tie points.
    ///
    /// Fails with [`GeometryError::InvalidState`] if there are fewer tie points than the
    /// transformation needs, or they do not determine it.
    fn fit(tie_points: &[TiePoint]) -> Result<Self, GeometryError>
    where
        Self: Sized;

    /// Maps a source coordinate to the target plane, `None` if it has no image.
    fn direct_map(&self, coord: &Coord) -> Option<Coord>;

    /// Maps a target coordinate back to the source plane, `None` if it has no image.
    fn inverse_map(&self, coord: &Coord) -> Option<Coord>;

    /// Root mean square distance between mapped source positions and target positions.
    fn direct_rmse(&self, tie_points: &[TiePoint]) -> f64 {
        rmse(tie_points.iter().map(|tie_point| self.direct_error(tie_point)))
    }

    /// Root mean square distance between mapped target positions and source positions.
    fn inverse_rmse(&self, tie_points: &[TiePoint]) -> f64 {
        rmse(tie_points.iter().map(|tie_point| self.inverse_error(tie_point)))
    }

    /// Largest distance between a mapped source position and its target position.
    fn max_direct_error(&self, tie_points: &[TiePoint]) -> f64 {
        tie_points
            .iter()
            .map(|tie_point| self.direct_error(tie_point))
            .fold(0.0, f64::max)
    }

    /// Largest distance between a mapped target position and its source position.
    fn max_inverse_error(&self, tie_points: &[TiePoint]) -> f64 {
        tie_points
            .iter()
            .map(|tie_point| self.inverse_error(tie_point))
            .fold(0.0, f64::max)
    }

    /// Distance between the mapped source position of the tie point and its target position.
    ///
    /// Infinite if the source position has no image.
    fn direct_error(&self, tie_point: &TiePoint) -> f64 {
        self.direct_map(&tie_point.source)
            .map_or(f64::INFINITY, |mapped| distance(&mapped, &tie_point.target))
    }

    /// Distance between the mapped target position of the tie point and its source position.
    fn inverse_error(&self, tie_point: &TiePoint) -> f64 {
        self.inverse_map(&tie_point.target)
            .map_or(f64::INFINITY, |mapped| distance(&mapped, &tie_point.source))
    }
}

/// Fits the transformation with the given name to the tie points.
///
/// Known names are `Affine`, `RST`, `SecondDegreePolynomial`, `ThirdDegreePolynomial` and
/// `Projective`.
pub fn fit_transformation(
    name: &str,
    tie_points: &[TiePoint],
) -> Result<Box<dyn GeometricTransformation>, GeometryError> {
    Ok(match name {
        affine::NAME => Box::new(AffineTransform::fit(tie_points)?),
        rst::NAME => Box::new(RstTransform::fit(tie_points)?),
        polynomial::SECOND_DEGREE_NAME => Box::new(SecondDegreePolynomial::fit(tie_points)?),
        polynomial::THIRD_DEGREE_NAME => Box::new(ThirdDegreePolynomial::fit(tie_points)?),
        projective::NAME => Box::new(ProjectiveTransform::fit(tie_points)?),
        _ => {
            return Err(GeometryError::InvalidState(format!(
                "unknown geometric transformation {name}"
            )))
        }
    })
}

impl Geometry {
    /// Maps every coordinate to the target plane of the transformation. The SRID is kept.
    ///
    /// Fails with [`GeometryError::InvalidState`] if a coordinate has no image, the geometry is
    /// left unchanged in that case.
    pub fn apply_transformation<T>(&mut self, transformation: &T) -> Result<(), GeometryError>
    where
        T: GeometricTransformation + ?Sized,
    {
        let mut mapped = self.clone();
        mapped.try_for_each_coord_mut(&mut |coord| {
            *coord = transformation.direct_map(coord).ok_or_else(|| {
                GeometryError::InvalidState(format!(
                    "coordinate ({}, {}) has no image under the {} transformation",
                    coord.x,
                    coord.y,
                    transformation.name()
                ))
            })?;
            Ok::<(), GeometryError>(())
        })?;
        *self = mapped;

        Ok(())
    }
}

fn distance(a: &Coord, b: &Coord) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

fn rmse(errors: impl Iterator<Item = f64>) -> f64 {
    let (count, sum) = errors.fold((0usize, 0.0), |(count, sum), error| {
        (count + 1, sum + error * error)
    });
    if count == 0 {
        return 0.0;
    }

    (sum / count as f64).sqrt()
}

fn check_count(
    name: &str,
    tie_points: &[TiePoint],
    required: usize,
) -> Result<(), GeometryError> {
    if tie_points.len() < required {
        return Err(GeometryError::InvalidState(format!(
            "at least {required} tie points are required for the {name} transformation, got {}",
            tie_points.len()
        )));
    }

    Ok(())
}

/// Solves `design * x = rhs` in the least squares sense.
///
/// With `full_rank` set, fails if the columns of `design` are not independent. Otherwise the
/// minimal norm solution is returned.
fn least_squares(
    name: &str,
    design: DMatrix<f64>,
    rhs: DMatrix<f64>,
    full_rank: bool,
) -> Result<DMatrix<f64>, GeometryError> {
    let unknowns = design.ncols();
    let svd = design.svd(true, true);
    let eps = svd.singular_values.max() * 1e-12;
    if full_rank && svd.rank(eps) < unknowns {
        return Err(GeometryError::InvalidState(format!(
            "tie points do not determine the {name} transformation"
        )));
    }

    svd.solve(&rhs, eps)
        .map_err(|err| GeometryError::InvalidState(format!("{name} fit failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom_type::GeomType;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    // `assert_matches!` needs `Debug` on the `Ok` side of `fit_transformation`'s result.
    impl std::fmt::Debug for dyn GeometricTransformation {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.name())
        }
    }

    /// Fits the named transformation and checks it reproduces the tie points both ways.
    pub(super) fn check_fit(
        name: &str,
        tie_points: &[TiePoint],
    ) -> Box<dyn GeometricTransformation> {
        let transformation = fit_transformation(name, tie_points).unwrap();
        assert_eq!(transformation.name(), name);
        assert!(transformation.max_direct_error(tie_points) <= 1e-5);
        assert!(transformation.max_inverse_error(tie_points) <= 1e-5);
        assert!(transformation.direct_rmse(tie_points) <= 1e-5);
        assert!(transformation.inverse_rmse(tie_points) <= 1e-5);
        transformation
    }

    pub(super) fn tie_points(pairs: &[((f64, f64), (f64, f64))]) -> Vec<TiePoint> {
        pairs
            .iter()
            .map(|&((sx, sy), (tx, ty))| TiePoint::new(Coord::xy(sx, sy), Coord::xy(tx, ty)))
            .collect()
    }

    #[test]
    fn unknown_name_is_rejected() {
        let points = tie_points(&[((0.0, 0.0), (0.0, 0.0)), ((1.0, 0.0), (1.0, 0.0))]);
        assert_matches!(
            fit_transformation("Helmert", &points),
            Err(GeometryError::InvalidState(_))
        );
    }

    #[test]
    fn too_few_tie_points() {
        let points = tie_points(&[
            ((0.0, 0.0), (0.0, 0.0)),
            ((1.0, 0.0), (1.0, 0.0)),
            ((0.0, 1.0), (0.0, 1.0)),
        ]);
        for name in ["Projective", "SecondDegreePolynomial", "ThirdDegreePolynomial"] {
            assert_matches!(
                fit_transformation(name, &points),
                Err(GeometryError::InvalidState(_))
            );
        }
        assert!(fit_transformation("Affine", &points).is_ok());
        assert!(fit_transformation("RST", &points[..2]).is_ok());
        assert!(fit_transformation("RST", &points[..1]).is_err());
    }

    #[test]
    fn apply_to_geometry_keeps_srid() {
        let transformation = fit_transformation(
            "RST",
            &tie_points(&[((0.0, 0.0), (5.0, 5.0)), ((1.0, 0.0), (5.0, 6.0))]),
        )
        .unwrap();

        let mut geometry = Geometry::collection(
            GeomType::MULTI_POINT,
            vec![Geometry::point(0.0, 0.0, 3857), Geometry::point(2.0, 0.0, 3857)],
            3857,
        )
        .unwrap();
        let _ = geometry.mbr();

        geometry.apply_transformation(transformation.as_ref()).unwrap();
        assert!(!geometry.has_cached_mbr());
        assert_eq!(geometry.srid(), 3857);
        let mbr = geometry.mbr();
        assert_abs_diff_eq!(mbr.x_min(), 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mbr.x_max(), 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mbr.y_min(), 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mbr.y_max(), 7.0, epsilon = 1e-9);
    }

    #[test]
    fn failed_apply_leaves_geometry_unchanged() {
        let transformation =
            ProjectiveTransform::new([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, -0.5]).unwrap();
        let before = Geometry::line_string(vec![Coord::xy(0.5, 0.5), Coord::xy(3.0, 2.0)], 0);
        let mut line = before.clone();
        assert_matches!(
            line.apply_transformation(&transformation),
            Err(GeometryError::InvalidState(_))
        );
        assert_eq!(line, before);
    }
}
