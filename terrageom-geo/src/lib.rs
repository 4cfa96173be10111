//! [`PredicateEngine`] backed by the [`geo`] crate.
//!
//! Geometries cross the boundary as WKB and are decoded into `geo` types with `geozero`.
//! The engine works in the plane with `x` and `y` only.
//!
//! ```
//! use terrageom_types::Geometry;
//!
//! terrageom_geo::GeoEngine::install();
//!
//! let square = Geometry::from_wkt("POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))").unwrap();
//! let point = Geometry::from_wkt("POINT (5 5)").unwrap();
//! assert!(square.contains(&point).unwrap());
//! ```

use std::sync::Arc;

use geo::relate::IntersectionMatrix;
use geo::{
    BooleanOps, ConvexHull, CoordsIter, Distance, Euclidean, MultiPoint, MultiPolygon, Relate,
    Validation,
};
use terrageom_types::engine::{self, BufferParams, OverlayOp, PredicateEngine};
use terrageom_types::relation::SpatialRelation;
use terrageom_types::{Geometry, GeometryError};

mod buffer;

mod convert;
pub use convert::{from_geo, to_geo};

const DE9IM_DIMENSIONS: [char; 4] = ['F', '0', '1', '2'];

/// Planar geometry engine using the algorithms of the `geo` crate.
#[derive(Debug, Default, Copy, Clone)]
pub struct GeoEngine;

impl GeoEngine {
    /// Installs the engine for all geometry predicates and operations of the process.
    pub fn install() {
        engine::install(Arc::new(GeoEngine));
    }

    fn relate(&self, a: &Geometry, b: &Geometry) -> Result<IntersectionMatrix, GeometryError> {
        Ok(to_geo(a)?.relate(&to_geo(b)?))
    }
}

fn matches(matrix: &IntersectionMatrix, pattern: &str) -> Result<bool, GeometryError> {
    matrix
        .matches(pattern)
        .map_err(|err| GeometryError::InvalidRelation(format!("{pattern}: {err:?}")))
}

fn to_multi_polygon(geometry: geo::Geometry<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
    match geometry {
        geo::Geometry::Polygon(polygon) => Ok(MultiPolygon(vec![polygon])),
        geo::Geometry::MultiPolygon(multi_polygon) => Ok(multi_polygon),
        geo::Geometry::Rect(rect) => Ok(MultiPolygon(vec![rect.to_polygon()])),
        geo::Geometry::Triangle(triangle) => Ok(MultiPolygon(vec![triangle.to_polygon()])),
        _ => Err(GeometryError::Unsupported(
            "overlay is supported for polygonal geometries only".to_string(),
        )),
    }
}

impl PredicateEngine for GeoEngine {
    fn name(&self) -> &str {
        "geo"
    }

    fn predicate(
        &self,
        relation: SpatialRelation,
        a: &Geometry,
        b: &Geometry,
    ) -> Result<bool, GeometryError> {
        let matrix = self.relate(a, b)?;
        Ok(match relation {
            SpatialRelation::Intersects => matrix.is_intersects(),
            SpatialRelation::Disjoint => matrix.is_disjoint(),
            SpatialRelation::Touches => matrix.is_touches(),
            SpatialRelation::Overlaps => matrix.is_overlaps(),
            SpatialRelation::Crosses => matrix.is_crosses(),
            SpatialRelation::Within => matrix.is_within(),
            SpatialRelation::Contains => matrix.is_contains(),
            SpatialRelation::Covers => matrix.is_covers(),
            SpatialRelation::CoveredBy => matrix.is_coveredby(),
            SpatialRelation::Equals => matrix.is_equal_topo(),
        })
    }

    fn relate_matrix(&self, a: &Geometry, b: &Geometry) -> Result<String, GeometryError> {
        let matrix = self.relate(a, b)?;

        let mut result = String::with_capacity(9);
        for cell in 0..9 {
            let mut value = None;
            for dimension in DE9IM_DIMENSIONS {
                let pattern: String = (0..9)
                    .map(|i| if i == cell { dimension } else { '*' })
                    .collect();
                if matches(&matrix, &pattern)? {
                    value = Some(dimension);
                    break;
                }
            }

            result.push(value.ok_or_else(|| {
                GeometryError::Engine(format!("cell {cell} of intersection matrix is undefined"))
            })?);
        }

        Ok(result)
    }

    fn relate_pattern(
        &self,
        a: &Geometry,
        b: &Geometry,
        pattern: &str,
    ) -> Result<bool, GeometryError> {
        matches(&self.relate(a, b)?, pattern)
    }

    fn distance(&self, a: &Geometry, b: &Geometry) -> Result<f64, GeometryError> {
        Ok(Euclidean.distance(&to_geo(a)?, &to_geo(b)?))
    }

    fn overlay(
        &self,
        op: OverlayOp,
        a: &Geometry,
        b: &Geometry,
    ) -> Result<Geometry, GeometryError> {
        let a = to_multi_polygon(to_geo(a)?)?;
        let b = to_multi_polygon(to_geo(b)?)?;

        let result = match op {
            OverlayOp::Intersection => a.intersection(&b),
            OverlayOp::Union => a.union(&b),
            OverlayOp::Difference => a.difference(&b),
            OverlayOp::SymDifference => a.xor(&b),
        };
        log::trace!("{op:?} produced {} polygons", result.0.len());

        from_geo(&geo::Geometry::MultiPolygon(result))
    }

    fn buffer(
        &self,
        geometry: &Geometry,
        params: &BufferParams,
    ) -> Result<Geometry, GeometryError> {
        let buffered = buffer::buffer(&to_geo(geometry)?, params);
        from_geo(&geo::Geometry::MultiPolygon(buffered))
    }

    fn convex_hull(&self, geometry: &Geometry) -> Result<Geometry, GeometryError> {
        let points: MultiPoint<f64> = to_geo(geometry)?
            .coords_iter()
            .map(geo::Point::from)
            .collect();
        from_geo(&geo::Geometry::Polygon(points.convex_hull()))
    }

    fn is_valid(&self, geometry: &Geometry) -> Result<bool, GeometryError> {
        Ok(to_geo(geometry)?.is_valid())
    }
}
