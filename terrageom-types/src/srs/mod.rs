//! Spatial reference systems and coordinate transformation between them.
//!
//! Geometries refer to their reference system by SRID only. A [`SrsRegistry`] holds the
//! projections between pairs of SRIDs and is used by [`Geometry::transform_with`]. The
//! process-wide registry used by [`Geometry::transform`] contains EPSG:4326 ↔ EPSG:3857 by
//! default and can be extended with [`register`].
//!
//! Geographic coordinates are given as `x = longitude`, `y = latitude` in degrees.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::{RwLock, RwLockReadGuard};

use crate::coord::Coord;
use crate::error::GeometryError;
use crate::geometry::{Geometry, UNKNOWN_SRID};

mod web_mercator;
pub use web_mercator::WebMercator;

#[cfg(feature = "geodesy")]
mod geodesy;
#[cfg(feature = "geodesy")]
pub use geodesy::GeodesyProjection;

/// SRID of WGS84 longitude/latitude.
pub const EPSG_WGS84: i32 = 4326;
/// SRID of spherical Web Mercator.
pub const EPSG_WEB_MERCATOR: i32 = 3857;

/// Converts coordinates from one reference system to another and back.
///
/// Ordinates other than `x` and `y` are passed through.
pub trait Projection: Send + Sync {
    /// Projects a coordinate, `None` if it has no image in the target system.
    fn project(&self, input: &Coord) -> Option<Coord>;
    /// Inverse of [`Projection::project`].
    fn unproject(&self, input: &Coord) -> Option<Coord>;
}

/// Projection with `project` and `unproject` swapped.
pub struct InvertedProjection {
    inner: Arc<dyn Projection>,
}

impl InvertedProjection {
    /// Inverts the given projection.
    pub fn new(inner: Arc<dyn Projection>) -> Self {
        Self { inner }
    }
}

impl Projection for InvertedProjection {
    fn project(&self, input: &Coord) -> Option<Coord> {
        self.inner.unproject(input)
    }

    fn unproject(&self, input: &Coord) -> Option<Coord> {
        self.inner.project(input)
    }
}

/// Projections between pairs of SRIDs.
#[derive(Clone)]
pub struct SrsRegistry {
    projections: HashMap<(i32, i32), Arc<dyn Projection>>,
}

impl SrsRegistry {
    /// Registry without any projections.
    pub fn empty() -> Self {
        Self {
            projections: HashMap::new(),
        }
    }

    /// Registers `projection` from `from` to `to`, and its inverse from `to` to `from`.
    ///
    /// Replaces projections registered earlier for the same pairs.
    pub fn register(&mut self, from: i32, to: i32, projection: Arc<dyn Projection>) {
        log::debug!("Registering projection {from} -> {to}");
        self.projections.insert(
            (to, from),
            Arc::new(InvertedProjection::new(projection.clone())),
        );
        self.projections.insert((from, to), projection);
    }

    /// Projection from `from` to `to`.
    pub fn get(&self, from: i32, to: i32) -> Option<Arc<dyn Projection>> {
        self.projections.get(&(from, to)).cloned()
    }

    /// Returns true if coordinates can be transformed from `from` to `to`.
    pub fn contains(&self, from: i32, to: i32) -> bool {
        self.projections.contains_key(&(from, to))
    }
}

impl Default for SrsRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(
            EPSG_WGS84,
            EPSG_WEB_MERCATOR,
            Arc::new(WebMercator::default()),
        );

        registry
    }
}

impl std::fmt::Debug for SrsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut pairs: Vec<_> = self.projections.keys().collect();
        pairs.sort();
        f.debug_struct("SrsRegistry").field("pairs", &pairs).finish()
    }
}

static GLOBAL_REGISTRY: LazyLock<RwLock<SrsRegistry>> =
    LazyLock::new(|| RwLock::new(SrsRegistry::default()));

/// Process-wide registry used by [`Geometry::transform`].
pub fn global() -> RwLockReadGuard<'static, SrsRegistry> {
    GLOBAL_REGISTRY.read()
}

/// Registers a projection in the process-wide registry.
pub fn register(from: i32, to: i32, projection: Arc<dyn Projection>) {
    GLOBAL_REGISTRY.write().register(from, to, projection);
}

impl Geometry {
    /// Transforms the coordinates to the reference system `target_srid` using the process-wide
    /// registry.
    ///
    /// See [`Geometry::transform_with`].
    pub fn transform(&mut self, target_srid: i32) -> Result<(), GeometryError> {
        if self.srid() == target_srid {
            return Ok(());
        }

        let projection = global().get(self.srid(), target_srid);
        self.project(projection, target_srid)
    }

    /// Transforms the coordinates to the reference system `target_srid`.
    ///
    /// Nothing happens if the geometry already has this SRID. Fails with
    /// [`GeometryError::Transform`] if the SRID is not set or the registry has no projection
    /// between the systems. A coordinate without an image in the target system fails the same
    /// way.
    /// On failure the geometry is left unchanged.
    pub fn transform_with(
        &mut self,
        registry: &SrsRegistry,
        target_srid: i32,
    ) -> Result<(), GeometryError> {
        if self.srid() == target_srid {
            return Ok(());
        }

        self.project(registry.get(self.srid(), target_srid), target_srid)
    }

    fn project(
        &mut self,
        projection: Option<Arc<dyn Projection>>,
        target_srid: i32,
    ) -> Result<(), GeometryError> {
        let from = self.srid();
        let error = || GeometryError::Transform {
            from,
            to: target_srid,
        };
        if from == UNKNOWN_SRID {
            return Err(error());
        }
        let projection = projection.ok_or_else(error)?;

        let mut projected = self.clone();
        projected.try_for_each_coord_mut(&mut |coord| {
            *coord = projection.project(coord).ok_or_else(error)?;
            Ok::<(), GeometryError>(())
        })?;
        projected.set_srid(target_srid);

        log::trace!(
            "Transformed {} from {} to {target_srid}",
            self.geometry_type(),
            from
        );
        *self = projected;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom_type::GeomType;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    struct Shift(f64);

    impl Projection for Shift {
        fn project(&self, input: &Coord) -> Option<Coord> {
            (input.x < 100.0).then(|| Coord {
                x: input.x + self.0,
                ..*input
            })
        }

        fn unproject(&self, input: &Coord) -> Option<Coord> {
            Some(Coord {
                x: input.x - self.0,
                ..*input
            })
        }
    }

    fn shift_registry() -> SrsRegistry {
        let mut registry = SrsRegistry::empty();
        registry.register(1, 2, Arc::new(Shift(10.0)));
        registry
    }

    #[test]
    fn register_adds_both_directions() {
        let registry = shift_registry();
        assert!(registry.contains(1, 2));
        assert!(registry.contains(2, 1));
        assert!(!registry.contains(1, 3));

        let back = registry.get(2, 1).unwrap();
        assert_eq!(back.project(&Coord::xy(15.0, 0.0)), Some(Coord::xy(5.0, 0.0)));
    }

    #[test]
    fn transform_cascades_srid_and_drops_cache() {
        let mut geometry = Geometry::collection(
            GeomType::MULTI_POINT,
            vec![Geometry::point(0.0, 0.0, 1), Geometry::point(1.0, 1.0, 1)],
            1,
        )
        .unwrap();
        let _ = geometry.mbr();
        assert!(geometry.has_cached_mbr());

        geometry.transform_with(&shift_registry(), 2).unwrap();
        assert_eq!(geometry.srid(), 2);
        assert!(!geometry.has_cached_mbr());
        for member in geometry.as_collection().unwrap().iter() {
            assert_eq!(member.srid(), 2);
        }
        assert_eq!(geometry.mbr().x_min(), 10.0);
        assert_eq!(geometry.mbr().x_max(), 11.0);
    }

    #[test]
    fn same_srid_is_noop() {
        let mut geometry = Geometry::point(1.0, 2.0, 5);
        geometry.transform_with(&SrsRegistry::empty(), 5).unwrap();
        assert_eq!(geometry, Geometry::point(1.0, 2.0, 5));
    }

    #[test]
    fn failed_transform_leaves_geometry_unchanged() {
        let registry = shift_registry();

        let mut unset = Geometry::point(1.0, 2.0, UNKNOWN_SRID);
        assert_matches!(
            unset.transform_with(&registry, 2),
            Err(GeometryError::Transform { from: -1, to: 2 })
        );

        let mut unknown_pair = Geometry::point(1.0, 2.0, 1);
        assert_matches!(
            unknown_pair.transform_with(&registry, 3),
            Err(GeometryError::Transform { from: 1, to: 3 })
        );

        let before =
            Geometry::line_string(vec![Coord::xy(0.0, 0.0), Coord::xy(200.0, 0.0)], 1);
        let mut line = before.clone();
        assert_matches!(
            line.transform_with(&registry, 2),
            Err(GeometryError::Transform { from: 1, to: 2 })
        );
        assert_eq!(line, before);
    }

    #[test]
    fn transform_with_global_registry() {
        let mut geometry = Geometry::point_z(180.0, 0.0, 12.0, EPSG_WGS84);
        geometry.transform(EPSG_WEB_MERCATOR).unwrap();

        let point = geometry.as_point().unwrap();
        assert_abs_diff_eq!(point.x(), 20_037_508.342789244, epsilon = 1e-6);
        assert_abs_diff_eq!(point.y(), 0.0, epsilon = 1e-6);
        assert_eq!(point.z(), 12.0);

        geometry.transform(EPSG_WGS84).unwrap();
        assert_abs_diff_eq!(geometry.as_point().unwrap().x(), 180.0, epsilon = 1e-9);
    }

    #[test]
    fn register_in_global_registry() {
        register(9001, 9002, Arc::new(Shift(1.0)));
        assert!(global().contains(9002, 9001));

        let mut geometry = Geometry::point(1.0, 1.0, 9002);
        geometry.transform(9001).unwrap();
        assert_eq!(geometry, Geometry::point(0.0, 1.0, 9001));
    }
}
