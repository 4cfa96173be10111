use crate::engine::{self, BufferParams, OverlayOp, PredicateEngine};
use crate::error::GeometryError;
use crate::geom_type::GeomKind;
use crate::geometry::{Geom, Geometry};
use crate::relation::SpatialRelation;

const DE9IM_PATTERN_SYMBOLS: &str = "TF*012";

/// Topological predicates and operations evaluated by the current [`PredicateEngine`].
///
/// Pairwise methods fail with [`GeometryError::UnsupportedGeometryCollection`] if either operand is
/// a geometry collection with members of different kinds, and with
/// [`GeometryError::SridMismatch`] if the operands have different SRIDs. Both checks are done
/// before the engine is looked up.
impl Geometry {
    /// Returns true if the geometry is a geometry collection with members of different kinds.
    ///
    /// Nested geometry collections are looked through: their members count as members of the
    /// outer collection.
    pub fn is_heterogeneous_collection(&self) -> bool {
        if self.geom_type.kind() != GeomKind::GeometryCollection {
            return false;
        }

        let mut first = None;
        !self.member_kinds_agree(&mut first)
    }

    fn member_kinds_agree(&self, first: &mut Option<GeomKind>) -> bool {
        let kind = self.geom_type.kind();
        match &self.geom {
            Geom::Collection(collection) if kind == GeomKind::GeometryCollection => collection
                .iter()
                .all(|member| member.member_kinds_agree(first)),
            _ => *first.get_or_insert(kind) == kind,
        }
    }

    fn check_operands(&self, rhs: &Geometry) -> Result<(), GeometryError> {
        if self.is_heterogeneous_collection() || rhs.is_heterogeneous_collection() {
            return Err(GeometryError::UnsupportedGeometryCollection);
        }

        if self.srid != rhs.srid {
            return Err(GeometryError::SridMismatch {
                left: self.srid,
                right: rhs.srid,
            });
        }

        Ok(())
    }

    fn pairwise<T>(
        &self,
        rhs: &Geometry,
        op: impl FnOnce(&dyn PredicateEngine) -> Result<T, GeometryError>,
    ) -> Result<T, GeometryError> {
        self.check_operands(rhs)?;
        let engine = engine::current()?;
        op(engine.as_ref())
    }

    fn unary<T>(
        &self,
        op: impl FnOnce(&dyn PredicateEngine) -> Result<T, GeometryError>,
    ) -> Result<T, GeometryError> {
        let engine = engine::current()?;
        op(engine.as_ref())
    }

    fn with_srid_of(&self, mut result: Geometry) -> Geometry {
        result.set_srid(self.srid);
        result
    }

    /// Evaluates a named relation with `self` as the first operand.
    pub fn satisfies(
        &self,
        rhs: &Geometry,
        relation: SpatialRelation,
    ) -> Result<bool, GeometryError> {
        self.pairwise(rhs, |engine| engine.predicate(relation, self, rhs))
    }

    /// Topological equality.
    pub fn equals(&self, rhs: &Geometry) -> Result<bool, GeometryError> {
        self.satisfies(rhs, SpatialRelation::Equals)
    }

    /// Returns true if the geometries have no point in common.
    pub fn disjoint(&self, rhs: &Geometry) -> Result<bool, GeometryError> {
        self.satisfies(rhs, SpatialRelation::Disjoint)
    }

    /// Returns true if the geometries have at least one point in common.
    pub fn intersects(&self, rhs: &Geometry) -> Result<bool, GeometryError> {
        self.satisfies(rhs, SpatialRelation::Intersects)
    }

    /// Returns true if only the boundaries have points in common.
    pub fn touches(&self, rhs: &Geometry) -> Result<bool, GeometryError> {
        self.satisfies(rhs, SpatialRelation::Touches)
    }

    /// Crosses predicate.
    pub fn crosses(&self, rhs: &Geometry) -> Result<bool, GeometryError> {
        self.satisfies(rhs, SpatialRelation::Crosses)
    }

    /// Returns true if `self` lies inside `rhs`.
    pub fn within(&self, rhs: &Geometry) -> Result<bool, GeometryError> {
        self.satisfies(rhs, SpatialRelation::Within)
    }

    /// Returns true if `rhs` lies inside `self`.
    pub fn contains(&self, rhs: &Geometry) -> Result<bool, GeometryError> {
        self.satisfies(rhs, SpatialRelation::Contains)
    }

    /// Overlaps predicate.
    pub fn overlaps(&self, rhs: &Geometry) -> Result<bool, GeometryError> {
        self.satisfies(rhs, SpatialRelation::Overlaps)
    }

    /// Returns true if no point of `rhs` lies outside `self`.
    pub fn covers(&self, rhs: &Geometry) -> Result<bool, GeometryError> {
        self.satisfies(rhs, SpatialRelation::Covers)
    }

    /// Returns true if no point of `self` lies outside `rhs`.
    pub fn covered_by(&self, rhs: &Geometry) -> Result<bool, GeometryError> {
        self.satisfies(rhs, SpatialRelation::CoveredBy)
    }

    /// DE-9IM intersection matrix, e.g. `212101212`.
    pub fn relate(&self, rhs: &Geometry) -> Result<String, GeometryError> {
        self.pairwise(rhs, |engine| engine.relate_matrix(self, rhs))
    }

    /// Checks the DE-9IM intersection matrix against a pattern of nine `T`, `F`, `*`, `0`, `1` or
    /// `2` symbols.
    pub fn relate_pattern(&self, rhs: &Geometry, pattern: &str) -> Result<bool, GeometryError> {
        if pattern.len() != 9
            || !pattern
                .chars()
                .all(|c| DE9IM_PATTERN_SYMBOLS.contains(c.to_ascii_uppercase()))
        {
            return Err(GeometryError::InvalidRelation(format!(
                "invalid intersection matrix pattern {pattern:?}"
            )));
        }

        let pattern = pattern.to_ascii_uppercase();
        self.pairwise(rhs, |engine| engine.relate_pattern(self, rhs, &pattern))
    }

    /// Shortest distance between the geometries.
    pub fn distance(&self, rhs: &Geometry) -> Result<f64, GeometryError> {
        self.pairwise(rhs, |engine| engine.distance(self, rhs))
    }

    /// Returns true if the geometries are not farther from each other than `distance`.
    pub fn d_within(&self, rhs: &Geometry, distance: f64) -> Result<bool, GeometryError> {
        self.pairwise(rhs, |engine| engine.is_within_distance(self, rhs, distance))
    }

    /// Points in both geometries.
    pub fn intersection(&self, rhs: &Geometry) -> Result<Geometry, GeometryError> {
        self.overlay(rhs, OverlayOp::Intersection)
    }

    /// Points in any of the geometries.
    pub fn union(&self, rhs: &Geometry) -> Result<Geometry, GeometryError> {
        self.overlay(rhs, OverlayOp::Union)
    }

    /// Points of `self` that are not in `rhs`.
    pub fn difference(&self, rhs: &Geometry) -> Result<Geometry, GeometryError> {
        self.overlay(rhs, OverlayOp::Difference)
    }

    /// Points in exactly one of the geometries.
    pub fn sym_difference(&self, rhs: &Geometry) -> Result<Geometry, GeometryError> {
        self.overlay(rhs, OverlayOp::SymDifference)
    }

    fn overlay(&self, rhs: &Geometry, op: OverlayOp) -> Result<Geometry, GeometryError> {
        let result = self.pairwise(rhs, |engine| engine.overlay(op, self, rhs))?;
        Ok(self.with_srid_of(result))
    }

    /// Area within `distance` from the geometry.
    pub fn buffer(&self, distance: f64) -> Result<Geometry, GeometryError> {
        self.buffer_with(&BufferParams::new(distance))
    }

    /// Buffer with explicit parameters.
    pub fn buffer_with(&self, params: &BufferParams) -> Result<Geometry, GeometryError> {
        let result = self.unary(|engine| engine.buffer(self, params))?;
        Ok(self.with_srid_of(result))
    }

    /// Smallest convex polygon containing the geometry.
    pub fn convex_hull(&self) -> Result<Geometry, GeometryError> {
        let result = self.unary(|engine| engine.convex_hull(self))?;
        Ok(self.with_srid_of(result))
    }

    /// Combinatorial boundary.
    pub fn boundary(&self) -> Result<Geometry, GeometryError> {
        let result = self.unary(|engine| engine.boundary(self))?;
        Ok(self.with_srid_of(result))
    }

    /// OGC validity check.
    pub fn is_valid(&self) -> Result<bool, GeometryError> {
        self.unary(|engine| engine.is_valid(self))
    }

    /// Simplicity check.
    pub fn is_simple(&self) -> Result<bool, GeometryError> {
        self.unary(|engine| engine.is_simple(self))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use crate::engine::{testing::EnvelopeEngine, with_engine};
    use crate::envelope::Envelope;
    use crate::error::GeometryError;
    use crate::geometry::Geometry;
    use crate::relation::geom_from_envelope;

    fn rect(x_min: f64, y_min: f64, x_max: f64, y_max: f64, srid: i32) -> Geometry {
        geom_from_envelope(&Envelope::new(x_min, y_min, x_max, y_max), srid).unwrap()
    }

    fn mixed_collection() -> Geometry {
        Geometry::geometry_collection(
            vec![
                Geometry::point(0.0, 0.0, 4326),
                rect(0.0, 0.0, 1.0, 1.0, 4326),
            ],
            4326,
        )
    }

    #[test]
    fn heterogeneous_collection_is_rejected_before_engine_lookup() {
        let polygon = rect(0.0, 0.0, 1.0, 1.0, 4326);
        let collection = mixed_collection();

        assert_matches!(
            collection.intersects(&polygon),
            Err(GeometryError::UnsupportedGeometryCollection)
        );
        assert_matches!(
            polygon.union(&collection),
            Err(GeometryError::UnsupportedGeometryCollection)
        );
    }

    #[test]
    fn nested_heterogeneous_collection_is_rejected() {
        let nested = Geometry::geometry_collection(vec![mixed_collection()], 4326);
        let point = Geometry::point(0.0, 0.0, 4326);

        assert!(nested.is_heterogeneous_collection());
        assert_matches!(
            nested.intersects(&point),
            Err(GeometryError::UnsupportedGeometryCollection)
        );

        let split = Geometry::geometry_collection(
            vec![
                Geometry::geometry_collection(vec![Geometry::point(0.0, 0.0, 4326)], 4326),
                rect(0.0, 0.0, 1.0, 1.0, 4326),
            ],
            4326,
        );
        assert!(split.is_heterogeneous_collection());
    }

    #[test]
    fn nested_points_are_homogeneous() {
        let nested = Geometry::geometry_collection(
            vec![
                Geometry::geometry_collection(
                    vec![
                        Geometry::point(0.5, 0.5, 4326),
                        Geometry::point(0.6, 0.6, 4326),
                    ],
                    4326,
                ),
                Geometry::point(0.7, 0.7, 4326),
                Geometry::geometry_collection(vec![], 4326),
            ],
            4326,
        );
        assert!(!nested.is_heterogeneous_collection());
        assert!(!mixed_collection()
            .as_collection()
            .unwrap()
            .geometry_n(0)
            .unwrap()
            .is_heterogeneous_collection());
    }

    #[test]
    fn homogeneous_collection_is_accepted() {
        let points = Geometry::geometry_collection(
            vec![
                Geometry::point(0.5, 0.5, 4326),
                Geometry::point(0.7, 0.7, 4326),
            ],
            4326,
        );
        let polygon = rect(0.0, 0.0, 1.0, 1.0, 4326);

        with_engine(Arc::new(EnvelopeEngine), || {
            assert!(points.intersects(&polygon).unwrap());
        });
    }

    #[test]
    fn srid_mismatch_is_rejected() {
        let a = rect(0.0, 0.0, 1.0, 1.0, 4326);
        let b = rect(0.0, 0.0, 1.0, 1.0, 3857);
        assert_matches!(
            a.intersects(&b),
            Err(GeometryError::SridMismatch {
                left: 4326,
                right: 3857
            })
        );
    }

    #[test]
    fn no_engine_installed() {
        let a = rect(0.0, 0.0, 1.0, 1.0, 4326);
        assert_matches!(a.intersects(&a), Err(GeometryError::EngineUnavailable));
        assert_matches!(a.buffer(1.0), Err(GeometryError::EngineUnavailable));
    }

    #[test]
    fn predicates_are_delegated() {
        let outer = rect(0.0, 0.0, 10.0, 10.0, 4326);
        let inner = rect(2.0, 2.0, 3.0, 3.0, 4326);
        let far = rect(20.0, 0.0, 30.0, 10.0, 4326);

        with_engine(Arc::new(EnvelopeEngine), || {
            assert!(outer.contains(&inner).unwrap());
            assert!(inner.within(&outer).unwrap());
            assert!(outer.covers(&inner).unwrap());
            assert!(outer.disjoint(&far).unwrap());
            assert!(!outer.intersects(&far).unwrap());
            assert_eq!(outer.distance(&far).unwrap(), 10.0);
            assert!(outer.d_within(&far, 10.0).unwrap());
            assert!(!outer.d_within(&far, 9.9).unwrap());
            assert_eq!(outer.relate(&inner).unwrap(), "2FFF1FFF2");
            assert!(outer.relate_pattern(&inner, "t*f**fff*").unwrap());
        });
    }

    #[test]
    fn invalid_relate_pattern() {
        let a = rect(0.0, 0.0, 1.0, 1.0, 4326);
        assert_matches!(
            a.relate_pattern(&a, "T*F"),
            Err(GeometryError::InvalidRelation(_))
        );
        assert_matches!(
            a.relate_pattern(&a, "T*F**FFX*"),
            Err(GeometryError::InvalidRelation(_))
        );
    }

    #[test]
    fn results_get_the_receiver_srid() {
        let a = rect(0.0, 0.0, 2.0, 2.0, 4326);
        let b = rect(1.0, 1.0, 3.0, 3.0, 4326);

        with_engine(Arc::new(EnvelopeEngine), || {
            let intersection = a.intersection(&b).unwrap();
            assert_eq!(intersection.srid(), 4326);
            assert_eq!(intersection.mbr(), Envelope::new(1.0, 1.0, 2.0, 2.0));

            let buffer = a.buffer(1.0).unwrap();
            assert_eq!(buffer.srid(), 4326);
            assert_eq!(buffer.mbr(), Envelope::new(-1.0, -1.0, 3.0, 3.0));

            assert_eq!(a.convex_hull().unwrap().srid(), 4326);
        });
    }

    #[test]
    fn unsupported_unary_operations() {
        let a = rect(0.0, 0.0, 2.0, 2.0, 4326);
        with_engine(Arc::new(EnvelopeEngine), || {
            assert_matches!(a.is_valid(), Err(GeometryError::Unsupported(_)));
            assert_matches!(a.boundary(), Err(GeometryError::Unsupported(_)));
        });
    }
}
