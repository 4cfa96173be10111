//! Named spatial relations and helpers built on top of them.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::error::GeometryError;
use crate::geom_type::GeomType;
use crate::geometry::{Geom, Geometry, LineString, Polygon};

/// Spatial relation between two geometries.
///
/// The discriminants are bit flags, so that sets of relations can be stored as a mask.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum SpatialRelation {
    /// The geometries have at least one point in common.
    Intersects = 1,
    /// The geometries have no point in common.
    Disjoint = 2,
    /// Only the boundaries have points in common.
    Touches = 4,
    /// Interiors intersect and the intersection has the dimension of the geometries.
    Overlaps = 8,
    /// Interiors intersect and the intersection has a lower dimension.
    Crosses = 16,
    /// The first geometry is inside the second one.
    Within = 32,
    /// The second geometry is inside the first one.
    Contains = 64,
    /// No point of the second geometry lies outside the first one.
    Covers = 128,
    /// No point of the first geometry lies outside the second one.
    CoveredBy = 256,
    /// The geometries are topologically equal.
    Equals = 512,
}

impl SpatialRelation {
    /// All relations.
    pub const ALL: [SpatialRelation; 10] = [
        SpatialRelation::Intersects,
        SpatialRelation::Disjoint,
        SpatialRelation::Touches,
        SpatialRelation::Overlaps,
        SpatialRelation::Crosses,
        SpatialRelation::Within,
        SpatialRelation::Contains,
        SpatialRelation::Covers,
        SpatialRelation::CoveredBy,
        SpatialRelation::Equals,
    ];

    /// Bit flag of the relation.
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Lower case name, e.g. `coveredby`.
    pub fn name(&self) -> &'static str {
        match self {
            SpatialRelation::Intersects => "intersects",
            SpatialRelation::Disjoint => "disjoint",
            SpatialRelation::Touches => "touches",
            SpatialRelation::Overlaps => "overlaps",
            SpatialRelation::Crosses => "crosses",
            SpatialRelation::Within => "within",
            SpatialRelation::Contains => "contains",
            SpatialRelation::Covers => "covers",
            SpatialRelation::CoveredBy => "coveredby",
            SpatialRelation::Equals => "equals",
        }
    }
}

impl TryFrom<u32> for SpatialRelation {
    type Error = GeometryError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|relation| relation.code() == value)
            .ok_or_else(|| GeometryError::InvalidRelation(format!("unknown relation code {value}")))
    }
}

impl FromStr for SpatialRelation {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|relation| relation.name() == lower)
            .ok_or_else(|| GeometryError::InvalidRelation(format!("unknown relation {s:?}")))
    }
}

impl Display for SpatialRelation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Evaluates the relation between two geometries with the matching predicate.
pub fn satisfies_spatial_relation(
    a: &Geometry,
    b: &Geometry,
    relation: SpatialRelation,
) -> Result<bool, GeometryError> {
    match relation {
        SpatialRelation::Intersects => a.intersects(b),
        SpatialRelation::Disjoint => a.disjoint(b),
        SpatialRelation::Touches => a.touches(b),
        SpatialRelation::Overlaps => a.overlaps(b),
        SpatialRelation::Crosses => a.crosses(b),
        SpatialRelation::Within => a.within(b),
        SpatialRelation::Contains => a.contains(b),
        SpatialRelation::Covers => a.covers(b),
        SpatialRelation::CoveredBy => a.covered_by(b),
        SpatialRelation::Equals => a.equals(b),
    }
}

/// Same as [`satisfies_spatial_relation`] for a raw relation code.
///
/// Fails with [`GeometryError::InvalidRelation`] if the code is not exactly one of the relation
/// flags.
pub fn satisfies_spatial_relation_code(
    a: &Geometry,
    b: &Geometry,
    code: u32,
) -> Result<bool, GeometryError> {
    satisfies_spatial_relation(a, b, SpatialRelation::try_from(code)?)
}

/// Polygon covering the envelope.
///
/// The ring goes counter-clockwise starting from the lower left corner and is closed. Fails with
/// [`GeometryError::InvalidState`] for the empty envelope.
pub fn geom_from_envelope(envelope: &Envelope, srid: i32) -> Result<Geometry, GeometryError> {
    if envelope.is_empty() {
        return Err(GeometryError::InvalidState(
            "cannot build a polygon from an empty envelope".into(),
        ));
    }

    let [ll, lr, ur, ul] = envelope.into_quadrangle();
    let ring = LineString::new(vec![ll, lr, ur, ul, ll]);

    Geometry::with_mbr(
        GeomType::POLYGON,
        srid,
        Geom::Polygon(Polygon::from_exterior(ring)),
        *envelope,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coord;
    use crate::engine::{testing::EnvelopeEngine, with_engine};
    use assert_matches::assert_matches;
    use std::sync::Arc;

    #[test]
    fn relation_codes() {
        assert_eq!(SpatialRelation::Intersects.code(), 1);
        assert_eq!(SpatialRelation::Equals.code(), 512);
        assert_eq!(
            SpatialRelation::try_from(256).unwrap(),
            SpatialRelation::CoveredBy
        );
        assert_matches!(
            SpatialRelation::try_from(3),
            Err(GeometryError::InvalidRelation(_))
        );
        assert_matches!(
            SpatialRelation::try_from(0),
            Err(GeometryError::InvalidRelation(_))
        );
    }

    #[test]
    fn relation_names() {
        assert_eq!(
            "Contains".parse::<SpatialRelation>().unwrap(),
            SpatialRelation::Contains
        );
        assert_eq!(SpatialRelation::CoveredBy.to_string(), "coveredby");
        assert_matches!(
            "near".parse::<SpatialRelation>(),
            Err(GeometryError::InvalidRelation(_))
        );
    }

    #[test]
    fn polygon_from_envelope() {
        let polygon = geom_from_envelope(&Envelope::new(0.0, 0.0, 10.0, 10.0), 4326).unwrap();
        assert_eq!(polygon.srid(), 4326);
        assert_eq!(polygon.geom_type(), GeomType::POLYGON);

        let ring = polygon.as_polygon().unwrap().exterior().unwrap();
        assert_eq!(
            ring.coords(),
            &[
                Coord::xy(0.0, 0.0),
                Coord::xy(10.0, 0.0),
                Coord::xy(10.0, 10.0),
                Coord::xy(0.0, 10.0),
                Coord::xy(0.0, 0.0),
            ]
        );
        assert_eq!(
            polygon.as_text().unwrap(),
            "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))"
        );
    }

    #[test]
    fn polygon_from_empty_envelope_fails() {
        assert_matches!(
            geom_from_envelope(&Envelope::empty(), 4326),
            Err(GeometryError::InvalidState(_))
        );
    }

    #[test]
    fn relation_dispatch() {
        let a = geom_from_envelope(&Envelope::new(0.0, 0.0, 10.0, 10.0), 4326).unwrap();
        let b = geom_from_envelope(&Envelope::new(2.0, 2.0, 3.0, 3.0), 4326).unwrap();
        let far = geom_from_envelope(&Envelope::new(20.0, 20.0, 30.0, 30.0), 4326).unwrap();

        with_engine(Arc::new(EnvelopeEngine), || {
            assert!(satisfies_spatial_relation(&a, &b, SpatialRelation::Contains).unwrap());
            assert!(satisfies_spatial_relation(&b, &a, SpatialRelation::Within).unwrap());
            assert!(satisfies_spatial_relation(&a, &far, SpatialRelation::Disjoint).unwrap());
            assert!(!satisfies_spatial_relation_code(&a, &far, 1).unwrap());
            assert_matches!(
                satisfies_spatial_relation_code(&a, &b, 1024),
                Err(GeometryError::InvalidRelation(_))
            );
        });
    }
}
