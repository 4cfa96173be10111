//! Geometry data model of OGC simple features.
//!
//! A [`Geometry`] is a closed set of variants ([`Geom`]) tagged with a [`GeomType`] (kind and
//! coordinate dimensions) and an SRID. Geometries can be read from and written to WKB and WKT,
//! transformed between reference systems and compared with spatial predicates.
//!
//! This crate does not implement computational geometry. Predicates, overlays and metric
//! operations are delegated to a [`PredicateEngine`] that has to be installed with
//! [`engine::install`] (see the `terrageom-geo` crate for an implementation).
//!
//! ```
//! use terrageom_types::{Envelope, Geometry, geom_from_envelope};
//!
//! let polygon = geom_from_envelope(&Envelope::new(0.0, 0.0, 10.0, 10.0), 4326).unwrap();
//! assert_eq!(polygon.srid(), 4326);
//! assert_eq!(polygon.as_text().unwrap(), "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))");
//!
//! let parsed = Geometry::from_wkb(&polygon.as_binary().unwrap()).unwrap();
//! assert!(parsed.equals_exact(&polygon));
//! ```

mod coord;
pub mod engine;
mod envelope;
pub mod error;
pub mod geom_type;
mod geometry;
pub mod relation;
pub mod srs;
pub mod transformation;
pub mod wkb;
pub mod wkt;

pub use coord::Coord;
pub use engine::{BufferParams, CapStyle, OverlayOp, PredicateEngine};
pub use envelope::Envelope;
pub use error::GeometryError;
pub use geom_type::{
    coord_dimension, geom_type_from_name, is_geom_type_name, Dimensionality, Dimensions,
    GeomKind, GeomType,
};
pub use geometry::{
    Geom, Geometry, GeometryCollection, LineString, Point, Polygon, MAX_NESTING_DEPTH,
    UNKNOWN_SRID,
};
pub use relation::{
    geom_from_envelope, satisfies_spatial_relation, satisfies_spatial_relation_code,
    SpatialRelation,
};
pub use transformation::{fit_transformation, GeometricTransformation, TiePoint};
pub use wkb::ByteOrder;
