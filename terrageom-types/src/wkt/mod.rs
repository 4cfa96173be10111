//! Well-known text (WKT) representation of geometries.
//!
//! The writer produces ISO WKT (`POINT Z (1 2 3)`, `POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))`).
//! Numbers use the shortest representation that reads back to the same value. Text is parsed with
//! the `wkt` crate, which accepts the same grammar case-insensitively and multipoint members
//! without parentheses. The outer type may also be given with attached dimensions (`POINTZ`) or as
//! a circular string, triangle, polyhedral surface or TIN.

use crate::error::GeometryError;
use crate::geometry::Geometry;

mod reader;
mod writer;

pub use writer::WktDisplay;

impl Geometry {
    /// WKT representation of the geometry.
    ///
    /// Fails with [`GeometryError::InvalidState`] if a collection has unfilled slots.
    pub fn as_text(&self) -> Result<String, GeometryError> {
        self.ensure_filled()?;
        Ok(WktDisplay(self).to_string())
    }

    /// Parses a geometry from WKT. The SRID of the result is [`UNKNOWN_SRID`](crate::UNKNOWN_SRID).
    ///
    /// Collections nested deeper than [`MAX_NESTING_DEPTH`](crate::MAX_NESTING_DEPTH) are
    /// rejected with [`GeometryError::Serialization`].
    pub fn from_wkt(wkt: &str) -> Result<Geometry, GeometryError> {
        let geometry = reader::read(wkt)?;
        log::debug!("Parsed {} from WKT", geometry.geom_type());

        Ok(geometry)
    }
}
