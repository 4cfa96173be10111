//! Well-known binary (WKB) encoding of geometries.
//!
//! Geometries are written with ISO type codes (`1001` for `POINT Z` etc.) in the byte order chosen
//! by the caller. The reader detects the byte order of every (nested) geometry from its marker and
//! also accepts PostGIS extended WKB, where dimensions and an optional SRID are given with the
//! `0x80000000`, `0x40000000` and `0x20000000` flags of the type code.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::geometry::Geometry;

mod reader;
mod writer;

/// Byte order of numbers in WKB.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    /// XDR, marker `0`.
    BigEndian,
    /// NDR, marker `1`.
    LittleEndian,
}

impl ByteOrder {
    /// Byte order of the current machine.
    pub fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }

    /// WKB byte order marker.
    pub fn marker(&self) -> u8 {
        match self {
            ByteOrder::BigEndian => 0,
            ByteOrder::LittleEndian => 1,
        }
    }

    /// Byte order of the given marker.
    pub fn from_marker(marker: u8) -> Result<Self, GeometryError> {
        match marker {
            0 => Ok(ByteOrder::BigEndian),
            1 => Ok(ByteOrder::LittleEndian),
            other => Err(GeometryError::Serialization(format!(
                "invalid WKB byte order marker {other}"
            ))),
        }
    }
}

impl Geometry {
    /// Exact number of bytes [`Geometry::to_wkb`] produces.
    pub fn wkb_size(&self) -> usize {
        writer::wkb_size(self)
    }

    /// Encodes the geometry as WKB.
    ///
    /// Fails with [`GeometryError::InvalidState`] if a collection has unfilled slots.
    pub fn to_wkb(&self, byte_order: ByteOrder) -> Result<Vec<u8>, GeometryError> {
        self.ensure_filled()?;

        let mut buf = Vec::with_capacity(self.wkb_size());
        writer::write_geometry(self, &mut buf, byte_order)?;

        Ok(buf)
    }

    /// WKB in the byte order of the current machine.
    pub fn as_binary(&self) -> Result<Vec<u8>, GeometryError> {
        self.to_wkb(ByteOrder::native())
    }

    /// Writes WKB into the provided buffer and returns the number of bytes written.
    ///
    /// Fails with [`GeometryError::Serialization`] if the buffer is shorter than
    /// [`Geometry::wkb_size`].
    pub fn write_wkb(&self, out: &mut [u8], byte_order: ByteOrder) -> Result<usize, GeometryError> {
        self.ensure_filled()?;

        let size = self.wkb_size();
        if out.len() < size {
            return Err(GeometryError::Serialization(format!(
                "WKB buffer too small: {size} bytes required, {} available",
                out.len()
            )));
        }

        let mut buf = &mut out[..size];
        writer::write_geometry(self, &mut buf, byte_order)?;

        Ok(size)
    }

    /// Decodes a geometry from WKB or extended WKB.
    ///
    /// The SRID of the result is [`UNKNOWN_SRID`](crate::UNKNOWN_SRID) unless the input is extended
    /// WKB carrying one.
    pub fn from_wkb(bytes: &[u8]) -> Result<Geometry, GeometryError> {
        let mut buf = bytes;
        let geometry = reader::read_geometry(&mut buf, 0)?;

        if !buf.is_empty() {
            log::warn!("Ignoring {} bytes after the end of WKB geometry", buf.len());
        }

        log::debug!(
            "Decoded {} from {} bytes of WKB",
            geometry.geom_type(),
            bytes.len() - buf.len()
        );

        Ok(geometry)
    }

    /// WKB as an upper case hex string.
    pub fn to_hex_wkb(&self, byte_order: ByteOrder) -> Result<String, GeometryError> {
        Ok(hex::encode_upper(self.to_wkb(byte_order)?))
    }

    /// Decodes a geometry from a hex encoded WKB or extended WKB string.
    pub fn from_hex_wkb(hex_wkb: &str) -> Result<Geometry, GeometryError> {
        let bytes = hex::decode(hex_wkb.trim())?;
        Self::from_wkb(&bytes)
    }
}
