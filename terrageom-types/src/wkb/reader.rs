use bytes::Buf;

use crate::coord::Coord;
use crate::error::GeometryError;
use crate::geom_type::{Dimensions, GeomKind, GeomType};
use crate::geometry::{
    Geom, Geometry, GeometryCollection, LineString, Point, Polygon, MAX_NESTING_DEPTH,
    UNKNOWN_SRID,
};
use crate::wkb::ByteOrder;

const EWKB_Z_FLAG: u32 = 0x8000_0000;
const EWKB_M_FLAG: u32 = 0x4000_0000;
const EWKB_SRID_FLAG: u32 = 0x2000_0000;
const EWKB_FLAGS: u32 = EWKB_Z_FLAG | EWKB_M_FLAG | EWKB_SRID_FLAG;

/// Minimal encoded size of a nested geometry: byte order marker and type code.
const MIN_GEOMETRY_SIZE: usize = 5;

/// Reads a geometry nested `depth` collections deep.
pub(super) fn read_geometry(buf: &mut &[u8], depth: usize) -> Result<Geometry, GeometryError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(GeometryError::Serialization(format!(
            "WKB collections are nested deeper than {MAX_NESTING_DEPTH} levels"
        )));
    }

    ensure_remaining(buf, 1)?;
    let byte_order = ByteOrder::from_marker(buf.get_u8())?;

    let raw_type = get_u32(buf, byte_order)?;
    let mut geom_type = GeomType::from_code(raw_type & !EWKB_FLAGS)?;
    if raw_type & (EWKB_Z_FLAG | EWKB_M_FLAG) != 0 {
        geom_type = geom_type.with_dimensions(Dimensions::from_flags(
            geom_type.is_3d() || raw_type & EWKB_Z_FLAG != 0,
            geom_type.is_measured() || raw_type & EWKB_M_FLAG != 0,
        ));
    }

    let srid = if raw_type & EWKB_SRID_FLAG != 0 {
        Some(get_u32(buf, byte_order)? as i32)
    } else {
        None
    };

    let dimensions = geom_type.dimensions();
    let geom = match geom_type.kind() {
        GeomKind::Point => Geom::Point(Point::new(get_coord(buf, byte_order, dimensions)?)),
        GeomKind::LineString | GeomKind::CircularString => {
            Geom::LineString(read_line(buf, byte_order, dimensions)?)
        }
        GeomKind::Polygon | GeomKind::Triangle => {
            let count = get_count(buf, byte_order, 4)?;
            let rings = (0..count)
                .map(|_| read_line(buf, byte_order, dimensions))
                .collect::<Result<Vec<_>, _>>()?;
            Geom::Polygon(Polygon::new(rings))
        }
        kind if kind.is_collection() => {
            let count = get_count(buf, byte_order, MIN_GEOMETRY_SIZE)?;
            let members = (0..count)
                .map(|_| read_geometry(buf, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            Geom::Collection(GeometryCollection::new(members))
        }
        kind => {
            return Err(GeometryError::Serialization(format!(
                "{} geometries are not supported in WKB",
                kind.name()
            )))
        }
    };

    let mut geometry = Geometry::new(geom_type, UNKNOWN_SRID, geom)
        .map_err(|err| GeometryError::Serialization(format!("invalid WKB geometry: {err}")))?;

    if let Some(srid) = srid {
        geometry.set_srid(srid);
    }

    Ok(geometry)
}

fn read_line(
    buf: &mut &[u8],
    byte_order: ByteOrder,
    dimensions: Dimensions,
) -> Result<LineString, GeometryError> {
    let count = get_count(buf, byte_order, dimensions.size() * 8)?;
    (0..count)
        .map(|_| get_coord(buf, byte_order, dimensions))
        .collect()
}

fn get_coord(
    buf: &mut &[u8],
    byte_order: ByteOrder,
    dimensions: Dimensions,
) -> Result<Coord, GeometryError> {
    ensure_remaining(buf, dimensions.size() * 8)?;

    let x = get_f64(buf, byte_order);
    let y = get_f64(buf, byte_order);
    let coord = match dimensions {
        Dimensions::Xy => Coord::xy(x, y),
        Dimensions::Xyz => Coord::xyz(x, y, get_f64(buf, byte_order)),
        Dimensions::Xym => Coord::xym(x, y, get_f64(buf, byte_order)),
        Dimensions::Xyzm => {
            let z = get_f64(buf, byte_order);
            Coord::xyzm(x, y, z, get_f64(buf, byte_order))
        }
    };

    Ok(coord)
}

/// Reads an element count and checks that the buffer can hold that many elements of at least
/// `min_item_size` bytes.
fn get_count(
    buf: &mut &[u8],
    byte_order: ByteOrder,
    min_item_size: usize,
) -> Result<usize, GeometryError> {
    let count = get_u32(buf, byte_order)? as usize;
    if count.saturating_mul(min_item_size) > buf.remaining() {
        return Err(GeometryError::Serialization(format!(
            "WKB declares {count} elements, but only {} bytes are left",
            buf.remaining()
        )));
    }

    Ok(count)
}

fn get_u32(buf: &mut &[u8], byte_order: ByteOrder) -> Result<u32, GeometryError> {
    ensure_remaining(buf, 4)?;
    Ok(match byte_order {
        ByteOrder::BigEndian => buf.get_u32(),
        ByteOrder::LittleEndian => buf.get_u32_le(),
    })
}

fn get_f64(buf: &mut &[u8], byte_order: ByteOrder) -> f64 {
    match byte_order {
        ByteOrder::BigEndian => buf.get_f64(),
        ByteOrder::LittleEndian => buf.get_f64_le(),
    }
}

fn ensure_remaining(buf: &&[u8], size: usize) -> Result<(), GeometryError> {
    if buf.remaining() < size {
        return Err(GeometryError::Serialization(format!(
            "unexpected end of WKB: {size} bytes required, {} left",
            buf.remaining()
        )));
    }

    Ok(())
}
