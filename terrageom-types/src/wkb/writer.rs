use bytes::BufMut;

use crate::coord::Coord;
use crate::error::GeometryError;
use crate::geom_type::Dimensions;
use crate::geometry::{Geom, Geometry, LineString};
use crate::wkb::ByteOrder;

const HEADER_SIZE: usize = 1 + 4;
const COUNT_SIZE: usize = 4;
const ORDINATE_SIZE: usize = 8;

pub(super) fn wkb_size(geometry: &Geometry) -> usize {
    let coord_size = geometry.dimensions().size() * ORDINATE_SIZE;
    let line_size = |line: &LineString| COUNT_SIZE + line.len() * coord_size;

    HEADER_SIZE
        + match geometry.geom() {
            Geom::Point(_) => coord_size,
            Geom::LineString(line) => line_size(line),
            Geom::Polygon(polygon) => {
                COUNT_SIZE + polygon.rings().iter().map(line_size).sum::<usize>()
            }
            Geom::Collection(collection) => {
                COUNT_SIZE + collection.iter().map(wkb_size).sum::<usize>()
            }
        }
}

pub(super) fn write_geometry(
    geometry: &Geometry,
    buf: &mut impl BufMut,
    byte_order: ByteOrder,
) -> Result<(), GeometryError> {
    let dimensions = geometry.dimensions();

    buf.put_u8(byte_order.marker());
    put_u32(buf, byte_order, geometry.geom_type().code());

    match geometry.geom() {
        Geom::Point(point) => put_coord(buf, byte_order, point.coord(), dimensions),
        Geom::LineString(line) => write_line(buf, byte_order, line, dimensions)?,
        Geom::Polygon(polygon) => {
            put_count(buf, byte_order, polygon.num_rings())?;
            for ring in polygon.rings() {
                write_line(buf, byte_order, ring, dimensions)?;
            }
        }
        Geom::Collection(collection) => {
            put_count(buf, byte_order, collection.num_geometries())?;
            for member in collection.iter() {
                write_geometry(member, buf, byte_order)?;
            }
        }
    }

    Ok(())
}

fn write_line(
    buf: &mut impl BufMut,
    byte_order: ByteOrder,
    line: &LineString,
    dimensions: Dimensions,
) -> Result<(), GeometryError> {
    put_count(buf, byte_order, line.len())?;
    for coord in line.coords() {
        put_coord(buf, byte_order, coord, dimensions);
    }

    Ok(())
}

fn put_count(
    buf: &mut impl BufMut,
    byte_order: ByteOrder,
    count: usize,
) -> Result<(), GeometryError> {
    let count = u32::try_from(count).map_err(|_| {
        GeometryError::Serialization(format!("{count} elements do not fit into WKB"))
    })?;
    put_u32(buf, byte_order, count);

    Ok(())
}

fn put_coord(buf: &mut impl BufMut, byte_order: ByteOrder, coord: &Coord, dimensions: Dimensions) {
    put_f64(buf, byte_order, coord.x);
    put_f64(buf, byte_order, coord.y);
    if dimensions.has_z() {
        put_f64(buf, byte_order, coord.z);
    }
    if dimensions.has_m() {
        put_f64(buf, byte_order, coord.m);
    }
}

fn put_u32(buf: &mut impl BufMut, byte_order: ByteOrder, value: u32) {
    match byte_order {
        ByteOrder::BigEndian => buf.put_u32(value),
        ByteOrder::LittleEndian => buf.put_u32_le(value),
    }
}

fn put_f64(buf: &mut impl BufMut, byte_order: ByteOrder, value: f64) {
    match byte_order {
        ByteOrder::BigEndian => buf.put_f64(value),
        ByteOrder::LittleEndian => buf.put_f64_le(value),
    }
}
