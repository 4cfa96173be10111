use std::fmt::{Display, Formatter, Result};

use crate::coord::Coord;
use crate::geom_type::Dimensions;
use crate::geometry::{Geom, Geometry, LineString, Polygon};

/// Displays a geometry as WKT.
///
/// Unfilled collection slots are skipped, use [`Geometry::as_text`] to reject them.
pub struct WktDisplay<'a>(pub &'a Geometry);

impl Display for WktDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write_tagged(f, self.0)
    }
}

fn write_tagged(f: &mut Formatter<'_>, geometry: &Geometry) -> Result {
    let geom_type = geometry.geom_type();
    f.write_str(geom_type.kind().tag())?;
    match geom_type.dimensions() {
        Dimensions::Xy => {}
        dimensions => write!(f, " {}", dimensions.suffix())?,
    }

    f.write_str(" ")?;
    write_body(f, geometry)
}

fn write_body(f: &mut Formatter<'_>, geometry: &Geometry) -> Result {
    let dimensions = geometry.dimensions();
    match geometry.geom() {
        Geom::Point(point) if point.is_empty() => f.write_str("EMPTY"),
        Geom::Point(point) => {
            f.write_str("(")?;
            write_coord(f, point.coord(), dimensions)?;
            f.write_str(")")
        }
        Geom::LineString(line) => write_line(f, line, dimensions),
        Geom::Polygon(polygon) => write_polygon(f, polygon, dimensions),
        Geom::Collection(collection) if collection.iter().next().is_none() => {
            f.write_str("EMPTY")
        }
        Geom::Collection(collection) => {
            let tagged_members = geometry.geom_type().kind().member_kind().is_none();

            f.write_str("(")?;
            for (index, member) in collection.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }

                if tagged_members {
                    write_tagged(f, member)?;
                } else {
                    write_body(f, member)?;
                }
            }
            f.write_str(")")
        }
    }
}

fn write_polygon(f: &mut Formatter<'_>, polygon: &Polygon, dimensions: Dimensions) -> Result {
    if polygon.num_rings() == 0 {
        return f.write_str("EMPTY");
    }

    f.write_str("(")?;
    for (index, ring) in polygon.rings().iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write_line(f, ring, dimensions)?;
    }
    f.write_str(")")
}

fn write_line(f: &mut Formatter<'_>, line: &LineString, dimensions: Dimensions) -> Result {
    if line.is_empty() {
        return f.write_str("EMPTY");
    }

    f.write_str("(")?;
    for (index, coord) in line.coords().iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write_coord(f, coord, dimensions)?;
    }
    f.write_str(")")
}

fn write_coord(f: &mut Formatter<'_>, coord: &Coord, dimensions: Dimensions) -> Result {
    write!(f, "{} {}", coord.x, coord.y)?;
    if dimensions.has_z() {
        write!(f, " {}", coord.z)?;
    }
    if dimensions.has_m() {
        write!(f, " {}", coord.m)?;
    }

    Ok(())
}
