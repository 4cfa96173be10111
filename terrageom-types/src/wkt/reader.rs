use std::str::FromStr;

use geo_traits::{
    CoordTrait, GeometryCollectionTrait, GeometryTrait, GeometryType, LineStringTrait,
    MultiLineStringTrait, MultiPointTrait, MultiPolygonTrait, PointTrait, PolygonTrait,
};
use wkt::Wkt;

use crate::coord::Coord;
use crate::error::GeometryError;
use crate::geom_type::{geom_type_from_name, Dimensions, GeomKind, GeomType};
use crate::geometry::{
    Geom, Geometry, GeometryCollection, LineString, Point, Polygon, MAX_NESTING_DEPTH,
    UNKNOWN_SRID,
};

/// Parentheses opened by the deepest members: a multipolygon adds three levels to the
/// collections it is nested in.
const MAX_PARENTHESES_DEPTH: usize = MAX_NESTING_DEPTH + 3;

pub(super) fn read(input: &str) -> Result<Geometry, GeometryError> {
    check_nesting(input)?;

    let (kind, text) = normalize_tag(input);
    let parsed = Wkt::<f64>::from_str(&text)
        .map_err(|err| GeometryError::Serialization(format!("invalid WKT: {err}")))?;

    let geometry = read_geometry(parsed, 0)?;
    match kind {
        Some(kind) if kind != geometry.geom_type().kind() => retag(geometry, kind),
        _ => Ok(geometry),
    }
}

fn check_nesting(input: &str) -> Result<(), GeometryError> {
    let mut depth = 0usize;
    for c in input.chars() {
        match c {
            '(' => {
                depth += 1;
                if depth > MAX_PARENTHESES_DEPTH {
                    return Err(nesting_error());
                }
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    Ok(())
}

fn nesting_error() -> GeometryError {
    GeometryError::Serialization(format!(
        "WKT collections are nested deeper than {MAX_NESTING_DEPTH} levels"
    ))
}

/// Rewrites the type tag of the outer geometry into the form the WKT parser understands.
///
/// Dimensions attached to the name (`POINTZ`) are separated, and kinds without their own
/// structure are read as the kind sharing it (`TRIANGLE` as `POLYGON`, `TIN` as `MULTIPOLYGON`).
/// Returns the kind given by the tag, if it is known.
fn normalize_tag(input: &str) -> (Option<GeomKind>, String) {
    let trimmed = input.trim_start();
    let tag_len = trimmed
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (tag, rest) = trimmed.split_at(tag_len);

    let tag_type = geom_type_from_name(&tag.to_ascii_uppercase());
    if tag_type == GeomType::UNKNOWN {
        return (None, input.to_string());
    }

    let kind = tag_type.kind();
    let parsed_tag = match kind {
        GeomKind::CircularString => GeomKind::LineString.tag(),
        GeomKind::Triangle => GeomKind::Polygon.tag(),
        GeomKind::PolyhedralSurface | GeomKind::Tin => GeomKind::MultiPolygon.tag(),
        _ => kind.tag(),
    };

    let text = match tag_type.dimensions() {
        Dimensions::Xy => format!("{parsed_tag}{rest}"),
        dimensions => format!("{parsed_tag} {}{rest}", dimensions.suffix()),
    };

    (Some(kind), text)
}

/// Converts a geometry nested `depth` collections deep.
fn read_geometry(
    geometry: impl GeometryTrait<T = f64>,
    depth: usize,
) -> Result<Geometry, GeometryError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(nesting_error());
    }

    let dimensions = read_dimensions(geometry.dim())?;

    let (kind, geom) = match geometry.as_type() {
        GeometryType::Point(point) => (
            GeomKind::Point,
            Geom::Point(read_point(point, dimensions)?),
        ),
        GeometryType::LineString(line) => (
            GeomKind::LineString,
            Geom::LineString(read_line(line, dimensions)?),
        ),
        GeometryType::Polygon(polygon) => (
            GeomKind::Polygon,
            Geom::Polygon(read_polygon(polygon, dimensions)?),
        ),
        GeometryType::MultiPoint(multi) => {
            let parts = multi
                .points()
                .map(|point| read_point(&point, dimensions).map(Geom::Point))
                .collect::<Result<Vec<_>, _>>()?;
            (
                GeomKind::MultiPoint,
                read_parts(parts, GeomKind::Point, dimensions)?,
            )
        }
        GeometryType::MultiLineString(multi) => {
            let parts = multi
                .line_strings()
                .map(|line| read_line(&line, dimensions).map(Geom::LineString))
                .collect::<Result<Vec<_>, _>>()?;
            (
                GeomKind::MultiLineString,
                read_parts(parts, GeomKind::LineString, dimensions)?,
            )
        }
        GeometryType::MultiPolygon(multi) => {
            let parts = multi
                .polygons()
                .map(|polygon| read_polygon(&polygon, dimensions).map(Geom::Polygon))
                .collect::<Result<Vec<_>, _>>()?;
            (
                GeomKind::MultiPolygon,
                read_parts(parts, GeomKind::Polygon, dimensions)?,
            )
        }
        GeometryType::GeometryCollection(collection) => {
            let members = collection
                .geometries()
                .map(|member| read_geometry(member, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            (
                GeomKind::GeometryCollection,
                Geom::Collection(GeometryCollection::new(members)),
            )
        }
        _ => {
            return Err(GeometryError::Serialization(
                "unsupported geometry type in WKT".to_string(),
            ))
        }
    };

    build(GeomType::new(kind, dimensions), geom)
}

fn read_dimensions(dimensions: geo_traits::Dimensions) -> Result<Dimensions, GeometryError> {
    match dimensions {
        geo_traits::Dimensions::Xy => Ok(Dimensions::Xy),
        geo_traits::Dimensions::Xyz => Ok(Dimensions::Xyz),
        geo_traits::Dimensions::Xym => Ok(Dimensions::Xym),
        geo_traits::Dimensions::Xyzm => Ok(Dimensions::Xyzm),
        other => Err(GeometryError::Serialization(format!(
            "unsupported WKT coordinate dimensions {other:?}"
        ))),
    }
}

fn read_point(
    point: &impl PointTrait<T = f64>,
    dimensions: Dimensions,
) -> Result<Point, GeometryError> {
    match point.coord() {
        Some(coord) => Ok(Point::new(read_coord(coord, dimensions)?)),
        None => Ok(Point::empty()),
    }
}

fn read_line(
    line: &impl LineStringTrait<T = f64>,
    dimensions: Dimensions,
) -> Result<LineString, GeometryError> {
    line.coords()
        .map(|coord| read_coord(coord, dimensions))
        .collect()
}

fn read_polygon(
    polygon: &impl PolygonTrait<T = f64>,
    dimensions: Dimensions,
) -> Result<Polygon, GeometryError> {
    let mut rings = vec![];
    if let Some(exterior) = polygon.exterior() {
        rings.push(read_line(&exterior, dimensions)?);
    }
    for interior in polygon.interiors() {
        rings.push(read_line(&interior, dimensions)?);
    }

    Ok(Polygon::new(rings))
}

fn read_coord(
    coord: impl CoordTrait<T = f64>,
    dimensions: Dimensions,
) -> Result<Coord, GeometryError> {
    let ordinate = |n: usize| {
        coord.nth(n).ok_or_else(|| {
            GeometryError::Serialization(format!(
                "expected {} ordinates in WKT coordinate",
                dimensions.size()
            ))
        })
    };

    let (x, y) = (coord.x(), coord.y());
    Ok(match dimensions {
        Dimensions::Xy => Coord::xy(x, y),
        Dimensions::Xyz => Coord::xyz(x, y, ordinate(2)?),
        Dimensions::Xym => Coord::xym(x, y, ordinate(2)?),
        Dimensions::Xyzm => Coord::xyzm(x, y, ordinate(2)?, ordinate(3)?),
    })
}

fn read_parts(
    parts: Vec<Geom>,
    member_kind: GeomKind,
    dimensions: Dimensions,
) -> Result<Geom, GeometryError> {
    let member_type = GeomType::new(member_kind, dimensions);
    let members = parts
        .into_iter()
        .map(|geom| build(member_type, geom))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Geom::Collection(GeometryCollection::new(members)))
}

/// Gives a parsed geometry the kind of the tag it was read with, e.g. turns a multipolygon into
/// a TIN of triangles.
fn retag(geometry: Geometry, kind: GeomKind) -> Result<Geometry, GeometryError> {
    let dimensions = geometry.dimensions();
    let geom = match (geometry.into_geom(), kind.member_kind()) {
        (Geom::Collection(collection), Some(member_kind)) => {
            let members = collection
                .into_members()
                .map(|member| retag(member, member_kind))
                .collect::<Result<Vec<_>, _>>()?;
            Geom::Collection(GeometryCollection::new(members))
        }
        (geom, _) => geom,
    };

    build(GeomType::new(kind, dimensions), geom)
}

fn build(geom_type: GeomType, geom: Geom) -> Result<Geometry, GeometryError> {
    Geometry::new(geom_type, UNKNOWN_SRID, geom)
        .map_err(|err| GeometryError::Serialization(format!("invalid WKT geometry: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_normalized() {
        assert_eq!(
            normalize_tag("pointzm (1 2 3 4)"),
            (Some(GeomKind::Point), "POINT ZM (1 2 3 4)".to_string())
        );
        assert_eq!(
            normalize_tag("  TIN Z EMPTY"),
            (Some(GeomKind::Tin), "MULTIPOLYGON Z EMPTY".to_string())
        );
        assert_eq!(
            normalize_tag("TRIANGLE ((0 0, 1 0, 0 1, 0 0))"),
            (
                Some(GeomKind::Triangle),
                "POLYGON ((0 0, 1 0, 0 1, 0 0))".to_string()
            )
        );
        assert_eq!(normalize_tag("BOGUS (1 2)"), (None, "BOGUS (1 2)".to_string()));
    }

    #[test]
    fn nesting_is_limited_before_parsing() {
        let nested = "GEOMETRYCOLLECTION (".repeat(MAX_NESTING_DEPTH);
        assert!(check_nesting(&format!("{nested}POINT (1 2)")).is_ok());
        assert!(check_nesting(&"(".repeat(MAX_PARENTHESES_DEPTH + 1)).is_err());
    }
}
