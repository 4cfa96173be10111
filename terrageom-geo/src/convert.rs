use geozero::error::GeozeroError;
use geozero::wkb::Wkb;
use geozero::{CoordDimensions, ToGeo, ToWkb};
use terrageom_types::{ByteOrder, GeomKind, Geometry, GeometryError};

/// Converts the geometry into a `geo` geometry. Z and M ordinates are dropped.
pub fn to_geo(geometry: &Geometry) -> Result<geo_types::Geometry<f64>, GeometryError> {
    check_supported(geometry)?;
    let bytes = geometry.to_wkb(ByteOrder::LittleEndian)?;
    Wkb(bytes).to_geo().map_err(geozero_error)
}

/// Converts a `geo` geometry back. The result has an unknown SRID.
pub fn from_geo(geometry: &geo_types::Geometry<f64>) -> Result<Geometry, GeometryError> {
    let bytes = geometry
        .to_wkb(CoordDimensions::xy())
        .map_err(geozero_error)?;
    Geometry::from_wkb(&bytes)
}

fn check_supported(geometry: &Geometry) -> Result<(), GeometryError> {
    match geometry.geom_type().kind() {
        kind @ (GeomKind::CircularString
        | GeomKind::Triangle
        | GeomKind::PolyhedralSurface
        | GeomKind::Tin) => Err(GeometryError::Unsupported(format!(
            "{} geometries are not supported by the geo engine",
            kind.name()
        ))),
        _ => match geometry.as_collection() {
            Some(collection) => collection.iter().try_for_each(check_supported),
            None => Ok(()),
        },
    }
}

fn geozero_error(err: GeozeroError) -> GeometryError {
    GeometryError::Engine(format!("geo conversion failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use terrageom_types::{Coord, GeomType, LineString};

    #[test]
    fn polygon_to_geo_and_back() {
        let polygon = Geometry::polygon(
            vec![LineString::new(vec![
                Coord::xy(0.0, 0.0),
                Coord::xy(4.0, 0.0),
                Coord::xy(4.0, 4.0),
                Coord::xy(0.0, 0.0),
            ])],
            4326,
        );

        let converted = to_geo(&polygon).unwrap();
        assert_matches!(converted, geo_types::Geometry::Polygon(_));

        let restored = from_geo(&converted).unwrap();
        assert!(restored.equals_exact(&polygon));
    }

    #[test]
    fn z_is_dropped() {
        let point = Geometry::point_z(1.0, 2.0, 3.0, 0);
        let converted = to_geo(&point).unwrap();
        assert_eq!(
            converted,
            geo_types::Geometry::Point(geo_types::Point::new(1.0, 2.0))
        );
        assert_eq!(from_geo(&converted).unwrap().geom_type(), GeomType::POINT);
    }

    #[test]
    fn curves_are_unsupported() {
        let arc = Geometry::new(
            GeomType::CIRCULAR_STRING,
            0,
            terrageom_types::Geom::LineString(LineString::new(vec![
                Coord::xy(0.0, 0.0),
                Coord::xy(1.0, 1.0),
                Coord::xy(2.0, 0.0),
            ])),
        )
        .unwrap();
        assert_matches!(to_geo(&arc), Err(GeometryError::Unsupported(_)));
    }
}
