//! Geometry type taxonomy.
//!
//! A [`GeomType`] is a pair of a [`GeomKind`] (point, polygon, TIN...) and a [`Dimensions`] variant
//! (2D, Z, M or ZM). On the wire it is encoded as `base_code + 1000 * variant`, which is the ISO
//! WKB convention: `POINT` is `1`, `POINT Z` is `1001`, `POINT M` is `2001` and `POINT ZM` is `3001`.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Kind of geometry, independent of the coordinate dimensions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeomKind {
    /// Abstract geometry.
    Geometry,
    /// Point.
    Point,
    /// Line string.
    LineString,
    /// Polygon.
    Polygon,
    /// Multipoint.
    MultiPoint,
    /// Multi line string.
    MultiLineString,
    /// Multipolygon.
    MultiPolygon,
    /// Geometry collection.
    GeometryCollection,
    /// Circular string.
    CircularString,
    /// Compound curve.
    CompoundCurve,
    /// Curve polygon.
    CurvePolygon,
    /// Multi curve.
    MultiCurve,
    /// Multi surface.
    MultiSurface,
    /// Abstract curve.
    Curve,
    /// Abstract surface.
    Surface,
    /// Polyhedral surface.
    PolyhedralSurface,
    /// Triangulated irregular network.
    Tin,
    /// Triangle.
    Triangle,
    /// Sentinel for types that are not known.
    Unknown,
}

impl GeomKind {
    /// All known kinds (without the [`GeomKind::Unknown`] sentinel) in the order of their base codes.
    pub const ALL: [GeomKind; 18] = [
        GeomKind::Geometry,
        GeomKind::Point,
        GeomKind::LineString,
        GeomKind::Polygon,
        GeomKind::MultiPoint,
        GeomKind::MultiLineString,
        GeomKind::MultiPolygon,
        GeomKind::GeometryCollection,
        GeomKind::CircularString,
        GeomKind::CompoundCurve,
        GeomKind::CurvePolygon,
        GeomKind::MultiCurve,
        GeomKind::MultiSurface,
        GeomKind::Curve,
        GeomKind::Surface,
        GeomKind::PolyhedralSurface,
        GeomKind::Tin,
        GeomKind::Triangle,
    ];

    /// Base (2D) type code.
    pub fn base_code(&self) -> u32 {
        match self {
            GeomKind::Unknown => GeomType::UNKNOWN_CODE,
            kind => Self::ALL
                .iter()
                .position(|k| k == kind)
                .map(|v| v as u32)
                .unwrap_or(GeomType::UNKNOWN_CODE),
        }
    }

    /// Kind with the given base code.
    pub fn from_base_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Upper case WKT tag of the kind, e.g. `MULTIPOLYGON`.
    pub fn tag(&self) -> &'static str {
        match self {
            GeomKind::Geometry => "GEOMETRY",
            GeomKind::Point => "POINT",
            GeomKind::LineString => "LINESTRING",
            GeomKind::Polygon => "POLYGON",
            GeomKind::MultiPoint => "MULTIPOINT",
            GeomKind::MultiLineString => "MULTILINESTRING",
            GeomKind::MultiPolygon => "MULTIPOLYGON",
            GeomKind::GeometryCollection => "GEOMETRYCOLLECTION",
            GeomKind::CircularString => "CIRCULARSTRING",
            GeomKind::CompoundCurve => "COMPOUNDCURVE",
            GeomKind::CurvePolygon => "CURVEPOLYGON",
            GeomKind::MultiCurve => "MULTICURVE",
            GeomKind::MultiSurface => "MULTISURFACE",
            GeomKind::Curve => "CURVE",
            GeomKind::Surface => "SURFACE",
            GeomKind::PolyhedralSurface => "POLYHEDRALSURFACE",
            GeomKind::Tin => "TIN",
            GeomKind::Triangle => "TRIANGLE",
            GeomKind::Unknown => "UNKNOWN",
        }
    }

    /// Camel case name of the kind, e.g. `MultiPolygon`.
    pub fn name(&self) -> &'static str {
        match self {
            GeomKind::Geometry => "Geometry",
            GeomKind::Point => "Point",
            GeomKind::LineString => "LineString",
            GeomKind::Polygon => "Polygon",
            GeomKind::MultiPoint => "MultiPoint",
            GeomKind::MultiLineString => "MultiLineString",
            GeomKind::MultiPolygon => "MultiPolygon",
            GeomKind::GeometryCollection => "GeometryCollection",
            GeomKind::CircularString => "CircularString",
            GeomKind::CompoundCurve => "CompoundCurve",
            GeomKind::CurvePolygon => "CurvePolygon",
            GeomKind::MultiCurve => "MultiCurve",
            GeomKind::MultiSurface => "MultiSurface",
            GeomKind::Curve => "Curve",
            GeomKind::Surface => "Surface",
            GeomKind::PolyhedralSurface => "PolyhedralSurface",
            GeomKind::Tin => "TIN",
            GeomKind::Triangle => "Triangle",
            GeomKind::Unknown => "Unknown",
        }
    }

    /// Topological dimension of geometries of this kind, if it is fixed by the kind.
    pub fn dimensionality(&self) -> Option<Dimensionality> {
        match self {
            GeomKind::Point | GeomKind::MultiPoint => Some(Dimensionality::Point),
            GeomKind::LineString
            | GeomKind::MultiLineString
            | GeomKind::CircularString
            | GeomKind::CompoundCurve
            | GeomKind::MultiCurve
            | GeomKind::Curve => Some(Dimensionality::Line),
            GeomKind::Polygon
            | GeomKind::MultiPolygon
            | GeomKind::CurvePolygon
            | GeomKind::MultiSurface
            | GeomKind::Surface
            | GeomKind::PolyhedralSurface
            | GeomKind::Tin
            | GeomKind::Triangle => Some(Dimensionality::Area),
            GeomKind::Geometry | GeomKind::GeometryCollection | GeomKind::Unknown => None,
        }
    }

    /// Kind of members a homogeneous collection of this kind holds.
    ///
    /// Returns `None` for kinds that are not collections and for [`GeomKind::GeometryCollection`],
    /// which accepts anything.
    pub fn member_kind(&self) -> Option<GeomKind> {
        match self {
            GeomKind::MultiPoint => Some(GeomKind::Point),
            GeomKind::MultiLineString => Some(GeomKind::LineString),
            GeomKind::MultiPolygon | GeomKind::PolyhedralSurface => Some(GeomKind::Polygon),
            GeomKind::Tin => Some(GeomKind::Triangle),
            _ => None,
        }
    }

    /// Returns true if geometries of this kind own other geometries.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            GeomKind::MultiPoint
                | GeomKind::MultiLineString
                | GeomKind::MultiPolygon
                | GeomKind::GeometryCollection
                | GeomKind::PolyhedralSurface
                | GeomKind::Tin
        )
    }
}

/// Coordinate dimensions variant of a geometry type.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimensions {
    /// x and y.
    #[default]
    Xy,
    /// x, y and z.
    Xyz,
    /// x, y and measure.
    Xym,
    /// x, y, z and measure.
    Xyzm,
}

impl Dimensions {
    /// All variants in the order of their code offsets.
    pub const ALL: [Dimensions; 4] = [
        Dimensions::Xy,
        Dimensions::Xyz,
        Dimensions::Xym,
        Dimensions::Xyzm,
    ];

    /// Variant with the given ordinates.
    pub fn from_flags(has_z: bool, has_m: bool) -> Self {
        match (has_z, has_m) {
            (false, false) => Dimensions::Xy,
            (true, false) => Dimensions::Xyz,
            (false, true) => Dimensions::Xym,
            (true, true) => Dimensions::Xyzm,
        }
    }

    /// Number of ordinates in a coordinate.
    pub fn size(&self) -> usize {
        match self {
            Dimensions::Xy => 2,
            Dimensions::Xyz | Dimensions::Xym => 3,
            Dimensions::Xyzm => 4,
        }
    }

    /// Whether coordinates carry z.
    pub fn has_z(&self) -> bool {
        matches!(self, Dimensions::Xyz | Dimensions::Xyzm)
    }

    /// Whether coordinates carry a measure.
    pub fn has_m(&self) -> bool {
        matches!(self, Dimensions::Xym | Dimensions::Xyzm)
    }

    /// Value added to the base code of the kind.
    pub fn code_offset(&self) -> u32 {
        match self {
            Dimensions::Xy => 0,
            Dimensions::Xyz => 1000,
            Dimensions::Xym => 2000,
            Dimensions::Xyzm => 3000,
        }
    }

    /// Suffix of the type name (`""`, `"Z"`, `"M"` or `"ZM"`).
    pub fn suffix(&self) -> &'static str {
        match self {
            Dimensions::Xy => "",
            Dimensions::Xyz => "Z",
            Dimensions::Xym => "M",
            Dimensions::Xyzm => "ZM",
        }
    }
}

/// Topological dimension of a geometry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimensionality {
    /// Points.
    Point = 0,
    /// Curves.
    Line = 1,
    /// Surfaces.
    Area = 2,
}

/// Geometry type: kind and coordinate dimensions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeomType {
    kind: GeomKind,
    dimensions: Dimensions,
}

impl GeomType {
    /// Code used to encode [`GeomType::UNKNOWN`].
    pub const UNKNOWN_CODE: u32 = 0xFFFF_FFFF;

    /// Unknown geometry type.
    pub const UNKNOWN: Self = Self::new(GeomKind::Unknown, Dimensions::Xy);
    /// 2D abstract geometry.
    pub const GEOMETRY: Self = Self::new(GeomKind::Geometry, Dimensions::Xy);
    /// 2D point.
    pub const POINT: Self = Self::new(GeomKind::Point, Dimensions::Xy);
    /// Point with z.
    pub const POINT_Z: Self = Self::new(GeomKind::Point, Dimensions::Xyz);
    /// Point with measure.
    pub const POINT_M: Self = Self::new(GeomKind::Point, Dimensions::Xym);
    /// Point with z and measure.
    pub const POINT_ZM: Self = Self::new(GeomKind::Point, Dimensions::Xyzm);
    /// 2D line string.
    pub const LINE_STRING: Self = Self::new(GeomKind::LineString, Dimensions::Xy);
    /// 2D circular string.
    pub const CIRCULAR_STRING: Self = Self::new(GeomKind::CircularString, Dimensions::Xy);
    /// 2D polygon.
    pub const POLYGON: Self = Self::new(GeomKind::Polygon, Dimensions::Xy);
    /// 2D triangle.
    pub const TRIANGLE: Self = Self::new(GeomKind::Triangle, Dimensions::Xy);
    /// 2D multipoint.
    pub const MULTI_POINT: Self = Self::new(GeomKind::MultiPoint, Dimensions::Xy);
    /// 2D multi line string.
    pub const MULTI_LINE_STRING: Self = Self::new(GeomKind::MultiLineString, Dimensions::Xy);
    /// 2D multipolygon.
    pub const MULTI_POLYGON: Self = Self::new(GeomKind::MultiPolygon, Dimensions::Xy);
    /// 2D geometry collection.
    pub const GEOMETRY_COLLECTION: Self =
        Self::new(GeomKind::GeometryCollection, Dimensions::Xy);
    /// 2D polyhedral surface.
    pub const POLYHEDRAL_SURFACE: Self = Self::new(GeomKind::PolyhedralSurface, Dimensions::Xy);
    /// 2D TIN.
    pub const TIN: Self = Self::new(GeomKind::Tin, Dimensions::Xy);

    /// Creates a new type.
    pub const fn new(kind: GeomKind, dimensions: Dimensions) -> Self {
        Self { kind, dimensions }
    }

    /// Kind of the type.
    pub fn kind(&self) -> GeomKind {
        self.kind
    }

    /// Coordinate dimensions variant.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// The same kind with other coordinate dimensions.
    pub fn with_dimensions(&self, dimensions: Dimensions) -> Self {
        Self::new(self.kind, dimensions)
    }

    /// Wire code of the type (`base + 1000 * variant`).
    pub fn code(&self) -> u32 {
        match self.kind {
            GeomKind::Unknown => Self::UNKNOWN_CODE,
            kind => kind.base_code() + self.dimensions.code_offset(),
        }
    }

    /// Decodes an ISO type code.
    pub fn from_code(code: u32) -> Result<Self, GeometryError> {
        let dimensions = match code / 1000 {
            0 => Dimensions::Xy,
            1 => Dimensions::Xyz,
            2 => Dimensions::Xym,
            3 => Dimensions::Xyzm,
            _ => {
                return Err(GeometryError::Serialization(format!(
                    "unknown geometry type code {code}"
                )))
            }
        };

        let kind = GeomKind::from_base_code(code % 1000).ok_or_else(|| {
            GeometryError::Serialization(format!("unknown geometry type code {code}"))
        })?;

        Ok(Self::new(kind, dimensions))
    }

    /// Number of ordinates in each coordinate: 2, 3 or 4.
    pub fn coordinate_dimension(&self) -> u8 {
        coord_dimension(self.code())
    }

    /// Whether the type carries z.
    pub fn is_3d(&self) -> bool {
        self.dimensions.has_z()
    }

    /// Whether the type carries a measure.
    pub fn is_measured(&self) -> bool {
        self.dimensions.has_m()
    }

    /// Upper case name of the type as used by [`geom_type_from_name`], e.g. `POLYGONZM`.
    pub fn name(&self) -> String {
        format!("{}{}", self.kind.tag(), self.dimensions.suffix())
    }
}

impl Default for GeomType {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl Display for GeomType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.kind.tag(), self.dimensions.suffix())
    }
}

/// Number of ordinates of a geometry with the given type code.
///
/// Z codes fall into `0x3E8..0x400`, M codes into `0x7D0..0x800` and ZM codes into
/// `0xBB8..0xC00`, so the second nibble is enough to tell them apart.
pub fn coord_dimension(code: u32) -> u8 {
    match code & 0xF00 {
        0x300 | 0x700 => 3,
        0xB00 => 4,
        _ => 2,
    }
}

static TYPE_NAMES: LazyLock<HashMap<String, GeomType>> = LazyLock::new(|| {
    let mut names = HashMap::with_capacity(GeomKind::ALL.len() * Dimensions::ALL.len());
    for kind in GeomKind::ALL {
        for dimensions in Dimensions::ALL {
            let geom_type = GeomType::new(kind, dimensions);
            names.insert(geom_type.name(), geom_type);
        }
    }

    names
});

/// Looks up a type by its upper case name, e.g. `POLYGON` or `MULTIPOINTZM`.
///
/// Returns [`GeomType::UNKNOWN`] for names that are not in the table.
pub fn geom_type_from_name(name: &str) -> GeomType {
    TYPE_NAMES
        .get(name)
        .copied()
        .unwrap_or(GeomType::UNKNOWN)
}

/// Returns true if the name is a known upper case type name.
pub fn is_geom_type_name(name: &str) -> bool {
    TYPE_NAMES.contains_key(name)
}
