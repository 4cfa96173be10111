//! See [`Geometry`].

use std::cell::Cell;

use crate::coord::Coord;
use crate::envelope::Envelope;
use crate::error::GeometryError;
use crate::geom_type::{Dimensionality, Dimensions, GeomKind, GeomType};

mod collection;
pub use collection::GeometryCollection;

mod line_string;
pub use line_string::LineString;

mod ops;

mod point;
pub use point::Point;

mod polygon;
pub use polygon::Polygon;

/// SRID of geometries whose spatial reference system is not set.
pub const UNKNOWN_SRID: i32 = -1;

/// Deepest nesting of collections accepted by the WKB and WKT readers.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Structure of a geometry.
///
/// Kinds sharing a structure share a variant: [`Geom::LineString`] holds line strings and circular
/// strings, [`Geom::Polygon`] holds polygons and triangles, and [`Geom::Collection`] holds all
/// collection kinds. The kind itself is stored in the [`GeomType`] of the owning [`Geometry`].
#[derive(Debug, Clone, PartialEq)]
pub enum Geom {
    /// Point.
    Point(Point),
    /// Line string or circular string.
    LineString(LineString),
    /// Polygon or triangle.
    Polygon(Polygon),
    /// Any kind of collection.
    Collection(GeometryCollection),
}

impl Geom {
    fn accepts(&self, kind: GeomKind) -> bool {
        match self {
            Geom::Point(_) => kind == GeomKind::Point,
            Geom::LineString(_) => {
                matches!(kind, GeomKind::LineString | GeomKind::CircularString)
            }
            Geom::Polygon(_) => matches!(kind, GeomKind::Polygon | GeomKind::Triangle),
            Geom::Collection(_) => kind.is_collection(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Geom::Point(_) => "Point",
            Geom::LineString(_) => "LineString",
            Geom::Polygon(_) => "Polygon",
            Geom::Collection(_) => "GeometryCollection",
        }
    }
}

/// A geometry with its type, spatial reference system id and a lazily computed bounding box.
///
/// The bounding box (MBR) is cached on first request. Every way of mutating the geometry
/// structure (`*_mut` accessors, member updates, [`Geometry::transform`],
/// [`Geometry::apply_transformation`]) drops the cached value. The cache is never cloned and
/// never compared.
///
/// The structure can only be changed in ways that keep it consistent with the type: there is no
/// public mutable access to the [`Geom`] or to the members of a collection, members are replaced
/// through [`Geometry::set_member`] and [`Geometry::update_member`].
///
/// ```compile_fail
/// use terrageom_types::{Geom, Geometry, Point};
///
/// let mut polygon = Geometry::polygon(vec![], 0);
/// *polygon.geom_mut() = Geom::Point(Point::xy(5.0, 5.0));
/// ```
///
/// The cache uses interior mutability, so a `Geometry` can be moved between threads but cannot be
/// shared between them.
#[derive(Debug)]
pub struct Geometry {
    geom_type: GeomType,
    srid: i32,
    mbr: Cell<Option<Envelope>>,
    geom: Geom,
}

impl Geometry {
    /// Creates a new geometry.
    ///
    /// Fails if the structure does not correspond to the kind of the type, if the kind has no
    /// structural representation (e.g. `CompoundCurve`), or if a homogeneous collection has a member
    /// of a wrong kind.
    pub fn new(geom_type: GeomType, srid: i32, mut geom: Geom) -> Result<Self, GeometryError> {
        let kind = geom_type.kind();
        if matches!(
            kind,
            GeomKind::Geometry
                | GeomKind::CompoundCurve
                | GeomKind::CurvePolygon
                | GeomKind::MultiCurve
                | GeomKind::MultiSurface
                | GeomKind::Curve
                | GeomKind::Surface
                | GeomKind::Unknown
        ) {
            return Err(GeometryError::Unsupported(format!(
                "{} geometries cannot be instantiated",
                kind.name()
            )));
        }

        if !geom.accepts(kind) {
            return Err(GeometryError::TypeMismatch {
                expected: kind.name(),
                found: geom.name(),
            });
        }

        if let Geom::Collection(collection) = &mut geom {
            collection.restrict_to(kind)?;
        }

        Ok(Self::new_unchecked(geom_type, srid, geom))
    }

    /// Creates a new geometry with a known bounding box, e.g. one read from an index.
    pub fn with_mbr(
        geom_type: GeomType,
        srid: i32,
        geom: Geom,
        mbr: Envelope,
    ) -> Result<Self, GeometryError> {
        let geometry = Self::new(geom_type, srid, geom)?;
        geometry.mbr.set(Some(mbr));
        Ok(geometry)
    }

    fn new_unchecked(geom_type: GeomType, srid: i32, geom: Geom) -> Self {
        Self {
            geom_type,
            srid,
            mbr: Cell::new(None),
            geom,
        }
    }

    /// 2D point.
    pub fn point(x: f64, y: f64, srid: i32) -> Self {
        Self::new_unchecked(
            GeomType::POINT,
            srid,
            Geom::Point(Point::new(Coord::xy(x, y))),
        )
    }

    /// Point with z.
    pub fn point_z(x: f64, y: f64, z: f64, srid: i32) -> Self {
        Self::new_unchecked(
            GeomType::POINT_Z,
            srid,
            Geom::Point(Point::new(Coord::xyz(x, y, z))),
        )
    }

    /// Point with a measure.
    pub fn point_m(x: f64, y: f64, m: f64, srid: i32) -> Self {
        Self::new_unchecked(
            GeomType::POINT_M,
            srid,
            Geom::Point(Point::new(Coord::xym(x, y, m))),
        )
    }

    /// Point with z and a measure.
    pub fn point_zm(x: f64, y: f64, z: f64, m: f64, srid: i32) -> Self {
        Self::new_unchecked(
            GeomType::POINT_ZM,
            srid,
            Geom::Point(Point::new(Coord::xyzm(x, y, z, m))),
        )
    }

    /// 2D line string.
    pub fn line_string(coords: Vec<Coord>, srid: i32) -> Self {
        Self::new_unchecked(
            GeomType::LINE_STRING,
            srid,
            Geom::LineString(LineString::new(coords)),
        )
    }

    /// 2D polygon. The first ring is the exterior one.
    pub fn polygon(rings: Vec<LineString>, srid: i32) -> Self {
        Self::new_unchecked(GeomType::POLYGON, srid, Geom::Polygon(Polygon::new(rings)))
    }

    /// 2D geometry collection.
    pub fn geometry_collection(members: Vec<Geometry>, srid: i32) -> Self {
        Self::new_unchecked(
            GeomType::GEOMETRY_COLLECTION,
            srid,
            Geom::Collection(GeometryCollection::new(members)),
        )
    }

    /// Collection of the given type, e.g. [`GeomType::MULTI_POLYGON`].
    pub fn collection(
        geom_type: GeomType,
        members: Vec<Geometry>,
        srid: i32,
    ) -> Result<Self, GeometryError> {
        Self::new(
            geom_type,
            srid,
            Geom::Collection(GeometryCollection::new(members)),
        )
    }

    /// Type of the geometry.
    pub fn geom_type(&self) -> GeomType {
        self.geom_type
    }

    /// Name of the geometry type, e.g. `MultiPolygon`.
    pub fn geometry_type(&self) -> &'static str {
        self.geom_type.kind().name()
    }

    /// Coordinate dimensions variant.
    pub fn dimensions(&self) -> Dimensions {
        self.geom_type.dimensions()
    }

    /// Number of ordinates in each coordinate: 2, 3 or 4.
    pub fn coordinate_dimension(&self) -> u8 {
        self.geom_type.coordinate_dimension()
    }

    /// Whether coordinates carry z.
    pub fn is_3d(&self) -> bool {
        self.geom_type.is_3d()
    }

    /// Whether coordinates carry a measure.
    pub fn is_measured(&self) -> bool {
        self.geom_type.is_measured()
    }

    /// Topological dimension.
    ///
    /// For geometry collections this is the largest dimension of the members, and
    /// [`Dimensionality::Point`] for an empty collection.
    pub fn dimension(&self) -> Dimensionality {
        match (&self.geom, self.geom_type.kind().dimensionality()) {
            (_, Some(dimensionality)) => dimensionality,
            (Geom::Collection(collection), None) => collection
                .iter()
                .map(Geometry::dimension)
                .max()
                .unwrap_or(Dimensionality::Point),
            (_, None) => Dimensionality::Point,
        }
    }

    /// Spatial reference system id.
    pub fn srid(&self) -> i32 {
        self.srid
    }

    /// Sets the SRID of the geometry and all its members. Coordinates are not changed.
    pub fn set_srid(&mut self, srid: i32) {
        self.srid = srid;
        if let Geom::Collection(collection) = &mut self.geom {
            for member in collection.iter_mut() {
                member.set_srid(srid);
            }
        }
    }

    /// Structure of the geometry.
    pub fn geom(&self) -> &Geom {
        &self.geom
    }

    /// Mutable structure of the geometry. Drops the cached bounding box.
    pub(crate) fn geom_mut(&mut self) -> &mut Geom {
        self.mbr.set(None);
        &mut self.geom
    }

    /// Consumes the geometry and returns its structure.
    pub fn into_geom(self) -> Geom {
        self.geom
    }

    /// Point structure, if the geometry is a point.
    pub fn as_point(&self) -> Option<&Point> {
        match &self.geom {
            Geom::Point(point) => Some(point),
            _ => None,
        }
    }

    /// Mutable point structure. Drops the cached bounding box.
    pub fn as_point_mut(&mut self) -> Option<&mut Point> {
        match self.geom_mut() {
            Geom::Point(point) => Some(point),
            _ => None,
        }
    }

    /// Line string structure, if the geometry is a line string or a circular string.
    pub fn as_line_string(&self) -> Option<&LineString> {
        match &self.geom {
            Geom::LineString(line) => Some(line),
            _ => None,
        }
    }

    /// Mutable line string structure. Drops the cached bounding box.
    pub fn as_line_string_mut(&mut self) -> Option<&mut LineString> {
        match self.geom_mut() {
            Geom::LineString(line) => Some(line),
            _ => None,
        }
    }

    /// Polygon structure, if the geometry is a polygon or a triangle.
    pub fn as_polygon(&self) -> Option<&Polygon> {
        match &self.geom {
            Geom::Polygon(polygon) => Some(polygon),
            _ => None,
        }
    }

    /// Mutable polygon structure. Drops the cached bounding box.
    pub fn as_polygon_mut(&mut self) -> Option<&mut Polygon> {
        match self.geom_mut() {
            Geom::Polygon(polygon) => Some(polygon),
            _ => None,
        }
    }

    /// Collection structure, if the geometry is a collection of any kind.
    pub fn as_collection(&self) -> Option<&GeometryCollection> {
        match &self.geom {
            Geom::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    /// Mutable collection structure. Drops the cached bounding box.
    pub(crate) fn as_collection_mut(&mut self) -> Option<&mut GeometryCollection> {
        match self.geom_mut() {
            Geom::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    fn members_mut(&mut self) -> Result<&mut GeometryCollection, GeometryError> {
        let found = self.geometry_type();
        self.as_collection_mut()
            .ok_or(GeometryError::TypeMismatch {
                expected: "GeometryCollection",
                found,
            })
    }

    /// Appends a member to a collection geometry. The member gets the SRID of the collection.
    ///
    /// Fails with [`GeometryError::TypeMismatch`] if the geometry is not a collection or the
    /// member kind does not fit a homogeneous collection.
    pub fn add_member(&mut self, mut member: Geometry) -> Result<(), GeometryError> {
        member.set_srid(self.srid);
        self.members_mut()?.add(member)
    }

    /// Puts a member into the slot at `index` of a collection geometry and returns the previous
    /// occupant. The member gets the SRID of the collection.
    pub fn set_member(
        &mut self,
        index: usize,
        mut member: Geometry,
    ) -> Result<Option<Geometry>, GeometryError> {
        member.set_srid(self.srid);
        self.members_mut()?.set_geometry_n(index, member)
    }

    /// Changes the member at `index` of a collection geometry with `f` and returns its result.
    ///
    /// `f` works on a copy of the member that is put back only if it still fits the collection,
    /// so on failure the geometry is left unchanged. The member keeps the SRID of the collection.
    pub fn update_member<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut Geometry) -> R,
    ) -> Result<R, GeometryError> {
        let srid = self.srid;
        let collection = self.members_mut()?;
        let len = collection.num_geometries();
        if index >= len {
            return Err(GeometryError::IndexOutOfRange { index, len });
        }
        let mut member = collection
            .geometry_n(index)
            .cloned()
            .ok_or_else(|| GeometryError::InvalidState(format!("slot {index} is unfilled")))?;

        let result = f(&mut member);
        member.set_srid(srid);
        member.invalidate_mbr();
        collection.set_geometry_n(index, member)?;

        Ok(result)
    }

    /// Number of coordinates in the geometry.
    pub fn num_points(&self) -> usize {
        match &self.geom {
            Geom::Point(_) => 1,
            Geom::LineString(line) => line.len(),
            Geom::Polygon(polygon) => polygon.num_points(),
            Geom::Collection(collection) => collection.iter().map(Geometry::num_points).sum(),
        }
    }

    /// Returns true if the geometry has no coordinates.
    pub fn is_empty(&self) -> bool {
        match &self.geom {
            Geom::Point(point) => point.is_empty(),
            Geom::LineString(line) => line.is_empty(),
            Geom::Polygon(polygon) => polygon.is_empty(),
            Geom::Collection(collection) => collection.iter().all(Geometry::is_empty),
        }
    }

    /// Bounding box of the geometry, computed on first request.
    ///
    /// Members of a collection are recomputed as well, their cached boxes are not trusted.
    pub fn mbr(&self) -> Envelope {
        match self.mbr.get() {
            Some(mbr) => mbr,
            None => self.compute_mbr(true),
        }
    }

    /// Recomputes and caches the bounding box.
    ///
    /// With `cascade`, members of a collection recompute their boxes too, otherwise their cached
    /// boxes are used.
    pub fn compute_mbr(&self, cascade: bool) -> Envelope {
        let mbr = match &self.geom {
            Geom::Point(point) => Envelope::from_coords(std::iter::once(point.coord())),
            Geom::LineString(line) => line.envelope(),
            Geom::Polygon(polygon) => polygon.envelope(),
            Geom::Collection(collection) => {
                if !collection.is_filled() {
                    log::warn!(
                        "Computing bounding box of a {} with unfilled slots",
                        self.geometry_type()
                    );
                }

                collection
                    .iter()
                    .map(|member| {
                        if cascade {
                            member.compute_mbr(true)
                        } else {
                            member.mbr()
                        }
                    })
                    .collect()
            }
        };

        log::trace!("Computed bounding box of {}: {mbr:?}", self.geometry_type());

        self.mbr.set(Some(mbr));
        mbr
    }

    /// Returns true if the bounding box is currently cached.
    pub fn has_cached_mbr(&self) -> bool {
        self.mbr.get().is_some()
    }

    /// Drops the cached bounding box of the geometry and all its members.
    pub fn invalidate_mbr(&mut self) {
        self.mbr.set(None);
        if let Geom::Collection(collection) = &mut self.geom {
            for member in collection.iter_mut() {
                member.invalidate_mbr();
            }
        }
    }

    /// Fails with [`GeometryError::InvalidState`] if the geometry or any nested collection has
    /// unfilled slots.
    pub(crate) fn ensure_filled(&self) -> Result<(), GeometryError> {
        if let Geom::Collection(collection) = &self.geom {
            if !collection.is_filled() {
                return Err(GeometryError::InvalidState(format!(
                    "{} has unfilled slots",
                    self.geometry_type()
                )));
            }

            collection.iter().try_for_each(Geometry::ensure_filled)?;
        }

        Ok(())
    }

    /// Bounding box as a polygon with the SRID of the geometry.
    pub fn envelope(&self) -> Result<Geometry, GeometryError> {
        crate::relation::geom_from_envelope(&self.mbr(), self.srid)
    }

    /// Calls `f` for every non-empty coordinate of the geometry, stopping at the first error.
    ///
    /// Drops the cached bounding boxes.
    pub fn try_for_each_coord_mut<E>(
        &mut self,
        f: &mut impl FnMut(&mut Coord) -> Result<(), E>,
    ) -> Result<(), E> {
        self.mbr.set(None);
        match &mut self.geom {
            Geom::Point(point) if point.is_empty() => Ok(()),
            Geom::Point(point) => f(point.coord_mut()),
            Geom::LineString(line) => line.coords_mut().iter_mut().try_for_each(f),
            Geom::Polygon(polygon) => polygon
                .rings_mut()
                .iter_mut()
                .flat_map(|ring| ring.coords_mut().iter_mut())
                .try_for_each(f),
            Geom::Collection(collection) => collection
                .iter_mut()
                .try_for_each(|member| member.try_for_each_coord_mut(f)),
        }
    }

    /// Returns true if the geometries have the same type and exactly the same coordinates.
    ///
    /// SRIDs are ignored, also those of collection members.
    pub fn equals_exact(&self, other: &Geometry) -> bool {
        if self.geom_type != other.geom_type {
            return false;
        }

        match (&self.geom, &other.geom) {
            (Geom::Collection(a), Geom::Collection(b)) => {
                a.num_geometries() == b.num_geometries()
                    && a.slots().iter().zip(b.slots()).all(|pair| match pair {
                        (Some(a), Some(b)) => a.equals_exact(b),
                        (None, None) => true,
                        _ => false,
                    })
            }
            (a, b) => a == b,
        }
    }
}

impl Clone for Geometry {
    fn clone(&self) -> Self {
        Self::new_unchecked(self.geom_type, self.srid, self.geom.clone())
    }
}

impl PartialEq for Geometry {
    fn eq(&self, other: &Self) -> bool {
        self.geom_type == other.geom_type && self.srid == other.srid && self.geom == other.geom
    }
}
