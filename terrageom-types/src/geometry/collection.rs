use crate::error::GeometryError;
use crate::geom_type::GeomKind;
use crate::geometry::Geometry;

/// Ordered set of owned geometries.
///
/// Backs geometry collections as well as multipoints, multi line strings, multipolygons,
/// polyhedral surfaces and TINs. A collection can be created with unfilled slots
/// ([`GeometryCollection::with_size`]) that are filled later with
/// [`GeometryCollection::set_geometry_n`].
///
/// When the collection is owned by a homogeneous [`Geometry`] (e.g. a multipolygon), every
/// member put into it must be of the member kind of that geometry. Members cannot be borrowed
/// mutably, they are replaced as a whole:
///
/// ```compile_fail
/// use terrageom_types::{Coord, GeomType, Geometry};
///
/// let multi = Geometry::collection(GeomType::MULTI_POINT, vec![Geometry::point(0.0, 0.0, 0)], 0)
///     .unwrap();
/// let mut collection = multi.as_collection().unwrap().clone();
/// for member in collection.iter_mut() {
///     *member = Geometry::line_string(vec![Coord::xy(0.0, 0.0)], 0);
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryCollection {
    members: Vec<Option<Geometry>>,
    member_kind: Option<GeomKind>,
}

impl GeometryCollection {
    /// Creates a new collection.
    pub fn new(members: Vec<Geometry>) -> Self {
        Self {
            members: members.into_iter().map(Some).collect(),
            member_kind: None,
        }
    }

    /// Collection of `size` unfilled slots.
    pub fn with_size(size: usize) -> Self {
        Self {
            members: std::iter::repeat_with(|| None).take(size).collect(),
            member_kind: None,
        }
    }

    /// Number of slots, filled or not.
    pub fn num_geometries(&self) -> usize {
        self.members.len()
    }

    /// Returns true if there are no slots.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns true if every slot holds a geometry.
    pub fn is_filled(&self) -> bool {
        self.members.iter().all(Option::is_some)
    }

    /// Member at `index`. `None` if the index is out of range or the slot is unfilled.
    pub fn geometry_n(&self, index: usize) -> Option<&Geometry> {
        self.members.get(index).and_then(Option::as_ref)
    }

    /// Puts the geometry into the slot at `index` and returns the previous occupant.
    pub fn set_geometry_n(
        &mut self,
        index: usize,
        geometry: Geometry,
    ) -> Result<Option<Geometry>, GeometryError> {
        self.check_member(&geometry)?;

        let len = self.members.len();
        let slot = self
            .members
            .get_mut(index)
            .ok_or(GeometryError::IndexOutOfRange { index, len })?;

        Ok(slot.replace(geometry))
    }

    /// Removes the slot at `index`, shifting the following members.
    pub fn remove_geometry_n(&mut self, index: usize) -> Result<Option<Geometry>, GeometryError> {
        let len = self.members.len();
        if index >= len {
            return Err(GeometryError::IndexOutOfRange { index, len });
        }

        Ok(self.members.remove(index))
    }

    /// Appends a member.
    pub fn add(&mut self, geometry: Geometry) -> Result<(), GeometryError> {
        self.check_member(&geometry)?;
        self.members.push(Some(geometry));

        Ok(())
    }

    /// Iterates over filled slots.
    pub fn iter(&self) -> impl Iterator<Item = &Geometry> {
        self.members.iter().flatten()
    }

    /// Iterates mutably over filled slots.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Geometry> {
        self.members.iter_mut().flatten()
    }

    /// Consumes the collection and returns the members of the filled slots.
    pub(crate) fn into_members(self) -> impl Iterator<Item = Geometry> {
        self.members.into_iter().flatten()
    }

    /// All slots including the unfilled ones.
    pub fn slots(&self) -> &[Option<Geometry>] {
        &self.members
    }

    /// Returns true if all filled members are of the same kind.
    pub fn is_homogeneous(&self) -> bool {
        let mut kinds = self.iter().map(|g| g.geom_type().kind());
        match kinds.next() {
            Some(first) => kinds.all(|kind| kind == first),
            None => true,
        }
    }

    /// Kind every member must have, if restricted.
    pub fn member_kind(&self) -> Option<GeomKind> {
        self.member_kind
    }

    pub(crate) fn restrict_to(
        &mut self,
        collection_kind: GeomKind,
    ) -> Result<(), GeometryError> {
        self.member_kind = collection_kind.member_kind();
        self.members
            .iter()
            .flatten()
            .try_for_each(|member| self.check_member(member))
    }

    fn check_member(&self, geometry: &Geometry) -> Result<(), GeometryError> {
        match self.member_kind {
            Some(kind) if geometry.geom_type().kind() != kind => {
                Err(GeometryError::TypeMismatch {
                    expected: kind.name(),
                    found: geometry.geometry_type(),
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn fill_slots() {
        let mut collection = GeometryCollection::with_size(2);
        assert_eq!(collection.num_geometries(), 2);
        assert!(!collection.is_filled());
        assert!(collection.geometry_n(0).is_none());

        let previous = collection
            .set_geometry_n(0, Geometry::point(1.0, 2.0, 4326))
            .unwrap();
        assert!(previous.is_none());
        collection
            .set_geometry_n(1, Geometry::point(3.0, 4.0, 4326))
            .unwrap();
        assert!(collection.is_filled());

        let previous = collection
            .set_geometry_n(1, Geometry::point(5.0, 6.0, 4326))
            .unwrap();
        assert_eq!(previous, Some(Geometry::point(3.0, 4.0, 4326)));
    }

    #[test]
    fn out_of_range_access_fails() {
        let mut collection = GeometryCollection::with_size(1);
        assert_matches!(
            collection.set_geometry_n(1, Geometry::point(0.0, 0.0, 0)),
            Err(GeometryError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_matches!(
            collection.remove_geometry_n(3),
            Err(GeometryError::IndexOutOfRange { index: 3, len: 1 })
        );
        assert_matches!(collection.remove_geometry_n(0), Ok(None));
        assert!(collection.is_empty());
    }

    #[test]
    fn restricted_collection_rejects_other_kinds() {
        let mut collection = GeometryCollection::new(vec![Geometry::point(0.0, 0.0, 0)]);
        collection.restrict_to(GeomKind::MultiPoint).unwrap();

        assert_matches!(
            collection.add(Geometry::line_string(vec![], 0)),
            Err(GeometryError::TypeMismatch {
                expected: "Point",
                found: "LineString"
            })
        );
        collection.add(Geometry::point(1.0, 1.0, 0)).unwrap();
        assert_eq!(collection.num_geometries(), 2);
    }

    #[test]
    fn homogeneity() {
        let mut collection = GeometryCollection::new(vec![
            Geometry::point(0.0, 0.0, 0),
            Geometry::point(1.0, 1.0, 0),
        ]);
        assert!(collection.is_homogeneous());

        collection
            .add(Geometry::line_string(vec![], 0))
            .unwrap();
        assert!(!collection.is_homogeneous());
    }
}
