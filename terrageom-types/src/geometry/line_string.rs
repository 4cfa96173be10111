use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::envelope::Envelope;
use crate::error::GeometryError;

/// Sequence of coordinates. Used for line strings, circular strings and polygon rings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    coords: Vec<Coord>,
}

impl LineString {
    /// Creates a new line string.
    pub fn new(coords: Vec<Coord>) -> Self {
        Self { coords }
    }

    /// Line string of `size` coordinates at the origin, to be filled with [`LineString::set_point`].
    pub fn with_size(size: usize) -> Self {
        Self {
            coords: vec![Coord::default(); size],
        }
    }

    /// Number of coordinates.
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Returns true if there are no coordinates.
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Coordinates of the line string.
    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    /// Mutable coordinates of the line string.
    pub fn coords_mut(&mut self) -> &mut [Coord] {
        &mut self.coords
    }

    /// The `index`-th coordinate.
    pub fn point_n(&self, index: usize) -> Option<&Coord> {
        self.coords.get(index)
    }

    /// Replaces the `index`-th coordinate.
    pub fn set_point(&mut self, index: usize, coord: Coord) -> Result<(), GeometryError> {
        let len = self.coords.len();
        let slot = self
            .coords
            .get_mut(index)
            .ok_or(GeometryError::IndexOutOfRange { index, len })?;
        *slot = coord;

        Ok(())
    }

    /// Appends a coordinate.
    pub fn push(&mut self, coord: Coord) {
        self.coords.push(coord);
    }

    /// First coordinate.
    pub fn start_point(&self) -> Option<&Coord> {
        self.coords.first()
    }

    /// Last coordinate.
    pub fn end_point(&self) -> Option<&Coord> {
        self.coords.last()
    }

    /// Returns true if the first and the last coordinates have the same x and y.
    pub fn is_closed(&self) -> bool {
        match (self.coords.first(), self.coords.last()) {
            (Some(first), Some(last)) => first.x == last.x && first.y == last.y,
            _ => false,
        }
    }

    /// Bounding box of the coordinates.
    pub fn envelope(&self) -> Envelope {
        Envelope::from_coords(&self.coords)
    }
}

impl From<Vec<Coord>> for LineString {
    fn from(coords: Vec<Coord>) -> Self {
        Self::new(coords)
    }
}

impl FromIterator<Coord> for LineString {
    fn from_iter<T: IntoIterator<Item = Coord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
