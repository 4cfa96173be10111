use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::geometry::LineString;

/// Planar surface bounded by an exterior ring and any number of interior rings (holes).
///
/// Also used for triangles, which are polygons with a single ring of four coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    rings: Vec<LineString>,
}

impl Polygon {
    /// Creates a polygon from its rings. The first ring is the exterior one.
    pub fn new(rings: Vec<LineString>) -> Self {
        Self { rings }
    }

    /// Polygon without holes.
    pub fn from_exterior(exterior: LineString) -> Self {
        Self {
            rings: vec![exterior],
        }
    }

    /// Exterior ring. `None` for an empty polygon.
    pub fn exterior(&self) -> Option<&LineString> {
        self.rings.first()
    }

    /// Interior rings.
    pub fn interiors(&self) -> &[LineString] {
        self.rings.get(1..).unwrap_or(&[])
    }

    /// All rings, the exterior first.
    pub fn rings(&self) -> &[LineString] {
        &self.rings
    }

    /// Mutable rings.
    pub fn rings_mut(&mut self) -> &mut Vec<LineString> {
        &mut self.rings
    }

    /// Number of rings.
    pub fn num_rings(&self) -> usize {
        self.rings.len()
    }

    /// Appends a ring.
    pub fn push_ring(&mut self, ring: LineString) {
        self.rings.push(ring);
    }

    /// Total number of coordinates in all rings.
    pub fn num_points(&self) -> usize {
        self.rings.iter().map(LineString::len).sum()
    }

    /// Returns true if there are no coordinates.
    pub fn is_empty(&self) -> bool {
        self.rings.iter().all(LineString::is_empty)
    }

    /// Bounding box of all rings.
    pub fn envelope(&self) -> Envelope {
        self.rings.iter().map(LineString::envelope).collect()
    }
}

impl From<LineString> for Polygon {
    fn from(exterior: LineString) -> Self {
        Self::from_exterior(exterior)
    }
}
