//! See [`Envelope`].

use approx::{AbsDiffEq, RelativeEq};
use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::error::GeometryError;

/// Axis aligned bounding rectangle (MBR).
///
/// Non-empty envelopes always have `x_min <= x_max` and `y_min <= y_max`. The empty envelope is
/// stored as `(MAX, MAX, -MAX, -MAX)`, which makes it the identity element of [`Envelope::union`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

impl Envelope {
    /// Creates a new envelope from its corners.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// The empty envelope.
    pub const fn empty() -> Self {
        Self {
            x_min: f64::MAX,
            y_min: f64::MAX,
            x_max: -f64::MAX,
            y_max: -f64::MAX,
        }
    }

    /// Smallest envelope containing all the given coordinates. NaN coordinates are skipped.
    pub fn from_coords<'a>(coords: impl IntoIterator<Item = &'a Coord>) -> Self {
        let mut envelope = Self::empty();
        for coord in coords {
            envelope.expand_to_include(coord.x, coord.y);
        }

        envelope
    }

    /// Minimum x.
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    /// Minimum y.
    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    /// Maximum x.
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    /// Maximum y.
    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    /// Returns false for inverted envelopes, including [`Envelope::empty`].
    pub fn is_valid(&self) -> bool {
        self.x_min <= self.x_max && self.y_min <= self.y_max
    }

    /// Returns true if the envelope does not cover any point.
    pub fn is_empty(&self) -> bool {
        !self.is_valid()
    }

    /// Width of the envelope.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Height of the envelope.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Area in the units of the envelope's reference system. Zero for empty envelopes.
    pub fn area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }

        self.width() * self.height()
    }

    /// Lower left corner.
    pub fn lower_left(&self) -> Coord {
        Coord::xy(self.x_min, self.y_min)
    }

    /// Upper right corner.
    pub fn upper_right(&self) -> Coord {
        Coord::xy(self.x_max, self.y_max)
    }

    /// Center of the envelope.
    pub fn center(&self) -> Result<Coord, GeometryError> {
        if self.is_empty() {
            return Err(GeometryError::InvalidState(
                "center of an empty envelope".into(),
            ));
        }

        Ok(Coord::xy(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        ))
    }

    /// Extends the envelope to cover the given point. NaN ordinates are ignored.
    pub fn expand_to_include(&mut self, x: f64, y: f64) {
        if x.is_nan() || y.is_nan() {
            return;
        }

        self.x_min = self.x_min.min(x);
        self.y_min = self.y_min.min(y);
        self.x_max = self.x_max.max(x);
        self.y_max = self.y_max.max(y);
    }

    /// Smallest envelope covering both envelopes.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Exact comparison of the corners.
    pub fn equals(&self, other: &Self) -> bool {
        self == other
    }

    /// Returns true if the envelopes have no point in common.
    pub fn disjoint(&self, other: &Self) -> bool {
        !self.intersects(other)
    }

    /// Returns true if the envelopes share at least one point, boundaries included.
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.x_max < other.x_min
            || self.x_min > other.x_max
            || self.y_max < other.y_min
            || self.y_min > other.y_max)
    }

    /// Returns true if the envelopes share an edge or a corner but no interior points.
    pub fn touches(&self, other: &Self) -> bool {
        if self.x_max == other.x_min || self.x_min == other.x_max {
            return !(self.y_max < other.y_min || self.y_min > other.y_max);
        }

        if self.y_max == other.y_min || self.y_min == other.y_max {
            return !(self.x_max < other.x_min || self.x_min > other.x_max);
        }

        false
    }

    /// Returns true if this envelope lies inside `other`.
    pub fn within(&self, other: &Self) -> bool {
        self.x_min >= other.x_min
            && self.x_max <= other.x_max
            && self.y_min >= other.y_min
            && self.y_max <= other.y_max
    }

    /// Returns true if `other` lies inside this envelope.
    pub fn contains(&self, other: &Self) -> bool {
        other.within(self)
    }

    /// Shortest distance between points of the two envelopes. Zero if they intersect.
    pub fn distance(&self, other: &Self) -> f64 {
        if self.intersects(other) {
            return 0.0;
        }

        let dx = if self.x_max < other.x_min {
            other.x_min - self.x_max
        } else if other.x_max < self.x_min {
            self.x_min - other.x_max
        } else {
            0.0
        };

        let dy = if self.y_max < other.y_min {
            other.y_min - self.y_max
        } else if other.y_max < self.y_min {
            self.y_min - other.y_max
        } else {
            0.0
        };

        dx.hypot(dy)
    }

    /// Common part of the two envelopes, degenerate if they only touch.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }

        Some(Self {
            x_min: self.x_min.max(other.x_min),
            y_min: self.y_min.max(other.y_min),
            x_max: self.x_max.min(other.x_max),
            y_max: self.y_max.min(other.y_max),
        })
    }

    /// Corners of the envelope in counter-clockwise order starting from the lower left one.
    pub fn into_quadrangle(self) -> [Coord; 4] {
        [
            Coord::xy(self.x_min, self.y_min),
            Coord::xy(self.x_max, self.y_min),
            Coord::xy(self.x_max, self.y_max),
            Coord::xy(self.x_min, self.y_max),
        ]
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<Envelope> for Envelope {
    fn from_iter<T: IntoIterator<Item = Envelope>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |acc, envelope| acc.union(&envelope))
    }
}

impl AbsDiffEq for Envelope {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.x_min.abs_diff_eq(&other.x_min, epsilon)
            && self.y_min.abs_diff_eq(&other.y_min, epsilon)
            && self.x_max.abs_diff_eq(&other.x_max, epsilon)
            && self.y_max.abs_diff_eq(&other.y_max, epsilon)
    }
}

impl RelativeEq for Envelope {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.x_min.relative_eq(&other.x_min, epsilon, max_relative)
            && self.y_min.relative_eq(&other.y_min, epsilon, max_relative)
            && self.x_max.relative_eq(&other.x_max, epsilon, max_relative)
            && self.y_max.relative_eq(&other.y_max, epsilon, max_relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    #[test]
    fn empty_envelope_is_union_identity() {
        let envelope = Envelope::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(envelope.union(&Envelope::empty()), envelope);
        assert_eq!(Envelope::empty().union(&envelope), envelope);
        assert!(Envelope::empty().union(&Envelope::empty()).is_empty());
    }

    #[test]
    fn union_covers_both() {
        let a = Envelope::new(0.0, 0.0, 1.0, 1.0);
        let b = Envelope::new(-1.0, 0.5, 0.5, 3.0);
        assert_eq!(a.union(&b), Envelope::new(-1.0, 0.0, 1.0, 3.0));

        let collected: Envelope = [a, b, Envelope::empty()].into_iter().collect();
        assert_eq!(collected, Envelope::new(-1.0, 0.0, 1.0, 3.0));

        let nothing: Envelope = std::iter::empty().collect();
        assert!(nothing.is_empty());
    }

    #[test]
    fn intersects_uses_closed_intervals() {
        let a = Envelope::new(0.0, 0.0, 1.0, 1.0);
        let touching = Envelope::new(1.0, 0.0, 2.0, 1.0);
        let corner = Envelope::new(1.0, 1.0, 2.0, 2.0);
        let apart = Envelope::new(1.5, 0.0, 2.0, 1.0);

        assert!(a.intersects(&touching));
        assert!(a.intersects(&corner));
        assert!(!a.intersects(&apart));
        assert!(a.disjoint(&apart));

        assert!(a.touches(&touching));
        assert!(a.touches(&corner));
        assert!(!a.touches(&Envelope::new(0.5, 0.5, 2.0, 2.0)));
    }

    #[test]
    fn within_and_contains() {
        let outer = Envelope::new(0.0, 0.0, 10.0, 10.0);
        let inner = Envelope::new(2.0, 2.0, 3.0, 3.0);
        assert!(inner.within(&outer));
        assert!(outer.contains(&inner));
        assert!(!outer.within(&inner));
        assert!(outer.contains(&outer));
    }

    #[test]
    fn intersection_and_distance() {
        let a = Envelope::new(0.0, 0.0, 2.0, 2.0);
        let b = Envelope::new(1.0, 1.0, 3.0, 3.0);
        assert_eq!(a.intersection(&b), Some(Envelope::new(1.0, 1.0, 2.0, 2.0)));
        assert_eq!(a.distance(&b), 0.0);

        let far = Envelope::new(5.0, 6.0, 7.0, 8.0);
        assert_eq!(a.intersection(&far), None);
        assert_abs_diff_eq!(a.distance(&far), 5.0);
    }

    #[test]
    fn center_of_empty_envelope_fails() {
        assert_matches!(
            Envelope::empty().center(),
            Err(GeometryError::InvalidState(_))
        );
        assert_abs_diff_eq!(
            Envelope::new(0.0, 0.0, 10.0, 4.0).center().unwrap(),
            Coord::xy(5.0, 2.0)
        );
    }

    #[test]
    fn from_coords_skips_nan() {
        let coords = [Coord::xy(1.0, 5.0), Coord::nan(), Coord::xy(-2.0, 3.0)];
        let envelope = Envelope::from_coords(&coords);
        assert_abs_diff_eq!(envelope, Envelope::new(-2.0, 3.0, 1.0, 5.0));
        assert_eq!(envelope.area(), 6.0);
        assert_eq!(Envelope::empty().area(), 0.0);
    }
}
