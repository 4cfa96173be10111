use approx::{AbsDiffEq, RelativeEq};
use serde::{Deserialize, Serialize};

/// A coordinate with up to four ordinates.
///
/// The geometry owning the coordinate decides which of `z` and `m` are meaningful, the unused ones
/// are ignored by codecs and comparisons made by the geometry. Constructors fill the missing
/// ordinates with `0.0`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    /// X ordinate.
    pub x: f64,
    /// Y ordinate.
    pub y: f64,
    /// Z ordinate.
    pub z: f64,
    /// Measure.
    pub m: f64,
}

impl Coord {
    /// 2D coordinate.
    pub const fn xy(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            m: 0.0,
        }
    }

    /// Coordinate with z.
    pub const fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, m: 0.0 }
    }

    /// Coordinate with a measure.
    pub const fn xym(x: f64, y: f64, m: f64) -> Self {
        Self { x, y, z: 0.0, m }
    }

    /// Coordinate with z and a measure.
    pub const fn xyzm(x: f64, y: f64, z: f64, m: f64) -> Self {
        Self { x, y, z, m }
    }

    /// Coordinate that marks an empty point.
    pub const fn nan() -> Self {
        Self {
            x: f64::NAN,
            y: f64::NAN,
            z: f64::NAN,
            m: f64::NAN,
        }
    }

    /// Whether x or y is NaN.
    pub fn is_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan()
    }
}

impl AbsDiffEq for Coord {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon)
            && self.y.abs_diff_eq(&other.y, epsilon)
            && self.z.abs_diff_eq(&other.z, epsilon)
            && self.m.abs_diff_eq(&other.m, epsilon)
    }
}

impl RelativeEq for Coord {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.x.relative_eq(&other.x, epsilon, max_relative)
            && self.y.relative_eq(&other.y, epsilon, max_relative)
            && self.z.relative_eq(&other.z, epsilon, max_relative)
            && self.m.relative_eq(&other.m, epsilon, max_relative)
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Self::xy(x, y)
    }
}

impl From<[f64; 2]> for Coord {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::xy(x, y)
    }
}

impl From<[f64; 3]> for Coord {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::xyz(x, y, z)
    }
}
