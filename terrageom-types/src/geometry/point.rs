use serde::{Deserialize, Serialize};

use crate::coord::Coord;

/// A single position. A point with NaN x and y is the empty point.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    coord: Coord,
}

impl Point {
    /// Creates a new point.
    pub fn new(coord: Coord) -> Self {
        Self { coord }
    }

    /// 2D point.
    pub fn xy(x: f64, y: f64) -> Self {
        Self::new(Coord::xy(x, y))
    }

    /// The empty point.
    pub fn empty() -> Self {
        Self::new(Coord::nan())
    }

    /// Position of the point.
    pub fn coord(&self) -> &Coord {
        &self.coord
    }

    /// Mutable position of the point.
    pub fn coord_mut(&mut self) -> &mut Coord {
        &mut self.coord
    }

    /// X ordinate.
    pub fn x(&self) -> f64 {
        self.coord.x
    }

    /// Y ordinate.
    pub fn y(&self) -> f64 {
        self.coord.y
    }

    /// Z ordinate.
    pub fn z(&self) -> f64 {
        self.coord.z
    }

    /// Measure.
    pub fn m(&self) -> f64 {
        self.coord.m
    }

    /// Sets x.
    pub fn set_x(&mut self, x: f64) {
        self.coord.x = x;
    }

    /// Sets y.
    pub fn set_y(&mut self, y: f64) {
        self.coord.y = y;
    }

    /// Sets z.
    pub fn set_z(&mut self, z: f64) {
        self.coord.z = z;
    }

    /// Sets the measure.
    pub fn set_m(&mut self, m: f64) {
        self.coord.m = m;
    }

    /// Returns true for the empty point.
    pub fn is_empty(&self) -> bool {
        self.coord.is_nan()
    }
}

impl From<Coord> for Point {
    fn from(coord: Coord) -> Self {
        Self::new(coord)
    }
}
