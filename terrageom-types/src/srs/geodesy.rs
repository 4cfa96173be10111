use geodesy::prelude::*;
use parking_lot::Mutex;

use crate::coord::Coord;
use crate::srs::Projection;

/// Projection defined by a `geodesy` operator pipeline, e.g. `"laea lon_0=10 lat_0=52"`.
///
/// Input coordinates are longitude/latitude degrees.
pub struct GeodesyProjection {
    context: Mutex<Minimal>,
    op: OpHandle,
}

impl GeodesyProjection {
    /// Creates the projection, returns `None` if the definition cannot be parsed.
    pub fn new(definition: &str) -> Option<Self> {
        let mut context = Minimal::new();
        let op = context.op(definition).ok()?;
        Some(Self {
            context: Mutex::new(context),
            op,
        })
    }
}

impl Projection for GeodesyProjection {
    fn project(&self, input: &Coord) -> Option<Coord> {
        let mut data = [Coor2D::geo(input.y, input.x)];
        self.context.lock().apply(self.op, Fwd, &mut data).ok()?;

        let [x, y] = data[0].0;
        if !x.is_finite() || !y.is_finite() {
            return None;
        }

        Some(Coord { x, y, ..*input })
    }

    fn unproject(&self, input: &Coord) -> Option<Coord> {
        let mut data = [Coor2D([input.x, input.y])];
        self.context.lock().apply(self.op, Inv, &mut data).ok()?;

        let [lon, lat] = data[0].0;
        Some(Coord {
            x: lon.to_degrees(),
            y: lat.to_degrees(),
            ..*input
        })
    }
}
