//! Buffers assembled from circles around vertices and rectangles along segments, merged with the
//! polygon union of `geo`.

use std::f64::consts::TAU;

use geo::orient::Direction;
use geo::{coord, unary_union, BooleanOps, Coord, LineString, MultiPolygon, Orient, Polygon};
use terrageom_types::{BufferParams, CapStyle};

/// Parts of a geometry grouped by their dimension.
#[derive(Default)]
struct Parts {
    points: Vec<Coord<f64>>,
    lines: Vec<LineString<f64>>,
    polygons: Vec<Polygon<f64>>,
}

impl Parts {
    fn collect(&mut self, geometry: &geo::Geometry<f64>) {
        match geometry {
            geo::Geometry::Point(point) => self.points.push(point.0),
            geo::Geometry::Line(line) => self
                .lines
                .push(LineString::new(vec![line.start, line.end])),
            geo::Geometry::LineString(line) => self.lines.push(line.clone()),
            geo::Geometry::Polygon(polygon) => {
                self.polygons.push(polygon.orient(Direction::Default))
            }
            geo::Geometry::MultiPoint(points) => {
                self.points.extend(points.iter().map(|point| point.0))
            }
            geo::Geometry::MultiLineString(lines) => self.lines.extend(lines.iter().cloned()),
            geo::Geometry::MultiPolygon(polygons) => self
                .polygons
                .extend(polygons.iter().map(|p| p.orient(Direction::Default))),
            geo::Geometry::GeometryCollection(collection) => {
                collection.iter().for_each(|member| self.collect(member))
            }
            geo::Geometry::Rect(rect) => self
                .polygons
                .push(rect.to_polygon().orient(Direction::Default)),
            geo::Geometry::Triangle(triangle) => self
                .polygons
                .push(triangle.to_polygon().orient(Direction::Default)),
        }
    }
}

/// Builds the counter-clockwise pieces whose union is the buffer.
struct Pieces {
    radius: f64,
    circle_segments: u32,
    cap_style: CapStyle,
    polygons: Vec<Polygon<f64>>,
}

impl Pieces {
    fn point(&mut self, center: Coord<f64>) {
        match self.cap_style {
            CapStyle::Round => self.circle(center),
            CapStyle::Square => {
                let r = self.radius;
                self.push(vec![
                    coord! { x: center.x - r, y: center.y - r },
                    coord! { x: center.x + r, y: center.y - r },
                    coord! { x: center.x + r, y: center.y + r },
                    coord! { x: center.x - r, y: center.y + r },
                ]);
            }
            CapStyle::Flat => {}
        }
    }

    /// Band around a line. Rings are closed and have no caps.
    fn line(&mut self, line: &LineString<f64>, closed: bool) {
        let coords = &line.0;
        match coords.len() {
            0 => return,
            1 => return self.point(coords[0]),
            _ => {}
        }

        for segment in coords.windows(2) {
            self.segment(segment[0], segment[1]);
        }

        let last = coords.len() - 1;
        let joins = if closed { 0..last } else { 1..last };
        for &vertex in &coords[joins] {
            self.circle(vertex);
        }

        if !closed {
            self.cap(coords[1], coords[0]);
            self.cap(coords[last - 1], coords[last]);
        }
    }

    /// Cap at the `end` of the segment coming from `from`.
    fn cap(&mut self, from: Coord<f64>, end: Coord<f64>) {
        match self.cap_style {
            CapStyle::Round => self.circle(end),
            CapStyle::Square => {
                let direction = end - from;
                let length = direction.x.hypot(direction.y);
                if length > 0.0 {
                    self.segment(end, end + direction * (self.radius / length));
                }
            }
            CapStyle::Flat => {}
        }
    }

    fn segment(&mut self, start: Coord<f64>, end: Coord<f64>) {
        let direction = end - start;
        let length = direction.x.hypot(direction.y);
        if length == 0.0 {
            return;
        }

        let normal = coord! { x: -direction.y, y: direction.x } * (self.radius / length);
        self.push(vec![
            start - normal,
            end - normal,
            end + normal,
            start + normal,
        ]);
    }

    fn circle(&mut self, center: Coord<f64>) {
        let ring = (0..self.circle_segments)
            .map(|i| {
                let angle = TAU * f64::from(i) / f64::from(self.circle_segments);
                coord! {
                    x: center.x + self.radius * angle.cos(),
                    y: center.y + self.radius * angle.sin(),
                }
            })
            .collect();
        self.push(ring);
    }

    fn push(&mut self, mut ring: Vec<Coord<f64>>) {
        if let Some(&first) = ring.first() {
            ring.push(first);
        }
        self.polygons.push(Polygon::new(LineString::new(ring), vec![]));
    }
}

/// Area within `params.distance()` of the geometry.
///
/// A negative distance shrinks the polygonal parts of the geometry and gives an empty result for
/// points and lines.
pub(crate) fn buffer(geometry: &geo::Geometry<f64>, params: &BufferParams) -> MultiPolygon<f64> {
    let mut parts = Parts::default();
    parts.collect(geometry);

    let distance = params.distance();
    if distance == 0.0 {
        return unary_union(&parts.polygons);
    }

    let mut pieces = Pieces {
        radius: distance.abs(),
        circle_segments: params.quadrant_segments().max(1) * 4,
        cap_style: params.cap_style(),
        polygons: vec![],
    };
    for polygon in &parts.polygons {
        pieces.line(polygon.exterior(), true);
        for interior in polygon.interiors() {
            pieces.line(interior, true);
        }
    }

    if distance < 0.0 {
        log::trace!("Eroding by {} pieces", pieces.polygons.len());
        return unary_union(&parts.polygons).difference(&unary_union(&pieces.polygons));
    }

    for &point in &parts.points {
        pieces.point(point);
    }
    for line in &parts.lines {
        pieces.line(line, false);
    }
    pieces.polygons.extend(parts.polygons);

    log::trace!("Merging {} buffer pieces", pieces.polygons.len());
    unary_union(&pieces.polygons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geo::{Area, BoundingRect};

    fn extent(buffer: &MultiPolygon<f64>) -> (f64, f64, f64, f64) {
        let rect = buffer.bounding_rect().unwrap();
        (rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    fn line() -> geo::Geometry<f64> {
        geo::Geometry::LineString(LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]))
    }

    #[test]
    fn point_circle_has_requested_segments() {
        let point = geo::Geometry::Point(geo::Point::new(0.0, 0.0));
        let params = BufferParams::new(1.0).with_quadrant_segments(1);
        let buffer = buffer(&point, &params);

        assert_eq!(buffer.0.len(), 1);
        assert_eq!(buffer.0[0].exterior().0.len(), 5);
        assert_abs_diff_eq!(buffer.unsigned_area(), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn line_caps() {
        let round = buffer(&line(), &BufferParams::new(1.0));
        let (x_min, y_min, x_max, y_max) = extent(&round);
        assert_abs_diff_eq!(x_min, -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(x_max, 11.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y_min, -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y_max, 1.0, epsilon = 1e-6);

        let flat = buffer(
            &line(),
            &BufferParams::new(1.0).with_cap_style(CapStyle::Flat),
        );
        assert_abs_diff_eq!(flat.unsigned_area(), 20.0, epsilon = 1e-6);

        let square = buffer(
            &line(),
            &BufferParams::new(1.0).with_cap_style(CapStyle::Square),
        );
        assert_abs_diff_eq!(square.unsigned_area(), 24.0, epsilon = 1e-6);
    }

    #[test]
    fn negative_distance_erodes_polygons() {
        let square = geo::Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (10.0, 0.0),
                (10.0, 10.0),
                (0.0, 10.0),
                (0.0, 0.0),
            ]),
            vec![],
        ));
        let eroded = buffer(&square, &BufferParams::new(-1.0));
        let (x_min, y_min, x_max, y_max) = extent(&eroded);
        assert_abs_diff_eq!(x_min, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y_min, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(x_max, 9.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y_max, 9.0, epsilon = 1e-6);

        assert!(buffer(&line(), &BufferParams::new(-1.0)).0.is_empty());
    }
}
