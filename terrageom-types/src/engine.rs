//! Boundary to the geometry engine that evaluates topological predicates and operations.
//!
//! The data model does not implement computational geometry. Predicates such as
//! [`Geometry::intersects`] and operations such as [`Geometry::buffer`] are checked locally and then
//! delegated to a [`PredicateEngine`] installed with [`install`]. Engines receive geometries
//! without any guarantee about their SRID; the caller re-attaches the SRID to the geometries they
//! return.

use std::cell::RefCell;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::geometry::Geometry;
use crate::relation::SpatialRelation;

/// Set operation between two geometries.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlayOp {
    /// Points in both geometries.
    Intersection,
    /// Points in any of the geometries.
    Union,
    /// Points in the first geometry but not in the second.
    Difference,
    /// Points in exactly one of the geometries.
    SymDifference,
}

/// Style of the ends of buffered lines.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapStyle {
    /// Half circle.
    #[default]
    Round,
    /// Cut at the end point.
    Flat,
    /// Square extending past the end point by the buffer distance.
    Square,
}

/// Parameters of a buffer operation.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferParams {
    distance: f64,
    quadrant_segments: u32,
    cap_style: CapStyle,
}

impl BufferParams {
    /// Number of segments used to approximate a quarter of a circle by default.
    pub const DEFAULT_QUADRANT_SEGMENTS: u32 = 16;

    /// Buffer of the given distance with round caps.
    pub fn new(distance: f64) -> Self {
        Self {
            distance,
            quadrant_segments: Self::DEFAULT_QUADRANT_SEGMENTS,
            cap_style: CapStyle::Round,
        }
    }

    /// Sets the buffer distance.
    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    /// Sets the number of segments per quarter circle.
    pub fn with_quadrant_segments(mut self, quadrant_segments: u32) -> Self {
        self.quadrant_segments = quadrant_segments;
        self
    }

    /// Sets the cap style.
    pub fn with_cap_style(mut self, cap_style: CapStyle) -> Self {
        self.cap_style = cap_style;
        self
    }

    /// Buffer distance.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Segments per quarter circle.
    pub fn quadrant_segments(&self) -> u32 {
        self.quadrant_segments
    }

    /// Cap style.
    pub fn cap_style(&self) -> CapStyle {
        self.cap_style
    }
}

impl Default for BufferParams {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Engine evaluating topological predicates and operations.
///
/// Implementations should not look at SRIDs: both operands are guaranteed to have the same one,
/// and geometry results get the SRID of the receiver after the engine returns.
pub trait PredicateEngine: Send + Sync {
    /// Name of the engine used in logs and error messages.
    fn name(&self) -> &str;

    /// Evaluates a named spatial relation.
    fn predicate(
        &self,
        relation: SpatialRelation,
        a: &Geometry,
        b: &Geometry,
    ) -> Result<bool, GeometryError>;

    /// DE-9IM intersection matrix of the two geometries as a 9 character string, e.g. `212101212`.
    fn relate_matrix(&self, a: &Geometry, b: &Geometry) -> Result<String, GeometryError>;

    /// Checks the intersection matrix against a pattern such as `T*F**FFF*`.
    fn relate_pattern(
        &self,
        a: &Geometry,
        b: &Geometry,
        pattern: &str,
    ) -> Result<bool, GeometryError>;

    /// Shortest distance between the geometries.
    fn distance(&self, a: &Geometry, b: &Geometry) -> Result<f64, GeometryError>;

    /// Returns true if the geometries are not farther from each other than `distance`.
    fn is_within_distance(
        &self,
        a: &Geometry,
        b: &Geometry,
        distance: f64,
    ) -> Result<bool, GeometryError> {
        Ok(self.distance(a, b)? <= distance)
    }

    /// Set operation.
    fn overlay(
        &self,
        op: OverlayOp,
        a: &Geometry,
        b: &Geometry,
    ) -> Result<Geometry, GeometryError>;

    /// Area within the buffer distance from the geometry.
    fn buffer(&self, geometry: &Geometry, params: &BufferParams)
        -> Result<Geometry, GeometryError>;

    /// Smallest convex polygon containing the geometry.
    fn convex_hull(&self, geometry: &Geometry) -> Result<Geometry, GeometryError>;

    /// Checks OGC validity.
    fn is_valid(&self, _geometry: &Geometry) -> Result<bool, GeometryError> {
        Err(GeometryError::Unsupported(format!(
            "{} does not check validity",
            self.name()
        )))
    }

    /// Checks that the geometry has no anomalous points such as self intersections.
    fn is_simple(&self, _geometry: &Geometry) -> Result<bool, GeometryError> {
        Err(GeometryError::Unsupported(format!(
            "{} does not check simplicity",
            self.name()
        )))
    }

    /// Combinatorial boundary of the geometry.
    fn boundary(&self, _geometry: &Geometry) -> Result<Geometry, GeometryError> {
        Err(GeometryError::Unsupported(format!(
            "{} does not compute boundaries",
            self.name()
        )))
    }
}

static ENGINE: LazyLock<RwLock<Option<Arc<dyn PredicateEngine>>>> =
    LazyLock::new(|| RwLock::new(None));

/// Installs the engine used by geometry predicates and operations, replacing the previous one.
pub fn install(engine: Arc<dyn PredicateEngine>) {
    log::debug!("Installing geometry engine {}", engine.name());
    *ENGINE.write() = Some(engine);
}

/// Removes the installed engine.
pub fn uninstall() -> Option<Arc<dyn PredicateEngine>> {
    ENGINE.write().take()
}

thread_local! {
    static SCOPED_ENGINE: RefCell<Option<Arc<dyn PredicateEngine>>> = const { RefCell::new(None) };
}

struct ScopeGuard {
    previous: Option<Arc<dyn PredicateEngine>>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        SCOPED_ENGINE.with(|scoped| *scoped.borrow_mut() = previous);
    }
}

/// Runs `f` with `engine` used instead of the installed one on the current thread.
pub fn with_engine<T>(engine: Arc<dyn PredicateEngine>, f: impl FnOnce() -> T) -> T {
    let previous = SCOPED_ENGINE.with(|scoped| scoped.replace(Some(engine)));
    let _guard = ScopeGuard { previous };
    f()
}

/// Engine used by the current thread: the scoped one set by [`with_engine`], or the installed one.
pub fn current() -> Result<Arc<dyn PredicateEngine>, GeometryError> {
    if let Some(engine) = SCOPED_ENGINE.with(|scoped| scoped.borrow().clone()) {
        return Ok(engine);
    }

    ENGINE.read().clone().ok_or(GeometryError::EngineUnavailable)
}
