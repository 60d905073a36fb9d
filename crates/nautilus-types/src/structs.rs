//! Core simulation structs: 2-D vectors, agents, and the frame snapshot.

use core::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::ids::BoidId;

// ---------------------------------------------------------------------------
// Vec2
// ---------------------------------------------------------------------------

/// A point or displacement in the simulation plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Construct a vector from its components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `radians` (counter-clockwise from +x).
    pub fn from_angle(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self { x: cos, y: sin }
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Multiply both components by `factor`.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A single simulated boid.
///
/// `heading` and `speed` are projections of `velocity`. The motion model
/// recomputes both after every step; nothing else writes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Identity assigned at population creation.
    pub id: BoidId,
    /// Current position in world units.
    pub position: Vec2,
    /// Displacement applied on the next step.
    pub velocity: Vec2,
    /// Direction of travel in degrees, in `(-180, 180]`.
    pub heading: f64,
    /// Magnitude of `velocity`.
    pub speed: f64,
}

impl Agent {
    /// Create an agent, deriving heading and speed from `velocity`.
    pub fn new(id: BoidId, position: Vec2, velocity: Vec2) -> Self {
        Self {
            id,
            position,
            velocity,
            heading: heading_degrees(velocity),
            speed: velocity.length(),
        }
    }
}

/// Direction of `velocity` in degrees, normalized into `(-180, 180]`.
///
/// `atan2` returns `-180` for a velocity along the negative x axis with a
/// negative-zero y component; that case is folded onto `+180`.
pub fn heading_degrees(velocity: Vec2) -> f64 {
    let degrees = velocity.y.atan2(velocity.x).to_degrees();
    if degrees <= -180.0 { 180.0 } else { degrees }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Immutable snapshot of the whole population at one tick.
///
/// Built once per tick by the scheduler and shared read-only with the
/// encoder and the active sink. Frames are never retained past a single
/// dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Sequence number of the tick that produced this frame (1-based).
    pub tick: u64,
    /// Wall-clock instant of the tick, Unix milliseconds.
    pub timestamp_ms: i64,
    /// Every agent, in population order.
    pub agents: Vec<Agent>,
}

impl Frame {
    /// Tick timestamp in Unix nanoseconds (milliseconds x 10^6).
    pub const fn timestamp_ns(&self) -> i64 {
        self.timestamp_ms.saturating_mul(1_000_000)
    }

    /// Number of agents in the snapshot.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the snapshot contains no agents.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
