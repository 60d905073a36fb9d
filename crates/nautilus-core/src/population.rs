//! Population initialization and ownership.
//!
//! The population is created once at startup from a seeded PRNG and then
//! mutated in place by the scheduler every tick. It is never resized.
//! Two populations spawned from the same seed and configuration are
//! identical, which is what makes a run reproducible.

use core::f64::consts::TAU;

use nautilus_types::{Agent, BoidId, Frame, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{PopulationConfig, WorldConfig};
use crate::motion::{self, MotionParams};

/// The fixed, ordered set of agents owned by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    agents: Vec<Agent>,
    seed: u64,
}

impl Population {
    /// Spawn `config.size` agents from `seed`.
    ///
    /// Positions are uniform in the world box, headings uniform in
    /// `[0, 2π)`, and speeds uniform in `[speed_min, speed_max)`.
    pub fn spawn(config: &PopulationConfig, world: &WorldConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let agents = (0..config.size)
            .map(|index| {
                let angle = rng.random::<f64>() * TAU;
                let speed = sample_band(&mut rng, config.speed_min, config.speed_max);
                let position = Vec2::new(
                    (rng.random::<f64>() * 2.0 - 1.0) * world.half_width,
                    (rng.random::<f64>() * 2.0 - 1.0) * world.half_height,
                );
                Agent::new(
                    BoidId::from_index(index),
                    position,
                    Vec2::from_angle(angle).scale(speed),
                )
            })
            .collect();

        Self { agents, seed }
    }

    /// Seed this population was spawned from.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Read-only view of the agents, in population order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Number of agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the population is empty.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Advance every agent by one tick.
    pub fn advance(&mut self, params: &MotionParams) {
        motion::step_all(&mut self.agents, params);
    }

    /// Copy the current state into an immutable frame.
    pub fn snapshot(&self, tick: u64, timestamp_ms: i64) -> Frame {
        Frame {
            tick,
            timestamp_ms,
            agents: self.agents.clone(),
        }
    }
}

/// Uniform draw from `[min, max)`, or `min` when the band is empty.
fn sample_band(rng: &mut StdRng, min: f64, max: f64) -> f64 {
    min + rng.random::<f64>() * (max - min)
}
