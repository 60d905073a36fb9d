//! Per-agent motion model.
//!
//! One call to [`step`] advances a single agent by one tick:
//!
//! 1. Integrate position with a unit-step explicit Euler update.
//! 2. Steer inward on each axis where the agent is inside the margin.
//! 3. Rescale velocity down to the speed limit, preserving direction.
//! 4. Recompute heading and speed from the final velocity.
//!
//! The step is pure and deterministic. Positions are never clamped to the
//! world box, so an agent may sit outside it for a few ticks while steering
//! turns it around.

use nautilus_types::{Agent, Vec2, heading_degrees};

use crate::config::WorldConfig;

/// Parameters of the motion model, derived once from [`WorldConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    /// Half extents of the world box.
    pub half_extent: Vec2,
    /// Steering margin as a fraction of the half extent.
    pub margin: f64,
    /// Velocity nudge applied inside the margin.
    pub turn_factor: f64,
    /// Maximum velocity magnitude.
    pub speed_limit: f64,
}

impl MotionParams {
    /// Lower steering threshold on each axis.
    fn lower_edge(&self) -> Vec2 {
        Vec2::new(
            -self.half_extent.x + self.margin * self.half_extent.x,
            -self.half_extent.y + self.margin * self.half_extent.y,
        )
    }

    /// Upper steering threshold on each axis.
    fn upper_edge(&self) -> Vec2 {
        Vec2::new(
            self.half_extent.x - self.margin * self.half_extent.x,
            self.half_extent.y - self.margin * self.half_extent.y,
        )
    }
}

impl From<&WorldConfig> for MotionParams {
    fn from(world: &WorldConfig) -> Self {
        Self {
            half_extent: Vec2::new(world.half_width, world.half_height),
            margin: world.margin,
            turn_factor: world.turn_factor,
            speed_limit: world.speed_limit,
        }
    }
}

impl Default for MotionParams {
    fn default() -> Self {
        Self::from(&WorldConfig::default())
    }
}

/// Advance one agent by one tick.
pub fn step(agent: &mut Agent, params: &MotionParams) {
    agent.position += agent.velocity;

    let lower = params.lower_edge();
    let upper = params.upper_edge();

    // Four independent checks: an agent can only be near one edge per axis,
    // but an else-chain would change which comparison wins on a tie.
    if agent.position.x < lower.x {
        agent.velocity.x += params.turn_factor;
    }
    if agent.position.x > upper.x {
        agent.velocity.x -= params.turn_factor;
    }
    if agent.position.y < lower.y {
        agent.velocity.y += params.turn_factor;
    }
    if agent.position.y > upper.y {
        agent.velocity.y -= params.turn_factor;
    }

    let speed = agent.velocity.length();
    if speed > params.speed_limit {
        agent.velocity = agent.velocity.scale(params.speed_limit / speed);
    }

    agent.heading = heading_degrees(agent.velocity);
    agent.speed = agent.velocity.length();
}

/// Advance every agent by one tick, in population order.
pub fn step_all(agents: &mut [Agent], params: &MotionParams) {
    for agent in agents {
        step(agent, params);
    }
}

#[cfg(test)]
mod tests {
    use nautilus_types::BoidId;

    use super::*;

    const EPS: f64 = 1e-9;

    fn agent(position: (f64, f64), velocity: (f64, f64)) -> Agent {
        Agent::new(
            BoidId::from_index(0),
            Vec2::new(position.0, position.1),
            Vec2::new(velocity.0, velocity.1),
        )
    }

    #[test]
    fn free_motion_is_explicit_euler() {
        let mut boid = agent((0.0, 0.0), (0.01, 0.005));
        step(&mut boid, &MotionParams::default());
        assert!((boid.position.x - 0.01).abs() < EPS);
        assert!((boid.position.y - 0.005).abs() < EPS);
        assert!((boid.velocity.x - 0.01).abs() < EPS);
        assert!((boid.velocity.y - 0.005).abs() < EPS);
    }

    #[test]
    fn steers_away_from_positive_x_edge() {
        let params = MotionParams::default();
        let mut boid = agent((1.0 - params.margin + 0.001, 0.0), (0.005, 0.0));
        let before = boid.velocity.x;
        step(&mut boid, &params);
        assert!(boid.velocity.x < before);
        assert!((boid.velocity.x - 0.004).abs() < EPS);
    }

    #[test]
    fn steers_away_from_negative_y_edge() {
        let params = MotionParams::default();
        let mut boid = agent((0.0, -0.95), (0.0, -0.005));
        step(&mut boid, &params);
        assert!((boid.velocity.y - (-0.005 + params.turn_factor)).abs() < EPS);
    }

    #[test]
    fn corner_steers_both_axes() {
        let params = MotionParams::default();
        let mut boid = agent((0.95, 0.95), (0.0, 0.0));
        step(&mut boid, &params);
        assert!((boid.velocity.x + params.turn_factor).abs() < EPS);
        assert!((boid.velocity.y + params.turn_factor).abs() < EPS);
    }

    #[test]
    fn margin_scales_with_half_extent() {
        let params = MotionParams {
            half_extent: Vec2::new(448.0, 298.5),
            ..MotionParams::default()
        };
        // 400 is inside the interior of a 448-wide half extent (edge at 403.2).
        let mut inside = agent((400.0, 0.0), (0.005, 0.0));
        step(&mut inside, &params);
        assert!((inside.velocity.x - 0.005).abs() < EPS);

        let mut near = agent((410.0, 0.0), (0.005, 0.0));
        step(&mut near, &params);
        assert!((near.velocity.x - 0.004).abs() < EPS);
    }

    #[test]
    fn heading_follows_velocity() {
        let params = MotionParams::default();
        for (velocity, expected) in [((0.0, 0.01), 90.0), ((0.01, 0.0), 0.0), ((-0.01, 0.0), 180.0)] {
            let mut boid = agent((0.0, 0.0), velocity);
            step(&mut boid, &params);
            assert!(
                (boid.heading - expected).abs() < EPS,
                "velocity {velocity:?} gave heading {}",
                boid.heading
            );
        }
    }

    #[test]
    fn clamp_preserves_direction() {
        let params = MotionParams::default();
        for velocity in [(0.3, 0.4), (-1.0, 0.2), (0.0, -0.9), (0.25, -0.25)] {
            let mut boid = agent((0.0, 0.0), velocity);
            let before = boid.velocity.scale(1.0 / boid.velocity.length());
            step(&mut boid, &params);

            let magnitude = boid.velocity.length();
            assert!((magnitude - params.speed_limit).abs() < EPS);
            let after = boid.velocity.scale(1.0 / magnitude);
            assert!((after.x - before.x).abs() < EPS);
            assert!((after.y - before.y).abs() < EPS);
            assert!((boid.speed - params.speed_limit).abs() < EPS);
        }
    }

    #[test]
    fn slow_agents_are_not_sped_up() {
        let mut boid = agent((0.0, 0.0), (0.001, 0.0));
        step(&mut boid, &MotionParams::default());
        assert!((boid.velocity.length() - 0.001).abs() < EPS);
    }

    #[test]
    fn zero_velocity_is_a_fixed_point() {
        let mut boid = agent((0.2, -0.3), (0.0, 0.0));
        let before = boid.clone();
        step(&mut boid, &MotionParams::default());
        assert_eq!(boid, before);
    }

    #[test]
    fn position_is_not_clamped() {
        let mut boid = agent((1.5, 0.0), (0.1, 0.0));
        step(&mut boid, &MotionParams::default());
        assert!(boid.position.x > 1.5);
        assert!((boid.velocity.x - 0.099).abs() < EPS);
    }

    #[test]
    fn step_all_updates_every_agent() {
        let mut agents = vec![agent((0.0, 0.0), (0.01, 0.0)), agent((0.0, 0.0), (0.0, 0.01))];
        step_all(&mut agents, &MotionParams::default());
        assert!(agents.iter().all(|a| a.position != Vec2::ZERO));
    }
}
