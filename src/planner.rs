//! The per-agent velocity selector.
//!
//! A [`VelocityPlanner`] turns one agent's snapshot into its next velocity:
//! one half-plane constraint per neighbor (after any pre-built obstacle
//! constraints), then the incremental linear program, then the recovery
//! pass when the constraints turn out to be mutually infeasible. The
//! selector is a pure function of its inputs and never fails; the returned
//! velocity always has magnitude at most the agent's max speed.

use glam::DVec2;

use crate::agent::{AgentSnapshot, NeighborView};
use crate::geometry::Line;
use crate::{orca, solver};

/// Default tolerance for parallel-line and feasibility tests.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// ORCA velocity selector with a fixed numerical tolerance.
///
/// The tolerance is set once at construction; everything else arrives per
/// call, so a single planner can serve any number of agents, including
/// concurrently from multiple threads.
#[derive(Debug, Clone, Copy)]
pub struct VelocityPlanner {
    epsilon: f64,
}

impl Default for VelocityPlanner {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl VelocityPlanner {
    /// A planner with a custom tolerance. `epsilon` must be positive.
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        debug_assert!(epsilon > 0.0, "tolerance must be positive");
        Self { epsilon }
    }

    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Build the half-plane constraint that keeps `agent` clear of
    /// `neighbor` for `time_horizon` seconds; overlapping pairs get a
    /// constraint that separates them within one `dt`-length step.
    #[must_use]
    pub fn build_agent_orca_line(
        &self,
        agent: &AgentSnapshot,
        neighbor: &NeighborView,
        time_horizon: f64,
        dt: f64,
    ) -> Line {
        orca::agent_orca_line(agent, neighbor, time_horizon, dt, self.epsilon)
    }

    /// Find the velocity inside the disk of radius `radius` that satisfies
    /// the ordered half-plane constraints and optimizes for `target`
    /// (closest point, or furthest along `target` when `directional`).
    ///
    /// Returns `(fail_index, velocity)`; `fail_index == lines.len()` means
    /// success. On failure the velocity is the optimum over the
    /// constraints preceding `fail_index`, ready to seed
    /// [`Self::linear_program_3`].
    #[must_use]
    pub fn linear_program_2(
        &self,
        lines: &[Line],
        radius: f64,
        target: DVec2,
        directional: bool,
    ) -> (usize, DVec2) {
        solver::linear_program_2(lines, radius, target, directional, self.epsilon)
    }

    /// Best-effort recovery for a mutually infeasible constraint set:
    /// minimize the worst violation among the agent-derived lines while
    /// keeping the first `obstacle_count` lines hard. `begin` is the fail
    /// index reported by [`Self::linear_program_2`] and `velocity` its
    /// last feasible iterate.
    #[must_use]
    pub fn linear_program_3(
        &self,
        lines: &[Line],
        obstacle_count: usize,
        begin: usize,
        radius: f64,
        velocity: DVec2,
    ) -> DVec2 {
        solver::linear_program_3(lines, obstacle_count, begin, radius, velocity, self.epsilon)
    }

    /// Compute the agent's next velocity from its snapshot.
    ///
    /// Obstacle constraints come first, then one constraint per neighbor.
    /// The result is the feasible velocity closest to the preferred one,
    /// or the least-violating velocity when no feasible one exists. The
    /// snapshot is not mutated; committing the returned velocity is the
    /// caller's job, after every agent of the step has been computed.
    #[must_use]
    pub fn compute_new_velocity(&self, snapshot: &AgentSnapshot, dt: f64) -> DVec2 {
        let mut lines =
            Vec::with_capacity(snapshot.obstacle_lines.len() + snapshot.neighbors.len());
        lines.extend_from_slice(&snapshot.obstacle_lines);
        let obstacle_count = lines.len();
        for neighbor in &snapshot.neighbors {
            lines.push(orca::agent_orca_line(
                snapshot,
                neighbor,
                snapshot.time_horizon,
                dt,
                self.epsilon,
            ));
        }

        let (fail, velocity) = solver::linear_program_2(
            &lines,
            snapshot.max_speed,
            snapshot.preferred_velocity,
            false,
            self.epsilon,
        );
        if fail < lines.len() {
            return solver::linear_program_3(
                &lines,
                obstacle_count,
                fail,
                snapshot.max_speed,
                velocity,
                self.epsilon,
            );
        }
        velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn snapshot(position: DVec2, velocity: DVec2, preferred: DVec2) -> AgentSnapshot {
        AgentSnapshot {
            position,
            velocity,
            preferred_velocity: preferred,
            radius: 1.0,
            max_speed: 2.0,
            time_horizon: 2.0,
            obstacle_time_horizon: 1.0,
            neighbors: Vec::new(),
            obstacle_lines: Vec::new(),
        }
    }

    #[test]
    fn lone_agent_gets_clamped_preferred_velocity() {
        let planner = VelocityPlanner::default();
        let free = snapshot(DVec2::ZERO, DVec2::ZERO, DVec2::new(1.0, 0.5));
        assert_eq!(
            planner.compute_new_velocity(&free, 0.1),
            DVec2::new(1.0, 0.5)
        );

        let eager = snapshot(DVec2::ZERO, DVec2::ZERO, DVec2::new(10.0, 0.0));
        assert_eq!(
            planner.compute_new_velocity(&eager, 0.1),
            DVec2::new(2.0, 0.0)
        );
    }

    #[test]
    fn result_never_exceeds_max_speed() {
        // Crowded random snapshots, including overlapping neighbors that
        // force the recovery pass.
        let planner = VelocityPlanner::default();
        let mut rng = StdRng::seed_from_u64(0xcafe);
        for _ in 0..100 {
            let mut agent = snapshot(
                DVec2::ZERO,
                DVec2::new(rng.random_range(-2.0..2.0), rng.random_range(-2.0..2.0)),
                DVec2::new(rng.random_range(-3.0..3.0), rng.random_range(-3.0..3.0)),
            );
            for _ in 0..rng.random_range(1..8) {
                agent.neighbors.push(NeighborView {
                    position: DVec2::new(
                        rng.random_range(-3.0..3.0),
                        rng.random_range(-3.0..3.0),
                    ),
                    velocity: DVec2::new(
                        rng.random_range(-2.0..2.0),
                        rng.random_range(-2.0..2.0),
                    ),
                    radius: 1.0,
                });
            }
            let velocity = planner.compute_new_velocity(&agent, 0.1);
            assert!(
                velocity.length_squared() <= agent.max_speed * agent.max_speed + 1e-9,
                "speed {} over cap",
                velocity.length()
            );
        }
    }

    #[test]
    fn repeated_computation_is_bit_identical() {
        let planner = VelocityPlanner::default();
        let mut agent = snapshot(DVec2::ZERO, DVec2::new(1.0, 0.0), DVec2::new(2.0, 0.0));
        agent.neighbors.push(NeighborView {
            position: DVec2::new(3.0, 0.5),
            velocity: DVec2::new(-1.0, 0.0),
            radius: 1.0,
        });
        agent.neighbors.push(NeighborView {
            position: DVec2::new(2.0, -1.5),
            velocity: DVec2::new(0.0, 1.0),
            radius: 1.0,
        });

        let first = planner.compute_new_velocity(&agent, 0.1);
        let second = planner.compute_new_velocity(&agent, 0.1);
        assert_eq!(first.x.to_bits(), second.x.to_bits());
        assert_eq!(first.y.to_bits(), second.y.to_bits());
    }

    #[test]
    fn mirrored_agents_get_mirrored_velocities() {
        let planner = VelocityPlanner::default();
        let mut a = snapshot(
            DVec2::new(-4.0, 0.5),
            DVec2::new(1.0, -0.1),
            DVec2::new(1.5, 0.0),
        );
        let mut b = snapshot(
            DVec2::new(4.0, -0.5),
            DVec2::new(-1.0, 0.1),
            DVec2::new(-1.5, 0.0),
        );
        a.neighbors.push(b.as_neighbor());
        b.neighbors.push(a.as_neighbor());

        let velocity_a = planner.compute_new_velocity(&a, 0.1);
        let velocity_b = planner.compute_new_velocity(&b, 0.1);
        assert!((velocity_a + velocity_b).length() <= 1e-12);
    }

    #[test]
    fn obstacle_lines_stay_hard_under_recovery() {
        // The obstacle bound caps v.y; two overlapping neighbors squeeze
        // the agent into infeasibility, and the recovery pass must still
        // honor the obstacle bound.
        let planner = VelocityPlanner::default();
        let mut agent = snapshot(DVec2::ZERO, DVec2::ZERO, DVec2::new(0.0, 1.5));
        // Feasible side of this line is v.y <= 0.5.
        let cap = Line::new(DVec2::new(0.0, 0.5), DVec2::NEG_X);
        agent.obstacle_lines.push(cap);
        agent.neighbors.push(NeighborView {
            position: DVec2::new(0.8, 0.0),
            velocity: DVec2::ZERO,
            radius: 1.0,
        });
        agent.neighbors.push(NeighborView {
            position: DVec2::new(-0.8, 0.0),
            velocity: DVec2::ZERO,
            radius: 1.0,
        });

        let velocity = planner.compute_new_velocity(&agent, 0.1);
        assert!(
            cap.violation(velocity) <= planner.epsilon(),
            "obstacle constraint violated by {velocity:?}"
        );
    }

    #[test]
    fn custom_tolerance_is_stored() {
        let planner = VelocityPlanner::new(1e-9);
        assert!((planner.epsilon() - 1e-9).abs() < f64::EPSILON);
    }
}
