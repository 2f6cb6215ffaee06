//! Per-step agent state consumed by the planner.

use glam::DVec2;

use crate::geometry::Line;

/// A neighbor's state as observed by the subject agent.
///
/// Neighbors are read-only views scoped to one step; the planner never
/// holds on to them across steps.
#[derive(Debug, Clone, Copy)]
pub struct NeighborView {
    pub position: DVec2,
    pub velocity: DVec2,
    pub radius: f64,
}

/// Immutable input for one agent's velocity computation.
///
/// The caller assembles a snapshot once per agent per step. Neighbors are
/// assumed to be pre-filtered to the nearest few within sensing range;
/// their ordering does not affect the outcome of a successful solve.
/// `obstacle_lines`, if any, are pre-built constraints derived from static
/// obstacles with `obstacle_time_horizon`; they precede the agent-derived
/// constraints and are treated as hard during infeasibility recovery.
#[derive(Debug, Clone)]
pub struct AgentSnapshot {
    pub position: DVec2,
    /// Velocity the agent is currently moving at. Never mutated by the
    /// planner; the new velocity is returned to the caller, which commits
    /// it once every agent of the step has been computed.
    pub velocity: DVec2,
    /// Velocity the agent would pick with nobody else around.
    pub preferred_velocity: DVec2,
    pub radius: f64,
    pub max_speed: f64,
    /// How far ahead (seconds) collisions with other agents are avoided.
    pub time_horizon: f64,
    /// Look-ahead used by the (external) derivation of `obstacle_lines`.
    pub obstacle_time_horizon: f64,
    pub neighbors: Vec<NeighborView>,
    pub obstacle_lines: Vec<Line>,
}

impl AgentSnapshot {
    /// This agent's state as seen from another agent's perspective.
    #[must_use]
    pub const fn as_neighbor(&self) -> NeighborView {
        NeighborView {
            position: self.position,
            velocity: self.velocity,
            radius: self.radius,
        }
    }
}
