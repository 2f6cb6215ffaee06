//! Optimal Reciprocal Collision Avoidance (ORCA) velocity planning for
//! disk-shaped agents in the plane.
//!
//! The heart of the crate is [`VelocityPlanner`]: given one agent's
//! snapshot (state, neighbors, optional pre-built obstacle constraints),
//! it returns the velocity closest to the agent's preferred one that is
//! collision-free for the configured time horizon, assuming neighbors run
//! the same planner and take their half of every avoidance maneuver.
//! [`Simulator`] wraps the planner with neighbor discovery and the
//! double-buffered stepping discipline for whole populations.
//!
//! All math is IEEE-754 double precision (`glam::DVec2`), and the planner
//! is deterministic: identical inputs produce bit-identical velocities.
//!
//! The constraint construction and the three-stage linear program follow
//! van den Berg, Guy, Lin, Manocha — "Reciprocal n-Body Collision
//! Avoidance" (2011) and the RVO2 library that accompanies it.

pub mod agent;
pub mod geometry;
mod orca;
pub mod planner;
pub mod simulation;
pub mod spatial_hash;
mod solver;

pub use agent::{AgentSnapshot, NeighborView};
pub use geometry::{Line, det};
pub use planner::{DEFAULT_EPSILON, VelocityPlanner};
pub use simulation::{Agent, SimulationConfig, Simulator};
pub use spatial_hash::SpatialHash;
