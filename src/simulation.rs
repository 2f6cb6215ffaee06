//! Double-buffered multi-agent stepping around the planner core.
//!
//! The simulator owns the agent population and runs the per-step
//! discipline the planner relies on: snapshot every agent, compute every
//! new velocity from that snapshot, then commit positions and velocities
//! in a separate pass. No agent ever observes a same-step update of
//! another agent.

use glam::DVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::agent::{AgentSnapshot, NeighborView};
use crate::geometry::Line;
use crate::planner::VelocityPlanner;
use crate::spatial_hash::SpatialHash;

// === Constants ===

/// Default simulation step length in seconds.
const DEFAULT_TIME_STEP: f64 = 0.1;
/// Default look-ahead for agent-agent avoidance in seconds.
const DEFAULT_TIME_HORIZON: f64 = 2.0;
/// Default look-ahead for obstacle avoidance in seconds.
const DEFAULT_OBSTACLE_TIME_HORIZON: f64 = 1.0;
/// Default neighbor search radius.
const DEFAULT_NEIGHBOR_DISTANCE: f64 = 15.0;
/// Default cap on constraints per agent.
const DEFAULT_MAX_NEIGHBORS: usize = 10;
/// Default preferred-velocity jitter, as a fraction of preferred speed.
const DEFAULT_JITTER: f64 = 0.01;

// === Configuration ===

/// Global stepping parameters.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Step length in seconds.
    pub time_step: f64,
    /// How far ahead agents avoid each other.
    pub time_horizon: f64,
    /// How far ahead obstacle constraints look; forwarded to snapshots for
    /// callers that derive obstacle lines.
    pub obstacle_time_horizon: f64,
    /// Neighbor search radius. Should cover `max_speed * time_horizon`.
    pub neighbor_distance: f64,
    /// Keep only this many nearest neighbors per agent.
    pub max_neighbors: usize,
    /// Magnitude cap of the preferred-velocity perturbation, as a fraction
    /// of each agent's preferred speed. Perfectly symmetric setups
    /// (head-on pairs, rings) stall without it; zero disables it.
    pub jitter: f64,
    /// Seed for the jitter stream. Runs with equal seeds and populations
    /// are bit-identical.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: DEFAULT_TIME_STEP,
            time_horizon: DEFAULT_TIME_HORIZON,
            obstacle_time_horizon: DEFAULT_OBSTACLE_TIME_HORIZON,
            neighbor_distance: DEFAULT_NEIGHBOR_DISTANCE,
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
            jitter: DEFAULT_JITTER,
            seed: 0,
        }
    }
}

// === Agents ===

/// One simulated agent.
#[derive(Debug, Clone)]
pub struct Agent {
    pub position: DVec2,
    pub velocity: DVec2,
    /// Where the agent is headed. The preferred velocity aims here at
    /// `preferred_speed`, slowing down on final approach.
    pub goal: DVec2,
    pub preferred_speed: f64,
    pub radius: f64,
    pub max_speed: f64,
    /// Pre-built obstacle constraints this agent must respect, forwarded
    /// to its snapshot every step.
    pub obstacle_lines: Vec<Line>,
    /// Buffered output of the current step; committed after every agent
    /// has been computed.
    new_velocity: DVec2,
}

impl Agent {
    /// An agent at rest that wants to reach `goal` at full speed.
    #[must_use]
    pub fn new(position: DVec2, goal: DVec2, radius: f64, max_speed: f64) -> Self {
        Self {
            position,
            velocity: DVec2::ZERO,
            goal,
            preferred_speed: max_speed,
            radius,
            max_speed,
            obstacle_lines: Vec::new(),
            new_velocity: DVec2::ZERO,
        }
    }

    /// Distance left to the goal.
    #[must_use]
    pub fn distance_to_goal(&self) -> f64 {
        (self.goal - self.position).length()
    }
}

// === Simulator ===

/// Owns the agents and advances them step by step.
pub struct Simulator {
    planner: VelocityPlanner,
    config: SimulationConfig,
    agents: Vec<Agent>,
    hash: SpatialHash,
    rng: StdRng,
}

impl Simulator {
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_planner(config, VelocityPlanner::default())
    }

    #[must_use]
    pub fn with_planner(config: SimulationConfig, planner: VelocityPlanner) -> Self {
        let hash = SpatialHash::new(config.neighbor_distance);
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            planner,
            config,
            agents: Vec::new(),
            hash,
            rng,
        }
    }

    /// Add an agent and return its index.
    pub fn add_agent(&mut self, agent: Agent) -> usize {
        self.agents.push(agent);
        self.agents.len() - 1
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[must_use]
    pub fn agent(&self, index: usize) -> &Agent {
        &self.agents[index]
    }

    pub fn agent_mut(&mut self, index: usize) -> &mut Agent {
        &mut self.agents[index]
    }

    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Advance the simulation by one step.
    ///
    /// Phase 1 rebuilds the spatial hash, phase 2 computes every agent's
    /// next velocity from the step-entry state, phase 3 commits velocities
    /// and integrates positions.
    pub fn step(&mut self) {
        let dt = self.config.time_step;

        self.hash.clear();
        for (index, agent) in self.agents.iter().enumerate() {
            self.hash.insert(index, agent.position);
        }

        let mut candidates: Vec<usize> = Vec::new();
        for index in 0..self.agents.len() {
            let agent = self.agents[index].clone();
            let preferred = self.preferred_velocity(&agent);

            candidates.clear();
            self.hash
                .query_into(agent.position, self.config.neighbor_distance, &mut candidates);
            let neighbors = self.select_neighbors(index, &candidates);

            let snapshot = AgentSnapshot {
                position: agent.position,
                velocity: agent.velocity,
                preferred_velocity: preferred,
                radius: agent.radius,
                max_speed: agent.max_speed,
                time_horizon: self.config.time_horizon,
                obstacle_time_horizon: self.config.obstacle_time_horizon,
                neighbors,
                obstacle_lines: agent.obstacle_lines,
            };
            self.agents[index].new_velocity = self.planner.compute_new_velocity(&snapshot, dt);
        }

        for agent in &mut self.agents {
            agent.velocity = agent.new_velocity;
            agent.position += agent.velocity * dt;
        }
    }

    /// Goal-seeking preferred velocity with the seeded tie-breaking
    /// perturbation applied on top.
    fn preferred_velocity(&mut self, agent: &Agent) -> DVec2 {
        let to_goal = agent.goal - agent.position;
        let distance = to_goal.length();
        let base = if distance <= self.planner.epsilon() {
            DVec2::ZERO
        } else {
            // Slow down on final approach instead of overshooting.
            let speed = agent
                .preferred_speed
                .min(distance / self.config.time_step);
            to_goal / distance * speed
        };

        let cap = self.config.jitter * agent.preferred_speed;
        if cap <= 0.0 {
            return base;
        }
        let angle = self.rng.random_range(0.0..std::f64::consts::TAU);
        let magnitude = self.rng.random_range(0.0..cap);
        base + magnitude * DVec2::new(angle.cos(), angle.sin())
    }

    /// The nearest in-range candidates, at most `max_neighbors` of them.
    fn select_neighbors(&self, index: usize, candidates: &[usize]) -> Vec<NeighborView> {
        let agent = &self.agents[index];
        let range_sq = self.config.neighbor_distance * self.config.neighbor_distance;

        let mut in_range: Vec<(f64, usize)> = candidates
            .iter()
            .copied()
            .filter(|&other| other != index)
            .filter_map(|other| {
                let distance_sq = (self.agents[other].position - agent.position).length_squared();
                (distance_sq <= range_sq).then_some((distance_sq, other))
            })
            .collect();
        in_range.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        in_range.truncate(self.config.max_neighbors);

        in_range
            .into_iter()
            .map(|(_, other)| {
                let neighbor = &self.agents[other];
                NeighborView {
                    position: neighbor.position,
                    velocity: neighbor.velocity,
                    radius: neighbor.radius,
                }
            })
            .collect()
    }
}
