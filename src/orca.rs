//! ORCA half-plane construction for agent-agent avoidance.
//!
//! For each neighbor, the subject gets one constraint on its velocity,
//! derived from the velocity obstacle truncated at the time horizon. The
//! constraint pushes the relative velocity out of the obstacle by the
//! smallest possible change `u`, and the subject takes half of that change
//! (the neighbor is assumed to take the other half).

use glam::DVec2;

use crate::agent::{AgentSnapshot, NeighborView};
use crate::geometry::{Line, det};

/// Build the half-plane constraint that keeps `agent` clear of `neighbor`
/// for the next `time_horizon` seconds.
///
/// If the two disks already overlap, the constraint instead resolves the
/// overlap within one `dt`-length step. `epsilon` guards the degenerate
/// zero-relative-displacement branch of that case; co-located agents with
/// identical velocities break the caller's contract and are pushed apart
/// along a fixed axis.
pub(crate) fn agent_orca_line(
    agent: &AgentSnapshot,
    neighbor: &NeighborView,
    time_horizon: f64,
    dt: f64,
    epsilon: f64,
) -> Line {
    let rel_pos = neighbor.position - agent.position;
    let rel_vel = agent.velocity - neighbor.velocity;
    let dist_sq = rel_pos.length_squared();
    let combined_radius = agent.radius + neighbor.radius;
    let combined_radius_sq = combined_radius * combined_radius;

    let direction;
    let u;

    if dist_sq > combined_radius_sq {
        // Not overlapping: truncated cone VO, apex circle at the horizon.
        let inv_time_horizon = 1.0 / time_horizon;
        let w = rel_vel - inv_time_horizon * rel_pos;
        let w_length_sq = w.length_squared();
        let dot_product = w.dot(rel_pos);

        #[allow(clippy::suspicious_operation_groupings)]
        let on_cutoff_circle =
            dot_product < 0.0 && dot_product * dot_product > combined_radius_sq * w_length_sq;

        if on_cutoff_circle {
            // Project on the cut-off circle.
            let w_length = w_length_sq.sqrt();
            let unit_w = w / w_length;
            direction = DVec2::new(unit_w.y, -unit_w.x);
            u = combined_radius.mul_add(inv_time_horizon, -w_length) * unit_w;
        } else {
            // Project on the nearer leg of the cone.
            let leg = (dist_sq - combined_radius_sq).sqrt();
            direction = if det(rel_pos, w) > 0.0 {
                // Left leg.
                DVec2::new(
                    rel_pos.x.mul_add(leg, -(rel_pos.y * combined_radius)),
                    rel_pos.x.mul_add(combined_radius, rel_pos.y * leg),
                ) / dist_sq
            } else {
                // Right leg.
                -DVec2::new(
                    rel_pos.x.mul_add(leg, rel_pos.y * combined_radius),
                    (-rel_pos.x).mul_add(combined_radius, rel_pos.y * leg),
                ) / dist_sq
            };
            u = rel_vel.dot(direction) * direction - rel_vel;
        }
    } else {
        // Already overlapping: resolve the collision within one step.
        let inv_dt = 1.0 / dt;
        let w = rel_vel - inv_dt * rel_pos;
        let w_length = w.length();
        let unit_w = if w_length > epsilon {
            w / w_length
        } else if dist_sq > epsilon * epsilon {
            // Relative velocity matches the required separation exactly;
            // push straight away from the neighbor's center.
            -rel_pos / dist_sq.sqrt()
        } else {
            DVec2::X
        };
        direction = DVec2::new(unit_w.y, -unit_w.x);
        u = combined_radius.mul_add(inv_dt, -w_length) * unit_w;
    }

    Line {
        // Each agent takes half of the required velocity change.
        point: agent.velocity + 0.5 * u,
        direction,
    }
}
