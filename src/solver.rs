//! Incremental linear programs over half-plane constraints.
//!
//! The three stages follow the classic ORCA solver: a 1-D optimization
//! along one constraint boundary (`linear_program_1`), the incremental 2-D
//! program that walks the constraint list in order (`linear_program_2`),
//! and the infeasibility recovery that minimizes the worst violation among
//! the agent-derived constraints (`linear_program_3`). The deterministic
//! constraint order is part of the contract: identical inputs produce
//! bit-identical outputs.

use glam::DVec2;

use crate::geometry::{Line, det};

/// 1-D optimization along the boundary of `lines[index]`, subject to all
/// prior constraints and the max-speed disk of radius `radius`.
///
/// With `directional` set, `target` is a unit direction and the objective
/// is to maximize `dot(v, target)`; otherwise the objective is to minimize
/// the distance to `target`. Returns `None` when the intersection of the
/// disk, the prior half-planes, and the boundary line is empty.
pub(crate) fn linear_program_1(
    lines: &[Line],
    index: usize,
    radius: f64,
    target: DVec2,
    directional: bool,
    epsilon: f64,
) -> Option<DVec2> {
    let line = &lines[index];
    let alignment = line.point.dot(line.direction);
    let discriminant = alignment.mul_add(
        alignment,
        radius.mul_add(radius, -line.point.length_squared()),
    );
    if discriminant < 0.0 {
        // The disk does not reach this constraint boundary.
        return None;
    }

    let root = discriminant.sqrt();
    let mut t_left = -alignment - root;
    let mut t_right = -alignment + root;

    for prior in &lines[..index] {
        let denominator = det(line.direction, prior.direction);
        let numerator = det(prior.direction, line.point - prior.point);

        if denominator.abs() <= epsilon {
            // Boundaries are parallel: the whole line is either inside or
            // outside of `prior`.
            if numerator < 0.0 {
                return None;
            }
            continue;
        }

        let t = numerator / denominator;
        if denominator >= 0.0 {
            t_right = t_right.min(t);
        } else {
            t_left = t_left.max(t);
        }
        if t_left > t_right {
            return None;
        }
    }

    let t = if directional {
        if line.direction.dot(target) > 0.0 {
            t_right
        } else {
            t_left
        }
    } else {
        line.direction.dot(target - line.point).clamp(t_left, t_right)
    };
    Some(line.point + t * line.direction)
}

/// Incremental 2-D program inside the disk of radius `radius`.
///
/// Returns `(fail_index, velocity)`. `fail_index == lines.len()` means
/// every constraint is satisfied and `velocity` is optimal. On failure,
/// `fail_index` names the first constraint that could not be satisfied and
/// `velocity` is the optimum over the constraints before it.
pub(crate) fn linear_program_2(
    lines: &[Line],
    radius: f64,
    target: DVec2,
    directional: bool,
    epsilon: f64,
) -> (usize, DVec2) {
    let mut velocity = if directional {
        // `target` is a unit direction; start on the disk boundary.
        target.normalize_or_zero() * radius
    } else if target.length_squared() > radius * radius {
        target.normalize() * radius
    } else {
        target
    };

    for (index, line) in lines.iter().enumerate() {
        if line.violation(velocity) > 0.0 {
            // The optimum so far violates this constraint; re-optimize on
            // its boundary. Failure leaves the last feasible iterate in
            // place for the recovery pass.
            match linear_program_1(lines, index, radius, target, directional, epsilon) {
                Some(better) => velocity = better,
                None => return (index, velocity),
            }
        }
    }

    (lines.len(), velocity)
}

/// Infeasibility recovery: starting from the first failed constraint,
/// find the velocity minimizing the maximum violation among the
/// agent-derived constraints while keeping the first `obstacle_count`
/// (obstacle) constraints hard.
pub(crate) fn linear_program_3(
    lines: &[Line],
    obstacle_count: usize,
    begin: usize,
    radius: f64,
    current: DVec2,
    epsilon: f64,
) -> DVec2 {
    let mut velocity = current;
    let mut max_violation = 0.0_f64;

    for (index, line) in lines.iter().enumerate().skip(begin) {
        if line.violation(velocity) <= max_violation {
            continue;
        }

        // Replace each agent constraint seen so far with the half-plane
        // bounded by its bisector with the current line; obstacle
        // constraints carry over untouched.
        let mut projected: Vec<Line> = lines[..obstacle_count].to_vec();
        for prior in lines.iter().take(index).skip(obstacle_count) {
            let denominator = det(line.direction, prior.direction);
            let point = if denominator.abs() <= epsilon {
                if line.direction.dot(prior.direction) > 0.0 {
                    // Same direction: `prior` adds nothing here.
                    continue;
                }
                // Opposite direction: the bisector runs through the
                // midpoint of the two anchors.
                0.5 * (line.point + prior.point)
            } else {
                line.point
                    + (det(prior.direction, line.point - prior.point) / denominator)
                        * line.direction
            };
            projected.push(Line {
                point,
                direction: (prior.direction - line.direction).normalize_or_zero(),
            });
        }

        // Maximize along the inward normal of the violated line: that is
        // the direction in which its violation shrinks fastest.
        let inward = DVec2::new(-line.direction.y, line.direction.x);
        let (fail, relaxed) = linear_program_2(&projected, radius, inward, true, epsilon);
        if fail < projected.len() {
            // The projected program is feasible by construction; reaching
            // this branch means rounding error. Keep the previous iterate.
            log::debug!(
                "relaxation step at constraint {index} reported infeasible \
                 projected program at {fail}; keeping previous velocity"
            );
        } else {
            velocity = relaxed;
        }
        max_violation = line.violation(velocity);
    }

    velocity
}
