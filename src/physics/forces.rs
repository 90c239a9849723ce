use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use crate::graph::Edge;

use super::quadtree::QuadNode;

/// Missing, NaN and non-positive similarities land on this floor, which caps
/// the target distance at `distance_scale / MIN_SIMILARITY`.
pub const MIN_SIMILARITY: f32 = 1e-3;

/// Ceiling for huge or infinite similarities; the shortest target distance is
/// `distance_scale / MAX_SIMILARITY`.
pub const MAX_SIMILARITY: f32 = 1e3;

pub const CHARGE_SOFTENING: f32 = 25.0;

pub fn effective_similarity(similarity: Option<f32>) -> f32 {
    match similarity {
        Some(value) if value.is_nan() => MIN_SIMILARITY,
        Some(value) => value.clamp(MIN_SIMILARITY, MAX_SIMILARITY),
        None => MIN_SIMILARITY,
    }
}

pub fn target_distance(similarity: Option<f32>, distance_scale: f32) -> f32 {
    distance_scale / effective_similarity(similarity)
}

// Positive pulls the endpoints together.
pub fn spring_force(distance: f32, target_distance: f32, strength: f32) -> f32 {
    (distance - target_distance) * strength
}

/// Positive pushes the pair apart when `charge_strength` is negative. Zero
/// beyond `cutoff_distance`.
pub fn repulsion_force(distance_sq: f32, charge_strength: f32, cutoff_distance: f32) -> f32 {
    if distance_sq > cutoff_distance * cutoff_distance {
        return 0.0;
    }
    -charge_strength / (distance_sq + CHARGE_SOFTENING)
}

/// Unit vector pointing from `other` towards `index`. Coincident nodes get a
/// deterministic golden-angle direction, mirrored for the other side of the
/// pair so the two are pushed apart instead of together.
pub(super) fn separation_direction(delta: Vec2, distance: f32, index: usize, other: usize) -> Vec2 {
    if distance > 0.0001 {
        return delta / distance;
    }

    let (low, high) = (index.min(other), index.max(other));
    let angle = ((low as f32) * 0.618_034 + (high as f32) * 0.414_214 + 0.11) * TAU;
    let direction = vec2(angle.cos(), angle.sin());
    if index <= other { direction } else { -direction }
}

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    pub(super) strength: f32,
    pub(super) cutoff_distance: f32,
    pub(super) theta: f32,
}

pub(super) fn accumulate_repulsion_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    force: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];
    let cutoff_sq = params.cutoff_distance * params.cutoff_distance;
    if node.extent.distance_sq_to_point(point) > cutoff_sq {
        return;
    }

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }

            let delta = point - positions[other_index];
            let distance_sq = delta.length_sq();
            let magnitude = repulsion_force(distance_sq, params.strength, params.cutoff_distance);
            if magnitude == 0.0 {
                continue;
            }
            let direction = separation_direction(delta, distance_sq.sqrt(), index, other_index);
            *force += direction * magnitude;
        }
        return;
    }

    let delta = point - node.center_of_mass;
    let distance_sq = delta.length_sq().max(0.0001);
    let distance = distance_sq.sqrt();
    let can_approximate = !node.extent.contains(point)
        && ((node.extent.width() / distance) < params.theta)
        && node.mass > 1.0;

    if can_approximate {
        let magnitude = repulsion_force(distance_sq, params.strength, params.cutoff_distance);
        *force += (delta / distance) * (magnitude * node.mass);
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_repulsion_for_node(child, index, positions, params, force);
    }
}

pub(super) fn accumulate_springs(
    positions: &[Vec2],
    edges: &[Edge],
    distance_scale: f32,
    strength: f32,
    forces: &mut [Vec2],
) {
    for edge in edges {
        if edge.is_self_loop() {
            continue;
        }

        let from = edge.source().get();
        let to = edge.target().get();
        let delta = positions[from] - positions[to];
        let distance = delta.length();
        let direction = separation_direction(delta, distance, from, to);

        let rest = target_distance(edge.similarity(), distance_scale);
        let correction = direction * spring_force(distance, rest, strength);

        forces[from] -= correction;
        forces[to] += correction;
    }
}
