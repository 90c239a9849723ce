use eframe::egui::{Vec2, vec2};

const LEAF_SIZE: usize = 12;
const MAX_DEPTH: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Extent {
    pub(super) min: Vec2,
    pub(super) max: Vec2,
}

impl Extent {
    fn around(points: impl IntoIterator<Item = Vec2>) -> Self {
        points.into_iter().fold(
            Self {
                min: Vec2::splat(f32::INFINITY),
                max: Vec2::splat(f32::NEG_INFINITY),
            },
            |extent, point| Self {
                min: extent.min.min(point),
                max: extent.max.max(point),
            },
        )
    }

    fn is_finite(self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    fn center(self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub(super) fn width(self) -> f32 {
        let size = self.max - self.min;
        size.x.max(size.y)
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (self.min.x..=self.max.x).contains(&point.x) && (self.min.y..=self.max.y).contains(&point.y)
    }

    // Zero inside the box.
    pub(super) fn distance_sq_to_point(self, point: Vec2) -> f32 {
        let dx = (self.min.x - point.x).max(point.x - self.max.x).max(0.0);
        let dy = (self.min.y - point.y).max(point.y - self.max.y).max(0.0);
        vec2(dx, dy).length_sq()
    }
}

fn quadrant(split: Vec2, point: Vec2) -> usize {
    usize::from(point.x >= split.x) + 2 * usize::from(point.y >= split.y)
}

pub(super) struct QuadNode {
    pub(super) extent: Extent,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        if positions.is_empty() || !Extent::around(positions.iter().copied()).is_finite() {
            return None;
        }
        Some(Self::split((0..positions.len()).collect(), positions, 0))
    }

    // Cells split at the center of their own extent, so every split of
    // distinct points leaves at least two non-empty children.
    fn split(indices: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        let extent = Extent::around(indices.iter().map(|&index| positions[index]));
        let mass = indices.len() as f32;
        let center_of_mass = indices
            .iter()
            .fold(Vec2::ZERO, |sum, &index| sum + positions[index])
            / mass.max(1.0);

        let mut node = Self {
            extent,
            center_of_mass,
            mass,
            indices,
            children: Default::default(),
        };
        if depth >= MAX_DEPTH || node.indices.len() <= LEAF_SIZE || node.extent.width() <= 0.0 {
            return node;
        }

        let split = extent.center();
        let mut buckets: [Vec<usize>; 4] = Default::default();
        for index in node.indices.drain(..) {
            buckets[quadrant(split, positions[index])].push(index);
        }

        for (slot, bucket) in node.children.iter_mut().zip(buckets) {
            if !bucket.is_empty() {
                *slot = Some(Box::new(Self::split(bucket, positions, depth + 1)));
            }
        }
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_points(node: &QuadNode) -> usize {
        node.indices.len()
            + node
                .children
                .iter()
                .flatten()
                .map(|child| count_points(child))
                .sum::<usize>()
    }

    fn extents_nest(node: &QuadNode, positions: &[Vec2]) -> bool {
        node.indices
            .iter()
            .all(|&index| node.extent.contains(positions[index]))
            && node.children.iter().flatten().all(|child| {
                node.extent.contains(child.extent.min)
                    && node.extent.contains(child.extent.max)
                    && extents_nest(child, positions)
            })
    }

    #[test]
    fn empty_or_non_finite_input_builds_nothing() {
        assert!(QuadNode::build(&[]).is_none());
        assert!(QuadNode::build(&[vec2(f32::NAN, 0.0)]).is_none());
    }

    #[test]
    fn every_point_lands_in_exactly_one_leaf() {
        let positions = (0..200)
            .map(|index| {
                let angle = index as f32 * 0.37;
                vec2(angle.cos(), angle.sin()) * (index as f32 * 3.0)
            })
            .collect::<Vec<_>>();

        let tree = QuadNode::build(&positions).unwrap();

        assert!(!tree.is_leaf());
        assert_eq!(count_points(&tree), positions.len());
        assert_eq!(tree.mass, positions.len() as f32);
        assert!(extents_nest(&tree, &positions));
    }

    #[test]
    fn extent_is_tight_around_its_points() {
        let positions = [vec2(-3.0, 4.0), vec2(7.0, -1.0), vec2(2.0, 2.0)];
        let tree = QuadNode::build(&positions).unwrap();

        assert_eq!(tree.extent.min, vec2(-3.0, -1.0));
        assert_eq!(tree.extent.max, vec2(7.0, 4.0));
        assert_eq!(tree.extent.width(), 10.0);
        assert_eq!(tree.center_of_mass, vec2(2.0, 5.0 / 3.0));
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let positions = vec![Vec2::ZERO; 40];
        let tree = QuadNode::build(&positions).unwrap();

        assert!(tree.is_leaf());
        assert_eq!(tree.indices.len(), 40);
    }

    #[test]
    fn point_distance_is_zero_inside() {
        let extent = Extent {
            min: vec2(-10.0, -10.0),
            max: vec2(10.0, 10.0),
        };

        assert_eq!(extent.distance_sq_to_point(vec2(3.0, -4.0)), 0.0);
        assert!(extent.contains(vec2(10.0, 10.0)));
        assert_eq!(extent.distance_sq_to_point(vec2(13.0, 14.0)), 9.0 + 16.0);
        assert_eq!(extent.distance_sq_to_point(vec2(-13.0, 0.0)), 9.0);
    }
}
