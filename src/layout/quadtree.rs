//! Barnes-Hut quadtree over node positions. Repulsion against far-away
//! regions is approximated by their aggregate mass at the center of mass,
//! which keeps large graphs interactive; nearby nodes are still summed
//! exactly.

use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 12;
const MAX_DEPTH: usize = 10;
/// Opening angle: a region is approximated once `side / distance` drops
/// below this.
const THETA: f32 = 0.9;

#[derive(Clone, Copy)]
struct QuadBounds {
    center: Vec2,
    half_extent: f32,
}

impl QuadBounds {
    fn from_points(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }
        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let span = (max.x - min.x).max(max.y - min.y).max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span * 0.5 + 1.0,
        })
    }

    fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent
            && (point.y - self.center.y).abs() <= self.half_extent
    }

    fn quadrant_for(self, point: Vec2) -> usize {
        ((point.x >= self.center.x) as usize) | (((point.y >= self.center.y) as usize) << 1)
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = vec2(
            if quadrant & 1 == 0 { -quarter } else { quarter },
            if quadrant & 2 == 0 { -quarter } else { quarter },
        );
        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }
}

pub(super) struct QuadNode {
    bounds: QuadBounds,
    center_of_mass: Vec2,
    mass: f32,
    /// Populated on leaves only; internal nodes hand their points down.
    indices: Vec<usize>,
    children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = QuadBounds::from_points(positions)?;
        let indices = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::build_node(bounds, indices, positions, 0))
    }

    fn build_node(
        bounds: QuadBounds,
        indices: Vec<usize>,
        positions: &[Vec2],
        depth: usize,
    ) -> Self {
        let mass = indices.len() as f32;
        let mut center_of_mass = Vec2::ZERO;
        for &index in &indices {
            center_of_mass += positions[index];
        }
        if mass > 0.0 {
            center_of_mass /= mass;
        }

        let mut node = Self {
            bounds,
            center_of_mass,
            mass,
            indices,
            children: std::array::from_fn(|_| None),
        };
        if depth >= MAX_DEPTH || node.indices.len() <= LEAF_CAPACITY {
            return node;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &index in &node.indices {
            buckets[bounds.quadrant_for(positions[index])].push(index);
        }
        // Coincident points all land in one bucket; splitting further
        // cannot separate them.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                node.children[quadrant] = Some(Box::new(Self::build_node(
                    bounds.child(quadrant),
                    bucket,
                    positions,
                    depth + 1,
                )));
            }
        }
        node.indices.clear();
        node
    }

    fn is_leaf(&self) -> bool {
        self.children.iter().all(|child| child.is_none())
    }

    /// Net inverse-square repulsion on `index` from every other node.
    /// `strength` carries the (negative) charge already scaled by alpha.
    pub(super) fn repulsion(&self, index: usize, positions: &[Vec2], strength: f32) -> Vec2 {
        let mut force = Vec2::ZERO;
        self.accumulate(index, positions, strength, &mut force);
        force
    }

    fn accumulate(&self, index: usize, positions: &[Vec2], strength: f32, force: &mut Vec2) {
        if self.mass <= 0.0 {
            return;
        }
        let point = positions[index];

        if self.is_leaf() {
            for &other in &self.indices {
                if other == index {
                    continue;
                }
                let delta = point - positions[other];
                let distance_sq = delta.length_sq().max(1.0);
                let direction = delta / distance_sq.sqrt();
                *force -= direction * (strength / distance_sq);
            }
            return;
        }

        let delta = point - self.center_of_mass;
        let distance_sq = delta.length_sq().max(1.0);
        let distance = distance_sq.sqrt();
        if !self.bounds.contains(point)
            && self.bounds.side_length() / distance < THETA
            && self.mass > 1.0
        {
            let direction = delta / distance;
            *force -= direction * (strength * self.mass / distance_sq);
            return;
        }

        for child in self.children.iter().flatten() {
            child.accumulate(index, positions, strength, force);
        }
    }
}
