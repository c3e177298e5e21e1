use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;
use crate::hierarchy::FileTree;
use crate::util::stable_pair;

/// Cooling cutoff; the simulation parks itself once alpha drops below this.
pub const ALPHA_MIN: f32 = 0.001;
/// Geometric step toward the alpha target each tick (~300 ticks to cool).
pub const ALPHA_DECAY: f32 = 0.0228;
const ALPHA_DRAG_TARGET: f32 = 0.3;
const VELOCITY_RETAIN: f32 = 0.6;
const CHARGE_STRENGTH: f32 = -120.0;
const LINK_DISTANCE: f32 = 50.0;
const LINK_STRENGTH: f32 = 0.7;

/// Damped force-directed simulation over a static node/edge set, in world
/// coordinates centered on the origin. Positions, velocities, and the pinned
/// flags are owned here, keyed by node index; the structural tree is never
/// mutated. Dragging pins a node and re-heats alpha until release.
pub struct ForceSimulation {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    pinned: Vec<bool>,
    edges: Vec<(usize, usize)>,
    /// Per-node degree, used to bias link corrections toward the lighter end.
    degrees: Vec<f32>,
    alpha: f32,
    alpha_target: f32,
}

impl ForceSimulation {
    pub fn new(tree: &FileTree) -> Self {
        let n = tree.node_count();
        let spread = (n as f32).sqrt() * LINK_DISTANCE * 0.75;

        let positions = tree
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                if index == 0 {
                    Vec2::ZERO
                } else {
                    let (jx, jy) = stable_pair(&node.id);
                    vec2(jx, jy) * spread
                }
            })
            .collect();

        let mut degrees = vec![0.0f32; n];
        for &(source, target) in &tree.edges {
            degrees[source] += 1.0;
            degrees[target] += 1.0;
        }

        Self {
            positions,
            velocities: vec![Vec2::ZERO; n],
            pinned: vec![false; n],
            edges: tree.edges.clone(),
            degrees,
            alpha: 1.0,
            alpha_target: 0.0,
        }
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < ALPHA_MIN && self.alpha_target < ALPHA_MIN
    }

    /// Advances one simulation step. Returns false once the system has
    /// cooled below the alpha cutoff with no re-heat pending.
    pub fn tick(&mut self) -> bool {
        if self.is_settled() {
            return false;
        }

        let n = self.positions.len();
        self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;

        // Many-body repulsion through a Barnes-Hut quadtree; exact inside
        // leaves, aggregated for far regions.
        if let Some(root) = QuadNode::build(&self.positions) {
            let strength = CHARGE_STRENGTH * self.alpha;
            for i in 0..n {
                self.velocities[i] += root.repulsion(i, &self.positions, strength);
            }
        }

        // Spring attraction along edges toward the rest length, corrections
        // split by degree so hubs move less than leaves.
        for &(source, target) in &self.edges {
            let delta = (self.positions[target] + self.velocities[target])
                - (self.positions[source] + self.velocities[source]);
            let distance = delta.length().max(0.001);
            let stretch = ((distance - LINK_DISTANCE) / distance) * self.alpha * LINK_STRENGTH;
            let correction = delta * stretch;

            let bias = self.degrees[source]
                / (self.degrees[source] + self.degrees[target]).max(1.0);
            self.velocities[target] -= correction * bias;
            self.velocities[source] += correction * (1.0 - bias);
        }

        // Integrate with damping; pinned nodes hold their dragged position.
        for i in 0..n {
            if self.pinned[i] {
                self.velocities[i] = Vec2::ZERO;
                continue;
            }
            self.velocities[i] *= VELOCITY_RETAIN;
            self.positions[i] += self.velocities[i];
        }

        // Centering pull toward the canvas origin. Suspended while a node is
        // pinned so the whole set does not slide under the cursor.
        if !self.pinned.iter().any(|&p| p) && n > 0 {
            let mut centroid = Vec2::ZERO;
            for position in &self.positions {
                centroid += *position;
            }
            centroid /= n as f32;
            for position in &mut self.positions {
                *position -= centroid;
            }
        }

        true
    }

    pub fn drag_start(&mut self, index: usize) {
        if index >= self.pinned.len() {
            return;
        }
        self.pinned[index] = true;
        self.velocities[index] = Vec2::ZERO;
        self.alpha_target = ALPHA_DRAG_TARGET;
    }

    pub fn drag_move(&mut self, index: usize, world_pos: Vec2) {
        if let Some(position) = self.positions.get_mut(index)
            && self.pinned[index]
        {
            *position = world_pos;
        }
    }

    pub fn drag_end(&mut self, index: usize) {
        if index >= self.pinned.len() {
            return;
        }
        self.pinned[index] = false;
        self.alpha_target = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{EntryKind, RepoEntry};

    fn sample_tree() -> FileTree {
        let entries: Vec<RepoEntry> = [
            "src/main.rs",
            "src/lib.rs",
            "src/app/mod.rs",
            "tests/basic.rs",
            "README.md",
        ]
        .iter()
        .map(|path| RepoEntry {
            path: (*path).to_owned(),
            kind: EntryKind::Blob,
            size: Some(64),
            sha: None,
            status: None,
        })
        .collect();
        FileTree::from_entries(&entries)
    }

    #[test]
    fn alpha_decays_monotonically_and_converges() {
        let tree = sample_tree();
        let mut sim = ForceSimulation::new(&tree);

        let mut previous = sim.alpha();
        let mut ticks = 0usize;
        while sim.tick() {
            assert!(sim.alpha() < previous, "alpha must strictly decrease");
            previous = sim.alpha();
            ticks += 1;
            assert!(ticks < 500, "simulation must settle within a bounded tick count");
        }

        assert!(sim.is_settled());
        assert!(sim.alpha() < ALPHA_MIN);
        for position in sim.positions() {
            assert!(position.x.is_finite() && position.y.is_finite());
        }
    }

    #[test]
    fn large_graphs_settle_with_approximated_repulsion() {
        let entries: Vec<RepoEntry> = (0..48)
            .map(|i| RepoEntry {
                path: format!("dir{}/file{i}.rs", i % 6),
                kind: EntryKind::Blob,
                size: Some(128),
                sha: None,
                status: None,
            })
            .collect();
        let tree = FileTree::from_entries(&entries);
        let mut sim = ForceSimulation::new(&tree);

        let mut ticks = 0usize;
        while sim.tick() {
            ticks += 1;
            assert!(ticks < 500, "simulation must settle within a bounded tick count");
        }
        assert!(sim.is_settled());

        let mut spread = 0.0f32;
        for position in sim.positions() {
            assert!(position.x.is_finite() && position.y.is_finite());
            spread = spread.max(position.length());
        }
        assert!(spread > LINK_DISTANCE, "nodes must repel apart, not collapse");
    }

    #[test]
    fn seeding_is_deterministic() {
        let tree = sample_tree();
        let a = ForceSimulation::new(&tree);
        let b = ForceSimulation::new(&tree);
        assert_eq!(a.positions(), b.positions());
    }

    #[test]
    fn linked_nodes_pull_toward_rest_length() {
        let tree = FileTree::from_entries(&[RepoEntry {
            path: "only.rs".to_owned(),
            kind: EntryKind::Blob,
            size: Some(1),
            sha: None,
            status: None,
        }]);
        let mut sim = ForceSimulation::new(&tree);
        while sim.tick() {}

        let gap = (sim.positions()[0] - sim.positions()[1]).length();
        assert!(
            (gap - LINK_DISTANCE).abs() < LINK_DISTANCE,
            "settled edge length {gap} should be near the rest length"
        );
    }

    #[test]
    fn dragging_pins_the_node_and_reheats_alpha() {
        let tree = sample_tree();
        let mut sim = ForceSimulation::new(&tree);
        while sim.tick() {}
        let cooled = sim.alpha();

        sim.drag_start(2);
        sim.drag_move(2, vec2(400.0, -250.0));
        for _ in 0..5 {
            assert!(sim.tick(), "drag re-heat must keep the simulation alive");
            sim.drag_move(2, vec2(400.0, -250.0));
        }

        assert!(sim.alpha() > cooled, "alpha must rise toward the drag target");
        assert_eq!(sim.positions()[2], vec2(400.0, -250.0));

        sim.drag_end(2);
        let mut ticks = 0usize;
        while sim.tick() {
            ticks += 1;
            assert!(ticks < 500);
        }
        assert!(sim.is_settled());
    }

    #[test]
    fn drag_move_without_drag_start_is_ignored() {
        let tree = sample_tree();
        let mut sim = ForceSimulation::new(&tree);
        let before = sim.positions()[1];
        sim.drag_move(1, vec2(999.0, 999.0));
        assert_eq!(sim.positions()[1], before);
    }
}
