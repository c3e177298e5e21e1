use eframe::egui::{Vec2, vec2};

use crate::hierarchy::FileTree;

/// Static layered layout: depth rows top to bottom, siblings left to right in
/// builder order, horizontal space split proportionally to subtree leaf
/// counts so sibling subtrees never overlap. Pure function of its inputs;
/// recomputed only when the tree or the canvas width changes.
pub fn layered_layout(tree: &FileTree, width: f32, row_height: f32) -> Vec<Vec2> {
    let n = tree.node_count();
    if n == 0 {
        return Vec::new();
    }

    let leaves = subtree_leaf_counts(tree);
    let unit = width / leaves[0].max(1) as f32;

    let mut positions = vec![Vec2::ZERO; n];
    // (node index, left edge of the horizontal span reserved for it)
    let mut stack = vec![(0usize, 0.0f32)];

    while let Some((index, left)) = stack.pop() {
        let node = &tree.nodes[index];
        let span = leaves[index] as f32 * unit;
        positions[index] = vec2(left + span / 2.0, node.depth as f32 * row_height);

        let mut cursor = left;
        for &child in &node.children {
            stack.push((child, cursor));
            cursor += leaves[child] as f32 * unit;
        }
    }

    positions
}

/// Leaf count per subtree. Children are always created after their parent, so
/// a reverse index scan is a valid post-order accumulation.
pub fn subtree_leaf_counts(tree: &FileTree) -> Vec<usize> {
    let mut leaves = vec![0usize; tree.node_count()];
    for index in (0..tree.node_count()).rev() {
        let node = &tree.nodes[index];
        if node.children.is_empty() {
            leaves[index] = 1;
        } else {
            leaves[index] = node.children.iter().map(|&child| leaves[child]).sum();
        }
    }
    leaves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{EntryKind, RepoEntry};

    fn blob(path: &str) -> RepoEntry {
        RepoEntry {
            path: path.to_owned(),
            kind: EntryKind::Blob,
            size: Some(1),
            sha: None,
            status: None,
        }
    }

    fn sample_tree() -> FileTree {
        FileTree::from_entries(&[
            blob("a/one.rs"),
            blob("a/two.rs"),
            blob("a/sub/three.rs"),
            blob("b/four.rs"),
            blob("five.rs"),
        ])
    }

    fn subtree_x_range(tree: &FileTree, positions: &[Vec2], root: usize) -> (f32, f32) {
        let mut min_x = f32::MAX;
        let mut max_x = f32::MIN;
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            min_x = min_x.min(positions[index].x);
            max_x = max_x.max(positions[index].x);
            stack.extend(tree.nodes[index].children.iter().copied());
        }
        (min_x, max_x)
    }

    #[test]
    fn layout_is_a_pure_function() {
        let tree = sample_tree();
        let first = layered_layout(&tree, 1200.0, 80.0);
        let second = layered_layout(&tree, 1200.0, 80.0);
        assert_eq!(first, second);
    }

    #[test]
    fn depth_maps_to_rows() {
        let tree = sample_tree();
        let positions = layered_layout(&tree, 1000.0, 60.0);

        for (index, node) in tree.nodes.iter().enumerate() {
            assert_eq!(positions[index].y, node.depth as f32 * 60.0);
        }
    }

    #[test]
    fn sibling_subtrees_do_not_overlap_horizontally() {
        let tree = sample_tree();
        let positions = layered_layout(&tree, 900.0, 70.0);

        for node in &tree.nodes {
            for (left, right) in node.children.iter().zip(node.children.iter().skip(1)) {
                let (_, left_max) = subtree_x_range(&tree, &positions, *left);
                let (right_min, _) = subtree_x_range(&tree, &positions, *right);
                // Children were pushed onto a stack, so sibling order in x
                // follows builder order.
                assert!(
                    left_max < right_min,
                    "sibling subtree x-ranges must be disjoint ({left_max} vs {right_min})"
                );
            }
        }
    }

    #[test]
    fn all_positions_fit_the_canvas_width() {
        let tree = sample_tree();
        let width = 640.0;
        let positions = layered_layout(&tree, width, 50.0);
        for position in &positions {
            assert!(position.x >= 0.0 && position.x <= width);
        }
    }

    #[test]
    fn lone_root_sits_centered_on_the_first_row() {
        let tree = FileTree::from_entries(&[]);
        let positions = layered_layout(&tree, 800.0, 50.0);
        assert_eq!(positions, vec![vec2(400.0, 0.0)]);
    }

    #[test]
    fn leaf_counts_accumulate_bottom_up() {
        let tree = sample_tree();
        let leaves = subtree_leaf_counts(&tree);
        assert_eq!(leaves[0], 5);
        assert_eq!(leaves[tree.index_of("a").unwrap()], 3);
        assert_eq!(leaves[tree.index_of("a/sub").unwrap()], 1);
        assert_eq!(leaves[tree.index_of("five.rs").unwrap()], 1);
    }
}
