use std::collections::HashMap;

use crate::github::{ChangeStatus, EntryKind, RepoEntry};

pub const ROOT_ID: &str = "root";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Tree,
    Blob,
}

/// Immutable structural node. Simulation state (positions, velocities) lives
/// in layout frames keyed by node index, never inside the node itself.
#[derive(Clone, Debug)]
pub struct TreeNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub size: Option<u64>,
    pub sha: Option<String>,
    pub status: Option<ChangeStatus>,
    /// Path component count; the synthetic root sits at depth 0.
    pub depth: usize,
    pub parent: Option<usize>,
    /// Child indices in first-seen order while scanning the entry list.
    pub children: Vec<usize>,
}

/// Rooted tree materialized from a flat entry listing. Nodes are stored in
/// creation order (index 0 is always the synthetic root), so rebuilding from
/// the same input yields identical indices, child ordering, and edges.
#[derive(Clone, Debug, Default)]
pub struct FileTree {
    pub nodes: Vec<TreeNode>,
    /// One deduplicated (parent, child) pair per non-root node.
    pub edges: Vec<(usize, usize)>,
    index_by_id: HashMap<String, usize>,
}

impl FileTree {
    pub fn from_entries(entries: &[RepoEntry]) -> Self {
        let mut tree = Self::default();
        tree.insert_root();

        for entry in entries {
            tree.insert_entry(entry);
        }

        tree
    }

    fn insert_root(&mut self) {
        self.index_by_id.insert(ROOT_ID.to_owned(), 0);
        self.nodes.push(TreeNode {
            id: ROOT_ID.to_owned(),
            name: ROOT_ID.to_owned(),
            kind: NodeKind::Root,
            size: None,
            sha: None,
            status: None,
            depth: 0,
            parent: None,
            children: Vec::new(),
        });
    }

    fn insert_entry(&mut self, entry: &RepoEntry) {
        if entry.path.is_empty() {
            return;
        }

        let segments: Vec<&str> = entry.path.split('/').collect();
        let mut parent_index = 0usize;
        let mut prefix_end = 0usize;

        for (depth, segment) in segments.iter().enumerate() {
            prefix_end += segment.len();
            let prefix = &entry.path[..prefix_end];
            prefix_end += 1; // the '/' separator

            let is_last = depth == segments.len() - 1;

            parent_index = match self.index_by_id.get(prefix) {
                // Already created, either as an earlier entry or as a prefix
                // of one. A conflicting re-declaration (e.g. a blob and a
                // tree sharing a path) keeps the first-seen kind; the second
                // declaration is ignored.
                Some(&existing) => existing,
                None => {
                    let kind = if is_last {
                        match entry.kind {
                            EntryKind::Blob => NodeKind::Blob,
                            EntryKind::Tree | EntryKind::Commit => NodeKind::Tree,
                        }
                    } else {
                        NodeKind::Tree
                    };

                    let index = self.nodes.len();
                    self.nodes.push(TreeNode {
                        id: prefix.to_owned(),
                        name: (*segment).to_owned(),
                        kind,
                        size: if is_last { entry.size } else { None },
                        sha: if is_last { entry.sha.clone() } else { None },
                        status: if is_last { entry.status } else { None },
                        depth: depth + 1,
                        parent: Some(parent_index),
                        children: Vec::new(),
                    });
                    self.index_by_id.insert(prefix.to_owned(), index);
                    self.nodes[parent_index].children.push(index);
                    self.edges.push((parent_index, index));
                    index
                }
            };
        }
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&TreeNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn blob_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.kind == NodeKind::Blob)
            .count()
    }

    /// Largest blob size in the tree, used to scale node radii.
    pub fn max_blob_size(&self) -> u64 {
        self.nodes
            .iter()
            .filter(|node| node.kind == NodeKind::Blob)
            .filter_map(|node| node.size)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::EntryKind;

    fn blob(path: &str, size: u64) -> RepoEntry {
        RepoEntry {
            path: path.to_owned(),
            kind: EntryKind::Blob,
            size: Some(size),
            sha: Some(format!("sha-{path}")),
            status: None,
        }
    }

    fn dir(path: &str) -> RepoEntry {
        RepoEntry {
            path: path.to_owned(),
            kind: EntryKind::Tree,
            size: None,
            sha: None,
            status: None,
        }
    }

    fn ids(tree: &FileTree) -> Vec<&str> {
        tree.nodes.iter().map(|node| node.id.as_str()).collect()
    }

    fn edge_ids(tree: &FileTree) -> Vec<(&str, &str)> {
        tree.edges
            .iter()
            .map(|&(parent, child)| {
                (tree.nodes[parent].id.as_str(), tree.nodes[child].id.as_str())
            })
            .collect()
    }

    #[test]
    fn empty_input_yields_lone_root() {
        let tree = FileTree::from_entries(&[]);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.edge_count(), 0);
        assert_eq!(tree.nodes[0].kind, NodeKind::Root);
    }

    #[test]
    fn two_siblings_under_shared_directory() {
        let tree = FileTree::from_entries(&[blob("a/b.txt", 10), blob("a/c.txt", 20)]);

        assert_eq!(ids(&tree), vec!["root", "a", "a/b.txt", "a/c.txt"]);
        assert_eq!(
            edge_ids(&tree),
            vec![("root", "a"), ("a", "a/b.txt"), ("a", "a/c.txt")]
        );

        let a = tree.get("a").unwrap();
        assert_eq!(a.kind, NodeKind::Tree);
        assert_eq!(tree.get("a/b.txt").unwrap().size, Some(10));
        assert_eq!(tree.get("a/c.txt").unwrap().size, Some(20));
    }

    #[test]
    fn every_non_root_node_has_exactly_one_parent() {
        let tree = FileTree::from_entries(&[
            dir("src"),
            blob("src/main.rs", 100),
            blob("src/lib.rs", 50),
            dir("src/app"),
            blob("src/app/mod.rs", 30),
            blob("README.md", 5),
        ]);

        assert!(tree.nodes[0].parent.is_none());
        for (index, node) in tree.nodes.iter().enumerate().skip(1) {
            let parent = node.parent.expect("non-root node must have a parent");
            assert!(tree.nodes[parent].children.contains(&index));
        }
        // One edge per non-root node, no duplicates.
        assert_eq!(tree.edge_count(), tree.node_count() - 1);
        let mut edges = tree.edges.clone();
        edges.sort_unstable();
        edges.dedup();
        assert_eq!(edges.len(), tree.edge_count());
    }

    #[test]
    fn node_id_set_is_paths_plus_prefixes_plus_root() {
        let entries = [blob("x/y/z.rs", 1), blob("x/w.rs", 2), blob("top.rs", 3)];
        let tree = FileTree::from_entries(&entries);

        let mut expected = vec!["root", "x", "x/y", "x/y/z.rs", "x/w.rs", "top.rs"];
        let mut actual = ids(&tree);
        expected.sort_unstable();
        actual.sort_unstable();
        assert_eq!(actual, expected);
    }

    #[test]
    fn rebuilding_from_identical_input_is_deterministic() {
        let entries = [
            blob("b/one.rs", 1),
            blob("a/two.rs", 2),
            blob("b/sub/three.rs", 3),
            dir("c"),
        ];

        let first = FileTree::from_entries(&entries);
        let second = FileTree::from_entries(&entries);

        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.edges, second.edges);
        for (a, b) in first.nodes.iter().zip(second.nodes.iter()) {
            assert_eq!(a.children, b.children);
        }
    }

    #[test]
    fn sibling_order_follows_input_order() {
        let tree = FileTree::from_entries(&[
            blob("dir/zeta.rs", 1),
            blob("dir/alpha.rs", 1),
            blob("dir/mid.rs", 1),
        ]);

        let dir_node = tree.get("dir").unwrap();
        let child_names: Vec<&str> = dir_node
            .children
            .iter()
            .map(|&child| tree.nodes[child].name.as_str())
            .collect();
        assert_eq!(child_names, vec!["zeta.rs", "alpha.rs", "mid.rs"]);
    }

    #[test]
    fn conflicting_redeclaration_keeps_first_seen_kind() {
        // Malformed input: "src" declared as a blob, then used as a tree.
        let tree = FileTree::from_entries(&[blob("src", 9), blob("src/main.rs", 1)]);

        let src = tree.get("src").unwrap();
        assert_eq!(src.kind, NodeKind::Blob);
        assert_eq!(src.size, Some(9));
        // The child still attaches underneath it.
        assert_eq!(tree.get("src/main.rs").unwrap().parent, tree.index_of("src"));
    }

    #[test]
    fn explicit_tree_entry_after_prefix_creation_is_ignored() {
        let tree = FileTree::from_entries(&[blob("src/main.rs", 1), dir("src")]);
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.get("src").unwrap().kind, NodeKind::Tree);
    }

    #[test]
    fn depth_equals_path_component_count() {
        let tree = FileTree::from_entries(&[blob("a/b/c/d.rs", 1)]);
        assert_eq!(tree.get("root").unwrap().depth, 0);
        assert_eq!(tree.get("a").unwrap().depth, 1);
        assert_eq!(tree.get("a/b").unwrap().depth, 2);
        assert_eq!(tree.get("a/b/c/d.rs").unwrap().depth, 4);
    }

    #[test]
    fn submodule_entries_render_as_trees() {
        let entry = RepoEntry {
            path: "vendored".to_owned(),
            kind: EntryKind::Commit,
            size: None,
            sha: Some("abc".to_owned()),
            status: None,
        };
        let tree = FileTree::from_entries(&[entry]);
        assert_eq!(tree.get("vendored").unwrap().kind, NodeKind::Tree);
    }
}
