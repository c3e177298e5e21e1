//! Highlight matching for the render adapter: free-text search terms and the
//! dependency set extracted from the selected file. Dependency matching is
//! deliberately plain path-string matching (join, normalize, prefix compare),
//! not import-graph analysis.

use std::collections::HashSet;

use crate::hierarchy::FileTree;

/// Node indices whose id contains the search term, case-insensitive.
pub fn search_matches(tree: &FileTree, term: &str) -> HashSet<usize> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return HashSet::new();
    }

    tree.nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.id.to_lowercase().contains(&term))
        .map(|(index, _)| index)
        .collect()
}

/// Directory portion of a slash-separated path; empty for top-level entries.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(slash) => &path[..slash],
        None => "",
    }
}

/// Joins a relative reference onto a base directory and normalizes `.` and
/// `..` segments. `..` above the repository root saturates at the root.
pub fn resolve_relative(base_dir: &str, reference: &str) -> String {
    let mut segments: Vec<&str> = if base_dir.is_empty() {
        Vec::new()
    } else {
        base_dir.split('/').collect()
    };

    for segment in reference.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Quoted relative path references (`./...` or `../...`) found in a text
/// file. This is the producer for the dependency-highlight set.
pub fn collect_relative_refs(text: &str) -> Vec<String> {
    let mut refs = Vec::new();

    for line in text.lines() {
        let bytes = line.as_bytes();
        let mut cursor = 0usize;
        while cursor < bytes.len() {
            let quote = bytes[cursor];
            if quote == b'"' || quote == b'\'' || quote == b'`' {
                if let Some(end) = line[cursor + 1..].find(quote as char) {
                    let literal = &line[cursor + 1..cursor + 1 + end];
                    if (literal.starts_with("./") || literal.starts_with("../"))
                        && !refs.iter().any(|existing| existing == literal)
                    {
                        refs.push(literal.to_owned());
                    }
                    cursor += end + 2;
                    continue;
                }
            }
            cursor += 1;
        }
    }

    refs
}

/// Resolves the raw references against the selected file's directory.
pub fn resolve_dependencies(selected_path: &str, refs: &[String]) -> Vec<String> {
    let base = parent_dir(selected_path);
    refs.iter()
        .map(|reference| resolve_relative(base, reference))
        .filter(|resolved| !resolved.is_empty())
        .collect()
}

/// Node indices whose id starts with any resolved dependency path, so
/// `utils/helper` highlights `utils/helper.js` as well.
pub fn dependency_matches(tree: &FileTree, resolved: &[String]) -> HashSet<usize> {
    if resolved.is_empty() {
        return HashSet::new();
    }

    tree.nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| resolved.iter().any(|dep| node.id.starts_with(dep.as_str())))
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{EntryKind, RepoEntry};

    fn tree() -> FileTree {
        let entries: Vec<RepoEntry> = [
            "src/App.jsx",
            "src/utils/githubApi.js",
            "src/components/TreeView.jsx",
            "README.md",
        ]
        .iter()
        .map(|path| RepoEntry {
            path: (*path).to_owned(),
            kind: EntryKind::Blob,
            size: Some(1),
            sha: None,
            status: None,
        })
        .collect();
        FileTree::from_entries(&entries)
    }

    #[test]
    fn search_is_case_insensitive_substring_on_id() {
        let tree = tree();
        let matches = search_matches(&tree, "TREEVIEW");
        assert_eq!(matches.len(), 1);
        assert!(matches.contains(&tree.index_of("src/components/TreeView.jsx").unwrap()));

        // Substring hits directories too.
        let matches = search_matches(&tree, "src");
        assert!(matches.contains(&tree.index_of("src").unwrap()));
        assert!(matches.contains(&tree.index_of("src/App.jsx").unwrap()));

        assert!(search_matches(&tree, "   ").is_empty());
    }

    #[test]
    fn relative_references_resolve_against_the_file_directory() {
        assert_eq!(
            resolve_relative("src/components", "../utils/githubApi"),
            "src/utils/githubApi"
        );
        assert_eq!(resolve_relative("src", "./App"), "src/App");
        assert_eq!(resolve_relative("", "./top"), "top");
        // `..` past the root saturates.
        assert_eq!(resolve_relative("src", "../../../etc/passwd"), "etc/passwd");
    }

    #[test]
    fn collects_quoted_relative_refs_once() {
        let source = r#"
import api from '../utils/githubApi';
import App from "./App";
import App2 from "./App";
import external from 'react';
const template = `../utils/githubApi`;
"#;
        let refs = collect_relative_refs(source);
        assert_eq!(refs, vec!["../utils/githubApi", "./App"]);
    }

    #[test]
    fn dependency_prefix_match_highlights_extensionless_refs() {
        let tree = tree();
        let refs = vec!["../utils/githubApi".to_owned()];
        let resolved = resolve_dependencies("src/components/TreeView.jsx", &refs);
        assert_eq!(resolved, vec!["src/utils/githubApi"]);

        let matches = dependency_matches(&tree, &resolved);
        assert!(matches.contains(&tree.index_of("src/utils/githubApi.js").unwrap()));
        assert!(!matches.contains(&tree.index_of("src/App.jsx").unwrap()));
    }
}
