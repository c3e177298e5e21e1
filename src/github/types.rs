use serde::Deserialize;

/// One flat record from the recursive tree listing. `path` is unique within a
/// listing; `size` is only reported for blobs.
#[derive(Clone, Debug, Deserialize)]
pub struct RepoEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub sha: Option<String>,
    /// Change status supplied by an external diff source, never by the tree
    /// listing itself. Only consulted for node coloring.
    #[serde(skip)]
    pub status: Option<ChangeStatus>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    /// Submodule pointer. Rendered like a directory; has no fetchable blob.
    Commit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeStatus {
    Added,
    Modified,
    Removed,
}

impl ChangeStatus {
    /// Maps the compare endpoint's per-file status strings. Renames and
    /// copies count as modifications; unknown strings are ignored.
    pub fn from_api(status: &str) -> Option<Self> {
        match status {
            "added" => Some(Self::Added),
            "removed" => Some(Self::Removed),
            "modified" | "renamed" | "copied" | "changed" => Some(Self::Modified),
            _ => None,
        }
    }
}

/// Commit metadata reduced to what the history panel renders, newest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitSummary {
    pub id: String,
    pub author: String,
    pub timestamp: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawTreeResponse {
    pub(super) tree: Vec<RepoEntry>,
    #[serde(default)]
    pub(super) truncated: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawRepoInfo {
    pub(super) default_branch: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawBranch {
    pub(super) name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawBlob {
    #[serde(default)]
    pub(super) content: String,
    #[serde(default)]
    pub(super) encoding: String,
    #[serde(default)]
    pub(super) size: u64,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawCompare {
    #[serde(default)]
    pub(super) files: Vec<RawCompareFile>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawCompareFile {
    pub(super) filename: String,
    #[serde(default)]
    pub(super) status: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawCommit {
    pub(super) sha: String,
    pub(super) commit: RawCommitDetail,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawCommitDetail {
    #[serde(default)]
    pub(super) author: Option<RawCommitAuthor>,
    #[serde(default)]
    pub(super) message: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawCommitAuthor {
    #[serde(default)]
    pub(super) name: String,
    #[serde(default)]
    pub(super) date: String,
}

impl RawCommit {
    pub(super) fn into_summary(self) -> CommitSummary {
        let (author, timestamp) = match self.commit.author {
            Some(author) => (author.name, author.date),
            None => (String::new(), String::new()),
        };

        CommitSummary {
            id: self.sha,
            author,
            timestamp,
            message: self.commit.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_statuses_map_onto_change_kinds() {
        assert_eq!(ChangeStatus::from_api("added"), Some(ChangeStatus::Added));
        assert_eq!(ChangeStatus::from_api("removed"), Some(ChangeStatus::Removed));
        assert_eq!(ChangeStatus::from_api("modified"), Some(ChangeStatus::Modified));
        assert_eq!(ChangeStatus::from_api("renamed"), Some(ChangeStatus::Modified));
        assert_eq!(ChangeStatus::from_api("unchanged"), None);
        assert_eq!(ChangeStatus::from_api(""), None);
    }

    #[test]
    fn tree_entry_kinds_deserialize_lowercase() {
        let raw = r#"{"path":"src/main.rs","type":"blob","size":120,"sha":"abc"}"#;
        let entry: RepoEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.kind, EntryKind::Blob);
        assert_eq!(entry.size, Some(120));
        assert!(entry.status.is_none());

        let raw = r#"{"path":"vendored","type":"commit","sha":"abc"}"#;
        let entry: RepoEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.kind, EntryKind::Commit);
    }

    #[test]
    fn commit_without_author_reduces_to_empty_fields() {
        let raw = r#"{"sha":"deadbeef","commit":{"message":"fix build"}}"#;
        let commit: RawCommit = serde_json::from_str(raw).unwrap();
        let summary = commit.into_summary();
        assert_eq!(summary.id, "deadbeef");
        assert_eq!(summary.author, "");
        assert_eq!(summary.message, "fix build");
    }
}
