//! Selection and load state machine. Owns the monotonically increasing
//! selection token: every fetch is stamped with the token live at issue time,
//! and a resolution whose token no longer matches is dropped on the floor.
//! Network errors arrive as already-formatted messages and land in phase
//! fields; nothing here can fail across the boundary.

use tracing::debug;

use crate::github::{CommitSummary, FileContent};
use crate::hierarchy::{NodeKind, TreeNode};

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ContentPhase {
    #[default]
    Idle,
    Loading,
    Ready(FileContent),
    Failed(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ExplainPhase {
    #[default]
    Idle,
    Loading,
    Ready(String),
    Failed { message: String, retryable: bool },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum HistoryPhase {
    #[default]
    Idle,
    Loading,
    Ready(Vec<CommitSummary>),
    Failed(String),
}

/// Explanation failure as delivered by the fetch worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExplainFailure {
    pub message: String,
    pub retryable: bool,
}

#[derive(Clone, Debug)]
pub struct Selected {
    pub id: String,
    pub kind: NodeKind,
    pub sha: Option<String>,
}

#[derive(Debug, Default)]
pub struct Selection {
    token: u64,
    selected: Option<Selected>,
    pub content: ContentPhase,
    pub explanation: ExplainPhase,
    pub history: HistoryPhase,
}

impl Selection {
    pub fn selected(&self) -> Option<&Selected> {
        self.selected.as_ref()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_ref().map(|s| s.id.as_str())
    }

    /// Selects a node. Directories (and the root) have nothing to load and
    /// stay idle. For a blob with a content id this returns the token the
    /// caller must stamp on the content fetch it spawns; any fetch still in
    /// flight for the previous selection is invalidated by the bump.
    pub fn select(&mut self, node: &TreeNode) -> Option<u64> {
        self.token += 1;
        self.explanation = ExplainPhase::Idle;
        self.history = HistoryPhase::Idle;
        self.selected = Some(Selected {
            id: node.id.clone(),
            kind: node.kind,
            sha: node.sha.clone(),
        });

        match (node.kind, &node.sha) {
            (NodeKind::Blob, Some(_)) => {
                self.content = ContentPhase::Loading;
                Some(self.token)
            }
            (NodeKind::Blob, None) => {
                self.content = ContentPhase::Failed("file has no content id".to_owned());
                None
            }
            _ => {
                self.content = ContentPhase::Idle;
                None
            }
        }
    }

    pub fn clear(&mut self) {
        // Bumping the token turns any late resolution into a no-op.
        self.token += 1;
        self.selected = None;
        self.content = ContentPhase::Idle;
        self.explanation = ExplainPhase::Idle;
        self.history = HistoryPhase::Idle;
    }

    /// Applies a content-fetch resolution. Returns whether it was accepted;
    /// stale tokens are silently discarded.
    pub fn on_content(&mut self, token: u64, result: Result<FileContent, String>) -> bool {
        if token != self.token {
            debug!(token, current = self.token, "dropping stale content result");
            return false;
        }

        self.content = match result {
            Ok(content) => ContentPhase::Ready(content),
            Err(message) => ContentPhase::Failed(message),
        };
        true
    }

    /// Starts the explanation sub-phase. Only valid once content is ready
    /// and textual; returns the token and the code to explain.
    pub fn begin_explanation(&mut self) -> Option<(u64, String)> {
        let ContentPhase::Ready(content) = &self.content else {
            return None;
        };
        let code = content.text()?.to_owned();

        self.explanation = ExplainPhase::Loading;
        Some((self.token, code))
    }

    pub fn on_explanation(&mut self, token: u64, result: Result<String, ExplainFailure>) -> bool {
        if token != self.token {
            debug!(token, current = self.token, "dropping stale explanation result");
            return false;
        }

        self.explanation = match result {
            Ok(text) => ExplainPhase::Ready(text),
            Err(failure) => ExplainPhase::Failed {
                message: failure.message,
                retryable: failure.retryable,
            },
        };
        true
    }

    /// Starts a commit-history fetch for the current selection. Idempotent:
    /// returns None while a fetch is in flight or once commits are populated,
    /// so repeat calls issue no second request. A failed fetch may be
    /// re-triggered explicitly.
    pub fn begin_history(&mut self) -> Option<(u64, String)> {
        let selected = self.selected.as_ref()?;
        if matches!(self.history, HistoryPhase::Loading | HistoryPhase::Ready(_)) {
            return None;
        }

        self.history = HistoryPhase::Loading;
        Some((self.token, selected.id.clone()))
    }

    pub fn on_history(&mut self, token: u64, result: Result<Vec<CommitSummary>, String>) -> bool {
        if token != self.token {
            debug!(token, current = self.token, "dropping stale history result");
            return false;
        }

        self.history = match result {
            Ok(commits) => HistoryPhase::Ready(commits),
            Err(message) => HistoryPhase::Failed(message),
        };
        true
    }
}
