mod api;
pub mod content;
mod types;

pub use api::{ApiError, GithubClient, RepoLocator, parse_repo_url};
pub use content::{FileBody, FileContent};
pub use types::{ChangeStatus, CommitSummary, EntryKind, RepoEntry};
