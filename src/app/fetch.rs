//! Background fetch workers. Each spawn returns a one-shot mpsc receiver the
//! update loop polls with `try_recv`; results carry the selection token they
//! were issued under so the state machine can drop stale ones. In-flight
//! requests are never aborted, only their effects are suppressed.

use std::sync::mpsc::{self, Receiver};
use std::thread;

use tracing::{info, warn};

use crate::explain::{ExplainRequest, request_explanation};
use crate::github::{
    ApiError, CommitSummary, FileContent, GithubClient, RepoEntry, RepoLocator, parse_repo_url,
};

/// Everything the visualizer needs after a successful repository load.
#[derive(Debug)]
pub struct RepoSnapshot {
    pub locator: RepoLocator,
    pub branch: String,
    pub branches: Vec<String>,
    pub entries: Vec<RepoEntry>,
}

fn load_repo(
    url: &str,
    credential: Option<String>,
    branch: Option<String>,
) -> Result<RepoSnapshot, ApiError> {
    let locator = parse_repo_url(url)?;
    let client = GithubClient::new(credential);

    let default_branch = client.default_branch(&locator)?;
    let branch = branch.unwrap_or_else(|| default_branch.clone());

    // Branch listing is a convenience for the picker; its failure should not
    // sink the whole load.
    let branches = match client.branches(&locator) {
        Ok(branches) => branches,
        Err(error) => {
            warn!(repo = %locator.slug(), %error, "branch listing failed");
            Vec::new()
        }
    };

    let mut entries = client.tree(&locator, &branch)?;

    // On a non-default branch, color nodes by their diff against the default
    // branch. Best effort; a failed compare just leaves nodes uncolored.
    if branch != default_branch {
        match client.compare(&locator, &default_branch, &branch) {
            Ok(statuses) => {
                for entry in &mut entries {
                    entry.status = statuses.get(&entry.path).copied();
                }
            }
            Err(error) => {
                warn!(repo = %locator.slug(), %branch, %error, "branch compare failed");
            }
        }
    }
    info!(
        repo = %locator.slug(),
        %branch,
        entries = entries.len(),
        "repository tree loaded"
    );

    Ok(RepoSnapshot {
        locator,
        branch,
        branches,
        entries,
    })
}

pub fn spawn_repo_load(
    url: String,
    credential: Option<String>,
    branch: Option<String>,
) -> Receiver<Result<RepoSnapshot, String>> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = load_repo(&url, credential, branch).map_err(|error| error.to_string());
        let _ = tx.send(result);
    });

    rx
}

pub fn spawn_content_fetch(
    client: GithubClient,
    locator: RepoLocator,
    sha: String,
    path: String,
    token: u64,
) -> Receiver<(u64, Result<FileContent, String>)> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = client
            .blob(&locator, &sha, &path)
            .map_err(|error| error.to_string());
        let _ = tx.send((token, result));
    });

    rx
}

pub fn spawn_history_fetch(
    client: GithubClient,
    locator: RepoLocator,
    path: String,
    branch: String,
    token: u64,
) -> Receiver<(u64, Result<Vec<CommitSummary>, String>)> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = client
            .commits(&locator, &path, &branch)
            .map_err(|error| error.to_string());
        let _ = tx.send((token, result));
    });

    rx
}

pub fn spawn_explain_fetch(
    request: ExplainRequest,
    token: u64,
) -> Receiver<(u64, Result<String, super::selection::ExplainFailure>)> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let http = reqwest::blocking::Client::new();
        let result = request_explanation(&http, &request).map_err(|error| {
            super::selection::ExplainFailure {
                retryable: error.is_retryable(),
                message: error.to_string(),
            }
        });
        let _ = tx.send((token, result));
    });

    rx
}
