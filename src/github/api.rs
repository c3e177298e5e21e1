use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use tracing::{debug, warn};
use url::Url;

use std::collections::HashMap;

use super::content::{FileContent, decode_blob};
use super::types::{
    ChangeStatus, CommitSummary, RawBlob, RawBranch, RawCommit, RawCompare, RawRepoInfo,
    RawTreeResponse, RepoEntry,
};

const GITHUB_API_BASE: &str = "https://api.github.com";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not a GitHub repository URL: {0}")]
    InvalidRepoUrl(String),

    #[error("repository, branch, or object not found")]
    NotFound,

    #[error("GitHub API rate limit exceeded; add a personal access token to raise the limit")]
    RateLimited,

    #[error("authentication required or token rejected")]
    AuthRequired,

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected GitHub response: {0}")]
    Decode(String),
}

/// Owner/repo pair parsed out of a user-supplied repository URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoLocator {
    pub owner: String,
    pub repo: String,
}

impl RepoLocator {
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Accepts the common URL shapes: `https://github.com/owner/repo`, with or
/// without a trailing `/`, `.git` suffix, or a `/tree/...`/`/blob/...` tail.
/// Fails fast before any network call.
pub fn parse_repo_url(input: &str) -> Result<RepoLocator, ApiError> {
    let trimmed = input.trim();
    let invalid = || ApiError::InvalidRepoUrl(trimmed.to_owned());

    let url = Url::parse(trimmed).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    let host = url.host_str().ok_or_else(invalid)?;
    if host != "github.com" && !host.ends_with(".github.com") {
        return Err(invalid());
    }

    let mut segments = url.path_segments().ok_or_else(invalid)?;
    let owner = segments.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
    let repo_raw = segments.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
    let repo = repo_raw.strip_suffix(".git").unwrap_or(repo_raw);
    if repo.is_empty() {
        return Err(invalid());
    }

    Ok(RepoLocator {
        owner: owner.to_owned(),
        repo: repo.to_owned(),
    })
}

/// `{base}/repos/{owner}/{repo}/{parts...}` with every segment
/// percent-encoded, so branch names and paths with reserved characters
/// cannot break out of their path position.
fn repo_endpoint(locator: &RepoLocator, parts: &[&str]) -> Result<Url, ApiError> {
    let mut url =
        Url::parse(GITHUB_API_BASE).map_err(|error| ApiError::Decode(error.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| ApiError::Decode("API base URL cannot carry a path".to_owned()))?;
        segments.extend(["repos", locator.owner.as_str(), locator.repo.as_str()]);
        segments.extend(parts.iter().copied());
    }
    Ok(url)
}

fn commits_url(locator: &RepoLocator, path: &str, branch: &str) -> Result<Url, ApiError> {
    let mut url = repo_endpoint(locator, &["commits"])?;
    url.query_pairs_mut()
        .append_pair("path", path)
        .append_pair("sha", branch);
    Ok(url)
}

/// Thin blocking client for the handful of GitHub REST endpoints the app
/// needs. Cheap to clone; workers each carry their own copy.
#[derive(Clone, Debug)]
pub struct GithubClient {
    http: Client,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(token: Option<String>) -> Self {
        let token = token.and_then(|t| {
            let trimmed = t.trim().to_owned();
            if trimmed.is_empty() { None } else { Some(trimmed) }
        });

        Self {
            http: Client::new(),
            token,
        }
    }

    fn get(&self, url: Url) -> Result<Response, ApiError> {
        debug!(%url, "github request");
        let mut request = self
            .http
            .get(url)
            .header(ACCEPT, "application/vnd.github.v3+json")
            .header(USER_AGENT, concat!("repograph/", env!("CARGO_PKG_VERSION")));
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {token}"));
        }

        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        Err(match status {
            StatusCode::NOT_FOUND => ApiError::NotFound,
            StatusCode::UNAUTHORIZED => ApiError::AuthRequired,
            // Unauthenticated callers hit 403 when the hourly quota runs out.
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
            _ => {
                let body = response.text().unwrap_or_default();
                ApiError::Decode(format!("HTTP {status}: {body}"))
            }
        })
    }

    pub fn default_branch(&self, locator: &RepoLocator) -> Result<String, ApiError> {
        let url = repo_endpoint(locator, &[])?;
        let info: RawRepoInfo = self.get(url)?.json()?;
        Ok(info.default_branch)
    }

    pub fn branches(&self, locator: &RepoLocator) -> Result<Vec<String>, ApiError> {
        let url = repo_endpoint(locator, &["branches"])?;
        let branches: Vec<RawBranch> = self.get(url)?.json()?;
        Ok(branches.into_iter().map(|branch| branch.name).collect())
    }

    /// Recursive tree listing for a branch. Order is whatever the API
    /// returns; the hierarchy builder depends only on that order.
    pub fn tree(&self, locator: &RepoLocator, branch: &str) -> Result<Vec<RepoEntry>, ApiError> {
        let mut url = repo_endpoint(locator, &["git", "trees", branch])?;
        url.set_query(Some("recursive=1"));
        let listing: RawTreeResponse = self.get(url)?.json()?;
        if listing.truncated {
            warn!(
                repo = %locator.slug(),
                branch,
                "tree listing was truncated by the API; the graph will be incomplete"
            );
        }
        Ok(listing.tree)
    }

    pub fn blob(
        &self,
        locator: &RepoLocator,
        sha: &str,
        path: &str,
    ) -> Result<FileContent, ApiError> {
        let url = repo_endpoint(locator, &["git", "blobs", sha])?;
        let blob: RawBlob = self.get(url)?.json()?;
        if blob.encoding != "base64" {
            return Err(ApiError::Decode(format!(
                "unexpected blob encoding `{}`",
                blob.encoding
            )));
        }
        decode_blob(&blob.content, blob.size, path)
    }

    /// Per-file change status of `head` relative to `base`, from the compare
    /// endpoint. Removed files do not appear in the head tree listing, so in
    /// practice only added and modified statuses land on nodes.
    pub fn compare(
        &self,
        locator: &RepoLocator,
        base: &str,
        head: &str,
    ) -> Result<HashMap<String, ChangeStatus>, ApiError> {
        let url = repo_endpoint(locator, &["compare", &format!("{base}...{head}")])?;
        let diff: RawCompare = self.get(url)?.json()?;
        Ok(diff
            .files
            .into_iter()
            .filter_map(|file| {
                ChangeStatus::from_api(&file.status).map(|status| (file.filename, status))
            })
            .collect())
    }

    /// Commit history touching `path` on `branch`, newest first.
    pub fn commits(
        &self,
        locator: &RepoLocator,
        path: &str,
        branch: &str,
    ) -> Result<Vec<CommitSummary>, ApiError> {
        let url = commits_url(locator, path, branch)?;
        let commits: Vec<RawCommit> = self.get(url)?.json()?;
        Ok(commits.into_iter().map(RawCommit::into_summary).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_repo_url() {
        let locator = parse_repo_url("https://github.com/rust-lang/rust").unwrap();
        assert_eq!(locator.owner, "rust-lang");
        assert_eq!(locator.repo, "rust");
    }

    #[test]
    fn parses_variants() {
        for url in [
            "https://github.com/owner/repo/",
            "https://github.com/owner/repo.git",
            "http://github.com/owner/repo",
            "https://www.github.com/owner/repo",
            "  https://github.com/owner/repo/tree/main/src  ",
            "https://github.com/owner/repo#readme",
        ] {
            let locator = parse_repo_url(url).unwrap_or_else(|_| panic!("should parse: {url}"));
            assert_eq!(locator.slug(), "owner/repo");
        }
    }

    #[test]
    fn rejects_non_repo_urls() {
        for url in [
            "",
            "github.com/owner/repo",
            "https://gitlab.com/owner/repo",
            "https://github.com/owner",
            "https://github.com//repo",
            "https://example.com/github.com/owner/repo",
            "ftp://github.com/owner/repo",
        ] {
            assert!(
                matches!(parse_repo_url(url), Err(ApiError::InvalidRepoUrl(_))),
                "should reject: {url}"
            );
        }
    }

    fn locator() -> RepoLocator {
        RepoLocator {
            owner: "owner".to_owned(),
            repo: "repo".to_owned(),
        }
    }

    #[test]
    fn endpoint_segments_are_percent_encoded() {
        let url = repo_endpoint(&locator(), &["git", "trees", "feature/x"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/owner/repo/git/trees/feature%2Fx"
        );

        let url = repo_endpoint(&locator(), &["compare", "main...feature/x"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/owner/repo/compare/main...feature%2Fx"
        );
    }

    #[test]
    fn commits_url_encodes_query_pairs() {
        let url = commits_url(&locator(), "src/a b.rs", "feature/x").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/owner/repo/commits?path=src%2Fa+b.rs&sha=feature%2Fx"
        );
    }
}
