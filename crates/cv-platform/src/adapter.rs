//! The `PlatformAdapter` trait (§4.8) and its factory. One trait, three
//! implementations (`github`, `gitlab`, `bitbucket`) behind `Box<dyn
//! PlatformAdapter>`, generalized from the template's GitLab-only,
//! enum-dispatched `ProviderClient` facade.

use crate::errors::Result;
use crate::types::{
    Branch, Commit, Issue, IssueState, IssueUpdate, NewIssue, NewPullRequest, NewRelease,
    PlatformKind, PrState, PullRequest, PullRequestUpdate, Release, Repository, TokenInfo,
};
use async_trait::async_trait;
use cv_credentials::CredentialStore;
use std::sync::Arc;

#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn kind(&self) -> PlatformKind;

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository>;

    async fn create_pr(&self, owner: &str, repo: &str, new_pr: NewPullRequest) -> Result<PullRequest>;
    async fn get_pr(&self, owner: &str, repo: &str, number: u64) -> Result<PullRequest>;
    async fn list_prs(&self, owner: &str, repo: &str, state: Option<PrState>) -> Result<Vec<PullRequest>>;
    async fn update_pr(&self, owner: &str, repo: &str, number: u64, update: PullRequestUpdate) -> Result<PullRequest>;
    async fn merge_pr(&self, owner: &str, repo: &str, number: u64) -> Result<PullRequest>;

    /// Where a host has no releases concept, adapters substitute tags; see
    /// each implementation's module doc.
    async fn create_release(&self, owner: &str, repo: &str, new_release: NewRelease) -> Result<Release>;
    async fn get_release(&self, owner: &str, repo: &str, tag: &str) -> Result<Release>;
    async fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>>;
    async fn delete_release(&self, owner: &str, repo: &str, tag: &str) -> Result<()>;

    async fn create_issue(&self, owner: &str, repo: &str, new_issue: NewIssue) -> Result<Issue>;
    async fn get_issue(&self, owner: &str, repo: &str, number: u64) -> Result<Issue>;
    async fn list_issues(&self, owner: &str, repo: &str, state: Option<IssueState>) -> Result<Vec<Issue>>;
    async fn update_issue(&self, owner: &str, repo: &str, number: u64, update: IssueUpdate) -> Result<Issue>;

    async fn list_commits(&self, owner: &str, repo: &str, branch: &str) -> Result<Vec<Commit>>;
    async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<Commit>;

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>>;
    async fn get_branch(&self, owner: &str, repo: &str, name: &str) -> Result<Branch>;

    async fn validate_token(&self) -> Result<TokenInfo>;
}

#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub kind: PlatformKind,
    pub base_api: String,
}

impl PlatformConfig {
    pub fn new(kind: PlatformKind, base_api: impl Into<String>) -> Self {
        Self { kind, base_api: base_api.into() }
    }
}

/// Maps a git remote URL (https or ssh form) to a platform tag. Self-hosted
/// instances are not detectable this way; callers fall back to
/// `platform.type` from repo config when this returns `None`.
pub fn detect_platform(remote_url: &str) -> Option<PlatformKind> {
    let lower = remote_url.to_lowercase();
    if lower.contains("github.com") {
        Some(PlatformKind::GitHub)
    } else if lower.contains("gitlab.com") {
        Some(PlatformKind::GitLab)
    } else if lower.contains("bitbucket.org") {
        Some(PlatformKind::Bitbucket)
    } else {
        None
    }
}

/// Builds the adapter for `config.kind`. The credential store is not
/// consulted here — each adapter looks its token up lazily on first
/// request, so an unauthenticated caller only pays the `kind=auth` failure
/// once a call is actually attempted.
pub fn create_platform_adapter(config: PlatformConfig, credentials: Arc<CredentialStore>) -> Result<Box<dyn PlatformAdapter>> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("cv/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(crate::errors::PlatformError::from)?;

    Ok(match config.kind {
        PlatformKind::GitHub => Box::new(crate::github::GitHubAdapter::new(http, config.base_api, credentials)),
        PlatformKind::GitLab => Box::new(crate::gitlab::GitLabAdapter::new(http, config.base_api, credentials)),
        PlatformKind::Bitbucket => Box::new(crate::bitbucket::BitbucketAdapter::new(http, config.base_api, credentials)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_known_hosts_from_remote_url() {
        assert_eq!(detect_platform("git@github.com:acme/widgets.git"), Some(PlatformKind::GitHub));
        assert_eq!(detect_platform("https://gitlab.com/acme/widgets.git"), Some(PlatformKind::GitLab));
        assert_eq!(detect_platform("https://bitbucket.org/acme/widgets.git"), Some(PlatformKind::Bitbucket));
        assert_eq!(detect_platform("https://git.internal.example.com/acme/widgets.git"), None);
    }
}
