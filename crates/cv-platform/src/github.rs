//! GitHub adapter (REST v3). Releases map directly; GitHub has no draft-PR
//! quirk to paper over.

use crate::adapter::PlatformAdapter;
use crate::errors::{PlatformError, Result};
use crate::types::{
    parse_ts, Branch, Commit, Issue, IssueState, IssueUpdate, NewIssue, NewPullRequest, NewRelease,
    PlatformKind, PrState, PullRequest, PullRequestUpdate, Release, Repository, TokenInfo, User,
};
use cv_credentials::CredentialStore;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::debug;

#[derive(Debug)]
pub struct GitHubAdapter {
    http: Client,
    base_api: String,
    credentials: Arc<CredentialStore>,
    token: OnceLock<String>,
}

impl GitHubAdapter {
    pub fn new(http: Client, base_api: String, credentials: Arc<CredentialStore>) -> Self {
        Self { http, base_api, credentials, token: OnceLock::new() }
    }

    async fn token(&self) -> Result<String> {
        if let Some(t) = self.token.get() {
            return Ok(t.clone());
        }
        let creds = self.credentials.clone();
        let token = tokio::task::spawn_blocking(move || creds.get_git_platform_token("github"))
            .await
            .map_err(|e| PlatformError::server(e.to_string()))??;
        let _ = self.token.set(token.clone());
        Ok(token)
    }

    fn auth(&self, req: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        req.header("Authorization", format!("Bearer {token}")).header("Accept", "application/vnd.github+json")
    }
}

#[async_trait::async_trait]
impl PlatformAdapter for GitHubAdapter {
    fn kind(&self) -> PlatformKind {
        PlatformKind::GitHub
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository> {
        let token = self.token().await?;
        let url = format!("{}/repos/{owner}/{repo}", self.base_api);
        debug!(url, "github get_repository");
        let resp: GhRepo = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(Repository { owner: owner.to_string(), name: repo.to_string(), default_branch: resp.default_branch, web_url: resp.html_url })
    }

    async fn create_pr(&self, owner: &str, repo: &str, new_pr: NewPullRequest) -> Result<PullRequest> {
        let token = self.token().await?;
        let url = format!("{}/repos/{owner}/{repo}/pulls", self.base_api);
        let body = GhNewPr { title: &new_pr.title, body: new_pr.description.as_deref(), head: &new_pr.head_branch, base: &new_pr.base_branch, draft: new_pr.draft };
        let resp: GhPr = self.auth(self.http.post(url), &token).json(&body).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn get_pr(&self, owner: &str, repo: &str, number: u64) -> Result<PullRequest> {
        let token = self.token().await?;
        let url = format!("{}/repos/{owner}/{repo}/pulls/{number}", self.base_api);
        let resp: GhPr = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn list_prs(&self, owner: &str, repo: &str, state: Option<PrState>) -> Result<Vec<PullRequest>> {
        let token = self.token().await?;
        let mut url = format!("{}/repos/{owner}/{repo}/pulls?per_page=100", self.base_api);
        if let Some(s) = state {
            url.push_str(&format!("&state={}", gh_state_query(s)));
        }
        let resp: Vec<GhPr> = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into_iter().map(Into::into).collect())
    }

    async fn update_pr(&self, owner: &str, repo: &str, number: u64, update: PullRequestUpdate) -> Result<PullRequest> {
        let token = self.token().await?;
        let url = format!("{}/repos/{owner}/{repo}/pulls/{number}", self.base_api);
        let body = GhUpdatePr {
            title: update.title.as_deref(),
            body: update.description.as_deref(),
            state: update.state.map(|s| if matches!(s, PrState::Closed) { "closed" } else { "open" }),
        };
        let resp: GhPr = self.auth(self.http.patch(url), &token).json(&body).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn merge_pr(&self, owner: &str, repo: &str, number: u64) -> Result<PullRequest> {
        let token = self.token().await?;
        let url = format!("{}/repos/{owner}/{repo}/pulls/{number}/merge", self.base_api);
        self.auth(self.http.put(url), &token).json(&serde_json::json!({})).send().await?.error_for_status()?;
        self.get_pr(owner, repo, number).await
    }

    async fn create_release(&self, owner: &str, repo: &str, new_release: NewRelease) -> Result<Release> {
        let token = self.token().await?;
        let url = format!("{}/repos/{owner}/{repo}/releases", self.base_api);
        let body = GhNewRelease {
            tag_name: &new_release.tag,
            name: new_release.name.as_deref(),
            body: new_release.body.as_deref(),
            draft: new_release.draft,
            prerelease: new_release.prerelease,
        };
        let resp: GhRelease = self.auth(self.http.post(url), &token).json(&body).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn get_release(&self, owner: &str, repo: &str, tag: &str) -> Result<Release> {
        let token = self.token().await?;
        let url = format!("{}/repos/{owner}/{repo}/releases/tags/{tag}", self.base_api);
        let resp: GhRelease = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        let token = self.token().await?;
        let url = format!("{}/repos/{owner}/{repo}/releases?per_page=100", self.base_api);
        let resp: Vec<GhRelease> = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into_iter().map(Into::into).collect())
    }

    async fn delete_release(&self, owner: &str, repo: &str, tag: &str) -> Result<()> {
        let token = self.token().await?;
        let lookup_url = format!("{}/repos/{owner}/{repo}/releases/tags/{tag}", self.base_api);
        let raw: GhRelease = self.auth(self.http.get(lookup_url), &token).send().await?.error_for_status()?.json().await?;
        let url = format!("{}/repos/{owner}/{repo}/releases/{}", self.base_api, raw.id);
        self.auth(self.http.delete(url), &token).send().await?.error_for_status()?;
        Ok(())
    }

    async fn create_issue(&self, owner: &str, repo: &str, new_issue: NewIssue) -> Result<Issue> {
        let token = self.token().await?;
        let url = format!("{}/repos/{owner}/{repo}/issues", self.base_api);
        let body = GhNewIssue { title: &new_issue.title, body: new_issue.body.as_deref(), labels: &new_issue.labels };
        let resp: GhIssue = self.auth(self.http.post(url), &token).json(&body).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn get_issue(&self, owner: &str, repo: &str, number: u64) -> Result<Issue> {
        let token = self.token().await?;
        let url = format!("{}/repos/{owner}/{repo}/issues/{number}", self.base_api);
        let resp: GhIssue = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn list_issues(&self, owner: &str, repo: &str, state: Option<IssueState>) -> Result<Vec<Issue>> {
        let token = self.token().await?;
        let mut url = format!("{}/repos/{owner}/{repo}/issues?per_page=100", self.base_api);
        if let Some(s) = state {
            url.push_str(&format!("&state={}", if matches!(s, IssueState::Closed) { "closed" } else { "open" }));
        }
        let resp: Vec<GhIssue> = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into_iter().filter(|i| i.pull_request.is_none()).map(Into::into).collect())
    }

    async fn update_issue(&self, owner: &str, repo: &str, number: u64, update: IssueUpdate) -> Result<Issue> {
        let token = self.token().await?;
        let url = format!("{}/repos/{owner}/{repo}/issues/{number}", self.base_api);
        let body = GhUpdateIssue {
            title: update.title.as_deref(),
            body: update.body.as_deref(),
            state: update.state.map(|s| if matches!(s, IssueState::Closed) { "closed" } else { "open" }),
        };
        let resp: GhIssue = self.auth(self.http.patch(url), &token).json(&body).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn list_commits(&self, owner: &str, repo: &str, branch: &str) -> Result<Vec<Commit>> {
        let token = self.token().await?;
        let url = format!("{}/repos/{owner}/{repo}/commits?sha={branch}&per_page=100", self.base_api);
        let resp: Vec<GhCommit> = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into_iter().map(Into::into).collect())
    }

    async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<Commit> {
        let token = self.token().await?;
        let url = format!("{}/repos/{owner}/{repo}/commits/{sha}", self.base_api);
        let resp: GhCommit = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>> {
        let token = self.token().await?;
        let repository = self.get_repository(owner, repo).await?;
        let url = format!("{}/repos/{owner}/{repo}/branches?per_page=100", self.base_api);
        let resp: Vec<GhBranch> = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into_iter().map(|b| Branch {
            is_default: b.name == repository.default_branch,
            name: b.name,
            head_sha: b.commit.sha,
            protected: b.protected,
        }).collect())
    }

    async fn get_branch(&self, owner: &str, repo: &str, name: &str) -> Result<Branch> {
        let token = self.token().await?;
        let repository = self.get_repository(owner, repo).await?;
        let url = format!("{}/repos/{owner}/{repo}/branches/{name}", self.base_api);
        let resp: GhBranch = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(Branch { is_default: resp.name == repository.default_branch, name: resp.name, head_sha: resp.commit.sha, protected: resp.protected })
    }

    async fn validate_token(&self) -> Result<TokenInfo> {
        let token = self.token().await?;
        let url = format!("{}/user", self.base_api);
        let resp = self.auth(self.http.get(url), &token).send().await?.error_for_status()?;
        let scopes = resp
            .headers()
            .get("x-oauth-scopes")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();
        let user: GhUser = resp.json().await?;
        Ok(TokenInfo { scopes, user: Some(user.into()) })
    }
}

fn gh_state_query(state: PrState) -> &'static str {
    match state {
        PrState::Open => "open",
        PrState::Merged => "closed",
        PrState::Closed => "closed",
    }
}

#[derive(Debug, Deserialize)]
struct GhRepo {
    default_branch: String,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct GhUser {
    id: u64,
    login: String,
    html_url: Option<String>,
    avatar_url: Option<String>,
}

impl From<GhUser> for User {
    fn from(u: GhUser) -> Self {
        User { id: u.id.to_string(), username: Some(u.login.clone()), name: Some(u.login), web_url: u.html_url, avatar_url: u.avatar_url }
    }
}

#[derive(Debug, Serialize)]
struct GhNewPr<'a> {
    title: &'a str,
    body: Option<&'a str>,
    head: &'a str,
    base: &'a str,
    draft: bool,
}

#[derive(Debug, Serialize)]
struct GhUpdatePr<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GhPr {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    draft: Option<bool>,
    merged: Option<bool>,
    user: GhUser,
    base: GhRef,
    head: GhRef,
    html_url: String,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Deserialize)]
struct GhRef {
    #[serde(rename = "ref")]
    r#ref: String,
}

impl From<GhPr> for PullRequest {
    fn from(p: GhPr) -> Self {
        let state = if p.merged.unwrap_or(false) {
            PrState::Merged
        } else if p.state == "closed" {
            PrState::Closed
        } else {
            PrState::Open
        };
        PullRequest {
            number: p.number,
            title: p.title,
            description: p.body,
            state,
            draft: p.draft.unwrap_or(false),
            author: p.user.into(),
            base_branch: p.base.r#ref,
            head_branch: p.head.r#ref,
            web_url: p.html_url,
            created_at: parse_ts(&p.created_at),
            updated_at: parse_ts(&p.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
struct GhNewRelease<'a> {
    tag_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    draft: bool,
    prerelease: bool,
}

#[derive(Debug, Deserialize)]
struct GhRelease {
    id: u64,
    tag_name: String,
    name: Option<String>,
    body: Option<String>,
    draft: bool,
    prerelease: bool,
    html_url: String,
    created_at: String,
}

impl From<GhRelease> for Release {
    fn from(r: GhRelease) -> Self {
        Release { tag: r.tag_name, name: r.name, body: r.body, draft: r.draft, prerelease: r.prerelease, web_url: r.html_url, created_at: parse_ts(&r.created_at) }
    }
}

#[derive(Debug, Serialize)]
struct GhNewIssue<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    labels: &'a [String],
}

#[derive(Debug, Serialize)]
struct GhUpdateIssue<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GhIssue {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    user: GhUser,
    html_url: String,
    created_at: String,
    updated_at: String,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

impl From<GhIssue> for Issue {
    fn from(i: GhIssue) -> Self {
        Issue {
            number: i.number,
            title: i.title,
            body: i.body,
            state: if i.state == "closed" { IssueState::Closed } else { IssueState::Open },
            author: i.user.into(),
            web_url: i.html_url,
            created_at: parse_ts(&i.created_at),
            updated_at: parse_ts(&i.updated_at),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GhCommit {
    sha: String,
    html_url: String,
    commit: GhCommitInner,
}

#[derive(Debug, Deserialize)]
struct GhCommitInner {
    message: String,
    author: Option<GhCommitAuthor>,
}

#[derive(Debug, Deserialize)]
struct GhCommitAuthor {
    name: String,
    date: String,
}

impl From<GhCommit> for Commit {
    fn from(c: GhCommit) -> Self {
        let (author_name, authored_at) = match c.commit.author {
            Some(a) => (Some(a.name), Some(parse_ts(&a.date))),
            None => (None, None),
        };
        Commit { sha: c.sha, message: c.commit.message, author_name, authored_at, web_url: Some(c.html_url) }
    }
}

#[derive(Debug, Deserialize)]
struct GhBranch {
    name: String,
    commit: GhBranchCommit,
    protected: bool,
}

#[derive(Debug, Deserialize)]
struct GhBranchCommit {
    sha: String,
}
