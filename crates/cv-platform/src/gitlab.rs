//! GitLab adapter (REST v4). Projects are addressed by URL-encoded
//! `owner/repo` path; merge requests use `iid` as their per-project number.

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
pub struct GitLabAdapter {
    http: Client,
    base_api: String,
    credentials: Arc<CredentialStore>,
    token: OnceLock<String>,
}

impl GitLabAdapter {
    pub fn new(http: Client, base_api: String, credentials: Arc<CredentialStore>) -> Self {
        Self { http, base_api, credentials, token: OnceLock::new() }
    }

    async fn token(&self) -> Result<String> {
        if let Some(t) = self.token.get() {
            return Ok(t.clone());
        }
        let creds = self.credentials.clone();
        let token = tokio::task::spawn_blocking(move || creds.get_git_platform_token("gitlab"))
            .await
            .map_err(|e| PlatformError::server(e.to_string()))??;
        let _ = self.token.set(token.clone());
        Ok(token)
    }

    fn project_path(owner: &str, repo: &str) -> String {
        urlencoding::encode(&format!("{owner}/{repo}")).into_owned()
    }

    fn auth(&self, req: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        req.header("PRIVATE-TOKEN", token)
    }
}

#[async_trait::async_trait]
impl PlatformAdapter for GitLabAdapter {
    fn kind(&self) -> PlatformKind {
        PlatformKind::GitLab
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository> {
        let token = self.token().await?;
        let url = format!("{}/projects/{}", self.base_api, Self::project_path(owner, repo));
        debug!(url, "gitlab get_repository");
        let resp: GlProject = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(Repository { owner: owner.to_string(), name: repo.to_string(), default_branch: resp.default_branch, web_url: resp.web_url })
    }

    async fn create_pr(&self, owner: &str, repo: &str, new_pr: NewPullRequest) -> Result<PullRequest> {
        let token = self.token().await?;
        let url = format!("{}/projects/{}/merge_requests", self.base_api, Self::project_path(owner, repo));
        let body = GlNewMr {
            title: &new_pr.title,
            description: new_pr.description.as_deref(),
            source_branch: &new_pr.head_branch,
            target_branch: &new_pr.base_branch,
        };
        let resp: GlMr = self.auth(self.http.post(url), &token).json(&body).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn get_pr(&self, owner: &str, repo: &str, number: u64) -> Result<PullRequest> {
        let token = self.token().await?;
        let url = format!("{}/projects/{}/merge_requests/{number}", self.base_api, Self::project_path(owner, repo));
        let resp: GlMr = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn list_prs(&self, owner: &str, repo: &str, state: Option<PrState>) -> Result<Vec<PullRequest>> {
        let token = self.token().await?;
        let mut url = format!("{}/projects/{}/merge_requests?per_page=100", self.base_api, Self::project_path(owner, repo));
        if let Some(s) = state {
            url.push_str(&format!("&state={}", gl_state_query(s)));
        }
        let resp: Vec<GlMr> = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into_iter().map(Into::into).collect())
    }

    async fn update_pr(&self, owner: &str, repo: &str, number: u64, update: PullRequestUpdate) -> Result<PullRequest> {
        let token = self.token().await?;
        let url = format!("{}/projects/{}/merge_requests/{number}", self.base_api, Self::project_path(owner, repo));
        let body = GlUpdateMr {
            title: update.title.as_deref(),
            description: update.description.as_deref(),
            state_event: update.state.map(|s| if matches!(s, PrState::Closed) { "close" } else { "reopen" }),
        };
        let resp: GlMr = self.auth(self.http.put(url), &token).json(&body).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn merge_pr(&self, owner: &str, repo: &str, number: u64) -> Result<PullRequest> {
        let token = self.token().await?;
        let url = format!("{}/projects/{}/merge_requests/{number}/merge", self.base_api, Self::project_path(owner, repo));
        let resp: GlMr = self.auth(self.http.put(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn create_release(&self, owner: &str, repo: &str, new_release: NewRelease) -> Result<Release> {
        let token = self.token().await?;
        let url = format!("{}/projects/{}/releases", self.base_api, Self::project_path(owner, repo));
        let body = GlNewRelease { tag_name: &new_release.tag, name: new_release.name.as_deref(), description: new_release.body.as_deref() };
        let resp: GlRelease = self.auth(self.http.post(url), &token).json(&body).send().await?.error_for_status()?.json().await?;
        Ok(resp.into_release(new_release.draft, new_release.prerelease))
    }

    async fn get_release(&self, owner: &str, repo: &str, tag: &str) -> Result<Release> {
        let token = self.token().await?;
        let url = format!("{}/projects/{}/releases/{tag}", self.base_api, Self::project_path(owner, repo));
        let resp: GlRelease = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into_release(false, false))
    }

    async fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        let token = self.token().await?;
        let url = format!("{}/projects/{}/releases?per_page=100", self.base_api, Self::project_path(owner, repo));
        let resp: Vec<GlRelease> = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into_iter().map(|r| r.into_release(false, false)).collect())
    }

    async fn delete_release(&self, owner: &str, repo: &str, tag: &str) -> Result<()> {
        let token = self.token().await?;
        let url = format!("{}/projects/{}/releases/{tag}", self.base_api, Self::project_path(owner, repo));
        self.auth(self.http.delete(url), &token).send().await?.error_for_status()?;
        Ok(())
    }

    async fn create_issue(&self, owner: &str, repo: &str, new_issue: NewIssue) -> Result<Issue> {
        let token = self.token().await?;
        let url = format!("{}/projects/{}/issues", self.base_api, Self::project_path(owner, repo));
        let body = GlNewIssue { title: &new_issue.title, description: new_issue.body.as_deref(), labels: new_issue.labels.join(",") };
        let resp: GlIssue = self.auth(self.http.post(url), &token).json(&body).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn get_issue(&self, owner: &str, repo: &str, number: u64) -> Result<Issue> {
        let token = self.token().await?;
        let url = format!("{}/projects/{}/issues/{number}", self.base_api, Self::project_path(owner, repo));
        let resp: GlIssue = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn list_issues(&self, owner: &str, repo: &str, state: Option<IssueState>) -> Result<Vec<Issue>> {
        let token = self.token().await?;
        let mut url = format!("{}/projects/{}/issues?per_page=100", self.base_api, Self::project_path(owner, repo));
        if let Some(s) = state {
            url.push_str(&format!("&state={}", if matches!(s, IssueState::Closed) { "closed" } else { "opened" }));
        }
        let resp: Vec<GlIssue> = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into_iter().map(Into::into).collect())
    }

    async fn update_issue(&self, owner: &str, repo: &str, number: u64, update: IssueUpdate) -> Result<Issue> {
        let token = self.token().await?;
        let url = format!("{}/projects/{}/issues/{number}", self.base_api, Self::project_path(owner, repo));
        let body = GlUpdateIssue {
            title: update.title.as_deref(),
            description: update.body.as_deref(),
            state_event: update.state.map(|s| if matches!(s, IssueState::Closed) { "close" } else { "reopen" }),
        };
        let resp: GlIssue = self.auth(self.http.put(url), &token).json(&body).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn list_commits(&self, owner: &str, repo: &str, branch: &str) -> Result<Vec<Commit>> {
        let token = self.token().await?;
        let url = format!("{}/projects/{}/repository/commits?ref_name={branch}&per_page=100", self.base_api, Self::project_path(owner, repo));
        let resp: Vec<GlCommit> = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into_iter().map(Into::into).collect())
    }

    async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<Commit> {
        let token = self.token().await?;
        let url = format!("{}/projects/{}/repository/commits/{sha}", self.base_api, Self::project_path(owner, repo));
        let resp: GlCommit = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>> {
        let token = self.token().await?;
        let url = format!("{}/projects/{}/repository/branches?per_page=100", self.base_api, Self::project_path(owner, repo));
        let resp: Vec<GlBranch> = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into_iter().map(|b| Branch { name: b.name, head_sha: b.commit.id, is_default: b.default, protected: b.protected }).collect())
    }

    async fn get_branch(&self, owner: &str, repo: &str, name: &str) -> Result<Branch> {
        let token = self.token().await?;
        let url = format!("{}/projects/{}/repository/branches/{name}", self.base_api, Self::project_path(owner, repo));
        let resp: GlBranch = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(Branch { name: resp.name, head_sha: resp.commit.id, is_default: resp.default, protected: resp.protected })
    }

    async fn validate_token(&self) -> Result<TokenInfo> {
        let token = self.token().await?;
        let url = format!("{}/user", self.base_api);
        let user: GlUser = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(TokenInfo { scopes: Vec::new(), user: Some(user.into()) })
    }
}

fn gl_state_query(state: PrState) -> &'static str {
    match state {
        PrState::Open => "opened",
        PrState::Merged => "merged",
        PrState::Closed => "closed",
    }
}

#[derive(Debug, Deserialize)]
struct GlProject {
    default_branch: String,
    web_url: String,
}

#[derive(Debug, Deserialize)]
struct GlUser {
    id: u64,
    username: String,
    name: String,
    web_url: Option<String>,
    avatar_url: Option<String>,
}

impl From<GlUser> for User {
    fn from(u: GlUser) -> Self {
        User { id: u.id.to_string(), username: Some(u.username), name: Some(u.name), web_url: u.web_url, avatar_url: u.avatar_url }
    }
}

#[derive(Debug, Serialize)]
struct GlNewMr<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    source_branch: &'a str,
    target_branch: &'a str,
}

#[derive(Debug, Serialize)]
struct GlUpdateMr<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_event: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GlMr {
    iid: u64,
    title: String,
    description: Option<String>,
    state: String,
    work_in_progress: Option<bool>,
    author: GlUser,
    source_branch: String,
    target_branch: String,
    web_url: String,
    created_at: String,
    updated_at: String,
}

impl From<GlMr> for PullRequest {
    fn from(m: GlMr) -> Self {
        let state = match m.state.as_str() {
            "merged" => PrState::Merged,
            "closed" => PrState::Closed,
            _ => PrState::Open,
        };
        PullRequest {
            number: m.iid,
            title: m.title,
            description: m.description,
            state,
            draft: m.work_in_progress.unwrap_or(false),
            author: m.author.into(),
            base_branch: m.target_branch,
            head_branch: m.source_branch,
            web_url: m.web_url,
            created_at: parse_ts(&m.created_at),
            updated_at: parse_ts(&m.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
struct GlNewRelease<'a> {
    tag_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GlRelease {
    tag_name: String,
    name: Option<String>,
    description: Option<String>,
    #[serde(rename = "_links")]
    links: Option<GlReleaseLinks>,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct GlReleaseLinks {
    #[serde(rename = "self")]
    self_link: Option<String>,
}

impl GlRelease {
    fn into_release(self, draft: bool, prerelease: bool) -> Release {
        let web_url = self.links.and_then(|l| l.self_link).unwrap_or_default();
        Release { tag: self.tag_name, name: self.name, body: self.description, draft, prerelease, web_url, created_at: parse_ts(&self.created_at) }
    }
}

#[derive(Debug, Serialize)]
struct GlNewIssue<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    labels: String,
}

#[derive(Debug, Serialize)]
struct GlUpdateIssue<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_event: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GlIssue {
    iid: u64,
    title: String,
    description: Option<String>,
    state: String,
    author: GlUser,
    web_url: String,
    created_at: String,
    updated_at: String,
}

impl From<GlIssue> for Issue {
    fn from(i: GlIssue) -> Self {
        Issue {
            number: i.iid,
            title: i.title,
            body: i.description,
            state: if i.state == "closed" { IssueState::Closed } else { IssueState::Open },
            author: i.author.into(),
            web_url: i.web_url,
            created_at: parse_ts(&i.created_at),
            updated_at: parse_ts(&i.updated_at),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GlCommit {
    id: String,
    message: String,
    author_name: Option<String>,
    authored_date: Option<String>,
    web_url: Option<String>,
}

impl From<GlCommit> for Commit {
    fn from(c: GlCommit) -> Self {
        Commit { sha: c.id, message: c.message, author_name: c.author_name, authored_at: c.authored_date.as_deref().map(parse_ts), web_url: c.web_url }
    }
}

#[derive(Debug, Deserialize)]
struct GlBranch {
    name: String,
    commit: GlBranchCommit,
    #[serde(rename = "default")]
    default: bool,
    protected: bool,
}

#[derive(Debug, Deserialize)]
struct GlBranchCommit {
    id: String,
}
