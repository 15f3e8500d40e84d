//! Bitbucket Cloud adapter (REST v2). Repositories are addressed by
//! `workspace/repo_slug`; Bitbucket has no releases concept, so release
//! operations are backed by annotated tags instead.

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
pub struct BitbucketAdapter {
    http: Client,
    base_api: String,
    credentials: Arc<CredentialStore>,
    token: OnceLock<String>,
}

impl BitbucketAdapter {
    pub fn new(http: Client, base_api: String, credentials: Arc<CredentialStore>) -> Self {
        Self { http, base_api, credentials, token: OnceLock::new() }
    }

    async fn token(&self) -> Result<String> {
        if let Some(t) = self.token.get() {
            return Ok(t.clone());
        }
        let creds = self.credentials.clone();
        let token = tokio::task::spawn_blocking(move || creds.get_git_platform_token("bitbucket"))
            .await
            .map_err(|e| PlatformError::server(e.to_string()))??;
        let _ = self.token.set(token.clone());
        Ok(token)
    }

    fn auth(&self, req: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        req.header("Authorization", format!("Bearer {token}"))
    }
}

#[async_trait::async_trait]
impl PlatformAdapter for BitbucketAdapter {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Bitbucket
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository> {
        let token = self.token().await?;
        let url = format!("{}/repositories/{owner}/{repo}", self.base_api);
        debug!(url, "bitbucket get_repository");
        let resp: BbRepo = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(Repository {
            owner: owner.to_string(),
            name: repo.to_string(),
            default_branch: resp.mainbranch.map(|b| b.name).unwrap_or_else(|| "main".to_string()),
            web_url: resp.links.html.map(|l| l.href).unwrap_or_default(),
        })
    }

    async fn create_pr(&self, owner: &str, repo: &str, new_pr: NewPullRequest) -> Result<PullRequest> {
        let token = self.token().await?;
        let url = format!("{}/repositories/{owner}/{repo}/pullrequests", self.base_api);
        let body = BbNewPr {
            title: &new_pr.title,
            description: new_pr.description.as_deref(),
            source: BbBranchRef { branch: BbBranchName { name: &new_pr.head_branch } },
            destination: BbBranchRef { branch: BbBranchName { name: &new_pr.base_branch } },
        };
        let resp: BbPr = self.auth(self.http.post(url), &token).json(&body).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn get_pr(&self, owner: &str, repo: &str, number: u64) -> Result<PullRequest> {
        let token = self.token().await?;
        let url = format!("{}/repositories/{owner}/{repo}/pullrequests/{number}", self.base_api);
        let resp: BbPr = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn list_prs(&self, owner: &str, repo: &str, state: Option<PrState>) -> Result<Vec<PullRequest>> {
        let token = self.token().await?;
        let mut url = format!("{}/repositories/{owner}/{repo}/pullrequests?pagelen=50", self.base_api);
        if let Some(s) = state {
            url.push_str(&format!("&state={}", bb_state_query(s)));
        }
        let resp: BbPage<BbPr> = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.values.into_iter().map(Into::into).collect())
    }

    async fn update_pr(&self, owner: &str, repo: &str, number: u64, update: PullRequestUpdate) -> Result<PullRequest> {
        let token = self.token().await?;
        let url = format!("{}/repositories/{owner}/{repo}/pullrequests/{number}", self.base_api);
        let body = BbUpdatePr { title: update.title.as_deref(), description: update.description.as_deref() };
        let resp: BbPr = self.auth(self.http.put(url), &token).json(&body).send().await?.error_for_status()?.json().await?;
        if matches!(update.state, Some(PrState::Closed)) {
            let decline_url = format!("{}/repositories/{owner}/{repo}/pullrequests/{number}/decline", self.base_api);
            self.auth(self.http.post(decline_url), &token).send().await?.error_for_status()?;
            return self.get_pr(owner, repo, number).await;
        }
        Ok(resp.into())
    }

    async fn merge_pr(&self, owner: &str, repo: &str, number: u64) -> Result<PullRequest> {
        let token = self.token().await?;
        let url = format!("{}/repositories/{owner}/{repo}/pullrequests/{number}/merge", self.base_api);
        self.auth(self.http.post(url), &token).json(&serde_json::json!({})).send().await?.error_for_status()?;
        self.get_pr(owner, repo, number).await
    }

    async fn create_release(&self, owner: &str, repo: &str, new_release: NewRelease) -> Result<Release> {
        let token = self.token().await?;
        let branch = self.get_repository(owner, repo).await?.default_branch;
        let url = format!("{}/repositories/{owner}/{repo}/refs/tags", self.base_api);
        let body = BbNewTag { name: &new_release.tag, target: BbTagTarget { hash: &branch }, message: new_release.body.as_deref() };
        let resp: BbTag = self.auth(self.http.post(url), &token).json(&body).send().await?.error_for_status()?.json().await?;
        Ok(Release {
            tag: resp.name,
            name: new_release.name,
            body: new_release.body,
            draft: new_release.draft,
            prerelease: new_release.prerelease,
            web_url: resp.links.and_then(|l| l.html).map(|h| h.href).unwrap_or_default(),
            created_at: resp.date.as_deref().map(parse_ts).unwrap_or_else(|| parse_ts("")),
        })
    }

    async fn get_release(&self, owner: &str, repo: &str, tag: &str) -> Result<Release> {
        let token = self.token().await?;
        let url = format!("{}/repositories/{owner}/{repo}/refs/tags/{tag}", self.base_api);
        let resp: BbTag = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(Release {
            tag: resp.name,
            name: None,
            body: resp.message,
            draft: false,
            prerelease: false,
            web_url: resp.links.and_then(|l| l.html).map(|h| h.href).unwrap_or_default(),
            created_at: resp.date.as_deref().map(parse_ts).unwrap_or_else(|| parse_ts("")),
        })
    }

    async fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        let token = self.token().await?;
        let url = format!("{}/repositories/{owner}/{repo}/refs/tags?pagelen=50", self.base_api);
        let resp: BbPage<BbTag> = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp
            .values
            .into_iter()
            .map(|t| Release {
                tag: t.name,
                name: None,
                body: t.message,
                draft: false,
                prerelease: false,
                web_url: t.links.and_then(|l| l.html).map(|h| h.href).unwrap_or_default(),
                created_at: t.date.as_deref().map(parse_ts).unwrap_or_else(|| parse_ts("")),
            })
            .collect())
    }

    async fn delete_release(&self, owner: &str, repo: &str, tag: &str) -> Result<()> {
        let token = self.token().await?;
        let url = format!("{}/repositories/{owner}/{repo}/refs/tags/{tag}", self.base_api);
        self.auth(self.http.delete(url), &token).send().await?.error_for_status()?;
        Ok(())
    }

    async fn create_issue(&self, owner: &str, repo: &str, new_issue: NewIssue) -> Result<Issue> {
        let token = self.token().await?;
        let url = format!("{}/repositories/{owner}/{repo}/issues", self.base_api);
        let body = BbNewIssue { title: &new_issue.title, content: new_issue.body.as_deref().map(|raw| BbContent { raw }) };
        let resp: BbIssue = self.auth(self.http.post(url), &token).json(&body).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn get_issue(&self, owner: &str, repo: &str, number: u64) -> Result<Issue> {
        let token = self.token().await?;
        let url = format!("{}/repositories/{owner}/{repo}/issues/{number}", self.base_api);
        let resp: BbIssue = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn list_issues(&self, owner: &str, repo: &str, state: Option<IssueState>) -> Result<Vec<Issue>> {
        let token = self.token().await?;
        let mut url = format!("{}/repositories/{owner}/{repo}/issues?pagelen=50", self.base_api);
        if let Some(s) = state {
            let q = if matches!(s, IssueState::Closed) { "resolved" } else { "new" };
            url.push_str(&format!("&q=state=\"{q}\""));
        }
        let resp: BbPage<BbIssue> = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.values.into_iter().map(Into::into).collect())
    }

    async fn update_issue(&self, owner: &str, repo: &str, number: u64, update: IssueUpdate) -> Result<Issue> {
        let token = self.token().await?;
        let url = format!("{}/repositories/{owner}/{repo}/issues/{number}", self.base_api);
        let body = BbUpdateIssue {
            title: update.title.as_deref(),
            content: update.body.as_deref().map(|raw| BbContent { raw }),
            state: update.state.map(|s| if matches!(s, IssueState::Closed) { "resolved" } else { "new" }),
        };
        let resp: BbIssue = self.auth(self.http.put(url), &token).json(&body).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn list_commits(&self, owner: &str, repo: &str, branch: &str) -> Result<Vec<Commit>> {
        let token = self.token().await?;
        let url = format!("{}/repositories/{owner}/{repo}/commits/{branch}?pagelen=50", self.base_api);
        let resp: BbPage<BbCommit> = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.values.into_iter().map(Into::into).collect())
    }

    async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<Commit> {
        let token = self.token().await?;
        let url = format!("{}/repositories/{owner}/{repo}/commit/{sha}", self.base_api);
        let resp: BbCommit = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp.into())
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>> {
        let token = self.token().await?;
        let default_branch = self.get_repository(owner, repo).await?.default_branch;
        let url = format!("{}/repositories/{owner}/{repo}/refs/branches?pagelen=50", self.base_api);
        let resp: BbPage<BbBranch> = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(resp
            .values
            .into_iter()
            .map(|b| Branch { is_default: b.name == default_branch, name: b.name, head_sha: b.target.hash, protected: false })
            .collect())
    }

    async fn get_branch(&self, owner: &str, repo: &str, name: &str) -> Result<Branch> {
        let token = self.token().await?;
        let default_branch = self.get_repository(owner, repo).await?.default_branch;
        let url = format!("{}/repositories/{owner}/{repo}/refs/branches/{name}", self.base_api);
        let resp: BbBranch = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(Branch { is_default: resp.name == default_branch, name: resp.name, head_sha: resp.target.hash, protected: false })
    }

    async fn validate_token(&self) -> Result<TokenInfo> {
        let token = self.token().await?;
        let url = format!("{}/user", self.base_api);
        let user: BbUser = self.auth(self.http.get(url), &token).send().await?.error_for_status()?.json().await?;
        Ok(TokenInfo { scopes: Vec::new(), user: Some(user.into()) })
    }
}

fn bb_state_query(state: PrState) -> &'static str {
    match state {
        PrState::Open => "OPEN",
        PrState::Merged => "MERGED",
        PrState::Closed => "DECLINED",
    }
}

#[derive(Debug, Deserialize)]
struct BbLink {
    href: String,
}

#[derive(Debug, Deserialize)]
struct BbLinks {
    html: Option<BbLink>,
}

#[derive(Debug, Deserialize)]
struct BbMainBranch {
    name: String,
}

#[derive(Debug, Deserialize)]
struct BbRepo {
    mainbranch: Option<BbMainBranch>,
    links: BbLinks,
}

#[derive(Debug, Deserialize)]
struct BbPage<T> {
    values: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct BbUser {
    #[serde(default)]
    uuid: Option<String>,
    display_name: String,
    #[serde(default)]
    nickname: Option<String>,
    links: Option<BbUserLinks>,
}

#[derive(Debug, Deserialize)]
struct BbUserLinks {
    html: Option<BbLink>,
    avatar: Option<BbLink>,
}

impl From<BbUser> for User {
    fn from(u: BbUser) -> Self {
        User {
            id: u.uuid.unwrap_or_else(|| u.display_name.clone()),
            username: u.nickname,
            name: Some(u.display_name),
            web_url: u.links.as_ref().and_then(|l| l.html.as_ref()).map(|l| l.href.clone()),
            avatar_url: u.links.as_ref().and_then(|l| l.avatar.as_ref()).map(|l| l.href.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
struct BbBranchName<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct BbBranchRef<'a> {
    branch: BbBranchName<'a>,
}

#[derive(Debug, Serialize)]
struct BbNewPr<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    source: BbBranchRef<'a>,
    destination: BbBranchRef<'a>,
}

#[derive(Debug, Serialize)]
struct BbUpdatePr<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct BbPr {
    id: u64,
    title: String,
    description: Option<String>,
    state: String,
    author: BbUser,
    source: BbPrEndpoint,
    destination: BbPrEndpoint,
    links: BbLinks,
    created_on: String,
    updated_on: String,
}

#[derive(Debug, Deserialize)]
struct BbPrEndpoint {
    branch: BbMainBranch,
}

impl From<BbPr> for PullRequest {
    fn from(p: BbPr) -> Self {
        let state = match p.state.as_str() {
            "MERGED" => PrState::Merged,
            "DECLINED" | "SUPERSEDED" => PrState::Closed,
            _ => PrState::Open,
        };
        PullRequest {
            number: p.id,
            title: p.title,
            description: p.description,
            state,
            draft: false,
            author: p.author.into(),
            base_branch: p.destination.branch.name,
            head_branch: p.source.branch.name,
            web_url: p.links.html.map(|l| l.href).unwrap_or_default(),
            created_at: parse_ts(&p.created_on),
            updated_at: parse_ts(&p.updated_on),
        }
    }
}

#[derive(Debug, Serialize)]
struct BbTagTarget<'a> {
    hash: &'a str,
}

#[derive(Debug, Serialize)]
struct BbNewTag<'a> {
    name: &'a str,
    target: BbTagTarget<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct BbTag {
    name: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    date: Option<String>,
    links: Option<BbLinks>,
}

#[derive(Debug, Serialize)]
struct BbContent<'a> {
    raw: &'a str,
}

#[derive(Debug, Serialize)]
struct BbNewIssue<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<BbContent<'a>>,
}

#[derive(Debug, Serialize)]
struct BbUpdateIssue<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<BbContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct BbIssueContent {
    raw: String,
}

#[derive(Debug, Deserialize)]
struct BbIssue {
    id: u64,
    title: String,
    content: Option<BbIssueContent>,
    state: String,
    reporter: Option<BbUser>,
    links: BbLinks,
    created_on: String,
    updated_on: String,
}

impl From<BbIssue> for Issue {
    fn from(i: BbIssue) -> Self {
        Issue {
            number: i.id,
            title: i.title,
            body: i.content.map(|c| c.raw),
            state: if matches!(i.state.as_str(), "resolved" | "closed" | "invalid" | "duplicate" | "wontfix") {
                IssueState::Closed
            } else {
                IssueState::Open
            },
            author: i.reporter.map(Into::into).unwrap_or(User { id: String::new(), username: None, name: None, web_url: None, avatar_url: None }),
            web_url: i.links.html.map(|l| l.href).unwrap_or_default(),
            created_at: parse_ts(&i.created_on),
            updated_at: parse_ts(&i.updated_on),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BbCommitSummary {
    raw: String,
}

#[derive(Debug, Deserialize)]
struct BbCommitAuthor {
    #[serde(default)]
    user: Option<BbUser>,
    raw: String,
}

#[derive(Debug, Deserialize)]
struct BbCommit {
    hash: String,
    message: Option<String>,
    summary: Option<BbCommitSummary>,
    author: Option<BbCommitAuthor>,
    date: Option<String>,
    links: Option<BbLinks>,
}

impl From<BbCommit> for Commit {
    fn from(c: BbCommit) -> Self {
        let message = c.message.or_else(|| c.summary.map(|s| s.raw)).unwrap_or_default();
        let author_name = c.author.map(|a| a.user.map(|u| u.display_name).unwrap_or(a.raw));
        Commit { sha: c.hash, message, author_name, authored_at: c.date.as_deref().map(parse_ts), web_url: c.links.and_then(|l| l.html).map(|l| l.href) }
    }
}

#[derive(Debug, Deserialize)]
struct BbBranchTarget {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct BbBranch {
    name: String,
    target: BbBranchTarget,
}
