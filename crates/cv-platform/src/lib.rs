//! Platform adapters (§4.8): a single `PlatformAdapter` trait implemented
//! once per git host, so the rest of the crate never branches on which one
//! it's talking to.

mod adapter;
mod bitbucket;
mod errors;
mod github;
mod gitlab;
mod types;

pub use adapter::{create_platform_adapter, detect_platform, PlatformAdapter, PlatformConfig};
pub use bitbucket::BitbucketAdapter;
pub use errors::{PlatformError, PlatformErrorKind, Result};
pub use github::GitHubAdapter;
pub use gitlab::GitLabAdapter;
pub use types::{
    parse_ts, Branch, Commit, Issue, IssueState, IssueUpdate, NewIssue, NewPullRequest, NewRelease,
    PlatformKind, PrState, PullRequest, PullRequestUpdate, Release, Repository, TokenInfo, User,
};
