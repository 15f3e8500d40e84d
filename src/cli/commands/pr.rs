use crate::cli::output::OutputMode;
use crate::cli::{config, git_remote, repo};
use anyhow::Result;
use clap::Subcommand;
use cv_core::CvError;
use cv_credentials::CredentialStore;
use cv_platform::{create_platform_adapter, detect_platform, NewPullRequest, PlatformConfig, PlatformKind, PrState, PullRequestUpdate};
use serde_json::Value;
use std::sync::Arc;

#[derive(Subcommand)]
pub enum PrAction {
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        base: String,
        #[arg(long)]
        head: String,
        #[arg(long)]
        draft: bool,
        #[arg(long)]
        description: Option<String>,
    },
    List {
        #[arg(long)]
        state: Option<String>,
    },
    View {
        number: u64,
    },
    Merge {
        number: u64,
    },
    Update {
        number: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
}

async fn adapter_for(root: &std::path::Path) -> Result<(Box<dyn cv_platform::PlatformAdapter>, String, String)> {
    let url = git_remote::origin_url(root).ok_or_else(|| CvError::InvalidInput("no `origin` remote configured".into()))?;
    let (owner, repo_name) = git_remote::parse_owner_repo(&url).ok_or_else(|| CvError::InvalidInput(format!("couldn't parse owner/repo from `{url}`")))?;

    let cfg = config::load(&config::repo_config_path(root))?;
    let kind = match config::get_path(&cfg, "platform.type").and_then(Value::as_str) {
        Some(s) => parse_platform_kind(s)?,
        None => detect_platform(&url).ok_or_else(|| CvError::InvalidInput("couldn't detect platform from remote; set platform.type".into()))?,
    };
    let base_api = config::get_path(&cfg, "platform.api").and_then(Value::as_str).unwrap_or_default().to_string();
    let base_api = if base_api.is_empty() { default_api_base(kind) } else { base_api };

    let credentials = Arc::new(CredentialStore::init());
    let adapter = create_platform_adapter(PlatformConfig::new(kind, base_api), credentials)?;
    Ok((adapter, owner, repo_name))
}

pub fn parse_platform_kind(s: &str) -> Result<PlatformKind> {
    match s.to_ascii_lowercase().as_str() {
        "github" => Ok(PlatformKind::GitHub),
        "gitlab" => Ok(PlatformKind::GitLab),
        "bitbucket" => Ok(PlatformKind::Bitbucket),
        other => Err(CvError::InvalidInput(format!("unknown platform `{other}`")).into()),
    }
}

fn default_api_base(kind: PlatformKind) -> String {
    match kind {
        PlatformKind::GitHub => "https://api.github.com".to_string(),
        PlatformKind::GitLab => "https://gitlab.com/api/v4".to_string(),
        PlatformKind::Bitbucket => "https://api.bitbucket.org/2.0".to_string(),
    }
}

pub async fn run(action: PrAction, mode: OutputMode) -> Result<()> {
    let root = repo::require_initialized_repo()?;
    let (adapter, owner, repo_name) = adapter_for(&root).await?;

    match action {
        PrAction::Create { title, base, head, draft, description } => {
            let pr = adapter
                .create_pr(&owner, &repo_name, NewPullRequest { title, description, base_branch: base, head_branch: head, draft })
                .await?;
            mode.emit(&pr, || println!("#{} {} ({})", pr.number, pr.title, pr.web_url));
        }
        PrAction::List { state } => {
            let state = state.map(|s| parse_pr_state(&s)).transpose()?;
            let prs = adapter.list_prs(&owner, &repo_name, state).await?;
            mode.emit(&prs, || {
                for pr in &prs {
                    println!("#{:<6} {:<8?} {}", pr.number, pr.state, pr.title);
                }
            });
        }
        PrAction::View { number } => {
            let pr = adapter.get_pr(&owner, &repo_name, number).await?;
            mode.emit(&pr, || println!("#{} {:?} {}\n{}", pr.number, pr.state, pr.title, pr.web_url));
        }
        PrAction::Merge { number } => {
            let pr = adapter.merge_pr(&owner, &repo_name, number).await?;
            mode.emit(&pr, || println!("merged #{}", pr.number));
        }
        PrAction::Update { number, title, description } => {
            let pr = adapter.update_pr(&owner, &repo_name, number, PullRequestUpdate { title, description, state: None }).await?;
            mode.emit(&pr, || println!("updated #{}", pr.number));
        }
    }
    Ok(())
}

fn parse_pr_state(s: &str) -> Result<PrState> {
    match s.to_ascii_lowercase().as_str() {
        "open" => Ok(PrState::Open),
        "merged" => Ok(PrState::Merged),
        "closed" => Ok(PrState::Closed),
        other => Err(CvError::InvalidInput(format!("unknown PR state `{other}`")).into()),
    }
}
