use crate::cli::commands::pr::parse_platform_kind;
use crate::cli::output::OutputMode;
use crate::cli::{config, git_remote, repo};
use anyhow::Result;
use clap::Subcommand;
use cv_core::CvError;
use cv_credentials::CredentialStore;
use cv_platform::{create_platform_adapter, detect_platform, NewRelease, PlatformConfig, PlatformKind};
use serde_json::Value;
use std::sync::Arc;

#[derive(Subcommand)]
pub enum ReleaseAction {
    Create {
        tag: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        draft: bool,
        #[arg(long)]
        prerelease: bool,
    },
    List,
    View {
        tag: String,
    },
    Delete {
        tag: String,
    },
    /// Publishes a draft release by re-creating it with `draft = false`.
    Publish {
        tag: String,
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
    let base_api = match kind {
        PlatformKind::GitHub => "https://api.github.com".to_string(),
        PlatformKind::GitLab => "https://gitlab.com/api/v4".to_string(),
        PlatformKind::Bitbucket => "https://api.bitbucket.org/2.0".to_string(),
    };

    let credentials = Arc::new(CredentialStore::init());
    let adapter = create_platform_adapter(PlatformConfig::new(kind, base_api), credentials)?;
    Ok((adapter, owner, repo_name))
}

pub async fn run(action: ReleaseAction, mode: OutputMode) -> Result<()> {
    let root = repo::require_initialized_repo()?;
    let (adapter, owner, repo_name) = adapter_for(&root).await?;

    match action {
        ReleaseAction::Create { tag, name, body, draft, prerelease } => {
            let release = adapter.create_release(&owner, &repo_name, NewRelease { tag, name, body, draft, prerelease }).await?;
            mode.emit(&release, || println!("{} ({})", release.tag, release.web_url));
        }
        ReleaseAction::List => {
            let releases = adapter.list_releases(&owner, &repo_name).await?;
            mode.emit(&releases, || {
                for r in &releases {
                    println!("{:<20} {}", r.tag, r.name.as_deref().unwrap_or(""));
                }
            });
        }
        ReleaseAction::View { tag } => {
            let release = adapter.get_release(&owner, &repo_name, &tag).await?;
            mode.emit(&release, || println!("{}\n{}", release.tag, release.web_url));
        }
        ReleaseAction::Delete { tag } => {
            adapter.delete_release(&owner, &repo_name, &tag).await?;
            println!("deleted {tag}");
        }
        ReleaseAction::Publish { tag } => {
            let existing = adapter.get_release(&owner, &repo_name, &tag).await?;
            adapter.delete_release(&owner, &repo_name, &tag).await?;
            let release = adapter
                .create_release(
                    &owner,
                    &repo_name,
                    NewRelease { tag: existing.tag, name: existing.name, body: existing.body, draft: false, prerelease: existing.prerelease },
                )
                .await?;
            mode.emit(&release, || println!("published {}", release.tag));
        }
    }
    Ok(())
}
