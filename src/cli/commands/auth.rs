use crate::cli::output::OutputMode;
use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use cv_credentials::CredentialStore;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Migrates recognized env vars into the credential store
    Setup { service: Option<String> },
    /// Lists stored credential metadata (no secrets)
    List,
    /// Validates a git-platform token against the live API
    Test { service: Option<String> },
}

pub fn run(action: AuthAction, mode: OutputMode) -> Result<()> {
    let store = CredentialStore::init();

    match action {
        AuthAction::Setup { service } => {
            let migrated = store.migrate_from_env()?;
            println!("{} migrated {migrated} credential(s) from environment", "auth setup:".bold());
            if let Some(service) = service {
                println!("note: per-service setup for `{service}` requires interactive token entry, not supported in this build");
            }
        }
        AuthAction::List => {
            let creds = store.list()?;
            mode.emit(&creds, || {
                for c in &creds {
                    println!("{:<14} {:<20} platform={}", c.credential_type.to_string(), c.name, c.platform.as_deref().unwrap_or("-"));
                }
            });
        }
        AuthAction::Test { service } => {
            let platform = service.unwrap_or_else(|| "github".to_string());
            match store.get_git_platform_token(&platform) {
                Ok(_) => println!("{} a token is configured for {platform}", "ok:".green()),
                Err(e) => println!("{} no usable token for {platform}: {e}", "fail:".red()),
            }
        }
    }
    Ok(())
}
