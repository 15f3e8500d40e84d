use crate::cli::config;
use crate::cli::output::OutputMode;
use crate::cli::repo;
use anyhow::Result;
use clap::Subcommand;
use cv_core::CvError;
use serde_json::{json, Value};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Prints a single key's value
    Get { key: String },
    /// Sets a key to a JSON-or-string value
    Set { key: String, value: String },
    /// Lists the whole repo config
    List,
    /// Restores built-in defaults
    Reset,
    /// Opens the config file in `$EDITOR`
    Edit,
    /// Prints the config file's path
    Path,
    /// Shows/edits `privilege.*` keys
    Privilege {
        key: Option<String>,
        value: Option<String>,
    },
    /// Writes `$HOME/.cv-git/config.json` with built-in defaults
    GlobalInit,
}

pub fn run(action: ConfigAction, mode: OutputMode) -> Result<()> {
    match action {
        ConfigAction::GlobalInit => {
            let path = config::global_config_path();
            config::save(&path, &json!({}))?;
            println!("wrote {}", path.display());
            return Ok(());
        }
        ConfigAction::Path => {
            let root = repo::require_initialized_repo()?;
            println!("{}", config::repo_config_path(&root).display());
            return Ok(());
        }
        _ => {}
    }

    let root = repo::require_initialized_repo()?;
    let path = config::repo_config_path(&root);
    let mut cfg = config::load(&path)?;

    match action {
        ConfigAction::Get { key } => {
            let value = config::get_path(&cfg, &key).cloned().unwrap_or(Value::Null);
            mode.emit(&value, || println!("{value}"));
        }
        ConfigAction::Set { key, value } => {
            let parsed = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
            config::set_path(&mut cfg, &key, parsed);
            config::save(&path, &cfg)?;
            println!("set {key}");
        }
        ConfigAction::List => {
            mode.emit(&cfg, || println!("{}", serde_json::to_string_pretty(&cfg).unwrap_or_default()));
        }
        ConfigAction::Reset => {
            config::save(&path, &json!({}))?;
            println!("reset config to defaults");
        }
        ConfigAction::Edit => {
            let editor = std::env::var("EDITOR").map_err(|_| CvError::InvalidInput("$EDITOR not set".into()))?;
            std::process::Command::new(editor).arg(&path).status()?;
        }
        ConfigAction::Privilege { key, value } => match (key, value) {
            (Some(k), Some(v)) => {
                let parsed = serde_json::from_str::<Value>(&v).unwrap_or(Value::String(v));
                config::set_path(&mut cfg, &format!("privilege.{k}"), parsed);
                config::save(&path, &cfg)?;
                println!("set privilege.{k}");
            }
            _ => {
                let privilege = config::get_path(&cfg, "privilege").cloned().unwrap_or(Value::Null);
                mode.emit(&privilege, || println!("{}", serde_json::to_string_pretty(&privilege).unwrap_or_default()));
            }
        },
        ConfigAction::GlobalInit | ConfigAction::Path => unreachable!("handled above"),
    }
    Ok(())
}
