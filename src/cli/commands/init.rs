use crate::cli::config;
use crate::cli::output::OutputMode;
use crate::cli::repo;
use anyhow::{Context, Result};
use colored::Colorize;
use cv_core::CvError;
use serde_json::{json, Value};

pub fn run(path: Option<std::path::PathBuf>, mode: OutputMode) -> Result<()> {
    let cwd = path.unwrap_or(std::env::current_dir().context("failed to get current directory")?);
    let root = repo::find_repo_root(&cwd).ok_or(CvError::NotInRepo).context("`cv init` must run inside a git repository")?;

    let cv_dir = repo::cv_dir(&root);
    std::fs::create_dir_all(&cv_dir)?;
    std::fs::create_dir_all(cv_dir.join("documents"))?;
    std::fs::create_dir_all(cv_dir.join("vectors"))?;
    std::fs::create_dir_all(cv_dir.join("embeddings"))?;

    let config_path = config::repo_config_path(&root);
    let already_initialized = config_path.exists();
    if !already_initialized {
        let defaults = json!({
            "platform": { "type": Value::Null, "url": Value::Null, "api": Value::Null },
            "ai": { "provider": "ollama", "model": Value::Null, "maxTokens": Value::Null, "temperature": Value::Null },
            "graph": { "url": Value::Null, "database": Value::Null, "semantic_bridge_max_depth": 4 },
            "vector": { "url": "http://localhost:6334", "collections": Value::Null },
            "credentials": { "storage": "keychain" },
            "features": { "aiCommitMessages": false, "aiPRDescriptions": false, "aiCodeReview": false, "autoMerge": false },
            "privilege": { "mode": "auto", "allowSudo": false, "warnOnRoot": true },
            "containers": { "runtime": "docker", "rootless": false },
        });
        config::save(&config_path, &defaults)?;
    }

    mode.emit(
        &json!({ "root": root, "reinitialized": already_initialized }),
        || {
            if already_initialized {
                println!("{} existing cv repository at {}", "Reinitialized".bold(), cv_dir.display());
            } else {
                println!("{} cv repository in {}", "Initialized".bold().green(), cv_dir.display());
            }
        },
    );
    Ok(())
}
