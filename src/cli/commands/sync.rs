use crate::cli::output::OutputMode;
use crate::cli::{ai, repo};
use anyhow::Result;
use colored::Colorize;
use cv_sync::{CancelToken, SyncConfig, SyncEngine, SyncMode};
use std::sync::Arc;
use tracing::instrument;

#[instrument(skip(mode))]
pub async fn run(incremental: bool, force: bool, mode: OutputMode) -> Result<()> {
    let root = repo::require_initialized_repo()?;
    let repo_id = repo::repo_id_for(&root);

    let profiles = ai::build_llm_profiles()?;
    let vector = Arc::new(ai::build_vector_store(&root, profiles)?);
    let mut engine = SyncEngine::new(root.clone(), repo_id, vector)?;

    let sync_mode = if force {
        SyncMode::Full
    } else if incremental {
        SyncMode::Incremental
    } else {
        SyncMode::Incremental
    };

    let cfg = SyncConfig { mode: sync_mode, ..SyncConfig::default() };
    let cancel = CancelToken::new();

    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    let report = engine.sync(&cfg, cancel).await?;

    mode.emit(&report, || {
        println!(
            "{} {} files added, {} modified, {} deleted, {} unchanged, {} parse warnings",
            "sync complete:".bold().green(),
            report.stats.added,
            report.stats.modified,
            report.stats.deleted,
            report.stats.unchanged,
            report.errors.len(),
        );
        for err in &report.errors {
            println!("  {} [{:?}] {}: {}", "warning:".yellow(), err.phase, err.file, err.error);
        }
    });
    Ok(())
}
