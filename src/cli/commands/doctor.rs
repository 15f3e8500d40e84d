//! `cv doctor`: repo/credential/config health checks plus an accurate
//! support matrix for commands whose substance this build doesn't
//! implement (§ CLI surface).

use crate::cli::output::OutputMode;
use crate::cli::{config, repo};
use anyhow::Result;
use colored::Colorize;
use cv_credentials::CredentialStore;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
struct CheckResult {
    name: String,
    ok: bool,
    detail: String,
}

#[derive(Serialize)]
struct DoctorReport {
    checks: Vec<CheckResult>,
    unimplemented_commands: Vec<&'static str>,
}

pub const UNIMPLEMENTED_COMMANDS: &[&str] = &[
    "deps", "commit", "push", "tag", "stash", "remote", "fetch", "merge", "checkout", "switch", "add", "absorb",
    "stack", "undo", "reflog",
];

pub fn run(fix: bool, mode: OutputMode) -> Result<()> {
    let mut checks = Vec::new();

    let root = repo::find_repo_root(&std::env::current_dir()?);
    checks.push(CheckResult {
        name: "git repository".into(),
        ok: root.is_some(),
        detail: root.as_ref().map(|r| r.display().to_string()).unwrap_or_else(|| "not inside a git repository".into()),
    });

    if let Some(root) = &root {
        let cv_dir = repo::cv_dir(root);
        let initialized = cv_dir.join("config.json").exists();
        if !initialized && fix {
            std::fs::create_dir_all(&cv_dir)?;
        }
        checks.push(CheckResult {
            name: ".cv initialized".into(),
            ok: initialized || fix,
            detail: if initialized { cv_dir.display().to_string() } else { "run `cv init`".into() },
        });

        let cfg = config::load(&config::repo_config_path(root)).unwrap_or(Value::Null);
        checks.push(CheckResult {
            name: "config.json parses".into(),
            ok: !cfg.is_null(),
            detail: if cfg.is_null() { "missing or invalid".into() } else { "ok".into() },
        });
    }

    let store = CredentialStore::init();
    checks.push(CheckResult {
        name: "credential backend".into(),
        ok: true,
        detail: format!("{:?}", store.storage_backend()),
    });

    for var in ["OLLAMA_URL", "OLLAMA_MODEL", "EMBEDDING_MODEL"] {
        let present = std::env::var(var).map(|v| !v.trim().is_empty()).unwrap_or(false);
        checks.push(CheckResult {
            name: format!("env {var}"),
            ok: present,
            detail: if present { "set".into() } else { "unset (AI features degrade to extractive/local fallback)".into() },
        });
    }

    let report = DoctorReport { checks, unimplemented_commands: UNIMPLEMENTED_COMMANDS.to_vec() };

    mode.emit(&report, || {
        for check in &report.checks {
            let mark = if check.ok { "ok".green() } else { "fail".red() };
            println!("[{mark}] {}: {}", check.name, check.detail);
        }
        println!();
        println!("{}", "commands not implemented in this build:".yellow());
        println!("  {}", report.unimplemented_commands.join(", "));
    });
    Ok(())
}
