//! `cv bugreport`: writes a diagnostic dump. Clipboard copy and
//! open-an-issue integration are out of scope (§ Non-goals) and are
//! rejected explicitly rather than silently ignored.

use crate::cli::repo;
use anyhow::Result;
use cv_core::CvError;
use serde_json::json;

#[allow(clippy::too_many_arguments)]
pub fn run(output: Option<std::path::PathBuf>, copy: bool, open_issue: bool, message: Option<String>, error: Option<String>) -> Result<()> {
    if copy || open_issue {
        return Err(CvError::Internal("clipboard/issue integration not implemented in this build".into()).into());
    }

    let root = repo::find_repo_root(&std::env::current_dir()?);
    let sync_report = root
        .as_ref()
        .and_then(|r| std::fs::read_to_string(r.join(".cv").join("sync-report.json")).ok())
        .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).ok());

    let report = json!({
        "cv_version": env!("CARGO_PKG_VERSION"),
        "os": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
        "repo_root": root,
        "message": message,
        "error": error,
        "last_sync_report": sync_report,
    });

    let output = output.unwrap_or_else(|| std::env::temp_dir().join("cv-bugreport.json"));
    std::fs::write(&output, serde_json::to_string_pretty(&report)?)?;
    println!("wrote {}", output.display());
    Ok(())
}
