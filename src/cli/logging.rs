//! Global `tracing` subscriber installation (§ Logging). Level via
//! `CV_LOG_LEVEL` (falling back to `--verbose`/`--quiet`), format switchable
//! to JSON via `CV_LOG_JSON=1`.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = std::env::var("CV_LOG_LEVEL")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));

    let json = std::env::var("CV_LOG_JSON").map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr);

    if json {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}

/// Appends a sanitized line to `<repo>/.cv/error.log`. Best-effort: a
/// logging failure must never mask the original error.
pub fn log_to_error_file(repo_root: &std::path::Path, message: &str) {
    let sanitized = cv_core::sanitize_log_line(message);
    let path = repo_root.join(".cv").join("error.log");
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let line = format!("[{}] {sanitized}\n", chrono::Utc::now().to_rfc3339());
    if let Ok(mut f) = std::fs::OpenOptions::new().create(true).append(true).open(&path) {
        use std::io::Write;
        let _ = f.write_all(line.as_bytes());
    }
}
