use crate::cli::output::OutputMode;
use crate::cli::{ai, repo};
use anyhow::Result;
use colored::Colorize;
use cv_vector::SearchFilter;

#[allow(clippy::too_many_arguments)]
pub async fn run(query: String, limit: u64, min_score: f32, language: Option<String>, file: Option<String>, mode: OutputMode) -> Result<()> {
    let root = repo::require_initialized_repo()?;
    let profiles = ai::build_llm_profiles()?;
    let vector = ai::build_vector_store(&root, profiles)?;

    let filter = match (language, file) {
        (Some(l), Some(f)) => Some(SearchFilter::And(vec![SearchFilter::language(l), SearchFilter::file(f)])),
        (Some(l), None) => Some(SearchFilter::language(l)),
        (None, Some(f)) => Some(SearchFilter::file(f)),
        (None, None) => None,
    };

    let mut code_hits = vector.search_code(&query, limit, min_score, filter.clone()).await?;
    let doc_hits = vector.search_documents(&query, limit, min_score, filter).await?;
    code_hits.extend(doc_hits);
    code_hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    code_hits.truncate(limit as usize);

    mode.emit(&code_hits, || {
        if code_hits.is_empty() {
            println!("No results.");
            return;
        }
        println!("{:>5} | {:<30} | {}", "score", "file", "symbol");
        println!("{}", "-".repeat(70));
        for hit in &code_hits {
            let file = hit.payload.get("file").and_then(|v| v.as_str()).unwrap_or("?");
            let symbol = hit.payload.get("symbol_name").and_then(|v| v.as_str()).unwrap_or(hit.payload.get("path").and_then(|v| v.as_str()).unwrap_or("?"));
            let fallback = if hit.used_fallback { " (local cache)".dimmed().to_string() } else { String::new() };
            println!("{:>5.2} | {:<30} | {}{}", hit.score, file, symbol, fallback);
        }
    });

    Ok(())
}
