//! Bottom-up hierarchical summarization (§4.6): symbol -> file -> directory
//! -> repo, each level's content hash gating whether it is regenerated.

use crate::config::SummaryConfig;
use crate::errors::Result;
use crate::generate::{self, extractive_aggregate_summary, extractive_file_summary, extractive_symbol_summary};
use crate::keywords;
use cv_ai::LlmServiceProfiles;
use cv_core::ids::{hash_children, hash_content};
use cv_core::model::{HierarchicalSummaryPayload, ParsedFile, SummaryLevel, SymbolNode};
use cv_core::{Clock, SystemClock};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument};

const SYMBOL_CONCURRENCY: usize = 4;

/// Produces [`HierarchicalSummaryPayload`] records for an entire repo snapshot.
///
/// Stateless across calls: the caller supplies the previous run's summaries
/// (keyed by id) so content-hash-unchanged nodes can be skipped, and gets
/// back every current summary, symbol through repo.
pub struct HierarchicalSummarizer {
    profiles: Option<Arc<LlmServiceProfiles>>,
    clock: Box<dyn Clock>,
    config: SummaryConfig,
}

impl HierarchicalSummarizer {
    pub fn new(profiles: Option<Arc<LlmServiceProfiles>>, config: SummaryConfig) -> Self {
        Self { profiles, clock: Box::new(SystemClock), config }
    }

    /// Runs the full bottom-up pass over `files`, returning every level's
    /// summaries. `repo_name` becomes the repo-level record's path.
    #[instrument(skip(self, files, cached))]
    pub async fn summarize_repo(
        &self,
        files: &[ParsedFile],
        repo_name: &str,
        cached: &HashMap<String, HierarchicalSummaryPayload>,
    ) -> Result<Vec<HierarchicalSummaryPayload>> {
        let mut out = Vec::new();

        let symbol_summaries = self.summarize_all_symbols(files, cached).await?;
        let mut symbols_by_file: BTreeMap<&str, Vec<&HierarchicalSummaryPayload>> = BTreeMap::new();
        for s in &symbol_summaries {
            symbols_by_file.entry(s.path.as_str()).or_default().push(s);
        }

        let mut file_summaries: BTreeMap<String, HierarchicalSummaryPayload> = BTreeMap::new();
        for file in files {
            let owned: Vec<HierarchicalSummaryPayload> =
                symbols_by_file.get(file.path.as_str()).map(|v| v.iter().map(|s| (**s).clone()).collect()).unwrap_or_default();
            let summary = self.summarize_file(file, &owned, cached.get(&file.path)).await?;
            file_summaries.insert(file.path.clone(), summary);
        }

        let directories = directory_tree(files.iter().map(|f| f.path.as_str()));
        let mut directory_summaries: BTreeMap<String, HierarchicalSummaryPayload> = BTreeMap::new();
        for dir in directories {
            let mut children: Vec<HierarchicalSummaryPayload> = Vec::new();
            for path in &dir.child_files {
                if let Some(f) = file_summaries.get(path) {
                    children.push(f.clone());
                }
            }
            for path in &dir.child_dirs {
                if let Some(d) = directory_summaries.get(path) {
                    children.push(d.clone());
                }
            }
            let summary = self.summarize_directory(&dir.path, &children, cached.get(&dir.path)).await?;
            directory_summaries.insert(dir.path.clone(), summary);
        }

        let mut repo_children: Vec<HierarchicalSummaryPayload> = Vec::new();
        for file in files {
            if parent_dir(&file.path).is_none() {
                if let Some(f) = file_summaries.get(&file.path) {
                    repo_children.push(f.clone());
                }
            }
        }
        for (path, summary) in &directory_summaries {
            if parent_dir(path).is_none() {
                repo_children.push(summary.clone());
            }
        }
        let repo_id = format!("repo:{repo_name}");
        let repo_summary = self.summarize_aggregate(&repo_id, repo_name, None, &repo_children, cached.get(&repo_id), SummaryLevel::Repo).await?;

        out.extend(symbol_summaries);
        out.extend(file_summaries.into_values());
        out.extend(directory_summaries.into_values());
        out.push(repo_summary);
        Ok(out)
    }

    /// Embeds and upserts every summary into its level's collection. Groups
    /// by level so each `VectorStore::embed` batch stays within one
    /// collection, mirroring the sync engine's per-collection embed step.
    #[instrument(skip(self, vector, payloads))]
    pub async fn persist(&self, vector: &cv_vector::VectorStore, payloads: &[HierarchicalSummaryPayload]) -> Result<()> {
        let mut groups: BTreeMap<u8, Vec<&HierarchicalSummaryPayload>> = BTreeMap::new();
        for p in payloads {
            groups.entry(p.level as u8).or_default().push(p);
        }

        for (level_tag, group) in groups {
            let texts: Vec<String> = group.iter().map(|p| p.summary.clone()).collect();
            let vectors = vector.embed(&texts).await?;
            let records: Vec<cv_vector::VectorRecord> = group
                .into_iter()
                .zip(vectors)
                .map(|(p, v)| cv_vector::VectorRecord {
                    id: p.id.clone(),
                    vector: v,
                    payload: cv_core::model::VectorPayload::Summary { summary: p.clone(), extra: Default::default() },
                })
                .collect();
            vector.upsert_batch(cv_vector::Collection::for_summary_level(level_from_tag(level_tag)), records).await?;
        }
        Ok(())
    }

    async fn summarize_all_symbols(&self, files: &[ParsedFile], cached: &HashMap<String, HierarchicalSummaryPayload>) -> Result<Vec<HierarchicalSummaryPayload>> {
        let work: Vec<(&ParsedFile, &SymbolNode)> = files.iter().flat_map(|f| f.symbols.iter().map(move |s| (f, s))).collect();
        let results: Vec<Result<HierarchicalSummaryPayload>> = stream::iter(work)
            .map(|(file, symbol)| async move { self.summarize_symbol(file, symbol, cached.get(&symbol.qualified_name)).await })
            .buffer_unordered(SYMBOL_CONCURRENCY)
            .collect()
            .await;
        results.into_iter().collect()
    }

    /// Reuses `cached` verbatim when its content hash matches and
    /// `skip_unchanged` is enabled; otherwise regenerates via the fast
    /// profile (or the extractive fallback when none is configured).
    async fn summarize_symbol(&self, file: &ParsedFile, symbol: &SymbolNode, cached: Option<&HierarchicalSummaryPayload>) -> Result<HierarchicalSummaryPayload> {
        let body = symbol_body(&file.content, symbol);
        let basis = format!("{}\n{}\n{}", symbol.signature.as_deref().unwrap_or(""), symbol.docstring.as_deref().unwrap_or(""), body);
        let content_hash = hash_content(basis.as_bytes());

        if self.config.skip_unchanged {
            if let Some(c) = cached {
                if c.content_hash == content_hash {
                    debug!(symbol = %symbol.qualified_name, "summary unchanged, skipping regeneration");
                    return Ok(c.clone());
                }
            }
        }

        let prompt = format!(
            "Summarize this {:?} named `{}` in one or two sentences.\nSignature: {}\nBody:\n{}",
            symbol.kind,
            symbol.name,
            symbol.signature.as_deref().unwrap_or("(none)"),
            body
        );
        let docstring = symbol.docstring.clone();
        let name = symbol.name.clone();
        let file_path = symbol.file.clone();
        let summary = generate::generate(self.profiles.as_ref(), &prompt, true, move || extractive_symbol_summary(&name, &file_path, docstring.as_deref())).await?;

        Ok(HierarchicalSummaryPayload {
            id: symbol.qualified_name.clone(),
            level: SummaryLevel::Symbol,
            path: symbol.file.clone(),
            parent: Some(symbol.file.clone()),
            children: Vec::new(),
            summary,
            keywords: keywords::derive(&[symbol.name.clone()]),
            content_hash,
            symbol_kind: Some(symbol.kind),
            symbol_count: None,
            file_count: None,
            languages: Vec::new(),
            last_modified: self.clock.now(),
        })
    }

    async fn summarize_file(&self, file: &ParsedFile, symbols: &[HierarchicalSummaryPayload], cached: Option<&HierarchicalSummaryPayload>) -> Result<HierarchicalSummaryPayload> {
        let content_hash = hash_content(file.content.as_bytes());
        if self.config.skip_unchanged {
            if let Some(c) = cached {
                if c.content_hash == content_hash {
                    debug!(path = %file.path, "file summary unchanged, skipping regeneration");
                    return Ok(c.clone());
                }
            }
        }

        let capped: Vec<&HierarchicalSummaryPayload> = symbols.iter().take(self.config.max_symbols_per_file).collect();
        let prompt = format!(
            "Summarize the file `{}` ({}) in one or two sentences, given its members:\n{}",
            file.path,
            file.language,
            capped.iter().map(|s| format!("- {}", s.summary)).collect::<Vec<_>>().join("\n")
        );
        let names: Vec<String> = file.symbols.iter().map(|s| s.name.clone()).collect();
        let path = file.path.clone();
        let keywords = keywords::derive(&names);
        let fallback_names = names.clone();
        let summary = generate::generate(self.profiles.as_ref(), &prompt, true, move || extractive_file_summary(&path, &fallback_names)).await?;

        Ok(HierarchicalSummaryPayload {
            id: file.path.clone(),
            level: SummaryLevel::File,
            path: file.path.clone(),
            parent: parent_dir(&file.path),
            children: symbols.iter().map(|s| s.id.clone()).collect(),
            summary,
            keywords,
            content_hash,
            symbol_kind: None,
            symbol_count: Some(file.symbols.len()),
            file_count: None,
            languages: vec![file.language.clone()],
            last_modified: self.clock.now(),
        })
    }

    async fn summarize_directory(&self, path: &str, children: &[HierarchicalSummaryPayload], cached: Option<&HierarchicalSummaryPayload>) -> Result<HierarchicalSummaryPayload> {
        self.summarize_aggregate(path, path, parent_dir(path), children, cached, SummaryLevel::Directory).await
    }

    async fn summarize_aggregate(
        &self,
        id: &str,
        display_path: &str,
        parent: Option<String>,
        children: &[HierarchicalSummaryPayload],
        cached: Option<&HierarchicalSummaryPayload>,
        level: SummaryLevel,
    ) -> Result<HierarchicalSummaryPayload> {
        let content_hash = hash_children(children.iter().map(|c| c.content_hash.clone()).collect());
        if self.config.skip_unchanged {
            if let Some(c) = cached {
                if c.content_hash == content_hash {
                    debug!(path = display_path, "aggregate summary unchanged, skipping regeneration");
                    return Ok(c.clone());
                }
            }
        }

        let names: Vec<String> = children.iter().map(|c| child_display_name(c)).collect();
        let prompt = format!(
            "Summarize `{display_path}` in one or two sentences, given its contents:\n{}",
            names.iter().map(|n| format!("- {n}")).collect::<Vec<_>>().join("\n")
        );
        let fallback_path = display_path.to_string();
        let fallback_names = names.clone();
        let summary = generate::generate(self.profiles.as_ref(), &prompt, false, move || extractive_aggregate_summary(&fallback_path, &fallback_names)).await?;

        let languages: BTreeSet<String> = children.iter().flat_map(|c| c.languages.iter().cloned()).collect();
        let file_count = children.iter().map(|c| match c.level {
            SummaryLevel::File => 1,
            _ => c.file_count.unwrap_or(0),
        }).sum();
        let symbol_count = children.iter().map(|c| c.symbol_count.unwrap_or(0)).sum();

        Ok(HierarchicalSummaryPayload {
            id: id.to_string(),
            level,
            path: display_path.to_string(),
            parent,
            children: children.iter().map(|c| c.id.clone()).collect(),
            summary,
            keywords: keywords::derive(&names),
            content_hash,
            symbol_kind: None,
            symbol_count: Some(symbol_count),
            file_count: Some(file_count),
            languages: languages.into_iter().collect(),
            last_modified: self.clock.now(),
        })
    }
}

fn level_from_tag(tag: u8) -> SummaryLevel {
    match tag {
        1 => SummaryLevel::Symbol,
        2 => SummaryLevel::File,
        3 => SummaryLevel::Directory,
        _ => SummaryLevel::Repo,
    }
}

fn child_display_name(c: &HierarchicalSummaryPayload) -> String {
    match c.level {
        SummaryLevel::Symbol => c.id.rsplit(':').next().unwrap_or(&c.id).to_string(),
        _ => c.path.clone(),
    }
}

fn symbol_body(content: &str, symbol: &SymbolNode) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = symbol.start_line.saturating_sub(1).min(lines.len());
    let end = symbol.end_line.min(lines.len());
    if start >= end {
        return String::new();
    }
    lines[start..end].join("\n")
}

/// `None` means "attaches directly to the repo", matching files and
/// directories that live at the repo root.
fn parent_dir(path: &str) -> Option<String> {
    let parent = std::path::Path::new(path).parent()?;
    let s = parent.to_string_lossy().replace('\\', "/");
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

struct DirNode {
    path: String,
    child_files: Vec<String>,
    child_dirs: Vec<String>,
}

/// Builds the set of directories implied by `paths`, each with its direct
/// file/directory children, ordered deepest-first so a bottom-up fold never
/// looks up a child before it has been computed.
fn directory_tree<'a>(paths: impl Iterator<Item = &'a str>) -> Vec<DirNode> {
    let mut dirs: BTreeSet<String> = BTreeSet::new();
    let mut files_by_dir: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for path in paths {
        match parent_dir(path) {
            Some(dir) => {
                let mut cur = Some(dir.clone());
                while let Some(d) = cur {
                    dirs.insert(d.clone());
                    cur = parent_dir(&d);
                }
                files_by_dir.entry(dir).or_default().push(path.to_string());
            }
            None => {}
        }
    }

    let mut dirs_by_dir: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for d in &dirs {
        if let Some(parent) = parent_dir(d) {
            dirs_by_dir.entry(parent).or_default().push(d.clone());
        }
    }

    let mut ordered: Vec<String> = dirs.into_iter().collect();
    ordered.sort_by_key(|d| std::cmp::Reverse(d.matches('/').count()));

    ordered
        .into_iter()
        .map(|path| {
            let child_files = files_by_dir.remove(&path).unwrap_or_default();
            let child_dirs = dirs_by_dir.remove(&path).unwrap_or_default();
            DirNode { path, child_files, child_dirs }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_dir_is_none_at_repo_root() {
        assert_eq!(parent_dir("main.rs"), None);
        assert_eq!(parent_dir("src/main.rs"), Some("src".to_string()));
        assert_eq!(parent_dir("src/utils/io.rs"), Some("src/utils".to_string()));
    }

    #[test]
    fn directory_tree_orders_deepest_first() {
        let paths = vec!["src/utils/io.rs", "src/main.rs", "README.md"];
        let tree = directory_tree(paths.into_iter());
        let names: Vec<&str> = tree.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(names, vec!["src/utils", "src"]);
        assert_eq!(tree[1].child_dirs, vec!["src/utils".to_string()]);
        assert_eq!(tree[1].child_files, vec!["src/main.rs".to_string()]);
    }

    #[test]
    fn symbol_body_slices_inclusive_line_range() {
        let content = "a\nb\nc\nd\n";
        let symbol = SymbolNode {
            qualified_name: "f.rs:s".into(),
            name: "s".into(),
            kind: cv_core::model::SymbolKind::Function,
            file: "f.rs".into(),
            start_line: 2,
            end_line: 3,
            signature: None,
            docstring: None,
            return_type: None,
            parameters: Vec::new(),
            visibility: cv_core::model::Visibility::Public,
            is_async: false,
            is_static: false,
            complexity: 1,
            calls: Vec::new(),
            created_at: cv_core::time::Timestamp::from_millis(0),
            updated_at: cv_core::time::Timestamp::from_millis(0),
        };
        assert_eq!(symbol_body(content, &symbol), "b\nc");
    }
}
