//! The sync engine: orchestrates discovery, change detection, parsing,
//! embedding, and graph/vector upserts (§4.2).

use crate::cancel::CancelToken;
use crate::discover::{self, DiscoverFilters};
use crate::errors::{Result, SyncError};
use crate::report::{ErrorPhase, SyncFileError, SyncMode, SyncReport, SyncStats};
use crate::state::{self, ChangeKind, SyncState};
use cv_core::model::{DocumentType, ParsedDocument, ParsedFile};
use cv_core::{ids, Clock, SystemClock};
use cv_graph::GraphStore;
use cv_parsers::ParserRegistry;
use cv_vector::{Collection, VectorRecord, VectorStore};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub mode: SyncMode,
    pub filters: DiscoverFilters,
    pub parse_concurrency: usize,
    pub embed_concurrency: usize,
    pub store_concurrency: usize,
    pub embed_batch_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: SyncMode::Incremental,
            filters: DiscoverFilters::default(),
            parse_concurrency: 4,
            embed_concurrency: 2,
            store_concurrency: 4,
            embed_batch_size: 64,
        }
    }
}

enum ParseOutcome {
    Code(ParsedFile),
    Doc(ParsedDocument, Vec<cv_core::model::DocumentChunk>),
}

struct ParsedItem {
    rel_path: String,
    outcome: ParseOutcome,
}

pub struct SyncEngine {
    repo_root: PathBuf,
    repo_id: String,
    registry: ParserRegistry,
    graph: GraphStore,
    vector: Arc<VectorStore>,
    clock: Box<dyn Clock>,
}

impl SyncEngine {
    pub fn new(repo_root: PathBuf, repo_id: String, vector: Arc<VectorStore>) -> Result<Self> {
        let graph = GraphStore::load(&graph_path(&repo_root)).map_err(|e| SyncError::Io(std::io::Error::other(e.to_string())))?;
        Ok(Self {
            repo_root,
            repo_id,
            registry: ParserRegistry::new(),
            graph,
            vector,
            clock: Box::new(SystemClock),
        })
    }

    fn state_path(&self) -> PathBuf {
        self.repo_root.join(".cv").join("sync-state.json")
    }

    fn report_path(&self) -> PathBuf {
        self.repo_root.join(".cv").join("sync-report.json")
    }

    #[instrument(skip(self, cfg, cancel))]
    pub async fn sync(&mut self, cfg: &SyncConfig, cancel: CancelToken) -> Result<SyncReport> {
        let started = Instant::now();
        let mut state = match cfg.mode {
            SyncMode::Incremental => SyncState::load(&self.state_path())?,
            SyncMode::Full => SyncState::default(),
        };

        let discovered = discover::discover(&self.repo_root, &cfg.filters)?;
        let current_paths: HashSet<String> = discovered.iter().map(|f| f.rel_path.clone()).collect();

        let mut stats = SyncStats::default();
        let mut errors = Vec::new();
        let mut work = Vec::new();

        for file in &discovered {
            if cancel.is_cancelled() {
                break;
            }
            let content = match tokio::fs::read_to_string(&file.abs_path).await {
                Ok(c) => c,
                Err(e) => {
                    errors.push(SyncFileError { phase: ErrorPhase::Discover, file: file.rel_path.clone(), error: e.to_string() });
                    stats.files_failed += 1;
                    continue;
                }
            };
            let hash = ids::hash_content(content.as_bytes());
            let existing_state = match cfg.mode {
                SyncMode::Full => ChangeKind::Added,
                SyncMode::Incremental => state::classify(&state, &file.rel_path, &hash),
            };
            match existing_state {
                ChangeKind::Unchanged => stats.unchanged += 1,
                ChangeKind::Added => {
                    stats.added += 1;
                    work.push((file.clone(), content, hash));
                }
                ChangeKind::Modified => {
                    stats.modified += 1;
                    work.push((file.clone(), content, hash));
                }
            }
        }

        let deleted: Vec<String> = state::deleted_paths(&state, &current_paths)
            .into_iter()
            .map(String::from)
            .collect();

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        // --- Parse stage (bounded worker pool) ---------------------------
        let registry = self.registry.clone();
        let parsed: Vec<std::result::Result<ParsedItem, SyncFileError>> = stream::iter(work.into_iter())
            .map(|(file, content, hash)| {
                let registry = registry.clone();
                async move {
                    let rel_path = file.rel_path.clone();
                    let is_markdown = file.language.as_deref() == Some("markdown");
                    let joined = tokio::task::spawn_blocking(move || {
                        if is_markdown {
                            let doc = cv_parsers::markdown::parse_document(&rel_path, &content);
                            let chunks = cv_parsers::markdown::chunk_document(&doc);
                            (rel_path, ParseOutcome::Doc(doc, chunks))
                        } else {
                            let pf = registry.parse_file(&rel_path, &content);
                            (rel_path, ParseOutcome::Code(pf))
                        }
                    })
                    .await;
                    (joined, hash)
                }
            })
            .buffer_unordered(cfg.parse_concurrency.max(1))
            .map(|(joined, hash)| match joined {
                Ok((rel_path, outcome)) => Ok((ParsedItem { rel_path: rel_path.clone(), outcome }, hash)),
                Err(e) => Err((e.to_string(), hash)),
            })
            .map(|res| match res {
                Ok((item, hash)) => {
                    state.hashes.insert(item.rel_path.clone(), hash);
                    Ok(item)
                }
                Err((err, _)) => Err(SyncFileError { phase: ErrorPhase::Parse, file: String::new(), error: err }),
            })
            .collect()
            .await;

        let mut parsed_items = Vec::new();
        for r in parsed {
            match r {
                Ok(item) => {
                    stats.files_processed += 1;
                    parsed_items.push(item);
                }
                Err(e) => {
                    stats.files_failed += 1;
                    errors.push(e);
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        // --- Embed + store stage ------------------------------------------
        let (records_code, records_docs) = collect_chunks(&parsed_items);
        self.embed_and_store(&records_code, Collection::CodeChunks, cfg, &mut errors).await;
        self.embed_and_store(&records_docs, Collection::DocumentChunks, cfg, &mut errors).await;

        // --- Graph upserts (single-writer, sequential) --------------------
        for item in &parsed_items {
            self.apply_to_graph(item);
        }

        // --- Deletions / tombstones ----------------------------------------
        for path in &deleted {
            stats.deleted += 1;
            if discover::language_for_extension(Path::new(path)).as_deref() == Some("markdown") {
                // Archived documents stay logically present: upsert a status
                // flag on the graph node instead of removing it.
                self.graph.set_document_status(&self.repo_id, path, "archived");
                debug!(path, "marked archived document path");
            } else {
                self.graph.remove_path(&self.repo_id, path);
                if let Err(e) = self.vector.delete_by_path(Collection::CodeChunks, path).await {
                    warn!(path, %e, "vector tombstone failed");
                }
            }
            state.hashes.remove(path);
        }

        state.save(&self.state_path())?;
        self.graph
            .save(&graph_path(&self.repo_root))
            .map_err(|e| SyncError::Io(std::io::Error::other(e.to_string())))?;

        let report = SyncReport::finalize(
            cfg.mode,
            self.clock.now(),
            started.elapsed().as_millis() as u64,
            stats,
            errors,
        );
        let report_bytes = serde_json::to_vec_pretty(&report)?;
        if let Some(parent) = self.report_path().parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(self.report_path(), report_bytes).await?;

        Ok(report)
    }

    fn apply_to_graph(&mut self, item: &ParsedItem) {
        match &item.outcome {
            ParseOutcome::Code(pf) => {
                self.graph.upsert_file_node(&self.repo_id, &pf.path);
                for symbol in &pf.symbols {
                    self.graph.upsert_symbol_node(&self.repo_id, symbol);
                }
                for symbol in &pf.symbols {
                    for call in &symbol.calls {
                        self.graph
                            .create_calls_edge(&self.repo_id, &symbol.qualified_name, &call.callee, call.is_conditional, call.line);
                    }
                }
                for import in &pf.imports {
                    let target = import.package_name.clone().unwrap_or_else(|| import.source.clone());
                    self.graph.create_imports_edge(&self.repo_id, &pf.path, &target, import.line);
                }
            }
            ParseOutcome::Doc(doc, _chunks) => {
                self.graph.upsert_document_node(&self.repo_id, &doc.path);
                for link in &doc.links {
                    if link.is_code_ref {
                        self.graph.create_describes_edge(&self.repo_id, &doc.path, &link.target);
                    } else if link.is_internal {
                        self.graph.create_references_doc_edge(&self.repo_id, &doc.path, &link.target);
                    }
                }
                for related in &doc.frontmatter.relates_to {
                    self.graph.create_references_doc_edge(&self.repo_id, &doc.path, related);
                }
                let _ = matches!(doc.inferred_type, DocumentType::Unknown);
            }
        }
    }

    async fn embed_and_store(&self, items: &[(String, String, serde_json::Value)], collection: Collection, cfg: &SyncConfig, errors: &mut Vec<SyncFileError>) {
        if items.is_empty() {
            return;
        }
        let batches: Vec<&[(String, String, serde_json::Value)]> = items.chunks(cfg.embed_batch_size.max(1)).collect();

        let vector = &self.vector;
        let results: Vec<Option<SyncFileError>> = stream::iter(batches.into_iter())
            .map(|batch| async move {
                let texts: Vec<String> = batch.iter().map(|(_, t, _)| t.clone()).collect();
                match embed_with_retry(vector, &texts).await {
                    Ok(vectors) => {
                        let records: Vec<VectorRecord> = batch
                            .iter()
                            .zip(vectors.into_iter())
                            .map(|((id, _, payload), vector)| VectorRecord {
                                id: id.clone(),
                                vector,
                                payload: serde_json::from_value(payload.clone()).unwrap_or_else(|_| {
                                    panic!("payload for {id} did not match VectorPayload shape")
                                }),
                            })
                            .collect();
                        if let Err(e) = vector.upsert_batch(collection, records).await {
                            return Some(SyncFileError { phase: ErrorPhase::Vector, file: collection.name().to_string(), error: e.to_string() });
                        }
                        None
                    }
                    Err(e) => Some(SyncFileError { phase: ErrorPhase::Embed, file: collection.name().to_string(), error: e }),
                }
            })
            .buffer_unordered(cfg.embed_concurrency.max(1).min(cfg.store_concurrency.max(1)))
            .collect()
            .await;

        errors.extend(results.into_iter().flatten());
    }
}

/// Retries once with exponential backoff + jitter on transient embedding
/// failures (§4.2: "retried once... then its chunks are reported").
async fn embed_with_retry(vector: &VectorStore, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, String> {
    match vector.embed(texts).await {
        Ok(v) => return Ok(v),
        Err(e) => warn!(%e, "embed batch failed, retrying once"),
    }
    let jitter_ms = (std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_millis())
        .unwrap_or(0)
        % 250) as u64;
    tokio::time::sleep(Duration::from_millis(500 + jitter_ms)).await;
    vector.embed(texts).await.map_err(|e| e.to_string())
}

fn collect_chunks(items: &[ParsedItem]) -> (Vec<(String, String, serde_json::Value)>, Vec<(String, String, serde_json::Value)>) {
    let mut code = Vec::new();
    let mut docs = Vec::new();
    for item in items {
        match &item.outcome {
            ParseOutcome::Code(pf) => {
                for chunk in &pf.chunks {
                    let payload = serde_json::json!({
                        "kind": "code_chunk",
                        "id": chunk.id, "file": chunk.file, "start_line": chunk.start_line,
                        "end_line": chunk.end_line, "text": chunk.text, "language": chunk.language,
                        "symbol_name": chunk.symbol_name, "symbol_kind": chunk.symbol_kind,
                    });
                    code.push((chunk.id.clone(), chunk.text.clone(), payload));
                }
            }
            ParseOutcome::Doc(_, chunks) => {
                for chunk in chunks {
                    let payload = serde_json::json!({
                        "kind": "document_chunk",
                        "id": chunk.id, "file": chunk.file, "start_line": chunk.start_line,
                        "end_line": chunk.end_line, "text": chunk.text,
                        "document_type": chunk.document_type, "tags": chunk.tags,
                    });
                    docs.push((chunk.id.clone(), chunk.text.clone(), payload));
                }
            }
        }
    }
    (code, docs)
}

fn graph_path(repo_root: &Path) -> PathBuf {
    repo_root.join(".cv").join("graph.json")
}
