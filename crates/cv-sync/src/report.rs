//! `SyncReport`: the durable record of a sync run's per-file outcome.

use cv_core::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    Full,
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPhase {
    Discover,
    Parse,
    Embed,
    Graph,
    Vector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncFileError {
    pub phase: ErrorPhase,
    pub file: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStats {
    pub files_processed: usize,
    pub files_failed: usize,
    pub unchanged: usize,
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub timestamp: Timestamp,
    #[serde(rename = "type")]
    pub mode: SyncMode,
    pub success: bool,
    pub duration_ms: u64,
    pub stats: SyncStats,
    pub errors: Vec<SyncFileError>,
}

impl SyncReport {
    /// `filesProcessed + filesFailed = |candidateFiles|` and
    /// `success <=> filesFailed = 0` are standing invariants; this
    /// constructor derives both from `stats` rather than letting callers
    /// set `success` independently and risk drifting out of sync.
    pub fn finalize(mode: SyncMode, timestamp: Timestamp, duration_ms: u64, stats: SyncStats, errors: Vec<SyncFileError>) -> Self {
        let success = stats.files_failed == 0;
        Self {
            timestamp,
            mode,
            success,
            duration_ms,
            stats,
            errors,
        }
    }
}
