//! Incremental sync engine: walks a repository, classifies changes against
//! the prior run's content hashes, parses/embeds/stores what changed, and
//! tombstones what disappeared. See [`SyncEngine::sync`] for the pipeline.

pub mod cancel;
pub mod discover;
pub mod engine;
pub mod errors;
pub mod report;
pub mod state;

pub use cancel::{CancelToken, DEFAULT_CANCEL_GRACE};
pub use discover::{discover, DiscoverFilters, DiscoveredFile};
pub use engine::{SyncConfig, SyncEngine};
pub use errors::{Result, SyncError};
pub use report::{ErrorPhase, SyncFileError, SyncMode, SyncReport, SyncStats};
pub use state::{ChangeKind, SyncState};
