//! Shared types used across the workspace: the parsed-source data model,
//! graph/vector payload shapes, error kinds, id/hash helpers, time handling,
//! and the namespaced query cache.

pub mod cache;
pub mod errors;
pub mod ids;
pub mod model;
pub mod span;
pub mod time;

pub use cache::{CacheNamespace, CacheStats, QueryCache};
pub use errors::{sanitize_log_line, CvError};
pub use span::Span;
pub use time::{Clock, SystemClock, Timestamp};
