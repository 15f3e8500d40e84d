//! Language-dispatch parser registry: tree-sitter extraction for Rust,
//! Python, Go, Java, TypeScript, and JavaScript, with a regex fallback for
//! grammar failures and unsupported extensions, plus the markdown document
//! parser used for repository documentation.

pub mod common;
pub mod fallback;
pub mod languages;
pub mod markdown;
pub mod registry;

pub use registry::ParserRegistry;
