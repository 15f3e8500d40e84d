//! Runtime knobs for the hierarchical summary pipeline.

/// Config bag for [`crate::HierarchicalSummarizer`].
#[derive(Clone, Debug)]
pub struct SummaryConfig {
    /// File-level summaries aggregate at most this many symbol summaries
    /// into the generation prompt; the rest are still counted in
    /// `symbol_count` but dropped from the prompt body.
    pub max_symbols_per_file: usize,

    /// When true (the default), a summary whose `content_hash` matches the
    /// previous run's is reused verbatim instead of regenerated.
    pub skip_unchanged: bool,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self { max_symbols_per_file: 50, skip_unchanged: true }
    }
}
