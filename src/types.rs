//! Shared type aliases used across the client and pipeline layers.

use rustc_hash::FxHashMap;
use serde_json::Value;

/// Server-side metadata predicate passed through to the vector index
/// unmodified. Keys and values are opaque to the pipeline.
pub type MetadataFilter = FxHashMap<String, Value>;

/// Create an empty metadata filter.
#[must_use]
pub fn new_metadata_filter() -> MetadataFilter {
    MetadataFilter::default()
}
