//! Finds `let name = %edgedb(`...`)` extension points in ReScript source.
use once_cell::sync::Lazy;
use regex::Regex;

const EXTENSION_MARKER: &str = "%edgedb(";

static EXTENSION_POINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"let\s+(\w+)\s+=\s+%edgedb\(`([^`]+)`\)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedQuery {
    pub binding_name: String,
    pub query: String,
}

/// Cheap pre-check before running the full pattern.
pub fn has_extension_points(source: &str) -> bool {
    source.contains(EXTENSION_MARKER)
}

/// Extension points in source order.
pub fn extract_queries(source: &str) -> Vec<ExtractedQuery> {
    if !has_extension_points(source) {
        return Vec::new();
    }
    EXTENSION_POINT
        .captures_iter(source)
        .map(|caps| ExtractedQuery {
            binding_name: caps[1].to_string(),
            query: caps[2].to_string(),
        })
        .collect()
}
