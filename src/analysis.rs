//! Offline stand-in for the database's "analyze query" call: a JSON catalog of
//! analyzer output keyed by query text.
use std::path::Path;

use indexmap::IndexMap;

use crate::codec::{QueryDescriptor, QueryTypes};
use crate::error::{GenError, Result};
use crate::extract::ExtractedQuery;

#[derive(Debug, Clone, Default)]
pub struct AnalysisCatalog {
    entries: IndexMap<String, QueryTypes>,
}

impl AnalysisCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `{ "<query text>": <query types>, ... }`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw: IndexMap<String, QueryTypes> = crate::path_de::read_json(path)?;
        let mut catalog = Self::new();
        for (query, types) in raw {
            catalog.insert(&query, types);
        }
        tracing::debug!(path = %path.display(), queries = catalog.len(), "loaded analysis catalog");
        Ok(catalog)
    }

    /// Keys are compared trimmed, so surrounding whitespace in the embedded
    /// template does not matter.
    pub fn insert(&mut self, query: &str, types: QueryTypes) {
        self.entries.insert(query.trim().to_string(), types);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn analyze(&self, query: &ExtractedQuery) -> Result<QueryDescriptor> {
        let types = self
            .entries
            .get(query.query.trim())
            .ok_or_else(|| GenError::MissingAnalysis { binding_name: query.binding_name.clone() })?;
        Ok(QueryDescriptor {
            binding_name: query.binding_name.clone(),
            query: query.query.clone(),
            types: types.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Cardinality, Codec};

    fn extracted(binding: &str, query: &str) -> ExtractedQuery {
        ExtractedQuery { binding_name: binding.into(), query: query.into() }
    }

    #[test]
    fn lookup_ignores_surrounding_whitespace() {
        let mut catalog = AnalysisCatalog::new();
        catalog.insert(
            "\n select 1 \n",
            QueryTypes {
                cardinality: Cardinality::One,
                args: None,
                result_codec: Codec::scalar("std::int64", "number"),
                distinct_types: vec![],
            },
        );
        let d = catalog.analyze(&extracted("one", "select 1\n")).unwrap();
        assert_eq!(d.binding_name, "one");
        assert_eq!(d.query, "select 1\n");
        assert_eq!(d.types.cardinality, Cardinality::One);
    }

    #[test]
    fn unknown_query_is_missing() {
        let err = AnalysisCatalog::new().analyze(&extracted("q", "select 2")).unwrap_err();
        assert!(matches!(err, GenError::MissingAnalysis { ref binding_name } if binding_name == "q"));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.json");
        std::fs::write(
            &path,
            r#"{"select User { name }": {
                "cardinality": "MANY",
                "resultCodec": {"kind": "object",
                    "fields": [{"name": "name", "cardinality": "ONE"}],
                    "subcodecs": [{"kind": "scalar", "name": "std::str", "primitive": "string"}]}
            }}"#,
        )
        .unwrap();
        let catalog = AnalysisCatalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        let d = catalog.analyze(&extracted("names", "select User { name }")).unwrap();
        assert_eq!(d.types.cardinality, Cardinality::Many);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AnalysisCatalog::load(Path::new("/nonexistent/analysis.json")).unwrap_err();
        assert!(matches!(err, GenError::Io { .. }));
    }
}
