use std::path::PathBuf;
use thiserror::Error;

use crate::codec::Cardinality;

/// Everything that can stop generation for a single query or source file.
///
/// The first three variants are integrity errors: the analyzer produced a
/// codec shape the generator has no rendering for. They reproduce on every
/// run, so nothing in the crate retries them.
#[derive(Error, Debug)]
pub enum GenError {
    #[error("unexpected codec kind: {kind}")]
    UnsupportedCodecKind { kind: &'static str },

    #[error("expected range subtype to be a scalar type, found {found}")]
    InvalidRangeSubtype { found: &'static str },

    #[error("field `{field}` holds a set codec, but its cardinality is {cardinality}")]
    InvalidSetCardinality { field: String, cardinality: Cardinality },

    #[error("{kind} codec has {names} field names but {subcodecs} subcodecs")]
    MismatchedSubcodecs { kind: &'static str, names: usize, subcodecs: usize },

    #[error("no analysis found for query `{binding_name}`")]
    MissingAnalysis { binding_name: String },

    #[error("output {} is already generated from {}", output.display(), first.display())]
    OutputCollision { output: PathBuf, first: PathBuf },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: at JSON path {json_path} → {message}", path.display())]
    Deserialize {
        path: PathBuf,
        json_path: String,
        message: String,
    },
}

impl GenError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenError::Io { path: path.into(), source }
    }
}

pub type Result<T, E = GenError> = std::result::Result<T, E>;
