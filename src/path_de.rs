use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{GenError, Result};

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str, origin: &Path) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| GenError::Deserialize {
        path: origin.to_path_buf(),
        json_path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}

/// Read `path` and deserialize it, keeping the JSON path of any failure.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let src = std::fs::read_to_string(path).map_err(|e| GenError::io(path, e))?;
    from_str_with_path(&src, path)
}
