//! Parse-to-tree entry points with JSON-path context in error messages.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Parse JSON text into a tree.
pub fn parse_str(src: &str) -> Result<Value> {
    decode_str(src)
}

/// Parse a JSON byte stream into a tree.
pub fn parse_reader(rdr: impl std::io::Read) -> Result<Value> {
    let de = &mut serde_json::Deserializer::from_reader(rdr);
    match serde_path_to_error::deserialize::<_, Value>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(Error::MalformedInput { path, source: err.into_inner() })
        }
    }
}

/// Decode JSON text into any deserializable type, reporting the JSON path
/// consumed before a failure.
pub fn decode_str<T: DeserializeOwned>(src: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(Error::MalformedInput { path, source: err.into_inner() })
        }
    }
}
