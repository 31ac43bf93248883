//! Crate-wide error taxonomy.
//!
//! "Not found" is never an error here: the navigator reports misses as
//! `Option::None` and the validator reports mismatches as plain data. The
//! variants below cover genuinely exceptional conditions only.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The source text is not lexically valid JSON. `path` is the JSON path
    /// consumed before the failure; line/column live in the wrapped error.
    #[error("malformed JSON at {path}: {source}")]
    MalformedInput {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A component that requires an object root was handed something else.
    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// The token-level reader failed while scanning a stream.
    #[error("token stream error: {0}")]
    TokenStream(#[from] struson::reader::ReaderError),

    /// Decoding a stream position into a typed value failed.
    #[error("element decode error: {0}")]
    Decode(#[from] struson::serde::DeserializerError),

    /// An explicit `[n]` in a key list exceeds the target array's length.
    #[error("index {index} out of range for array `{path}` (len {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    /// A key-list lookup addressed a key absent from the current level.
    #[error("unknown key `{key}`")]
    UnknownKey { key: String },

    /// Serializing a resolved node to an output sink failed.
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// A streaming extractor was built without any target path keys.
    #[error("target path requires at least one key")]
    EmptyTargetPath,
}

pub type Result<T> = std::result::Result<T, Error>;
