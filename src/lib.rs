//! JSON path toolkit (single crate).
//!
//! Four ways of getting at the contents of a JSON document, each built on
//! `serde_json` trees with insertion-ordered object keys:
//!
//! - Navigate: resolve `store.book[1].price` paths against a parsed tree
//!   ([`JsonLocator`]). Misses are `None`, never errors.
//! - Flatten: collapse a tree into an ordered path→value map ([`flatten()`]),
//!   fire handlers as the walk passes registered paths ([`PathSearch`]), or
//!   resolve an ordered key list back against the flat map
//!   ([`FlatMap::search`]).
//! - View: report every scalar leaf with per-path chrono date decoding
//!   ([`JsonViewer`]).
//! - Extract: stream typed elements out of one array of a large document
//!   without materializing it ([`ArrayExtractor`]), or stream every scalar
//!   leaf ([`entry_stream`]).
//! - Shape: learn a structural pattern from a sample and check candidates
//!   against it, or render a defaults-filled skeleton ([`JsonShape`]).

pub mod error;
pub mod extract;
pub mod flatten;
pub mod navigate;
pub mod parse;
pub mod shape;
pub mod view;

pub use error::{Error, Result};
pub use extract::{ArrayExtractor, Elements, EntryStream, StreamValue, Token, TokenCursor, TokenKind, entry_stream};
pub use flatten::{FlatMap, FlatValue, NumberPolicy, PathSearch, flatten};
pub use navigate::{JsonLocator, locate};
pub use parse::{decode_str, parse_reader, parse_str};
pub use shape::{JsonShape, Kind};
pub use view::{Entries, JsonViewer, ViewValue};
