//! Streaming extraction of array elements from large documents.
//!
//! `ArrayExtractor` pulls typed elements out of one target array without ever
//! materializing the whole document: a token cursor walks the byte stream,
//! and only elements of the addressed array are decoded. Works in push mode
//! (`for_each`), pull mode (`elements`), or as a whole-document scalar-leaf
//! stream (`entry_stream`).
//!
//! Target arrays are addressed by a key list: `["group", "itemlist"]` selects
//! elements at `$.group.itemlist[i]`.

use std::io;
use std::marker::PhantomData;

use regex::Regex;
use serde::de::DeserializeOwned;
use struson::reader::{JsonReader, JsonStreamReader, ValueType};

use crate::error::{Error, Result};

// ————————————————————————————————————————————————————————————————————————————
// TOKEN MODEL
// ————————————————————————————————————————————————————————————————————————————

/// What the cursor will produce next, without consuming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    Name,
    Str,
    Number,
    Bool,
    Null,
    End,
}

/// A consumed token with its payload. Numbers keep their literal text.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    Name(String),
    Str(String),
    Number(String),
    Bool(bool),
    Null,
    End,
}

/// A scalar leaf delivered by [`entry_stream`]. Integral literals narrow to
/// `Int` when they fit, otherwise `Long`; fractional ones become `Double`.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamValue {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Str(String),
}

// ————————————————————————————————————————————————————————————————————————————
// TOKEN CURSOR
// ————————————————————————————————————————————————————————————————————————————

enum Frame {
    /// `name` holds the pending member name between `Name` and its value.
    Object { name: Option<String> },
    /// `index` is the slot the next element will occupy.
    Array { index: usize },
}

/// Forward-only token cursor over a JSON byte stream.
///
/// Owns its reader; a cursor is single-pass and call-scoped. `path()` renders
/// the current position Gson-style: `$`, then `.key` per object member and
/// `[index]` per array slot, where the index names the slot the next element
/// will fill (immediately after `ArrayStart` the path ends in `[0]`).
pub struct TokenCursor<R: io::Read> {
    reader: JsonStreamReader<R>,
    frames: Vec<Frame>,
    done: bool,
}

impl<R: io::Read> TokenCursor<R> {
    pub fn new(reader: R) -> Self {
        Self { reader: JsonStreamReader::new(reader), frames: Vec::new(), done: false }
    }

    /// Kind of the next token, without consuming anything.
    pub fn peek(&mut self) -> Result<TokenKind> {
        if self.done {
            return Ok(TokenKind::End);
        }
        match self.frames.last() {
            Some(Frame::Object { name: None }) => {
                if self.reader.has_next()? {
                    Ok(TokenKind::Name)
                } else {
                    Ok(TokenKind::ObjectEnd)
                }
            }
            Some(Frame::Array { .. }) => {
                if self.reader.has_next()? {
                    self.peek_value()
                } else {
                    Ok(TokenKind::ArrayEnd)
                }
            }
            Some(Frame::Object { name: Some(_) }) | None => self.peek_value(),
        }
    }

    /// Consume the next token and return it with its payload.
    pub fn advance(&mut self) -> Result<Token> {
        match self.peek()? {
            TokenKind::End => Ok(Token::End),
            TokenKind::Name => {
                let name = self.reader.next_name_owned()?;
                if let Some(Frame::Object { name: slot }) = self.frames.last_mut() {
                    *slot = Some(name.clone());
                }
                Ok(Token::Name(name))
            }
            TokenKind::ObjectStart => {
                self.reader.begin_object()?;
                self.frames.push(Frame::Object { name: None });
                Ok(Token::ObjectStart)
            }
            TokenKind::ObjectEnd => {
                self.reader.end_object()?;
                self.frames.pop();
                self.value_done();
                Ok(Token::ObjectEnd)
            }
            TokenKind::ArrayStart => {
                self.reader.begin_array()?;
                self.frames.push(Frame::Array { index: 0 });
                Ok(Token::ArrayStart)
            }
            TokenKind::ArrayEnd => {
                self.reader.end_array()?;
                self.frames.pop();
                self.value_done();
                Ok(Token::ArrayEnd)
            }
            TokenKind::Str => {
                let s = self.reader.next_string()?;
                self.value_done();
                Ok(Token::Str(s))
            }
            TokenKind::Number => {
                let literal = self.reader.next_number_as_string()?;
                self.value_done();
                Ok(Token::Number(literal))
            }
            TokenKind::Bool => {
                let b = self.reader.next_bool()?;
                self.value_done();
                Ok(Token::Bool(b))
            }
            TokenKind::Null => {
                self.reader.next_null()?;
                self.value_done();
                Ok(Token::Null)
            }
        }
    }

    /// Decode the entire upcoming value at the cursor position.
    pub fn decode<T: DeserializeOwned>(&mut self) -> Result<T> {
        let value = self.reader.deserialize_next()?;
        self.value_done();
        Ok(value)
    }

    /// Gson-style rendering of the current position.
    pub fn path(&self) -> String {
        let mut out = String::from("$");
        for frame in &self.frames {
            match frame {
                Frame::Object { name: Some(n) } => {
                    out.push('.');
                    out.push_str(n);
                }
                Frame::Object { name: None } => {}
                Frame::Array { index } => {
                    out.push('[');
                    out.push_str(&index.to_string());
                    out.push(']');
                }
            }
        }
        out
    }

    fn peek_value(&mut self) -> Result<TokenKind> {
        Ok(match self.reader.peek()? {
            ValueType::Array => TokenKind::ArrayStart,
            ValueType::Object => TokenKind::ObjectStart,
            ValueType::String => TokenKind::Str,
            ValueType::Number => TokenKind::Number,
            ValueType::Boolean => TokenKind::Bool,
            ValueType::Null => TokenKind::Null,
        })
    }

    /// A value just finished at the current nesting level.
    fn value_done(&mut self) {
        match self.frames.last_mut() {
            Some(Frame::Object { name }) => *name = None,
            Some(Frame::Array { index }) => *index += 1,
            None => self.done = true,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ARRAY EXTRACTOR
// ————————————————————————————————————————————————————————————————————————————

/// Extracts typed elements of one target array from a streaming source.
pub struct ArrayExtractor<T> {
    pattern: Regex,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> ArrayExtractor<T> {
    /// Address the target array by its key list from the root.
    ///
    /// An empty key list is rejected; the root itself is not an extractable
    /// array position.
    pub fn for_path<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pattern = target_pattern(keys)?;
        Ok(Self { pattern, _marker: PhantomData })
    }

    /// Push mode: decode each target element and hand it to `f` in document
    /// order. The first error aborts the scan; callbacks already delivered
    /// stand.
    pub fn for_each<R: io::Read>(&self, reader: R, mut f: impl FnMut(T)) -> Result<()> {
        let mut cursor = TokenCursor::new(reader);
        let mut in_target = false;
        while let Some(element) = next_element(&self.pattern, &mut in_target, &mut cursor)? {
            f(element);
        }
        Ok(())
    }

    /// Pull mode: a lazy iterator of decoded target elements. Fused after the
    /// document ends or the first error; not restartable.
    pub fn elements<R: io::Read>(&self, reader: R) -> Elements<R, T> {
        Elements {
            pattern: self.pattern.clone(),
            cursor: TokenCursor::new(reader),
            in_target: false,
            fused: false,
            _marker: PhantomData,
        }
    }
}

fn target_pattern<I, S>(keys: I) -> Result<Regex>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let escaped: Vec<String> =
        keys.into_iter().map(|k| regex::escape(k.as_ref())).collect();
    if escaped.is_empty() {
        return Err(Error::EmptyTargetPath);
    }
    let source = format!(r"^\$\.{}\[\d+\]$", escaped.join(r"\."));
    // escaped keys always form a valid pattern
    Ok(Regex::new(&source).expect("escaped target pattern"))
}

/// One step of the extraction loop: scan forward to the next element of the
/// target array, or to the end of the document.
fn next_element<R, T>(
    pattern: &Regex,
    in_target: &mut bool,
    cursor: &mut TokenCursor<R>,
) -> Result<Option<T>>
where
    R: io::Read,
    T: DeserializeOwned,
{
    loop {
        match cursor.peek()? {
            TokenKind::End => return Ok(None),
            TokenKind::ArrayStart => {
                cursor.advance()?;
                if pattern.is_match(&cursor.path()) {
                    *in_target = true;
                }
            }
            TokenKind::ArrayEnd => {
                cursor.advance()?;
                *in_target = false;
            }
            TokenKind::ObjectStart if *in_target => return cursor.decode().map(Some),
            _ => {
                cursor.advance()?;
            }
        }
    }
}

/// Pull-mode iterator over decoded target elements.
pub struct Elements<R: io::Read, T> {
    pattern: Regex,
    cursor: TokenCursor<R>,
    in_target: bool,
    fused: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<R: io::Read, T: DeserializeOwned> Iterator for Elements<R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        match next_element(&self.pattern, &mut self.in_target, &mut self.cursor) {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.fused = true;
                None
            }
            Err(err) => {
                self.fused = true;
                Some(Err(err))
            }
        }
    }
}

impl<R: io::Read, T: DeserializeOwned> std::iter::FusedIterator for Elements<R, T> {}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY STREAM
// ————————————————————————————————————————————————————————————————————————————

/// Stream every scalar leaf of a document as `(path, value)` pairs, without
/// building a tree.
pub fn entry_stream<R: io::Read>(reader: R) -> EntryStream<R> {
    EntryStream { cursor: TokenCursor::new(reader), fused: false }
}

/// Iterator produced by [`entry_stream`]. Fused after the document ends or
/// the first error.
pub struct EntryStream<R: io::Read> {
    cursor: TokenCursor<R>,
    fused: bool,
}

impl<R: io::Read> Iterator for EntryStream<R> {
    type Item = Result<(String, StreamValue)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        loop {
            let kind = match self.cursor.peek() {
                Ok(kind) => kind,
                Err(err) => {
                    self.fused = true;
                    return Some(Err(err));
                }
            };
            match kind {
                TokenKind::End => {
                    self.fused = true;
                    return None;
                }
                TokenKind::Str | TokenKind::Number | TokenKind::Bool | TokenKind::Null => {
                    // capture before consuming; the array slot index bumps on
                    // advance
                    let path = self.cursor.path();
                    match self.cursor.advance() {
                        Ok(token) => return Some(Ok((path, scalar_value(token)))),
                        Err(err) => {
                            self.fused = true;
                            return Some(Err(err));
                        }
                    }
                }
                _ => {
                    if let Err(err) = self.cursor.advance() {
                        self.fused = true;
                        return Some(Err(err));
                    }
                }
            }
        }
    }
}

impl<R: io::Read> std::iter::FusedIterator for EntryStream<R> {}

fn scalar_value(token: Token) -> StreamValue {
    match token {
        Token::Null => StreamValue::Null,
        Token::Bool(b) => StreamValue::Bool(b),
        Token::Str(s) => StreamValue::Str(s),
        Token::Number(literal) => classify_number(&literal),
        // callers only hand scalar tokens here
        _ => unreachable!("non-scalar token in entry stream"),
    }
}

fn classify_number(literal: &str) -> StreamValue {
    if !literal.contains(['.', 'e', 'E']) {
        if let Ok(i) = literal.parse::<i64>() {
            return match i32::try_from(i) {
                Ok(narrow) => StreamValue::Int(narrow),
                Err(_) => StreamValue::Long(i),
            };
        }
    }
    StreamValue::Double(literal.parse().unwrap_or(f64::NAN))
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
