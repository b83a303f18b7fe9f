//! Nested-list document codec.
//!
//! A packed list looks like `[NNNNNN:LLLLLL:item:LLLLLL:item:]`. `NNNNNN` is
//! the zero-padded item count and each `LLLLLL` is the zero-padded length of
//! the following item, counted in characters. An item whose text is itself a
//! well-formed packed list decodes as a nested [`Item::List`].

use thiserror::Error;

use crate::frame::HEADER_DIGITS;

const OPEN: char = '[';
const CLOSE: char = ']';
const SEPARATOR: char = ':';

/// One element of a nested-list document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// A leaf string.
    Text(String),
    /// A nested list.
    List(Vec<Item>),
}

impl Item {
    /// Returns the leaf text, if this item is not a list.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::List(_) => None,
        }
    }

    /// Returns the nested items, if this item is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::Text(_) => None,
            Self::List(items) => Some(items),
        }
    }
}

impl From<&str> for Item {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Item {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<Self>> for Item {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}

/// Errors raised when text does not follow the packed-list layout.
///
/// Positions are character offsets into the document being decoded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The document does not start with `[`.
    #[error("packed list does not start with '['")]
    MissingOpen,
    /// The document does not end with `]`.
    #[error("packed list does not end with ']'")]
    MissingClose,
    /// A `:` separator was expected.
    #[error("expected ':' at position {position}")]
    ExpectedSeparator {
        /// Offset where the separator should be.
        position: usize,
    },
    /// A length or count field is not a decimal number.
    #[error("invalid length field at position {position}")]
    InvalidLength {
        /// Offset of the length field.
        position: usize,
    },
    /// The document ended inside an item.
    #[error("item at position {position} is truncated, expected {expected} characters")]
    Truncated {
        /// Offset of the truncated item.
        position: usize,
        /// Declared item length.
        expected: usize,
    },
    /// Characters follow the declared items.
    #[error("unexpected data at position {position}")]
    TrailingData {
        /// Offset of the first surplus character.
        position: usize,
    },
}

/// Packs items into a nested-list document.
#[must_use]
pub fn pack(items: &[Item]) -> String {
    let mut packed = String::new();
    packed.push(OPEN);
    push_length(&mut packed, items.len());
    for item in items {
        let text = match item {
            Item::Text(text) => text.clone(),
            Item::List(nested) => pack(nested),
        };
        push_length(&mut packed, text.chars().count());
        packed.push_str(&text);
        packed.push(SEPARATOR);
    }
    packed.push(CLOSE);
    packed
}

/// Unpacks a nested-list document.
///
/// # Errors
///
/// Returns a [`CodecError`] naming the first structural problem found.
pub fn unpack(packed: &str) -> Result<Vec<Item>, CodecError> {
    let chars: Vec<char> = packed.chars().collect();
    let mut cursor = Cursor::new(&chars);
    cursor.expect_open()?;
    let count = cursor.read_length()?;
    let mut items = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let length = cursor.read_length()?;
        let text = cursor.read_item(length)?;
        cursor.expect_separator()?;
        items.push(decode_item(text));
    }
    cursor.expect_close()?;
    Ok(items)
}

fn decode_item(text: String) -> Item {
    if text.starts_with(OPEN) && text.ends_with(CLOSE) {
        if let Ok(nested) = unpack(&text) {
            return Item::List(nested);
        }
    }
    Item::Text(text)
}

fn push_length(packed: &mut String, length: usize) {
    packed.push_str(&format!("{length:0width$}", width = HEADER_DIGITS));
    packed.push(SEPARATOR);
}

struct Cursor<'a> {
    chars: &'a [char],
    position: usize,
}

impl<'a> Cursor<'a> {
    const fn new(chars: &'a [char]) -> Self {
        Self { chars, position: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn expect_open(&mut self) -> Result<(), CodecError> {
        if self.peek() != Some(OPEN) {
            return Err(CodecError::MissingOpen);
        }
        if self.chars.last() != Some(&CLOSE) {
            return Err(CodecError::MissingClose);
        }
        self.position += 1;
        Ok(())
    }

    fn expect_close(&mut self) -> Result<(), CodecError> {
        match self.peek() {
            Some(CLOSE) if self.position + 1 == self.chars.len() => Ok(()),
            Some(CLOSE) | None => Err(CodecError::TrailingData {
                position: self.position + 1,
            }),
            Some(_) => Err(CodecError::TrailingData {
                position: self.position,
            }),
        }
    }

    fn expect_separator(&mut self) -> Result<(), CodecError> {
        if self.peek() != Some(SEPARATOR) {
            return Err(CodecError::ExpectedSeparator {
                position: self.position,
            });
        }
        self.position += 1;
        Ok(())
    }

    /// Reads a run of digits terminated by `:`.
    fn read_length(&mut self) -> Result<usize, CodecError> {
        let start = self.position;
        let mut length = 0_usize;
        while let Some(digit) = self.peek().and_then(|next| next.to_digit(10)) {
            length = length
                .checked_mul(10)
                .and_then(|value| value.checked_add(usize::try_from(digit).ok()?))
                .ok_or(CodecError::InvalidLength { position: start })?;
            self.position += 1;
        }
        if self.position == start {
            return Err(CodecError::InvalidLength { position: start });
        }
        self.expect_separator()?;
        Ok(length)
    }

    fn read_item(&mut self, length: usize) -> Result<String, CodecError> {
        let start = self.position;
        let truncated = CodecError::Truncated {
            position: start,
            expected: length,
        };
        let end = start.checked_add(length).ok_or_else(|| truncated.clone())?;
        let text = self
            .chars
            .get(start..end)
            .ok_or(truncated)?
            .iter()
            .collect();
        self.position = end;
        Ok(text)
    }
}
