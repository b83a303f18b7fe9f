//! Byte encodings negotiated for message payloads.
//!
//! The encoding is fixed by server configuration before a connection is
//! accepted and never changes mid-session.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Supported payload encodings.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[strum(ascii_case_insensitive)]
pub enum Encoding {
    /// UTF-8, the harness default.
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    #[strum(to_string = "utf-8", serialize = "utf8")]
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    #[serde(rename = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    #[strum(to_string = "latin-1", serialize = "latin1", serialize = "iso-8859-1")]
    Latin1,
    /// Seven-bit US-ASCII.
    #[serde(rename = "ascii", alias = "us-ascii")]
    #[strum(to_string = "ascii", serialize = "us-ascii")]
    Ascii,
}

/// Errors encountered while parsing an [`Encoding`] from text.
pub type EncodingParseError = strum::ParseError;

/// Errors raised while transcoding payloads.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// The byte sequence is not valid in the configured encoding.
    #[error("payload is not valid {encoding} at byte {position}")]
    Undecodable {
        /// Encoding the payload was decoded with.
        encoding: Encoding,
        /// Offset of the first offending byte.
        position: usize,
    },
    /// A character cannot be represented in the configured encoding.
    #[error("character {character:?} at index {position} cannot be encoded as {encoding}")]
    Unencodable {
        /// Encoding the text was encoded with.
        encoding: Encoding,
        /// The offending character.
        character: char,
        /// Character index of the offending character.
        position: usize,
    },
}

impl Encoding {
    /// Encodes text into payload bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::Unencodable`] when `text` contains a character
    /// outside the encoding's repertoire.
    pub fn encode(self, text: &str) -> Result<Vec<u8>, EncodingError> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Latin1 => self.encode_single_byte(text),
            Self::Ascii => self.encode_single_byte(text),
        }
    }

    /// Decodes payload bytes into text.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::Undecodable`] when `bytes` is not valid in the
    /// encoding.
    pub fn decode(self, bytes: &[u8]) -> Result<String, EncodingError> {
        match self {
            Self::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|error| {
                EncodingError::Undecodable {
                    encoding: self,
                    position: error.utf8_error().valid_up_to(),
                }
            }),
            Self::Latin1 => Ok(bytes.iter().copied().map(char::from).collect()),
            Self::Ascii => match bytes.iter().position(|byte| !byte.is_ascii()) {
                Some(position) => Err(EncodingError::Undecodable {
                    encoding: self,
                    position,
                }),
                None => Ok(bytes.iter().copied().map(char::from).collect()),
            },
        }
    }

    /// Returns `true` when `character` has a byte form in this encoding.
    #[must_use]
    pub const fn represents(self, character: char) -> bool {
        match self {
            Self::Utf8 => true,
            Self::Latin1 => character as u32 <= 0xFF,
            Self::Ascii => character.is_ascii(),
        }
    }

    /// Replaces every character the encoding cannot carry with a `\u{..}`
    /// escape, so the result always encodes.
    #[must_use]
    pub fn escape_unrepresentable(self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for character in text.chars() {
            if self.represents(character) {
                escaped.push(character);
            } else {
                escaped.extend(character.escape_unicode());
            }
        }
        escaped
    }

    fn encode_single_byte(self, text: &str) -> Result<Vec<u8>, EncodingError> {
        text.chars()
            .enumerate()
            .map(|(position, character)| {
                u8::try_from(u32::from(character))
                    .ok()
                    .filter(|_| self.represents(character))
                    .ok_or(EncodingError::Unencodable {
                        encoding: self,
                        character,
                        position,
                    })
            })
            .collect()
    }
}
