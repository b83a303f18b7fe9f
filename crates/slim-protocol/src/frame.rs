//! Length-prefixed message framing.
//!
//! Every message on the wire starts with a header of [`HEADER_DIGITS`] ASCII
//! decimal digits and a `:` separator. The digits give the byte length of the
//! payload that follows. The only unframed bytes are the greeting line the
//! server writes once per connection.

use std::io::{self, Read, Write};

use thiserror::Error;

/// Number of decimal digits in a frame header.
pub const HEADER_DIGITS: usize = 6;

/// Largest payload accepted unless configuration says otherwise.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

const HEADER_SEPARATOR: u8 = b':';
const HEADER_BYTES: usize = HEADER_DIGITS + 1;

/// Errors raised while reading or writing frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The peer closed the stream before a complete frame arrived.
    #[error("connection closed after {received} of {expected} expected bytes")]
    ConnectionClosed {
        /// Bytes the current read still required.
        expected: usize,
        /// Bytes received before the stream ended.
        received: usize,
    },
    /// The frame header is not a run of decimal digits followed by `:`.
    #[error("invalid frame header {header:?}")]
    InvalidHeader {
        /// Header bytes as received, lossily decoded.
        header: String,
    },
    /// The declared payload length exceeds the configured limit.
    #[error("message of {declared} bytes exceeds {limit} byte limit")]
    TooLarge {
        /// Length announced by the header.
        declared: usize,
        /// Configured maximum.
        limit: usize,
    },
    /// Reading from or writing to the stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FrameError {
    /// Returns `true` when the peer closed the connection exactly on a frame
    /// boundary, which is an orderly (if unannounced) end of session.
    #[must_use]
    pub const fn is_clean_close(&self) -> bool {
        matches!(
            self,
            Self::ConnectionClosed { received: 0, expected } if *expected == HEADER_BYTES
        )
    }
}

/// Reads one framed message and returns its raw payload bytes.
///
/// Blocks until the whole declared payload has arrived or the stream ends.
///
/// # Errors
///
/// Returns [`FrameError::ConnectionClosed`] when the stream ends early,
/// [`FrameError::InvalidHeader`] for an unparsable header, and
/// [`FrameError::TooLarge`] when the declared length exceeds `max_bytes`.
pub fn read_message<R: Read>(reader: &mut R, max_bytes: usize) -> Result<Vec<u8>, FrameError> {
    let mut header = [0_u8; HEADER_BYTES];
    read_full(reader, &mut header)?;
    let declared = parse_header(&header)?;
    if declared > max_bytes {
        return Err(FrameError::TooLarge {
            declared,
            limit: max_bytes,
        });
    }

    let mut payload = vec![0_u8; declared];
    read_full(reader, &mut payload)?;
    Ok(payload)
}

/// Writes one framed message and flushes the stream.
///
/// # Errors
///
/// Returns [`FrameError::Io`] when the stream rejects the write.
pub fn write_message<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError> {
    let header = format!("{:0width$}:", payload.len(), width = HEADER_DIGITS);
    writer.write_all(header.as_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Writes the unframed greeting line that opens every connection.
///
/// # Errors
///
/// Returns [`FrameError::Io`] when the stream rejects the write.
pub fn write_greeting<W: Write>(writer: &mut W, greeting: &[u8]) -> Result<(), FrameError> {
    writer.write_all(greeting)?;
    writer.flush()?;
    Ok(())
}

fn parse_header(header: &[u8; HEADER_BYTES]) -> Result<usize, FrameError> {
    let invalid = || FrameError::InvalidHeader {
        header: String::from_utf8_lossy(header).into_owned(),
    };
    let (digits, separator) = header.split_at(HEADER_DIGITS);
    if separator != [HEADER_SEPARATOR] || !digits.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }
    digits.iter().try_fold(0_usize, |length, digit| {
        length
            .checked_mul(10)
            .and_then(|value| value.checked_add(usize::from(digit - b'0')))
            .ok_or_else(invalid)
    })
}

fn read_full<R: Read>(reader: &mut R, buffer: &mut [u8]) -> Result<(), FrameError> {
    let expected = buffer.len();
    let mut received = 0;
    while let Some(remaining) = buffer.get_mut(received..) {
        if remaining.is_empty() {
            break;
        }
        match reader.read(remaining) {
            Ok(0) => return Err(FrameError::ConnectionClosed { expected, received }),
            Ok(read) => received += read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(FrameError::ConnectionClosed { expected, received });
            }
            Err(error) => return Err(FrameError::Io(error)),
        }
    }
    Ok(())
}
