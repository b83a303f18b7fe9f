//! The per-connection request loop.
//!
//! A session greets the harness, then alternates between reading one framed
//! batch and writing one framed response until the harness says `bye` or
//! hangs up. Instruction failures are answered in band by the dispatcher; the
//! only errors surfaced here are the ones that make the stream unusable.

mod handler;

use std::fmt;
use std::io::{Read, Write};

use slim_config::Config;
use slim_protocol::response::{BYE, GREETING};
use slim_protocol::{
    CodecError, Encoding, EncodingError, FrameError, HEADER_DIGITS, Item, Outcome, Response,
    pack_responses, parse, read_message, write_greeting, write_message,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::dispatch::{Executor, SessionContext};

pub(crate) use self::handler::SlimConnectionHandler;

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");
const FRAME_OVERHEAD: usize = HEADER_DIGITS + 1;

/// Errors that end a session early.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing a frame failed, or the header was corrupt.
    #[error("framing failed: {0}")]
    Frame(#[from] FrameError),
    /// A payload could not be transcoded with the configured encoding.
    #[error("payload encoding failed: {0}")]
    Encoding(#[from] EncodingError),
    /// A request document was not a packed list.
    #[error("request is not a valid instruction list: {0}")]
    Codec(#[from] CodecError),
}

/// Per-connection protocol settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Payload encoding.
    pub encoding: Encoding,
    /// Largest accepted request payload, in bytes.
    pub max_message_bytes: usize,
}

impl SessionSettings {
    /// Extracts the session settings from the server configuration.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            encoding: config.encoding,
            max_message_bytes: config.max_message_bytes,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The harness sent the termination sentinel.
    Bye,
    /// The harness closed the connection between messages.
    Disconnected,
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bye => "bye",
            Self::Disconnected => "disconnected",
        })
    }
}

/// Counters gathered over one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// How the session ended.
    pub ended_by: SessionEnd,
    /// Request batches answered.
    pub batches: usize,
    /// Instructions executed, malformed entries included.
    pub instructions: usize,
    /// Framed bytes read, headers included.
    pub bytes_received: usize,
    /// Bytes written, greeting included.
    pub bytes_sent: usize,
}

impl SessionSummary {
    const fn new() -> Self {
        Self {
            ended_by: SessionEnd::Disconnected,
            batches: 0,
            instructions: 0,
            bytes_received: 0,
            bytes_sent: 0,
        }
    }
}

/// Serves one harness connection until `bye` or disconnect.
///
/// `context` carries the symbols and instances the session builds up; the
/// caller decides whether it outlives the connection.
///
/// # Errors
///
/// Returns [`SessionError`] when the stream fails, a frame header is corrupt,
/// a payload cannot be transcoded, or a request is not a packed list. Closing
/// the connection between messages is not an error.
pub fn run_session<S: Read + Write>(
    stream: &mut S,
    executor: &Executor,
    settings: SessionSettings,
    context: &mut SessionContext,
) -> Result<SessionSummary, SessionError> {
    let mut summary = SessionSummary::new();
    let greeting = settings.encoding.encode(GREETING)?;
    write_greeting(stream, &greeting)?;
    summary.bytes_sent += greeting.len();

    loop {
        let payload = match read_message(stream, settings.max_message_bytes) {
            Ok(payload) => payload,
            Err(error) if error.is_clean_close() => {
                debug!(target: SESSION_TARGET, "harness closed the connection");
                return Ok(summary);
            }
            Err(error) => return Err(error.into()),
        };
        summary.bytes_received += FRAME_OVERHEAD + payload.len();

        let document = settings.encoding.decode(&payload)?;
        if document == BYE {
            debug!(target: SESSION_TARGET, "harness said bye");
            summary.ended_by = SessionEnd::Bye;
            return Ok(summary);
        }

        let batch = parse(&document)?;
        summary.batches += 1;
        summary.instructions += batch.len();
        debug!(
            target: SESSION_TARGET,
            instructions = batch.len(),
            "executing batch"
        );
        let responses: Vec<Response> = executor
            .execute_batch(context, batch)
            .into_iter()
            .map(|response| fit_to_encoding(response, settings.encoding))
            .collect();

        let reply = settings.encoding.encode(&pack_responses(&responses))?;
        write_message(stream, &reply)?;
        summary.bytes_sent += FRAME_OVERHEAD + reply.len();
    }
}

/// Rewrites a response the session encoding cannot carry.
///
/// A value with an unrepresentable character becomes an exception for that
/// instruction; an exception message has the offending characters escaped.
/// Either way the rest of the batch is still answered.
fn fit_to_encoding(response: Response, encoding: Encoding) -> Response {
    if item_fits(&response.outcome.to_item(), encoding) {
        return response;
    }
    warn!(
        target: SESSION_TARGET,
        id = %response.id,
        encoding = %encoding,
        "result is not representable in the session encoding"
    );
    let outcome = match response.outcome {
        Outcome::Exception { message, stop_test } => Outcome::Exception {
            message: encoding.escape_unrepresentable(&message),
            stop_test,
        },
        Outcome::Acknowledged | Outcome::Void | Outcome::Value(_) => Outcome::exception(format!(
            "NO_CONVERTER_FOR_ARGUMENT result cannot be encoded as {encoding}"
        )),
    };
    Response::new(response.id, outcome)
}

fn item_fits(item: &Item, encoding: Encoding) -> bool {
    match item {
        Item::Text(text) => text.chars().all(|character| encoding.represents(character)),
        Item::List(items) => items.iter().all(|nested| item_fits(nested, encoding)),
    }
}
