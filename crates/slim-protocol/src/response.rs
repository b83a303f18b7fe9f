//! Result tokens and response documents.
//!
//! A response is a packed list with one `[id, result]` pair per instruction,
//! in request order. The tokens below are what the driving harness expects;
//! they are fixed by the harness and must not be localised.

use crate::codec::{Item, pack};

/// Version line written, unframed, when a connection opens.
pub const GREETING: &str = "Slim -- V0.3\n";

/// Payload that ends a session.
pub const BYE: &str = "bye";

/// Acknowledgement for instructions that produce no value.
pub const OK: &str = "OK";

/// Result of a method that returned nothing.
pub const VOID: &str = "/__VOID__/";

/// Stand-in for a missing value inside a list result.
pub const NULL: &str = "null";

/// Prefix of every exception token.
pub const EXCEPTION_PREFIX: &str = "__EXCEPTION__:";

/// Marker placed after [`EXCEPTION_PREFIX`] when the fixture asked to stop
/// the current test.
pub const ABORT_MARKER: &str = "ABORT_SLIM_TEST:";

const MESSAGE_OPEN: &str = "message:<<";
const MESSAGE_CLOSE: &str = ">>";

/// How one instruction ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Import, Make, or Assign completed.
    Acknowledged,
    /// A method completed without a value.
    Void,
    /// A method returned a value, already converted to wire form.
    Value(Item),
    /// The instruction failed.
    Exception {
        /// Human-readable description, starting with a Slim error code where
        /// the failure came from the engine.
        message: String,
        /// Whether the harness should abandon the current test.
        stop_test: bool,
    },
}

impl Outcome {
    /// Builds an ordinary exception outcome.
    pub fn exception(message: impl Into<String>) -> Self {
        Self::Exception {
            message: message.into(),
            stop_test: false,
        }
    }

    /// Renders the outcome as the result element of a response pair.
    #[must_use]
    pub fn to_item(&self) -> Item {
        match self {
            Self::Acknowledged => Item::from(OK),
            Self::Void => Item::from(VOID),
            Self::Value(item) => item.clone(),
            Self::Exception { message, stop_test } => {
                let marker = if *stop_test { ABORT_MARKER } else { "" };
                Item::Text(format!(
                    "{EXCEPTION_PREFIX}{marker}{MESSAGE_OPEN}{message}{MESSAGE_CLOSE}"
                ))
            }
        }
    }

    /// Classifies a result element received from the wire.
    ///
    /// This is the harness-side view of [`Outcome::to_item`]: `OK` and the
    /// void token map back to their variants, exception tokens are unwrapped,
    /// and anything else is a value.
    #[must_use]
    pub fn classify(item: &Item) -> Self {
        let Some(text) = item.as_text() else {
            return Self::Value(item.clone());
        };
        if text == OK {
            return Self::Acknowledged;
        }
        if text == VOID {
            return Self::Void;
        }
        let Some(body) = text.strip_prefix(EXCEPTION_PREFIX) else {
            return Self::Value(item.clone());
        };
        let (stop_test, body) = body
            .strip_prefix(ABORT_MARKER)
            .map_or((false, body), |rest| (true, rest));
        let message = body
            .strip_prefix(MESSAGE_OPEN)
            .and_then(|rest| rest.strip_suffix(MESSAGE_CLOSE))
            .unwrap_or(body);
        Self::Exception {
            message: message.to_owned(),
            stop_test,
        }
    }

    /// Returns `true` for exception outcomes.
    #[must_use]
    pub const fn is_exception(&self) -> bool {
        matches!(self, Self::Exception { .. })
    }
}

/// The answer to one instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Id of the instruction being answered.
    pub id: String,
    /// What happened.
    pub outcome: Outcome,
}

impl Response {
    /// Pairs an instruction id with its outcome.
    pub fn new(id: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            id: id.into(),
            outcome,
        }
    }
}

/// Packs responses into a response document.
#[must_use]
pub fn pack_responses(responses: &[Response]) -> String {
    let items: Vec<Item> = responses
        .iter()
        .map(|response| {
            Item::List(vec![
                Item::Text(response.id.clone()),
                response.outcome.to_item(),
            ])
        })
        .collect();
    pack(&items)
}
