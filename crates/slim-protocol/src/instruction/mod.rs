//! Typed instructions decoded from a request document.
//!
//! Each entry of a request is a list `[id, kind, ...arguments]`. Entries that
//! cannot be understood do not fail the batch: they surface as
//! [`MalformedInstruction`] values carrying whatever id could be recovered, so
//! the executor can answer them in place.

use std::fmt;

use thiserror::Error;

use crate::codec::{CodecError, Item, unpack};

/// Instruction vocabulary understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    /// Adds a fixture search path.
    Import,
    /// Instantiates a fixture class and binds the instance.
    Make,
    /// Invokes a method on a bound instance.
    Call,
    /// Invokes a method and binds its result to a symbol.
    CallAndAssign,
    /// Binds a literal value to a symbol.
    Assign,
}

impl InstructionKind {
    /// Parses a wire keyword. Keywords are case-sensitive.
    #[must_use]
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "import" => Some(Self::Import),
            "make" => Some(Self::Make),
            "call" => Some(Self::Call),
            "callAndAssign" => Some(Self::CallAndAssign),
            "assign" => Some(Self::Assign),
            _ => None,
        }
    }

    /// Returns the wire keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Make => "make",
            Self::Call => "call",
            Self::CallAndAssign => "callAndAssign",
            Self::Assign => "assign",
        }
    }

    const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Import => count == 1,
            Self::Assign => count == 2,
            Self::Make | Self::Call => count >= 2,
            Self::CallAndAssign => count >= 3,
        }
    }

    const fn expected_arguments(self) -> &'static str {
        match self {
            Self::Import => "exactly 1",
            Self::Assign => "exactly 2",
            Self::Make | Self::Call => "at least 2",
            Self::CallAndAssign => "at least 3",
        }
    }
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operation an instruction performs, with its kind-specific arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// `[id, "import", path]`
    Import {
        /// Search path to append.
        path: String,
    },
    /// `[id, "make", instance, class, ...args]`
    Make {
        /// Name to bind the new instance under.
        instance: String,
        /// Class name, possibly a `$symbol` reference.
        class: String,
        /// Constructor arguments.
        args: Vec<Item>,
    },
    /// `[id, "call", instance, method, ...args]`
    Call {
        /// Target instance name.
        instance: String,
        /// Method name as requested.
        method: String,
        /// Method arguments.
        args: Vec<Item>,
    },
    /// `[id, "callAndAssign", symbol, instance, method, ...args]`
    CallAndAssign {
        /// Symbol receiving the converted result.
        symbol: String,
        /// Target instance name.
        instance: String,
        /// Method name as requested.
        method: String,
        /// Method arguments.
        args: Vec<Item>,
    },
    /// `[id, "assign", symbol, value]`
    Assign {
        /// Symbol to bind.
        symbol: String,
        /// Literal wire value.
        value: String,
    },
}

impl Operation {
    /// Returns the instruction kind of this operation.
    #[must_use]
    pub const fn kind(&self) -> InstructionKind {
        match self {
            Self::Import { .. } => InstructionKind::Import,
            Self::Make { .. } => InstructionKind::Make,
            Self::Call { .. } => InstructionKind::Call,
            Self::CallAndAssign { .. } => InstructionKind::CallAndAssign,
            Self::Assign { .. } => InstructionKind::Assign,
        }
    }
}

/// A well-formed instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Correlation token echoed in the response.
    pub id: String,
    /// What to do.
    pub operation: Operation,
}

/// Reasons an instruction entry is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InstructionError {
    /// The entry is a plain string rather than a list.
    #[error("instruction is not a list")]
    NotAList,
    /// The entry has no id.
    #[error("instruction has no id")]
    MissingId,
    /// The entry has an id but no kind.
    #[error("instruction has no kind")]
    MissingKind,
    /// The kind keyword is not part of the vocabulary.
    #[error("{kind}")]
    UnknownKind {
        /// Keyword as received.
        kind: String,
    },
    /// The argument count does not match the kind.
    #[error("{kind} expects {expected} argument(s), got {actual}")]
    WrongArity {
        /// Instruction kind.
        kind: InstructionKind,
        /// Accepted argument count, in words.
        expected: &'static str,
        /// Arguments received.
        actual: usize,
    },
    /// A name argument was a nested list.
    #[error("{kind} argument {position} must be text")]
    ExpectedText {
        /// Instruction kind.
        kind: InstructionKind,
        /// Zero-based argument position.
        position: usize,
    },
}

impl InstructionError {
    /// Returns the Slim error code reported to the harness.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownKind { .. } => "INVALID_STATEMENT",
            Self::NotAList
            | Self::MissingId
            | Self::MissingKind
            | Self::WrongArity { .. }
            | Self::ExpectedText { .. } => "MALFORMED_INSTRUCTION",
        }
    }
}

/// An entry that could not be parsed, with the id it should be answered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedInstruction {
    /// Recovered id, or the empty string.
    pub id: String,
    /// Why the entry was rejected.
    pub error: InstructionError,
}

/// Outcome of parsing one batch entry.
pub type ParsedInstruction = Result<Instruction, MalformedInstruction>;

/// Decodes a request document into instructions.
///
/// # Errors
///
/// Returns [`CodecError`] when the document itself is not a packed list.
/// Problems with individual entries are reported per entry instead.
pub fn parse(document: &str) -> Result<Vec<ParsedInstruction>, CodecError> {
    unpack(document).map(parse_batch)
}

/// Parses every entry of an unpacked batch, preserving order.
#[must_use]
pub fn parse_batch(entries: Vec<Item>) -> Vec<ParsedInstruction> {
    entries.into_iter().map(parse_entry).collect()
}

fn parse_entry(entry: Item) -> ParsedInstruction {
    let Item::List(fields) = entry else {
        return Err(malformed(String::new(), InstructionError::NotAList));
    };
    let mut fields = fields.into_iter();
    let id = match fields.next() {
        Some(Item::Text(id)) => id,
        Some(Item::List(_)) | None => {
            return Err(malformed(String::new(), InstructionError::MissingId));
        }
    };
    let keyword = match fields.next() {
        Some(Item::Text(keyword)) => keyword,
        Some(Item::List(_)) | None => return Err(malformed(id, InstructionError::MissingKind)),
    };
    let Some(kind) = InstructionKind::parse(&keyword) else {
        return Err(malformed(id, InstructionError::UnknownKind { kind: keyword }));
    };

    let args: Vec<Item> = fields.collect();
    if !kind.accepts(args.len()) {
        let error = InstructionError::WrongArity {
            kind,
            expected: kind.expected_arguments(),
            actual: args.len(),
        };
        return Err(malformed(id, error));
    }

    match build_operation(kind, args) {
        Ok(operation) => Ok(Instruction { id, operation }),
        Err(error) => Err(malformed(id, error)),
    }
}

fn build_operation(kind: InstructionKind, args: Vec<Item>) -> Result<Operation, InstructionError> {
    let mut args = Arguments::new(kind, args);
    let operation = match kind {
        InstructionKind::Import => Operation::Import {
            path: args.text()?,
        },
        InstructionKind::Make => Operation::Make {
            instance: args.text()?,
            class: args.text()?,
            args: args.rest(),
        },
        InstructionKind::Call => Operation::Call {
            instance: args.text()?,
            method: args.text()?,
            args: args.rest(),
        },
        InstructionKind::CallAndAssign => Operation::CallAndAssign {
            symbol: args.text()?,
            instance: args.text()?,
            method: args.text()?,
            args: args.rest(),
        },
        InstructionKind::Assign => Operation::Assign {
            symbol: args.text()?,
            value: args.text()?,
        },
    };
    Ok(operation)
}

const fn malformed(id: String, error: InstructionError) -> MalformedInstruction {
    MalformedInstruction { id, error }
}

struct Arguments {
    kind: InstructionKind,
    items: std::vec::IntoIter<Item>,
    position: usize,
}

impl Arguments {
    fn new(kind: InstructionKind, items: Vec<Item>) -> Self {
        Self {
            kind,
            items: items.into_iter(),
            position: 0,
        }
    }

    fn text(&mut self) -> Result<String, InstructionError> {
        let position = self.position;
        self.position += 1;
        match self.items.next() {
            Some(Item::Text(text)) => Ok(text),
            Some(Item::List(_)) | None => Err(InstructionError::ExpectedText {
                kind: self.kind,
                position,
            }),
        }
    }

    fn rest(self) -> Vec<Item> {
        self.items.collect()
    }
}

#[cfg(test)]
mod tests;
