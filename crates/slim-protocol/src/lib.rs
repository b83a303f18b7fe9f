//! Wire-level building blocks for the Slim test protocol.
//!
//! A driving harness talks to the server over a byte stream. Each exchange is
//! a length-prefixed frame ([`frame`]) whose payload, once decoded with the
//! configured [`Encoding`], holds a nested-list document ([`codec`]). Request
//! documents carry an ordered batch of instructions ([`instruction`]); the
//! server answers with one result per instruction ([`response`]).
//!
//! The crate has no knowledge of fixtures, symbols, or type conversion. It
//! only turns bytes into typed instructions and typed outcomes back into
//! bytes, so the execution engine can stay independent of the framing rules.

pub mod codec;
pub mod encoding;
pub mod frame;
pub mod instruction;
pub mod response;

pub use self::codec::{CodecError, Item, pack, unpack};
pub use self::encoding::{Encoding, EncodingError, EncodingParseError};
pub use self::frame::{
    DEFAULT_MAX_MESSAGE_BYTES, FrameError, HEADER_DIGITS, read_message, write_greeting,
    write_message,
};
pub use self::instruction::{
    Instruction, InstructionError, InstructionKind, MalformedInstruction, Operation,
    ParsedInstruction, parse, parse_batch,
};
pub use self::response::{Outcome, Response, pack_responses};
