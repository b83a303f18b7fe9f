//! Instruction execution.
//!
//! The dispatcher takes a parsed batch and runs it against a
//! [`SessionContext`], producing one response per instruction in batch
//! order. Failures never escape the instruction that caused them: unknown
//! classes, missing methods, conversion errors, unresolved symbols and fixture
//! panics all become exception results and the batch carries on.

mod context;
mod errors;
mod executor;
mod symbols;

pub use self::context::SessionContext;
pub use self::errors::ExecutionError;
pub use self::executor::Executor;
pub use self::symbols::{SymbolError, SymbolTable};

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
