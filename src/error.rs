//! Error taxonomy for construction and cursor traversal.
//!
//! Lookup misses are not errors: `get`/`put`/`remove` return `Option`.

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Rejected construction parameters; no table was created.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The table was structurally mutated by a path other than the cursor
    /// since the cursor last synchronized with it.
    #[error("concurrent structural modification (expected version {expected}, found {found})")]
    ConcurrentModification { expected: u64, found: u64 },

    /// `Cursor::remove` called without a preceding successful `advance`.
    #[error("illegal cursor state: remove requires a preceding advance")]
    IllegalState,

    /// `Cursor::advance` called with nothing left to yield.
    #[error("no such element")]
    NoSuchElement,
}
