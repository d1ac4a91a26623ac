//! Error types for board setup, move requests and persisted records.

use thiserror::Error;

use crate::board::Square;

/// Errors raised while placing pieces on a board.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// A piece was placed on a square that already holds one
    #[error("square {square} is already occupied")]
    Occupied { square: Square },

    /// Coordinates outside 1..=8
    #[error("square ({file}, {rank}) is off the board")]
    OffBoard { file: i8, rank: i8 },
}

/// Errors raised when a caller requests a move.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// The move is not in the legal set for the side requesting it
    #[error("illegal move from {from} to {to}")]
    Illegal { from: Square, to: Square },

    /// Text that does not name two squares, e.g. `e2e4`
    #[error("cannot read `{text}` as a move")]
    Unparsable { text: String },
}

/// Errors raised while parsing per-square board records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid {field} `{value}`")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("record stream ended without the `end` sentinel")]
    MissingSentinel,

    #[error("unexpected content after the `end` sentinel on line {line}")]
    TrailingContent { line: usize },

    #[error(transparent)]
    Board(#[from] BoardError),
}
