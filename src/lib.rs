pub mod board;
pub mod error;
pub mod evaluation;
pub mod game;
pub mod movegen;
pub mod record;
pub mod rules;
pub mod search;

pub use board::{Board, Color, Piece, PieceKind, Square};
pub use error::{BoardError, MoveError, RecordError};
pub use movegen::{apply_move, generate_legal_moves, is_checkmate, is_in_check, Move};
pub use search::choose_move;
