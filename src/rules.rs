//! Per-piece movement rules.
//!
//! Every predicate here is pure: it reads the board and never changes it.
//! `can_advance` answers whether a piece may move to an empty square and
//! `can_capture` whether it may take an enemy piece standing there. En
//! passant and castling are assembled by the move generator, not here.

use crate::board::{Board, Color, PieceKind, Square};

/// Whether the piece on `from` may move onto the empty square `to`.
pub fn can_advance(board: &Board, from: Square, to: Square) -> bool {
    let Some(piece) = board.get(from) else {
        return false;
    };
    if from == to || !board.is_empty(to) {
        return false;
    }
    match piece.kind {
        PieceKind::Pawn => pawn_can_advance(board, piece.color, piece.has_moved, from, to),
        kind => shape_allows(board, kind, from, to),
    }
}

/// Whether the piece on `from` may capture the enemy piece on `to`.
pub fn can_capture(board: &Board, from: Square, to: Square) -> bool {
    let Some(piece) = board.get(from) else {
        return false;
    };
    match board.get(to) {
        Some(target) if target.color != piece.color => {}
        _ => return false,
    }
    attacks(board, piece.kind, piece.color, from, to)
}

/// Whether a piece of `kind` and `color` on `from` would reach `to`,
/// ignoring what stands on `to`. Used by the threat oracle to test squares
/// that are empty or hold a friendly piece.
pub fn attacks(board: &Board, kind: PieceKind, color: Color, from: Square, to: Square) -> bool {
    if from == to {
        return false;
    }
    match kind {
        PieceKind::Pawn => {
            let df = (to.file() - from.file()).abs();
            let dr = to.rank() - from.rank();
            df == 1 && dr == color.forward()
        }
        kind => shape_allows(board, kind, from, to),
    }
}

fn shape_allows(board: &Board, kind: PieceKind, from: Square, to: Square) -> bool {
    let df = (to.file() - from.file()).abs();
    let dr = (to.rank() - from.rank()).abs();
    let shape = match kind {
        PieceKind::King => df.max(dr) == 1,
        PieceKind::Knight => (df == 1 && dr == 2) || (df == 2 && dr == 1),
        PieceKind::Bishop => df == dr && df > 0,
        PieceKind::Rook => (df == 0) != (dr == 0),
        PieceKind::Queen => (df == dr && df > 0) || ((df == 0) != (dr == 0)),
        // Pawns never reach here; their pushes are handled separately
        PieceKind::Pawn => false,
    };
    shape && (!kind.slides() || is_path_clear(board, from, to))
}

fn pawn_can_advance(board: &Board, color: Color, has_moved: bool, from: Square, to: Square) -> bool {
    if from.file() != to.file() {
        return false;
    }
    let dr = to.rank() - from.rank();
    if dr == color.forward() {
        return true;
    }
    // Double step from an unmoved pawn, never through a blocked square
    dr == 2 * color.forward()
        && !has_moved
        && from
            .offset(0, color.forward())
            .map_or(false, |between| board.is_empty(between))
}

/// Walks unit steps from `from` towards `to` and reports whether every
/// square strictly between them is empty.
pub fn is_path_clear(board: &Board, from: Square, to: Square) -> bool {
    let step_file = (to.file() - from.file()).signum();
    let step_rank = (to.rank() - from.rank()).signum();
    let mut current = from;
    loop {
        current = match current.offset(step_file, step_rank) {
            Some(next) => next,
            None => return false,
        };
        if current == to {
            return true;
        }
        if !board.is_empty(current) {
            return false;
        }
    }
}
