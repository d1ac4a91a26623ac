use std::fmt;

use tracing::trace;

use crate::board::{Board, Color, PieceKind, Square};
use crate::error::MoveError;
use crate::rules::{attacks, can_advance, can_capture};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Advance {
        from: Square,
        to: Square,
    },
    Capture {
        from: Square,
        to: Square,
    },
    CastleKingside {
        king_from: Square,
        king_to: Square,
        rook_from: Square,
        rook_to: Square,
    },
    CastleQueenside {
        king_from: Square,
        king_to: Square,
        rook_from: Square,
        rook_to: Square,
    },
    /// Capture towards the lower file; `captured` is the square of the
    /// pawn taken, beside `from`.
    EnPassantLeft {
        from: Square,
        to: Square,
        captured: Square,
    },
    EnPassantRight {
        from: Square,
        to: Square,
        captured: Square,
    },
}

impl Move {
    pub fn from(&self) -> Square {
        match *self {
            Move::Advance { from, .. }
            | Move::Capture { from, .. }
            | Move::EnPassantLeft { from, .. }
            | Move::EnPassantRight { from, .. } => from,
            Move::CastleKingside { king_from, .. } | Move::CastleQueenside { king_from, .. } => {
                king_from
            }
        }
    }

    pub fn to(&self) -> Square {
        match *self {
            Move::Advance { to, .. }
            | Move::Capture { to, .. }
            | Move::EnPassantLeft { to, .. }
            | Move::EnPassantRight { to, .. } => to,
            Move::CastleKingside { king_to, .. } | Move::CastleQueenside { king_to, .. } => king_to,
        }
    }

    pub fn is_capture(&self) -> bool {
        matches!(
            self,
            Move::Capture { .. } | Move::EnPassantLeft { .. } | Move::EnPassantRight { .. }
        )
    }

    pub fn is_castling(&self) -> bool {
        matches!(self, Move::CastleKingside { .. } | Move::CastleQueenside { .. })
    }

    /// Whether playing this move on `board` promotes a pawn.
    pub fn is_promotion(&self, board: &Board) -> bool {
        match self {
            Move::Advance { from, to } | Move::Capture { from, to } => board
                .get(*from)
                .map_or(false, |piece| {
                    piece.kind == PieceKind::Pawn && to.rank() == piece.color.promotion_rank()
                }),
            _ => false,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Move::CastleKingside { .. } => write!(f, "O-O"),
            Move::CastleQueenside { .. } => write!(f, "O-O-O"),
            mv if mv.is_capture() => write!(f, "{}x{}", mv.from(), mv.to()),
            mv => write!(f, "{}-{}", mv.from(), mv.to()),
        }
    }
}

/// Returns a new board with `mv` played; `board` is left untouched.
pub fn apply_move(board: &Board, mv: Move) -> Board {
    let mut next = board.clone();
    next.apply_move(mv);
    next
}

/// Rule switches that change observable legality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleOptions {
    /// Forbid castling out of check and through an attacked square.
    pub strict_castling: bool,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            strict_castling: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
}

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1), (2, -1), (-2, 1), (-2, -1),
    (1, 2), (1, -2), (-1, 2), (-1, -2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0), (1, 1), (0, 1), (-1, 1),
    (-1, 0), (-1, -1), (0, -1), (1, -1),
];

const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[derive(Debug, Clone, Copy, Default)]
pub struct MoveGenerator {
    pub options: RuleOptions,
}

impl MoveGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RuleOptions) -> Self {
        Self { options }
    }

    /// Whether any non-king piece of `attacker` reaches `square`.
    ///
    /// Whatever stands on `square` is ignored, so empty squares can be
    /// tested as well as occupied ones.
    pub fn is_square_under_attack(&self, board: &Board, square: Square, attacker: Color) -> bool {
        board.pieces().any(|(from, piece)| {
            piece.kind != PieceKind::King
                && piece.color == attacker
                && attacks(board, piece.kind, piece.color, from, square)
        })
    }

    pub fn is_king_in_check(&self, board: &Board, color: Color) -> bool {
        match board.king_square(color) {
            Some(king) => self.is_square_under_attack(board, king, color.opposite()),
            None => false, // No king found (shouldn't happen in a valid position)
        }
    }

    /// All legal moves for `color`. Empty when `color` is mated or stalemated.
    pub fn generate_moves(&self, board: &Board, color: Color) -> Vec<Move> {
        self.generate_pseudo_moves(board, color)
            .into_iter()
            .filter(|mv| self.keeps_king_safe(board, color, *mv))
            .collect()
    }

    /// Moves that satisfy shape and path rules, before the self-check filter.
    pub fn generate_pseudo_moves(&self, board: &Board, color: Color) -> Vec<Move> {
        let mut moves = Vec::new();
        for (from, piece) in board.pieces() {
            if piece.color != color {
                continue;
            }
            for to in candidate_targets(piece.kind, color, from) {
                if can_advance(board, from, to) {
                    moves.push(Move::Advance { from, to });
                } else if can_capture(board, from, to) {
                    moves.push(Move::Capture { from, to });
                }
            }
            if piece.kind == PieceKind::Pawn {
                self.push_en_passant(board, color, from, &mut moves);
            }
        }
        self.push_castling(board, color, &mut moves);
        moves
    }

    fn keeps_king_safe(&self, board: &Board, color: Color, mv: Move) -> bool {
        let next = apply_move(board, mv);
        !self.is_king_in_check(&next, color) && !kings_adjacent(&next)
    }

    fn push_en_passant(&self, board: &Board, color: Color, from: Square, moves: &mut Vec<Move>) {
        for side in [-1, 1] {
            let Some(captured) = from.offset(side, 0) else {
                continue;
            };
            let vulnerable = board.get(captured).map_or(false, |victim| {
                victim.kind == PieceKind::Pawn && victim.color != color && victim.en_passant
            });
            if !vulnerable {
                continue;
            }
            let Some(to) = from.offset(side, color.forward()) else {
                continue;
            };
            if !board.is_empty(to) {
                continue;
            }
            moves.push(if side < 0 {
                Move::EnPassantLeft { from, to, captured }
            } else {
                Move::EnPassantRight { from, to, captured }
            });
        }
    }

    fn push_castling(&self, board: &Board, color: Color, moves: &mut Vec<Move>) {
        let rank = color.home_rank();
        let king_from = Square::at(5, rank);
        if !is_unmoved(board, king_from, PieceKind::King, color) {
            return;
        }
        if self.options.strict_castling
            && self.is_square_under_attack(board, king_from, color.opposite())
        {
            return;
        }

        if self.castle_path_open(board, color, 8, &[6, 7], 6) {
            moves.push(Move::CastleKingside {
                king_from,
                king_to: Square::at(7, rank),
                rook_from: Square::at(8, rank),
                rook_to: Square::at(6, rank),
            });
        }
        if self.castle_path_open(board, color, 1, &[2, 3, 4], 4) {
            moves.push(Move::CastleQueenside {
                king_from,
                king_to: Square::at(3, rank),
                rook_from: Square::at(1, rank),
                rook_to: Square::at(4, rank),
            });
        }
    }

    /// Rook unmoved on `rook_file`, every file in `between` empty and, under
    /// strict castling, `crossed_file` not attacked.
    fn castle_path_open(
        &self,
        board: &Board,
        color: Color,
        rook_file: i8,
        between: &[i8],
        crossed_file: i8,
    ) -> bool {
        let rank = color.home_rank();
        is_unmoved(board, Square::at(rook_file, rank), PieceKind::Rook, color)
            && between.iter().all(|&file| board.is_empty(Square::at(file, rank)))
            && !(self.options.strict_castling
                && self.is_square_under_attack(board, Square::at(crossed_file, rank), color.opposite()))
    }

    /// Rejects a move that is not in the legal set for `color`.
    pub fn validate_move(&self, board: &Board, color: Color, mv: Move) -> Result<(), MoveError> {
        if self.generate_moves(board, color).contains(&mv) {
            Ok(())
        } else {
            trace!(%mv, %color, "rejected illegal move");
            Err(MoveError::Illegal {
                from: mv.from(),
                to: mv.to(),
            })
        }
    }

    pub fn is_checkmate(&self, board: &Board, color: Color) -> bool {
        self.is_king_in_check(board, color) && self.generate_moves(board, color).is_empty()
    }

    pub fn is_stalemate(&self, board: &Board, color: Color) -> bool {
        !self.is_king_in_check(board, color) && self.generate_moves(board, color).is_empty()
    }

    pub fn get_game_state(&self, board: &Board, to_move: Color) -> GameState {
        if self.generate_moves(board, to_move).is_empty() {
            if self.is_king_in_check(board, to_move) {
                // Checkmate - the side to move is in check and has no legal moves
                return GameState::Checkmate {
                    winner: to_move.opposite(),
                };
            }
            return GameState::Stalemate;
        }
        if self.is_insufficient_material(board) {
            return GameState::InsufficientMaterial;
        }
        GameState::Ongoing
    }

    fn is_insufficient_material(&self, board: &Board) -> bool {
        let (white, black) = count_non_kings(board);
        match (white.as_slice(), black.as_slice()) {
            // King vs King
            ([], []) => true,
            // King and a minor piece vs King
            ([PieceKind::Bishop | PieceKind::Knight], []) => true,
            ([], [PieceKind::Bishop | PieceKind::Knight]) => true,
            _ => false,
        }
    }
}

fn count_non_kings(board: &Board) -> (Vec<PieceKind>, Vec<PieceKind>) {
    let mut white = Vec::new();
    let mut black = Vec::new();
    for (_, piece) in board.pieces() {
        if piece.kind == PieceKind::King {
            continue;
        }
        match piece.color {
            Color::White => white.push(piece.kind),
            Color::Black => black.push(piece.kind),
        }
    }
    (white, black)
}

fn is_unmoved(board: &Board, square: Square, kind: PieceKind, color: Color) -> bool {
    board
        .get(square)
        .map_or(false, |piece| piece.kind == kind && piece.color == color && !piece.has_moved)
}

fn kings_adjacent(board: &Board) -> bool {
    match (board.king_square(Color::White), board.king_square(Color::Black)) {
        (Some(white), Some(black)) => {
            (white.file() - black.file()).abs() <= 1 && (white.rank() - black.rank()).abs() <= 1
        }
        _ => false,
    }
}

/// Squares a piece could possibly reach from `from`, before occupancy checks.
fn candidate_targets(kind: PieceKind, color: Color, from: Square) -> Vec<Square> {
    match kind {
        PieceKind::Pawn => {
            let f = color.forward();
            offsets(from, &[(0, f), (0, 2 * f), (-1, f), (1, f)])
        }
        PieceKind::Knight => offsets(from, &KNIGHT_OFFSETS),
        PieceKind::King => offsets(from, &KING_OFFSETS),
        PieceKind::Bishop => rays(from, &DIAGONALS),
        PieceKind::Rook => rays(from, &ORTHOGONALS),
        PieceKind::Queen => {
            let mut targets = rays(from, &DIAGONALS);
            targets.extend(rays(from, &ORTHOGONALS));
            targets
        }
    }
}

fn offsets(from: Square, table: &[(i8, i8)]) -> Vec<Square> {
    table
        .iter()
        .filter_map(|&(df, dr)| from.offset(df, dr))
        .collect()
}

fn rays(from: Square, directions: &[(i8, i8)]) -> Vec<Square> {
    directions
        .iter()
        .flat_map(|&(df, dr)| (1..8).map_while(move |n| from.offset(df * n, dr * n)))
        .collect()
}

/// Legal moves for `color` under the default rules.
pub fn generate_legal_moves(color: Color, board: &Board) -> Vec<Move> {
    MoveGenerator::new().generate_moves(board, color)
}

pub fn is_in_check(color: Color, board: &Board) -> bool {
    MoveGenerator::new().is_king_in_check(board, color)
}

pub fn is_checkmate(color: Color, board: &Board) -> bool {
    MoveGenerator::new().is_checkmate(board, color)
}
