use crate::board::{Board, Color, PieceKind};

/// How the game ended at an evaluated leaf, seen from the scoring side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Terminal {
    #[default]
    None,
    /// The scoring side delivered checkmate
    Delivered,
    /// The scoring side was checkmated
    Suffered,
}

pub struct Evaluator {
    // Piece values
    pub pawn_value: i32,
    pub knight_value: i32,
    pub bishop_value: i32,
    pub rook_value: i32,
    pub queen_value: i32,

    pub checkmate_bonus: i32,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            pawn_value: 1,
            knight_value: 3,
            bishop_value: 3,
            rook_value: 5,
            queen_value: 9,
            checkmate_bonus: 100,
        }
    }

    /// Material balance from `color`'s point of view plus the checkmate bonus.
    pub fn evaluate(&self, board: &Board, color: Color, terminal: Terminal) -> i32 {
        let material: i32 = board
            .pieces()
            .map(|(_, piece)| {
                let value = self.get_piece_value(piece.kind);
                if piece.color == color {
                    value
                } else {
                    -value
                }
            })
            .sum();

        material
            + match terminal {
                Terminal::None => 0,
                Terminal::Delivered => self.checkmate_bonus,
                Terminal::Suffered => -self.checkmate_bonus,
            }
    }

    pub fn get_piece_value(&self, piece: PieceKind) -> i32 {
        match piece {
            PieceKind::Pawn => self.pawn_value,
            PieceKind::Knight => self.knight_value,
            PieceKind::Bishop => self.bishop_value,
            PieceKind::Rook => self.rook_value,
            PieceKind::Queen => self.queen_value,
            // The king is priceless; its loss is scored through `Terminal`
            PieceKind::King => 0,
        }
    }
}
