use std::fmt;

use crate::error::BoardError;
use crate::movegen::Move;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        }
    }

    pub fn from_name(name: &str) -> Option<PieceKind> {
        PieceKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Sliding pieces are the ones whose moves need a clear path.
    pub fn slides(self) -> bool {
        matches!(self, PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen)
    }

    fn symbol(self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank direction pawns of this color advance in.
    pub fn forward(&self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub fn home_rank(&self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => 8,
        }
    }

    pub fn promotion_rank(&self) -> i8 {
        self.opposite().home_rank()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }

    pub fn from_name(name: &str) -> Option<Color> {
        match name {
            "white" => Some(Color::White),
            "black" => Some(Color::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A board coordinate, 1-indexed: `file` a..h maps to 1..8, `rank` 1..8.
///
/// A `Square` is always on the board; construction validates the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    file: i8,
    rank: i8,
}

impl Square {
    pub fn new(file: i8, rank: i8) -> Result<Self, BoardError> {
        if Self::on_board(file, rank) {
            Ok(Self { file, rank })
        } else {
            Err(BoardError::OffBoard { file, rank })
        }
    }

    pub fn on_board(file: i8, rank: i8) -> bool {
        (1..=8).contains(&file) && (1..=8).contains(&rank)
    }

    /// Shorthand for literal coordinates known to be on the board.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are off the board.
    pub fn at(file: i8, rank: i8) -> Self {
        match Self::new(file, rank) {
            Ok(square) => square,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn file(&self) -> i8 {
        self.file
    }

    pub fn rank(&self) -> i8 {
        self.rank
    }

    /// The square `(df, dr)` away, or `None` past the edge.
    pub fn offset(&self, df: i8, dr: i8) -> Option<Square> {
        Square::new(self.file + df, self.rank + dr).ok()
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (1..=8).flat_map(|file| (1..=8).map(move |rank| Square { file, rank }))
    }

    fn index(&self) -> (usize, usize) {
        ((self.file - 1) as usize, (self.rank - 1) as usize)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let file = (b'a' + (self.file - 1) as u8) as char;
        write!(f, "{}{}", file, self.rank)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    pub has_moved: bool,
    /// Only meaningful for pawns: set on a double step, cleared when its
    /// own side moves again.
    pub en_passant: bool,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self {
            kind,
            color,
            has_moved: false,
            en_passant: false,
        }
    }

    pub fn moved(mut self) -> Self {
        self.has_moved = true;
        self
    }

    fn symbol(&self) -> char {
        match self.color {
            Color::White => self.kind.symbol(),
            Color::Black => self.kind.symbol().to_ascii_lowercase(),
        }
    }
}

/// An 8x8 grid of optional pieces, indexed `[file][rank]`.
///
/// The side to move is not part of the board; callers pass it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Board {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard initial position.
    pub fn new() -> Self {
        let mut board = Self::empty();
        for (file, kind) in (1..=8).zip(BACK_RANK) {
            board.set(Square::at(file, 1), Some(Piece::new(kind, Color::White)));
            board.set(Square::at(file, 2), Some(Piece::new(PieceKind::Pawn, Color::White)));
            board.set(Square::at(file, 7), Some(Piece::new(PieceKind::Pawn, Color::Black)));
            board.set(Square::at(file, 8), Some(Piece::new(kind, Color::Black)));
        }
        board
    }

    pub fn get(&self, square: Square) -> Option<&Piece> {
        let (f, r) = square.index();
        self.squares[f][r].as_ref()
    }

    pub fn get_mut(&mut self, square: Square) -> Option<&mut Piece> {
        let (f, r) = square.index();
        self.squares[f][r].as_mut()
    }

    pub fn is_empty(&self, square: Square) -> bool {
        self.get(square).is_none()
    }

    /// Puts a piece on an empty square. Never overwrites.
    pub fn place(&mut self, square: Square, piece: Piece) -> Result<(), BoardError> {
        if !self.is_empty(square) {
            return Err(BoardError::Occupied { square });
        }
        self.set(square, Some(piece));
        Ok(())
    }

    pub fn take(&mut self, square: Square) -> Option<Piece> {
        let (f, r) = square.index();
        self.squares[f][r].take()
    }

    fn set(&mut self, square: Square, piece: Option<Piece>) {
        let (f, r) = square.index();
        self.squares[f][r] = piece;
    }

    /// Occupied squares in file-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, &Piece)> + '_ {
        Square::all().filter_map(move |square| self.get(square).map(|piece| (square, piece)))
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, piece)| piece.kind == PieceKind::King && piece.color == color)
            .map(|(square, _)| square)
    }

    /// Clears the en-passant flag of every pawn of `color`.
    pub fn clear_en_passant(&mut self, color: Color) {
        for column in self.squares.iter_mut() {
            for piece in column.iter_mut().flatten() {
                if piece.color == color {
                    piece.en_passant = false;
                }
            }
        }
    }

    /// Plays `mv` on this board. The move must have been produced for this
    /// board; an empty origin square is an internal invariant violation.
    pub fn apply_move(&mut self, mv: Move) {
        let from = mv.from();
        let color = match self.get(from) {
            Some(piece) => piece.color,
            None => panic!("no piece on {from} to play {mv:?}"),
        };

        // A new turn for `color` starts here
        self.clear_en_passant(color);

        match mv {
            Move::Advance { from, to } | Move::Capture { from, to } => {
                self.relocate(from, to);
                let double_step = (to.rank() - from.rank()).abs() == 2;
                if let Some(piece) = self.get_mut(to) {
                    if piece.kind == PieceKind::Pawn {
                        if double_step {
                            piece.en_passant = true;
                        }
                        if to.rank() == piece.color.promotion_rank() {
                            piece.kind = PieceKind::Queen;
                        }
                    }
                }
            }
            Move::CastleKingside {
                king_from,
                king_to,
                rook_from,
                rook_to,
            }
            | Move::CastleQueenside {
                king_from,
                king_to,
                rook_from,
                rook_to,
            } => {
                self.relocate(king_from, king_to);
                self.relocate(rook_from, rook_to);
            }
            Move::EnPassantLeft { from, to, captured }
            | Move::EnPassantRight { from, to, captured } => {
                self.take(captured);
                self.relocate(from, to);
            }
        }
    }

    fn relocate(&mut self, from: Square, to: Square) {
        let piece = self.take(from);
        debug_assert!(piece.is_some(), "relocating from empty square {from}");
        self.set(to, piece.map(Piece::moved));
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = String::new();
        for rank in (1..=8).rev() {
            for file in 1..=8 {
                match self.get(Square::at(file, rank)) {
                    Some(piece) => result.push(piece.symbol()),
                    None => result.push('.'),
                }
                if file < 8 {
                    result.push(' ');
                }
            }
            result.push('\n');
        }
        write!(f, "{}", result)
    }
}
