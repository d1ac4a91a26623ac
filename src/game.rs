//! A match between two automated players.
//!
//! `Match` owns the turn order and the end-of-game decision; it calls into
//! the stateless rules and search modules and never performs I/O itself.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use crate::board::{Board, Color, Square};
use crate::error::MoveError;
use crate::movegen::{GameState, Move, MoveGenerator, RuleOptions};
use crate::search::{Search, SearchConfig};

pub enum Player {
    Engine(Search),
    /// Plays a uniformly random legal move
    Random(StdRng),
    /// Moves arrive through [`Match::play_move`]; `step` treats a human to
    /// move as having nothing to play.
    Human,
}

impl Player {
    pub fn engine(config: SearchConfig) -> Self {
        Player::Engine(Search::with_config(config))
    }

    pub fn random(seed: u64) -> Self {
        Player::Random(StdRng::seed_from_u64(seed))
    }

    fn choose(&mut self, board: &Board, color: Color, generator: &MoveGenerator) -> Option<Move> {
        match self {
            Player::Engine(search) => search.choose_move(board, color),
            Player::Random(rng) => generator.generate_moves(board, color).choose(rng).copied(),
            Player::Human => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    /// A player had legal moves on the board but returned none
    Forfeit { loser: Color },
    MoveLimit,
}

pub struct Match {
    board: Board,
    to_move: Color,
    white: Player,
    black: Player,
    history: Vec<Move>,
    move_generator: MoveGenerator,
}

impl Match {
    pub fn new(white: Player, black: Player, rules: RuleOptions) -> Self {
        Self::from_position(Board::new(), Color::White, white, black, rules)
    }

    pub fn from_position(
        board: Board,
        to_move: Color,
        white: Player,
        black: Player,
        rules: RuleOptions,
    ) -> Self {
        Self {
            board,
            to_move,
            white,
            black,
            history: Vec::new(),
            move_generator: MoveGenerator::with_options(rules),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Color {
        self.to_move
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Whether the side to move is seated by a human.
    pub fn awaits_human(&self) -> bool {
        let player = match self.to_move {
            Color::White => &self.white,
            Color::Black => &self.black,
        };
        matches!(player, Player::Human)
    }

    /// Plays `mv` for the side to move after checking it is legal.
    pub fn play_move(&mut self, mv: Move) -> Result<(), MoveError> {
        self.move_generator.validate_move(&self.board, self.to_move, mv)?;
        self.commit(mv);
        Ok(())
    }

    fn commit(&mut self, mv: Move) {
        let color = self.to_move;
        let promotion = mv.is_promotion(&self.board);
        self.board.apply_move(mv);
        self.history.push(mv);
        self.to_move = color.opposite();
        info!(ply = self.history.len(), %color, %mv, promotion, "move played");
    }

    /// Reads coordinate text such as `e2e4` as one of the legal moves of
    /// the side to move. Castling is written as the king's move.
    pub fn parse_move(&self, text: &str) -> Result<Move, MoveError> {
        let unparsable = || MoveError::Unparsable {
            text: text.to_string(),
        };
        let bytes = text.trim().as_bytes();
        if bytes.len() != 4 {
            return Err(unparsable());
        }
        let square = |file: u8, rank: u8| -> Option<Square> {
            let file = file.checked_sub(b'a')? as i8 + 1;
            let rank = rank.checked_sub(b'1')? as i8 + 1;
            Square::new(file, rank).ok()
        };
        let from = square(bytes[0], bytes[1]).ok_or_else(unparsable)?;
        let to = square(bytes[2], bytes[3]).ok_or_else(unparsable)?;

        self.move_generator
            .generate_moves(&self.board, self.to_move)
            .into_iter()
            .find(|mv| mv.from() == from && mv.to() == to)
            .ok_or(MoveError::Illegal { from, to })
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.move_generator.get_game_state(&self.board, self.to_move) {
            GameState::Ongoing => None,
            GameState::Checkmate { winner } => Some(Outcome::Checkmate { winner }),
            GameState::Stalemate => Some(Outcome::Stalemate),
            GameState::InsufficientMaterial => Some(Outcome::InsufficientMaterial),
        }
    }

    /// Lets the side to move play one move, or reports how the game ended.
    pub fn step(&mut self) -> Option<Outcome> {
        if let Some(outcome) = self.outcome() {
            return Some(outcome);
        }
        let color = self.to_move;
        let player = match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        };
        let Some(mv) = player.choose(&self.board, color, &self.move_generator) else {
            return Some(Outcome::Forfeit { loser: color });
        };

        self.commit(mv);
        None
    }

    /// Plays until the game ends or `max_moves` plies have been made.
    pub fn run(&mut self, max_moves: usize) -> Outcome {
        while self.history.len() < max_moves {
            if let Some(outcome) = self.step() {
                return outcome;
            }
        }
        self.outcome().unwrap_or(Outcome::MoveLimit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Piece, PieceKind};

    #[test]
    fn parse_and_play_moves() {
        let mut game = Match::new(Player::random(1), Player::random(2), RuleOptions::default());
        let mv = game.parse_move("e2e4").unwrap();
        assert_eq!(
            mv,
            Move::Advance {
                from: Square::at(5, 2),
                to: Square::at(5, 4),
            }
        );
        game.play_move(mv).unwrap();
        assert_eq!(game.to_move(), Color::Black);
        assert_eq!(game.history(), &[mv]);

        assert!(matches!(game.parse_move("e2e4"), Err(MoveError::Illegal { .. })));
        assert!(matches!(game.parse_move("e9e4"), Err(MoveError::Unparsable { .. })));
        assert!(matches!(game.parse_move("castle"), Err(MoveError::Unparsable { .. })));
    }

    #[test]
    fn illegal_move_is_rejected_without_changing_the_game() {
        let mut game = Match::new(Player::random(1), Player::random(2), RuleOptions::default());
        let jump = Move::Advance {
            from: Square::at(5, 2),
            to: Square::at(5, 5),
        };
        assert!(game.play_move(jump).is_err());
        assert_eq!(game.board(), &Board::new());
        assert_eq!(game.to_move(), Color::White);
    }

    #[test]
    fn human_moves_through_play_move() {
        let mut game = Match::new(Player::Human, Player::random(3), RuleOptions::default());
        assert!(game.awaits_human());

        let mv = game.parse_move("g1f3").unwrap();
        game.play_move(mv).unwrap();
        assert!(!game.awaits_human());
        assert_eq!(game.step(), None);
        assert!(game.awaits_human());
        assert_eq!(game.history().len(), 2);

        // A human with no input forfeits when stepped
        assert_eq!(game.step(), Some(Outcome::Forfeit { loser: Color::White }));
        assert_eq!(game.history().len(), 2);
    }

    #[test]
    fn random_match_ends_within_limit() {
        let mut game = Match::new(Player::random(7), Player::random(8), RuleOptions::default());
        let outcome = game.run(60);
        assert!(game.history().len() <= 60);
        if outcome == Outcome::MoveLimit {
            assert_eq!(game.history().len(), 60);
        }
    }

    #[test]
    fn engine_delivers_mate_in_one() {
        let mut board = Board::empty();
        let mut put = |file, rank, kind, color| {
            board.place(Square::at(file, rank), Piece::new(kind, color)).unwrap();
        };
        put(7, 1, PieceKind::King, Color::White);
        put(1, 1, PieceKind::Rook, Color::White);
        put(8, 8, PieceKind::King, Color::Black);
        put(7, 7, PieceKind::Pawn, Color::Black);
        put(8, 7, PieceKind::Pawn, Color::Black);

        let config = SearchConfig {
            depth: 1,
            ..SearchConfig::default()
        };
        let mut game = Match::from_position(
            board,
            Color::White,
            Player::engine(config),
            Player::engine(config),
            RuleOptions::default(),
        );
        assert_eq!(game.run(10), Outcome::Checkmate { winner: Color::White });
        assert_eq!(game.history().len(), 1);
    }
}
