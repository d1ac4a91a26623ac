//! Per-square text records used to persist a board.
//!
//! Each occupied square becomes one line
//! `<file> <rank> <kind> <color> <has_moved>`, pawns append `<en_passant>`,
//! and the stream ends with a line holding `end`. For example:
//!
//! ```text
//! 2 4 pawn white true true
//! 5 1 king white false
//! end
//! ```

use std::fmt::Write as _;

use crate::board::{Board, Color, Piece, PieceKind, Square};
use crate::error::RecordError;

pub const SENTINEL: &str = "end";

pub fn write_records(board: &Board) -> String {
    let mut out = String::new();
    for (square, piece) in board.pieces() {
        // Writing into a String cannot fail
        let _ = write!(
            out,
            "{} {} {} {} {}",
            square.file(),
            square.rank(),
            piece.kind.name(),
            piece.color.name(),
            piece.has_moved
        );
        if piece.kind == PieceKind::Pawn {
            let _ = write!(out, " {}", piece.en_passant);
        }
        out.push('\n');
    }
    out.push_str(SENTINEL);
    out.push('\n');
    out
}

pub fn parse_records(input: &str) -> Result<Board, RecordError> {
    let mut board = Board::empty();
    let mut lines = input.lines().enumerate().map(|(index, text)| (index + 1, text.trim()));

    while let Some((line, text)) = lines.next() {
        if text.is_empty() {
            continue;
        }
        if text == SENTINEL {
            if let Some((line, _)) = lines.find(|(_, rest)| !rest.is_empty()) {
                return Err(RecordError::TrailingContent { line });
            }
            return Ok(board);
        }
        let (square, piece) = parse_line(line, text)?;
        board.place(square, piece)?;
    }

    Err(RecordError::MissingSentinel)
}

fn parse_line(line: usize, text: &str) -> Result<(Square, Piece), RecordError> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() < 5 {
        return Err(RecordError::FieldCount {
            line,
            expected: 5,
            found: fields.len(),
        });
    }

    let file = parse_coordinate(line, "file", fields[0])?;
    let rank = parse_coordinate(line, "rank", fields[1])?;
    let square = Square::new(file, rank)?;
    let kind = PieceKind::from_name(fields[2]).ok_or_else(|| invalid(line, "piece kind", fields[2]))?;
    let color = Color::from_name(fields[3]).ok_or_else(|| invalid(line, "color", fields[3]))?;
    let has_moved = parse_flag(line, "has_moved", fields[4])?;

    let expected = if kind == PieceKind::Pawn { 6 } else { 5 };
    if fields.len() != expected {
        return Err(RecordError::FieldCount {
            line,
            expected,
            found: fields.len(),
        });
    }
    let en_passant = match fields.get(5) {
        Some(value) => parse_flag(line, "en_passant", value)?,
        None => false,
    };

    Ok((
        square,
        Piece {
            kind,
            color,
            has_moved,
            en_passant,
        },
    ))
}

fn parse_coordinate(line: usize, field: &'static str, value: &str) -> Result<i8, RecordError> {
    value.parse::<i8>().map_err(|_| invalid(line, field, value))
}

fn parse_flag(line: usize, field: &'static str, value: &str) -> Result<bool, RecordError> {
    value.parse::<bool>().map_err(|_| invalid(line, field, value))
}

fn invalid(line: usize, field: &'static str, value: &str) -> RecordError {
    RecordError::InvalidField {
        line,
        field,
        value: value.to_string(),
    }
}
