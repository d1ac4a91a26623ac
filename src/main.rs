use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use minimax_chess::game::{Match, Outcome, Player};
use minimax_chess::movegen::RuleOptions;
use minimax_chess::record::write_records;
use minimax_chess::search::SearchConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PlayerKind {
    Engine,
    Random,
    /// Moves typed on stdin as `e2e4`
    Human,
}

#[derive(Parser, Debug)]
#[command(about = "Plays a chess match between automated players", author, version)]
struct CmdArgs {
    /// Search depth in plies for engine players
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    depth: u32,

    #[arg(long, value_enum, default_value_t = PlayerKind::Engine)]
    white: PlayerKind,

    #[arg(long, value_enum, default_value_t = PlayerKind::Random)]
    black: PlayerKind,

    /// Stop after this many plies
    #[arg(long, default_value_t = 200)]
    max_moves: usize,

    /// Seed for random players
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Write the final board as per-square records
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// Expand only the searching side's own moves at every ply
    #[arg(long)]
    legacy_expansion: bool,

    /// Allow castling out of and through check
    #[arg(long)]
    lenient_castling: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = CmdArgs::parse();
    let rules = RuleOptions {
        strict_castling: !args.lenient_castling,
    };
    let config = SearchConfig {
        depth: args.depth,
        alternate_sides: !args.legacy_expansion,
        rules,
    };
    let make_player = |kind: PlayerKind, seed: u64| match kind {
        PlayerKind::Engine => Player::engine(config),
        PlayerKind::Random => Player::random(seed),
        PlayerKind::Human => Player::Human,
    };

    let mut game = Match::new(
        make_player(args.white, args.seed),
        make_player(args.black, args.seed.wrapping_add(1)),
        rules,
    );
    let outcome = play(&mut game, args.max_moves)?;

    println!("{}", game.board());
    match outcome {
        Outcome::Checkmate { winner } => println!("Checkmate, {winner} wins"),
        Outcome::Stalemate => println!("Stalemate"),
        Outcome::InsufficientMaterial => println!("Draw by insufficient material"),
        Outcome::Forfeit { loser } => println!("{loser} has no move and forfeits"),
        Outcome::MoveLimit => println!("Stopped after {} plies", game.history().len()),
    }

    if let Some(path) = args.save {
        fs::write(&path, write_records(game.board()))
            .with_context(|| format!("failed to write records to {}", path.display()))?;
        info!(path = %path.display(), "saved final position");
    }

    Ok(())
}

/// Runs the match, reading a line from stdin whenever a human is to move.
/// End of input forfeits for the human.
fn play(game: &mut Match, max_moves: usize) -> Result<Outcome> {
    let mut lines = io::stdin().lock().lines();
    while game.history().len() < max_moves {
        if game.outcome().is_none() && game.awaits_human() {
            println!("{}", game.board());
            print!("{} to move: ", game.to_move());
            io::stdout().flush()?;
            if let Some(line) = lines.next() {
                let text = line.context("failed to read move from stdin")?;
                if let Err(err) = game.parse_move(&text).and_then(|mv| game.play_move(mv)) {
                    println!("{err}");
                }
                continue;
            }
        }
        if let Some(outcome) = game.step() {
            return Ok(outcome);
        }
    }
    Ok(game.outcome().unwrap_or(Outcome::MoveLimit))
}
