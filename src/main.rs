//! Flank: custodial-capture board game with a minimax opponent.
//!
//! ## Usage
//!
//! - `flank` - Play against the engine in the terminal
//! - `flank protocol` - Serve the text protocol on stdin/stdout
//! - `flank demo` - Watch the engine play a scripted opponent

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use flank::board::{parse_coord, parse_target, str_coord};
use flank::config::{GameConfig, SecondMovePolicy};
use flank::constants::{DEFAULT_DEPTH, MOVE_CAP, MOVES_PER_TURN};
use flank::game::{EngineMover, Game, GameEvent, GameState, Mover, RandomMover};
use flank::protocol::ProtocolEngine;
use flank::search::SearchEngine;
use flank::{EdgeFlank, GameError};

/// Flank: a custodial-capture board game engine
#[derive(Parser)]
#[command(name = "flank")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    game: GameArgs,

    /// Log search and turn details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct GameArgs {
    /// Search depth in plies
    #[arg(long, global = true, default_value_t = DEFAULT_DEPTH)]
    depth: u32,

    /// Steps allowed per turn
    #[arg(long, global = true, default_value_t = MOVES_PER_TURN)]
    moves_per_turn: u32,

    /// Completed turns before the game is decided on piece count
    #[arg(long, global = true, default_value_t = MOVE_CAP)]
    move_cap: u32,

    /// How the engine picks steps after the first in a turn
    #[arg(long, global = true, value_enum, default_value_t = SecondMoveArg::Greedy)]
    second_move: SecondMoveArg,

    /// Which pieces may use the board edge to close a flank
    #[arg(long, global = true, value_enum, default_value_t = EdgeFlankArg::Any)]
    edge_flank: EdgeFlankArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum SecondMoveArg {
    Greedy,
    Full,
}

#[derive(Clone, Copy, ValueEnum)]
enum EdgeFlankArg {
    Any,
    Mover,
    Off,
}

#[derive(Clone, Copy, ValueEnum)]
enum Opponent {
    Random,
    Engine,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the circle against the engine in the terminal
    Play,
    /// Serve the line protocol for external front ends
    Protocol,
    /// Let the engine play a full game against a scripted opponent
    Demo {
        /// Who plays the circle
        #[arg(long, value_enum, default_value_t = Opponent::Random)]
        opponent: Opponent,
        /// Seed for the random opponent
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
}

impl GameArgs {
    fn to_config(&self) -> GameConfig {
        GameConfig {
            depth: self.depth,
            moves_per_turn: self.moves_per_turn,
            move_cap: self.move_cap,
            second_move: match self.second_move {
                SecondMoveArg::Greedy => SecondMovePolicy::Greedy,
                SecondMoveArg::Full => SecondMovePolicy::FullSearch,
            },
            edge_flank: match self.edge_flank {
                EdgeFlankArg::Any => EdgeFlank::Any,
                EdgeFlankArg::Mover => EdgeFlank::Mover,
                EdgeFlankArg::Off => EdgeFlank::Off,
            },
            ..GameConfig::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = cli.game.to_config();

    match cli.command {
        Some(Commands::Protocol) => {
            let mut engine = ProtocolEngine::new(config).context("invalid game settings")?;
            engine.run().context("protocol i/o failed")?;
        }
        Some(Commands::Demo { opponent, seed }) => run_demo(config, opponent, seed)?,
        Some(Commands::Play) | None => run_console(config)?,
    }
    Ok(())
}

fn run_demo(config: GameConfig, opponent: Opponent, seed: u64) -> Result<()> {
    let mut game = Game::new(config.clone()).context("invalid game settings")?;
    let mut circle: Box<dyn Mover> = match opponent {
        Opponent::Random => Box::new(RandomMover::with_seed(seed)),
        Opponent::Engine => Box::new(EngineMover::new(SearchEngine::from_config(&config))),
    };
    info!(seed, "demo started");

    let outcome = game.run(circle.as_mut());
    print_events(&mut game);
    println!("{}", game.board());
    println!(
        "Result: {outcome} after {} turns (triangles {}, circles {})",
        game.total_moves(),
        game.triangles(),
        game.circles()
    );
    Ok(())
}

fn run_console(config: GameConfig) -> Result<()> {
    let mut game = Game::new(config).context("invalid game settings")?;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("You play O (circle). Enter `<cell> <direction|cell>`, `end`, or `quit`.");
    loop {
        match game.state() {
            GameState::GameOver => break,
            GameState::AutomatedTurn => {
                game.play_automated_turn()?;
                print_events(&mut game);
                continue;
            }
            GameState::HumanTurn => {}
        }

        println!("\n{}", game.board());
        print!(
            "turn {} | T {} O {} | {} step(s) left > ",
            game.total_moves() + 1,
            game.triangles(),
            game.circles(),
            game.moves_left()
        );
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => continue,
            ["quit" | "q"] => return Ok(()),
            ["end" | "pass"] => game.end_human_turn()?,
            [from, target] => {
                if let Err(err) = human_step(&mut game, from, target) {
                    println!("{err:#}");
                }
            }
            _ => println!("expected `<cell> <direction|cell>`"),
        }
        print_events(&mut game);
    }

    println!("\n{}", game.board());
    if let Some(outcome) = game.outcome() {
        println!("Game over: {outcome}");
    }
    Ok(())
}

fn human_step(game: &mut Game, from: &str, target: &str) -> Result<()> {
    let from_cell = parse_coord(from).with_context(|| format!("bad cell `{from}`"))?;
    let to_cell =
        parse_target(from_cell, target).with_context(|| format!("bad target `{target}`"))?;
    match game.attempt_human_move(from_cell, to_cell) {
        Ok(_) => Ok(()),
        Err(err @ GameError::IllegalMove { .. }) => Err(err.into()),
        Err(err) => Err(err).context("step refused"),
    }
}

fn print_events(game: &mut Game) {
    for event in game.drain_events() {
        match event {
            GameEvent::MoveApplied { side, mv, captured } => {
                let taken: Vec<String> = captured.iter().map(|&(c, _)| str_coord(c)).collect();
                if taken.is_empty() {
                    println!("{side}: {mv}");
                } else {
                    println!("{side}: {mv} captures {}", taken.join(" "));
                }
            }
            GameEvent::TurnEnded { .. } => {}
            GameEvent::GameOver { outcome } => println!("Game over: {outcome}"),
        }
    }
}
