//! Line-oriented text protocol for driving a game from another program.
//!
//! Each request is one line, optionally prefixed with a numeric id. Replies
//! start with `=` on success or `?` on failure, followed by the id if one was
//! given, and end with a blank line.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`
//! - `list_commands`, `known_command <cmd>`
//! - `quit`
//! - `reset` - Start a new game
//! - `showboard` - Print the board
//! - `status` - Side on move, counts and turn progress
//! - `move <from> <dir|to>` - Make a step for the circle, e.g. `move e1 up`
//!   or `move e1 d1`
//! - `endturn` - End the circle's turn early
//! - `genturn` - Let the engine play the triangle's turn
//!
//! ## Example
//!
//! ```text
//! 1 genturn
//! =1 a1-a2 g5-g4
//!
//! move a5 up
//! = ok
//! ```

use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::board::{Coord, Side, parse_coord, parse_target, str_coord};
use crate::config::GameConfig;
use crate::error::GameResult;
use crate::game::{Game, GameState};

const PROTOCOL_VERSION: &str = "1";

const KNOWN_COMMANDS: &[&str] = &[
    "endturn",
    "genturn",
    "known_command",
    "list_commands",
    "move",
    "name",
    "protocol_version",
    "quit",
    "reset",
    "showboard",
    "status",
    "version",
];

/// Protocol front end over a [`Game`].
pub struct ProtocolEngine {
    game: Game,
}

impl ProtocolEngine {
    pub fn new(config: GameConfig) -> GameResult<Self> {
        Ok(Self {
            game: Game::new(config)?,
        })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Serve requests from stdin until `quit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        self.serve(stdin.lock(), &mut stdout)
    }

    /// Serve requests from `input`, writing replies to `output`.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, output: &mut W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }

            let command = parts[0].to_lowercase();
            let args = &parts[1..];
            debug!(%command, ?args, "request");

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Split an optional numeric id off the front of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    /// Execute one command, returning (success, reply).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, PROTOCOL_VERSION.to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(cmd) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => (true, String::new()),

            "reset" => {
                self.game.reset();
                (true, String::new())
            }

            "showboard" => (true, format!("\n{}", self.game.board())),

            "status" => (true, self.status()),

            "move" => {
                if args.len() < 2 {
                    return (false, "usage: move <from> <direction|to>".to_string());
                }
                let Some(from) = parse_coord(args[0]) else {
                    return (false, format!("bad cell: {}", args[0]));
                };
                let Some(to) = parse_target(from, args[1]) else {
                    return (false, format!("bad target: {}", args[1]));
                };
                match self.game.attempt_human_move(from, to) {
                    Ok(report) if report.captured.is_empty() => (true, "ok".to_string()),
                    Ok(report) => (true, format!("captured {}", cells(&report.captured))),
                    Err(err) => (false, err.to_string()),
                }
            }

            "endturn" => match self.game.end_human_turn() {
                Ok(()) => (true, String::new()),
                Err(err) => (false, err.to_string()),
            },

            "genturn" => match self.game.play_automated_turn() {
                Ok(reports) if reports.is_empty() => (true, "pass".to_string()),
                Ok(reports) => {
                    let moves: Vec<String> = reports.iter().map(|r| r.mv.to_string()).collect();
                    (true, moves.join(" "))
                }
                Err(err) => (false, err.to_string()),
            },

            _ => (false, format!("unknown command: {command}")),
        }
    }

    fn status(&self) -> String {
        let game = &self.game;
        if let Some(outcome) = game.outcome() {
            return format!(
                "game over: {outcome} (triangles {} circles {} turns {})",
                game.triangles(),
                game.circles(),
                game.total_moves()
            );
        }
        let mover = match game.state() {
            GameState::AutomatedTurn => "engine",
            _ => "human",
        };
        format!(
            "{} to move ({mover}), {} left, triangles {} circles {} turns {}",
            game.current_side(),
            game.moves_left(),
            game.triangles(),
            game.circles(),
            game.total_moves()
        )
    }
}

fn cells(captured: &[(Coord, Side)]) -> String {
    captured
        .iter()
        .map(|&(c, _)| str_coord(c))
        .collect::<Vec<_>>()
        .join(" ")
}
