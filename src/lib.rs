//! Flank: a two-player custodial-capture game on a 7x7 board.
//!
//! Each side starts with four pieces. A turn is up to two single-cell
//! orthogonal steps by distinct pieces. A contiguous line of enemy pieces
//! enclosed between an own piece and another own piece (or the board edge) is
//! captured. The triangle is played by a minimax engine with alpha-beta
//! pruning; the circle is driven by the host.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry and engine parameters
//! - [`config`] - Game configuration and phase weight tables
//! - [`error`] - Error types
//! - [`board`] - Grid, legality and capture resolution
//! - [`eval`] - Static position evaluation
//! - [`search`] - Alpha-beta and minimax search
//! - [`game`] - Turn controller
//! - [`protocol`] - Text protocol for external front ends
//!
//! ## Example
//!
//! ```
//! use flank::config::GameConfig;
//! use flank::game::{Game, GameState};
//!
//! let config = GameConfig { depth: 2, ..GameConfig::default() };
//! let mut game = Game::new(config).unwrap();
//!
//! // The engine moves first.
//! let steps = game.play_automated_turn().unwrap();
//! assert_eq!(steps.len(), 2);
//! assert_eq!(game.state(), GameState::HumanTurn);
//! println!("{}", game.board());
//! ```

pub mod board;
pub mod config;
pub mod constants;
pub mod error;
pub mod eval;
pub mod game;
pub mod protocol;
pub mod search;

pub use board::{Board, Coord, Direction, EdgeFlank, Move, Side};
pub use config::{GameConfig, SecondMovePolicy};
pub use error::{GameError, GameResult, IllegalReason};
pub use game::{Game, GameEvent, GameState, Outcome};
