//! Error types for rules, search and configuration.

use crate::board::{Coord, Side};

/// Why a step was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalReason {
    /// Origin or destination lies outside the board
    OutOfBounds,
    /// No piece at the origin
    EmptyOrigin,
    /// Destination already holds a piece
    Occupied,
    /// Destination is not one orthogonal step away
    NotAdjacent,
    /// The piece belongs to the other side
    WrongSide,
    /// The piece has already moved this turn
    AlreadyMoved,
}

impl std::fmt::Display for IllegalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IllegalReason::OutOfBounds => write!(f, "cell off the board"),
            IllegalReason::EmptyOrigin => write!(f, "no piece at origin"),
            IllegalReason::Occupied => write!(f, "destination not empty"),
            IllegalReason::NotAdjacent => write!(f, "destination not one step away"),
            IllegalReason::WrongSide => write!(f, "piece belongs to the opponent"),
            IllegalReason::AlreadyMoved => write!(f, "piece already moved this turn"),
        }
    }
}

/// Errors surfaced by the game core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// A step was rejected; the board is unchanged.
    #[error("Illegal move {from} -> {to}: {reason}")]
    IllegalMove {
        from: Coord,
        to: Coord,
        reason: IllegalReason,
    },

    /// The side has no legal step for the requested decision.
    #[error("No legal move for {side}")]
    NoLegalMove { side: Side },

    /// Rejected at game construction.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A command arrived for the side that is not on move.
    #[error("Not {side}'s turn")]
    NotYourTurn { side: Side },

    /// The game has already ended.
    #[error("Game is over")]
    GameOver,
}

/// Result type alias for game operations
pub type GameResult<T> = Result<T, GameError>;
