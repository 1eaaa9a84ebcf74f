//! Game configuration.
//!
//! All tunable settings live in [`GameConfig`]. Its `Default` uses the values
//! in [`crate::constants`]; [`GameConfig::validate`] must pass before a game
//! is built from it.

use std::collections::HashSet;

use crate::board::{Coord, EdgeFlank, Layout};
use crate::constants::{
    DEFAULT_DEPTH, EARLY_PHASE_END, EARLY_WEIGHTS, LATE_WEIGHTS, MID_PHASE_END, MID_WEIGHTS,
    MOVE_CAP, MOVES_PER_TURN, N,
};
use crate::error::{GameError, GameResult};

/// How the engine picks the moves after the first one in a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecondMovePolicy {
    /// One-ply lookahead with the evaluator.
    #[default]
    Greedy,
    /// Same depth as the first move.
    FullSearch,
}

/// Term weights for one game phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weights {
    pub material: i32,
    pub position: i32,
    pub mobility: i32,
    pub threats: i32,
    pub defense: i32,
    pub patterns: i32,
}

impl Weights {
    /// Build from `[material, position, mobility, threats, defense, patterns]`.
    pub const fn from_array(w: [i32; 6]) -> Self {
        Self {
            material: w[0],
            position: w[1],
            mobility: w[2],
            threats: w[3],
            defense: w[4],
            patterns: w[5],
        }
    }
}

/// Coarse game-progress bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Early,
    Mid,
    Late,
}

/// Phase thresholds and the weight vector used in each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTable {
    /// Turns below this are early.
    pub early_end: u32,
    /// Turns below this (and not early) are mid.
    pub mid_end: u32,
    pub early: Weights,
    pub mid: Weights,
    pub late: Weights,
}

impl Default for PhaseTable {
    fn default() -> Self {
        Self {
            early_end: EARLY_PHASE_END,
            mid_end: MID_PHASE_END,
            early: Weights::from_array(EARLY_WEIGHTS),
            mid: Weights::from_array(MID_WEIGHTS),
            late: Weights::from_array(LATE_WEIGHTS),
        }
    }
}

impl PhaseTable {
    pub fn phase(&self, total_moves: u32) -> Phase {
        if total_moves < self.early_end {
            Phase::Early
        } else if total_moves < self.mid_end {
            Phase::Mid
        } else {
            Phase::Late
        }
    }

    pub fn weights(&self, phase: Phase) -> &Weights {
        match phase {
            Phase::Early => &self.early,
            Phase::Mid => &self.mid,
            Phase::Late => &self.late,
        }
    }
}

/// Everything a game needs to know before the first move.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Must equal the compiled board size.
    pub board_size: usize,
    pub start_triangle: Vec<Coord>,
    pub start_circle: Vec<Coord>,
    /// Search depth in plies for the first decision of a turn.
    pub depth: u32,
    pub moves_per_turn: u32,
    /// Completed turns after which the game is decided on piece count.
    pub move_cap: u32,
    pub edge_flank: EdgeFlank,
    pub second_move: SecondMovePolicy,
    pub phases: PhaseTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        let layout = Layout::default();
        Self {
            board_size: N,
            start_triangle: layout.triangle,
            start_circle: layout.circle,
            depth: DEFAULT_DEPTH,
            moves_per_turn: MOVES_PER_TURN,
            move_cap: MOVE_CAP,
            edge_flank: EdgeFlank::default(),
            second_move: SecondMovePolicy::default(),
            phases: PhaseTable::default(),
        }
    }
}

impl GameConfig {
    /// Check the configuration, describing the first problem found.
    pub fn validate(&self) -> GameResult<()> {
        let invalid = |msg: String| Err(GameError::InvalidConfiguration(msg));

        if self.board_size != N {
            return invalid(format!(
                "board size {} unsupported, only {N} is available",
                self.board_size
            ));
        }
        if self.depth == 0 {
            return invalid("search depth must be positive".into());
        }
        if self.moves_per_turn == 0 {
            return invalid("moves per turn must be positive".into());
        }
        if self.move_cap == 0 {
            return invalid("move cap must be positive".into());
        }
        if self.start_triangle.is_empty() || self.start_circle.is_empty() {
            return invalid("each side needs at least one starting piece".into());
        }
        if self.start_triangle.len() != self.start_circle.len() {
            return invalid(format!(
                "sides start unevenly: {} triangles vs {} circles",
                self.start_triangle.len(),
                self.start_circle.len()
            ));
        }

        let mut seen = HashSet::new();
        for &c in self.start_triangle.iter().chain(&self.start_circle) {
            if c.x < 0 || c.y < 0 || c.x >= N as i32 || c.y >= N as i32 {
                return invalid(format!("starting cell {c} is off the board"));
            }
            if !seen.insert(c) {
                return invalid(format!("starting cell {c} is used twice"));
            }
        }

        if self.phases.early_end >= self.phases.mid_end {
            return invalid(format!(
                "phase thresholds must increase (early {} >= mid {})",
                self.phases.early_end, self.phases.mid_end
            ));
        }
        Ok(())
    }

    /// Starting placement for the board.
    pub fn layout(&self) -> Layout {
        Layout {
            triangle: self.start_triangle.clone(),
            circle: self.start_circle.clone(),
        }
    }
}
