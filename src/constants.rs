//! Constants for board geometry, turn structure, search and evaluation.
//!
//! Every value here is a documented default. Runtime settings are gathered in
//! [`crate::config::GameConfig`], whose `Default` implementation reads these.

// =============================================================================
// Board Geometry
// =============================================================================

/// Board side length (NxN).
pub const N: usize = 7;

/// Number of pieces each side starts with.
pub const PIECES_PER_SIDE: usize = 4;

/// Starting cells of the automated side ("triangle"), as (row, column).
pub const START_TRIANGLE: [(usize, usize); PIECES_PER_SIDE] = [(0, 0), (2, 0), (4, 6), (6, 6)];

/// Starting cells of the human side ("circle"), as (row, column).
pub const START_CIRCLE: [(usize, usize); PIECES_PER_SIDE] = [(4, 0), (6, 0), (0, 6), (2, 6)];

// =============================================================================
// Turn Structure
// =============================================================================

/// Pieces a side may move per turn, one step each.
pub const MOVES_PER_TURN: u32 = 2;

/// Completed turns after which the game ends on piece count.
pub const MOVE_CAP: u32 = 50;

// =============================================================================
// Search Parameters
// =============================================================================

/// Default lookahead depth in plies for the first decision of a turn.
pub const DEFAULT_DEPTH: u32 = 3;

// =============================================================================
// Evaluation: Game Phases
// =============================================================================

/// Turns below this count are the early phase.
pub const EARLY_PHASE_END: u32 = 15;

/// Turns below this count (and not early) are the middle phase.
pub const MID_PHASE_END: u32 = 35;

/// Defense is amplified once more than this many turns have elapsed.
pub const DEFENSE_LATE_AFTER: u32 = 35;

/// Per-phase term weights, in order:
/// material, position, mobility, threats, defense, patterns.
pub const EARLY_WEIGHTS: [i32; 6] = [10, 4, 3, 5, 4, 1];
pub const MID_WEIGHTS: [i32; 6] = [12, 3, 2, 6, 5, 1];
pub const LATE_WEIGHTS: [i32; 6] = [16, 2, 1, 8, 6, 1];

// =============================================================================
// Evaluation: Term Constants
// =============================================================================

/// Material is amplified when this many pieces or fewer remain in total.
pub const ENDGAME_PIECES: u32 = 4;

/// Multiplier applied to material in the endgame.
pub const ENDGAME_MATERIAL_SCALE: f64 = 1.5;

/// Multiplier applied to defense late in the game.
pub const LATE_DEFENSE_SCALE: f64 = 1.5;

/// Score for a side that cannot move any piece. Applied unweighted.
pub const IMMOBILE_SCORE: f64 = 1000.0;

/// Weight of a threat that a single further step completes.
pub const IMMEDIATE_THREAT_WEIGHT: f64 = 2.0;

/// Weight of an open flank with no piece ready to close it.
pub const POTENTIAL_THREAT_WEIGHT: f64 = 1.0;

/// Bonus per piece standing in the central block.
pub const CENTER_BONUS: f64 = 2.0;

/// Bonus per piece standing on the board edge.
pub const EDGE_BONUS: f64 = 1.0;

/// The 2x2 central block rewarded by the pattern term. Contains the true center (3,3).
pub const CENTER_BLOCK: [(usize, usize); 4] = [(2, 2), (2, 3), (3, 2), (3, 3)];

/// Center-weighted positional table, peak at the true center.
pub const POSITION_WEIGHTS: [[i32; N]; N] = [
    [1, 1, 1, 1, 1, 1, 1],
    [1, 2, 2, 2, 2, 2, 1],
    [1, 2, 3, 3, 3, 2, 1],
    [1, 2, 3, 4, 3, 2, 1],
    [1, 2, 3, 3, 3, 2, 1],
    [1, 2, 2, 2, 2, 2, 1],
    [1, 1, 1, 1, 1, 1, 1],
];

// =============================================================================
// Direction Offsets
// =============================================================================

/// Orthogonal offsets as (row delta, column delta).
/// Order: Up, Down, Left, Right
pub const DELTA: [(i32, i32); 4] = [
    (-1, 0), // Up (towards row 0)
    (1, 0),  // Down
    (0, -1), // Left (towards column 0)
    (0, 1),  // Right
];

// =============================================================================
// Piece Glyphs
// =============================================================================

/// Automated side's piece.
pub const GLYPH_TRIANGLE: char = 'T';

/// Human side's piece.
pub const GLYPH_CIRCLE: char = 'O';

/// Empty cell.
pub const GLYPH_EMPTY: char = '.';
