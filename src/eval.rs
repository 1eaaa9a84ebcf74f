//! Static evaluation of board positions.
//!
//! Scores are always from the triangle's point of view: positive favors the
//! triangle, negative favors the circle. Every term is computed for both
//! sides and differenced, then the terms are combined with the weight vector
//! of the current game phase:
//! - Material, amplified in the endgame
//! - Positional control from a center-weighted table
//! - Mobility, replaced by a large fixed score when a side cannot move
//! - Capture threats (flanks one step from closing, and open flanks)
//! - Defense (own pieces exposed to such threats), amplified late
//! - Pattern bonuses for the central block and the board edge

use crate::board::{Board, Coord, Direction, Side};
use crate::config::{PhaseTable, Weights};
use crate::constants::{
    CENTER_BLOCK, CENTER_BONUS, DEFENSE_LATE_AFTER, EDGE_BONUS, ENDGAME_MATERIAL_SCALE,
    ENDGAME_PIECES, IMMEDIATE_THREAT_WEIGHT, IMMOBILE_SCORE, LATE_DEFENSE_SCALE, MOVES_PER_TURN,
    N, POSITION_WEIGHTS, POTENTIAL_THREAT_WEIGHT,
};

/// Where the game stands within the turn structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnContext {
    /// Completed turns so far.
    pub total_moves: u32,
    /// Side to move.
    pub side: Side,
    /// Steps already taken this turn.
    pub moves_used: u32,
    pub moves_per_turn: u32,
}

impl TurnContext {
    pub fn new(moves_per_turn: u32) -> Self {
        Self {
            total_moves: 0,
            side: Side::Triangle,
            moves_used: 0,
            moves_per_turn,
        }
    }
}

impl Default for TurnContext {
    fn default() -> Self {
        Self::new(MOVES_PER_TURN)
    }
}

/// Raw, unweighted term values for one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Terms {
    pub material: f64,
    pub position: f64,
    /// Linear mobility difference, or the immobilization score.
    pub mobility: f64,
    /// Set when `mobility` holds the immobilization score.
    pub immobile: bool,
    pub threats: f64,
    pub defense: f64,
    pub patterns: f64,
}

impl Terms {
    /// Weighted sum. An immobilization score is added unweighted.
    pub fn combine(&self, w: &Weights) -> f64 {
        let mobility = if self.immobile {
            self.mobility
        } else {
            self.mobility * w.mobility as f64
        };
        self.material * w.material as f64
            + self.position * w.position as f64
            + mobility
            + self.threats * w.threats as f64
            + self.defense * w.defense as f64
            + self.patterns * w.patterns as f64
    }
}

/// Phase-weighted position evaluator. Reads the board, never changes it.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    phases: PhaseTable,
}

impl Evaluator {
    pub fn new(phases: PhaseTable) -> Self {
        Self { phases }
    }

    pub fn phases(&self) -> &PhaseTable {
        &self.phases
    }

    /// Score `board` from the triangle's point of view.
    #[must_use]
    pub fn evaluate(&self, board: &Board, ctx: &TurnContext) -> f64 {
        let weights = self.phases.weights(self.phases.phase(ctx.total_moves));
        terms(board, ctx).combine(weights)
    }
}

/// Compute every term for `board`.
pub fn terms(board: &Board, ctx: &TurnContext) -> Terms {
    let (mobility, immobile) = mobility(board);
    let tri = flank_threats(board, Side::Triangle);
    let cir = flank_threats(board, Side::Circle);

    let threats = tri.weighted() - cir.weighted();

    // Pieces exposed to the triangle's flanks are circles, and vice versa.
    let mut defense = tri.exposed as f64 - cir.exposed as f64;
    if ctx.total_moves > DEFENSE_LATE_AFTER {
        defense *= LATE_DEFENSE_SCALE;
    }

    Terms {
        material: material(board),
        position: positional(board, Side::Triangle) - positional(board, Side::Circle),
        mobility,
        immobile,
        threats,
        defense,
        patterns: patterns(board, Side::Triangle) - patterns(board, Side::Circle),
    }
}

/// Piece difference, amplified when few pieces remain.
pub fn material(board: &Board) -> f64 {
    let diff = board.triangles() as f64 - board.circles() as f64;
    if board.triangles() + board.circles() <= ENDGAME_PIECES {
        diff * ENDGAME_MATERIAL_SCALE
    } else {
        diff
    }
}

/// Sum of the positional table over `side`'s pieces.
pub fn positional(board: &Board, side: Side) -> f64 {
    board
        .pieces(side)
        .map(|c| POSITION_WEIGHTS[c.x as usize][c.y as usize] as f64)
        .sum()
}

/// Mobility difference, or `±IMMOBILE_SCORE` when exactly one side is stuck.
///
/// The flag is set when the immobilization score was used.
pub fn mobility(board: &Board) -> (f64, bool) {
    let tri = board.mobility(Side::Triangle);
    let cir = board.mobility(Side::Circle);
    match (tri, cir) {
        (0, 0) => (0.0, false),
        (0, _) => (-IMMOBILE_SCORE, true),
        (_, 0) => (IMMOBILE_SCORE, true),
        _ => (tri as f64 - cir as f64, false),
    }
}

/// Capture threats held by one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreatScan {
    /// Open flanks that another own piece can close with one step.
    pub immediate: u32,
    /// Open flanks with no piece ready to close them.
    pub potential: u32,
    /// Distinct enemy pieces inside immediate threats.
    pub exposed: u32,
}

impl ThreatScan {
    pub fn weighted(&self) -> f64 {
        self.immediate as f64 * IMMEDIATE_THREAT_WEIGHT
            + self.potential as f64 * POTENTIAL_THREAT_WEIGHT
    }
}

/// Scan every flank `attacker` has started.
///
/// From each attacker piece and direction, follow the run of enemy pieces.
/// If it ends on an empty cell, the flank is open: immediate when some other
/// attacker piece stands next to that cell, potential otherwise. Runs ending
/// on the board edge or an own piece are already resolved and not counted.
pub fn flank_threats(board: &Board, attacker: Side) -> ThreatScan {
    let enemy = attacker.opponent();
    let mut scan = ThreatScan::default();
    let mut exposed = [[false; N]; N];

    for origin in board.pieces(attacker) {
        for dir in Direction::ALL {
            let mut end = origin.step(dir);
            let mut run = 0;
            while board.get(end) == Some(enemy) {
                run += 1;
                end = end.step(dir);
            }
            if run == 0 || !board.is_valid_position(end) || board.get(end).is_some() {
                continue;
            }

            if has_closer(board, end, attacker) {
                scan.immediate += 1;
                let mut c = origin.step(dir);
                for _ in 0..run {
                    exposed[c.x as usize][c.y as usize] = true;
                    c = c.step(dir);
                }
            } else {
                scan.potential += 1;
            }
        }
    }

    scan.exposed = exposed.iter().flatten().filter(|&&e| e).count() as u32;
    scan
}

/// Whether an `attacker` piece can step into `cell`.
fn has_closer(board: &Board, cell: Coord, attacker: Side) -> bool {
    Direction::ALL
        .into_iter()
        .any(|dir| board.get(cell.step(dir)) == Some(attacker))
}

/// Central block and edge bonuses for `side`.
pub fn patterns(board: &Board, side: Side) -> f64 {
    let center = CENTER_BLOCK
        .iter()
        .filter(|&&c| board.get(c.into()) == Some(side))
        .count() as f64;
    let edge = board.pieces(side).filter(|c| c.is_edge()).count() as f64;
    center * CENTER_BONUS + edge * EDGE_BONUS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32, y: i32) -> Coord {
        Coord::new(x, y)
    }

    #[test]
    fn test_initial_position_balanced() {
        let board = Board::new();
        let ctx = TurnContext::default();
        let t = terms(&board, &ctx);
        assert_eq!(t.material, 0.0);
        assert_eq!(t.position, 0.0);
        assert_eq!(t.patterns, 0.0);
        assert!(!t.immobile);
    }

    #[test]
    fn test_material_endgame_scaling() {
        let mut board = Board::empty();
        board.place(c(0, 0), Side::Triangle);
        board.place(c(0, 2), Side::Triangle);
        board.place(c(6, 6), Side::Circle);
        assert_eq!(material(&board), 1.5);

        board.place(c(3, 3), Side::Triangle);
        board.place(c(4, 4), Side::Triangle);
        assert_eq!(material(&board), 3.0);
    }

    #[test]
    fn test_positional_peaks_at_center() {
        let mut board = Board::empty();
        board.place(c(3, 3), Side::Triangle);
        board.place(c(0, 0), Side::Circle);
        assert_eq!(positional(&board, Side::Triangle), 4.0);
        assert_eq!(positional(&board, Side::Circle), 1.0);
    }

    #[test]
    fn test_immobile_side_scores_large() {
        let mut board = Board::empty();
        // Circle in the corner boxed in by its own piece and a triangle wall.
        board.place(c(0, 0), Side::Circle);
        board.place(c(0, 1), Side::Circle);
        board.place(c(1, 0), Side::Triangle);
        board.place(c(1, 1), Side::Triangle);
        board.place(c(0, 2), Side::Triangle);
        let (score, immobile) = mobility(&board);
        assert!(immobile);
        assert_eq!(score, IMMOBILE_SCORE);
    }

    #[test]
    fn test_immediate_and_potential_threats() {
        let mut board = Board::empty();
        // T C . with another T ready to step into the gap.
        board.place(c(3, 1), Side::Triangle);
        board.place(c(3, 2), Side::Circle);
        board.place(c(2, 3), Side::Triangle);
        let scan = flank_threats(&board, Side::Triangle);
        assert_eq!(scan.immediate, 1);
        assert_eq!(scan.exposed, 1);

        // Without the helper the flank is only potential.
        board.remove(c(2, 3));
        let scan = flank_threats(&board, Side::Triangle);
        assert_eq!(scan.immediate, 0);
        assert_eq!(scan.potential, 1);
        assert_eq!(scan.exposed, 0);
    }

    #[test]
    fn test_defense_late_scaling() {
        let mut board = Board::empty();
        board.place(c(3, 1), Side::Circle);
        board.place(c(3, 2), Side::Triangle);
        board.place(c(2, 3), Side::Circle);
        board.place(c(6, 6), Side::Triangle);

        let early = TurnContext::default();
        let late = TurnContext {
            total_moves: 40,
            ..TurnContext::default()
        };
        assert_eq!(terms(&board, &early).defense, -1.0);
        assert_eq!(terms(&board, &late).defense, -1.5);
    }

    #[test]
    fn test_patterns_center_and_edge() {
        let mut board = Board::empty();
        board.place(c(3, 3), Side::Triangle);
        board.place(c(0, 4), Side::Triangle);
        assert_eq!(patterns(&board, Side::Triangle), CENTER_BONUS + EDGE_BONUS);
        assert_eq!(patterns(&board, Side::Circle), 0.0);
    }

    #[test]
    fn test_evaluate_sign() {
        let mut board = Board::new();
        board.remove(c(6, 0));
        let eval = Evaluator::default();
        assert!(eval.evaluate(&board, &TurnContext::default()) > 0.0);
    }

    #[test]
    fn test_evaluate_is_pure() {
        let board = Board::new();
        let eval = Evaluator::default();
        let ctx = TurnContext::default();
        let a = eval.evaluate(&board, &ctx);
        let b = eval.evaluate(&board, &ctx);
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
