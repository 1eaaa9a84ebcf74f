//! Minimax search with alpha-beta pruning.
//!
//! The search reasons in plies: one step of one piece. Plies alternate
//! between the sides, the triangle maximizing and the circle minimizing the
//! same evaluator score, so the engine can decide for either side.
//!
//! Every hypothetical step is made through [`Board::try_move`], whose guard
//! takes the step back when it goes out of scope. A sibling therefore always
//! starts from the exact position its parent saw, including after a cutoff
//! leaves the loop early.
//!
//! A turn is chosen one step at a time. The first step gets the full-depth
//! search; later steps use a one-ply greedy pick unless
//! [`SecondMovePolicy::FullSearch`] is configured.

use std::collections::HashSet;

use tracing::debug;

use crate::board::{Board, Coord, Move, Side};
use crate::config::{GameConfig, SecondMovePolicy};
use crate::error::{GameError, GameResult};
use crate::eval::{Evaluator, TurnContext};

/// A chosen step and what the search thought of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    pub mv: Move,
    /// Score from the triangle's point of view.
    pub score: f64,
    /// Positions visited.
    pub nodes: u64,
}

/// Depth-limited adversarial search driven by an [`Evaluator`].
#[derive(Debug, Clone)]
pub struct SearchEngine {
    evaluator: Evaluator,
    depth: u32,
    second_move: SecondMovePolicy,
    nodes: u64,
}

impl SearchEngine {
    pub fn new(evaluator: Evaluator, depth: u32, second_move: SecondMovePolicy) -> Self {
        Self {
            evaluator,
            depth,
            second_move,
            nodes: 0,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(
            Evaluator::new(config.phases),
            config.depth,
            config.second_move,
        )
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Pick the next step of `ctx.side`'s turn, skipping pieces in `moved`.
    ///
    /// Returns `None` when no unmoved piece can step.
    pub fn decide(
        &mut self,
        board: &mut Board,
        ctx: &TurnContext,
        moved: &HashSet<Coord>,
    ) -> Option<SearchResult> {
        let result = if ctx.moves_used == 0 || self.second_move == SecondMovePolicy::FullSearch {
            self.best_move(board, ctx, moved)
        } else {
            self.greedy_move(board, ctx, moved)
        };
        result.ok()
    }

    /// Full-depth alpha-beta choice for `ctx.side`.
    pub fn best_move(
        &mut self,
        board: &mut Board,
        ctx: &TurnContext,
        moved: &HashSet<Coord>,
    ) -> GameResult<SearchResult> {
        self.search_root(board, ctx, moved, true)
    }

    /// Same as [`SearchEngine::best_move`] without pruning.
    pub fn best_move_unpruned(
        &mut self,
        board: &mut Board,
        ctx: &TurnContext,
        moved: &HashSet<Coord>,
    ) -> GameResult<SearchResult> {
        self.search_root(board, ctx, moved, false)
    }

    /// One-ply choice: the step whose resulting position evaluates best.
    pub fn greedy_move(
        &mut self,
        board: &mut Board,
        ctx: &TurnContext,
        moved: &HashSet<Coord>,
    ) -> GameResult<SearchResult> {
        let side = ctx.side;
        let maximizing = side == Side::Triangle;
        let mut best: Option<(Move, f64)> = None;

        for mv in candidates(board, side, moved)? {
            let Ok(child) = board.try_move(mv) else {
                unreachable!("generated step {mv} was rejected");
            };
            let score = self.evaluator.evaluate(&child, ctx);
            drop(child);

            if improves(best, score, maximizing) {
                best = Some((mv, score));
            }
        }

        let (mv, score) = best.ok_or(GameError::NoLegalMove { side })?;
        debug!(%side, %mv, score, "greedy step");
        Ok(SearchResult {
            mv,
            score,
            nodes: 1,
        })
    }

    fn search_root(
        &mut self,
        board: &mut Board,
        ctx: &TurnContext,
        moved: &HashSet<Coord>,
        pruning: bool,
    ) -> GameResult<SearchResult> {
        let side = ctx.side;
        let maximizing = side == Side::Triangle;
        let remaining = self.depth.saturating_sub(1);
        self.nodes = 0;

        let mut alpha = f64::NEG_INFINITY;
        let mut beta = f64::INFINITY;
        let mut best: Option<(Move, f64)> = None;

        for mv in candidates(board, side, moved)? {
            let score = {
                let Ok(mut child) = board.try_move(mv) else {
                    unreachable!("generated step {mv} was rejected");
                };
                if pruning {
                    self.alpha_beta(&mut child, remaining, alpha, beta, side.opponent(), ctx)
                } else {
                    self.minimax(&mut child, remaining, side.opponent(), ctx)
                }
            };

            if improves(best, score, maximizing) {
                best = Some((mv, score));
            }
            if pruning {
                if maximizing {
                    alpha = alpha.max(score);
                } else {
                    beta = beta.min(score);
                }
            }
        }

        let (mv, score) = best.ok_or(GameError::NoLegalMove { side })?;
        debug!(
            %side,
            %mv,
            score,
            nodes = self.nodes,
            depth = self.depth,
            pruning,
            "search finished"
        );
        Ok(SearchResult {
            mv,
            score,
            nodes: self.nodes,
        })
    }

    /// Alpha-beta value of `board` with `to_move` on move.
    pub fn alpha_beta(
        &mut self,
        board: &mut Board,
        depth: u32,
        mut alpha: f64,
        mut beta: f64,
        to_move: Side,
        ctx: &TurnContext,
    ) -> f64 {
        self.nodes += 1;
        if depth == 0 || board.is_wiped_out() {
            return self.evaluator.evaluate(board, ctx);
        }
        let moves = board.legal_moves(to_move);
        if moves.is_empty() {
            return self.evaluator.evaluate(board, ctx);
        }

        let maximizing = to_move == Side::Triangle;
        let mut value = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };

        for mv in moves {
            let score = {
                let Ok(mut child) = board.try_move(mv) else {
                    unreachable!("generated step {mv} was rejected");
                };
                self.alpha_beta(&mut child, depth - 1, alpha, beta, to_move.opponent(), ctx)
            };

            if maximizing {
                value = value.max(score);
                alpha = alpha.max(value);
            } else {
                value = value.min(score);
                beta = beta.min(value);
            }
            if beta <= alpha {
                break;
            }
        }
        value
    }

    /// Plain minimax value of `board`, visiting every node.
    pub fn minimax(&mut self, board: &mut Board, depth: u32, to_move: Side, ctx: &TurnContext) -> f64 {
        self.nodes += 1;
        if depth == 0 || board.is_wiped_out() {
            return self.evaluator.evaluate(board, ctx);
        }
        let moves = board.legal_moves(to_move);
        if moves.is_empty() {
            return self.evaluator.evaluate(board, ctx);
        }

        let maximizing = to_move == Side::Triangle;
        let mut value = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };

        for mv in moves {
            let Ok(mut child) = board.try_move(mv) else {
                unreachable!("generated step {mv} was rejected");
            };
            let score = self.minimax(&mut child, depth - 1, to_move.opponent(), ctx);
            value = if maximizing {
                value.max(score)
            } else {
                value.min(score)
            };
        }
        value
    }
}

/// Legal steps for `side` by pieces not yet moved this turn.
fn candidates(board: &Board, side: Side, moved: &HashSet<Coord>) -> GameResult<Vec<Move>> {
    let moves: Vec<Move> = board
        .legal_moves(side)
        .into_iter()
        .filter(|mv| !moved.contains(&mv.from))
        .collect();
    if moves.is_empty() {
        return Err(GameError::NoLegalMove { side });
    }
    Ok(moves)
}

/// Whether `score` strictly beats the current best for the side choosing.
/// Ties keep the earlier step.
#[inline]
fn improves(best: Option<(Move, f64)>, score: f64, maximizing: bool) -> bool {
    match best {
        None => true,
        Some((_, b)) if maximizing => score > b,
        Some((_, b)) => score < b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhaseTable;

    fn c(x: i32, y: i32) -> Coord {
        Coord::new(x, y)
    }

    fn engine(depth: u32) -> SearchEngine {
        SearchEngine::new(
            Evaluator::new(PhaseTable::default()),
            depth,
            SecondMovePolicy::Greedy,
        )
    }

    #[test]
    fn test_takes_free_capture() {
        let mut board = Board::empty();
        board.place(c(3, 1), Side::Triangle);
        board.place(c(3, 2), Side::Circle);
        board.place(c(2, 3), Side::Triangle);
        board.place(c(6, 6), Side::Circle);

        let ctx = TurnContext::default();
        let result = engine(2)
            .best_move(&mut board, &ctx, &HashSet::new())
            .unwrap();
        assert_eq!(result.mv, Move::new(c(2, 3), c(3, 3)));
    }

    #[test]
    fn test_search_leaves_board_untouched() {
        let mut board = Board::new();
        let before = board.snapshot();
        let ctx = TurnContext::default();
        engine(3)
            .best_move(&mut board, &ctx, &HashSet::new())
            .unwrap();
        assert_eq!(board.snapshot(), before);
        assert_eq!(board.triangles(), 4);
        assert_eq!(board.circles(), 4);
    }

    #[test]
    fn test_moved_pieces_skipped() {
        let mut board = Board::empty();
        board.place(c(3, 3), Side::Triangle);
        board.place(c(0, 0), Side::Triangle);
        board.place(c(6, 6), Side::Circle);

        let moved: HashSet<Coord> = [c(3, 3)].into_iter().collect();
        let ctx = TurnContext::default();
        let result = engine(2).best_move(&mut board, &ctx, &moved).unwrap();
        assert_eq!(result.mv.from, c(0, 0));
    }

    #[test]
    fn test_no_legal_move() {
        let mut board = Board::empty();
        board.place(c(0, 0), Side::Triangle);
        board.place(c(6, 6), Side::Circle);
        let moved: HashSet<Coord> = [c(0, 0)].into_iter().collect();
        let ctx = TurnContext::default();

        let err = engine(2).best_move(&mut board, &ctx, &moved).unwrap_err();
        assert_eq!(err, GameError::NoLegalMove { side: Side::Triangle });
        assert!(engine(2).decide(&mut board, &ctx, &moved).is_none());
    }

    #[test]
    fn test_circle_minimizes() {
        let mut board = Board::empty();
        board.place(c(3, 1), Side::Circle);
        board.place(c(3, 2), Side::Triangle);
        board.place(c(2, 3), Side::Circle);
        board.place(c(6, 6), Side::Triangle);

        let ctx = TurnContext {
            side: Side::Circle,
            ..TurnContext::default()
        };
        let result = engine(1)
            .best_move(&mut board, &ctx, &HashSet::new())
            .unwrap();
        assert_eq!(result.mv, Move::new(c(2, 3), c(3, 3)));
    }

    #[test]
    fn test_pruning_matches_minimax() {
        let mut board = Board::new();
        let ctx = TurnContext::default();
        let mut e = engine(3);
        let pruned = e.best_move(&mut board, &ctx, &HashSet::new()).unwrap();
        let full = e
            .best_move_unpruned(&mut board, &ctx, &HashSet::new())
            .unwrap();
        assert_eq!(pruned.score, full.score);
        assert_eq!(pruned.mv, full.mv);
        assert!(pruned.nodes <= full.nodes);
    }

    #[test]
    fn test_second_step_is_greedy_by_default() {
        let mut board = Board::new();
        let ctx = TurnContext {
            moves_used: 1,
            ..TurnContext::default()
        };
        let result = engine(3)
            .decide(&mut board, &ctx, &HashSet::new())
            .unwrap();
        assert_eq!(result.nodes, 1);
    }

    #[test]
    fn test_second_step_full_search() {
        let mut board = Board::new();
        let ctx = TurnContext {
            moves_used: 1,
            ..TurnContext::default()
        };
        let mut full = SearchEngine::new(
            Evaluator::new(PhaseTable::default()),
            2,
            SecondMovePolicy::FullSearch,
        );
        let result = full.decide(&mut board, &ctx, &HashSet::new()).unwrap();
        assert!(result.nodes > 1);

        let greedy = engine(2).decide(&mut board, &ctx, &HashSet::new()).unwrap();
        assert_eq!(greedy.nodes, 1);
        assert_eq!(board.snapshot(), Board::new().snapshot());
    }
}
