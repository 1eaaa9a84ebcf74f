//! Integration tests for flank
//!
//! Rule properties are checked over many seeded random positions; the search
//! and controller are checked on small hand-built setups.

use std::collections::HashSet;

use flank::board::{Board, Coord, EdgeFlank, Move, Side};
use flank::config::{GameConfig, PhaseTable, SecondMovePolicy};
use flank::constants::N;
use flank::eval::{Evaluator, TurnContext};
use flank::game::{Game, GameState, Outcome, RandomMover};
use flank::search::SearchEngine;

// =============================================================================
// Helpers
// =============================================================================

fn c(x: i32, y: i32) -> Coord {
    Coord::new(x, y)
}

/// Count pieces by scanning the grid.
fn grid_count(board: &Board, side: Side) -> u32 {
    board
        .snapshot()
        .iter()
        .flatten()
        .filter(|&&cell| cell == Some(side))
        .count() as u32
}

/// Play `plies` random legal steps, alternating sides, from the start.
fn random_position(rng: &mut fastrand::Rng, plies: usize) -> Board {
    let mut board = Board::new();
    let mut side = Side::Triangle;
    for _ in 0..plies {
        if board.is_wiped_out() {
            break;
        }
        let moves = board.legal_moves(side);
        if !moves.is_empty() {
            let mv = moves[rng.usize(..moves.len())];
            board.move_piece(mv).unwrap();
        }
        side = side.opponent();
    }
    board
}

fn engine(depth: u32) -> SearchEngine {
    SearchEngine::new(
        Evaluator::new(PhaseTable::default()),
        depth,
        SecondMovePolicy::Greedy,
    )
}

// =============================================================================
// Board invariants
// =============================================================================

#[test]
fn test_counts_track_grid_in_random_games() {
    for seed in 0..30 {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut board = Board::new();
        let mut side = Side::Triangle;

        for _ in 0..200 {
            let moves = board.legal_moves(side);
            if moves.is_empty() || board.is_wiped_out() {
                break;
            }
            let (tri, cir) = (board.triangles(), board.circles());
            let mv = moves[rng.usize(..moves.len())];
            let captured = board.move_piece(mv).unwrap();

            assert_eq!(board.triangles(), grid_count(&board, Side::Triangle));
            assert_eq!(board.circles(), grid_count(&board, Side::Circle));
            assert!(board.triangles() <= tri && board.circles() <= cir);
            assert_eq!(
                (tri + cir) as usize - captured.len(),
                (board.triangles() + board.circles()) as usize
            );
            side = side.opponent();
        }
    }
}

#[test]
fn test_move_piece_agrees_with_legality_check() {
    let mut rng = fastrand::Rng::with_seed(42);
    for _ in 0..40 {
        let plies = rng.usize(0..20);
        let board = random_position(&mut rng, plies);
        for _ in 0..50 {
            let from = c(rng.i32(-1..=N as i32), rng.i32(-1..=N as i32));
            let to = c(rng.i32(-1..=N as i32), rng.i32(-1..=N as i32));
            let legal = board.is_legal_move(from, to);

            let before = board.snapshot();
            let mut scratch = board.clone();
            let result = scratch.move_piece(Move::new(from, to));
            assert_eq!(result.is_ok(), legal, "{from} -> {to}");
            if !legal {
                assert_eq!(scratch.snapshot(), before);
            }
        }
        // Legal steps generated for either side always pass the check.
        for side in [Side::Triangle, Side::Circle] {
            for mv in board.legal_moves(side) {
                assert!(board.is_legal_move(mv.from, mv.to));
                assert_eq!(board.get(mv.from), Some(side));
            }
        }
    }
}

#[test]
fn test_trial_moves_restore_random_positions() {
    let mut rng = fastrand::Rng::with_seed(9);
    for _ in 0..40 {
        let plies = rng.usize(0..30);
        let mut board = random_position(&mut rng, plies);
        let before = board.snapshot();
        let counts = (board.triangles(), board.circles());
        for side in [Side::Triangle, Side::Circle] {
            for mv in board.legal_moves(side) {
                let trial = board.try_move(mv).unwrap();
                drop(trial);
                assert_eq!(board.snapshot(), before);
                assert_eq!((board.triangles(), board.circles()), counts);
            }
        }
    }
}

// =============================================================================
// Capture rules
// =============================================================================

#[test]
fn test_run_closed_by_own_piece_is_captured() {
    for k in 1..=5 {
        let mut board = Board::empty();
        board.set_edge_flank(EdgeFlank::Mover);
        board.place(c(3, 0), Side::Triangle);
        for y in 1..=k {
            board.place(c(3, y), Side::Circle);
        }
        board.place(c(2, k + 1), Side::Triangle);

        let captured = board.move_piece(Move::new(c(2, k + 1), c(3, k + 1))).unwrap();
        assert_eq!(captured.len(), k as usize, "run of {k}");
        assert!(captured.iter().all(|&(_, side)| side == Side::Circle));
        assert_eq!(board.circles(), 0);
        assert_eq!(board.triangles(), 2);
    }
}

#[test]
fn test_run_closed_by_edge_is_captured() {
    for k in 1..=5 {
        let mut board = Board::empty();
        for y in (7 - k)..7 {
            board.place(c(3, y), Side::Circle);
        }
        board.place(c(2, 6 - k), Side::Triangle);

        let captured = board.move_piece(Move::new(c(2, 6 - k), c(3, 6 - k))).unwrap();
        assert_eq!(captured.len(), k as usize, "run of {k}");
        assert_eq!(board.circles(), 0);
    }
}

#[test]
fn test_open_run_is_not_captured() {
    for k in 1..=5 {
        let mut board = Board::empty();
        board.set_edge_flank(EdgeFlank::Mover);
        for y in 1..=k {
            board.place(c(3, y), Side::Circle);
        }
        board.place(c(2, 0), Side::Triangle);

        let captured = board.move_piece(Move::new(c(2, 0), c(3, 0))).unwrap();
        assert!(captured.is_empty(), "run of {k}");
        assert_eq!(board.circles(), k as u32);
    }
}

#[test]
fn test_opening_step_captures_nothing() {
    for to in [c(1, 0), c(0, 1)] {
        let mut board = Board::new();
        let captured = board.move_piece(Move::new(c(0, 0), to)).unwrap();
        assert!(captured.is_empty());
        assert_eq!(board.get(c(0, 0)), None);
        assert_eq!(board.get(to), Some(Side::Triangle));
        assert_eq!((board.triangles(), board.circles()), (4, 4));
    }
}

#[test]
fn test_two_piece_flank_scenario() {
    let setup = |rule: EdgeFlank| {
        let mut board = Board::empty();
        board.set_edge_flank(rule);
        board.place(c(2, 0), Side::Triangle);
        board.place(c(2, 1), Side::Circle);
        board.place(c(2, 2), Side::Circle);
        board.place(c(2, 4), Side::Triangle);
        board
    };

    for rule in [EdgeFlank::Mover, EdgeFlank::Off] {
        let mut board = setup(rule);
        board.move_piece(Move::new(c(2, 4), c(2, 3))).unwrap();
        assert_eq!(board.get(c(2, 1)), None);
        assert_eq!(board.get(c(2, 2)), None);
        assert_eq!(board.circles(), 0);
        assert_eq!(board.triangles(), 2);
    }

    // Under the default rule the circle at b3 also pins a3 against the edge.
    let mut board = setup(EdgeFlank::Any);
    let captured = board.move_piece(Move::new(c(2, 4), c(2, 3))).unwrap();
    assert_eq!(captured.len(), 3);
    assert_eq!(board.circles(), 0);
    assert_eq!(board.triangles(), 1);
}

// =============================================================================
// Evaluation and search
// =============================================================================

#[test]
fn test_evaluate_is_deterministic() {
    let mut rng = fastrand::Rng::with_seed(3);
    let eval = Evaluator::default();
    for _ in 0..20 {
        let plies = rng.usize(0..30);
        let board = random_position(&mut rng, plies);
        let ctx = TurnContext {
            total_moves: rng.u32(0..50),
            ..TurnContext::default()
        };
        let a = eval.evaluate(&board, &ctx);
        let b = eval.evaluate(&board.clone(), &ctx);
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn test_alpha_beta_matches_minimax() {
    let mut rng = fastrand::Rng::with_seed(11);
    for i in 0..8 {
        let plies = rng.usize(0..16);
        let mut board = random_position(&mut rng, plies);
        let side = if i % 2 == 0 { Side::Triangle } else { Side::Circle };
        if board.is_wiped_out() || board.legal_moves(side).is_empty() {
            continue;
        }
        let ctx = TurnContext {
            side,
            total_moves: i,
            ..TurnContext::default()
        };
        let before = board.snapshot();

        let mut e = engine(3);
        let pruned = e.best_move(&mut board, &ctx, &HashSet::new()).unwrap();
        let full = e
            .best_move_unpruned(&mut board, &ctx, &HashSet::new())
            .unwrap();
        assert_eq!(pruned.score, full.score);
        assert_eq!(pruned.mv, full.mv);
        assert!(pruned.nodes <= full.nodes);
        assert_eq!(board.snapshot(), before);
    }
}

// =============================================================================
// Turn controller
// =============================================================================

#[test]
fn test_engine_wipes_out_circles() {
    let config = GameConfig {
        depth: 2,
        start_triangle: vec![c(3, 1), c(2, 4)],
        start_circle: vec![c(3, 2), c(3, 3)],
        ..GameConfig::default()
    };
    let mut game = Game::new(config).unwrap();
    let reports = game.play_automated_turn().unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].mv, Move::new(c(2, 4), c(3, 4)));
    assert_eq!(game.circles(), 0);
    assert_eq!(game.state(), GameState::GameOver);
    assert_eq!(game.outcome(), Some(Outcome::TriangleWins));
    assert_eq!(game.total_moves(), 1);
}

#[test]
fn test_move_cap_with_more_triangles() {
    let config = GameConfig {
        depth: 2,
        move_cap: 1,
        start_triangle: vec![c(3, 1), c(2, 3), c(6, 0)],
        start_circle: vec![c(3, 2), c(6, 6), c(0, 6)],
        ..GameConfig::default()
    };
    let mut game = Game::new(config).unwrap();
    game.play_automated_turn().unwrap();

    assert!(game.triangles() > game.circles());
    assert_eq!(game.outcome(), Some(Outcome::TriangleWins));
    assert_eq!(game.total_moves(), 1);
}

#[test]
fn test_move_cap_with_equal_counts() {
    let config = GameConfig {
        depth: 2,
        move_cap: 1,
        ..GameConfig::default()
    };
    let mut game = Game::new(config).unwrap();
    game.play_automated_turn().unwrap();

    assert_eq!((game.triangles(), game.circles()), (4, 4));
    assert_eq!(game.outcome(), Some(Outcome::Draw));
}

#[test]
fn test_random_games_terminate() {
    for seed in 0..5 {
        let config = GameConfig {
            depth: 1,
            move_cap: 20,
            ..GameConfig::default()
        };
        let mut game = Game::new(config).unwrap();
        let outcome = game.run(&mut RandomMover::with_seed(seed));

        assert!(game.is_terminal());
        assert!(game.total_moves() <= 20);
        assert_eq!(game.triangles(), grid_count(game.board(), Side::Triangle));
        assert_eq!(game.circles(), grid_count(game.board(), Side::Circle));
        match outcome {
            Outcome::TriangleWins => {
                assert!(game.circles() == 0 || game.triangles() > game.circles())
            }
            Outcome::CircleWins => {
                assert!(game.triangles() == 0 || game.circles() > game.triangles())
            }
            Outcome::Draw => assert_eq!(game.triangles(), game.circles()),
        }
    }
}
