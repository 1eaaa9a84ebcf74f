//! Turn controller.
//!
//! [`Game`] owns the board for the lifetime of a game and runs the turn
//! state machine:
//!
//! ```text
//! AutomatedTurn --turn ends--> HumanTurn --turn ends--> AutomatedTurn ...
//!        \                          \
//!         `------- terminal --------`--> GameOver
//! ```
//!
//! The triangle is driven by the [`SearchEngine`]; the circle is driven by the
//! host, either step by step through [`Game::attempt_human_move`] or through a
//! [`Mover`] handed to [`Game::run`]. Each step is committed as soon as it is
//! decided, so its captures are visible to the next decision of the turn.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info};

use crate::board::{Board, Coord, Move, Side};
use crate::config::GameConfig;
use crate::error::{GameError, GameResult, IllegalReason};
use crate::eval::TurnContext;
use crate::search::SearchEngine;

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    AutomatedTurn,
    HumanTurn,
    GameOver,
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    TriangleWins,
    CircleWins,
    Draw,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::TriangleWins => write!(f, "triangle wins"),
            Outcome::CircleWins => write!(f, "circle wins"),
            Outcome::Draw => write!(f, "draw"),
        }
    }
}

/// Notifications for the host to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    MoveApplied {
        side: Side,
        mv: Move,
        captured: Vec<(Coord, Side)>,
    },
    TurnEnded {
        side: Side,
        moves: u32,
        total_moves: u32,
    },
    GameOver {
        outcome: Outcome,
    },
}

/// One committed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    pub side: Side,
    pub mv: Move,
    pub captured: Vec<(Coord, Side)>,
    /// The step ended the turn.
    pub turn_over: bool,
}

/// Source of steps for a side, such as a human at a console.
pub trait Mover {
    /// Propose the next step for the side on move, or `None` to end the turn.
    fn propose(&mut self, game: &Game) -> Option<Move>;

    /// The last proposal was rejected; the board is unchanged.
    fn rejected(&mut self, _err: &GameError) {}
}

/// The game: board, turn bookkeeping and the engine.
pub struct Game {
    config: GameConfig,
    board: Board,
    engine: SearchEngine,
    state: GameState,
    ctx: TurnContext,
    /// Cells of pieces that have moved this turn
    moved: HashSet<Coord>,
    outcome: Option<Outcome>,
    events: Vec<GameEvent>,
}

impl Game {
    /// Build a game, rejecting invalid configurations.
    pub fn new(config: GameConfig) -> GameResult<Self> {
        config.validate()?;
        let board = Board::with_layout(config.layout(), config.edge_flank);
        let engine = SearchEngine::from_config(&config);
        let ctx = TurnContext::new(config.moves_per_turn);
        Ok(Self {
            config,
            board,
            engine,
            state: GameState::AutomatedTurn,
            ctx,
            moved: HashSet::new(),
            outcome: None,
            events: Vec::new(),
        })
    }

    /// Start over with the same configuration.
    pub fn reset(&mut self) {
        self.board.reset();
        self.ctx = TurnContext::new(self.config.moves_per_turn);
        self.state = GameState::AutomatedTurn;
        self.moved.clear();
        self.outcome = None;
        self.events.clear();
        info!("new game");
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    pub fn triangles(&self) -> u32 {
        self.board.triangles()
    }

    pub fn circles(&self) -> u32 {
        self.board.circles()
    }

    pub fn total_moves(&self) -> u32 {
        self.ctx.total_moves
    }

    pub fn current_side(&self) -> Side {
        self.ctx.side
    }

    pub fn context(&self) -> &TurnContext {
        &self.ctx
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state == GameState::GameOver
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Cells of the pieces already moved this turn.
    pub fn moved_this_turn(&self) -> &HashSet<Coord> {
        &self.moved
    }

    /// Steps left in the current turn.
    pub fn moves_left(&self) -> u32 {
        self.ctx.moves_per_turn.saturating_sub(self.ctx.moves_used)
    }

    /// Take the queued host notifications.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Apply one human step. On error nothing changes and the turn goes on.
    pub fn attempt_human_move(&mut self, from: Coord, to: Coord) -> GameResult<MoveReport> {
        match self.state {
            GameState::GameOver => return Err(GameError::GameOver),
            GameState::AutomatedTurn => return Err(GameError::NotYourTurn { side: Side::Circle }),
            GameState::HumanTurn => {}
        }
        if let Err(reason) = self.vet(Side::Circle, from, to) {
            return Err(GameError::IllegalMove { from, to, reason });
        }
        self.commit(Side::Circle, Move::new(from, to))
    }

    /// The human gives up the rest of the turn.
    pub fn end_human_turn(&mut self) -> GameResult<()> {
        match self.state {
            GameState::GameOver => Err(GameError::GameOver),
            GameState::AutomatedTurn => Err(GameError::NotYourTurn { side: Side::Circle }),
            GameState::HumanTurn => {
                self.finish_turn();
                Ok(())
            }
        }
    }

    /// Let the engine play the triangle's whole turn.
    ///
    /// # Panics
    /// If the engine proposes a step the board rejects.
    pub fn play_automated_turn(&mut self) -> GameResult<Vec<MoveReport>> {
        match self.state {
            GameState::GameOver => return Err(GameError::GameOver),
            GameState::HumanTurn => {
                return Err(GameError::NotYourTurn {
                    side: Side::Triangle,
                });
            }
            GameState::AutomatedTurn => {}
        }

        let mut reports = Vec::new();
        loop {
            let Some(result) = self.engine.decide(&mut self.board, &self.ctx, &self.moved) else {
                self.finish_turn();
                break;
            };
            let report = match self.commit(Side::Triangle, result.mv) {
                Ok(report) => report,
                Err(err) => panic!("engine produced an illegal step {}: {err}", result.mv),
            };
            let over = report.turn_over;
            reports.push(report);
            if over {
                break;
            }
        }
        Ok(reports)
    }

    /// Play the game to the end with `human` driving the circle.
    pub fn run(&mut self, human: &mut dyn Mover) -> Outcome {
        loop {
            match self.state {
                GameState::AutomatedTurn => {
                    if let Err(err) = self.play_automated_turn() {
                        unreachable!("automated turn refused in state {:?}: {err}", self.state);
                    }
                }
                GameState::HumanTurn => match human.propose(self) {
                    Some(mv) => {
                        if let Err(err) = self.attempt_human_move(mv.from, mv.to) {
                            human.rejected(&err);
                        }
                    }
                    None => {
                        if let Err(err) = self.end_human_turn() {
                            unreachable!("human turn end refused in state {:?}: {err}", self.state);
                        }
                    }
                },
                GameState::GameOver => break,
            }
        }
        self.outcome.unwrap_or(Outcome::Draw)
    }

    fn vet(&self, side: Side, from: Coord, to: Coord) -> Result<(), IllegalReason> {
        match self.board.get(from) {
            Some(owner) if owner != side => return Err(IllegalReason::WrongSide),
            Some(_) if self.moved.contains(&from) => return Err(IllegalReason::AlreadyMoved),
            _ => {}
        }
        self.board.check_move(from, to)
    }

    fn commit(&mut self, side: Side, mv: Move) -> GameResult<MoveReport> {
        let captured = self.board.move_piece(mv)?;

        for (cell, _) in &captured {
            self.moved.remove(cell);
        }
        if self.board.get(mv.to) == Some(side) {
            self.moved.insert(mv.to);
        }
        self.ctx.moves_used += 1;

        debug!(%side, %mv, captured = captured.len(), "step applied");
        self.events.push(GameEvent::MoveApplied {
            side,
            mv,
            captured: captured.clone(),
        });

        let turn_over = self.ctx.moves_used >= self.ctx.moves_per_turn
            || self.board.is_wiped_out()
            || !self.can_step(side);
        if turn_over {
            self.finish_turn();
        }

        Ok(MoveReport {
            side,
            mv,
            captured,
            turn_over,
        })
    }

    /// Whether some piece of `side` not yet moved this turn has a legal step.
    fn can_step(&self, side: Side) -> bool {
        self.board
            .legal_moves(side)
            .iter()
            .any(|mv| !self.moved.contains(&mv.from))
    }

    fn finish_turn(&mut self) {
        let side = self.ctx.side;
        self.ctx.total_moves += 1;
        info!(
            %side,
            moves = self.ctx.moves_used,
            total_moves = self.ctx.total_moves,
            triangles = self.board.triangles(),
            circles = self.board.circles(),
            "turn ended"
        );
        self.events.push(GameEvent::TurnEnded {
            side,
            moves: self.ctx.moves_used,
            total_moves: self.ctx.total_moves,
        });

        if let Some(outcome) = self.check_outcome() {
            info!(%outcome, "game over");
            self.state = GameState::GameOver;
            self.outcome = Some(outcome);
            self.events.push(GameEvent::GameOver { outcome });
            return;
        }

        self.ctx.side = side.opponent();
        self.state = match self.ctx.side {
            Side::Triangle => GameState::AutomatedTurn,
            Side::Circle => GameState::HumanTurn,
        };
        self.begin_turn();
    }

    fn begin_turn(&mut self) {
        self.moved.clear();
        self.ctx.moves_used = 0;
        // A human with nothing to move has nothing to decide.
        if self.state == GameState::HumanTurn && !self.can_step(Side::Circle) {
            self.finish_turn();
        }
    }

    fn check_outcome(&self) -> Option<Outcome> {
        let (tri, cir) = (self.board.triangles(), self.board.circles());
        match (tri, cir) {
            (0, 0) => Some(Outcome::Draw),
            (0, _) => Some(Outcome::CircleWins),
            (_, 0) => Some(Outcome::TriangleWins),
            _ if self.ctx.total_moves >= self.config.move_cap => Some(match tri.cmp(&cir) {
                std::cmp::Ordering::Greater => Outcome::TriangleWins,
                std::cmp::Ordering::Less => Outcome::CircleWins,
                std::cmp::Ordering::Equal => Outcome::Draw,
            }),
            _ => None,
        }
    }
}

/// Drives a side with the search engine.
pub struct EngineMover {
    engine: SearchEngine,
}

impl EngineMover {
    pub fn new(engine: SearchEngine) -> Self {
        Self { engine }
    }
}

impl Mover for EngineMover {
    fn propose(&mut self, game: &Game) -> Option<Move> {
        let mut board = game.board().clone();
        self.engine
            .decide(&mut board, game.context(), game.moved_this_turn())
            .map(|r| r.mv)
    }
}

/// Drives a side with uniformly random legal steps.
pub struct RandomMover {
    rng: fastrand::Rng,
}

impl RandomMover {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Mover for RandomMover {
    fn propose(&mut self, game: &Game) -> Option<Move> {
        let moved = game.moved_this_turn();
        let moves: Vec<Move> = game
            .board()
            .legal_moves(game.current_side())
            .into_iter()
            .filter(|mv| !moved.contains(&mv.from))
            .collect();
        if moves.is_empty() {
            return None;
        }
        Some(moves[self.rng.usize(..moves.len())])
    }
}
