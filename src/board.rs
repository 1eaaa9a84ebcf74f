//! Board state and rule primitives.
//!
//! This module owns the 7x7 grid and the two piece counts, and implements
//! every rule of the game that does not depend on whose turn it is:
//! - Position validity and step legality
//! - Move execution with custodial capture resolution
//! - Scoped trial moves ([`Trial`]) that restore the board when dropped
//!
//! Cells are addressed as `(x, y)` = (row, column) with row 0 at the top.
//! The text form is a column letter followed by a row number, so `a1` is
//! `(0, 0)` and `g7` is `(6, 6)`.

use std::fmt;
use std::ops::{Deref, DerefMut};

use tracing::trace;

use crate::constants::{
    DELTA, GLYPH_CIRCLE, GLYPH_EMPTY, GLYPH_TRIANGLE, N, START_CIRCLE, START_TRIANGLE,
};
use crate::error::{GameError, GameResult, IllegalReason};

/// The two sides. Triangle is the automated side and moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Triangle,
    Circle,
}

impl Side {
    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::Triangle => Side::Circle,
            Side::Circle => Side::Triangle,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Side::Triangle => GLYPH_TRIANGLE,
            Side::Circle => GLYPH_CIRCLE,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Triangle => write!(f, "triangle"),
            Side::Circle => write!(f, "circle"),
        }
    }
}

/// A cell address. May lie off the board; see [`Board::is_valid_position`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell in `dir`, which may be off the board.
    #[inline]
    pub fn step(self, dir: Direction) -> Coord {
        let (dx, dy) = dir.delta();
        Coord::new(self.x + dx, self.y + dy)
    }

    #[inline]
    pub fn manhattan(self, other: Coord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Whether the cell touches the board border.
    pub fn is_edge(self) -> bool {
        let last = N as i32 - 1;
        self.x == 0 || self.y == 0 || self.x == last || self.y == last
    }
}

impl From<(usize, usize)> for Coord {
    fn from((x, y): (usize, usize)) -> Self {
        Coord::new(x as i32, y as i32)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&str_coord(*self))
    }
}

/// One of the four orthogonal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All directions, in move-generation order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    #[inline]
    fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    /// Offset as (row delta, column delta).
    #[inline]
    pub fn delta(self) -> (i32, i32) {
        DELTA[self.index()]
    }

    /// Parse `up`/`down`/`left`/`right` or their first letters.
    pub fn parse(s: &str) -> Option<Direction> {
        match s.to_ascii_lowercase().as_str() {
            "up" | "u" => Some(Direction::Up),
            "down" | "d" => Some(Direction::Down),
            "left" | "l" => Some(Direction::Left),
            "right" | "r" => Some(Direction::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(name)
    }
}

/// A single step of one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Coord,
    pub to: Coord,
}

impl Move {
    #[inline]
    pub fn new(from: Coord, to: Coord) -> Self {
        Self { from, to }
    }

    /// The step from `from` in `dir`.
    #[inline]
    pub fn step(from: Coord, dir: Direction) -> Self {
        Self::new(from, from.step(dir))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// Which scans may use the board edge as the closing end of a flank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeFlank {
    /// Any piece's scan may run off the board to complete a flank.
    #[default]
    Any,
    /// Only scans from the piece that just moved may.
    Mover,
    /// Only an own piece completes a flank.
    Off,
}

/// Starting placement used by [`Board::reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub triangle: Vec<Coord>,
    pub circle: Vec<Coord>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            triangle: START_TRIANGLE.iter().map(|&c| c.into()).collect(),
            circle: START_CIRCLE.iter().map(|&c| c.into()).collect(),
        }
    }
}

/// Delta needed to take back one step: the mover and everything it captured.
#[derive(Debug, Clone)]
struct Undo {
    mv: Move,
    side: Side,
    captured: Vec<(Coord, Side)>,
}

/// The game board.
///
/// Piece counts are maintained alongside the grid by every operation that
/// places or removes a piece, so `count(side)` always equals the number of
/// cells holding `side`.
#[derive(Debug, Clone)]
pub struct Board {
    grid: [[Option<Side>; N]; N],
    triangles: u32,
    circles: u32,
    edge_flank: EdgeFlank,
    layout: Layout,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// A board with the default starting placement and edge flanks.
    pub fn new() -> Self {
        Self::with_layout(Layout::default(), EdgeFlank::default())
    }

    /// A board with a custom placement. The layout must already be validated.
    pub fn with_layout(layout: Layout, edge_flank: EdgeFlank) -> Self {
        let mut board = Self {
            grid: [[None; N]; N],
            triangles: 0,
            circles: 0,
            edge_flank,
            layout,
        };
        board.reset();
        board
    }

    /// A board with no pieces, for setting up positions with [`Board::place`].
    pub fn empty() -> Self {
        Self {
            grid: [[None; N]; N],
            triangles: 0,
            circles: 0,
            edge_flank: EdgeFlank::default(),
            layout: Layout::default(),
        }
    }

    /// Clear the grid and restore the starting placement.
    pub fn reset(&mut self) {
        self.grid = [[None; N]; N];
        self.triangles = 0;
        self.circles = 0;
        let layout = self.layout.clone();
        for c in layout.triangle {
            self.place(c, Side::Triangle);
        }
        for c in layout.circle {
            self.place(c, Side::Circle);
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        N
    }

    pub fn edge_flank(&self) -> EdgeFlank {
        self.edge_flank
    }

    pub fn set_edge_flank(&mut self, rule: EdgeFlank) {
        self.edge_flank = rule;
    }

    #[inline]
    pub fn is_valid_position(&self, c: Coord) -> bool {
        c.x >= 0 && c.x < N as i32 && c.y >= 0 && c.y < N as i32
    }

    /// Piece at `c`, or `None` for an empty or off-board cell.
    #[inline]
    pub fn get(&self, c: Coord) -> Option<Side> {
        if !self.is_valid_position(c) {
            return None;
        }
        self.grid[c.x as usize][c.y as usize]
    }

    #[inline]
    fn set(&mut self, c: Coord, cell: Option<Side>) {
        self.grid[c.x as usize][c.y as usize] = cell;
    }

    /// Put a piece on the board without capture processing.
    /// Replaces whatever was there. Off-board cells are ignored.
    pub fn place(&mut self, c: Coord, side: Side) {
        if !self.is_valid_position(c) {
            return;
        }
        self.remove(c);
        self.set(c, Some(side));
        *self.count_mut(side) += 1;
    }

    /// Take a piece off the board, returning it.
    pub fn remove(&mut self, c: Coord) -> Option<Side> {
        let old = self.get(c)?;
        self.set(c, None);
        *self.count_mut(old) -= 1;
        Some(old)
    }

    #[inline]
    fn count_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::Triangle => &mut self.triangles,
            Side::Circle => &mut self.circles,
        }
    }

    #[inline]
    pub fn count(&self, side: Side) -> u32 {
        match side {
            Side::Triangle => self.triangles,
            Side::Circle => self.circles,
        }
    }

    #[inline]
    pub fn triangles(&self) -> u32 {
        self.triangles
    }

    #[inline]
    pub fn circles(&self) -> u32 {
        self.circles
    }

    /// Either side has been wiped out.
    #[inline]
    pub fn is_wiped_out(&self) -> bool {
        self.triangles == 0 || self.circles == 0
    }

    /// Copy of the grid, indexed `[row][column]`.
    pub fn snapshot(&self) -> [[Option<Side>; N]; N] {
        self.grid
    }

    /// Cells holding `side`, in row-major order.
    pub fn pieces(&self, side: Side) -> impl Iterator<Item = Coord> {
        (0..N)
            .flat_map(|x| (0..N).map(move |y| Coord::from((x, y))))
            .filter(move |&c| self.get(c) == Some(side))
    }

    /// Check a step, reporting the first rule it breaks.
    pub fn check_move(&self, from: Coord, to: Coord) -> Result<(), IllegalReason> {
        if !self.is_valid_position(from) || !self.is_valid_position(to) {
            return Err(IllegalReason::OutOfBounds);
        }
        if self.get(from).is_none() {
            return Err(IllegalReason::EmptyOrigin);
        }
        if self.get(to).is_some() {
            return Err(IllegalReason::Occupied);
        }
        if from.manhattan(to) != 1 {
            return Err(IllegalReason::NotAdjacent);
        }
        Ok(())
    }

    #[inline]
    pub fn is_legal_move(&self, from: Coord, to: Coord) -> bool {
        self.check_move(from, to).is_ok()
    }

    /// Every legal step for `side`, pieces in row-major order, directions in
    /// [`Direction::ALL`] order.
    pub fn legal_moves(&self, side: Side) -> Vec<Move> {
        let mut moves = Vec::with_capacity(16);
        for from in self.pieces(side) {
            for dir in Direction::ALL {
                let mv = Move::step(from, dir);
                if self.is_legal_move(mv.from, mv.to) {
                    moves.push(mv);
                }
            }
        }
        moves
    }

    /// Number of legal steps for `side`.
    pub fn mobility(&self, side: Side) -> u32 {
        self.pieces(side)
            .map(|from| {
                Direction::ALL
                    .into_iter()
                    .filter(|&dir| self.is_legal_move(from, from.step(dir)))
                    .count() as u32
            })
            .sum()
    }

    /// Move a piece one step and resolve captures.
    ///
    /// Returns the captured pieces. On error the board is unchanged.
    pub fn move_piece(&mut self, mv: Move) -> GameResult<Vec<(Coord, Side)>> {
        let undo = self.apply(mv)?;
        Ok(undo.captured)
    }

    /// Move a piece in a direction. See [`Board::move_piece`].
    pub fn move_dir(&mut self, from: Coord, dir: Direction) -> GameResult<Vec<(Coord, Side)>> {
        self.move_piece(Move::step(from, dir))
    }

    /// Make a move that is taken back when the returned guard is dropped.
    ///
    /// The guard dereferences to the board, so the search can recurse into
    /// it; nested trials unwind in reverse order.
    pub fn try_move(&mut self, mv: Move) -> GameResult<Trial<'_>> {
        let undo = self.apply(mv)?;
        Ok(Trial { board: self, undo })
    }

    fn apply(&mut self, mv: Move) -> GameResult<Undo> {
        if let Err(reason) = self.check_move(mv.from, mv.to) {
            return Err(GameError::IllegalMove {
                from: mv.from,
                to: mv.to,
                reason,
            });
        }
        let side = self.get(mv.from).ok_or(GameError::IllegalMove {
            from: mv.from,
            to: mv.to,
            reason: IllegalReason::EmptyOrigin,
        })?;
        self.set(mv.to, Some(side));
        self.set(mv.from, None);
        let captured = self.resolve_captures(mv.to);
        Ok(Undo { mv, side, captured })
    }

    fn undo(&mut self, undo: &Undo) {
        // Restore captures first: the mover itself may be among them.
        for &(c, side) in &undo.captured {
            self.set(c, Some(side));
            *self.count_mut(side) += 1;
        }
        self.set(undo.mv.to, None);
        self.set(undo.mv.from, Some(undo.side));
    }

    /// Whether the cell ending a run of enemy pieces completes a flank for
    /// the piece at `origin`.
    #[inline]
    fn closes_flank(&self, end: Coord, origin: Coord, side: Side, mover: Coord) -> bool {
        if !self.is_valid_position(end) {
            return match self.edge_flank {
                EdgeFlank::Any => true,
                EdgeFlank::Mover => origin == mover,
                EdgeFlank::Off => false,
            };
        }
        self.get(end) == Some(side)
    }

    /// Scan every piece in every direction and remove each flanked run.
    ///
    /// All runs are collected before anything is removed, so one pass never
    /// cascades. A cell reached by several scans is removed once.
    fn resolve_captures(&mut self, mover: Coord) -> Vec<(Coord, Side)> {
        let mut doomed = [[false; N]; N];
        let mut any = false;

        for x in 0..N {
            for y in 0..N {
                let Some(side) = self.grid[x][y] else {
                    continue;
                };
                let enemy = side.opponent();
                let origin = Coord::from((x, y));

                for dir in Direction::ALL {
                    let mut c = origin.step(dir);
                    let mut run = 0;
                    while self.get(c) == Some(enemy) {
                        run += 1;
                        c = c.step(dir);
                    }
                    if run == 0 || !self.closes_flank(c, origin, side, mover) {
                        continue;
                    }
                    let mut c = origin.step(dir);
                    for _ in 0..run {
                        doomed[c.x as usize][c.y as usize] = true;
                        c = c.step(dir);
                    }
                    any = true;
                }
            }
        }

        if !any {
            return Vec::new();
        }

        let mut captured = Vec::new();
        for x in 0..N {
            for y in 0..N {
                if doomed[x][y] {
                    let c = Coord::from((x, y));
                    if let Some(side) = self.remove(c) {
                        trace!(cell = %c, %side, "captured");
                        captured.push((c, side));
                    }
                }
            }
        }
        captured
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        for y in 0..N {
            write!(f, " {}", (b'a' + y as u8) as char)?;
        }
        writeln!(f)?;
        for x in 0..N {
            write!(f, "{:>2}", x + 1)?;
            for y in 0..N {
                let ch = match self.grid[x][y] {
                    Some(side) => side.glyph(),
                    None => GLYPH_EMPTY,
                };
                write!(f, " {ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A move in progress on a borrowed board, taken back on drop.
pub struct Trial<'a> {
    board: &'a mut Board,
    undo: Undo,
}

impl Trial<'_> {
    /// Pieces removed by this move.
    pub fn captured(&self) -> &[(Coord, Side)] {
        &self.undo.captured
    }
}

impl Deref for Trial<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        self.board
    }
}

impl DerefMut for Trial<'_> {
    fn deref_mut(&mut self) -> &mut Board {
        self.board
    }
}

impl Drop for Trial<'_> {
    fn drop(&mut self) {
        self.board.undo(&self.undo);
    }
}

/// Parse a cell such as `c4` (column letter, then row number from 1).
///
/// Returns `None` for malformed input. The result may still be off the board.
pub fn parse_coord(s: &str) -> Option<Coord> {
    let s = s.trim();
    let mut chars = s.chars();
    let col = chars.next()?.to_ascii_lowercase();
    if !col.is_ascii_lowercase() {
        return None;
    }
    let row: i32 = chars.as_str().parse().ok()?;
    if row < 1 {
        return None;
    }
    Some(Coord::new(row - 1, col as i32 - 'a' as i32))
}

/// Format a cell as `c4`. Off-board cells are shown as `(x,y)`.
pub fn str_coord(c: Coord) -> String {
    match c.x.checked_add(1) {
        Some(row) if row >= 1 && (0..26).contains(&c.y) => {
            format!("{}{}", (b'a' + c.y as u8) as char, row)
        }
        _ => format!("({},{})", c.x, c.y),
    }
}

/// Parse a move target: a direction name or a destination cell.
pub fn parse_target(from: Coord, s: &str) -> Option<Coord> {
    if let Some(dir) = Direction::parse(s) {
        return Some(from.step(dir));
    }
    parse_coord(s)
}
