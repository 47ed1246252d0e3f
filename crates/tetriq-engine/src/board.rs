use std::fmt;

use crate::{Piece, PieceKind, RotationDirection, SpawnError};

/// A move applied to the board's active piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Left,
    Right,
    Down,
    Drop,
    Clockwise,
    CounterClockwise,
    Hold,
    Nothing,
}

/// Outcome of applying a [`Move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    /// The move applied and the piece is still falling.
    Success,
    /// The move could not apply; the board is unchanged.
    Rejected,
    /// The move locked the piece into the grid.
    Placed,
    /// There is no active piece to move.
    NoPiece,
}

/// Anchor position of the active piece's bounding box (lower-left corner).
///
/// Signed because the anchor itself may sit outside the grid while every
/// occupied cell is inside (a vertical I piece hugging the left wall has a
/// negative anchor x).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The playing field: a grid of settled cells plus at most one falling piece.
///
/// Rows are stored bottom-up; row 0 is the floor. The board tracks aggregate
/// caches (per-row fill counts, per-column heights, overall max height) that
/// stay consistent with the grid after every mutating call, so the metric
/// queries used by evaluation are O(1).
///
/// The board does not distinguish playable rows from spawn headroom; callers
/// that need that split track it themselves.
#[derive(Debug, Clone)]
pub struct Board {
    width: usize,
    height: usize,
    grid: Vec<Option<PieceKind>>,
    row_width: Vec<usize>,
    col_height: Vec<usize>,
    max_height: usize,
    current: Option<(Piece, Position)>,
    last_move: Move,
    last_result: MoveResult,
    rows_cleared: usize,
}

impl PartialEq for Board {
    /// Boards compare by dimensions, settled cells, and active placement.
    /// Move bookkeeping is excluded, so a board that rejected a move still
    /// compares equal to its pre-move clone.
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.grid == other.grid
            && self.current == other.current
    }
}

impl Board {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0);
        Self {
            width,
            height,
            grid: vec![None; width * height],
            row_width: vec![0; height],
            col_height: vec![0; width],
            max_height: 0,
            current: None,
            last_move: Move::Nothing,
            last_result: MoveResult::NoPiece,
            rows_cleared: 0,
        }
    }

    /// Builds a board from a prefilled grid (bottom-up row-major) and
    /// recomputes all caches.
    #[must_use]
    pub fn from_grid(width: usize, height: usize, grid: Vec<Option<PieceKind>>) -> Self {
        assert_eq!(grid.len(), width * height);
        let mut board = Self {
            width,
            height,
            grid,
            row_width: vec![0; height],
            col_height: vec![0; width],
            max_height: 0,
            current: None,
            last_move: Move::Nothing,
            last_result: MoveResult::NoPiece,
            rows_cleared: 0,
        };
        for y in 0..height {
            let filled = (0..width)
                .filter(|&x| board.grid[y * width + x].is_some())
                .count();
            board.row_width[y] = filled;
        }
        board.update_col_heights();
        board
    }

    /// Builds a board from ASCII art: one line per row, top row first,
    /// `#` for a settled cell and `.` for an empty one. Art shorter than the
    /// board fills from the floor up; the rows above stay empty.
    #[must_use]
    pub fn from_ascii(width: usize, height: usize, art: &str) -> Self {
        let lines: Vec<&str> = art.split_whitespace().collect();
        assert!(lines.len() <= height);
        let mut grid = vec![None; width * height];
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(line.len(), width);
            let y = lines.len() - 1 - i;
            for (x, c) in line.chars().enumerate() {
                grid[y * width + x] = match c {
                    '#' => Some(PieceKind::O),
                    '.' => None,
                    _ => panic!("unexpected board art character: {c:?}"),
                };
            }
        }
        Self::from_grid(width, height, grid)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Settled cell at (x, y), `None` when empty or out of bounds.
    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> Option<PieceKind> {
        if self.out_of_bounds(x, y) {
            return None;
        }
        self.grid[self.index(x, y)]
    }

    /// Height of the tallest settled cell in column x (0 when empty or out
    /// of range).
    #[must_use]
    pub fn column_height(&self, x: i32) -> usize {
        if self.out_of_bounds(x, 0) {
            return 0;
        }
        self.col_height[usize::try_from(x).unwrap_or(0)]
    }

    /// Number of settled cells in row y (0 when out of range).
    #[must_use]
    pub fn row_fill(&self, y: i32) -> usize {
        if self.out_of_bounds(0, y) {
            return 0;
        }
        self.row_width[usize::try_from(y).unwrap_or(0)]
    }

    #[must_use]
    pub fn max_height(&self) -> usize {
        self.max_height
    }

    #[must_use]
    pub fn current_piece(&self) -> Option<Piece> {
        self.current.map(|(piece, _)| piece)
    }

    #[must_use]
    pub fn current_position(&self) -> Option<Position> {
        self.current.map(|(_, position)| position)
    }

    #[must_use]
    pub fn last_move(&self) -> Move {
        self.last_move
    }

    #[must_use]
    pub fn last_result(&self) -> MoveResult {
        self.last_result
    }

    /// Rows cleared by the most recent placement.
    #[must_use]
    pub fn rows_cleared(&self) -> usize {
        self.rows_cleared
    }

    /// Introduces a new falling piece at the given anchor.
    ///
    /// Fails if any body cell is out of bounds or already settled; the board
    /// is left without an active piece in that case.
    pub fn spawn(&mut self, piece: Piece, position: Position) -> Result<(), SpawnError> {
        self.current = Some((piece, position));
        if !self.current_placement_valid() {
            self.current = None;
            return Err(SpawnError);
        }
        Ok(())
    }

    /// Applies a move to the active piece and records the outcome.
    pub fn apply(&mut self, mv: Move) -> MoveResult {
        let result = self.run_move(mv);
        self.last_move = mv;
        self.last_result = result;
        result
    }

    /// Whether the active piece's body cells are all in bounds and unoccupied.
    /// Vacuously true without an active piece.
    #[must_use]
    pub fn current_placement_valid(&self) -> bool {
        let Some((piece, position)) = self.current else {
            return true;
        };
        self.placement_valid(piece, position)
    }

    /// Anchor y at which the piece would come to rest if dropped in column x
    /// from above all obstruction: the max over its occupied skirt columns of
    /// `column_height - skirt`, floored at `-height` (a piece whose occupied
    /// cells sit high in the bounding box can rest with a negative anchor).
    #[must_use]
    pub fn drop_height(&self, piece: Piece, x: i32) -> i32 {
        let mut y_max = -i32::try_from(piece.height()).unwrap_or(i32::MAX);
        for (i, skirt) in piece.skirt().iter().enumerate() {
            let Some(skirt) = skirt else { continue };
            let column = i32::try_from(self.column_height(x + i as i32)).unwrap_or(i32::MAX);
            y_max = y_max.max(column - i32::from(*skirt));
        }
        y_max
    }

    fn index(&self, x: i32, y: i32) -> usize {
        debug_assert!(!self.out_of_bounds(x, y));
        y as usize * self.width + x as usize
    }

    fn out_of_bounds(&self, x: i32, y: i32) -> bool {
        x < 0
            || y < 0
            || x as usize >= self.width
            || y as usize >= self.height
    }

    fn placement_valid(&self, piece: Piece, position: Position) -> bool {
        piece.body().iter().all(|&(dx, dy)| {
            let x = position.x + i32::from(dx);
            let y = position.y + i32::from(dy);
            !self.out_of_bounds(x, y) && self.grid[self.index(x, y)].is_none()
        })
    }

    fn run_move(&mut self, mv: Move) -> MoveResult {
        if self.current.is_none() {
            return MoveResult::NoPiece;
        }
        if !self.current_placement_valid() {
            return MoveResult::Rejected;
        }
        match mv {
            Move::Left => self.run_shift(-1),
            Move::Right => self.run_shift(1),
            Move::Down => self.run_down(),
            Move::Drop => self.run_drop(),
            Move::Clockwise => self.run_rotation(RotationDirection::Clockwise),
            Move::CounterClockwise => self.run_rotation(RotationDirection::CounterClockwise),
            Move::Hold | Move::Nothing => MoveResult::Success,
        }
    }

    fn run_shift(&mut self, dx: i32) -> MoveResult {
        let Some((piece, position)) = self.current else {
            return MoveResult::NoPiece;
        };
        let shifted = Position::new(position.x + dx, position.y);
        if self.placement_valid(piece, shifted) {
            self.current = Some((piece, shifted));
            MoveResult::Success
        } else {
            MoveResult::Rejected
        }
    }

    fn run_down(&mut self) -> MoveResult {
        let Some((piece, position)) = self.current else {
            return MoveResult::NoPiece;
        };
        let lowered = Position::new(position.x, position.y - 1);
        if self.placement_valid(piece, lowered) {
            self.current = Some((piece, lowered));
            MoveResult::Success
        } else {
            self.lock_piece();
            MoveResult::Placed
        }
    }

    fn run_drop(&mut self) -> MoveResult {
        let Some((piece, position)) = self.current else {
            return MoveResult::NoPiece;
        };

        // Jumping straight to the resting height beats stepping down one row
        // at a time, but only works with no obstruction above the surface.
        if self.current_piece_above_all() {
            let rest = Position::new(position.x, self.drop_height(piece, position.x));
            self.current = Some((piece, rest));
            self.lock_piece();
            return MoveResult::Placed;
        }

        let mut resting = position;
        loop {
            let lowered = Position::new(resting.x, resting.y - 1);
            if !self.placement_valid(piece, lowered) {
                break;
            }
            resting = lowered;
        }
        self.current = Some((piece, resting));
        self.lock_piece();
        MoveResult::Placed
    }

    /// Whether the active piece's anchor is above every settled cell in the
    /// columns its bounding box spans.
    fn current_piece_above_all(&self) -> bool {
        let Some((piece, position)) = self.current else {
            return false;
        };
        (0..piece.width()).all(|i| {
            let column = self.column_height(position.x + i as i32);
            position.y > i32::try_from(column).unwrap_or(i32::MAX)
        })
    }

    fn run_rotation(&mut self, direction: RotationDirection) -> MoveResult {
        let Some((piece, position)) = self.current else {
            return MoveResult::NoPiece;
        };
        let rotated = match direction {
            RotationDirection::Clockwise => piece.rotated_cw(),
            RotationDirection::CounterClockwise => piece.rotated_ccw(),
        };
        for &(dx, dy) in piece.kick_offsets(direction) {
            let kicked = Position::new(position.x + i32::from(dx), position.y + i32::from(dy));
            if self.placement_valid(rotated, kicked) {
                self.current = Some((rotated, kicked));
                return MoveResult::Success;
            }
        }
        MoveResult::Rejected
    }

    fn lock_piece(&mut self) {
        self.write_current_to_grid();
        self.clear_rows();
        self.update_col_heights();
        self.current = None;
    }

    fn write_current_to_grid(&mut self) {
        let Some((piece, position)) = self.current else {
            return;
        };
        for &(dx, dy) in piece.body() {
            let x = position.x + i32::from(dx);
            let y = position.y + i32::from(dy);
            let index = self.index(x, y);
            self.grid[index] = Some(piece.kind());
            self.row_width[y as usize] += 1;
        }
    }

    /// Clears full rows scanning from the top down, shifting everything
    /// above each cleared row down one and emptying the top row. Scanning
    /// top-down keeps the downward shift from skipping stacked full rows.
    fn clear_rows(&mut self) {
        self.rows_cleared = 0;
        for y in (0..self.height).rev() {
            if self.row_width[y] != self.width {
                continue;
            }
            for y_above in y..self.height - 1 {
                for x in 0..self.width {
                    self.grid[y_above * self.width + x] = self.grid[(y_above + 1) * self.width + x];
                }
                self.row_width[y_above] = self.row_width[y_above + 1];
            }
            for x in 0..self.width {
                self.grid[(self.height - 1) * self.width + x] = None;
            }
            self.row_width[self.height - 1] = 0;
            self.rows_cleared += 1;
        }
    }

    fn update_col_heights(&mut self) {
        self.max_height = 0;
        for x in 0..self.width {
            self.col_height[x] = 0;
            for y in (0..self.height).rev() {
                if self.grid[y * self.width + x].is_some() {
                    self.col_height[x] = y + 1;
                    break;
                }
            }
            self.max_height = self.max_height.max(self.col_height[x]);
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                match self.grid[y * self.width + x] {
                    Some(kind) => write!(f, "{}", kind.as_char())?,
                    None => write!(f, ".")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
