//! Grid model for the game: players, moves and the mutable game state.
//!
//! Discs fall to the lowest empty cell of a column, so every column is a
//! contiguous stack starting at row 0. The state tracks whose turn it is and
//! the columns played so far, which allows moves to be taken back.

use std::fmt;

use crate::constants::{COLUMN_HEIGHT, FOUR, GLYPH_EMPTY, GLYPH_O, GLYPH_X, NUM_COLUMNS};
use crate::error::{GameError, MoveRejection};

/// A move is the index of the column a disc is dropped into.
pub type Move = usize;

/// Column-major cell storage: `grid[column][row]`, row 0 at the bottom.
pub type Grid = [[Option<Player>; COLUMN_HEIGHT]; NUM_COLUMNS];

/// Line directions checked for a winning run: horizontal, vertical and both diagonals.
const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    /// Moves first on an empty grid.
    X,
    O,
}

impl Player {
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// `+1` for `X`, `-1` for `O`.
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Player::X => 1,
            Player::O => -1,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Player::X => GLYPH_X,
            Player::O => GLYPH_O,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

/// A game in progress: the grid, the player to move and the move history.
///
/// Cloning produces a fully independent copy; search engines only ever work
/// on clones and never touch the caller's state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    cells: Grid,
    /// Number of discs in each column (index of its lowest empty row).
    heights: [usize; NUM_COLUMNS],
    player: Player,
    history: Vec<Move>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Create an empty grid with `X` to move.
    pub fn new() -> Self {
        Self {
            cells: [[None; COLUMN_HEIGHT]; NUM_COLUMNS],
            heights: [0; NUM_COLUMNS],
            player: Player::X,
            history: Vec::new(),
        }
    }

    /// Build a state from an explicit grid.
    ///
    /// The player to move is derived from the parity of the filled cells
    /// (even count means `X`). The history starts empty, so such a state
    /// cannot undo past its starting grid.
    ///
    /// # Errors
    /// `InvalidBoard` if a column has an empty cell below a disc, or if the
    /// disc counts could not arise from alternating play with `X` first.
    pub fn from_grid(cells: Grid) -> Result<Self, GameError> {
        let mut heights = [0; NUM_COLUMNS];
        let mut x_count = 0usize;
        let mut o_count = 0usize;

        for (column, stack) in cells.iter().enumerate() {
            let height = stack.iter().take_while(|c| c.is_some()).count();
            if stack[height..].iter().any(Option::is_some) {
                return Err(GameError::InvalidBoard(format!(
                    "column {column} has a floating disc"
                )));
            }
            heights[column] = height;
            for cell in &stack[..height] {
                match cell {
                    Some(Player::X) => x_count += 1,
                    Some(Player::O) => o_count += 1,
                    None => {}
                }
            }
        }

        if x_count != o_count && x_count != o_count + 1 {
            return Err(GameError::InvalidBoard(format!(
                "{x_count} X discs against {o_count} O discs"
            )));
        }

        let player = if (x_count + o_count) % 2 == 0 {
            Player::X
        } else {
            Player::O
        };

        Ok(Self {
            cells,
            heights,
            player,
            history: Vec::new(),
        })
    }

    /// Replay a sequence of columns from the empty grid.
    pub fn from_moves(moves: &[Move]) -> Result<Self, GameError> {
        let mut state = Self::new();
        for &column in moves {
            state.play(column)?;
        }
        Ok(state)
    }

    /// Player whose turn it is.
    #[inline]
    pub fn player(&self) -> Player {
        self.player
    }

    /// Columns played since this state was created, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Read-only view of a single cell. Out-of-range coordinates read as empty.
    pub fn cell(&self, column: usize, row: usize) -> Option<Player> {
        if column >= NUM_COLUMNS || row >= COLUMN_HEIGHT {
            return None;
        }
        self.cells[column][row]
    }

    /// Read-only view of the whole grid.
    pub fn grid(&self) -> &Grid {
        &self.cells
    }

    /// Number of discs on the grid.
    pub fn filled(&self) -> usize {
        self.heights.iter().sum()
    }

    /// Whether a disc can be dropped into `column`.
    #[inline]
    pub fn is_valid(&self, column: Move) -> bool {
        column < NUM_COLUMNS && self.heights[column] < COLUMN_HEIGHT
    }

    /// Columns whose top cell is empty, in ascending order.
    pub fn valid_moves(&self) -> Vec<Move> {
        (0..NUM_COLUMNS).filter(|&c| self.is_valid(c)).collect()
    }

    fn check_move(&self, column: Move) -> Result<(), GameError> {
        if column >= NUM_COLUMNS {
            return Err(GameError::InvalidMove {
                column,
                reason: MoveRejection::OutOfRange,
            });
        }
        if self.heights[column] >= COLUMN_HEIGHT {
            return Err(GameError::InvalidMove {
                column,
                reason: MoveRejection::ColumnFull,
            });
        }
        Ok(())
    }

    /// Drop a disc for the player to move into `column`.
    ///
    /// # Errors
    /// `InvalidMove` if the column is out of range or full; the state is left
    /// untouched in that case.
    pub fn play(&mut self, column: Move) -> Result<(), GameError> {
        self.check_move(column)?;
        let row = self.heights[column];
        self.cells[column][row] = Some(self.player);
        self.heights[column] += 1;
        self.player = self.player.opponent();
        self.history.push(column);
        Ok(())
    }

    /// Take back the last move, returning the column it was played in.
    pub fn undo(&mut self) -> Result<Move, GameError> {
        let column = self.history.pop().ok_or(GameError::EmptyHistory)?;
        self.heights[column] -= 1;
        self.cells[column][self.heights[column]] = None;
        self.player = self.player.opponent();
        Ok(column)
    }

    /// Whether `player` has a run of four discs in any row, column or diagonal.
    ///
    /// Scans the whole grid on every call.
    pub fn four_in_a_row(&self, player: Player) -> bool {
        grid_has_four(&self.cells, player)
    }

    /// Whether `player` has won. Same as [`GameState::four_in_a_row`].
    #[inline]
    pub fn winner(&self, player: Player) -> bool {
        self.four_in_a_row(player)
    }

    /// The player holding a winning run, if any.
    pub fn outcome(&self) -> Option<Player> {
        [Player::X, Player::O]
            .into_iter()
            .find(|&p| self.four_in_a_row(p))
    }

    /// First move, in ascending column order, among `moves` that would give
    /// `player` a winning run if `player` dropped a disc there.
    ///
    /// `player` does not have to be the player to move, which is how a
    /// forced block is detected: ask for the opponent's winning move.
    pub fn best_move(&self, moves: &[Move], player: Player) -> Option<Move> {
        (0..NUM_COLUMNS)
            .filter(|c| moves.contains(c) && self.is_valid(*c))
            .find(|&column| {
                let mut cells = self.cells;
                cells[column][self.heights[column]] = Some(player);
                grid_has_four(&cells, player)
            })
    }

    /// Return a copy of this state with `column` played; `self` is unchanged.
    pub fn with_move(&self, column: Move) -> Result<GameState, GameError> {
        let mut next = self.clone();
        next.play(column)?;
        Ok(next)
    }

    /// True when the grid is full or either player has won.
    pub fn is_finished(&self) -> bool {
        self.heights.iter().all(|&h| h >= COLUMN_HEIGHT)
            || self.four_in_a_row(Player::X)
            || self.four_in_a_row(Player::O)
    }
}

fn grid_has_four(cells: &Grid, player: Player) -> bool {
    let target = Some(player);
    for column in 0..NUM_COLUMNS {
        for row in 0..COLUMN_HEIGHT {
            if cells[column][row] != target {
                continue;
            }
            for (dc, dr) in DIRECTIONS {
                let run = (1..FOUR as isize).all(|k| {
                    let c = column as isize + dc * k;
                    let r = row as isize + dr * k;
                    (0..NUM_COLUMNS as isize).contains(&c)
                        && (0..COLUMN_HEIGHT as isize).contains(&r)
                        && cells[c as usize][r as usize] == target
                });
                if run {
                    return true;
                }
            }
        }
    }
    false
}

impl fmt::Display for GameState {
    /// Top row first, one glyph per cell, followed by the column indices.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..COLUMN_HEIGHT).rev() {
            for column in 0..NUM_COLUMNS {
                let ch = self.cells[column][row].map_or(GLYPH_EMPTY, Player::glyph);
                if column > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        for column in 0..NUM_COLUMNS {
            if column > 0 {
                write!(f, " ")?;
            }
            write!(f, "{column}")?;
        }
        writeln!(f)
    }
}
