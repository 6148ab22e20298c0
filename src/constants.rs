//! Constants for grid dimensions and default search parameters.
//!
//! The grid is stored column-major: `cells[column][row]`, with row 0 at the
//! bottom of each column so that gravity fills rows in ascending order.

// =============================================================================
// Grid Geometry
// =============================================================================

/// Number of columns a disc can be dropped into.
pub const NUM_COLUMNS: usize = 7;

/// Number of cells stacked in each column.
pub const COLUMN_HEIGHT: usize = 6;

/// Run length needed to win.
pub const FOUR: usize = 4;

/// Total number of cells on the grid (upper bound on game length).
pub const NUM_CELLS: usize = NUM_COLUMNS * COLUMN_HEIGHT;

// =============================================================================
// Rollout Parameters
// =============================================================================

/// Probability that a rollout takes an immediately winning move when one exists.
pub const ROLLOUT_BIAS: f64 = 0.5;

// =============================================================================
// MinMax Parameters
// =============================================================================

/// Default negamax search depth (in plies).
pub const MAX_DEPTH: usize = 4;

/// Default number of rollouts used to evaluate a leaf.
pub const MC_SAMPLES: usize = 100;

// =============================================================================
// MCTS Parameters
// =============================================================================

/// Default number of selection/expansion/simulation/backpropagation cycles.
pub const MCTS_ITERATIONS: usize = 1000;

/// Default number of rollouts run from each expanded node.
pub const SAMPLES_PER_LEAF: usize = 300;

/// Default UCT exploration constant.
pub const EXPLORATION: f64 = 1.0;

/// Progress report period (number of iterations between trace reports).
pub const REPORT_PERIOD: usize = 200;

// =============================================================================
// Display
// =============================================================================

/// Glyph for a disc of the first player.
pub const GLYPH_X: char = 'X';

/// Glyph for a disc of the second player.
pub const GLYPH_O: char = 'O';

/// Glyph for an empty cell.
pub const GLYPH_EMPTY: char = '_';
