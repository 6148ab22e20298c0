//! Connect-Four search engines.
//!
//! This crate provides two adversarial-search AIs for the column-drop game
//! on a 7x6 grid: a depth-limited negamax searcher with alpha-beta pruning
//! and Monte Carlo leaf evaluation, and a UCT Monte Carlo Tree Search.
//!
//! ## Modules
//!
//! - [`constants`] - Grid dimensions and default engine parameters
//! - [`board`] - Game state (moves, undo, win detection)
//! - [`playout`] - Biased random game simulation shared by both engines
//! - [`minmax`] - Negamax with alpha-beta pruning
//! - [`mcts`] - Monte Carlo Tree Search with UCT
//! - [`engine`] - Common engine interface
//! - [`protocol`] - Text command loop for driving the engines
//! - [`error`] - Error type
//!
//! ## Example
//!
//! ```
//! use connect_four_search::board::GameState;
//! use connect_four_search::mcts::{Mcts, MctsConfig};
//!
//! // X has three discs stacked in column 3
//! let mut state = GameState::from_moves(&[3, 0, 3, 0, 3, 6]).unwrap();
//!
//! let mut engine = Mcts::new(MctsConfig::for_testing()).unwrap();
//! let column = engine.search(&state).unwrap();
//! state.play(column).unwrap();
//! println!("{state}");
//! ```

pub mod board;
pub mod constants;
pub mod engine;
pub mod error;
pub mod mcts;
pub mod minmax;
pub mod playout;
pub mod protocol;
