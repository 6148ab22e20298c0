//! Depth-limited negamax with alpha-beta pruning.
//!
//! Leaves are scored by Monte Carlo rollouts instead of a static heuristic.
//! Before recursing, every node checks for an immediate win (returned as
//! `+inf`) and for a move the opponent would win with next turn, which is
//! taken as a forced block (returned as `-inf`).
//!
//! When the `[alpha, beta]` window closes, the move that closed it is
//! returned together with `alpha` (fail-hard). Without a cutoff the first
//! move reaching the best value is returned.

use std::time::Instant;

use fastrand::Rng;
use tracing::debug;

use crate::board::{GameState, Move};
use crate::constants::{MAX_DEPTH, MC_SAMPLES, ROLLOUT_BIAS};
use crate::error::GameError;
use crate::playout::RandomPlayout;

/// Configuration for the negamax searcher.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxConfig {
    /// Search depth in plies. Must be at least 1.
    pub max_depth: usize,
    /// Rollouts per leaf evaluation. Must be at least 1.
    pub mc_samples: usize,
    /// Rollout bias towards immediate wins, in `[0, 1]`.
    pub rollout_bias: f64,
    /// Seed for reproducible rollouts. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for MinMaxConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            mc_samples: MC_SAMPLES,
            rollout_bias: ROLLOUT_BIAS,
            seed: None,
        }
    }
}

impl MinMaxConfig {
    /// Create a fast, deterministic config for testing.
    pub fn for_testing() -> Self {
        Self {
            max_depth: 2,
            mc_samples: 10,
            rollout_bias: ROLLOUT_BIAS,
            seed: Some(0),
        }
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.max_depth == 0 {
            return Err(GameError::PreconditionViolation(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.mc_samples == 0 {
            return Err(GameError::PreconditionViolation(
                "mc_samples must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.rollout_bias) {
            return Err(GameError::PreconditionViolation(format!(
                "rollout_bias must be in [0, 1] (got {})",
                self.rollout_bias
            )));
        }
        Ok(())
    }
}

/// Chosen move and its negamax value from the mover's point of view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOutcome {
    pub mv: Move,
    pub score: f64,
}

/// Negamax searcher with Monte Carlo leaf evaluation.
pub struct MinMax {
    config: MinMaxConfig,
    policy: RandomPlayout,
    rng: Rng,
    /// Nodes visited by the last search.
    nodes: u64,
}

impl MinMax {
    pub fn new(config: MinMaxConfig) -> Result<Self, GameError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => Rng::with_seed(seed),
            None => Rng::new(),
        };
        let policy = RandomPlayout::new(config.rollout_bias);
        Ok(Self {
            config,
            policy,
            rng,
            nodes: 0,
        })
    }

    pub fn config(&self) -> &MinMaxConfig {
        &self.config
    }

    /// Number of nodes visited by the most recent search.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Pick a move for the player to move in `state`.
    ///
    /// # Errors
    /// `PreconditionViolation` if the game is already finished.
    pub fn search(&mut self, state: &GameState) -> Result<SearchOutcome, GameError> {
        if state.is_finished() {
            return Err(GameError::PreconditionViolation(
                "search called on a finished game".to_string(),
            ));
        }

        let start = Instant::now();
        self.nodes = 0;
        let depth = self.config.max_depth;
        let (mv, score) = self.negamax(state, f64::NEG_INFINITY, f64::INFINITY, depth)?;

        // A non-terminal root at depth >= 1 always yields a move; fall back to
        // the first valid column rather than report nothing.
        let mv = match mv {
            Some(mv) => mv,
            None => *state.valid_moves().first().ok_or_else(|| {
                GameError::PreconditionViolation("no valid moves".to_string())
            })?,
        };

        debug!(
            player = %state.player(),
            mv,
            score,
            nodes = self.nodes,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "minmax search finished"
        );
        Ok(SearchOutcome { mv, score })
    }

    fn negamax(
        &mut self,
        state: &GameState,
        mut alpha: f64,
        beta: f64,
        depth: usize,
    ) -> Result<(Option<Move>, f64), GameError> {
        self.nodes += 1;

        if depth == 0 {
            return Ok((None, self.mc_eval(state)?));
        }

        let player = state.player();
        let valid = state.valid_moves();
        if valid.is_empty() {
            return Ok((None, terminal_value(state)));
        }

        if let Some(mv) = state.best_move(&valid, player) {
            return Ok((Some(mv), f64::INFINITY));
        }
        if let Some(mv) = state.best_move(&valid, player.opponent()) {
            return Ok((Some(mv), f64::NEG_INFINITY));
        }

        let mut best_value = f64::NEG_INFINITY;
        let mut best_move = None;
        for &mv in &valid {
            let child = state.with_move(mv)?;
            let (_, child_value) = self.negamax(&child, -beta, -alpha, depth - 1)?;
            let value = -child_value;

            if best_move.is_none() || value > best_value {
                best_value = value;
                best_move = Some(mv);
            }
            alpha = alpha.max(best_value);
            if alpha >= beta {
                return Ok((Some(mv), alpha));
            }
        }

        Ok((best_move, best_value))
    }

    /// Average rollout outcome, `+1` meaning a certain win for the player to move.
    fn mc_eval(&mut self, state: &GameState) -> Result<f64, GameError> {
        let samples = self.config.mc_samples;
        let total = self
            .policy
            .sample(state, samples, state.player(), &mut self.rng)?;
        Ok(total as f64 / samples as f64)
    }
}

/// Value of a position without valid moves, for the player to move.
fn terminal_value(state: &GameState) -> f64 {
    match state.outcome() {
        Some(winner) if winner == state.player() => f64::INFINITY,
        Some(_) => f64::NEG_INFINITY,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Player;

    #[test]
    fn test_config_validation() {
        assert!(MinMaxConfig::default().validate().is_ok());

        let config = MinMaxConfig {
            max_depth: 0,
            ..MinMaxConfig::default()
        };
        assert!(matches!(
            MinMax::new(config),
            Err(GameError::PreconditionViolation(_))
        ));

        let config = MinMaxConfig {
            rollout_bias: 1.5,
            ..MinMaxConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_takes_immediate_win() {
        // X: three in column 4, O scattered
        let state = GameState::from_moves(&[4, 0, 4, 6, 4, 0]).unwrap();
        let mut engine = MinMax::new(MinMaxConfig::for_testing()).unwrap();
        let outcome = engine.search(&state).unwrap();
        assert_eq!(outcome.mv, 4);
        assert_eq!(outcome.score, f64::INFINITY);
    }

    #[test]
    fn test_blocks_forced_move() {
        // O threatens column 2 vertically, X has nothing
        let state = GameState::from_moves(&[0, 2, 6, 2, 4, 2]).unwrap();
        assert_eq!(state.player(), Player::X);
        let mut engine = MinMax::new(MinMaxConfig::for_testing()).unwrap();
        let outcome = engine.search(&state).unwrap();
        assert_eq!(outcome.mv, 2);
        assert_eq!(outcome.score, f64::NEG_INFINITY);
    }

    #[test]
    fn test_mc_eval_is_bounded() {
        let state = GameState::from_moves(&[3, 3, 4]).unwrap();
        let mut engine = MinMax::new(MinMaxConfig::for_testing()).unwrap();
        let value = engine.mc_eval(&state).unwrap();
        assert!((-1.0..=1.0).contains(&value));
    }

    #[test]
    fn test_cutoff_on_first_move_below_beta() {
        // Any leaf value is at least -1, so the first child closes the window
        let state = GameState::new();
        let mut engine = MinMax::new(MinMaxConfig::for_testing()).unwrap();
        let (mv, value) = engine.negamax(&state, f64::NEG_INFINITY, -2.0, 1).unwrap();
        assert_eq!(mv, Some(0));
        assert!((-1.0..=1.0).contains(&value));
        assert_eq!(engine.nodes(), 2);

        engine.nodes = 0;
        engine
            .negamax(&state, f64::NEG_INFINITY, f64::INFINITY, 1)
            .unwrap();
        assert_eq!(engine.nodes(), 8);
    }

    #[test]
    fn test_cutoff_returns_move_that_closed_window() {
        // X on columns 0 and 1, O stacked on column 6. Playing 2 leaves O
        // facing an open three, which scores +inf for X and beats beta.
        let state = GameState::from_moves(&[0, 6, 1, 6]).unwrap();
        let mut engine = MinMax::new(MinMaxConfig::for_testing()).unwrap();
        let (mv, value) = engine.negamax(&state, f64::NEG_INFINITY, 2.0, 2).unwrap();
        assert_eq!(mv, Some(2));
        assert_eq!(value, f64::INFINITY);
        // root, two full subtrees of at most 8 nodes, then the forced block.
        // Visiting columns 3 to 6 as well would cost at least 7 more.
        assert!(engine.nodes() <= 18, "visited {} nodes", engine.nodes());
    }

    #[test]
    fn test_child_window_is_negated() {
        // Nothing is forced after one disc, so every value stays finite
        let state = GameState::new();
        let mut engine = MinMax::new(MinMaxConfig::for_testing()).unwrap();
        let (mv, value) = engine
            .negamax(&state, f64::NEG_INFINITY, f64::INFINITY, 2)
            .unwrap();
        assert!(mv.is_some());
        assert!((-1.0..=1.0).contains(&value), "value {value}");
        assert_eq!(engine.config().max_depth, 2);
    }

    #[test]
    fn test_search_rejects_finished_game() {
        let state = GameState::from_moves(&[0, 1, 0, 1, 0, 1, 0]).unwrap();
        let mut engine = MinMax::new(MinMaxConfig::for_testing()).unwrap();
        assert!(matches!(
            engine.search(&state),
            Err(GameError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_terminal_value() {
        let state = GameState::from_moves(&[0, 1, 0, 1, 0, 1, 0]).unwrap();
        // O to move, X holds the run
        assert_eq!(terminal_value(&state), f64::NEG_INFINITY);
        assert_eq!(terminal_value(&GameState::new()), 0.0);
    }
}
