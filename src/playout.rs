//! Monte Carlo playouts (random game simulation).
//!
//! A playout plays moves until a player completes a run of four or the grid
//! fills up. It is biased: with probability `bias` the side to move takes an
//! immediately winning move when one exists, otherwise it plays a uniformly
//! random valid move.

use fastrand::Rng;

use crate::board::{GameState, Player};
use crate::constants::ROLLOUT_BIAS;
use crate::error::GameError;

/// Biased random rollout policy shared by both engines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomPlayout {
    /// Probability of taking an immediate win when one is available.
    pub bias: f64,
}

impl Default for RandomPlayout {
    fn default() -> Self {
        Self { bias: ROLLOUT_BIAS }
    }
}

impl RandomPlayout {
    pub fn new(bias: f64) -> Self {
        Self { bias }
    }

    /// Play `state` out to the end on a private copy.
    ///
    /// Returns the winner, or `None` for a draw (full grid, no run of four).
    pub fn rollout(
        &self,
        state: &GameState,
        rng: &mut Rng,
    ) -> Result<Option<Player>, GameError> {
        if let Some(winner) = state.outcome() {
            return Ok(Some(winner));
        }

        let mut sim = state.clone();
        loop {
            let valid = sim.valid_moves();
            if valid.is_empty() {
                return Ok(None);
            }

            let mover = sim.player();
            let winning = if rng.f64() < self.bias {
                sim.best_move(&valid, mover)
            } else {
                None
            };
            let column = winning.unwrap_or_else(|| valid[rng.usize(..valid.len())]);

            sim.play(column)?;
            if sim.four_in_a_row(mover) {
                return Ok(Some(mover));
            }
        }
    }

    /// Run `samples` rollouts and sum their outcomes from `perspective`:
    /// `+1` per win, `-1` per loss, `0` per draw.
    pub fn sample(
        &self,
        state: &GameState,
        samples: usize,
        perspective: Player,
        rng: &mut Rng,
    ) -> Result<i64, GameError> {
        let mut total = 0;
        for _ in 0..samples {
            total += score_for(self.rollout(state, rng)?, perspective);
        }
        Ok(total)
    }
}

/// Signed value of a rollout result for `perspective`.
#[inline]
pub fn score_for(outcome: Option<Player>, perspective: Player) -> i64 {
    outcome.map_or(0, |winner| i64::from(winner.sign() * perspective.sign()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Grid;
    use crate::constants::{COLUMN_HEIGHT, NUM_COLUMNS};

    #[test]
    fn test_rollout_on_finished_state_returns_winner() {
        // X stacks column 0 while O plays column 1
        let state = GameState::from_moves(&[0, 1, 0, 1, 0, 1, 0]).unwrap();
        let mut rng = Rng::with_seed(7);
        let policy = RandomPlayout::default();
        for _ in 0..10 {
            assert_eq!(policy.rollout(&state, &mut rng), Ok(Some(Player::X)));
        }
    }

    #[test]
    fn test_rollout_does_not_touch_input() {
        let state = GameState::from_moves(&[3, 3, 2]).unwrap();
        let before = state.clone();
        let mut rng = Rng::with_seed(1);
        RandomPlayout::default().rollout(&state, &mut rng).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_rollouts_from_opening_end_cleanly() {
        let state = GameState::new();
        let policy = RandomPlayout::new(0.0);
        let mut rng = Rng::with_seed(13);
        for _ in 0..50 {
            assert!(policy.rollout(&state, &mut rng).is_ok());
        }
        let total = policy.sample(&state, 50, Player::O, &mut rng).unwrap();
        assert!((-50..=50).contains(&total));
    }

    #[test]
    fn test_full_bias_takes_the_win() {
        // X has three stacked in column 6 and is to move
        let state = GameState::from_moves(&[6, 0, 6, 1, 6, 2]).unwrap();
        let policy = RandomPlayout::new(1.0);
        let mut rng = Rng::with_seed(42);
        for _ in 0..20 {
            // With full bias X completes column 6 before O can use its row
            assert_eq!(policy.rollout(&state, &mut rng), Ok(Some(Player::X)));
        }
    }

    #[test]
    fn test_sample_of_drawn_grid_is_zero() {
        // Each string is one column, bottom row first
        let columns = [
            "XXOOXX", "XXOOXX", "OOXXOO", "XXOOXX", "OOXXOO", "XOXOXO", "OOXXOO",
        ];
        let mut cells: Grid = [[None; COLUMN_HEIGHT]; NUM_COLUMNS];
        for (stack, text) in cells.iter_mut().zip(columns) {
            for (cell, ch) in stack.iter_mut().zip(text.chars()) {
                *cell = Some(if ch == 'X' { Player::X } else { Player::O });
            }
        }
        let state = GameState::from_grid(cells).unwrap();
        assert!(state.outcome().is_none());
        let mut rng = Rng::with_seed(3);
        assert_eq!(
            RandomPlayout::default().sample(&state, 10, Player::X, &mut rng),
            Ok(0)
        );
    }

    #[test]
    fn test_score_for() {
        assert_eq!(score_for(Some(Player::X), Player::X), 1);
        assert_eq!(score_for(Some(Player::O), Player::X), -1);
        assert_eq!(score_for(None, Player::O), 0);
    }
}
