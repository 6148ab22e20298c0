//! Common interface over the two search engines, used by the drivers.

use std::fmt;
use std::str::FromStr;

use crate::board::{GameState, Move};
use crate::error::GameError;
use crate::mcts::{Mcts, MctsConfig};
use crate::minmax::{MinMax, MinMaxConfig};

/// A decision maker that picks a column for the player to move.
///
/// Implementations must not mutate `state`; they work on copies.
pub trait Engine {
    /// Short name used in logs and protocol replies.
    fn name(&self) -> &'static str;

    /// Choose a move for the player to move in `state`.
    fn choose_move(&mut self, state: &GameState) -> Result<Move, GameError>;
}

impl Engine for MinMax {
    fn name(&self) -> &'static str {
        "minmax"
    }

    fn choose_move(&mut self, state: &GameState) -> Result<Move, GameError> {
        self.search(state).map(|outcome| outcome.mv)
    }
}

impl Engine for Mcts {
    fn name(&self) -> &'static str {
        "mcts"
    }

    fn choose_move(&mut self, state: &GameState) -> Result<Move, GameError> {
        self.search(state)
    }
}

/// Which engine to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    #[default]
    MinMax,
    Mcts,
}

impl EngineKind {
    /// Build a boxed engine of this kind from the matching config.
    pub fn build(
        self,
        minmax: &MinMaxConfig,
        mcts: &MctsConfig,
    ) -> Result<Box<dyn Engine>, GameError> {
        Ok(match self {
            EngineKind::MinMax => Box::new(MinMax::new(minmax.clone())?),
            EngineKind::Mcts => Box::new(Mcts::new(mcts.clone())?),
        })
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::MinMax => write!(f, "minmax"),
            EngineKind::Mcts => write!(f, "mcts"),
        }
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minmax" | "negamax" | "1" => Ok(EngineKind::MinMax),
            "mcts" | "2" => Ok(EngineKind::Mcts),
            other => Err(format!("unknown engine: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_engine_kind() {
        assert_eq!("minmax".parse::<EngineKind>(), Ok(EngineKind::MinMax));
        assert_eq!("MCTS".parse::<EngineKind>(), Ok(EngineKind::Mcts));
        assert_eq!("2".parse::<EngineKind>(), Ok(EngineKind::Mcts));
        assert!("alphazero".parse::<EngineKind>().is_err());
    }

    #[test]
    fn test_build_reports_names() {
        let minmax = MinMaxConfig::for_testing();
        let mcts = MctsConfig::for_testing();
        let engine = EngineKind::MinMax.build(&minmax, &mcts).unwrap();
        assert_eq!(engine.name(), "minmax");
        let engine = EngineKind::Mcts.build(&minmax, &mcts).unwrap();
        assert_eq!(engine.name(), "mcts");
    }

    #[test]
    fn test_build_propagates_config_errors() {
        let minmax = MinMaxConfig {
            mc_samples: 0,
            ..MinMaxConfig::for_testing()
        };
        let mcts = MctsConfig::for_testing();
        assert!(EngineKind::MinMax.build(&minmax, &mcts).is_err());
    }
}
