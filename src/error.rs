use crate::board::Move;

/// Why a column cannot receive a disc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    /// Column index is outside the grid.
    OutOfRange,
    /// Column has no empty cell left.
    ColumnFull,
}

impl std::fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveRejection::OutOfRange => write!(f, "column out of range"),
            MoveRejection::ColumnFull => write!(f, "column is full"),
        }
    }
}

/// Errors raised by the board and the search engines.
///
/// All of them are caller-usage errors: nothing is retried internally.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("illegal move {column}: {reason}")]
    InvalidMove { column: Move, reason: MoveRejection },

    #[error("no move to undo")]
    EmptyHistory,

    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("invalid board: {0}")]
    InvalidBoard(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_move_display() {
        let err = GameError::InvalidMove {
            column: 3,
            reason: MoveRejection::ColumnFull,
        };
        assert_eq!(err.to_string(), "illegal move 3: column is full");

        let err = GameError::InvalidMove {
            column: 9,
            reason: MoveRejection::OutOfRange,
        };
        assert_eq!(err.to_string(), "illegal move 9: column out of range");
    }

    #[test]
    fn test_precondition_display() {
        let err = GameError::PreconditionViolation("game is already finished".to_string());
        assert_eq!(
            err.to_string(),
            "precondition violated: game is already finished"
        );
        assert_eq!(GameError::EmptyHistory.to_string(), "no move to undo");
    }
}
