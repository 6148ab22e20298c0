//! Line-based text protocol for driving the engines.
//!
//! The protocol follows the shape of GTP: one command per line, an optional
//! numeric id in front, and replies of the form `=id message` on success or
//! `?id message` on failure, each followed by a blank line.
//!
//! ## Supported Commands
//!
//! - `name` - Return engine name
//! - `version` - Return engine version
//! - `protocol_version` - Return protocol version (2)
//! - `list_commands` - List all supported commands
//! - `known_command <cmd>` - Check if a command is supported
//! - `quit` - Exit the loop
//! - `clear_board` - Reset to the empty grid
//! - `play <column>` - Drop a disc for the player to move
//! - `undo` - Take back the last move
//! - `genmove` - Let the current engine choose and play a move
//! - `engine [minmax|mcts]` - Show or switch the current engine
//! - `valid_moves` - List playable columns
//! - `showboard` - Render the grid
//! - `result` - `X`, `O`, `draw`, or `none` while the game is running

use std::io::{self, BufRead, Write};

use tracing::{info, warn};

use crate::board::{GameState, Player};
use crate::engine::{Engine, EngineKind};
use crate::error::GameError;
use crate::mcts::MctsConfig;
use crate::minmax::MinMaxConfig;

/// The list of known protocol commands.
const KNOWN_COMMANDS: &[&str] = &[
    "clear_board",
    "engine",
    "genmove",
    "known_command",
    "list_commands",
    "name",
    "play",
    "protocol_version",
    "quit",
    "result",
    "showboard",
    "undo",
    "valid_moves",
    "version",
];

/// Protocol session state.
pub struct ProtocolSession {
    /// Authoritative game state, only mutated by `play`, `undo` and `genmove`
    state: GameState,
    kind: EngineKind,
    engine: Box<dyn Engine>,
    minmax: MinMaxConfig,
    mcts: MctsConfig,
}

impl ProtocolSession {
    /// Create a session with the given engine configurations.
    pub fn new(
        kind: EngineKind,
        minmax: MinMaxConfig,
        mcts: MctsConfig,
    ) -> Result<Self, GameError> {
        let engine = kind.build(&minmax, &mcts)?;
        Ok(Self {
            state: GameState::new(),
            kind,
            engine,
            minmax,
            mcts,
        })
    }

    /// Current authoritative state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }

            let command = parts[0].to_lowercase();
            let args = &parts[1..];

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command id from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    /// Execute a command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "2".to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&arg.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => (true, String::new()),

            "clear_board" => {
                self.state = GameState::new();
                (true, String::new())
            }

            "play" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let Ok(column) = arg.parse::<usize>() else {
                    return (false, format!("invalid column: {arg}"));
                };
                if self.state.is_finished() {
                    return (false, "game is over".to_string());
                }
                match self.state.play(column) {
                    Ok(()) => (true, String::new()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "undo" => match self.state.undo() {
                Ok(column) => (true, column.to_string()),
                Err(e) => (false, e.to_string()),
            },

            "genmove" => match self.engine.choose_move(&self.state) {
                Ok(column) => match self.state.play(column) {
                    Ok(()) => {
                        info!(engine = self.engine.name(), column, "engine played");
                        (true, column.to_string())
                    }
                    Err(e) => (false, e.to_string()),
                },
                Err(e) => {
                    warn!(error = %e, "genmove failed");
                    (false, e.to_string())
                }
            },

            "engine" => {
                let Some(arg) = args.first() else {
                    return (true, self.kind.to_string());
                };
                let kind = match arg.parse::<EngineKind>() {
                    Ok(kind) => kind,
                    Err(e) => return (false, e),
                };
                match kind.build(&self.minmax, &self.mcts) {
                    Ok(engine) => {
                        self.kind = kind;
                        self.engine = engine;
                        (true, String::new())
                    }
                    Err(e) => (false, e.to_string()),
                }
            }

            "valid_moves" => {
                let moves: Vec<String> = self
                    .state
                    .valid_moves()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                (true, moves.join(" "))
            }

            "showboard" => (true, format!("\n{}", self.state)),

            "result" => (true, result_text(&self.state).to_string()),

            _ => (false, format!("unknown command: {command}")),
        }
    }
}

/// Result of the game in protocol terms.
pub fn result_text(state: &GameState) -> &'static str {
    match state.outcome() {
        Some(Player::X) => "X",
        Some(Player::O) => "O",
        None if state.is_finished() => "draw",
        None => "none",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ProtocolSession {
        ProtocolSession::new(
            EngineKind::MinMax,
            MinMaxConfig::for_testing(),
            MctsConfig::for_testing(),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = ProtocolSession::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = ProtocolSession::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_name_command() {
        let mut session = session();
        let (success, response) = session.execute("name", &[]);
        assert!(success);
        assert_eq!(response, "connect-four-search");
    }

    #[test]
    fn test_known_command() {
        let mut session = session();

        let (success, response) = session.execute("known_command", &["genmove"]);
        assert!(success);
        assert_eq!(response, "true");

        let (success, response) = session.execute("known_command", &["komi"]);
        assert!(success);
        assert_eq!(response, "false");
    }

    #[test]
    fn test_play_undo_and_clear() {
        let mut session = session();

        let (success, _) = session.execute("play", &["3"]);
        assert!(success);
        let (success, _) = session.execute("play", &["9"]);
        assert!(!success);
        assert_eq!(session.state().history(), &[3]);

        let (success, response) = session.execute("undo", &[]);
        assert!(success);
        assert_eq!(response, "3");
        let (success, _) = session.execute("undo", &[]);
        assert!(!success);

        session.execute("play", &["0"]);
        let (success, _) = session.execute("clear_board", &[]);
        assert!(success);
        assert_eq!(session.state().filled(), 0);
    }

    #[test]
    fn test_genmove_plays_valid_column() {
        let mut session = session();
        let (success, response) = session.execute("genmove", &[]);
        assert!(success);
        let column: usize = response.parse().unwrap();
        assert!(column < crate::constants::NUM_COLUMNS);
        assert_eq!(session.state().history(), &[column]);
    }

    #[test]
    fn test_switch_engine() {
        let mut session = session();
        assert_eq!(session.execute("engine", &[]), (true, "minmax".to_string()));
        assert!(session.execute("engine", &["mcts"]).0);
        assert_eq!(session.execute("engine", &[]), (true, "mcts".to_string()));
        assert!(!session.execute("engine", &["random"]).0);
    }

    #[test]
    fn test_run_loop_replies() {
        let mut session = session();
        let input = b"1 play 2\n# comment\n2 valid_moves\n3 result\nquit\nname\n";
        let mut output = Vec::new();
        session.run(&input[..], &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text, "=1 \n\n=2 0 1 2 3 4 5 6\n\n=3 none\n\n= \n\n");
    }
}
