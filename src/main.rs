//! `c4`: play Connect Four against the search engines.
//!
//! ## Usage
//!
//! - `c4` - Engine self-play demo
//! - `c4 play --engine mcts` - Play against an engine in the terminal
//! - `c4 protocol` - Start the line protocol on stdin/stdout
//! - `c4 analyze 3344` - Ask an engine for a move after the given columns

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use connect_four_search::board::{GameState, Move};
use connect_four_search::constants::{
    EXPLORATION, MAX_DEPTH, MC_SAMPLES, MCTS_ITERATIONS, ROLLOUT_BIAS, SAMPLES_PER_LEAF,
};
use connect_four_search::engine::EngineKind;
use connect_four_search::mcts::{Mcts, MctsConfig};
use connect_four_search::minmax::{MinMax, MinMaxConfig};
use connect_four_search::protocol::{ProtocolSession, result_text};

/// Connect-Four search engines (negamax and MCTS)
#[derive(Parser)]
#[command(name = "c4")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    search: SearchArgs,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Play against an engine, reading columns from stdin
    Play {
        /// Engine to play against (minmax or mcts)
        #[arg(long, default_value = "minmax")]
        engine: EngineKind,
        /// Let the engine make the first move
        #[arg(long)]
        engine_first: bool,
    },
    /// Let two engines play each other
    Selfplay {
        /// Engine playing X
        #[arg(long, default_value = "minmax")]
        x: EngineKind,
        /// Engine playing O
        #[arg(long, default_value = "mcts")]
        o: EngineKind,
    },
    /// Run the line protocol on stdin/stdout
    Protocol {
        /// Engine used by genmove until switched
        #[arg(long, default_value = "minmax")]
        engine: EngineKind,
    },
    /// Suggest a move for a position given as a sequence of column digits
    Analyze {
        /// Columns played so far, e.g. "3344"
        moves: String,
        #[arg(long, default_value = "minmax")]
        engine: EngineKind,
    },
}

/// Engine tuning shared by every subcommand.
#[derive(Args)]
struct SearchArgs {
    /// Negamax depth in plies
    #[arg(long, global = true, default_value_t = MAX_DEPTH)]
    depth: usize,
    /// Rollouts per negamax leaf
    #[arg(long, global = true, default_value_t = MC_SAMPLES)]
    mc_samples: usize,
    /// MCTS iterations per move
    #[arg(long, global = true, default_value_t = MCTS_ITERATIONS)]
    iterations: usize,
    /// MCTS rollouts per expanded node
    #[arg(long, global = true, default_value_t = SAMPLES_PER_LEAF)]
    samples: usize,
    /// UCT exploration constant
    #[arg(long, global = true, default_value_t = EXPLORATION)]
    exploration: f64,
    /// Probability that a rollout takes an immediate win
    #[arg(long, global = true, default_value_t = ROLLOUT_BIAS)]
    bias: f64,
    /// MCTS wall-clock budget per move in milliseconds
    #[arg(long, global = true)]
    time_limit_ms: Option<u64>,
    /// Seed for reproducible play
    #[arg(long, global = true)]
    seed: Option<u64>,
}

impl SearchArgs {
    fn minmax(&self) -> MinMaxConfig {
        MinMaxConfig {
            max_depth: self.depth,
            mc_samples: self.mc_samples,
            rollout_bias: self.bias,
            seed: self.seed,
        }
    }

    fn mcts(&self) -> MctsConfig {
        MctsConfig {
            iterations: self.iterations,
            samples_per_leaf: self.samples,
            exploration: self.exploration,
            rollout_bias: self.bias,
            time_limit: self.time_limit_ms.map(Duration::from_millis),
            seed: self.seed,
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let minmax = cli.search.minmax();
    let mcts = cli.search.mcts();

    match cli.command {
        Some(Commands::Play {
            engine,
            engine_first,
        }) => run_play(engine, engine_first, &minmax, &mcts),
        Some(Commands::Protocol { engine }) => {
            let mut session = ProtocolSession::new(engine, minmax, mcts)?;
            let stdin = io::stdin();
            session
                .run(stdin.lock(), io::stdout())
                .context("protocol I/O failed")
        }
        Some(Commands::Analyze { moves, engine }) => run_analyze(&moves, engine, &minmax, &mcts),
        Some(Commands::Selfplay { x, o }) => run_selfplay(x, o, &minmax, &mcts),
        None => run_selfplay(EngineKind::MinMax, EngineKind::Mcts, &minmax, &mcts),
    }
}

fn run_play(
    kind: EngineKind,
    engine_first: bool,
    minmax: &MinMaxConfig,
    mcts: &MctsConfig,
) -> Result<()> {
    let mut engine = kind.build(minmax, mcts)?;
    let mut state = GameState::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut engine_turn = engine_first;

    println!("You are playing against {kind}.");
    while !state.is_finished() {
        println!("{state}");
        let column = if engine_turn {
            let column = engine.choose_move(&state)?;
            println!("{kind} drops a disc in column {column}");
            column
        } else {
            let column = read_move(&state, &mut lines)?;
            println!("You drop a disc in column {column}");
            column
        };
        state.play(column)?;
        engine_turn = !engine_turn;
    }

    println!("{state}");
    match result_text(&state) {
        "draw" => println!("It is a draw"),
        winner => println!("The winner is {winner}"),
    }
    Ok(())
}

fn read_move<B: BufRead>(state: &GameState, lines: &mut io::Lines<B>) -> Result<Move> {
    let valid = state.valid_moves();
    loop {
        print!("Pick a column from {valid:?}: ");
        io::stdout().flush().context("failed to flush stdout")?;
        let Some(line) = lines.next() else {
            bail!("input closed before the game ended");
        };
        let line = line.context("failed to read stdin")?;
        match line.trim().parse::<Move>() {
            Ok(column) if valid.contains(&column) => return Ok(column),
            _ => println!("Invalid input, expected one of {valid:?}"),
        }
    }
}

fn run_selfplay(
    x: EngineKind,
    o: EngineKind,
    minmax: &MinMaxConfig,
    mcts: &MctsConfig,
) -> Result<()> {
    let mut engines = [x.build(minmax, mcts)?, o.build(minmax, mcts)?];
    let mut state = GameState::new();
    let mut turn = 0;

    println!("Self-play: X = {x}, O = {o}\n");
    while !state.is_finished() {
        let player = state.player();
        let column = engines[turn % 2].choose_move(&state)?;
        state.play(column)?;
        println!("{player} ({}) plays {column}", engines[turn % 2].name());
        println!("{state}");
        turn += 1;
    }
    println!("Result: {}", result_text(&state));
    Ok(())
}

fn run_analyze(
    moves: &str,
    kind: EngineKind,
    minmax: &MinMaxConfig,
    mcts: &MctsConfig,
) -> Result<()> {
    let columns = moves
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| {
            c.to_digit(10)
                .map(|d| d as Move)
                .with_context(|| format!("not a column digit: {c}"))
        })
        .collect::<Result<Vec<_>>>()?;
    let state = GameState::from_moves(&columns)?;
    println!("{state}");

    match kind {
        EngineKind::MinMax => {
            let mut engine = MinMax::new(minmax.clone())?;
            let outcome = engine.search(&state)?;
            println!(
                "{} to move: column {} (score {})",
                state.player(),
                outcome.mv,
                outcome.score
            );
        }
        EngineKind::Mcts => {
            let mut engine = Mcts::new(mcts.clone())?;
            let tree = engine.search_tree(&state)?;
            let column = tree
                .best_action(engine.config().exploration)
                .context("search produced no move")?;
            print!("{tree}");
            println!("{} to move: column {column}", state.player());
        }
    }
    Ok(())
}
