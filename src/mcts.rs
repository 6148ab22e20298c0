//! Monte Carlo Tree Search (MCTS) with the UCT selection rule.
//!
//! Each iteration runs four phases:
//! - Selection: descend by UCT through fully expanded nodes
//! - Expansion: attach one child for a random untried move
//! - Simulation: run `samples_per_leaf` biased rollouts from the new child
//! - Backpropagation: add the summed outcome up the parent chain, negating it
//!   at every ply
//!
//! Nodes live in an arena and refer to each other through [`NodeId`] handles.
//! A node's reward is kept from the point of view of the player who moved
//! into it, so a parent always picks the child with the highest score.
//! The whole tree is discarded after each decision.

use std::fmt;
use std::time::{Duration, Instant};

use fastrand::Rng;
use tracing::{debug, trace};

use crate::board::{GameState, Move, Player};
use crate::constants::{
    EXPLORATION, MCTS_ITERATIONS, REPORT_PERIOD, ROLLOUT_BIAS, SAMPLES_PER_LEAF,
};
use crate::error::GameError;
use crate::playout::RandomPlayout;

/// Configuration for Monte Carlo Tree Search.
#[derive(Debug, Clone, PartialEq)]
pub struct MctsConfig {
    /// Number of full select/expand/simulate/backpropagate cycles.
    pub iterations: usize,
    /// Rollouts run from every expanded node.
    pub samples_per_leaf: usize,
    /// Exploration constant `C` in the UCT formula.
    pub exploration: f64,
    /// Rollout bias towards immediate wins, in `[0, 1]`.
    pub rollout_bias: f64,
    /// Optional wall-clock budget. At least one iteration always runs.
    pub time_limit: Option<Duration>,
    /// Seed for reproducible search. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: MCTS_ITERATIONS,
            samples_per_leaf: SAMPLES_PER_LEAF,
            exploration: EXPLORATION,
            rollout_bias: ROLLOUT_BIAS,
            time_limit: None,
            seed: None,
        }
    }
}

impl MctsConfig {
    /// Create a fast, deterministic config for testing.
    pub fn for_testing() -> Self {
        Self {
            iterations: 50,
            samples_per_leaf: 10,
            exploration: EXPLORATION,
            rollout_bias: ROLLOUT_BIAS,
            time_limit: None,
            seed: Some(0),
        }
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.iterations == 0 {
            return Err(GameError::PreconditionViolation(
                "iterations must be at least 1".to_string(),
            ));
        }
        if self.samples_per_leaf == 0 {
            return Err(GameError::PreconditionViolation(
                "samples_per_leaf must be at least 1".to_string(),
            ));
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(GameError::PreconditionViolation(format!(
                "exploration must be finite and non-negative (got {})",
                self.exploration
            )));
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

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Position reached at this node
    pub state: GameState,
    /// Column played to reach this node (`None` at the root)
    pub action: Option<Move>,
    /// Parent handle (`None` at the root)
    pub parent: Option<NodeId>,
    /// Expanded children, in expansion order
    pub children: Vec<NodeId>,
    /// Moves not yet expanded into children
    pub unexpanded: Vec<Move>,
    /// Number of rollouts accounted for in this subtree
    pub visits: u64,
    /// Sum of rollout outcomes for the player who moved into this node
    pub reward: f64,
    /// Player to move at this node
    pub player: Player,
}

impl SearchNode {
    fn new(state: GameState, parent: Option<NodeId>, action: Option<Move>) -> Self {
        let unexpanded = if state.is_finished() {
            Vec::new()
        } else {
            state.valid_moves()
        };
        let player = state.player();
        Self {
            state,
            action,
            parent,
            children: Vec::new(),
            unexpanded,
            visits: 0,
            reward: 0.0,
            player,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.state.is_finished()
    }

    #[inline]
    pub fn is_fully_expanded(&self) -> bool {
        self.unexpanded.is_empty()
    }

    /// Mean rollout outcome for the player who moved into this node.
    #[inline]
    pub fn estimate(&self) -> f64 {
        if self.visits > 0 {
            self.reward / self.visits as f64
        } else {
            0.0
        }
    }
}

/// MCTS tree with arena-based node storage.
#[derive(Debug, Clone)]
pub struct MctsTree {
    nodes: Vec<SearchNode>,
}

impl MctsTree {
    /// Create a tree holding only the root position.
    pub fn new(root_state: GameState) -> Self {
        Self {
            nodes: vec![SearchNode::new(root_state, None, None)],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.index()]
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id.index()]
    }

    /// Total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// UCT score of `child` under a parent with `parent_visits` visits.
    fn uct(&self, child: NodeId, parent_visits: u64, exploration: f64) -> f64 {
        let node = self.get(child);
        let visits = node.visits as f64;
        node.estimate() + exploration * (2.0 * (parent_visits as f64).ln() / visits).sqrt()
    }

    /// Child of `id` with the highest UCT score. Ties go to the earliest child.
    pub fn best_child(&self, id: NodeId, exploration: f64) -> Option<NodeId> {
        let parent_visits = self.get(id).visits;
        let mut best: Option<(NodeId, f64)> = None;
        for &child in &self.get(id).children {
            let score = self.uct(child, parent_visits, exploration);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((child, score));
            }
        }
        best.map(|(child, _)| child)
    }

    /// Descend from the root until reaching a terminal node or a node with
    /// untried moves.
    fn select(&self, exploration: f64) -> NodeId {
        let mut current = self.root();
        loop {
            let node = self.get(current);
            if node.is_terminal() || !node.is_fully_expanded() {
                return current;
            }
            match self.best_child(current, exploration) {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Remove a random untried move from `id` and attach the resulting child.
    fn expand(&mut self, id: NodeId, rng: &mut Rng) -> Result<NodeId, GameError> {
        let node = self.get_mut(id);
        let pick = rng.usize(..node.unexpanded.len());
        let mv = node.unexpanded.swap_remove(pick);
        let child_state = node.state.with_move(mv)?;

        let child_id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SearchNode::new(child_state, Some(id), Some(mv)));
        self.get_mut(id).children.push(child_id);
        Ok(child_id)
    }

    /// Add `outcome` over `samples` rollouts to `leaf` and every ancestor,
    /// flipping the sign at each ply.
    pub fn backpropagate(&mut self, leaf: NodeId, outcome: f64, samples: u64) {
        let mut current = Some(leaf);
        let mut value = outcome;
        while let Some(id) = current {
            let node = self.get_mut(id);
            node.visits += samples;
            node.reward += value;
            value = -value;
            current = node.parent;
        }
    }

    /// Run one full selection/expansion/simulation/backpropagation cycle.
    pub fn iterate(
        &mut self,
        config: &MctsConfig,
        policy: &RandomPlayout,
        rng: &mut Rng,
    ) -> Result<(), GameError> {
        let selected = self.select(config.exploration);
        let leaf = if self.get(selected).is_terminal() {
            selected
        } else {
            self.expand(selected, rng)?
        };

        // Score from the point of view of the player who moved into the leaf.
        let node = self.get(leaf);
        let mover = node.player.opponent();
        let total = policy.sample(&node.state, config.samples_per_leaf, mover, rng)?;

        self.backpropagate(leaf, total as f64, config.samples_per_leaf as u64);
        Ok(())
    }

    /// Column leading to the root's UCT-best child.
    pub fn best_action(&self, exploration: f64) -> Option<Move> {
        self.best_child(self.root(), exploration)
            .and_then(|child| self.get(child).action)
    }

    fn fmt_children(&self, f: &mut fmt::Formatter<'_>, id: NodeId, prefix: &str) -> fmt::Result {
        let children = &self.get(id).children;
        for (i, &child) in children.iter().enumerate() {
            let last = i + 1 == children.len();
            let (connector, extension) = if last { ("└──", "   ") } else { ("├──", "│  ") };
            let node = self.get(child);
            writeln!(
                f,
                "{prefix}{connector}{} {}/{}",
                node.action.unwrap_or_default(),
                node.reward,
                node.visits
            )?;
            self.fmt_children(f, child, &format!("{prefix}{extension}"))?;
        }
        Ok(())
    }
}

impl fmt::Display for MctsTree {
    /// One line per node: `column reward/visits`, children indented below.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = self.get(self.root());
        writeln!(f, "root {}/{}", root.reward, root.visits)?;
        self.fmt_children(f, self.root(), "")
    }
}

/// UCT search engine. Builds a fresh tree for every decision.
pub struct Mcts {
    config: MctsConfig,
    policy: RandomPlayout,
    rng: Rng,
}

impl Mcts {
    pub fn new(config: MctsConfig) -> Result<Self, GameError> {
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
        })
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Build and grow a search tree rooted at a copy of `state`.
    ///
    /// # Errors
    /// `PreconditionViolation` if the game is already finished.
    pub fn search_tree(&mut self, state: &GameState) -> Result<MctsTree, GameError> {
        if state.is_finished() {
            return Err(GameError::PreconditionViolation(
                "search called on a finished game".to_string(),
            ));
        }

        let start = Instant::now();
        let mut tree = MctsTree::new(state.clone());
        for i in 0..self.config.iterations {
            tree.iterate(&self.config, &self.policy, &mut self.rng)?;

            if i > 0 && i % REPORT_PERIOD == 0 {
                let root = tree.get(tree.root());
                trace!(iteration = i, nodes = tree.len(), visits = root.visits, "mcts progress");
            }
            if let Some(limit) = self.config.time_limit {
                if start.elapsed() >= limit {
                    debug!(iterations = i + 1, "mcts time limit reached");
                    break;
                }
            }
        }

        for &child in &tree.get(tree.root()).children {
            let node = tree.get(child);
            trace!(
                mv = node.action.unwrap_or_default(),
                visits = node.visits,
                reward = node.reward,
                estimate = node.estimate(),
                "root child"
            );
        }
        debug!(
            player = %state.player(),
            nodes = tree.len(),
            visits = tree.get(tree.root()).visits,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "mcts search finished"
        );
        Ok(tree)
    }

    /// Pick a move for the player to move in `state`.
    pub fn search(&mut self, state: &GameState) -> Result<Move, GameError> {
        let tree = self.search_tree(state)?;
        tree.best_action(self.config.exploration).ok_or_else(|| {
            GameError::PreconditionViolation("search produced no children".to_string())
        })
    }
}
