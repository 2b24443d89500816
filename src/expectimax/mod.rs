//! Expectimax search policy (single-threaded and parallel) for 2048.
//!
//! This module provides two policy implementations:
//! - [`Expectimax`]: single-threaded expectimax.
//! - [`ExpectimaxParallel`]: rayon-based, one search per root direction.
//!
//! Both variants share the same public surface and defaults.
//!
//! Notes
//! - The search alternates chance nodes (a 2 or 4 spawns on an empty cell) and
//!   max nodes (the player picks the best direction), bottoming out in the
//!   static evaluator from [`heuristic`].
//! - The transposition table lives for one top-level call only. Entries are keyed
//!   by board alone, so reusing them across calls or configurations would be wrong.
//! - Expectimax is deterministic; randomness only occurs when a driver spawns
//!   tiles with `Board::with_random_tile`.
//!
//! Quick start
//! ```
//! use ai_2048_expectimax::engine::{Board, Move};
//! use ai_2048_expectimax::expectimax::{Expectimax, ExpectimaxParallel};
//!
//! let b: Board = "0 0 2 2  0 0 0 0  0 0 0 0  0 0 0 0".parse().unwrap();
//!
//! let mut ex = Expectimax::new();
//! let m = ex.best_move(b);
//! assert!(m.is_some());
//!
//! let mut ex_par = ExpectimaxParallel::new();
//! assert!(ex_par.best_move(b).is_some());
//! ```

use crate::engine::{Board, Move};

pub mod heuristic;
mod search_par;
mod search_seq;

pub use heuristic::{evaluate_board, evaluate_board_detailed, score_line, EvalBreakdown, HeuristicWeights};
pub use search_par::ExpectimaxParallel;
pub use search_seq::Expectimax;

/// Configurable knobs for Expectimax. Defaults reproduce the tuned engine.
///
/// - `max_depth`: ceiling on the adaptive depth.
/// - `min_depth`: floor on the adaptive depth.
/// - `prob_cutoff`: stop expanding a chance branch once its cumulative probability drops below this.
/// - `four_probability`: chance that a spawned tile is a 4; a 2 spawns otherwise.
/// - `cache_enabled`: enable/disable transposition table usage.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectimaxConfig {
    pub max_depth: u32,
    pub min_depth: u32,
    pub prob_cutoff: f64,
    pub four_probability: f64,
    pub cache_enabled: bool,
    pub weights: HeuristicWeights,
}

impl Default for ExpectimaxConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            min_depth: 3,
            prob_cutoff: 1e-4,
            four_probability: 0.1,
            cache_enabled: true,
            weights: HeuristicWeights::default(),
        }
    }
}

impl ExpectimaxConfig {
    /// Weights of the two spawn outcomes as `(two, four)`.
    ///
    /// With the default `0.1` both come out as the exact literals `0.9` and `0.1`.
    #[inline]
    pub fn spawn_odds(&self) -> (f64, f64) { (1.0 - self.four_probability, self.four_probability) }

    /// Search depth for `board`: `min(max_depth, max(min_depth, distinct - 2))`.
    ///
    /// Fewer distinct tiles means a smaller merge space, so early positions are
    /// searched as deep as the ceiling allows.
    ///
    /// ```
    /// use ai_2048_expectimax::engine::Board;
    /// use ai_2048_expectimax::expectimax::ExpectimaxConfig;
    /// let cfg = ExpectimaxConfig::default();
    /// assert_eq!(cfg.effective_depth(&Board::EMPTY), 3);
    /// let late: Board = "2 4 8 16  32 64 128 256  512 1024 0 0  0 0 0 0".parse().unwrap();
    /// assert_eq!(cfg.effective_depth(&late), 5);
    /// ```
    pub fn effective_depth(&self, board: &Board) -> u32 {
        let by_stage = (board.count_distinct_tiles() as i64 - 2).max(self.min_depth as i64);
        by_stage.min(self.max_depth as i64) as u32
    }
}

/// Per-branch expected value at the root.
///
/// - `ev` is the expected value for taking `dir` from the current board.
/// - `legal` is false when the move is a no-op; `ev` is then `f64::NEG_INFINITY`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
    pub legal: bool,
}

impl BranchEval {
    #[inline]
    pub(crate) fn illegal(dir: Move) -> Self { Self { dir, ev: f64::NEG_INFINITY, legal: false } }
}

/// Basic search stats for a single evaluation.
///
/// `nodes` counts max-node expansions and `cache_hits` transposition hits,
/// both for the last top-level call. `peak_nodes` is the largest `nodes` seen
/// since construction or the last [`Expectimax::reset_stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub cache_hits: u64,
    pub peak_nodes: u64,
}

impl SearchStats {
    pub(crate) fn record(&mut self, nodes: u64, cache_hits: u64) {
        self.nodes = nodes;
        self.cache_hits = cache_hits;
        self.peak_nodes = self.peak_nodes.max(nodes);
    }
}

/// Everything known about one root direction, for explaining a decision.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveEvaluation {
    pub dir: Move,
    pub legal: bool,
    /// Search score; `f64::NEG_INFINITY` for an illegal move.
    pub score: f64,
    /// Static evaluation of the position right after the move.
    pub breakdown: Option<EvalBreakdown>,
    pub board_after: Option<Board>,
}

/// Decision plus per-direction diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveReport {
    pub board: Board,
    pub best: Option<Move>,
    pub depth: u32,
    pub moves: [MoveEvaluation; 4],
    pub stats: SearchStats,
}

/// Highest legal `ev`; ties go to the earliest direction in [`Move::ALL`] order.
pub(crate) fn pick_best(branches: &[BranchEval; 4]) -> Option<Move> {
    let mut best: Option<&BranchEval> = None;
    for branch in branches.iter().filter(|b| b.legal) {
        if best.map_or(true, |cur| branch.ev > cur.ev) {
            best = Some(branch);
        }
    }
    best.map(|b| b.dir)
}

/// Attach static breakdowns and post-move boards to root evaluations.
pub(crate) fn build_report(
    board: Board,
    branches: [BranchEval; 4],
    depth: u32,
    stats: SearchStats,
    weights: &HeuristicWeights,
) -> MoveReport {
    let moves = branches.map(|branch| {
        if !branch.legal {
            return MoveEvaluation { dir: branch.dir, legal: false, score: branch.ev, breakdown: None, board_after: None };
        }
        let after = board.shift(branch.dir);
        MoveEvaluation {
            dir: branch.dir,
            legal: true,
            score: branch.ev,
            breakdown: Some(evaluate_board_detailed(&after, weights)),
            board_after: Some(after),
        }
    });
    MoveReport { board, best: pick_best(&branches), depth, moves, stats }
}
