use log::debug;
use rayon::prelude::*;

use crate::engine::{Board, Move};

use super::heuristic::evaluate_board;
use super::search_seq::SearchRun;
use super::{build_report, pick_best, BranchEval, ExpectimaxConfig, MoveReport, SearchStats};

/// Parallel Expectimax: the four root directions are searched on rayon workers.
///
/// Each direction gets its own transposition table, so no locking is needed and
/// the result does not depend on scheduling. Scores can differ slightly from
/// [`Expectimax`](super::Expectimax), which shares one table across directions.
pub struct ExpectimaxParallel {
    cfg: ExpectimaxConfig,
    stats: SearchStats,
}

impl ExpectimaxParallel {
    pub fn new() -> Self { Self::with_config(ExpectimaxConfig::default()) }

    pub fn with_config(cfg: ExpectimaxConfig) -> Self {
        Self { cfg, stats: SearchStats::default() }
    }

    #[inline]
    pub fn config(&self) -> &ExpectimaxConfig { &self.cfg }

    /// Compute the best move using parallel expectimax.
    ///
    /// This is a convenience wrapper around `branch_evals` that just picks the best move.
    #[inline]
    pub fn best_move(&mut self, board: Board) -> Option<Move> {
        let (best, _) = self.best_move_with_branches(board);
        best
    }

    /// Get both best move and all branch evaluations from one search.
    pub fn best_move_with_branches(&mut self, board: Board) -> (Option<Move>, [BranchEval; 4]) {
        let branches = self.branch_evals(board);
        let best = pick_best(&branches);
        debug!(
            "best move {:?} (nodes={}, cache_hits={})",
            best, self.stats.nodes, self.stats.cache_hits
        );
        (best, branches)
    }

    /// Compute EV for each direction in parallel.
    ///
    /// Returns a fixed array in order: `[Up, Down, Left, Right]` and marks
    /// illegal moves as `legal=false`.
    pub fn branch_evals(&mut self, board: Board) -> [BranchEval; 4] { self.search_root(board).0 }

    /// Best move together with the static breakdown and resulting board for
    /// every direction.
    pub fn report(&mut self, board: Board) -> MoveReport {
        let (branches, depth) = self.search_root(board);
        build_report(board, branches, depth, self.stats, &self.cfg.weights)
    }

    fn search_root(&mut self, board: Board) -> ([BranchEval; 4], u32) {
        let cfg = &self.cfg;
        let depth = cfg.effective_depth(&board);
        let results: Vec<(BranchEval, (u64, u64))> = Move::ALL
            .par_iter()
            .map(|&dir| {
                let mut run = SearchRun::new(cfg, depth);
                let branch = run.branch(board, dir);
                (branch, run.counters())
            })
            .collect();
        let mut out = Move::ALL.map(BranchEval::illegal);
        let (mut nodes, mut cache_hits) = (0, 0);
        for (branch, (n, h)) in results {
            out[branch.dir.index()] = branch;
            nodes += n;
            cache_hits += h;
        }
        self.stats.record(nodes, cache_hits);
        (out, depth)
    }

    /// EV at root (max node), equivalent to the best branch EV.
    pub fn state_value(&mut self, board: Board) -> f64 {
        let branches = self.branch_evals(board);
        match pick_best(&branches) {
            Some(dir) => branches[dir.index()].ev,
            None => evaluate_board(&board, &self.cfg.weights),
        }
    }

    /// Statistics collected from the last top-level call, summed over directions.
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    /// Reset accumulated stats to zero.
    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }
}

impl Default for ExpectimaxParallel { fn default() -> Self { Self::new() } }
