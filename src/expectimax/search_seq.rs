use std::collections::HashMap;

use ahash::RandomState as AHasher;
use log::{debug, trace};

use crate::engine::{Board, BoardKey, Move};

use super::heuristic::evaluate_board;
use super::{build_report, pick_best, BranchEval, ExpectimaxConfig, MoveReport, SearchStats};

/// Single-threaded Expectimax search.
///
/// Every top-level call ([`best_move`](Self::best_move),
/// [`branch_evals`](Self::branch_evals), [`report`](Self::report),
/// [`state_value`](Self::state_value)) starts from an empty transposition
/// table and fresh counters.
pub struct Expectimax {
    cfg: ExpectimaxConfig,
    stats: SearchStats,
}

impl Expectimax {
    pub fn new() -> Self { Self::with_config(ExpectimaxConfig::default()) }

    pub fn with_config(cfg: ExpectimaxConfig) -> Self {
        Self { cfg, stats: SearchStats::default() }
    }

    #[inline]
    pub fn config(&self) -> &ExpectimaxConfig { &self.cfg }

    /// Compute the best move using expectimax. `None` means no direction
    /// changes the board.
    ///
    /// Example
    /// ```
    /// use ai_2048_expectimax::engine::{Board, Move};
    /// use ai_2048_expectimax::expectimax::Expectimax;
    /// let mut ex = Expectimax::new();
    /// let b: Board = "0 0 0 0  0 0 0 0  0 0 0 0  0 0 2 2".parse().unwrap();
    /// assert!(ex.best_move(b).is_some());
    /// let dead: Board = "2 4 2 4  4 2 4 2  2 4 2 4  4 2 4 2".parse().unwrap();
    /// assert_eq!(ex.best_move(dead), None);
    /// ```
    pub fn best_move(&mut self, board: Board) -> Option<Move> {
        let branches = self.branch_evals(board);
        let best = pick_best(&branches);
        debug!(
            "best move {:?} (nodes={}, cache_hits={})",
            best, self.stats.nodes, self.stats.cache_hits
        );
        best
    }

    /// Compute EV for each direction.
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

    /// One root search; also returns the depth limit it ran with.
    fn search_root(&mut self, board: Board) -> ([BranchEval; 4], u32) {
        let depth = self.cfg.effective_depth(&board);
        let mut run = SearchRun::new(&self.cfg, depth);
        let out = Move::ALL.map(|dir| run.branch(board, dir));
        let (nodes, cache_hits) = run.counters();
        self.stats.record(nodes, cache_hits);
        trace!("branch evals at depth {depth}: {out:?}");
        (out, depth)
    }

    /// EV at the root, equivalent to the best branch EV. A board with no legal
    /// move gets its static evaluation.
    pub fn state_value(&mut self, board: Board) -> f64 {
        let branches = self.branch_evals(board);
        match pick_best(&branches) {
            Some(dir) => branches[dir.index()].ev,
            None => self.evaluate(&board),
        }
    }

    /// Static evaluation with this engine's weights.
    #[inline]
    pub fn evaluate(&self, board: &Board) -> f64 { evaluate_board(board, &self.cfg.weights) }

    /// Statistics collected from the last top-level call.
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    /// Reset accumulated stats to zero.
    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }
}

impl Default for Expectimax { fn default() -> Self { Self::new() } }

/// State of one top-level search: the transposition table and counters.
///
/// The table is keyed by board alone. That is only sound while depth limit and
/// cutoff stay fixed, which holds for the lifetime of a run.
pub(super) struct SearchRun<'a> {
    cfg: &'a ExpectimaxConfig,
    depth_limit: u32,
    table: HashMap<BoardKey, f64, AHasher>,
    nodes: u64,
    cache_hits: u64,
}

impl<'a> SearchRun<'a> {
    pub(super) fn new(cfg: &'a ExpectimaxConfig, depth_limit: u32) -> Self {
        Self { cfg, depth_limit, table: HashMap::with_hasher(AHasher::new()), nodes: 0, cache_hits: 0 }
    }

    pub(super) fn counters(&self) -> (u64, u64) { (self.nodes, self.cache_hits) }

    /// Root evaluation of `dir`: apply it, then average over the spawn.
    pub(super) fn branch(&mut self, board: Board, dir: Move) -> BranchEval {
        let mut next = board;
        if !next.apply(dir) {
            return BranchEval::illegal(dir);
        }
        let ev = self.score_tile_choose_node(&mut next, 1.0, 0);
        BranchEval { dir, ev, legal: true }
    }

    /// Chance node: the game drops a tile on a uniformly chosen empty cell.
    ///
    /// `board` is used as scratch space and is restored before returning.
    fn score_tile_choose_node(&mut self, board: &mut Board, prob: f64, depth: u32) -> f64 {
        if prob < self.cfg.prob_cutoff || depth >= self.depth_limit {
            return evaluate_board(board, &self.cfg.weights);
        }
        let key = board.hash_key();
        if self.cfg.cache_enabled {
            if let Some(&score) = self.table.get(&key) {
                self.cache_hits += 1;
                return score;
            }
        }
        let empties = board.empty_positions();
        if empties.is_empty() {
            return evaluate_board(board, &self.cfg.weights);
        }
        let (two, four) = self.cfg.spawn_odds();
        let base_prob = prob / empties.len() as f64;
        let mut total = 0.0;
        for &(row, col) in &empties {
            if two > 0.0 {
                board.set(row, col, 2);
                total += two * self.score_move_node(board, base_prob * two, depth);
            }
            if four > 0.0 {
                board.set(row, col, 4);
                total += four * self.score_move_node(board, base_prob * four, depth);
            }
            board.set(row, col, 0);
        }
        let score = total / empties.len() as f64;
        if self.cfg.cache_enabled {
            self.table.insert(key, score);
        }
        score
    }

    /// Max node: the player picks the best direction. A position where nothing
    /// moves is scored statically.
    fn score_move_node(&mut self, board: &Board, prob: f64, depth: u32) -> f64 {
        let depth = depth + 1;
        self.nodes += 1;
        let mut best: Option<f64> = None;
        for dir in Move::ALL {
            let mut next = *board;
            if next.apply(dir) {
                let score = self.score_tile_choose_node(&mut next, prob, depth);
                best = Some(best.map_or(score, |b: f64| b.max(score)));
            }
        }
        best.unwrap_or_else(|| evaluate_board(board, &self.cfg.weights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board { s.parse().unwrap() }

    #[test]
    fn single_legal_direction_is_chosen() {
        let only_down = board("2 4 8 16  4 8 16 32  8 16 32 64  0 0 0 0");
        let legal: Vec<Move> = Move::ALL.into_iter().filter(|&d| only_down.shift(d) != only_down).collect();
        assert_eq!(legal, vec![Move::Down]);
        let mut ex = Expectimax::new();
        assert_eq!(ex.best_move(only_down), Some(Move::Down));
    }

    #[test]
    fn dead_board_has_no_move() {
        let mut ex = Expectimax::new();
        let dead = board("2 4 2 4  4 2 4 2  2 4 2 4  4 2 4 2");
        assert_eq!(ex.best_move(dead), None);
        let branches = ex.branch_evals(dead);
        assert!(branches.iter().all(|b| !b.legal && b.ev == f64::NEG_INFINITY));
        assert_eq!(ex.state_value(dead), ex.evaluate(&dead));
    }

    #[test]
    fn top_row_pair_scores_are_pinned() {
        let b = board("0 0 2 2  0 0 0 0  0 0 0 0  0 0 0 0");
        let mut ex = Expectimax::new();
        let branches = ex.branch_evals(b);
        assert!(!branches[Move::Up.index()].legal);
        assert_eq!(branches[Move::Down.index()].ev, 1_608_159.155_968_207_2);
        assert_eq!(ex.best_move(b), Some(Move::Down));
        for _ in 0..3 {
            assert_eq!(ex.best_move(b), Some(Move::Down));
        }
    }

    #[test]
    fn search_is_deterministic() {
        let b = board("2 4 0 0  0 8 0 2  0 0 16 0  4 0 0 2");
        let mut a = Expectimax::new();
        let mut c = Expectimax::new();
        let x = a.branch_evals(b);
        let y = c.branch_evals(b);
        for (p, q) in x.iter().zip(y.iter()) {
            assert_eq!(p.legal, q.legal);
            assert_eq!(p.ev.to_bits(), q.ev.to_bits());
        }
        assert_eq!(a.last_stats(), c.last_stats());
    }

    #[test]
    fn stats_reset_per_call() {
        let b = board("2 0 0 0  0 0 0 0  0 0 0 0  0 0 0 2");
        let mut ex = Expectimax::with_config(ExpectimaxConfig { max_depth: 3, ..Default::default() });
        ex.best_move(b);
        let first = ex.last_stats();
        assert!(first.nodes > 0);
        ex.best_move(b);
        let second = ex.last_stats();
        assert_eq!(first.nodes, second.nodes);
        assert_eq!(first.cache_hits, second.cache_hits);
        assert_eq!(second.peak_nodes, first.nodes);
        ex.reset_stats();
        assert_eq!(ex.last_stats(), SearchStats::default());
    }

    #[test]
    fn cache_only_changes_work_not_termination() {
        let b = board("2 4 0 0  0 0 0 0  0 0 0 0  0 0 0 2");
        let cfg = ExpectimaxConfig { max_depth: 3, ..Default::default() };
        let mut cached = Expectimax::with_config(cfg.clone());
        let mut uncached = Expectimax::with_config(ExpectimaxConfig { cache_enabled: false, ..cfg });
        cached.best_move(b);
        uncached.best_move(b);
        assert!(cached.last_stats().cache_hits > 0);
        assert_eq!(uncached.last_stats().cache_hits, 0);
        assert!(cached.last_stats().nodes < uncached.last_stats().nodes);
    }

    #[test]
    fn horizon_falls_back_to_static_value() {
        let b = board("2 0 0 0  0 0 0 0  0 0 0 0  0 0 0 0");
        // Cutoff above 1.0 truncates every chance node immediately.
        let cfg = ExpectimaxConfig { prob_cutoff: 2.0, ..Default::default() };
        let mut ex = Expectimax::with_config(cfg);
        let branches = ex.branch_evals(b);
        for branch in branches.iter().filter(|b| b.legal) {
            assert_eq!(branch.ev, ex.evaluate(&b.shift(branch.dir)));
        }
        assert_eq!(ex.last_stats().nodes, 0);
    }

    #[test]
    fn report_depth_is_the_searched_depth() {
        let b = board("2 4 8 16  32 64 2 4  8 16 0 0  0 0 0 0");
        let mut ex = Expectimax::with_config(ExpectimaxConfig { max_depth: 4, ..Default::default() });
        let report = ex.report(b);
        assert_eq!(report.depth, 4);
        assert_eq!(report.stats, ex.last_stats());
        assert_eq!(report.best, pick_best(&ex.branch_evals(b)));
    }

    #[test]
    fn report_explains_every_direction() {
        let b = board("0 0 2 2  0 0 0 0  0 0 0 0  0 0 0 0");
        let mut ex = Expectimax::with_config(ExpectimaxConfig { max_depth: 3, ..Default::default() });
        let report = ex.report(b);
        assert_eq!(report.board, b);
        assert_eq!(report.depth, 3);
        assert_eq!(report.best, ex.best_move(b));
        let up = &report.moves[Move::Up.index()];
        assert!(!up.legal);
        assert!(up.breakdown.is_none() && up.board_after.is_none());
        let left = &report.moves[Move::Left.index()];
        assert!(left.legal);
        assert_eq!(left.board_after, Some(b.shift(Move::Left)));
        let breakdown = left.breakdown.unwrap();
        assert_eq!(breakdown.empty, 15);
        assert_eq!(breakdown.total, ex.evaluate(&b.shift(Move::Left)));
    }
}
