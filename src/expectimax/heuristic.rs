//! Static evaluator: every row and every column is scored as a line and summed.
//!
//! Line structure credit to Nneonneo. Tile values enter as ranks (`log2(value)`).
//! Each empty cell belongs to one row and one column, so the empty term is
//! effectively counted twice; `empty_weight` is tuned with that in mind.

use serde::Deserialize;

use crate::engine::{Board, Tile, SIZE};

/// Evaluator weights. Defaults are the tuned values.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    /// Constant offset per line. Keeps scores positive; cancels out when comparing boards.
    pub lost_penalty: f64,
    pub empty_weight: f64,
    pub merges_weight: f64,
    pub monotonicity_weight: f64,
    pub monotonicity_power: f64,
    pub sum_weight: f64,
    pub sum_power: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            lost_penalty: 200_000.0,
            empty_weight: 270.0,
            merges_weight: 700.0,
            monotonicity_weight: 47.0,
            monotonicity_power: 4.0,
            sum_weight: 11.0,
            sum_power: 3.5,
        }
    }
}

/// Decomposed evaluation of a board (or of a single line).
///
/// For a whole board `empty` is the true number of empty cells while
/// `empty_score` is what the total actually received (each empty cell scored
/// once by its row and once by its column).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvalBreakdown {
    pub empty: u32,
    pub empty_score: f64,
    pub merges: u32,
    pub merges_score: f64,
    pub monotonicity: f64,
    pub monotonicity_score: f64,
    pub sum: f64,
    pub sum_score: f64,
    pub total: f64,
}

impl EvalBreakdown {
    fn accumulate(&mut self, line: &EvalBreakdown) {
        self.empty += line.empty;
        self.empty_score += line.empty_score;
        self.merges += line.merges;
        self.merges_score += line.merges_score;
        self.monotonicity += line.monotonicity;
        self.monotonicity_score += line.monotonicity_score;
        self.sum += line.sum;
        self.sum_score += line.sum_score;
        self.total += line.total;
    }
}

/// Heuristic score of one board: sum of [`score_line`] over 4 rows and 4 columns.
///
/// ```
/// use ai_2048_expectimax::engine::Board;
/// use ai_2048_expectimax::expectimax::{evaluate_board, HeuristicWeights};
/// let w = HeuristicWeights::default();
/// // Eight all-empty lines: offset plus four empties each.
/// assert_eq!(evaluate_board(&Board::EMPTY, &w), 8.0 * (200_000.0 + 4.0 * 270.0));
/// ```
pub fn evaluate_board(board: &Board, weights: &HeuristicWeights) -> f64 {
    (0..SIZE).fold(0.0, |score, idx| {
        score + score_line(&board.rows()[idx], weights) + score_line(&board.column(idx), weights)
    })
}

/// Like [`evaluate_board`] but keeps every term.
pub fn evaluate_board_detailed(board: &Board, weights: &HeuristicWeights) -> EvalBreakdown {
    let mut out = EvalBreakdown::default();
    for idx in 0..SIZE {
        out.accumulate(&line_breakdown(&board.rows()[idx], weights));
        out.accumulate(&line_breakdown(&board.column(idx), weights));
    }
    let empty = board.count_empty() as u32;
    out.empty = empty;
    out.empty_score = weights.empty_weight * empty as f64 * 2.0;
    out
}

/// Score of a single row or column.
///
/// ```
/// use ai_2048_expectimax::expectimax::{score_line, HeuristicWeights};
/// let w = HeuristicWeights::default();
/// assert_eq!(score_line(&[2, 2, 0, 0], &w), 201_918.0);
/// ```
#[inline]
pub fn score_line(line: &[Tile; SIZE], weights: &HeuristicWeights) -> f64 {
    line_breakdown(line, weights).total
}

fn line_breakdown(line: &[Tile; SIZE], w: &HeuristicWeights) -> EvalBreakdown {
    let empty = calc_empty(line);
    let merges = calc_merges(line);
    let monotonicity = calc_monotonicity(line, w.monotonicity_power);
    let sum = calc_sum(line, w.sum_power);

    let empty_score = w.empty_weight * empty as f64;
    let merges_score = w.merges_weight * merges as f64;
    let monotonicity_score = -w.monotonicity_weight * monotonicity;
    let sum_score = -w.sum_weight * sum;
    EvalBreakdown {
        empty,
        empty_score,
        merges,
        merges_score,
        monotonicity,
        monotonicity_score,
        sum,
        sum_score,
        total: w.lost_penalty + empty_score + merges_score + monotonicity_score + sum_score,
    }
}

#[inline]
fn rank(tile: Tile) -> f64 { tile.trailing_zeros() as f64 }

fn calc_empty(line: &[Tile]) -> u32 {
    line.iter().filter(|&&v| v == 0).count() as u32
}

/// Runs of equal ranks among non-zero tiles; zeros are skipped, not run breakers.
/// A run of length `k > 1` contributes `k`.
fn calc_merges(line: &[Tile]) -> u32 {
    let mut prev = 0;
    let mut counter = 0;
    let mut merges = 0;
    for &tile in line.iter().filter(|&&v| v != 0) {
        if prev == tile {
            counter += 1;
        } else if counter > 0 {
            merges += 1 + counter;
            counter = 0;
        }
        prev = tile;
    }
    if counter > 0 {
        merges += 1 + counter;
    }
    merges
}

/// Smaller of the decreasing and increasing penalties; pairs touching an empty cell are ignored.
fn calc_monotonicity(line: &[Tile], power: f64) -> f64 {
    let mut monotonicity_left = 0.;
    let mut monotonicity_right = 0.;
    for pair in line.windows(2) {
        if pair[0] == 0 || pair[1] == 0 {
            continue;
        }
        let rank1 = rank(pair[0]);
        let rank2 = rank(pair[1]);
        if rank1 > rank2 {
            monotonicity_left += rank1.powf(power) - rank2.powf(power);
        } else {
            monotonicity_right += rank2.powf(power) - rank1.powf(power);
        }
    }
    monotonicity_left.min(monotonicity_right)
}

fn calc_sum(line: &[Tile], power: f64) -> f64 {
    line.iter().filter(|&&v| v != 0).fold(0., |acc, &tile| acc + rank(tile).powf(power))
}
