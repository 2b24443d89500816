//! Standalone play: a board plus a short undo history.
//!
//! The search never touches this; it is what a driver (the CLI, a test
//! harness) uses to advance a position and step back.

use std::collections::VecDeque;

use rand::Rng;

use crate::engine::{Board, Move};

/// Number of earlier positions kept for undo.
pub const MAX_HISTORY: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct Game {
    board: Board,
    history: VecDeque<Board>,
}

impl Game {
    pub fn new(board: Board) -> Self {
        Self { board, history: VecDeque::with_capacity(MAX_HISTORY) }
    }

    /// Start from an empty board with two random tiles.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let first = Board::EMPTY.with_random_tile(&mut *rng);
        Self::new(first.with_random_tile(rng))
    }

    #[inline]
    pub fn board(&self) -> Board { self.board }

    /// Slide in `dir`. A move that changes the board pushes the previous
    /// position onto the history; a no-op leaves the history alone.
    pub fn apply(&mut self, dir: Move) -> bool {
        let before = self.board;
        if !self.board.apply(dir) {
            return false;
        }
        self.push_history(before);
        true
    }

    /// Drop a 2 (90%) or 4 (10%) on a random empty cell. False when the board is full.
    pub fn spawn_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.board.count_empty() == 0 {
            return false;
        }
        self.board = self.board.with_random_tile(rng);
        true
    }

    /// Apply `dir` and, if it changed anything, spawn a tile.
    ///
    /// ```
    /// use ai_2048_expectimax::engine::{Board, Move};
    /// use ai_2048_expectimax::game::Game;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let mut game = Game::new("2 0 0 2  0 0 0 0  0 0 0 0  0 0 0 0".parse().unwrap());
    /// assert!(game.step(Move::Left, &mut rng));
    /// assert_eq!(game.board().get(0, 0), 4);
    /// assert_eq!(game.board().count_occupied(), 2);
    /// ```
    pub fn step<R: Rng + ?Sized>(&mut self, dir: Move, rng: &mut R) -> bool {
        if !self.apply(dir) {
            return false;
        }
        self.spawn_tile(rng);
        true
    }

    /// Restore the position before the last applied move.
    pub fn undo(&mut self) -> bool {
        match self.history.pop_back() {
            Some(prev) => {
                self.board = prev;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn undo_count(&self) -> usize { self.history.len() }

    pub fn clear_history(&mut self) { self.history.clear(); }

    #[inline]
    pub fn is_game_over(&self) -> bool { self.board.is_game_over() }

    fn push_history(&mut self, board: Board) {
        if self.history.len() == MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(board);
    }
}
