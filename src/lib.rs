//! ai-2048-expectimax: a 2048 move-search engine
//!
//! This crate provides:
//! - A `Board` value type with the four slide/merge moves and the queries the
//!   search needs (`engine` module)
//! - An Expectimax policy with single-threaded and parallel variants and a tuned
//!   static evaluator (`expectimax` module)
//! - A small undo-capable game wrapper for standalone play (`game` module)
//! - TOML settings for depth, cutoff, spawn odds and evaluator weights (`config` module)
//!
//! Quick start:
//! ```
//! use ai_2048_expectimax::engine::{Board, Move};
//! use ai_2048_expectimax::expectimax::Expectimax;
//!
//! let board: Board = "0 0 2 2  0 0 0 0  0 0 0 0  0 0 0 0".parse().unwrap();
//! let mut ai = Expectimax::new();
//! let dir = ai.best_move(board).expect("board has a legal move");
//! assert_ne!(board.shift(dir), board);
//! ```
//!
//! Full loop (simplest possible)
//! ```
//! use ai_2048_expectimax::expectimax::{Expectimax, ExpectimaxConfig};
//! use ai_2048_expectimax::game::Game;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // 1) Policy with a shallow cap to keep doctests fast
//! let mut policy = Expectimax::with_config(ExpectimaxConfig { max_depth: 2, ..Default::default() });
//! let mut rng = StdRng::seed_from_u64(123);
//!
//! // 2) Start board with two random tiles (deterministic via seeded RNG)
//! let mut game = Game::random(&mut rng);
//! let mut moves = 0u32;
//!
//! // 3) Loop a couple of moves to demonstrate flow
//! while !game.is_game_over() && moves < 4 {
//!     match policy.best_move(game.board()) {
//!         Some(dir) => {
//!             game.step(dir, &mut rng);
//!             moves += 1;
//!         }
//!         None => break,
//!     }
//! }
//! assert!(moves > 0);
//! ```
//!
//! The engine numbers directions `Up, Down, Left, Right`. Controllers that use
//! `Up, Right, Down, Left` convert with [`engine::Move::to_game`], and
//! controllers that address cells as `[x][y]` build boards with
//! [`engine::Board::from_game_cells`].
//!
pub mod config;
pub mod engine;
pub mod expectimax;
pub mod game;
