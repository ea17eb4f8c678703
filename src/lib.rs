//! # Othello MCTS
//!
//! The decision core of an Othello (Reversi) playing agent: a bitboard-based game engine and a
//! Monte Carlo Tree Search driver parameterised by a pluggable position evaluator. Given a board
//! and a side to move, [`mcts::Mcts`] runs a fixed number of PUCT-guided simulations over a
//! reusable search tree and returns either a deterministic best move or a stochastic sample from
//! the visit distribution, plus training targets suitable for self-play reinforcement learning.
//!
//! It provides modules for:
//! - Board representation and move generation (`board`)
//! - Shared side/move types and move-slot indexing (`player`)
//! - The pluggable evaluator contract and a reference implementation (`evaluator`)
//! - The search tree and driver (`mcts`)
//! - The crate's error taxonomy (`error`)
//! - Self-play training example packaging (`training`)
//!
//! The network-facing agent loop (`bin/agent.rs`) and the self-play data generator
//! (`bin/generate_training_data.rs`) are thin shells built on top of this library; see
//! `SPEC_FULL.md` §1 for what is explicitly out of scope.

pub mod board;
pub mod error;
pub mod evaluator;
pub mod mcts;
pub mod player;
pub mod training;
