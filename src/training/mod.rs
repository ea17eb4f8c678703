//! Packaging one completed search's output into a training example for self-play
//! reinforcement learning. The replay buffer and training loop that would consume these are
//! out of scope (§1); this module only covers producing and (de)serialising the examples.

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::evaluator::Evaluator;
use crate::mcts::Mcts;

/// One self-play training example: the board tensor a network would have seen, the visit-count
/// policy target the search produced for it, and the eventual game value (`None` until the game
/// that produced this position has finished).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    /// 192 floats, the `to_tensor` encoding of the position the search ran from.
    pub tensor: Vec<f32>,
    /// Length-65 visit-count policy target (see [`Mcts::get_policy_target`]).
    pub policy: Vec<f32>,
    /// Game outcome from the position's side-to-move perspective, backfilled once known.
    pub value: Option<f32>,
}

impl TrainingExample {
    /// Builds an example from the current state of `mcts`'s root: its tensor encoding and
    /// policy target. `value` is left unset, callers backfill it once the self-play game that
    /// produced this position reaches a terminal state.
    pub fn from_search<E: Evaluator>(mcts: &Mcts<'_, E>) -> Result<Self, crate::error::OthelloError> {
        let board = mcts.root_board()?;
        let side = mcts.root_side()?;
        Ok(TrainingExample {
            tensor: board.to_tensor(side),
            policy: mcts.get_policy_target()?,
            value: None,
        })
    }

    /// Appends this example as one line of JSON to `path`, creating the file if needed.
    /// One-JSON-object-per-line rather than CSV because the payload is float vectors, not
    /// scalar fields.
    pub fn append_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let line = serde_json::to_string(self)?;
        writeln!(file, "{}", line)
    }

    /// Loads every example from a JSON-lines file, skipping blank lines.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> io::Result<Vec<TrainingExample>> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut examples = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let example: TrainingExample = serde_json::from_str(&line)?;
            examples.push(example);
        }
        Ok(examples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::evaluator::GreedyEvaluator;
    use crate::player::Player;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn from_search_captures_tensor_and_policy() {
        let evaluator = GreedyEvaluator;
        let mut mcts = Mcts::with_params(&evaluator, 16, 1.5, 0.3, 0.25, StdRng::seed_from_u64(1));
        mcts.set_root(Board::new(), Player::Black);
        mcts.run().unwrap();

        let example = TrainingExample::from_search(&mcts).unwrap();
        assert_eq!(example.tensor.len(), 192);
        assert_eq!(example.policy.len(), 65);
        assert_eq!(example.value, None);
    }

    #[test]
    fn round_trips_through_jsonl_file() {
        let evaluator = GreedyEvaluator;
        let mut mcts = Mcts::with_params(&evaluator, 8, 1.5, 0.3, 0.25, StdRng::seed_from_u64(2));
        mcts.set_root(Board::new(), Player::Black);
        mcts.run().unwrap();
        let mut example = TrainingExample::from_search(&mcts).unwrap();
        example.value = Some(1.0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("examples.jsonl");
        example.append_to_file(&path).unwrap();

        let loaded = TrainingExample::load_from_file(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], example);
    }

    #[test]
    fn append_accumulates_multiple_lines() {
        let evaluator = GreedyEvaluator;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("examples.jsonl");

        for seed in 0..3u64 {
            let mut mcts = Mcts::with_params(&evaluator, 4, 1.5, 0.3, 0.25, StdRng::seed_from_u64(seed));
            mcts.set_root(Board::new(), Player::Black);
            mcts.run().unwrap();
            let example = TrainingExample::from_search(&mcts).unwrap();
            example.append_to_file(&path).unwrap();
        }

        let loaded = TrainingExample::load_from_file(&path).unwrap();
        assert_eq!(loaded.len(), 3);
    }
}
