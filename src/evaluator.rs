//! Pluggable position evaluation: the seam between the search core and whatever produces
//! move priors and a position value (a trained network, a heuristic, a stub for tests).

use crate::board::Board;
use crate::player::{Move, Player, NUM_SLOTS};

/// Evaluates a position from `side`'s perspective.
///
/// `evaluate` returns a prior over all 65 move slots (see [`crate::player::slot_of`]) and a
/// scalar value in `[-1.0, 1.0]`, positive meaning `side` is favored. Implementations need not
/// restrict the prior to legal slots; [`crate::mcts::node::TreeNode::expand`] masks it against
/// the position's actual legal moves before it is used.
pub trait Evaluator {
    fn evaluate(&self, board: &Board, side: Player) -> (Vec<f32>, f32);
}

/// A dependency-free reference evaluator: uniform prior over the legal moves, value equal to
/// the normalized disk differential from `side`'s perspective. Useful for tests and for
/// generating training targets before any learned network exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyEvaluator;

impl Evaluator for GreedyEvaluator {
    fn evaluate(&self, board: &Board, side: Player) -> (Vec<f32>, f32) {
        let moves = board.valid_moves(side);
        let mut policy = vec![0.0f32; NUM_SLOTS];
        let weight = 1.0 / moves.len() as f32;
        for mv in &moves {
            policy[crate::player::slot_of(*mv)] = weight;
        }

        let own = board.count_disks(side) as f32;
        let opp = board.count_disks(side.opponent()) as f32;
        let total = own + opp;
        let value = if total == 0.0 { 0.0 } else { (own - opp) / total };

        (policy, value)
    }
}

impl GreedyEvaluator {
    pub fn new() -> Self {
        GreedyEvaluator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_prior_sums_to_one() {
        let board = Board::new();
        let (policy, _) = GreedyEvaluator.evaluate(&board, Player::Black);
        let total: f32 = policy.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn starting_value_is_zero() {
        let board = Board::new();
        let (_, value) = GreedyEvaluator.evaluate(&board, Player::Black);
        assert_eq!(value, 0.0);
    }

    #[test]
    fn value_favors_side_with_more_disks() {
        let black = 0b11u64; // two low bits
        let white = 1u64 << 2;
        let board = Board::from_bitboards(black, white);
        let (_, value_black) = GreedyEvaluator.evaluate(&board, Player::Black);
        let (_, value_white) = GreedyEvaluator.evaluate(&board, Player::White);
        assert!(value_black > 0.0);
        assert_eq!(value_black, -value_white);
    }

    #[test]
    fn prior_mass_only_on_pass_when_no_board_move() {
        // Black boxed in entirely by white with nowhere to bracket.
        let mut white = 0u64;
        for i in 0..64 {
            if i != 63 {
                white |= 1u64 << i;
            }
        }
        let black = 1u64 << 63;
        let board = Board::from_bitboards(black, white);
        let (policy, _) = GreedyEvaluator.evaluate(&board, Player::Black);
        assert_eq!(policy[crate::player::PASS_SLOT], 1.0);
        assert_eq!(policy.iter().filter(|&&p| p != 0.0).count(), 1);
    }
}
