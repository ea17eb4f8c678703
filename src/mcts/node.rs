//! The search tree node: a board position plus per-move-slot visit statistics for the side
//! to move there.

use crate::board::Board;
use crate::evaluator::Evaluator;
use crate::player::{move_of, Move, Player, NUM_SLOTS, PASS_SLOT};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// A node in the search tree: the position `board` with `side_to_move` to move, and one
/// visit/value/prior triple per move slot (see [`crate::player::slot_of`]).
#[derive(Debug)]
pub struct TreeNode {
    pub board: Board,
    pub side_to_move: Player,

    pub parent: Option<Weak<RefCell<TreeNode>>>,
    /// The slot, in the parent's move space, that produced this node. `None` only at the root.
    pub slot_from_parent: Option<usize>,

    pub children: HashMap<usize, Rc<RefCell<TreeNode>>>,

    /// The moves available at this position, filled in by [`TreeNode::expand`]. `[Move::PASS]`
    /// if there is no board move.
    pub legal_moves: Vec<Move>,
    /// 64-bit mask of legal non-pass squares (bit `index(x,y)` set iff legal). PASS is not
    /// represented here. Filled in by [`TreeNode::expand`].
    pub legal_mask: u64,

    /// Prior probability for each of the 65 move slots, filled in by [`TreeNode::expand`].
    pub prior: Vec<f32>,
    /// Accumulated backed-up value for each slot, from this node's `side_to_move` perspective.
    pub value_sum: Vec<f32>,
    /// Visit count for each slot.
    pub visit_count: Vec<u32>,

    pub is_terminal: bool,
    pub is_expanded: bool,
}

impl TreeNode {
    /// Builds a fresh, unexpanded node for `board` with `side_to_move` to move.
    pub fn new(board: Board, side_to_move: Player) -> Rc<RefCell<TreeNode>> {
        let is_terminal = board.is_game_over();
        Rc::new(RefCell::new(TreeNode {
            board,
            side_to_move,
            parent: None,
            slot_from_parent: None,
            children: HashMap::new(),
            legal_moves: Vec::new(),
            legal_mask: 0,
            prior: vec![0.0; NUM_SLOTS],
            value_sum: vec![0.0; NUM_SLOTS],
            visit_count: vec![0; NUM_SLOTS],
            is_terminal,
            is_expanded: false,
        }))
    }

    fn new_child(parent: &Rc<RefCell<TreeNode>>, slot: usize, board: Board, side_to_move: Player) -> Rc<RefCell<TreeNode>> {
        let node = TreeNode::new(board, side_to_move);
        {
            let mut n = node.borrow_mut();
            n.parent = Some(Rc::downgrade(parent));
            n.slot_from_parent = Some(slot);
        }
        node
    }

    /// Total number of visits recorded through this node (sum of all child-edge visits).
    pub fn total_visits(&self) -> u32 {
        self.visit_count.iter().sum()
    }

    /// Evaluates this node's position and installs a legal-move-masked, renormalized prior.
    /// Returns the value, from `side_to_move`'s perspective, that the evaluator produced.
    /// Callers reuse this for backpropagation rather than evaluating the position again.
    pub fn expand(&mut self, evaluator: &dyn Evaluator) -> f32 {
        let (raw_policy, value) = evaluator.evaluate(&self.board, self.side_to_move);
        let legal = self.board.valid_moves(self.side_to_move);

        let mut mask = 0u64;
        let mut mass = 0.0f32;
        for mv in &legal {
            if !mv.is_pass() {
                mask |= 1u64 << crate::player::coord_index(mv.x, mv.y);
            }
            let slot = crate::player::slot_of(*mv);
            mass += raw_policy.get(slot).copied().unwrap_or(0.0).max(0.0);
        }

        for mv in &legal {
            let slot = crate::player::slot_of(*mv);
            let p = raw_policy.get(slot).copied().unwrap_or(0.0).max(0.0);
            self.prior[slot] = if mass > 0.0 { p / mass } else { 1.0 / legal.len() as f32 };
        }

        self.legal_mask = mask;
        self.legal_moves = legal;
        self.is_expanded = true;
        value
    }

    /// Mixes Dirichlet(`alpha`) noise into the priors of this node's legal, non-pass moves:
    /// `prior = (1 - epsilon) * prior + epsilon * noise`. PASS is left untouched, matching the
    /// behavior of the original prototype this search is descended from.
    pub fn add_dirichlet_noise(&mut self, noise: &[f32], epsilon: f32) {
        let legal_slots: Vec<usize> = self
            .legal_moves
            .iter()
            .map(|&mv| crate::player::slot_of(mv))
            .filter(|&slot| slot != PASS_SLOT)
            .collect();
        debug_assert_eq!(noise.len(), legal_slots.len());
        for (slot, &n) in legal_slots.iter().zip(noise.iter()) {
            self.prior[*slot] = (1.0 - epsilon) * self.prior[*slot] + epsilon * n;
        }
    }

    /// The PUCT score for edge `slot`: `Q + c_puct * P * sqrt(N_total) / (1 + N_slot)`.
    pub fn puct_score(&self, slot: usize, c_puct: f32) -> f32 {
        let n = self.visit_count[slot];
        let q = if n == 0 { 0.0 } else { self.value_sum[slot] / n as f32 };
        let total = self.total_visits() as f32;
        let u = c_puct * self.prior[slot] * total.sqrt() / (1.0 + n as f32);
        q + u
    }

    /// The legal slot with the highest PUCT score, tie-breaking by lowest slot index. Panics if
    /// the node has no legal moves, which cannot happen for a non-terminal Othello position
    /// (PASS is always available).
    pub fn best_slot(&self, c_puct: f32) -> usize {
        let mut slots: Vec<usize> = self.legal_moves.iter().map(|&mv| crate::player::slot_of(mv)).collect();
        slots.sort_unstable();
        let mut best = slots[0];
        let mut best_score = self.puct_score(best, c_puct);
        for &slot in &slots[1..] {
            let score = self.puct_score(slot, c_puct);
            if score > best_score {
                best = slot;
                best_score = score;
            }
        }
        best
    }

    /// Returns the child for `slot`, creating and caching it on first visit by applying the
    /// corresponding move to this node's board.
    pub fn child(this: &Rc<RefCell<TreeNode>>, slot: usize) -> Rc<RefCell<TreeNode>> {
        if let Some(existing) = this.borrow().children.get(&slot) {
            return Rc::clone(existing);
        }
        let (board, side_to_move) = {
            let node = this.borrow();
            let mv = move_of(slot);
            let next_board = node
                .board
                .apply_copy(node.side_to_move, mv)
                .expect("best_slot only returns legal moves");
            (next_board, node.side_to_move.opponent())
        };
        let child = TreeNode::new_child(this, slot, board, side_to_move);
        this.borrow_mut().children.insert(slot, Rc::clone(&child));
        child
    }
}
