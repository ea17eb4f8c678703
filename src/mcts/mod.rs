//! Monte Carlo Tree Search: the simulation loop that drives [`node::TreeNode`] under PUCT
//! selection, plus the root operations (`set_root`, `apply_move_to_root`, Dirichlet noise) an
//! external driver uses to reuse subtrees across turns.

pub mod node;
pub mod rng;

use crate::board::Board;
use crate::error::OthelloError;
use crate::evaluator::Evaluator;
use crate::player::{move_of, slot_of, Move, Player, NUM_SLOTS, PASS_SLOT};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

pub use node::TreeNode;

/// Default number of simulations per `run()`, matching §4.5.
pub const DEFAULT_NUM_SIMULATIONS: u32 = 800;
/// Default PUCT exploration constant.
pub const DEFAULT_C_PUCT: f32 = 1.5;
/// Default Dirichlet concentration parameter for root exploration noise.
pub const DEFAULT_DIRICHLET_ALPHA: f32 = 0.3;
/// Default mix weight for root exploration noise.
pub const DEFAULT_DIRICHLET_EPSILON: f32 = 0.25;

/// PUCT-guided MCTS over a reusable tree, parameterised by a pluggable [`Evaluator`].
///
/// Holds a single owned root (`None` before the first [`Mcts::set_root`]), a borrowed
/// evaluator, search parameters, and a seeded RNG shared by Dirichlet noise and temperature
/// sampling. See `SPEC_FULL.md` §4.5 for the full state machine.
pub struct Mcts<'e, E: Evaluator> {
    evaluator: &'e E,
    root: Option<Rc<RefCell<TreeNode>>>,
    num_simulations: u32,
    c_puct: f32,
    dirichlet_alpha: f32,
    dirichlet_epsilon: f32,
    rng: StdRng,
}

impl<'e, E: Evaluator> Mcts<'e, E> {
    /// Builds an `Mcts` with the default parameters (§4.5) and an entropy-seeded RNG.
    pub fn new(evaluator: &'e E) -> Self {
        Self::with_params(
            evaluator,
            DEFAULT_NUM_SIMULATIONS,
            DEFAULT_C_PUCT,
            DEFAULT_DIRICHLET_ALPHA,
            DEFAULT_DIRICHLET_EPSILON,
            StdRng::from_entropy(),
        )
    }

    /// Builds an `Mcts` seeded deterministically, for reproducible tests and self-play.
    pub fn new_with_seed(evaluator: &'e E, seed: u64) -> Self {
        Self::with_params(
            evaluator,
            DEFAULT_NUM_SIMULATIONS,
            DEFAULT_C_PUCT,
            DEFAULT_DIRICHLET_ALPHA,
            DEFAULT_DIRICHLET_EPSILON,
            StdRng::seed_from_u64(seed),
        )
    }

    /// Full control over every parameter; used by tests that need a small `num_simulations` or
    /// an unusual `c_puct`.
    pub fn with_params(
        evaluator: &'e E,
        num_simulations: u32,
        c_puct: f32,
        dirichlet_alpha: f32,
        dirichlet_epsilon: f32,
        rng: StdRng,
    ) -> Self {
        Mcts {
            evaluator,
            root: None,
            num_simulations,
            c_puct,
            dirichlet_alpha,
            dirichlet_epsilon,
            rng,
        }
    }

    fn root(&self) -> Result<&Rc<RefCell<TreeNode>>, OthelloError> {
        self.root.as_ref().ok_or(OthelloError::NoRoot)
    }

    /// Discards the existing tree and installs a fresh unexpanded root for `(board, side)`.
    pub fn set_root(&mut self, board: Board, side: Player) {
        self.root = Some(TreeNode::new(board, side));
    }

    /// Advances the tree by one ply, reusing the subtree under `mv` if the current root has
    /// already visited that edge, or building a fresh unexpanded root otherwise.
    pub fn apply_move_to_root(&mut self, mv: Move) -> Result<(), OthelloError> {
        let root = self.root()?.clone();
        let slot = slot_of(mv);

        let existing_child = root.borrow_mut().children.remove(&slot);
        if let Some(child) = existing_child {
            child.borrow_mut().parent = None;
            child.borrow_mut().slot_from_parent = None;
            self.root = Some(child);
            return Ok(());
        }

        let (next_board, next_side) = {
            let node = root.borrow();
            let next_board = node.board.apply_copy(node.side_to_move, mv)?;
            (next_board, node.side_to_move.opponent())
        };
        self.root = Some(TreeNode::new(next_board, next_side));
        Ok(())
    }

    /// Runs `num_simulations` simulations from the current root. Precondition: a root exists.
    ///
    /// Expands the root first if it is fresh (not counted against `num_simulations`), so every
    /// one of the `num_simulations` selection/expansion/backprop cycles actually passes through
    /// the root and records a visit there. This matches the invariant that a completed `run()`
    /// leaves `Σ visit_count[root]` equal to `num_simulations` (§8 scenario 3).
    pub fn run(&mut self) -> Result<(), OthelloError> {
        self.expand_root_only()?;
        let start = Instant::now();
        let mut max_depth = 0usize;
        for _ in 0..self.num_simulations {
            let depth = self.run_one()?;
            max_depth = max_depth.max(depth);
        }
        info!(
            "mcts run: {} simulations, max depth {}, {:?} elapsed",
            self.num_simulations,
            max_depth,
            start.elapsed()
        );
        Ok(())
    }

    /// Runs a single simulation (selection, expansion, backpropagation) and returns the depth
    /// reached. Exposed so callers can interleave `add_dirichlet_noise` with the very first
    /// expansion of a fresh root.
    pub fn run_one(&mut self) -> Result<usize, OthelloError> {
        let root = self.root()?.clone();
        let (leaf, path, depth) = select_leaf(&root, self.c_puct);

        let value = {
            let mut leaf_ref = leaf.borrow_mut();
            if leaf_ref.is_terminal {
                let side = leaf_ref.side_to_move;
                let mine = leaf_ref.board.count_disks(side) as f32;
                let theirs = leaf_ref.board.count_disks(side.opponent()) as f32;
                (mine - theirs) / 64.0
            } else {
                leaf_ref.expand(self.evaluator)
            }
        };
        debug!("simulation reached depth {}", depth);

        backpropagate(&path, value);
        Ok(depth)
    }

    /// Perturbs the current root's priors with Dirichlet(`alpha`) exploration noise, mixed in
    /// at weight `epsilon`. Requires the root to already be expanded; call [`Mcts::run_one`]
    /// (or `run`) at least once first, or [`Mcts::expand_root_only`].
    pub fn add_dirichlet_noise(&mut self) -> Result<(), OthelloError> {
        let root = self.root()?.clone();
        let legal_slots: Vec<usize> = {
            let node = root.borrow();
            node.board
                .valid_moves(node.side_to_move)
                .into_iter()
                .map(slot_of)
                .filter(|&slot| slot != PASS_SLOT)
                .collect()
        };
        let noise = rng::sample_dirichlet(&mut self.rng, self.dirichlet_alpha, legal_slots.len());
        root.borrow_mut().add_dirichlet_noise(&noise, self.dirichlet_epsilon);
        Ok(())
    }

    /// Ensures the root is expanded without running a full simulation; used before
    /// [`Mcts::add_dirichlet_noise`] on a brand-new root.
    pub fn expand_root_only(&mut self) -> Result<(), OthelloError> {
        let root = self.root()?.clone();
        let needs_expand = {
            let node = root.borrow();
            !node.is_expanded && !node.is_terminal
        };
        if needs_expand {
            root.borrow_mut().expand(self.evaluator);
        }
        Ok(())
    }

    /// The root's visit-count-weighted best move. Deterministic (max-visit, tie-break lowest
    /// slot) when `temperature` is `false`; otherwise samples from the visit distribution using
    /// the shared RNG.
    pub fn best_move(&mut self, temperature: bool) -> Result<Move, OthelloError> {
        let root = self.root()?.clone();
        let node = root.borrow();
        let legal_slots: Vec<usize> = node
            .board
            .valid_moves(node.side_to_move)
            .into_iter()
            .map(slot_of)
            .collect();

        if !temperature {
            let best = legal_slots
                .iter()
                .copied()
                .max_by_key(|&slot| (node.visit_count[slot], std::cmp::Reverse(slot)))
                .expect("a position always has at least one legal move (PASS if nothing else)");
            return Ok(move_of(best));
        }

        let total: u32 = legal_slots.iter().map(|&slot| node.visit_count[slot]).sum();
        drop(node);
        if total == 0 {
            return Ok(move_of(legal_slots[0]));
        }
        let mut pick = {
            use rand::Rng;
            self.rng.gen_range(0..total)
        };
        let node = root.borrow();
        for &slot in &legal_slots {
            let n = node.visit_count[slot];
            if pick < n {
                return Ok(move_of(slot));
            }
            pick -= n;
        }
        Ok(move_of(*legal_slots.last().unwrap()))
    }

    /// Length-65 visit-count distribution at the root: `visit_count[i] / Σ visit_count`, or all
    /// zeros if no simulation has run yet.
    pub fn get_policy_target(&self) -> Result<Vec<f32>, OthelloError> {
        let root = self.root()?;
        let node = root.borrow();
        let total: u32 = node.visit_count.iter().sum();
        let mut policy = vec![0.0f32; NUM_SLOTS];
        if total > 0 {
            for (i, &n) in node.visit_count.iter().enumerate() {
                policy[i] = n as f32 / total as f32;
            }
        }
        Ok(policy)
    }

    /// The root's terminal outcome from its own side's perspective: +1 win, -1 loss, 0 tie.
    /// Fails with `OthelloError::NotTerminal` if the root is not a game-over position.
    pub fn get_value_target(&self) -> Result<f32, OthelloError> {
        let root = self.root()?;
        let node = root.borrow();
        if !node.board.is_game_over() {
            return Err(OthelloError::NotTerminal);
        }
        let winner = node.board.winner();
        if winner == Player::None {
            Ok(0.0)
        } else if winner == node.side_to_move {
            Ok(1.0)
        } else {
            Ok(-1.0)
        }
    }

    /// The board at the current root, for callers (e.g. [`crate::training`]) that want to
    /// encode it without reaching into the tree themselves.
    pub fn root_board(&self) -> Result<Board, OthelloError> {
        Ok(self.root()?.borrow().board)
    }

    /// The side to move at the current root.
    pub fn root_side(&self) -> Result<Player, OthelloError> {
        Ok(self.root()?.borrow().side_to_move)
    }
}

/// Walks from `root` down through expanded, non-terminal nodes by PUCT selection, creating the
/// child for the first unvisited edge it meets. Returns the leaf, the slot-path from root to
/// leaf (for backpropagation), and the depth reached.
fn select_leaf(
    root: &Rc<RefCell<TreeNode>>,
    c_puct: f32,
) -> (Rc<RefCell<TreeNode>>, Vec<(Rc<RefCell<TreeNode>>, usize)>, usize) {
    let mut current = Rc::clone(root);
    let mut path = Vec::new();

    loop {
        let (is_expanded, is_terminal) = {
            let node = current.borrow();
            (node.is_expanded, node.is_terminal)
        };
        if !is_expanded || is_terminal {
            break;
        }
        let slot = current.borrow().best_slot(c_puct);
        let child = TreeNode::child(&current, slot);
        path.push((Rc::clone(&current), slot));
        current = child;
    }

    let depth = path.len();
    (current, path, depth)
}

/// Backpropagates `value` (from the leaf's perspective) up through `path`, negating at each
/// step so every node's statistics stay in its own side's perspective.
fn backpropagate(path: &[(Rc<RefCell<TreeNode>>, usize)], value: f32) {
    let mut v = value;
    for (node, slot) in path.iter().rev() {
        let mut n = node.borrow_mut();
        n.visit_count[*slot] += 1;
        n.value_sum[*slot] += v;
        v = -v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::GreedyEvaluator;

    #[test]
    fn run_visits_exactly_num_simulations() {
        let evaluator = GreedyEvaluator;
        let mut mcts = Mcts::with_params(&evaluator, 64, 1.5, 0.3, 0.25, StdRng::seed_from_u64(1));
        mcts.set_root(Board::new(), Player::Black);
        mcts.run().unwrap();

        let root = mcts.root.as_ref().unwrap();
        let total: u32 = root.borrow().visit_count.iter().sum();
        assert_eq!(total, 64);
    }

    #[test]
    fn best_move_is_legal_and_deterministic() {
        let evaluator = GreedyEvaluator;
        let mut mcts = Mcts::with_params(&evaluator, 64, 1.5, 0.3, 0.25, StdRng::seed_from_u64(7));
        mcts.set_root(Board::new(), Player::Black);
        mcts.run().unwrap();
        let mv = mcts.best_move(false).unwrap();
        let legal = Board::new().valid_moves(Player::Black);
        assert!(legal.contains(&mv));
    }

    #[test]
    fn apply_move_to_root_requires_root() {
        let evaluator = GreedyEvaluator;
        let mut mcts = Mcts::new(&evaluator);
        let err = mcts.apply_move_to_root(Move::new(2, 3)).unwrap_err();
        assert_eq!(err, OthelloError::NoRoot);
    }

    #[test]
    fn apply_move_to_root_reuses_visited_subtree() {
        let evaluator = GreedyEvaluator;
        let mut mcts = Mcts::with_params(&evaluator, 64, 1.5, 0.3, 0.25, StdRng::seed_from_u64(3));
        mcts.set_root(Board::new(), Player::Black);
        mcts.run().unwrap();
        let mv = mcts.best_move(false).unwrap();

        mcts.apply_move_to_root(mv).unwrap();
        let root = mcts.root.as_ref().unwrap();
        let total: u32 = root.borrow().visit_count.iter().sum();
        assert!(total > 0, "promoted subtree should keep its accumulated visits");
    }

    #[test]
    fn apply_move_to_root_without_reuse_builds_fresh_root() {
        let evaluator = GreedyEvaluator;
        let mut mcts = Mcts::new(&evaluator);
        mcts.set_root(Board::new(), Player::Black);
        mcts.apply_move_to_root(Move::new(2, 3)).unwrap();
        let root = mcts.root.as_ref().unwrap();
        assert_eq!(root.borrow().side_to_move, Player::White);
        assert!(!root.borrow().is_expanded);
    }

    #[test]
    fn get_value_target_requires_terminal_root() {
        let evaluator = GreedyEvaluator;
        let mut mcts = Mcts::new(&evaluator);
        mcts.set_root(Board::new(), Player::Black);
        let err = mcts.get_value_target().unwrap_err();
        assert_eq!(err, OthelloError::NotTerminal);
    }

    #[test]
    fn get_value_target_on_terminal_board() {
        let evaluator = GreedyEvaluator;
        let mut black = 0u64;
        for i in 0..40 {
            black |= 1u64 << i;
        }
        let mut white = 0u64;
        for i in 40..64 {
            white |= 1u64 << i;
        }
        let board = Board::from_bitboards(black, white);
        assert!(board.is_game_over());

        let mut mcts = Mcts::new(&evaluator);
        mcts.set_root(board, Player::Black);
        assert_eq!(mcts.get_value_target().unwrap(), 1.0);

        mcts.set_root(board, Player::White);
        assert_eq!(mcts.get_value_target().unwrap(), -1.0);
    }

    #[test]
    fn get_policy_target_sums_to_one_after_run() {
        let evaluator = GreedyEvaluator;
        let mut mcts = Mcts::with_params(&evaluator, 32, 1.5, 0.3, 0.25, StdRng::seed_from_u64(9));
        mcts.set_root(Board::new(), Player::Black);
        mcts.run().unwrap();
        let policy = mcts.get_policy_target().unwrap();
        let total: f32 = policy.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
    }

    #[test]
    fn add_dirichlet_noise_perturbs_root_priors() {
        let evaluator = GreedyEvaluator;
        let mut mcts = Mcts::with_params(&evaluator, 1, 1.5, 0.3, 0.25, StdRng::seed_from_u64(5));
        mcts.set_root(Board::new(), Player::Black);
        mcts.expand_root_only().unwrap();
        let before = mcts.root.as_ref().unwrap().borrow().prior.clone();
        mcts.add_dirichlet_noise().unwrap();
        let after = mcts.root.as_ref().unwrap().borrow().prior.clone();
        assert_ne!(before, after);
    }

    #[test]
    fn forced_pass_is_taken_unconditionally() {
        let evaluator = GreedyEvaluator;
        let mut white = 0u64;
        for i in 0..64 {
            if i != 63 {
                white |= 1u64 << i;
            }
        }
        let black = 1u64 << 63;
        let board = Board::from_bitboards(black, white);
        assert_eq!(board.valid_moves(Player::Black), vec![Move::PASS]);

        let mut mcts = Mcts::with_params(&evaluator, 4, 1.5, 0.3, 0.25, StdRng::seed_from_u64(2));
        mcts.set_root(board, Player::Black);
        mcts.run().unwrap();
        let mv = mcts.best_move(false).unwrap();
        assert_eq!(mv, Move::PASS);
    }
}
