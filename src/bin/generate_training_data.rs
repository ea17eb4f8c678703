//! Self-play training data generator.
//!
//! Plays a batch of Black-vs-White games with [`GreedyEvaluator`] driving both sides through
//! [`Mcts`], records one [`TrainingExample`] per move played (policy target from the search that
//! chose it), backfills each game's final value once the outcome is known, and appends every
//! example to a JSON-lines file. A stand-in for the self-play stage of a training pipeline; the
//! replay buffer and the trainer that would consume this file are out of scope (§1).

use log::info;
use othello_mcts::board::Board;
use othello_mcts::evaluator::GreedyEvaluator;
use othello_mcts::mcts::Mcts;
use othello_mcts::player::Player;
use othello_mcts::training::TrainingExample;
use rand::rngs::StdRng;
use rand::SeedableRng;

const GAMES: u32 = 10;
const SIMULATIONS_PER_MOVE: u32 = 128;
const OUTPUT_PATH: &str = "training_data.jsonl";

fn main() {
    env_logger::init();
    let evaluator = GreedyEvaluator::new();

    let mut total_examples = 0usize;
    for game_idx in 0..GAMES {
        let examples = play_one_game(&evaluator, 0x5EED_0000 + game_idx as u64);
        for example in &examples {
            example
                .append_to_file(OUTPUT_PATH)
                .expect("failed to append training example");
        }
        total_examples += examples.len();
        info!(
            "self-play game {} complete: {} positions recorded",
            game_idx,
            examples.len()
        );
    }

    println!(
        "wrote {} training examples from {} self-play games to {}",
        total_examples, GAMES, OUTPUT_PATH
    );
}

/// Plays one game to completion, Black moving first, and returns one [`TrainingExample`] per
/// move with `value` backfilled from the final outcome (from each position's own side
/// perspective).
fn play_one_game(evaluator: &GreedyEvaluator, seed: u64) -> Vec<TrainingExample> {
    let mut board = Board::new();
    let mut side = Player::Black;
    let mut examples: Vec<TrainingExample> = Vec::new();
    let mut sides: Vec<Player> = Vec::new();
    let mut rng = StdRng::seed_from_u64(seed);

    while !board.is_game_over() {
        let mut mcts = Mcts::with_params(
            evaluator,
            SIMULATIONS_PER_MOVE,
            1.5,
            0.3,
            0.25,
            StdRng::seed_from_u64(rng_next(&mut rng)),
        );
        mcts.set_root(board, side);
        mcts.run().expect("root was just set");

        let example = TrainingExample::from_search(&mcts).expect("root was just set");
        examples.push(example);
        sides.push(side);

        let mv = mcts.best_move(true).expect("root was just set");
        board.apply(side, mv);
        side = side.opponent();
    }

    let winner = board.winner();
    for (example, example_side) in examples.iter_mut().zip(sides.iter()) {
        example.value = Some(if winner == Player::None {
            0.0
        } else if winner == *example_side {
            1.0
        } else {
            -1.0
        });
    }
    examples
}

fn rng_next(rng: &mut StdRng) -> u64 {
    use rand::Rng;
    rng.gen()
}
