//! Thin protocol shell around the search core (§6 of `SPEC_FULL.md`). Not a tested deliverable
//! of the crate, the agent loop is an out-of-scope collaborator; only its wire format is
//! honored here.
//!
//! On start, reads one line containing "Black" or "White" to fix this agent's side. Then reads
//! whitespace-separated triples `x y ms` from stdin, one per line: the opponent's last move
//! (`-1 -1` for a pass) and the remaining time in milliseconds (logged, not acted on, no
//! time-management heuristic per the Non-goals). Replies with `x y\n` on stdout for this
//! agent's own move, `-1 -1` for a pass.

use log::{error, info, warn};
use othello_mcts::board::Board;
use othello_mcts::evaluator::GreedyEvaluator;
use othello_mcts::mcts::Mcts;
use othello_mcts::player::{Move, Player};
use std::io::{self, BufRead, Write};

fn main() {
    env_logger::init();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    let side = match lines.next() {
        Some(Ok(line)) => match parse_side(&line) {
            Some(side) => side,
            None => {
                error!("first line did not name a side: {:?}", line);
                return;
            }
        },
        _ => {
            error!("expected a side announcement on the first line");
            return;
        }
    };
    info!("agent playing as {}", side);

    let evaluator = GreedyEvaluator::new();
    let mut mcts = Mcts::new(&evaluator);
    let mut board = Board::new();
    mcts.set_root(board, Player::Black);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if side == Player::White {
        let mv = think_and_play(&mut mcts, &mut out);
        board.apply(Player::Black, mv);
    }

    for line in lines {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!("stdin read error: {err}");
                break;
            }
        };
        let Some((opponent_move, remaining_ms)) = parse_move_line(&line) else {
            warn!("malformed protocol line: {:?}", line);
            continue;
        };
        info!("opponent played {} with {}ms remaining", opponent_move, remaining_ms);

        if let Err(err) = mcts.apply_move_to_root(opponent_move) {
            error!("could not apply opponent move {}: {}", opponent_move, err);
            continue;
        }
        board.apply(side.opponent(), opponent_move);

        let mv = think_and_play(&mut mcts, &mut out);
        board.apply(side, mv);
    }
}

fn think_and_play(mcts: &mut Mcts<'_, GreedyEvaluator>, out: &mut impl Write) -> Move {
    mcts.run().expect("root is always set before thinking");
    let mv = mcts.best_move(false).expect("root is always set before thinking");
    if let Err(err) = writeln!(out, "{} {}", mv.x, mv.y) {
        error!("failed to write move to stdout: {err}");
    }
    let _ = out.flush();
    mcts.apply_move_to_root(mv).expect("best_move always returns a legal move");
    mv
}

fn parse_side(line: &str) -> Option<Player> {
    if line.contains("Black") {
        Some(Player::Black)
    } else if line.contains("White") {
        Some(Player::White)
    } else {
        None
    }
}

fn parse_move_line(line: &str) -> Option<(Move, i64)> {
    let mut parts = line.split_whitespace();
    let x: i8 = parts.next()?.parse().ok()?;
    let y: i8 = parts.next()?.parse().ok()?;
    let ms: i64 = parts.next()?.parse().ok()?;
    let mv = if x == -1 && y == -1 { Move::PASS } else { Move::new(x, y) };
    Some((mv, ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pass() {
        assert_eq!(parse_move_line("-1 -1 5000"), Some((Move::PASS, 5000)));
    }

    #[test]
    fn parses_board_move() {
        assert_eq!(parse_move_line("3 2 12345"), Some((Move::new(3, 2), 12345)));
    }

    #[test]
    fn rejects_malformed_line() {
        assert_eq!(parse_move_line("not a move"), None);
    }

    #[test]
    fn side_announcement_recognizes_either_color() {
        assert_eq!(parse_side("You are Black"), Some(Player::Black));
        assert_eq!(parse_side("You are White"), Some(Player::White));
        assert_eq!(parse_side("nonsense"), None);
    }
}
