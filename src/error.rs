//! Error taxonomy for the core. See SPEC_FULL.md §4.7 / §7.

use thiserror::Error;

/// Errors produced by [`crate::board::Board`] and [`crate::mcts::Mcts`].
///
/// `Board::apply` deliberately keeps returning a plain `bool` on the hot mutating path used
/// inside the search loop; this type is for the few operations whose failure is a distinct,
/// nameable condition rather than "just try the next move".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OthelloError {
    #[error("illegal move passed to apply_copy")]
    IllegalMove,

    #[error("operation requires a root (call set_root first)")]
    NoRoot,

    #[error("value target requested for a non-terminal root")]
    NotTerminal,
}
