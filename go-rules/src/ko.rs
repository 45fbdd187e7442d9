use crate::move_tree::{MoveTree, NodeId};
use crate::rules::SuperkoAlgorithm;
use crate::stone::Stone;

/// How many earlier positions the superko scan looks at. Repetitions further
/// back than this go undetected.
pub const MAX_SUPERKO_SEARCH: usize = 30;

/// A board produced by a move that has not been recorded yet.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub board: &'a [i8],
    /// Player to move once the candidate is recorded.
    pub next_player: Stone,
}

/// Immediate recapture: the candidate recreates the board from before the
/// current node's move. Only boards are compared. Never applies right after
/// an edit, nor before the third move.
pub fn is_ko(tree: &MoveTree, cur: NodeId, candidate: &Candidate<'_>) -> bool {
    let node = tree.node(cur);
    if node.edited || node.move_number <= 2 {
        return false;
    }
    match node.parent {
        Some(parent) => tree.node(parent).state.board == candidate.board,
        None => false,
    }
}

/// Scan earlier positions for a repeat of the candidate, starting two plies
/// before the current node so that the ko position itself is left to
/// [`is_ko`]. `Positional` compares boards only; the default `Situational`
/// also requires the same player to move.
pub fn is_board_repeating(
    tree: &MoveTree,
    cur: NodeId,
    candidate: &Candidate<'_>,
    algorithm: SuperkoAlgorithm,
) -> bool {
    let move_number = tree.node(cur).move_number as usize;
    let depth = MAX_SUPERKO_SEARCH.min(move_number.saturating_sub(2));
    if depth == 0 {
        return false;
    }

    let start = tree.index(cur, -2);
    std::iter::once(start)
        .chain(tree.ancestors(start))
        .take(depth)
        .any(|id| {
            let state = &tree.node(id).state;
            state.board == candidate.board
                && match algorithm {
                    SuperkoAlgorithm::Positional => true,
                    SuperkoAlgorithm::Situational => state.player == candidate.next_player,
                }
        })
}
