//! Perft: exhaustive legal move tree counting.

use super::movegen::{generate, GenType};
use super::types::MoveList;
use super::Position;

/// Count leaf nodes of the legal move tree to the given depth
#[must_use]
pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut list = MoveList::new();
    generate(pos, &mut list, GenType::Legal);
    if depth == 1 {
        return list.len() as u64;
    }
    let mut nodes = 0;
    for &m in &list {
        pos.do_move(m);
        nodes += perft(pos, depth - 1);
        pos.undo_move(m);
    }
    nodes
}

/// Perft split by root move, matching the output other engines print for
/// `go perft`. Returns (move, subtree count) pairs plus the total.
#[must_use]
pub fn divide(pos: &mut Position, depth: u32) -> (Vec<(super::Move, u64)>, u64) {
    let mut list = MoveList::new();
    generate(pos, &mut list, GenType::Legal);
    let mut entries = Vec::with_capacity(list.len());
    let mut total = 0;
    for &m in &list {
        let nodes = if depth <= 1 {
            1
        } else {
            pos.do_move(m);
            let n = perft(pos, depth - 1);
            pos.undo_move(m);
            n
        };
        entries.push((m, nodes));
        total += nodes;
    }
    (entries, total)
}
