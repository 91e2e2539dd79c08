//! Search: iterative deepening, move ordering, worker threads, time budgets.

pub mod movepick;
pub mod node;
pub mod threads;
pub mod time;

pub use movepick::MovePicker;
pub use node::Search;
pub use threads::ThreadPool;
pub use time::TimeManager;

use crate::position::types::{Color, Move, MAX_PLY};

/// Centipawn-scaled score
pub type Value = i32;

/// Score of a mate delivered on the current move
pub const MATE: Value = 32_000;
/// Hard bound on any score the search may return
pub const INFINITE: Value = 32_500;
/// Scores beyond this magnitude are mate-in-N, not centipawns
pub const MATE_IN_MAX_PLY: Value = MATE - MAX_PLY as Value;
/// Band outside which a score counts as a decided game
pub const KNOWN_WIN: Value = 10_000;
pub const DRAW: Value = 0;

/// Score for giving mate in `ply` half-moves
#[inline]
#[must_use]
pub const fn mate_in(ply: usize) -> Value {
    MATE - ply as Value
}

/// Score for being mated in `ply` half-moves
#[inline]
#[must_use]
pub const fn mated_in(ply: usize) -> Value {
    -MATE + ply as Value
}

#[inline]
#[must_use]
pub fn is_mate_score(value: Value) -> bool {
    value.abs() >= MATE_IN_MAX_PLY
}

/// Convert a search score to its table form. Mate scores are stored
/// relative to the node they were found at, not the root, so a TT hit
/// at a different ply still decodes to the right mate distance.
#[inline]
#[must_use]
pub fn value_to_tt(value: Value, ply: usize) -> Value {
    if value >= MATE_IN_MAX_PLY {
        value + ply as Value
    } else if value <= -MATE_IN_MAX_PLY {
        value - ply as Value
    } else {
        value
    }
}

/// Inverse of [`value_to_tt`]
#[inline]
#[must_use]
pub fn value_from_tt(value: Value, ply: usize) -> Value {
    if value >= MATE_IN_MAX_PLY {
        value - ply as Value
    } else if value <= -MATE_IN_MAX_PLY {
        value + ply as Value
    } else {
        value
    }
}

/// Everything a `go` command can constrain a search by
#[derive(Clone, Debug, Default)]
pub struct SearchLimits {
    /// Restrict the root to these moves when non-empty
    pub searchmoves: Vec<Move>,
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u64>,
    pub depth: Option<i32>,
    pub nodes: Option<u64>,
    pub mate: Option<i32>,
    pub movetime: Option<u64>,
    pub infinite: bool,
    pub perft: Option<i32>,
}

impl SearchLimits {
    /// Remaining clock time for the side to move, if the clock is in play
    #[must_use]
    pub fn time_for(&self, us: Color) -> Option<u64> {
        match us {
            Color::White => self.wtime,
            Color::Black => self.btime,
        }
    }

    /// Increment per move for the side to move
    #[must_use]
    pub fn increment_for(&self, us: Color) -> u64 {
        match us {
            Color::White => self.winc,
            Color::Black => self.binc,
        }
        .unwrap_or(0)
    }

    /// Whether this search runs against the clock at all
    #[must_use]
    pub fn use_time_management(&self, us: Color) -> bool {
        !self.infinite && (self.movetime.is_some() || self.time_for(us).is_some())
    }
}

/// A root move with its running aspiration result. The principal
/// variation is refreshed from the transposition table after each
/// completed depth.
#[derive(Clone, Debug)]
pub struct RootMove {
    pub mv: Move,
    pub score: Value,
    pub previous_score: Value,
    pub pv: Vec<Move>,
}

impl RootMove {
    #[must_use]
    pub fn new(mv: Move) -> Self {
        RootMove {
            mv,
            score: -INFINITE,
            previous_score: -INFINITE,
            pv: vec![mv],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mate_scores_shrink_with_distance() {
        assert!(mate_in(1) > mate_in(3));
        assert!(mated_in(1) < mated_in(3));
        assert!(mate_in(1) < INFINITE);
        assert!(is_mate_score(mate_in(10)));
        assert!(is_mate_score(mated_in(10)));
        assert!(!is_mate_score(KNOWN_WIN - 1));
    }

    #[test]
    fn tt_value_translation_roundtrips() {
        for ply in [0usize, 1, 5, 40] {
            for value in [mate_in(ply + 2), mated_in(ply + 2), 150, -150, DRAW] {
                assert_eq!(value_from_tt(value_to_tt(value, ply), ply), value);
            }
        }
    }

    #[test]
    fn time_management_gating() {
        let mut limits = SearchLimits::default();
        assert!(!limits.use_time_management(Color::White));

        limits.movetime = Some(100);
        assert!(limits.use_time_management(Color::White));

        limits.movetime = None;
        limits.wtime = Some(60_000);
        assert!(limits.use_time_management(Color::White));
        assert!(!limits.use_time_management(Color::Black));

        limits.infinite = true;
        assert!(!limits.use_time_management(Color::White));
    }
}
