//! Staged lazy move ordering.
//!
//! Moves are produced one at a time so a beta cutoff in the capture stage
//! never pays for quiet generation. Three tracks share one state machine:
//! the main search track, an evasion track used whenever the side to move
//! is in check, and a captures-only quiescence track.

use crate::position::movegen::{generate, GenType};
use crate::position::pst;
use crate::position::types::{Move, MoveList, Piece, ScoredMoveList};
use crate::position::Position;

/// Ordering bonus for a queen promotion in capture scoring
const PROMOTION_BONUS: i32 = Piece::Queen.value();

/// Evasion captures sort ahead of all evasion quiets
const EVASION_CAPTURE_OFFSET: i32 = 1 << 20;

const CASTLING_BONUS: i32 = 50;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Stage {
    TTMove,
    CaptureInit,
    GoodCaptures,
    QuietInit,
    Quiets,
    BadCaptures,
    EvasionInit,
    Evasions,
    QCaptureInit,
    QCaptures,
    Done,
}

/// One-pass move supplier for a single node
pub struct MovePicker {
    stage: Stage,
    quiescence: bool,
    tt_move: Move,
    captures: ScoredMoveList,
    quiets: ScoredMoveList,
    bad_captures: ScoredMoveList,
    capture_idx: usize,
    quiet_idx: usize,
    bad_idx: usize,
}

impl MovePicker {
    /// Picker for a main-search node. Switches to the evasion track when
    /// the side to move is in check.
    #[must_use]
    pub fn new(pos: &Position, tt_move: Move) -> Self {
        let tt_move = validated(pos, tt_move);
        let stage = if !tt_move.is_none() {
            Stage::TTMove
        } else if pos.in_check() {
            Stage::EvasionInit
        } else {
            Stage::CaptureInit
        };
        Self::with_stage(stage, tt_move, false)
    }

    /// Picker for a quiescence node: captures only, evasions when in check.
    /// A quiet TT move is ignored outside check since quiescence would never
    /// generate it.
    #[must_use]
    pub fn new_quiescence(pos: &Position, tt_move: Move) -> Self {
        let mut tt_move = validated(pos, tt_move);
        if !pos.in_check() && !tt_move.is_none() && !pos.is_tactical(tt_move) {
            tt_move = Move::NONE;
        }
        let stage = if !tt_move.is_none() {
            Stage::TTMove
        } else if pos.in_check() {
            Stage::EvasionInit
        } else {
            Stage::QCaptureInit
        };
        Self::with_stage(stage, tt_move, true)
    }

    fn with_stage(stage: Stage, tt_move: Move, quiescence: bool) -> Self {
        MovePicker {
            stage,
            quiescence,
            tt_move,
            captures: ScoredMoveList::new(),
            quiets: ScoredMoveList::new(),
            bad_captures: ScoredMoveList::new(),
            capture_idx: 0,
            quiet_idx: 0,
            bad_idx: 0,
        }
    }

    /// Produce the next candidate move, or `None` when exhausted. Yielded
    /// moves are pseudo-legal; the caller still filters through `is_legal`.
    pub fn next(&mut self, pos: &Position) -> Option<Move> {
        loop {
            match self.stage {
                Stage::TTMove => {
                    self.stage = if pos.in_check() {
                        Stage::EvasionInit
                    } else if self.quiescence {
                        Stage::QCaptureInit
                    } else {
                        Stage::CaptureInit
                    };
                    return Some(self.tt_move);
                }

                Stage::CaptureInit | Stage::QCaptureInit => {
                    let mut list = MoveList::new();
                    generate(pos, &mut list, GenType::Captures);
                    for &m in list.iter() {
                        self.captures.push(m, capture_score(pos, m));
                    }
                    self.stage = if self.stage == Stage::CaptureInit {
                        Stage::GoodCaptures
                    } else {
                        Stage::QCaptures
                    };
                }

                Stage::GoodCaptures => {
                    match self.captures.pick_best(self.capture_idx) {
                        Some(sm) => {
                            self.capture_idx += 1;
                            if sm.mv == self.tt_move {
                                continue;
                            }
                            if pos.see_ge(sm.mv, 0) {
                                return Some(sm.mv);
                            }
                            // Losing capture, deferred behind the quiets
                            self.bad_captures.push(sm.mv, sm.score);
                        }
                        None => self.stage = Stage::QuietInit,
                    }
                }

                Stage::QuietInit => {
                    let mut list = MoveList::new();
                    generate(pos, &mut list, GenType::Quiets);
                    for &m in list.iter() {
                        self.quiets.push(m, quiet_score(pos, m));
                    }
                    self.stage = Stage::Quiets;
                }

                Stage::Quiets => match self.quiets.pick_best(self.quiet_idx) {
                    Some(sm) => {
                        self.quiet_idx += 1;
                        if sm.mv != self.tt_move {
                            return Some(sm.mv);
                        }
                    }
                    None => self.stage = Stage::BadCaptures,
                },

                Stage::BadCaptures => {
                    // Already in descending order from the good-capture pass
                    if self.bad_idx < self.bad_captures.len() {
                        let m = self.bad_captures.as_slice()[self.bad_idx].mv;
                        self.bad_idx += 1;
                        return Some(m);
                    }
                    self.stage = Stage::Done;
                }

                Stage::EvasionInit => {
                    let mut list = MoveList::new();
                    generate(pos, &mut list, GenType::Evasions);
                    for &m in list.iter() {
                        self.captures.push(m, evasion_score(pos, m));
                    }
                    self.stage = Stage::Evasions;
                }

                Stage::Evasions | Stage::QCaptures => {
                    match self.captures.pick_best(self.capture_idx) {
                        Some(sm) => {
                            self.capture_idx += 1;
                            if sm.mv != self.tt_move {
                                return Some(sm.mv);
                            }
                        }
                        None => self.stage = Stage::Done,
                    }
                }

                Stage::Done => return None,
            }
        }
    }

}

fn validated(pos: &Position, tt_move: Move) -> Move {
    if !tt_move.is_none() && pos.is_pseudo_legal(tt_move) {
        tt_move
    } else {
        Move::NONE
    }
}

/// Most-valuable-victim, least-valuable-attacker, plus a bonus for queen
/// promotions so they sort with the heavy captures
fn capture_score(pos: &Position, m: Move) -> i32 {
    let victim = pos.captured_by(m).map_or(0, Piece::value);
    let attacker = pos
        .piece_on(m.from())
        .map_or(0, |(_, p)| p.value());
    let promo = if m.is_promotion() && m.promotion_piece() == Piece::Queen {
        PROMOTION_BONUS
    } else {
        0
    };
    victim - attacker + promo
}

/// Quiets are ordered by the middlegame placement gain of the moving piece
fn quiet_score(pos: &Position, m: Move) -> i32 {
    if m.is_castling() {
        return CASTLING_BONUS;
    }
    match pos.piece_on(m.from()) {
        Some((color, piece)) => {
            pst::psq_mg(color, piece, m.to()) - pst::psq_mg(color, piece, m.from())
        }
        None => 0,
    }
}

/// Checking-side captures first, then quiet evasions by placement
fn evasion_score(pos: &Position, m: Move) -> i32 {
    if pos.captured_by(m).is_some() {
        EVASION_CAPTURE_OFFSET + capture_score(pos, m)
    } else {
        quiet_score(pos, m)
    }
}
