//! Static evaluation.
//!
//! Material plus piece-square tables, tapered between middlegame and
//! endgame weights by remaining material. The per-square sums are kept
//! incrementally by the position as pieces move, so evaluation is a blend
//! and a sign flip.

use super::pst::TOTAL_PHASE;
use super::types::Color;
use super::Position;

/// Small bonus for having the move
const TEMPO: i32 = 10;

impl Position {
    /// Static evaluation in centipawns from the side to move's perspective
    #[must_use]
    pub fn evaluate(&self) -> i32 {
        let phase = self.phase.min(TOTAL_PHASE);
        let blended =
            (self.psq_mg * phase + self.psq_eg * (TOTAL_PHASE - phase)) / TOTAL_PHASE;
        let white_pov = blended;
        match self.side_to_move() {
            Color::White => white_pov + TEMPO,
            Color::Black => -white_pov + TEMPO,
        }
    }
}
