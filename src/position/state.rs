//! Per-ply position state.

use super::types::{Bitboard, Piece, Square};

/// Everything about a position that is cheaper to snapshot before a move
/// than to recompute when taking it back. The position keeps these in a
/// growable stack, one entry per ply since the last `set`, so undoing a move
/// is a pop plus a piece shuffle.
#[derive(Clone, Debug)]
pub struct StateInfo {
    /// Zobrist key of the position
    pub key: u64,
    /// Castling rights bitmask
    pub castling_rights: u8,
    /// En passant target square, set only after a double pawn push
    pub ep_square: Option<Square>,
    /// Halfmove clock for the fifty-move rule
    pub halfmove_clock: u32,
    /// Plies since the last null move, bounds the repetition scan
    pub plies_from_null: u32,
    /// Piece captured by the move that produced this state
    pub captured: Option<Piece>,
    /// Opposing pieces currently giving check
    pub checkers: Bitboard,
    /// Per color: own or enemy pieces that shield that color's king from a slider
    pub blockers_for_king: [Bitboard; 2],
    /// Per color: enemy sliders pinning something to that color's king
    pub pinners: [Bitboard; 2],
    /// Per piece type: squares from which that piece would check the enemy king
    pub check_squares: [Bitboard; 6],
}

impl StateInfo {
    pub(crate) fn empty() -> Self {
        StateInfo {
            key: 0,
            castling_rights: 0,
            ep_square: None,
            halfmove_clock: 0,
            plies_from_null: 0,
            captured: None,
            checkers: Bitboard::EMPTY,
            blockers_for_king: [Bitboard::EMPTY; 2],
            pinners: [Bitboard::EMPTY; 2],
            check_squares: [Bitboard::EMPTY; 6],
        }
    }
}
