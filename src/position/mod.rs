//! Board representation and game rules.
//!
//! [`Position`] keeps a piece-centric board (per-type and per-color
//! bitboards alongside a square array) plus a stack of [`StateInfo`]
//! snapshots, one per ply, so moves can be made and unmade cheaply. All
//! rule knowledge lives here: move generation, legality, check detection,
//! static exchange evaluation, and the draw rules.

pub mod attacks;
pub mod error;
pub mod eval;
pub mod fen;
mod legality;
mod make_unmake;
pub mod movegen;
pub mod perft;
pub(crate) mod pst;
pub mod see;
mod state;
pub mod types;

#[cfg(test)]
mod tests;

use std::fmt;

use crate::zobrist::ZOBRIST;

pub use state::StateInfo;
pub use types::{Bitboard, Color, Move, MoveKind, MoveList, Piece, Square};

/// Standard starting position
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A chess position with full make/unmake history since the last `set_fen`.
#[derive(Clone)]
pub struct Position {
    squares: [Option<(Color, Piece)>; 64],
    by_type: [Bitboard; 6],
    by_color: [Bitboard; 2],
    side: Color,
    game_ply: u32,
    // Incremental tapered-eval accumulators, white minus black
    psq_mg: i32,
    psq_eg: i32,
    phase: i32,
    // Snapshot stack: one entry per ply, the last entry is current.
    // Never empty.
    states: Vec<StateInfo>,
}

impl Position {
    /// The standard starting position
    #[must_use]
    pub fn startpos() -> Self {
        Self::from_fen(START_FEN).expect("start position FEN is valid")
    }

    pub(crate) fn empty() -> Self {
        let mut states = Vec::with_capacity(256);
        states.push(StateInfo::empty());
        Position {
            squares: [None; 64],
            by_type: [Bitboard::EMPTY; 6],
            by_color: [Bitboard::EMPTY; 2],
            side: Color::White,
            game_ply: 0,
            psq_mg: 0,
            psq_eg: 0,
            phase: 0,
            states,
        }
    }

    #[inline]
    pub(crate) fn st(&self) -> &StateInfo {
        let last = self.states.len() - 1;
        &self.states[last]
    }

    #[inline]
    pub(crate) fn st_mut(&mut self) -> &mut StateInfo {
        let last = self.states.len() - 1;
        &mut self.states[last]
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.side
    }

    #[inline]
    pub(crate) fn set_side_to_move(&mut self, side: Color) {
        self.side = side;
    }

    /// Plies played since the start of the game
    #[inline]
    #[must_use]
    pub fn game_ply(&self) -> u32 {
        self.game_ply
    }

    pub(crate) fn set_game_ply(&mut self, ply: u32) {
        self.game_ply = ply;
    }

    /// Zobrist key of the current position
    #[inline]
    #[must_use]
    pub fn key(&self) -> u64 {
        self.st().key
    }

    #[inline]
    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.st().halfmove_clock
    }

    #[inline]
    #[must_use]
    pub fn ep_square(&self) -> Option<Square> {
        self.st().ep_square
    }

    #[inline]
    #[must_use]
    pub fn castling_rights(&self) -> u8 {
        self.st().castling_rights
    }

    /// Opposing pieces giving check
    #[inline]
    #[must_use]
    pub fn checkers(&self) -> Bitboard {
        self.st().checkers
    }

    #[inline]
    #[must_use]
    pub fn in_check(&self) -> bool {
        self.st().checkers.any()
    }

    /// Pieces shielding `side`'s king from an enemy slider
    #[inline]
    #[must_use]
    pub fn blockers_for_king(&self, side: Color) -> Bitboard {
        self.st().blockers_for_king[side.index()]
    }

    #[inline]
    #[must_use]
    pub fn piece_on(&self, sq: Square) -> Option<(Color, Piece)> {
        self.squares[sq.as_usize()]
    }

    /// All pieces of one type, either color
    #[inline]
    #[must_use]
    pub fn pieces(&self, piece: Piece) -> Bitboard {
        self.by_type[piece.index()]
    }

    /// All pieces of one color
    #[inline]
    #[must_use]
    pub fn pieces_of_color(&self, side: Color) -> Bitboard {
        self.by_color[side.index()]
    }

    #[inline]
    #[must_use]
    pub fn pieces_of(&self, side: Color, piece: Piece) -> Bitboard {
        self.by_color[side.index()] & self.by_type[piece.index()]
    }

    /// Diagonal sliders (bishops and queens) of one color
    #[inline]
    #[must_use]
    pub(crate) fn diagonal_sliders(&self, side: Color) -> Bitboard {
        self.pieces_of(side, Piece::Bishop) | self.pieces_of(side, Piece::Queen)
    }

    /// Orthogonal sliders (rooks and queens) of one color
    #[inline]
    #[must_use]
    pub(crate) fn orthogonal_sliders(&self, side: Color) -> Bitboard {
        self.pieces_of(side, Piece::Rook) | self.pieces_of(side, Piece::Queen)
    }

    #[inline]
    #[must_use]
    pub fn occupied(&self) -> Bitboard {
        self.by_color[0] | self.by_color[1]
    }

    #[inline]
    #[must_use]
    pub fn king_square(&self, side: Color) -> Square {
        self.pieces_of(side, Piece::King).lsb()
    }

    /// All pieces of either color attacking `sq` with the given occupancy
    #[must_use]
    pub fn attackers_to(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        (attacks::pawn_attacks(Color::Black, sq) & self.pieces_of(Color::White, Piece::Pawn))
            | (attacks::pawn_attacks(Color::White, sq) & self.pieces_of(Color::Black, Piece::Pawn))
            | (attacks::knight_attacks(sq) & self.pieces(Piece::Knight))
            | (attacks::king_attacks(sq) & self.pieces(Piece::King))
            | (attacks::bishop_attacks(sq, occupied)
                & (self.pieces(Piece::Bishop) | self.pieces(Piece::Queen)))
            | (attacks::rook_attacks(sq, occupied)
                & (self.pieces(Piece::Rook) | self.pieces(Piece::Queen)))
    }

    /// Returns true if any piece of `side` attacks `sq` with the given occupancy
    #[must_use]
    pub(crate) fn attacked_by(&self, side: Color, sq: Square, occupied: Bitboard) -> bool {
        (self.attackers_to(sq, occupied) & self.pieces_of_color(side)).any()
    }

    pub(crate) fn put_piece(&mut self, color: Color, piece: Piece, sq: Square) {
        debug_assert!(self.squares[sq.as_usize()].is_none());
        self.squares[sq.as_usize()] = Some((color, piece));
        let bb = Bitboard::from_square(sq);
        self.by_type[piece.index()] |= bb;
        self.by_color[color.index()] |= bb;
        let sign = if color == Color::White { 1 } else { -1 };
        self.psq_mg += sign * pst::psq_mg(color, piece, sq);
        self.psq_eg += sign * pst::psq_eg(color, piece, sq);
        self.phase += pst::PHASE_WEIGHTS[piece.index()];
    }

    pub(crate) fn remove_piece(&mut self, sq: Square) {
        if let Some((color, piece)) = self.squares[sq.as_usize()].take() {
            let bb = Bitboard::from_square(sq);
            self.by_type[piece.index()] ^= bb;
            self.by_color[color.index()] ^= bb;
            let sign = if color == Color::White { 1 } else { -1 };
            self.psq_mg -= sign * pst::psq_mg(color, piece, sq);
            self.psq_eg -= sign * pst::psq_eg(color, piece, sq);
            self.phase -= pst::PHASE_WEIGHTS[piece.index()];
        }
    }

    pub(crate) fn move_piece(&mut self, from: Square, to: Square) {
        if let Some((color, piece)) = self.squares[from.as_usize()].take() {
            let mask = Bitboard::from_square(from) | Bitboard::from_square(to);
            self.by_type[piece.index()] ^= mask;
            self.by_color[color.index()] ^= mask;
            self.squares[to.as_usize()] = Some((color, piece));
            let sign = if color == Color::White { 1 } else { -1 };
            self.psq_mg += sign * (pst::psq_mg(color, piece, to) - pst::psq_mg(color, piece, from));
            self.psq_eg += sign * (pst::psq_eg(color, piece, to) - pst::psq_eg(color, piece, from));
        }
    }

    /// Recompute the Zobrist key from scratch. Used when setting up a
    /// position and by debug assertions against the incremental key.
    pub(crate) fn compute_key(&self) -> u64 {
        let mut key = 0u64;
        for idx in 0..64u8 {
            let sq = Square(idx);
            if let Some((color, piece)) = self.squares[idx as usize] {
                key ^= ZOBRIST.piece_key(color, piece, sq);
            }
        }
        key ^= ZOBRIST.castling_key(self.st().castling_rights);
        if let Some(ep) = self.st().ep_square {
            key ^= ZOBRIST.en_passant_key(ep);
        }
        if self.side == Color::Black {
            key ^= ZOBRIST.side_to_move;
        }
        key
    }

    /// Draw by fifty-move rule, repetition, or insufficient material.
    ///
    /// Repetition is detected against the reversible tail of the state
    /// stack: one earlier occurrence of the current key is enough, which is
    /// the usual engine-side shortcut for "this line goes nowhere".
    #[must_use]
    pub fn is_draw(&self) -> bool {
        let st = self.st();
        if st.halfmove_clock >= 100 {
            return true;
        }
        if self.has_repetition() {
            return true;
        }
        self.is_insufficient_material()
    }

    fn has_repetition(&self) -> bool {
        let st = self.st();
        let window = st.halfmove_clock.min(st.plies_from_null) as usize;
        if window < 4 {
            return false;
        }
        let end = self.states.len() - 1;
        // Same side to move only, so step back two plies at a time
        let mut back = 2;
        while back <= window && back <= end {
            if self.states[end - back].key == st.key {
                return true;
            }
            back += 2;
        }
        false
    }

    /// Neither side can possibly deliver mate: bare kings, king + minor
    /// versus king, or king + bishop(s) on one square color each side.
    #[must_use]
    pub fn is_insufficient_material(&self) -> bool {
        if (self.pieces(Piece::Pawn) | self.pieces(Piece::Rook) | self.pieces(Piece::Queen)).any()
        {
            return false;
        }
        let knights = self.pieces(Piece::Knight);
        let bishops = self.pieces(Piece::Bishop);
        let minors = knights.popcount() + bishops.popcount();
        if minors <= 1 {
            return true;
        }
        if knights.is_empty() {
            // Only bishops: drawn when they all live on one square color
            return (bishops & Bitboard::LIGHT_SQUARES).is_empty()
                || (bishops & Bitboard::DARK_SQUARES).is_empty();
        }
        false
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  +-----------------+")?;
        for rank in (0..8u8).rev() {
            write!(f, "{} | ", rank + 1)?;
            for file in 0..8u8 {
                let c = match self.piece_on(Square::make(file, rank)) {
                    Some((color, piece)) => piece.to_fen_char(color),
                    None => '.',
                };
                write!(f, "{c} ")?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "  +-----------------+")?;
        writeln!(f, "    a b c d e f g h")?;
        writeln!(f, "FEN: {}", self.to_fen())?;
        write!(f, "Key: {:016x}", self.key())
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::startpos()
    }
}
