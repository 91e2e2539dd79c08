//! Making and unmaking moves.
//!
//! `do_move` pushes a new [`StateInfo`](super::StateInfo) snapshot and
//! applies the move with incremental Zobrist updates; `undo_move` pops the
//! snapshot and moves the pieces back. The pair restores the position
//! bit-for-bit, which the tests verify by comparing keys and FENs.

use crate::zobrist::ZOBRIST;

use super::types::{castling, Bitboard, Move, MoveKind, Piece, Square};
use super::Position;

impl Position {
    /// Play a move. The move must be legal for the side to move.
    pub fn do_move(&mut self, m: Move) {
        debug_assert!(self.is_pseudo_legal(m) && self.is_legal(m));

        let us = self.side_to_move();
        let them = us.opponent();
        let from = m.from();
        let to = m.to();

        let mut st = self.st().clone();
        st.key ^= ZOBRIST.side_to_move;
        st.halfmove_clock += 1;
        st.plies_from_null += 1;
        st.captured = None;

        // The en passant square lives for exactly one ply
        if let Some(ep) = st.ep_square.take() {
            st.key ^= ZOBRIST.en_passant_key(ep);
        }

        match m.kind() {
            MoveKind::Castling => {
                let king_side = to > from;
                let (king_to, rook_to) = castling::king_rook_destinations(us, king_side);
                self.move_piece(from, king_to);
                self.move_piece(to, rook_to);
                st.key ^= ZOBRIST.piece_key(us, Piece::King, from)
                    ^ ZOBRIST.piece_key(us, Piece::King, king_to)
                    ^ ZOBRIST.piece_key(us, Piece::Rook, to)
                    ^ ZOBRIST.piece_key(us, Piece::Rook, rook_to);
            }
            _ => {
                let moved = match self.piece_on(from) {
                    Some((_, p)) => p,
                    None => Piece::Pawn,
                };

                let capture_sq = if m.is_en_passant() {
                    to.offset(-us.forward())
                } else {
                    to
                };
                if let Some((_, captured)) = self.piece_on(capture_sq) {
                    self.remove_piece(capture_sq);
                    st.key ^= ZOBRIST.piece_key(them, captured, capture_sq);
                    st.captured = Some(captured);
                    st.halfmove_clock = 0;
                }

                self.move_piece(from, to);
                st.key ^=
                    ZOBRIST.piece_key(us, moved, from) ^ ZOBRIST.piece_key(us, moved, to);

                if moved == Piece::Pawn {
                    st.halfmove_clock = 0;
                    if m.is_promotion() {
                        let promo = m.promotion_piece();
                        self.remove_piece(to);
                        self.put_piece(us, promo, to);
                        st.key ^= ZOBRIST.piece_key(us, Piece::Pawn, to)
                            ^ ZOBRIST.piece_key(us, promo, to);
                    } else if to.0 as i16 == from.0 as i16 + 2 * us.forward() as i16 {
                        let ep = from.offset(us.forward());
                        st.ep_square = Some(ep);
                        st.key ^= ZOBRIST.en_passant_key(ep);
                    }
                }
            }
        }

        // Any move touching a castling square burns the matching rights
        let cleared = (castling::RIGHTS_CLEARED_BY_SQUARE[from.as_usize()]
            | castling::RIGHTS_CLEARED_BY_SQUARE[to.as_usize()])
            & st.castling_rights;
        if cleared != 0 {
            st.key ^= ZOBRIST.castling_key(st.castling_rights);
            st.castling_rights &= !cleared;
            st.key ^= ZOBRIST.castling_key(st.castling_rights);
        }

        self.states.push(st);
        self.set_side_to_move(them);
        self.set_game_ply(self.game_ply() + 1);
        self.refresh_check_info();

        debug_assert_eq!(self.key(), self.compute_key());
    }

    /// Take back the last move made with [`Position::do_move`]
    pub fn undo_move(&mut self, m: Move) {
        let them = self.side_to_move();
        let us = them.opponent();
        let from = m.from();
        let to = m.to();

        let captured = self.st().captured;

        match m.kind() {
            MoveKind::Castling => {
                let king_side = to > from;
                let (king_to, rook_to) = castling::king_rook_destinations(us, king_side);
                self.move_piece(king_to, from);
                self.move_piece(rook_to, to);
            }
            MoveKind::Promotion => {
                self.remove_piece(to);
                self.put_piece(us, Piece::Pawn, from);
            }
            _ => {
                self.move_piece(to, from);
            }
        }

        if let Some(piece) = captured {
            let capture_sq = if m.is_en_passant() {
                to.offset(-us.forward())
            } else {
                to
            };
            self.put_piece(them, piece, capture_sq);
        }

        self.states.pop();
        self.set_side_to_move(us);
        self.set_game_ply(self.game_ply() - 1);
    }

    /// Pass the turn without moving. Only valid when not in check.
    pub fn do_null_move(&mut self) {
        debug_assert!(!self.in_check());

        let mut st = self.st().clone();
        st.key ^= ZOBRIST.side_to_move;
        st.plies_from_null = 0;
        st.captured = None;
        if let Some(ep) = st.ep_square.take() {
            st.key ^= ZOBRIST.en_passant_key(ep);
        }

        self.states.push(st);
        self.set_side_to_move(self.side_to_move().opponent());
        self.refresh_check_info();
    }

    /// Take back a null move
    pub fn undo_null_move(&mut self) {
        self.states.pop();
        self.set_side_to_move(self.side_to_move().opponent());
    }

    /// Capture victim of a move, if any. En passant reports the pawn.
    #[must_use]
    pub fn captured_by(&self, m: Move) -> Option<Piece> {
        if m.is_en_passant() {
            return Some(Piece::Pawn);
        }
        if m.is_castling() {
            return None;
        }
        self.piece_on(m.to()).map(|(_, p)| p)
    }

    /// Returns true if the move is a capture or a promotion
    #[must_use]
    pub fn is_tactical(&self, m: Move) -> bool {
        m.is_promotion() || self.captured_by(m).is_some()
    }

    /// Discard history older than the current state so long games cannot
    /// grow the stack without bound. Repetition detection only ever looks
    /// back `halfmove_clock` plies, which is preserved.
    pub fn shrink_history(&mut self) {
        let keep = (self.st().halfmove_clock as usize + 1).min(self.states.len());
        let drop = self.states.len() - keep;
        if drop > 0 {
            self.states.drain(..drop);
        }
    }
}
