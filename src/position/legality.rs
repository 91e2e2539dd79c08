//! Check bookkeeping and move legality.
//!
//! Move generation produces pseudo-legal moves; [`Position::is_legal`]
//! filters out the cases where pseudo-legality is not enough (pinned
//! pieces, king steps, en passant discoveries, castling through attacks).
//! [`Position::is_pseudo_legal`] vets moves from outside sources such as
//! the transposition table before they are trusted.

use super::attacks;
use super::types::{castling, Bitboard, Color, Move, MoveKind, Piece, Square};
use super::Position;

impl Position {
    /// Pieces of either color that are the sole blocker between one of
    /// `sliders` and `sq`. The second bitboard holds the sliders whose
    /// blocker belongs to the same side as the piece on `sq` (true pinners).
    pub(crate) fn slider_blockers(&self, sliders: Bitboard, sq: Square) -> (Bitboard, Bitboard) {
        let mut blockers = Bitboard::EMPTY;
        let mut pinners = Bitboard::EMPTY;

        let snipers = ((attacks::rook_attacks(sq, Bitboard::EMPTY)
            & (self.pieces(Piece::Rook) | self.pieces(Piece::Queen)))
            | (attacks::bishop_attacks(sq, Bitboard::EMPTY)
                & (self.pieces(Piece::Bishop) | self.pieces(Piece::Queen))))
            & sliders;
        let occupancy = self.occupied() ^ snipers;
        let target_side = self.piece_on(sq).map(|(c, _)| c);

        for sniper in snipers {
            let wall = attacks::between(sq, sniper) & occupancy;
            if wall.any() && !wall.more_than_one() {
                blockers |= wall;
                if let Some(side) = target_side {
                    if (wall & self.pieces_of_color(side)).any() {
                        pinners |= Bitboard::from_square(sniper);
                    }
                }
            }
        }
        (blockers, pinners)
    }

    /// Rebuild the check-related fields of the current state: checkers on
    /// the side to move's king, pin info for both kings, and the squares
    /// from which each piece type would check the enemy king.
    pub(crate) fn refresh_check_info(&mut self) {
        let us = self.side_to_move();
        let them = us.opponent();
        let our_king = self.king_square(us);
        let their_king = self.king_square(them);

        let (our_blockers, their_pinners) =
            self.slider_blockers(self.pieces_of_color(them), our_king);
        let (their_blockers, our_pinners) =
            self.slider_blockers(self.pieces_of_color(us), their_king);

        let occupied = self.occupied();
        let checkers = self.attackers_to(our_king, occupied) & self.pieces_of_color(them);

        let check_squares = [
            attacks::pawn_attacks(them, their_king),
            attacks::knight_attacks(their_king),
            attacks::bishop_attacks(their_king, occupied),
            attacks::rook_attacks(their_king, occupied),
            attacks::bishop_attacks(their_king, occupied)
                | attacks::rook_attacks(their_king, occupied),
            Bitboard::EMPTY,
        ];

        let st = self.st_mut();
        st.checkers = checkers;
        st.blockers_for_king[us.index()] = our_blockers;
        st.blockers_for_king[them.index()] = their_blockers;
        st.pinners[them.index()] = their_pinners;
        st.pinners[us.index()] = our_pinners;
        st.check_squares = check_squares;
    }

    /// Returns true if a pseudo-legal move leaves our own king safe
    #[must_use]
    pub fn is_legal(&self, m: Move) -> bool {
        let us = self.side_to_move();
        let them = us.opponent();
        let from = m.from();
        let to = m.to();
        let ksq = self.king_square(us);

        match m.kind() {
            MoveKind::EnPassant => {
                // Rebuild the occupancy as if the move were played and ask
                // whether anything still attacks the king. This covers both
                // the doubled-pawn slider discovery and en passant tried as
                // a non-resolving evasion.
                let captured = to.offset(-us.forward());
                let occupied = (self.occupied()
                    ^ Bitboard::from_square(from)
                    ^ Bitboard::from_square(captured))
                    | Bitboard::from_square(to);
                let survivors =
                    self.pieces_of_color(them) ^ Bitboard::from_square(captured);
                (self.attackers_to(ksq, occupied) & survivors).is_empty()
            }
            MoveKind::Castling => {
                // The king walks from its square to the castling destination;
                // none of the squares it crosses may be attacked.
                let king_side = to > from;
                let (king_to, _) = castling::king_rook_destinations(us, king_side);
                let path = attacks::between(from, king_to) | Bitboard::from_square(king_to);
                for sq in path {
                    if self.attacked_by(them, sq, self.occupied()) {
                        return false;
                    }
                }
                true
            }
            _ if self.piece_on(from).map(|(_, p)| p) == Some(Piece::King) => {
                // King steps: test the target with the king lifted off its
                // square so sliders see through it.
                !self.attacked_by(
                    them,
                    to,
                    self.occupied() ^ Bitboard::from_square(from),
                )
            }
            _ => {
                // Everything else is legal unless the piece is pinned and
                // leaves its pin line.
                !self.blockers_for_king(us).contains(from)
                    || attacks::aligned(from, to, ksq)
            }
        }
    }

    /// Returns true if `m` is a move the current position could have
    /// generated. Guards against stale or corrupted table moves; a move
    /// passing this check can safely be fed to [`Position::is_legal`] and
    /// [`Position::do_move`].
    #[must_use]
    pub fn is_pseudo_legal(&self, m: Move) -> bool {
        if m.is_none() {
            return false;
        }
        let us = self.side_to_move();
        let them = us.opponent();
        let from = m.from();
        let to = m.to();

        let Some((color, piece)) = self.piece_on(from) else {
            return false;
        };
        if color != us {
            return false;
        }

        // While in check only evasions qualify; double check demands a king move
        let checkers = self.checkers();
        if checkers.any() && piece != Piece::King {
            if checkers.more_than_one() {
                return false;
            }
            let checker = checkers.lsb();
            let evasion_targets =
                attacks::between(self.king_square(us), checker) | checkers;
            // En passant may resolve check by removing the checking pawn
            // even though the capturing pawn lands elsewhere
            let removes_checker =
                m.is_en_passant() && to.offset(-us.forward()) == checker;
            if !evasion_targets.contains(to) && !removes_checker {
                return false;
            }
        }

        match m.kind() {
            MoveKind::Castling => {
                if piece != Piece::King || checkers.any() {
                    return false;
                }
                let king_side = to > from;
                let right = if king_side {
                    castling::kingside(us)
                } else {
                    castling::queenside(us)
                };
                self.castling_rights() & right != 0
                    && self.piece_on(to) == Some((us, Piece::Rook))
                    && (attacks::between(from, to) & self.occupied()).is_empty()
            }
            MoveKind::EnPassant => {
                piece == Piece::Pawn
                    && self.ep_square() == Some(to)
                    && attacks::pawn_attacks(us, from).contains(to)
                    && self.piece_on(to.offset(-us.forward())) == Some((them, Piece::Pawn))
            }
            MoveKind::Promotion | MoveKind::Normal => {
                if piece == Piece::Pawn {
                    let on_promotion_rank = Bitboard::promotion_rank(us).contains(to);
                    if m.is_promotion() != on_promotion_rank {
                        return false;
                    }
                    self.pawn_move_shape_ok(us, from, to)
                } else {
                    if m.is_promotion() {
                        return false;
                    }
                    attacks::piece_attacks(piece, from, self.occupied()).contains(to)
                        && !self.pieces_of_color(us).contains(to)
                }
            }
        }
    }

    /// Single push, double push, or capture geometry for a pawn move
    fn pawn_move_shape_ok(&self, us: Color, from: Square, to: Square) -> bool {
        let forward = us.forward();
        let occupied = self.occupied();
        if attacks::pawn_attacks(us, from).contains(to) {
            return self
                .piece_on(to)
                .is_some_and(|(c, _)| c == us.opponent());
        }
        if to == from.offset(forward) {
            return !occupied.contains(to);
        }
        let double_rank = match us {
            Color::White => Bitboard::RANK_4,
            Color::Black => Bitboard::RANK_5,
        };
        to.0 as i16 == from.0 as i16 + 2 * forward as i16
            && double_rank.contains(to)
            && !occupied.contains(to)
            && !occupied.contains(from.offset(forward))
    }

    /// Returns true if playing `m` gives check to the opponent
    #[must_use]
    pub fn gives_check(&self, m: Move) -> bool {
        let us = self.side_to_move();
        let them = us.opponent();
        let from = m.from();
        let to = m.to();
        let their_king = self.king_square(them);
        let st = self.st();

        // Direct check from the destination square
        if let Some((_, piece)) = self.piece_on(from) {
            if !m.is_promotion() && st.check_squares[piece.index()].contains(to) {
                return true;
            }
        }

        // Discovered check: the mover was shielding the enemy king and
        // steps off the line
        if self.blockers_for_king(them).contains(from)
            && !attacks::aligned(from, to, their_king)
        {
            return true;
        }

        match m.kind() {
            MoveKind::Promotion => {
                let occupied = self.occupied() ^ Bitboard::from_square(from);
                attacks::piece_attacks(m.promotion_piece(), to, occupied).contains(their_king)
            }
            MoveKind::EnPassant => {
                let captured = to.offset(-us.forward());
                let occupied = (self.occupied()
                    ^ Bitboard::from_square(from)
                    ^ Bitboard::from_square(captured))
                    | Bitboard::from_square(to);
                (attacks::bishop_attacks(their_king, occupied) & self.diagonal_sliders(us)).any()
                    || (attacks::rook_attacks(their_king, occupied)
                        & self.orthogonal_sliders(us))
                    .any()
            }
            MoveKind::Castling => {
                let king_side = to > from;
                let (king_to, rook_to) = castling::king_rook_destinations(us, king_side);
                let occupied = (self.occupied()
                    ^ Bitboard::from_square(from)
                    ^ Bitboard::from_square(to))
                    | Bitboard::from_square(king_to)
                    | Bitboard::from_square(rook_to);
                attacks::rook_attacks(rook_to, occupied).contains(their_king)
            }
            MoveKind::Normal => false,
        }
    }
}
