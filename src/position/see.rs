//! Static exchange evaluation.
//!
//! Plays out the capture sequence on one square, always recapturing with
//! the least valuable attacker and revealing x-ray attackers as pieces come
//! off, then minimaxes the running material balance.

use super::attacks;
use super::types::{Bitboard, Move, Piece, Square};
use super::Position;

const SEE_VALUES: [i32; 6] = [100, 320, 330, 500, 900, 20000];

impl Position {
    /// Material balance in centipawns after all exchanges on the target
    /// square of `m`, from the perspective of the side making the move.
    /// Castling scores 0; en passant scores the captured pawn.
    #[must_use]
    pub fn see(&self, m: Move) -> i32 {
        if m.is_castling() {
            return 0;
        }
        let from = m.from();
        let to = m.to();

        let Some((us, attacker)) = self.piece_on(from) else {
            return 0;
        };
        let victim_value = if m.is_en_passant() {
            SEE_VALUES[Piece::Pawn.index()]
        } else {
            match self.piece_on(to) {
                Some((_, victim)) => SEE_VALUES[victim.index()],
                None => 0,
            }
        };

        const MAX_EXCHANGES: usize = 32;
        let mut gain = [0i32; MAX_EXCHANGES];
        let mut depth = 0;
        gain[0] = victim_value;

        let mut occupancy = self.occupied();
        if m.is_en_passant() {
            occupancy ^= Bitboard::from_square(to.offset(-us.forward()));
        }
        let mut attackers = self.attackers_to(to, occupancy);
        let mut side = us;
        let mut current = attacker;
        let mut current_bb = Bitboard::from_square(from);

        loop {
            // Lift the current attacker and reveal anything behind it
            occupancy ^= current_bb;
            attackers &= !current_bb;
            attackers |= self.xray_attackers(to, occupancy, current);

            side = side.opponent();
            let side_attackers = attackers & self.pieces_of_color(side) & occupancy;
            if side_attackers.is_empty() {
                break;
            }

            depth += 1;
            if depth >= MAX_EXCHANGES {
                break;
            }
            gain[depth] = SEE_VALUES[current.index()] - gain[depth - 1];

            // Neither continuing nor stopping can rescue this line
            if (-gain[depth - 1]).max(gain[depth]) < 0 {
                break;
            }

            let (next, next_bb) = self.least_valuable(side_attackers, side);
            // The king may only recapture when nothing can answer
            if next == Piece::King
                && (attackers & self.pieces_of_color(side.opponent()) & occupancy).any()
            {
                break;
            }
            current = next;
            current_bb = next_bb;
        }

        while depth > 0 {
            depth -= 1;
            gain[depth] = -(-gain[depth]).max(gain[depth + 1]);
        }
        gain[0]
    }

    /// Returns true if the exchange on `m` nets at least `threshold`
    #[inline]
    #[must_use]
    pub fn see_ge(&self, m: Move, threshold: i32) -> bool {
        self.see(m) >= threshold
    }

    /// Sliders newly attacking `sq` after a piece moving along their line
    /// was removed from `occupancy`
    fn xray_attackers(&self, sq: Square, occupancy: Bitboard, removed: Piece) -> Bitboard {
        let mut revealed = Bitboard::EMPTY;
        if matches!(removed, Piece::Pawn | Piece::Bishop | Piece::Queen) {
            let diagonal = self.pieces(Piece::Bishop) | self.pieces(Piece::Queen);
            revealed |= attacks::bishop_attacks(sq, occupancy) & diagonal & occupancy;
        }
        if matches!(removed, Piece::Rook | Piece::Queen) {
            let orthogonal = self.pieces(Piece::Rook) | self.pieces(Piece::Queen);
            revealed |= attacks::rook_attacks(sq, occupancy) & orthogonal & occupancy;
        }
        revealed
    }

    /// Least valuable piece of `side` within `candidates`
    fn least_valuable(
        &self,
        candidates: Bitboard,
        side: super::types::Color,
    ) -> (Piece, Bitboard) {
        for piece in Piece::ALL {
            let subset = candidates & self.pieces_of(side, piece);
            if subset.any() {
                return (piece, Bitboard::from_square(subset.lsb()));
            }
        }
        (Piece::Pawn, Bitboard::EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(fen: &str, from: &str, to: &str) -> i32 {
        let pos = Position::from_fen(fen).unwrap();
        let m = Move::new(from.parse().unwrap(), to.parse().unwrap());
        pos.see(m)
    }

    #[test]
    fn undefended_pawn_wins_a_pawn() {
        let see = capture("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1", "e4", "d5");
        assert_eq!(see, 100);
    }

    #[test]
    fn pawn_takes_defended_pawn_is_even() {
        let see = capture("4k3/8/2p5/3p4/4P3/8/8/4K3 w - - 0 1", "e4", "d5");
        assert_eq!(see, 0);
    }

    #[test]
    fn knight_takes_defended_pawn_loses() {
        let see = capture("4k3/8/2p5/3p4/4N3/8/8/4K3 w - - 0 1", "e4", "d5");
        assert_eq!(see, 100 - 320);
    }

    #[test]
    fn queen_takes_defended_pawn_loses_badly() {
        let see = capture("4k3/8/2p5/3p4/4Q3/8/8/4K3 w - - 0 1", "e4", "d5");
        assert!(see <= 100 - 900);
    }

    #[test]
    fn xray_rook_backs_up_the_exchange() {
        // Doubled white rooks on the d-file win the undefended rook
        let see = capture("3r3k/8/8/8/8/8/3R4/3R3K w - - 0 1", "d2", "d8");
        assert_eq!(see, 500);
    }

    #[test]
    fn defended_rook_refutes_queen_grab() {
        let see = capture("3rr2k/8/8/8/8/8/8/K2Q4 w - - 0 1", "d1", "d8");
        assert_eq!(see, 500 - 900);
    }

    #[test]
    fn see_ge_thresholds() {
        let pos =
            Position::from_fen("4k3/8/2p5/3p4/4N3/8/8/4K3 w - - 0 1").unwrap();
        let m = Move::new("e4".parse().unwrap(), "d5".parse().unwrap());
        assert!(pos.see_ge(m, -250));
        assert!(!pos.see_ge(m, 0));
    }
}
