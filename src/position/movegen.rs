//! Pseudo-legal move generation by class.
//!
//! Generation is split so the search can ask for exactly what it needs:
//! captures for quiescence, evasions when in check, quiets only after the
//! captures have been tried. Output is pseudo-legal; callers filter with
//! [`Position::is_legal`] except for `GenType::Legal`, which filters here.

use super::attacks;
use super::types::piece::PROMOTION_PIECES;
use super::types::{castling, Bitboard, Color, Move, MoveList, Piece, Square};
use super::Position;

/// Which class of moves to generate
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GenType {
    /// Captures, en passant, and all promotions
    Captures,
    /// Non-captures without promotions, including castling
    Quiets,
    /// Check evasions: king moves plus blocks and captures of the checker
    Evasions,
    /// Captures plus quiets, for positions not in check
    NonEvasions,
    /// Fully legal moves for the side to move
    Legal,
}

/// Append the requested class of moves for the side to move
pub fn generate(pos: &Position, list: &mut MoveList, gen: GenType) {
    match gen {
        GenType::Legal => {
            if pos.in_check() {
                generate(pos, list, GenType::Evasions);
            } else {
                generate(pos, list, GenType::NonEvasions);
            }
            list.retain(|m| pos.is_legal(m));
        }
        GenType::Evasions => generate_evasions(pos, list),
        GenType::NonEvasions => {
            generate(pos, list, GenType::Captures);
            generate(pos, list, GenType::Quiets);
        }
        GenType::Captures | GenType::Quiets => {
            debug_assert!(!pos.in_check());
            let us = pos.side_to_move();
            let targets = match gen {
                GenType::Captures => pos.pieces_of_color(us.opponent()),
                _ => !pos.occupied(),
            };
            generate_pawn_moves(pos, list, us, gen, Bitboard::ALL);
            generate_piece_moves(pos, list, us, targets);
            let king_from = pos.king_square(us);
            let king_targets = attacks::king_attacks(king_from) & targets;
            for to in king_targets {
                list.push(Move::new(king_from, to));
            }
            if gen == GenType::Quiets {
                generate_castling(pos, list, us);
            }
        }
    }
}

fn generate_evasions(pos: &Position, list: &mut MoveList) {
    let us = pos.side_to_move();
    let checkers = pos.checkers();
    debug_assert!(checkers.any());
    let ksq = pos.king_square(us);

    // King steps, captures included
    let king_targets = attacks::king_attacks(ksq) & !pos.pieces_of_color(us);
    for to in king_targets {
        list.push(Move::new(ksq, to));
    }

    // Double check: only the king may move
    if checkers.more_than_one() {
        return;
    }

    // Block the check or capture the checker
    let checker = checkers.lsb();
    let mask = attacks::between(ksq, checker) | checkers;
    generate_pawn_moves(pos, list, us, GenType::Evasions, mask);
    generate_piece_moves(pos, list, us, mask);
}

fn generate_piece_moves(pos: &Position, list: &mut MoveList, us: Color, targets: Bitboard) {
    let occupied = pos.occupied();
    for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        for from in pos.pieces_of(us, piece) {
            let moves = attacks::piece_attacks(piece, from, occupied) & targets;
            for to in moves {
                list.push(Move::new(from, to));
            }
        }
    }
}

/// Pawn pushes, captures, promotions, and en passant. `mask` restricts the
/// destinations (used for evasions); quiet and capture classes are selected
/// by `gen`. Promotions count as captures here regardless of whether a
/// piece is taken, so quiescence sees them.
fn generate_pawn_moves(pos: &Position, list: &mut MoveList, us: Color, gen: GenType, mask: Bitboard) {
    let them = us.opponent();
    let forward = us.forward();
    let empty = !pos.occupied();
    let enemies = pos.pieces_of_color(them);
    let rank7 = match us {
        Color::White => Bitboard::RANK_7,
        Color::Black => Bitboard::RANK_2,
    };
    let double_rank = match us {
        Color::White => Bitboard::RANK_4,
        Color::Black => Bitboard::RANK_5,
    };

    let pawns = pos.pieces_of(us, Piece::Pawn);
    let promoting = pawns & rank7;
    let ordinary = pawns & !rank7;

    let want_quiets = matches!(gen, GenType::Quiets | GenType::Evasions | GenType::NonEvasions);
    let want_captures =
        matches!(gen, GenType::Captures | GenType::Evasions | GenType::NonEvasions);

    if want_quiets {
        let single = ordinary.shift(forward) & empty;
        let double = single.shift(forward) & empty & double_rank;
        for to in single & mask {
            list.push(Move::new(to.offset(-forward), to));
        }
        for to in double & mask {
            list.push(Move::new(to.offset(-2 * forward), to));
        }
    }

    if want_captures {
        let (left, right) = capture_steps(us);
        for (step, wing) in [
            (left, ordinary.shift(left)),
            (right, ordinary.shift(right)),
        ] {
            for to in wing & enemies & mask {
                list.push(Move::new(to.offset(-step), to));
            }
        }

        // Promotions, capturing or not
        if promoting.any() {
            for to in promoting.shift(forward) & empty & mask {
                push_promotions(list, to.offset(-forward), to);
            }
            for (step, wing) in [
                (left, promoting.shift(left)),
                (right, promoting.shift(right)),
            ] {
                for to in wing & enemies & mask {
                    push_promotions(list, to.offset(-step), to);
                }
            }
        }

        if let Some(ep) = pos.ep_square() {
            // When evading, the en passant capture only matters if the
            // checking pawn is the one being taken
            let capture_sq = ep.offset(-forward);
            if gen != GenType::Evasions || pos.checkers().contains(capture_sq) {
                let candidates = attacks::pawn_attacks(them, ep) & ordinary;
                for from in candidates {
                    list.push(Move::en_passant(from, ep));
                }
            }
        }
    }
}

fn push_promotions(list: &mut MoveList, from: Square, to: Square) {
    for promo in PROMOTION_PIECES {
        list.push(Move::promotion(from, to, promo));
    }
}

const fn capture_steps(us: Color) -> (i8, i8) {
    match us {
        Color::White => (7, 9),
        Color::Black => (-9, -7),
    }
}

fn generate_castling(pos: &Position, list: &mut MoveList, us: Color) {
    debug_assert!(!pos.in_check());
    let rights = pos.castling_rights();
    let ksq = pos.king_square(us);
    for (right, rook_file) in [(castling::kingside(us), 7u8), (castling::queenside(us), 0u8)] {
        if rights & right == 0 {
            continue;
        }
        let rook_sq = Square::make(rook_file, ksq.rank());
        if pos.piece_on(rook_sq) != Some((us, Piece::Rook)) {
            continue;
        }
        if (attacks::between(ksq, rook_sq) & pos.occupied()).is_empty() {
            list.push(Move::castling(ksq, rook_sq));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::START_FEN;

    fn count(fen: &str, gen: GenType) -> usize {
        let pos = Position::from_fen(fen).unwrap();
        let mut list = MoveList::new();
        generate(&pos, &mut list, gen);
        list.len()
    }

    #[test]
    fn startpos_has_twenty_legal_moves() {
        assert_eq!(count(START_FEN, GenType::Legal), 20);
        assert_eq!(count(START_FEN, GenType::Captures), 0);
        assert_eq!(count(START_FEN, GenType::Quiets), 20);
    }

    #[test]
    fn kiwipete_move_count() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        assert_eq!(count(fen, GenType::Legal), 48);
    }

    #[test]
    fn evasions_only_resolve_check() {
        // Rook gives check along the e-file
        let fen = "4k3/8/8/8/4R3/8/8/4K3 b - - 0 1";
        let pos = Position::from_fen(fen).unwrap();
        assert!(pos.in_check());
        let mut list = MoveList::new();
        generate(&pos, &mut list, GenType::Legal);
        for &m in &list {
            assert_eq!(m.from(), pos.king_square(Color::Black));
        }
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn double_check_forces_king_moves() {
        // Knight on f6 and rook on e1 both check the king on e8
        let fen = "4k3/8/5N2/8/8/8/8/4RK2 b - - 0 1";
        let pos = Position::from_fen(fen).unwrap();
        assert!(pos.checkers().more_than_one());
        let mut list = MoveList::new();
        generate(&pos, &mut list, GenType::Legal);
        assert!(list.iter().all(|m| m.from() == Square::E8));
    }

    #[test]
    fn promotions_appear_in_captures_class() {
        let fen = "r3k3/1P6/8/8/8/8/8/4K3 w - - 0 1";
        let pos = Position::from_fen(fen).unwrap();
        let mut list = MoveList::new();
        generate(&pos, &mut list, GenType::Captures);
        // Push to b8 plus capture on a8, four promotion pieces each
        assert_eq!(list.iter().filter(|m| m.is_promotion()).count(), 8);
    }

    #[test]
    fn pinned_piece_moves_filtered_from_legal() {
        // Bishop on d2 is pinned by the rook on d8
        let fen = "3r3k/8/8/8/8/8/3B4/3K4 w - - 0 1";
        let pos = Position::from_fen(fen).unwrap();
        let mut list = MoveList::new();
        generate(&pos, &mut list, GenType::Legal);
        assert!(list
            .iter()
            .all(|m| m.from() != Square::make(3, 1) || m.to().file() == 3));
    }

    #[test]
    fn castling_blocked_by_attacked_transit_square() {
        // Black rook on f8 attacks f1, forbidding white kingside castling
        let fen = "5r2/8/8/8/8/k7/8/R3K2R w KQ - 0 1";
        let pos = Position::from_fen(fen).unwrap();
        let mut list = MoveList::new();
        generate(&pos, &mut list, GenType::Legal);
        let castles: Vec<_> = list.iter().filter(|m| m.is_castling()).collect();
        assert_eq!(castles.len(), 1);
        assert_eq!(castles[0].to(), Square::A1);
    }
}
