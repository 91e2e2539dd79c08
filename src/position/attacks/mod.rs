//! Precomputed attack tables.
//!
//! Leaper attacks (pawn, knight, king) and the square-relation tables
//! (between, line, Chebyshev distance) are filled by direct enumeration.
//! Slider attacks go through the magic tables in [`magics`]; the ray-walk
//! generator here is the slow reference used to build and verify them.

pub(crate) mod magics;

use once_cell::sync::Lazy;

use super::types::{Bitboard, Color, Piece, Square};

/// Slow ray-walk attack generator for sliders. Shared by table construction
/// and by tests that verify the magic lookups against it.
pub(crate) fn ray_attacks(sq: Square, occupied: Bitboard, steps: &[i8; 4]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for &step in steps {
        let mut cursor = sq;
        while let Some(next) = step_on_board(cursor, step) {
            attacks |= Bitboard::from_square(next);
            if occupied.contains(next) {
                break;
            }
            cursor = next;
        }
    }
    attacks
}

/// One king step in the given direction, `None` if it leaves the board.
fn step_on_board(sq: Square, step: i8) -> Option<Square> {
    let dest = sq.0 as i16 + step as i16;
    if !(0..64).contains(&dest) {
        return None;
    }
    let dest = Square(dest as u8);
    if (sq.file() as i8 - dest.file() as i8).abs() > 1 {
        return None;
    }
    Some(dest)
}

const BISHOP_STEPS: [i8; 4] = [9, 7, -7, -9];
const ROOK_STEPS: [i8; 4] = [8, 1, -1, -8];

static PAWN_ATTACKS: Lazy<[[Bitboard; 64]; 2]> = Lazy::new(|| {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    for idx in 0..64u8 {
        let bb = Bitboard(1 << idx);
        table[Color::White.index()][idx as usize] = bb.shift(9) | bb.shift(7);
        table[Color::Black.index()][idx as usize] = bb.shift(-9) | bb.shift(-7);
    }
    table
});

static KNIGHT_ATTACKS: Lazy<[Bitboard; 64]> = Lazy::new(|| {
    let mut table = [Bitboard::EMPTY; 64];
    let deltas: [(i8, i8); 8] = [
        (2, 1),
        (1, 2),
        (-1, 2),
        (-2, 1),
        (-2, -1),
        (-1, -2),
        (1, -2),
        (2, -1),
    ];
    for idx in 0..64u8 {
        let sq = Square(idx);
        let mut mask = Bitboard::EMPTY;
        for (df, dr) in deltas {
            let file = sq.file() as i8 + df;
            let rank = sq.rank() as i8 + dr;
            if (0..8).contains(&file) && (0..8).contains(&rank) {
                mask |= Bitboard::from_square(Square::make(file as u8, rank as u8));
            }
        }
        table[idx as usize] = mask;
    }
    table
});

static KING_ATTACKS: Lazy<[Bitboard; 64]> = Lazy::new(|| {
    let mut table = [Bitboard::EMPTY; 64];
    for idx in 0..64u8 {
        let bb = Bitboard(1 << idx);
        table[idx as usize] = bb.shift(8)
            | bb.shift(-8)
            | bb.shift(1)
            | bb.shift(-1)
            | bb.shift(9)
            | bb.shift(7)
            | bb.shift(-7)
            | bb.shift(-9);
    }
    table
});

/// Squares strictly between two aligned squares, empty when not aligned.
static BETWEEN: Lazy<Box<[[Bitboard; 64]; 64]>> = Lazy::new(|| {
    let mut table = Box::new([[Bitboard::EMPTY; 64]; 64]);
    for a in 0..64u8 {
        for step in BISHOP_STEPS.iter().chain(ROOK_STEPS.iter()) {
            let mut seen = Bitboard::EMPTY;
            let mut cursor = Square(a);
            while let Some(next) = step_on_board(cursor, *step) {
                table[a as usize][next.as_usize()] = seen;
                seen |= Bitboard::from_square(next);
                cursor = next;
            }
        }
    }
    table
});

/// Full line (edge to edge) through two aligned squares, including both,
/// empty when not aligned.
static LINE: Lazy<Box<[[Bitboard; 64]; 64]>> = Lazy::new(|| {
    let mut table = Box::new([[Bitboard::EMPTY; 64]; 64]);
    for a in 0..64u8 {
        let sq = Square(a);
        let bishop = ray_attacks(sq, Bitboard::EMPTY, &BISHOP_STEPS);
        let rook = ray_attacks(sq, Bitboard::EMPTY, &ROOK_STEPS);
        for b in 0..64u8 {
            if a == b {
                continue;
            }
            let other = Square(b);
            if bishop.contains(other) {
                table[a as usize][b as usize] = (bishop
                    & ray_attacks(other, Bitboard::EMPTY, &BISHOP_STEPS))
                    | Bitboard::from_square(sq)
                    | Bitboard::from_square(other);
            } else if rook.contains(other) {
                table[a as usize][b as usize] = (rook
                    & ray_attacks(other, Bitboard::EMPTY, &ROOK_STEPS))
                    | Bitboard::from_square(sq)
                    | Bitboard::from_square(other);
            }
        }
    }
    table
});

static DISTANCE: Lazy<[[u8; 64]; 64]> = Lazy::new(|| {
    let mut table = [[0u8; 64]; 64];
    for a in 0..64u8 {
        for b in 0..64u8 {
            let (sa, sb) = (Square(a), Square(b));
            let df = (sa.file() as i8 - sb.file() as i8).unsigned_abs();
            let dr = (sa.rank() as i8 - sb.rank() as i8).unsigned_abs();
            table[a as usize][b as usize] = df.max(dr);
        }
    }
    table
});

#[inline]
#[must_use]
pub fn pawn_attacks(side: Color, sq: Square) -> Bitboard {
    PAWN_ATTACKS[side.index()][sq.as_usize()]
}

#[inline]
#[must_use]
pub fn knight_attacks(sq: Square) -> Bitboard {
    KNIGHT_ATTACKS[sq.as_usize()]
}

#[inline]
#[must_use]
pub fn king_attacks(sq: Square) -> Bitboard {
    KING_ATTACKS[sq.as_usize()]
}

#[inline]
#[must_use]
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    magics::BISHOP_MAGICS.attacks(sq, occupied)
}

#[inline]
#[must_use]
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    magics::ROOK_MAGICS.attacks(sq, occupied)
}

#[inline]
#[must_use]
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)
}

/// Attacks of a non-pawn piece from `sq` with the given occupancy
#[inline]
#[must_use]
pub fn piece_attacks(piece: Piece, sq: Square, occupied: Bitboard) -> Bitboard {
    match piece {
        Piece::Knight => knight_attacks(sq),
        Piece::Bishop => bishop_attacks(sq, occupied),
        Piece::Rook => rook_attacks(sq, occupied),
        Piece::Queen => queen_attacks(sq, occupied),
        Piece::King => king_attacks(sq),
        Piece::Pawn => unreachable!("pawn attacks depend on color"),
    }
}

/// Squares strictly between two aligned squares (exclusive of both).
/// Empty when the squares are not on a common rank, file, or diagonal.
#[inline]
#[must_use]
pub fn between(a: Square, b: Square) -> Bitboard {
    BETWEEN[a.as_usize()][b.as_usize()]
}

/// Edge-to-edge line through two aligned squares, including both endpoints.
#[inline]
#[must_use]
pub fn line(a: Square, b: Square) -> Bitboard {
    LINE[a.as_usize()][b.as_usize()]
}

/// Returns true if `c` lies on the line through `a` and `b`
#[inline]
#[must_use]
pub fn aligned(a: Square, b: Square, c: Square) -> bool {
    line(a, b).contains(c)
}

/// Chebyshev distance between two squares
#[inline]
#[must_use]
pub fn distance(a: Square, b: Square) -> u8 {
    DISTANCE[a.as_usize()][b.as_usize()]
}

/// Force all lazily-built tables, so first use is off the hot path.
pub fn init() {
    Lazy::force(&PAWN_ATTACKS);
    Lazy::force(&KNIGHT_ATTACKS);
    Lazy::force(&KING_ATTACKS);
    Lazy::force(&BETWEEN);
    Lazy::force(&LINE);
    Lazy::force(&DISTANCE);
    Lazy::force(&magics::BISHOP_MAGICS);
    Lazy::force(&magics::ROOK_MAGICS);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Enumerate every subset of a mask via the carry-rippler trick.
    fn subsets(mask: u64) -> Vec<u64> {
        let mut out = Vec::new();
        let mut subset: u64 = 0;
        loop {
            out.push(subset);
            subset = subset.wrapping_sub(mask) & mask;
            if subset == 0 {
                break;
            }
        }
        out
    }

    #[test]
    fn magic_lookups_match_ray_walk_exhaustively() {
        for idx in 0..64u8 {
            let sq = Square(idx);
            for (steps, lookup) in [
                (&BISHOP_STEPS, bishop_attacks as fn(Square, Bitboard) -> Bitboard),
                (&ROOK_STEPS, rook_attacks as fn(Square, Bitboard) -> Bitboard),
            ] {
                let mask = ray_attacks(sq, Bitboard::EMPTY, steps).0
                    & !((Bitboard::RANK_1.0 | Bitboard::RANK_8.0)
                        & !Bitboard::rank_mask(sq.rank()).0)
                    & !((Bitboard::FILE_A.0 | Bitboard::FILE_H.0)
                        & !Bitboard::file_mask(sq.file()).0);
                for occ in subsets(mask) {
                    assert_eq!(
                        lookup(sq, Bitboard(occ)),
                        ray_attacks(sq, Bitboard(occ), steps),
                        "square {sq}, occupancy {occ:#x}"
                    );
                }
            }
        }
    }

    #[test]
    fn knight_attacks_corner_and_center() {
        assert_eq!(knight_attacks(Square::A1).popcount(), 2);
        assert_eq!(knight_attacks(Square::make(3, 3)).popcount(), 8);
    }

    #[test]
    fn pawn_attacks_direction_and_edges() {
        let e4 = Square::make(4, 3);
        assert_eq!(
            pawn_attacks(Color::White, e4),
            Bitboard::from_square(Square::make(3, 4)) | Bitboard::from_square(Square::make(5, 4))
        );
        let a2 = Square::make(0, 1);
        assert_eq!(
            pawn_attacks(Color::Black, a2),
            Bitboard::from_square(Square::make(1, 0))
        );
    }

    #[test]
    fn between_is_exclusive_and_symmetric() {
        let a1 = Square::A1;
        let h8 = Square::H8;
        let b = between(a1, h8);
        assert_eq!(b.popcount(), 6);
        assert!(!b.contains(a1));
        assert!(!b.contains(h8));
        assert_eq!(between(h8, a1), b);
        // Unaligned squares
        assert!(between(Square::A1, Square::make(1, 2)).is_empty());
        // Adjacent squares
        assert!(between(Square::E1, Square::F1).is_empty());
    }

    #[test]
    fn line_includes_endpoints_and_extends() {
        let l = line(Square::make(2, 2), Square::make(4, 4));
        assert!(l.contains(Square::A1));
        assert!(l.contains(Square::H8));
        assert_eq!(l.popcount(), 8);
        assert!(line(Square::A1, Square::make(1, 2)).is_empty());
    }

    #[test]
    fn chebyshev_distance() {
        assert_eq!(distance(Square::A1, Square::H8), 7);
        assert_eq!(distance(Square::E1, Square::E1), 0);
        assert_eq!(distance(Square::make(3, 3), Square::make(4, 5)), 2);
    }
}
