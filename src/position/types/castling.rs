//! Castling rights bitmask.

use super::piece::Color;
use super::square::Square;

pub const WHITE_OO: u8 = 1;
pub const WHITE_OOO: u8 = 2;
pub const BLACK_OO: u8 = 4;
pub const BLACK_OOO: u8 = 8;
pub const ALL_CASTLING: u8 = 15;

/// Kingside right for a color
#[inline]
#[must_use]
pub const fn kingside(side: Color) -> u8 {
    match side {
        Color::White => WHITE_OO,
        Color::Black => BLACK_OO,
    }
}

/// Queenside right for a color
#[inline]
#[must_use]
pub const fn queenside(side: Color) -> u8 {
    match side {
        Color::White => WHITE_OOO,
        Color::Black => BLACK_OOO,
    }
}

/// Rights cleared when a piece moves from or to each square. Touching e1
/// drops both white rights, touching h8 drops black kingside, and so on.
pub(crate) const RIGHTS_CLEARED_BY_SQUARE: [u8; 64] = build_clear_table();

const fn build_clear_table() -> [u8; 64] {
    let mut table = [0u8; 64];
    table[Square::A1.0 as usize] = WHITE_OOO;
    table[Square::E1.0 as usize] = WHITE_OO | WHITE_OOO;
    table[Square::H1.0 as usize] = WHITE_OO;
    table[Square::A8.0 as usize] = BLACK_OOO;
    table[Square::E8.0 as usize] = BLACK_OO | BLACK_OOO;
    table[Square::H8.0 as usize] = BLACK_OO;
    table
}

/// Castling destinations for the king and rook, given the side and whether
/// the move is kingside.
#[inline]
#[must_use]
pub(crate) const fn king_rook_destinations(side: Color, king_side: bool) -> (Square, Square) {
    match (side, king_side) {
        (Color::White, true) => (Square::G1, Square::F1),
        (Color::White, false) => (Square::C1, Square::D1),
        (Color::Black, true) => (Square::G8, Square::F8),
        (Color::Black, false) => (Square::C8, Square::D8),
    }
}

/// FEN castling field for a rights mask
#[must_use]
pub(crate) fn to_fen(rights: u8) -> String {
    if rights == 0 {
        return "-".to_string();
    }
    let mut s = String::new();
    if rights & WHITE_OO != 0 {
        s.push('K');
    }
    if rights & WHITE_OOO != 0 {
        s.push('Q');
    }
    if rights & BLACK_OO != 0 {
        s.push('k');
    }
    if rights & BLACK_OOO != 0 {
        s.push('q');
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_table_covers_corners_and_kings() {
        assert_eq!(RIGHTS_CLEARED_BY_SQUARE[Square::E1.0 as usize], WHITE_OO | WHITE_OOO);
        assert_eq!(RIGHTS_CLEARED_BY_SQUARE[Square::H1.0 as usize], WHITE_OO);
        assert_eq!(RIGHTS_CLEARED_BY_SQUARE[Square::A8.0 as usize], BLACK_OOO);
        assert_eq!(RIGHTS_CLEARED_BY_SQUARE[Square::B1.0 as usize], 0);
    }

    #[test]
    fn fen_rendering() {
        assert_eq!(to_fen(ALL_CASTLING), "KQkq");
        assert_eq!(to_fen(WHITE_OO | BLACK_OOO), "Kq");
        assert_eq!(to_fen(0), "-");
    }
}
