//! Move encoding and move lists.

use std::fmt;
use std::ops::Index;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::piece::Piece;
use super::square::Square;

/// Special-move discriminator stored in the top two bits of a [`Move`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveKind {
    Normal,
    Promotion,
    EnPassant,
    Castling,
}

/// Compact 16-bit move representation.
///
/// Encoding:
/// - bits 0-5:   destination square
/// - bits 6-11:  origin square
/// - bits 12-13: promotion piece (0 = knight, ..., 3 = queen)
/// - bits 14-15: kind (0 = normal, 1 = promotion, 2 = en passant, 3 = castling)
///
/// Castling is encoded as "king captures own rook": the origin is the king
/// square and the destination is the rook square. The all-zero value doubles
/// as the null move since a1-to-a1 is never a legal move.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Move(u16);

const KIND_PROMOTION: u16 = 1 << 14;
const KIND_EN_PASSANT: u16 = 2 << 14;
const KIND_CASTLING: u16 = 3 << 14;

impl Move {
    /// The null move, used as an "empty slot" sentinel
    pub const NONE: Move = Move(0);

    /// Create a normal move (includes captures and pawn double pushes)
    #[inline]
    #[must_use]
    pub const fn new(from: Square, to: Square) -> Self {
        Move(((from.0 as u16) << 6) | to.0 as u16)
    }

    /// Create a promotion move
    #[inline]
    #[must_use]
    pub const fn promotion(from: Square, to: Square, promo: Piece) -> Self {
        let promo_bits = match promo {
            Piece::Knight => 0,
            Piece::Bishop => 1,
            Piece::Rook => 2,
            _ => 3,
        };
        Move(KIND_PROMOTION | (promo_bits << 12) | ((from.0 as u16) << 6) | to.0 as u16)
    }

    /// Create an en passant capture
    #[inline]
    #[must_use]
    pub const fn en_passant(from: Square, to: Square) -> Self {
        Move(KIND_EN_PASSANT | ((from.0 as u16) << 6) | to.0 as u16)
    }

    /// Create a castling move from the king square to the rook square
    #[inline]
    #[must_use]
    pub const fn castling(king: Square, rook: Square) -> Self {
        Move(KIND_CASTLING | ((king.0 as u16) << 6) | rook.0 as u16)
    }

    /// Origin square
    #[inline]
    #[must_use]
    pub const fn from(self) -> Square {
        Square(((self.0 >> 6) & 0x3F) as u8)
    }

    /// Destination square (the rook square for castling)
    #[inline]
    #[must_use]
    pub const fn to(self) -> Square {
        Square((self.0 & 0x3F) as u8)
    }

    #[inline]
    #[must_use]
    pub const fn kind(self) -> MoveKind {
        match self.0 >> 14 {
            0 => MoveKind::Normal,
            1 => MoveKind::Promotion,
            2 => MoveKind::EnPassant,
            _ => MoveKind::Castling,
        }
    }

    /// Promotion piece. Only meaningful for promotion moves.
    #[inline]
    #[must_use]
    pub const fn promotion_piece(self) -> Piece {
        match (self.0 >> 12) & 3 {
            0 => Piece::Knight,
            1 => Piece::Bishop,
            2 => Piece::Rook,
            _ => Piece::Queen,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_promotion(self) -> bool {
        self.0 >> 14 == 1
    }

    #[inline]
    #[must_use]
    pub const fn is_en_passant(self) -> bool {
        self.0 >> 14 == 2
    }

    #[inline]
    #[must_use]
    pub const fn is_castling(self) -> bool {
        self.0 >> 14 == 3
    }

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Raw 16-bit value for hash table storage
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Reconstruct from a raw 16-bit value
    #[inline]
    #[must_use]
    pub const fn from_u16(value: u16) -> Self {
        Move(value)
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "Move(none)");
        }
        write!(f, "Move({}{}", self.from(), self.to())?;
        match self.kind() {
            MoveKind::Normal => {}
            MoveKind::Promotion => write!(f, "={}", self.promotion_piece().to_char())?,
            MoveKind::EnPassant => write!(f, " ep")?,
            MoveKind::Castling => write!(f, " castle")?,
        }
        write!(f, ")")
    }
}

pub(crate) const MAX_MOVES: usize = 256;
pub const MAX_PLY: usize = 128;

/// List of moves with fixed-size backing array.
#[derive(Clone, Debug)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    #[must_use]
    pub fn new() -> Self {
        MoveList {
            moves: [Move::NONE; MAX_MOVES],
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, mv: Move) {
        self.moves[self.len] = mv;
        self.len += 1;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [Move] {
        &mut self.moves[..self.len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.as_slice().iter()
    }

    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }

    /// Drop moves rejected by the predicate, preserving order
    pub fn retain(&mut self, mut keep: impl FnMut(Move) -> bool) {
        let mut kept = 0;
        for i in 0..self.len {
            if keep(self.moves[i]) {
                self.moves[kept] = self.moves[i];
                kept += 1;
            }
        }
        self.len = kept;
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl Default for MoveList {
    fn default() -> Self {
        MoveList::new()
    }
}

impl Index<usize> for MoveList {
    type Output = Move;

    fn index(&self, idx: usize) -> &Self::Output {
        assert!(
            idx < self.len,
            "MoveList index {} out of bounds (len {})",
            idx,
            self.len
        );
        &self.moves[idx]
    }
}

/// A scored move for move ordering.
#[derive(Clone, Copy, Debug)]
pub struct ScoredMove {
    pub mv: Move,
    pub score: i32,
}

/// Fixed-size list of scored moves to avoid heap allocation.
#[derive(Clone)]
pub struct ScoredMoveList {
    moves: [ScoredMove; MAX_MOVES],
    len: usize,
}

impl ScoredMoveList {
    #[must_use]
    pub fn new() -> Self {
        ScoredMoveList {
            moves: [ScoredMove {
                mv: Move::NONE,
                score: 0,
            }; MAX_MOVES],
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, mv: Move, score: i32) {
        self.moves[self.len] = ScoredMove { mv, score };
        self.len += 1;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ScoredMove] {
        &self.moves[..self.len]
    }

    /// Partial selection sort: swap the best move from index `start` onwards
    /// into position `start` and return it. O(n - start) per call, which
    /// avoids sorting moves that a cutoff means we never try.
    #[inline]
    pub fn pick_best(&mut self, start: usize) -> Option<ScoredMove> {
        if start >= self.len {
            return None;
        }
        let mut best_idx = start;
        for i in (start + 1)..self.len {
            if self.moves[i].score > self.moves[best_idx].score {
                best_idx = i;
            }
        }
        if best_idx != start {
            self.moves.swap(start, best_idx);
        }
        Some(self.moves[start])
    }
}

impl Default for ScoredMoveList {
    fn default() -> Self {
        ScoredMoveList::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_roundtrip() {
        let mv = Move::new(Square::make(4, 1), Square::make(4, 3));
        assert_eq!(mv.from(), Square::make(4, 1));
        assert_eq!(mv.to(), Square::make(4, 3));
        assert_eq!(mv.kind(), MoveKind::Normal);

        let promo = Move::promotion(Square::make(0, 6), Square::make(0, 7), Piece::Rook);
        assert!(promo.is_promotion());
        assert_eq!(promo.promotion_piece(), Piece::Rook);

        let castle = Move::castling(Square::E1, Square::H1);
        assert!(castle.is_castling());
        assert_eq!(castle.from(), Square::E1);
        assert_eq!(castle.to(), Square::H1);
    }

    #[test]
    fn null_move_is_distinct() {
        assert!(Move::NONE.is_none());
        assert!(!Move::new(Square::A1, Square::B1).is_none());
        assert_eq!(Move::from_u16(Move::NONE.as_u16()), Move::NONE);
    }

    #[test]
    fn pick_best_selects_descending() {
        let mut list = ScoredMoveList::new();
        list.push(Move::new(Square::A1, Square::B1), 5);
        list.push(Move::new(Square::A1, Square::C1), 50);
        list.push(Move::new(Square::A1, Square::D1), -3);
        let first = list.pick_best(0).unwrap();
        assert_eq!(first.score, 50);
        let second = list.pick_best(1).unwrap();
        assert_eq!(second.score, 5);
        let third = list.pick_best(2).unwrap();
        assert_eq!(third.score, -3);
        assert!(list.pick_best(3).is_none());
    }

    #[test]
    fn retain_preserves_order() {
        let mut list = MoveList::new();
        for file in 0..5u8 {
            list.push(Move::new(Square::A1, Square::make(file, 1)));
        }
        list.retain(|m| m.to().file() % 2 == 0);
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].to().file(), 0);
        assert_eq!(list[2].to().file(), 4);
    }
}
