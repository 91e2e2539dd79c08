//! Zobrist hashing for chess positions.
//!
//! Keys are drawn from a fixed-seed PRNG so hashes are reproducible across
//! runs and across threads, which the transposition table relies on.

use once_cell::sync::Lazy;
use rand::prelude::*;

use crate::position::types::{Color, Piece, Square};

pub(crate) struct ZobristKeys {
    // piece[color][piece_type][square]
    pub(crate) piece: [[[u64; 64]; 6]; 2],
    pub(crate) side_to_move: u64,
    // One key per castling-rights mask (0-15), built from four base keys so
    // rights can be toggled individually or re-keyed as a set.
    pub(crate) castling: [u64; 16],
    // Only the file of the en passant square matters
    pub(crate) en_passant: [u64; 8],
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(1234567890_u64);
        let mut piece = [[[0u64; 64]; 6]; 2];
        for color in &mut piece {
            for pt in color.iter_mut() {
                for key in pt.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        let side_to_move = rng.gen();

        let mut right_keys = [0u64; 4];
        for key in &mut right_keys {
            *key = rng.gen();
        }
        let mut castling = [0u64; 16];
        for (mask, slot) in castling.iter_mut().enumerate() {
            for (bit, key) in right_keys.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    *slot ^= key;
                }
            }
        }

        let mut en_passant = [0u64; 8];
        for key in &mut en_passant {
            *key = rng.gen();
        }

        ZobristKeys {
            piece,
            side_to_move,
            castling,
            en_passant,
        }
    }

    #[inline]
    pub(crate) fn piece_key(&self, color: Color, piece: Piece, sq: Square) -> u64 {
        self.piece[color.index()][piece.index()][sq.as_usize()]
    }

    #[inline]
    pub(crate) fn castling_key(&self, rights: u8) -> u64 {
        self.castling[rights as usize]
    }

    #[inline]
    pub(crate) fn en_passant_key(&self, sq: Square) -> u64 {
        self.en_passant[sq.file() as usize]
    }
}

pub(crate) static ZOBRIST: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::new);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic() {
        let a = ZobristKeys::new();
        let b = ZobristKeys::new();
        assert_eq!(a.piece, b.piece);
        assert_eq!(a.side_to_move, b.side_to_move);
        assert_eq!(a.castling, b.castling);
        assert_eq!(a.en_passant, b.en_passant);
    }

    #[test]
    fn castling_keys_compose() {
        let keys = &*ZOBRIST;
        assert_eq!(keys.castling[0], 0);
        assert_eq!(keys.castling[0b0011], keys.castling[0b0001] ^ keys.castling[0b0010]);
        // Toggling one right in a full mask lands on the complement
        assert_eq!(
            keys.castling[0b1111] ^ keys.castling[0b1000],
            keys.castling[0b0111]
        );
    }

    #[test]
    fn no_duplicate_piece_keys() {
        let keys = &*ZOBRIST;
        let mut seen = std::collections::HashSet::new();
        for color in &keys.piece {
            for pt in color {
                for &key in pt {
                    assert!(seen.insert(key));
                }
            }
        }
    }
}
