//! Magic bitboard tables for sliding piece attacks.
//!
//! Each slider square gets a relevance mask (its empty-board rays minus
//! non-blocking edge squares), a multiplier found by randomized search, and a
//! slice of a shared attack table. Lookup is mask, multiply, shift, index.

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::position::types::{Bitboard, Square};

use super::ray_attacks;

/// Fixed seed so table construction is deterministic across runs.
const MAGIC_SEED: u64 = 0x1234_5678_9ABC_DEF0;

pub(crate) struct Magic {
    pub mask: u64,
    pub magic: u64,
    pub shift: u32,
    pub offset: usize,
}

impl Magic {
    #[inline]
    fn index(&self, occupied: Bitboard) -> usize {
        let relevant = occupied.0 & self.mask;
        self.offset + (relevant.wrapping_mul(self.magic) >> self.shift) as usize
    }
}

pub(crate) struct MagicTable {
    magics: Vec<Magic>,
    attacks: Vec<u64>,
}

impl MagicTable {
    #[inline]
    pub fn attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let magic = &self.magics[sq.as_usize()];
        Bitboard(self.attacks[magic.index(occupied)])
    }
}

pub(crate) static BISHOP_MAGICS: Lazy<MagicTable> =
    Lazy::new(|| build_table(&[9, 7, -7, -9]));

pub(crate) static ROOK_MAGICS: Lazy<MagicTable> =
    Lazy::new(|| build_table(&[8, 1, -1, -8]));

/// Squares whose occupancy never affects the attack set from `sq`: board
/// edges that are not on the same rank or file as `sq` itself.
fn edge_mask(sq: Square) -> u64 {
    let rank_edges = (Bitboard::RANK_1.0 | Bitboard::RANK_8.0)
        & !Bitboard::rank_mask(sq.rank()).0;
    let file_edges = (Bitboard::FILE_A.0 | Bitboard::FILE_H.0)
        & !Bitboard::file_mask(sq.file()).0;
    rank_edges | file_edges
}

fn build_table(steps: &[i8; 4]) -> MagicTable {
    let mut rng = StdRng::seed_from_u64(MAGIC_SEED);
    let mut magics = Vec::with_capacity(64);
    let mut attacks = Vec::new();

    for idx in 0..64u8 {
        let sq = Square(idx);
        let mask = ray_attacks(sq, Bitboard::EMPTY, steps).0 & !edge_mask(sq);
        let bits = mask.count_ones();
        let shift = 64 - bits;
        let size = 1usize << bits;
        let offset = attacks.len();
        attacks.resize(offset + size, 0u64);

        // Enumerate every subset of the relevance mask (carry-rippler) and
        // precompute its true attack set.
        let mut occupancies = Vec::with_capacity(size);
        let mut references = Vec::with_capacity(size);
        let mut subset: u64 = 0;
        loop {
            occupancies.push(subset);
            references.push(ray_attacks(sq, Bitboard(subset), steps).0);
            subset = subset.wrapping_sub(mask) & mask;
            if subset == 0 {
                break;
            }
        }

        // Search for a multiplier that maps every occupancy to a slot whose
        // contents agree with its attack set. Constructive collisions (same
        // slot, same attacks) are what make magics compact.
        let magic = loop {
            let candidate = sparse_random(&mut rng);
            // Cheap rejection: the high bits of the mapped mask must be dense.
            if (mask.wrapping_mul(candidate) >> 56).count_ones() < 6 {
                continue;
            }
            let table = &mut attacks[offset..offset + size];
            table.fill(0);
            let mut used = vec![false; size];
            let mut ok = true;
            for (i, &occ) in occupancies.iter().enumerate() {
                let slot = (occ.wrapping_mul(candidate) >> shift) as usize;
                if used[slot] && table[slot] != references[i] {
                    ok = false;
                    break;
                }
                used[slot] = true;
                table[slot] = references[i];
            }
            if ok {
                break candidate;
            }
        };

        magics.push(Magic {
            mask,
            magic,
            shift,
            offset,
        });
    }

    MagicTable { magics, attacks }
}

/// Random u64 with few set bits. Sparse multipliers succeed far more often.
fn sparse_random(rng: &mut StdRng) -> u64 {
    rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Exhaustive check is in the parent module; these cover table shape.

    #[test]
    fn masks_exclude_edges() {
        let table = &*ROOK_MAGICS;
        let d4 = Square::make(3, 3);
        let mask = table.magics[d4.as_usize()].mask;
        assert_eq!(mask & Bitboard::from_square(Square::make(3, 0)).0, 0);
        assert_eq!(mask & Bitboard::from_square(Square::make(3, 7)).0, 0);
        assert_eq!(mask & Bitboard::from_square(Square::make(0, 3)).0, 0);
        assert!(mask & Bitboard::from_square(Square::make(3, 4)).0 != 0);
    }

    #[test]
    fn corner_rook_attacks_empty_board() {
        let attacks = ROOK_MAGICS.attacks(Square::A1, Bitboard::EMPTY);
        assert_eq!(attacks.popcount(), 14);
    }

    #[test]
    fn blocked_bishop_stops_at_blocker() {
        let c1 = Square::make(2, 0);
        let e3 = Square::make(4, 2);
        let attacks = BISHOP_MAGICS.attacks(c1, Bitboard::from_square(e3));
        assert!(attacks.contains(e3));
        assert!(!attacks.contains(Square::make(5, 3)));
        assert!(attacks.contains(Square::make(1, 1)));
    }
}
