//! Shared transposition table.
//!
//! A direct-mapped table of 16-byte slots, each two atomic words accessed
//! with relaxed ordering: the packed entry and the key XORed with it. The
//! XOR lets a reader detect a torn concurrent write and discard the entry,
//! so probes and saves never take a lock. The only lock is an outer
//! `RwLock` around the allocation itself, write-locked exclusively for
//! resize and clear, which the engine only performs while all search
//! threads are idle.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use parking_lot::RwLock;

use crate::position::types::Move;

/// What the stored score proves about the true value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    /// Score is at most the true value failed low
    Upper,
    /// Score is at least the true value, from a fail high
    Lower,
    /// Score is the exact value of the node
    Exact,
}

impl Bound {
    fn to_bits(self) -> u64 {
        match self {
            Bound::Upper => 1,
            Bound::Lower => 2,
            Bound::Exact => 3,
        }
    }

    fn from_bits(bits: u64) -> Self {
        match bits & 3 {
            1 => Bound::Upper,
            2 => Bound::Lower,
            _ => Bound::Exact,
        }
    }
}

/// Depth is stored with a +1 offset so the qsearch depth 0 and the
/// "no useful depth" value -1 both fit in an unsigned byte.
const DEPTH_OFFSET: i32 = -1;

/// Decoded table entry
#[derive(Clone, Copy, Debug)]
pub struct TTEntry {
    pub mv: Move,
    pub score: i32,
    pub depth: i32,
    pub bound: Bound,
    pub is_pv: bool,
}

/// Packed layout, low to high:
/// - bits 0-15:  move
/// - bits 16-31: score as i16
/// - bits 32-39: depth + 1
/// - bits 40-41: bound
/// - bit  42:    was a PV node
/// - bits 43-47: generation (mod 32)
fn pack(mv: Move, score: i32, depth: i32, bound: Bound, is_pv: bool, generation: u8) -> u64 {
    debug_assert!((i16::MIN as i32..=i16::MAX as i32).contains(&score));
    let depth_bits = (depth - DEPTH_OFFSET).clamp(0, 255) as u64;
    (mv.as_u16() as u64)
        | (((score as i16 as u16) as u64) << 16)
        | (depth_bits << 32)
        | (bound.to_bits() << 40)
        | ((is_pv as u64) << 42)
        | (((generation & 31) as u64) << 43)
}

fn unpack(data: u64) -> TTEntry {
    TTEntry {
        mv: Move::from_u16((data & 0xFFFF) as u16),
        score: ((data >> 16) & 0xFFFF) as u16 as i16 as i32,
        depth: ((data >> 32) & 0xFF) as i32 + DEPTH_OFFSET,
        bound: Bound::from_bits(data >> 40),
        is_pv: (data >> 42) & 1 != 0,
    }
}

fn generation_of(data: u64) -> u8 {
    ((data >> 43) & 31) as u8
}

#[derive(Default)]
struct TTSlot {
    /// key ^ data, for torn-write detection
    key_xor: AtomicU64,
    data: AtomicU64,
}

impl TTSlot {
    fn read(&self, key: u64) -> Option<u64> {
        let key_xor = self.key_xor.load(Ordering::Relaxed);
        let data = self.data.load(Ordering::Relaxed);
        if data != 0 && key_xor ^ data == key {
            Some(data)
        } else {
            None
        }
    }

    fn write(&self, key: u64, data: u64) {
        self.data.store(data, Ordering::Relaxed);
        self.key_xor.store(key ^ data, Ordering::Relaxed);
    }

    fn raw(&self) -> u64 {
        self.data.load(Ordering::Relaxed)
    }
}

/// Lock-free shared transposition table
pub struct TranspositionTable {
    slots: RwLock<Box<[TTSlot]>>,
    generation: AtomicU8,
}

impl TranspositionTable {
    /// Create a table of approximately `size_mb` megabytes
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        TranspositionTable {
            slots: RwLock::new(Self::allocate(size_mb)),
            generation: AtomicU8::new(0),
        }
    }

    fn allocate(size_mb: usize) -> Box<[TTSlot]> {
        let slot_size = std::mem::size_of::<TTSlot>();
        let requested = (size_mb.max(1) * 1024 * 1024) / slot_size;
        // Power of two, rounding down so we never exceed the budget
        let count = if requested.is_power_of_two() {
            requested
        } else {
            requested.next_power_of_two() / 2
        }
        .max(1024);
        (0..count).map(|_| TTSlot::default()).collect()
    }

    /// Reallocate to a new size, dropping all entries. Must only be called
    /// while no search is probing the table.
    pub fn resize(&self, size_mb: usize) {
        *self.slots.write() = Self::allocate(size_mb);
    }

    /// Drop all entries, keeping the allocation. Must only be called while
    /// no search is probing the table.
    pub fn clear(&self) {
        let slots = self.slots.write();
        for slot in slots.iter() {
            slot.key_xor.store(0, Ordering::Relaxed);
            slot.data.store(0, Ordering::Relaxed);
        }
        self.generation.store(0, Ordering::Relaxed);
    }

    /// Advance the generation counter. Called once per `go`, so entries
    /// from earlier searches age out of the replacement policy.
    pub fn new_search(&self) {
        let gen = self.generation.load(Ordering::Relaxed);
        self.generation.store((gen + 1) & 31, Ordering::Relaxed);
    }

    fn current_generation(&self) -> u8 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Look up the entry for `key`, if one survives verification
    #[must_use]
    pub fn probe(&self, key: u64) -> Option<TTEntry> {
        let slots = self.slots.read();
        let idx = (key as usize) & (slots.len() - 1);
        slots[idx].read(key).map(unpack)
    }

    /// Store an entry for `key`.
    ///
    /// The slot is overwritten when the new data is an exact score, belongs
    /// to a different position, comes from an older search, or searches at
    /// least as deep (with a small bonus for PV nodes and slack for the
    /// incumbent). A null `mv` keeps the incumbent's move when the key
    /// matches, so a verified move is never thrown away by a moveless
    /// re-save.
    pub fn save(&self, key: u64, mv: Move, score: i32, depth: i32, bound: Bound, is_pv: bool) {
        let slots = self.slots.read();
        let idx = (key as usize) & (slots.len() - 1);
        let slot = &slots[idx];

        let incumbent = slot.read(key);
        let mv = match incumbent {
            Some(data) if mv.is_none() => unpack(data).mv,
            _ => mv,
        };

        let generation = self.current_generation();
        let should_write = match incumbent {
            None => true,
            Some(data) => {
                bound == Bound::Exact
                    || generation_of(data) != generation
                    || depth + 2 * i32::from(is_pv) > unpack(data).depth - 4
            }
        };
        if should_write {
            slot.write(key, pack(mv, score, depth, bound, is_pv, generation));
        }
    }

    /// Approximate table occupancy in per mille, as reported by
    /// `info hashfull`. Counts current-generation entries in a fixed
    /// sample of slots.
    #[must_use]
    pub fn hashfull(&self) -> u32 {
        let slots = self.slots.read();
        let generation = self.current_generation();
        let sample = slots.len().min(1000);
        let filled = slots
            .iter()
            .take(sample)
            .filter(|slot| {
                let data = slot.raw();
                data != 0 && generation_of(data) == generation
            })
            .count();
        (filled * 1000 / sample) as u32
    }

    /// Number of slots currently allocated
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::types::Square;

    fn test_move() -> Move {
        Move::new(Square::E1, Square::make(4, 3))
    }

    #[test]
    fn pack_unpack_roundtrip() {
        let mv = test_move();
        for (score, depth, bound, pv) in [
            (0, 0, Bound::Exact, false),
            (31_900, 42, Bound::Lower, true),
            (-31_900, -1, Bound::Upper, false),
            (123, 255 + DEPTH_OFFSET, Bound::Exact, true),
        ] {
            let entry = unpack(pack(mv, score, depth, bound, pv, 17));
            assert_eq!(entry.mv, mv);
            assert_eq!(entry.score, score);
            assert_eq!(entry.depth, depth);
            assert_eq!(entry.bound, bound);
            assert_eq!(entry.is_pv, pv);
        }
        assert_eq!(generation_of(pack(mv, 0, 0, Bound::Exact, false, 17)), 17);
    }

    #[test]
    fn store_then_probe() {
        let tt = TranspositionTable::new(1);
        let key = 0xDEAD_BEEF_0123_4567;
        tt.save(key, test_move(), 150, 8, Bound::Exact, true);
        let entry = tt.probe(key).expect("entry present");
        assert_eq!(entry.score, 150);
        assert_eq!(entry.depth, 8);
        assert_eq!(entry.mv, test_move());
        assert!(tt.probe(key ^ 1).is_none());
    }

    #[test]
    fn null_move_save_preserves_stored_move() {
        let tt = TranspositionTable::new(1);
        let key = 42;
        tt.save(key, test_move(), 10, 5, Bound::Exact, false);
        tt.save(key, Move::NONE, -20, 6, Bound::Upper, false);
        let entry = tt.probe(key).expect("entry present");
        assert_eq!(entry.mv, test_move());
        assert_eq!(entry.score, -20);
    }

    #[test]
    fn shallow_bound_does_not_evict_deep_entry() {
        let tt = TranspositionTable::new(1);
        let key = 42;
        tt.save(key, test_move(), 10, 20, Bound::Lower, false);
        tt.save(key, Move::NONE, 99, 2, Bound::Upper, false);
        let entry = tt.probe(key).expect("entry present");
        assert_eq!(entry.depth, 20);
        // An exact result always replaces
        tt.save(key, test_move(), 7, 2, Bound::Exact, false);
        assert_eq!(tt.probe(key).expect("entry present").depth, 2);
    }

    #[test]
    fn stale_generation_entries_are_replaced() {
        let tt = TranspositionTable::new(1);
        let key = 42;
        tt.save(key, test_move(), 10, 30, Bound::Lower, false);
        tt.new_search();
        tt.save(key, Move::NONE, 5, 1, Bound::Upper, false);
        assert_eq!(tt.probe(key).expect("entry present").depth, 1);
    }

    #[test]
    fn resize_and_clear_drop_entries() {
        let tt = TranspositionTable::new(1);
        tt.save(7, test_move(), 10, 5, Bound::Exact, false);
        tt.resize(2);
        assert!(tt.probe(7).is_none());
        assert!(tt.capacity().is_power_of_two());

        tt.save(7, test_move(), 10, 5, Bound::Exact, false);
        tt.clear();
        assert!(tt.probe(7).is_none());
        assert_eq!(tt.hashfull(), 0);
    }

    #[test]
    fn hashfull_counts_current_generation() {
        let tt = TranspositionTable::new(1);
        assert_eq!(tt.hashfull(), 0);
        for key in 0..512u64 {
            tt.save(key, Move::NONE, 0, 1, Bound::Exact, false);
        }
        assert!(tt.hashfull() > 0);
    }

    #[test]
    fn concurrent_store_probe_yields_no_corrupt_entries() {
        use std::sync::Arc;
        let tt = Arc::new(TranspositionTable::new(1));
        let mut handles = Vec::new();
        for t in 0..4u64 {
            let tt = Arc::clone(&tt);
            handles.push(std::thread::spawn(move || {
                for i in 0..20_000u64 {
                    let key = (i % 97) * 131 + t;
                    let score = (key % 1000) as i32;
                    tt.save(key, test_move(), score, 3, Bound::Exact, false);
                    if let Some(entry) = tt.probe(key) {
                        // A verified read must decode to the values some
                        // thread actually stored for this key
                        assert_eq!(entry.score, score);
                        assert_eq!(entry.depth, 3);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().expect("worker panicked");
        }
    }
}
