//! Full-depth perft validation over the standard test suite.
//!
//! Shallower versions of these positions run in the unit test tree; the
//! depths here are the expensive ones that prove move generation, legality
//! filtering, and make/unmake against the published node counts.

use pawnstorm::position::perft::perft;
use pawnstorm::Position;

fn assert_perft(fen: &str, depth: u32, expected: u64) {
    let mut pos = Position::from_fen(fen).expect("valid fen");
    assert_eq!(perft(&mut pos, depth), expected, "{fen} at depth {depth}");
}

#[test]
fn startpos_shallow() {
    let mut pos = Position::startpos();
    let expected = [1, 20, 400, 8_902, 197_281];
    for (depth, &count) in expected.iter().enumerate() {
        assert_eq!(perft(&mut pos, depth as u32), count, "depth {depth}");
    }
}

#[test]
fn startpos_depth_five() {
    let mut pos = Position::startpos();
    assert_eq!(perft(&mut pos, 5), 4_865_609);
}

#[test]
#[ignore = "slow; run with --ignored"]
fn startpos_depth_six() {
    let mut pos = Position::startpos();
    assert_eq!(perft(&mut pos, 6), 119_060_324);
}

#[test]
fn kiwipete_depth_four() {
    assert_perft(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        4,
        4_085_603,
    );
}

#[test]
fn endgame_pins_depth_five() {
    assert_perft("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 5, 674_624);
}

#[test]
fn promotion_heavy_depth_four() {
    assert_perft(
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        4,
        422_333,
    );
}

#[test]
fn mirrored_tactical_depth_four() {
    assert_perft(
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        4,
        2_103_487,
    );
}

#[test]
fn buggy_engine_catcher_depth_four() {
    // Position designed to catch castling/ep/promotion interactions
    assert_perft(
        "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        4,
        3_894_594,
    );
}

#[test]
fn en_passant_discovered_check_depth_six() {
    assert_perft("8/8/8/8/k2Pp2Q/8/8/3K4 b - d3 0 1", 6, 1_440_467);
}
