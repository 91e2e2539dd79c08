//! Perft fixtures for move generation correctness. Deeper runs live in the
//! integration suite; these depths keep the unit run fast.

use crate::position::perft::{divide, perft};
use crate::position::Position;

struct TestPosition {
    name: &'static str,
    fen: &'static str,
    depths: &'static [(u32, u64)],
}

const TEST_POSITIONS: &[TestPosition] = &[
    TestPosition {
        name: "Initial Position",
        fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        depths: &[(1, 20), (2, 400), (3, 8902), (4, 197_281)],
    },
    TestPosition {
        name: "Kiwipete",
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        depths: &[(1, 48), (2, 2039), (3, 97_862)],
    },
    TestPosition {
        name: "Position 3",
        fen: "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        depths: &[(1, 14), (2, 191), (3, 2812), (4, 43_238)],
    },
    TestPosition {
        name: "Position 4",
        fen: "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        depths: &[(1, 6), (2, 264), (3, 9467)],
    },
    TestPosition {
        name: "Position 5",
        fen: "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        depths: &[(1, 44), (2, 1486), (3, 62_379)],
    },
    TestPosition {
        name: "En Passant Capture",
        fen: "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
        depths: &[(1, 31), (2, 707), (3, 21_637)],
    },
    TestPosition {
        name: "Promotion",
        fen: "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1",
        depths: &[(1, 24), (2, 496), (3, 9483)],
    },
    TestPosition {
        name: "Castling",
        fen: "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1",
        depths: &[(1, 26), (2, 568), (3, 13_744)],
    },
];

#[test]
fn perft_fixture_positions() {
    for position in TEST_POSITIONS {
        let mut pos = Position::from_fen(position.fen).expect("fixture FEN parses");
        for &(depth, expected) in position.depths {
            let nodes = perft(&mut pos, depth);
            assert_eq!(
                nodes, expected,
                "perft mismatch for '{}' at depth {depth}",
                position.name
            );
        }
    }
}

#[test]
fn divide_sums_to_perft_total() {
    let mut pos = Position::startpos();
    let (entries, total) = divide(&mut pos, 3);
    assert_eq!(entries.len(), 20);
    assert_eq!(total, 8902);
    assert_eq!(entries.iter().map(|(_, n)| n).sum::<u64>(), total);
}

#[test]
fn perft_leaves_position_untouched() {
    let mut pos = Position::from_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .expect("fixture FEN parses");
    let fen = pos.to_fen();
    let key = pos.key();
    perft(&mut pos, 3);
    assert_eq!(pos.to_fen(), fen);
    assert_eq!(pos.key(), key);
}
