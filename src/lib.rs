pub mod position;
pub mod search;
pub mod tt;
pub mod uci;
pub mod zobrist;

pub use position::types::{Bitboard, Color, Move, Piece, Square};
pub use position::Position;
pub use search::{SearchLimits, ThreadPool};
pub use tt::TranspositionTable;
