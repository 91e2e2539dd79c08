//! Core value types: squares, pieces, bitboards, moves, castling rights.

pub mod bitboard;
pub mod castling;
pub mod moves;
pub mod piece;
pub mod square;

pub use bitboard::Bitboard;
pub use moves::{Move, MoveKind, MoveList, ScoredMove, ScoredMoveList, MAX_PLY};
pub use piece::{Color, Piece};
pub use square::Square;
