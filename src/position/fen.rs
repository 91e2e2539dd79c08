//! FEN parsing and serialization.

use super::error::FenError;
use super::types::castling;
use super::types::{Color, Piece, Square};
use super::Position;

impl Position {
    /// Parse a position from Forsyth-Edwards Notation. The halfmove clock
    /// and fullmove number are optional, defaulting to 0 and 1.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(FenError::TooFewFields {
                found: fields.len(),
            });
        }

        let mut pos = Position::empty();

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::BadBoardShape { ranks: ranks.len() });
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) || file + skip as u8 > 8 {
                        return Err(FenError::RankOverflow {
                            rank: rank as usize + 1,
                        });
                    }
                    file += skip as u8;
                } else {
                    let piece =
                        Piece::from_char(c).ok_or(FenError::InvalidPiece { char: c })?;
                    let color = if c.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    if file >= 8 {
                        return Err(FenError::RankOverflow {
                            rank: rank as usize + 1,
                        });
                    }
                    pos.put_piece(color, piece, Square::make(file, rank));
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::RankOverflow {
                    rank: rank as usize + 1,
                });
            }
        }

        for color in Color::BOTH {
            let kings = pos.pieces_of(color, Piece::King).popcount();
            if kings != 1 {
                return Err(FenError::BadKingCount {
                    color: match color {
                        Color::White => "White",
                        Color::Black => "Black",
                    },
                    count: kings,
                });
            }
        }

        let side = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(FenError::InvalidSideToMove {
                    found: other.to_string(),
                })
            }
        };
        pos.set_side_to_move(side);

        let mut rights = 0u8;
        if fields[2] != "-" {
            for c in fields[2].chars() {
                rights |= match c {
                    'K' => castling::WHITE_OO,
                    'Q' => castling::WHITE_OOO,
                    'k' => castling::BLACK_OO,
                    'q' => castling::BLACK_OOO,
                    _ => return Err(FenError::InvalidCastling { char: c }),
                };
            }
        }
        pos.st_mut().castling_rights = rights;

        if fields[3] != "-" {
            let ep: Square = fields[3].parse().map_err(|_| FenError::InvalidEnPassant {
                found: fields[3].to_string(),
            })?;
            let expected_rank = match side {
                Color::White => 5,
                Color::Black => 2,
            };
            if ep.rank() != expected_rank {
                return Err(FenError::InvalidEnPassant {
                    found: fields[3].to_string(),
                });
            }
            pos.st_mut().ep_square = Some(ep);
        }

        let halfmove = fields
            .get(4)
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0);
        let fullmove = fields
            .get(5)
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(1)
            .max(1);
        pos.st_mut().halfmove_clock = halfmove;
        pos.st_mut().plies_from_null = halfmove;
        pos.set_game_ply(2 * (fullmove - 1) + if side == Color::Black { 1 } else { 0 });

        pos.st_mut().key = pos.compute_key();
        pos.refresh_check_info();
        Ok(pos)
    }

    /// Serialize the current position to FEN
    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.piece_on(Square::make(file, rank)) {
                    Some((color, piece)) => {
                        if empty > 0 {
                            fen.push(char::from_digit(empty, 10).unwrap_or('0'));
                            empty = 0;
                        }
                        fen.push(piece.to_fen_char(color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push(char::from_digit(empty, 10).unwrap_or('0'));
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move() {
            Color::White => 'w',
            Color::Black => 'b',
        });
        fen.push(' ');
        fen.push_str(&castling::to_fen(self.castling_rights()));
        fen.push(' ');
        match self.ep_square() {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }
        fen.push_str(&format!(
            " {} {}",
            self.halfmove_clock(),
            self.game_ply() / 2 + 1
        ));
        fen
    }
}

#[cfg(test)]
mod tests {
    use super::super::START_FEN;
    use super::*;

    #[test]
    fn startpos_roundtrip() {
        let pos = Position::from_fen(START_FEN).unwrap();
        assert_eq!(pos.to_fen(), START_FEN);
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.occupied().popcount(), 32);
        assert_eq!(pos.king_square(Color::White), Square::E1);
    }

    #[test]
    fn kiwipete_roundtrip() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.to_fen(), fen);
        assert_eq!(pos.castling_rights(), castling::ALL_CASTLING);
    }

    #[test]
    fn en_passant_field_parsed() {
        let fen = "rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 2";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.ep_square(), Some("e3".parse().unwrap()));
    }

    #[test]
    fn missing_clock_fields_default() {
        let pos = Position::from_fen("8/8/8/4k3/8/8/4K3/8 w - -").unwrap();
        assert_eq!(pos.halfmove_clock(), 0);
        assert_eq!(pos.game_ply(), 0);
    }

    #[test]
    fn rejects_malformed_fens() {
        assert!(matches!(
            Position::from_fen("8/8/8 w - -"),
            Err(FenError::BadBoardShape { .. })
        ));
        assert!(matches!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"),
            Err(FenError::InvalidSideToMove { .. })
        ));
        assert!(matches!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w XQkq - 0 1"),
            Err(FenError::InvalidCastling { .. })
        ));
        assert!(matches!(
            Position::from_fen("9/8/8/8/8/8/8/8 w - - 0 1"),
            Err(FenError::RankOverflow { .. })
        ));
        assert!(matches!(
            Position::from_fen("p0p5/8/8/4k3/8/8/4K3/8 w - - 0 1"),
            Err(FenError::RankOverflow { .. })
        ));
        assert!(matches!(
            Position::from_fen("8/8/8/4k3/8/8/8/8 w - - 0 1"),
            Err(FenError::BadKingCount { .. })
        ));
    }

    #[test]
    fn rejects_stacked_digit_ranks() {
        // Digit runs must never overflow or wrap the file counter, even
        // when their sum lands back on 8
        let stacked = format!("{}/8/8/4k3/8/8/4K3/8 w - - 0 1", "9".repeat(30));
        assert!(matches!(
            Position::from_fen(&stacked),
            Err(FenError::RankOverflow { .. })
        ));
        let wrapping = format!("{}/8/8/4k3/8/8/4K3/8 w - - 0 1", "8".repeat(33));
        assert!(matches!(
            Position::from_fen(&wrapping),
            Err(FenError::RankOverflow { .. })
        ));
    }

    #[test]
    fn scratch_key_matches_stored_key() {
        let pos = Position::startpos();
        assert_eq!(pos.key(), pos.compute_key());
    }
}
