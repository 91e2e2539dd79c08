//! UCI protocol front end.
//!
//! Reads commands line by line from stdin, keeps the current position, and
//! drives the thread pool. Search output (`info`, `bestmove`) is printed by
//! the master search thread; everything here answers synchronously.

use std::io::{self, BufRead};
use std::sync::Arc;

use crate::position::error::MoveParseError;
use crate::position::movegen::{generate, GenType};
use crate::position::perft;
use crate::position::types::{Move, MoveList, Piece, Square};
use crate::position::Position;
use crate::search::{SearchLimits, ThreadPool, Value, MATE, MATE_IN_MAX_PLY};
use crate::tt::TranspositionTable;

const ENGINE_NAME: &str = concat!("pawnstorm ", env!("CARGO_PKG_VERSION"));
const DEFAULT_HASH_MB: usize = 16;
const MAX_HASH_MB: usize = 4096;
const MAX_THREADS: usize = 64;

/// Render a move in UCI long algebraic notation. Castling is encoded
/// internally as king-takes-rook but rendered as the king's two-square
/// hop, which is what GUIs expect.
#[must_use]
pub fn move_to_uci(m: Move) -> String {
    if m.is_none() {
        return "0000".to_string();
    }
    let to = if m.is_castling() {
        let kingside = m.to().file() > m.from().file();
        Square::make(if kingside { 6 } else { 2 }, m.from().rank())
    } else {
        m.to()
    };
    let mut s = format!("{}{}", m.from(), to);
    if m.is_promotion() {
        s.push(match m.promotion_piece() {
            Piece::Queen => 'q',
            Piece::Rook => 'r',
            Piece::Bishop => 'b',
            _ => 'n',
        });
    }
    s
}

/// Parse a UCI move string against the legal moves of `pos`. Castling is
/// accepted in both the standard king-hop form (`e1g1`) and the
/// king-takes-rook form (`e1h1`).
pub fn parse_uci_move(pos: &Position, s: &str) -> Result<Move, MoveParseError> {
    if !(4..=5).contains(&s.len()) {
        return Err(MoveParseError::InvalidLength { len: s.len() });
    }
    for half in [&s[0..2], &s[2..4]] {
        if half.parse::<Square>().is_err() {
            return Err(MoveParseError::InvalidSquare {
                notation: s.to_string(),
            });
        }
    }
    if let Some(c) = s.chars().nth(4) {
        if !matches!(c, 'n' | 'b' | 'r' | 'q') {
            return Err(MoveParseError::InvalidPromotion { char: c });
        }
    }

    let mut list = MoveList::new();
    generate(pos, &mut list, GenType::Legal);
    for &m in list.iter() {
        if move_to_uci(m) == s {
            return Ok(m);
        }
        if m.is_castling() && format!("{}{}", m.from(), m.to()) == s {
            return Ok(m);
        }
    }
    Err(MoveParseError::IllegalMove {
        notation: s.to_string(),
    })
}

/// Format a score for an `info` line: `cp N` for centipawns, `mate N`
/// (moves, not plies, negative when being mated) inside the mate band.
#[must_use]
pub fn format_score(value: Value) -> String {
    if value.abs() >= MATE_IN_MAX_PLY {
        let moves = (MATE - value.abs() + 1) / 2;
        if value > 0 {
            format!("mate {moves}")
        } else {
            format!("mate -{moves}")
        }
    } else {
        format!("cp {value}")
    }
}

/// Run the UCI loop until `quit` or end of input
pub fn run() {
    crate::position::attacks::init();
    let tt = Arc::new(TranspositionTable::new(DEFAULT_HASH_MB));
    let mut pool = ThreadPool::new(1, Arc::clone(&tt));
    let mut position = Position::startpos();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        if !handle_command(line.trim(), &mut position, &mut pool) {
            break;
        }
    }
    pool.stop();
    pool.wait_for_idle();
}

fn handle_command(line: &str, position: &mut Position, pool: &mut ThreadPool) -> bool {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(&command) = parts.first() else {
        return true;
    };

    match command {
        "uci" => {
            println!("id name {ENGINE_NAME}");
            println!("id author the pawnstorm developers");
            println!(
                "option name Hash type spin default {DEFAULT_HASH_MB} min 1 max {MAX_HASH_MB}"
            );
            println!("option name Threads type spin default 1 min 1 max {MAX_THREADS}");
            println!("uciok");
        }
        "isready" => {
            println!("readyok");
        }
        "setoption" => handle_setoption(&parts, pool),
        "ucinewgame" => {
            pool.wait_for_idle();
            pool.tt().clear();
            *position = Position::startpos();
        }
        "position" => handle_position(&parts, position),
        "go" => handle_go(&parts, position, pool),
        "stop" => pool.stop(),
        "quit" => return false,
        "d" => {
            print!("{position}");
            println!("fen: {}", position.to_fen());
            println!("key: {:016x}", position.key());
        }
        other => log::debug!("ignoring unknown command '{other}'"),
    }
    true
}

fn handle_setoption(parts: &[&str], pool: &mut ThreadPool) {
    let name_at = parts.iter().position(|&t| t == "name");
    let value_at = parts.iter().position(|&t| t == "value");
    let (Some(n), Some(v)) = (name_at, value_at) else {
        log::warn!("malformed setoption: {}", parts.join(" "));
        return;
    };
    let name = parts[n + 1..v].join(" ");
    let value = parts[v + 1..].join(" ");

    match name.as_str() {
        "Hash" => match value.parse::<usize>() {
            Ok(mb) if (1..=MAX_HASH_MB).contains(&mb) => {
                pool.wait_for_idle();
                pool.tt().resize(mb);
            }
            _ => log::warn!("bad Hash value '{value}'"),
        },
        "Threads" => match value.parse::<usize>() {
            Ok(count) if (1..=MAX_THREADS).contains(&count) => pool.set_threads(count),
            _ => log::warn!("bad Threads value '{value}'"),
        },
        _ => log::debug!("ignoring unknown option '{name}'"),
    }
}

fn handle_position(parts: &[&str], position: &mut Position) {
    let mut i = 1;
    match parts.get(i) {
        Some(&"startpos") => {
            *position = Position::startpos();
            i += 1;
        }
        Some(&"fen") => {
            i += 1;
            let end = parts[i..]
                .iter()
                .position(|&t| t == "moves")
                .map_or(parts.len(), |off| i + off);
            let fen = parts[i..end].join(" ");
            match Position::from_fen(&fen) {
                Ok(pos) => *position = pos,
                Err(err) => {
                    log::warn!("rejected position command: {err}");
                    return;
                }
            }
            i = end;
        }
        _ => return,
    }

    if parts.get(i) == Some(&"moves") {
        for token in &parts[i + 1..] {
            match parse_uci_move(position, token) {
                Ok(m) => position.do_move(m),
                Err(err) => {
                    log::warn!("rejected move '{token}': {err}");
                    return;
                }
            }
        }
        position.shrink_history();
    }
}

fn parse_go_limits(parts: &[&str], position: &Position) -> SearchLimits {
    let mut limits = SearchLimits::default();
    let mut i = 1;
    while i < parts.len() {
        let clock = |at: usize| -> Option<u64> {
            parts
                .get(at + 1)
                .and_then(|t| t.parse::<i64>().ok())
                .map(|v| v.max(0) as u64)
        };
        let token = parts[i];
        match token {
            "searchmoves" => {
                while let Some(token) = parts.get(i + 1) {
                    match parse_uci_move(position, token) {
                        Ok(m) => limits.searchmoves.push(m),
                        Err(_) => break,
                    }
                    i += 1;
                }
            }
            "wtime" => limits.wtime = clock(i),
            "btime" => limits.btime = clock(i),
            "winc" => limits.winc = clock(i),
            "binc" => limits.binc = clock(i),
            "movestogo" => limits.movestogo = clock(i),
            "movetime" => limits.movetime = clock(i),
            "nodes" => limits.nodes = clock(i),
            "depth" => limits.depth = clock(i).map(|v| v as i32),
            "mate" => limits.mate = clock(i).map(|v| v as i32),
            "perft" => limits.perft = clock(i).map(|v| v as i32),
            "infinite" => limits.infinite = true,
            _ => {}
        }
        // Value-carrying tokens consume their argument
        i += match token {
            "infinite" | "searchmoves" => 1,
            _ => 2,
        };
    }
    limits
}

fn handle_go(parts: &[&str], position: &mut Position, pool: &ThreadPool) {
    let limits = parse_go_limits(parts, position);

    if let Some(depth) = limits.perft {
        let (splits, total) = perft::divide(position, depth.max(1) as u32);
        for (m, count) in splits {
            println!("{}: {count}", move_to_uci(m));
        }
        println!();
        println!("Nodes searched: {total}");
        return;
    }

    pool.start_search(position, &limits);
}
