//! The search proper: iterative deepening with aspiration windows around a
//! principal-variation search, and a capture-only quiescence resolver.
//!
//! Each `Search` is owned by exactly one thread. It shares only the
//! transposition table, the stop flag, and a node counter with its
//! siblings; the position and all per-ply buffers are thread-local.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::position::types::{Move, Piece, MAX_PLY};
use crate::position::Position;
use crate::search::movepick::MovePicker;
use crate::search::time::TimeManager;
use crate::search::{
    mate_in, mated_in, value_from_tt, value_to_tt, RootMove, SearchLimits, Value, DRAW, INFINITE,
    KNOWN_WIN, MATE,
};
use crate::tt::{Bound, TranspositionTable};

/// Initial half-width of the root aspiration window, in centipawns
const ASPIRATION_DELTA: Value = 18;

/// Poll the clock and node budget once per this many nodes
const LIMIT_CHECK_INTERVAL: u64 = 2048;

/// Per-thread search state
pub struct Search {
    pub position: Position,
    tt: Arc<TranspositionTable>,
    stop: Arc<AtomicBool>,
    total_nodes: Arc<AtomicU64>,
    limits: SearchLimits,
    time: TimeManager,
    /// Only the master thread reports and enforces the clock
    is_master: bool,

    pub root_moves: Vec<RootMove>,
    pub nodes: u64,
    flushed_nodes: u64,
    pub seldepth: usize,
    pub completed_depth: i32,
}

impl Search {
    #[must_use]
    pub fn new(
        position: Position,
        tt: Arc<TranspositionTable>,
        stop: Arc<AtomicBool>,
        total_nodes: Arc<AtomicU64>,
        limits: SearchLimits,
        is_master: bool,
    ) -> Self {
        let time = TimeManager::new(&limits, position.side_to_move());
        Search {
            position,
            tt,
            stop,
            total_nodes,
            limits,
            time,
            is_master,
            root_moves: Vec::new(),
            nodes: 0,
            flushed_nodes: 0,
            seldepth: 0,
            completed_depth: 0,
        }
    }

    /// A self-contained search over `position`, for tests and perft-style
    /// callers that don't go through the thread pool.
    #[must_use]
    pub fn standalone(position: Position, limits: SearchLimits, tt_mb: usize) -> Self {
        Search::new(
            position,
            Arc::new(TranspositionTable::new(tt_mb)),
            Arc::new(AtomicBool::new(false)),
            Arc::new(AtomicU64::new(0)),
            limits,
            true,
        )
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Flush the node counter and poll the node and clock budgets.
    /// Returns true once the search must unwind.
    fn check_limits(&mut self) -> bool {
        if self.nodes.wrapping_sub(self.flushed_nodes) >= LIMIT_CHECK_INTERVAL {
            let delta = self.nodes - self.flushed_nodes;
            self.flushed_nodes = self.nodes;
            let total = self.total_nodes.fetch_add(delta, Ordering::Relaxed) + delta;

            if let Some(budget) = self.limits.nodes {
                if total >= budget {
                    self.stop.store(true, Ordering::Relaxed);
                }
            }
            if self.is_master && self.time.past_maximum() {
                self.stop.store(true, Ordering::Relaxed);
            }
        }
        self.stopped()
    }

    /// Run iterative deepening to completion. Returns the best move and,
    /// when the principal variation extends past it, the expected reply.
    pub fn run(&mut self) -> (Move, Option<Move>) {
        self.init_root_moves();
        if self.root_moves.is_empty() {
            // Mated or stalemated root: the protocol still expects an answer
            return (Move::NONE, None);
        }

        let max_depth = self
            .limits
            .depth
            .unwrap_or(MAX_PLY as i32 - 1)
            .clamp(1, MAX_PLY as i32 - 1);

        for depth in 1..=max_depth {
            for rm in &mut self.root_moves {
                rm.previous_score = rm.score;
            }
            if !self.deepen(depth) {
                break;
            }

            self.completed_depth = depth;
            self.refresh_pv(depth);
            if self.is_master {
                self.report_depth(depth);
            }

            if self.mate_limit_satisfied() {
                break;
            }
            if self.time.past_optimum() {
                break;
            }
        }

        let best = self.root_moves[0].mv;
        let ponder = self.root_moves[0].pv.get(1).copied();
        (best, ponder)
    }

    fn init_root_moves(&mut self) {
        use crate::position::movegen::{generate, GenType};
        use crate::position::types::MoveList;

        let mut list = MoveList::new();
        generate(&self.position, &mut list, GenType::Legal);
        self.root_moves = list
            .iter()
            .filter(|m| self.limits.searchmoves.is_empty() || self.limits.searchmoves.contains(m))
            .map(|&m| RootMove::new(m))
            .collect();
    }

    /// One full aspiration cycle at `depth`. Returns false once stopped.
    fn deepen(&mut self, depth: i32) -> bool {
        let mut delta = ASPIRATION_DELTA;
        let prev = self.root_moves[0].previous_score;
        let (mut alpha, mut beta) = if depth >= 4 {
            ((prev - delta).max(-INFINITE), (prev + delta).min(INFINITE))
        } else {
            (-INFINITE, INFINITE)
        };

        loop {
            let value = self.search_root(alpha, beta, depth);
            if self.stopped() {
                return false;
            }
            self.root_moves
                .sort_by(|a, b| b.score.cmp(&a.score));

            if value <= alpha {
                alpha = (value - delta).max(-INFINITE);
            } else if value >= beta {
                beta = (value + delta).min(INFINITE);
            } else {
                return true;
            }
            delta += delta / 4;
            log::trace!(
                "aspiration re-search depth {depth} window ({alpha}, {beta})"
            );
        }
    }

    fn search_root(&mut self, mut alpha: Value, beta: Value, depth: i32) -> Value {
        let mut best_value = -INFINITE;

        for i in 0..self.root_moves.len() {
            let m = self.root_moves[i].mv;
            self.position.do_move(m);
            let value = if i == 0 {
                -self.node_search(-beta, -alpha, depth - 1, 1, true)
            } else {
                let v = -self.node_search(-alpha - 1, -alpha, depth - 1, 1, false);
                if v > alpha && v < beta {
                    -self.node_search(-beta, -alpha, depth - 1, 1, true)
                } else {
                    v
                }
            };
            self.position.undo_move(m);
            if self.stopped() {
                return DRAW;
            }

            if i == 0 || value > alpha {
                self.root_moves[i].score = value;
            } else {
                // Keep unresolved moves below every resolved one
                self.root_moves[i].score = -INFINITE;
            }

            best_value = best_value.max(value);
            if value > alpha {
                alpha = value;
                if alpha >= beta {
                    break;
                }
            }
        }
        best_value
    }

    fn node_search(
        &mut self,
        mut alpha: Value,
        mut beta: Value,
        mut depth: i32,
        ply: usize,
        is_pv: bool,
    ) -> Value {
        if depth <= 0 {
            return self.qsearch(alpha, beta, ply, is_pv);
        }

        self.nodes += 1;
        if self.check_limits() {
            return DRAW;
        }
        if self.position.is_draw() {
            return DRAW;
        }
        if ply >= MAX_PLY {
            return self.position.evaluate();
        }

        // Mate-distance pruning: no line from here can beat a mate we
        // already deliver, or be worse than one we already suffer
        alpha = alpha.max(mated_in(ply));
        beta = beta.min(mate_in(ply + 1));
        if alpha >= beta {
            return alpha;
        }

        let key = self.position.key();
        let entry = self.tt.probe(key);
        let tt_move = entry.map_or(Move::NONE, |e| e.mv);

        if !is_pv {
            if let Some(e) = entry {
                if e.depth >= depth {
                    let value = value_from_tt(e.score, ply);
                    match e.bound {
                        Bound::Exact => return value,
                        Bound::Lower if value >= beta => return value,
                        Bound::Upper if value <= alpha => return value,
                        _ => {}
                    }
                }
            }
        }

        let in_check = self.position.in_check();

        // Null move: hand the opponent a free tempo at reduced depth. If
        // they still can't reach beta the position is strong enough that
        // the real search can run shallower too.
        if !is_pv
            && !in_check
            && depth >= 3
            && self.position.st().plies_from_null > 0
            && self.has_non_pawn_material()
            && self.position.evaluate() >= beta
        {
            let reduction = depth / 4 + 3;
            self.position.do_null_move();
            let value = -self.node_search(-beta, -beta + 1, depth - reduction, ply + 1, false);
            self.position.undo_null_move();
            if self.stopped() {
                return DRAW;
            }
            if value >= beta {
                depth -= 4;
                if depth <= 0 {
                    return self.qsearch(alpha, beta, ply, is_pv);
                }
            }
        }

        let mut picker = MovePicker::new(&self.position, tt_move);
        let mut best_value = -INFINITE;
        let mut best_move = Move::NONE;
        let mut move_count = 0u32;

        while let Some(m) = picker.next(&self.position) {
            if !self.position.is_legal(m) {
                continue;
            }
            move_count += 1;

            self.position.do_move(m);
            let value = if move_count == 1 {
                -self.node_search(-beta, -alpha, depth - 1, ply + 1, is_pv)
            } else {
                let v = -self.node_search(-alpha - 1, -alpha, depth - 1, ply + 1, false);
                if is_pv && v > alpha && v < beta {
                    -self.node_search(-beta, -alpha, depth - 1, ply + 1, true)
                } else {
                    v
                }
            };
            self.position.undo_move(m);
            if self.stopped() {
                return DRAW;
            }

            if value > best_value {
                best_value = value;
                if value > alpha {
                    best_move = m;
                    if value >= beta {
                        break;
                    }
                    alpha = value;
                    // Narrow the remaining depth while the PV window keeps
                    // tightening away from decided-game scores
                    if is_pv && depth > 2 && alpha.abs() < KNOWN_WIN && beta.abs() < KNOWN_WIN {
                        depth -= 1;
                    }
                }
            }
        }

        if move_count == 0 {
            return if in_check { mated_in(ply) } else { DRAW };
        }

        let bound = if best_value >= beta {
            Bound::Lower
        } else if is_pv && !best_move.is_none() {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tt
            .save(key, best_move, value_to_tt(best_value, ply), depth, bound, is_pv);
        best_value
    }

    fn qsearch(&mut self, mut alpha: Value, beta: Value, ply: usize, is_pv: bool) -> Value {
        self.nodes += 1;
        if self.check_limits() {
            return DRAW;
        }
        self.seldepth = self.seldepth.max(ply);
        if self.position.is_draw() {
            return DRAW;
        }
        if ply >= MAX_PLY {
            return self.position.evaluate();
        }

        let key = self.position.key();
        let entry = self.tt.probe(key);
        let tt_move = entry.map_or(Move::NONE, |e| e.mv);

        if !is_pv {
            if let Some(e) = entry {
                if e.depth >= 0 {
                    let value = value_from_tt(e.score, ply);
                    match e.bound {
                        Bound::Exact => return value,
                        Bound::Lower if value >= beta => return value,
                        Bound::Upper if value <= alpha => return value,
                        _ => {}
                    }
                }
            }
        }

        let in_check = self.position.in_check();
        let mut best_value = -INFINITE;

        if !in_check {
            // Stand pat: doing nothing is always an option outside check
            best_value = self.position.evaluate();
            if best_value >= beta {
                if entry.is_none() {
                    self.tt
                        .save(key, Move::NONE, value_to_tt(best_value, ply), 0, Bound::Lower, false);
                }
                return best_value;
            }
            alpha = alpha.max(best_value);
        }

        let mut picker = MovePicker::new_quiescence(&self.position, tt_move);
        let mut best_move = Move::NONE;
        let mut move_count = 0u32;

        while let Some(m) = picker.next(&self.position) {
            if !self.position.is_legal(m) {
                continue;
            }
            move_count += 1;

            // Prune captures that lose material outright, unless we are
            // desperate enough that any straw is worth grasping
            if !in_check && best_value > -KNOWN_WIN && !self.position.see_ge(m, 0) {
                continue;
            }

            self.position.do_move(m);
            let value = -self.qsearch(-beta, -alpha, ply + 1, is_pv);
            self.position.undo_move(m);
            if self.stopped() {
                return DRAW;
            }

            if value > best_value {
                best_value = value;
                if value > alpha {
                    best_move = m;
                    if value >= beta {
                        break;
                    }
                    alpha = value;
                }
            }
        }

        if in_check && move_count == 0 {
            return mated_in(ply);
        }

        let bound = if best_value >= beta {
            Bound::Lower
        } else if is_pv && !best_move.is_none() {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tt
            .save(key, best_move, value_to_tt(best_value, ply), 0, bound, is_pv);
        best_value
    }

    fn has_non_pawn_material(&self) -> bool {
        let us = self.position.side_to_move();
        (self.position.pieces_of_color(us)
            & !(self.position.pieces(Piece::Pawn) | self.position.pieces(Piece::King)))
        .any()
    }

    /// Rebuild the best root move's principal variation by walking the
    /// transposition table from the root.
    fn refresh_pv(&mut self, depth: i32) {
        let root_move = self.root_moves[0].mv;
        let mut pv = vec![root_move];
        self.position.do_move(root_move);

        while (pv.len() as i32) < depth && pv.len() < MAX_PLY {
            if self.position.is_draw() {
                break;
            }
            let next = match self.tt.probe(self.position.key()) {
                Some(e)
                    if !e.mv.is_none()
                        && self.position.is_pseudo_legal(e.mv)
                        && self.position.is_legal(e.mv) =>
                {
                    e.mv
                }
                _ => break,
            };
            pv.push(next);
            self.position.do_move(next);
        }

        for &m in pv.iter().rev() {
            self.position.undo_move(m);
        }
        self.root_moves[0].pv = pv;
    }

    fn mate_limit_satisfied(&self) -> bool {
        match self.limits.mate {
            Some(n) if n > 0 => self.root_moves[0].score >= MATE - 2 * n,
            _ => false,
        }
    }

    fn report_depth(&self, depth: i32) {
        let best = &self.root_moves[0];
        let elapsed = self.time.elapsed();
        let ms = elapsed.as_millis().max(1) as u64;
        let nodes = self.total_nodes.load(Ordering::Relaxed) + (self.nodes - self.flushed_nodes);
        let pv: Vec<String> = best.pv.iter().map(|&m| crate::uci::move_to_uci(m)).collect();
        println!(
            "info depth {} seldepth {} score {} nodes {} nps {} hashfull {} time {} pv {}",
            depth,
            self.seldepth.max(depth as usize),
            crate::uci::format_score(best.score),
            nodes,
            nodes * 1000 / ms,
            self.tt.hashfull(),
            ms,
            pv.join(" ")
        );
    }
}
