//! Persistent worker threads.
//!
//! One master plus N-1 helpers, all parked on condvar-guarded idle loops
//! between searches. Every thread runs the same iterative deepening over
//! its own copy of the root position; coordination happens only through
//! the shared transposition table and the stop flag. The master reports
//! the best move from its own root list, no cross-thread merging.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

use crate::position::Position;
use crate::search::node::Search;
use crate::search::SearchLimits;
use crate::tt::TranspositionTable;
use crate::uci::move_to_uci;

struct Job {
    position: Position,
    limits: SearchLimits,
}

#[derive(Default)]
struct ThreadState {
    job: Option<Job>,
    searching: bool,
    quit: bool,
}

/// Per-thread parking spot
struct ThreadControl {
    state: Mutex<ThreadState>,
    cv: Condvar,
}

impl ThreadControl {
    fn new() -> Self {
        ThreadControl {
            state: Mutex::new(ThreadState::default()),
            cv: Condvar::new(),
        }
    }

    fn post(&self, job: Job) {
        let mut state = self.state.lock();
        debug_assert!(!state.searching, "posting a job to a busy thread");
        state.job = Some(job);
        state.searching = true;
        self.cv.notify_one();
    }

    fn wait_while_searching(&self) {
        let mut state = self.state.lock();
        while state.searching {
            self.cv.wait(&mut state);
        }
    }

    fn shut_down(&self) {
        let mut state = self.state.lock();
        state.quit = true;
        self.cv.notify_one();
    }
}

/// Shared between the pool handle and every worker
struct PoolShared {
    tt: Arc<TranspositionTable>,
    stop: Arc<AtomicBool>,
    total_nodes: Arc<AtomicU64>,
}

pub struct ThreadPool {
    controls: Vec<Arc<ThreadControl>>,
    handles: Vec<JoinHandle<()>>,
    shared: Arc<PoolShared>,
}

impl ThreadPool {
    /// Spawn `threads` workers sharing `tt`. Thread 0 is the master.
    #[must_use]
    pub fn new(threads: usize, tt: Arc<TranspositionTable>) -> Self {
        let shared = Arc::new(PoolShared {
            tt,
            stop: Arc::new(AtomicBool::new(false)),
            total_nodes: Arc::new(AtomicU64::new(0)),
        });
        let mut pool = ThreadPool {
            controls: Vec::new(),
            handles: Vec::new(),
            shared,
        };
        pool.spawn_workers(threads.max(1));
        pool
    }

    fn spawn_workers(&mut self, threads: usize) {
        let controls: Vec<Arc<ThreadControl>> =
            (0..threads).map(|_| Arc::new(ThreadControl::new())).collect();
        for (id, control) in controls.iter().enumerate() {
            let shared = Arc::clone(&self.shared);
            let thread_control = Arc::clone(control);
            // The master holds the helpers' controls so it can wait them
            // out before reporting
            let helpers: Vec<Arc<ThreadControl>> =
                if id == 0 { controls[1..].to_vec() } else { Vec::new() };
            let handle = std::thread::Builder::new()
                .name(format!("search-{id}"))
                .stack_size(8 * 1024 * 1024)
                .spawn(move || worker_loop(&thread_control, &shared, id == 0, &helpers))
                .expect("failed to spawn search thread");
            self.handles.push(handle);
        }
        self.controls = controls;
    }

    /// Change the worker count. Blocks until the current search finishes.
    pub fn set_threads(&mut self, threads: usize) {
        self.wait_for_idle();
        self.shut_down_workers();
        self.spawn_workers(threads.max(1));
    }

    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.controls.len()
    }

    /// Kick off a search on every thread. The master prints the bestmove
    /// line when its own search completes and all helpers have parked.
    pub fn start_search(&self, position: &Position, limits: &SearchLimits) {
        self.wait_for_idle();
        self.shared.stop.store(false, Ordering::Relaxed);
        self.shared.total_nodes.store(0, Ordering::Relaxed);
        self.shared.tt.new_search();

        // Helpers first so the master never finishes into a silent pool
        for control in self.controls.iter().skip(1) {
            control.post(Job {
                position: position.clone(),
                limits: helper_limits(limits),
            });
        }
        self.controls[0].post(Job {
            position: position.clone(),
            limits: limits.clone(),
        });
    }

    /// Signal the running search to stop
    pub fn stop(&self) {
        self.shared.stop.store(true, Ordering::Relaxed);
    }

    /// Block until every thread is parked. TT resize/clear and thread-count
    /// changes require this.
    pub fn wait_for_idle(&self) {
        for control in &self.controls {
            control.wait_while_searching();
        }
    }

    #[must_use]
    pub fn tt(&self) -> &Arc<TranspositionTable> {
        &self.shared.tt
    }

    fn shut_down_workers(&mut self) {
        for control in &self.controls {
            control.shut_down();
        }
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        self.controls.clear();
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop();
        self.shut_down_workers();
    }
}

/// Helpers ignore the clock and budgets; the master's stop flag ends them
fn helper_limits(limits: &SearchLimits) -> SearchLimits {
    SearchLimits {
        searchmoves: limits.searchmoves.clone(),
        depth: limits.depth,
        infinite: true,
        ..SearchLimits::default()
    }
}

fn worker_loop(
    control: &ThreadControl,
    shared: &PoolShared,
    is_master: bool,
    helpers: &[Arc<ThreadControl>],
) {
    loop {
        let job = {
            let mut state = control.state.lock();
            loop {
                if state.quit {
                    return;
                }
                if let Some(job) = state.job.take() {
                    break job;
                }
                control.cv.wait(&mut state);
            }
        };

        run_job(job, shared, is_master, helpers);

        let mut state = control.state.lock();
        state.searching = false;
        control.cv.notify_all();
    }
}

fn run_job(job: Job, shared: &PoolShared, is_master: bool, helpers: &[Arc<ThreadControl>]) {
    let infinite = job.limits.infinite;
    let mut search = Search::new(
        job.position,
        Arc::clone(&shared.tt),
        Arc::clone(&shared.stop),
        Arc::clone(&shared.total_nodes),
        job.limits,
        is_master,
    );
    let (best, ponder) = search.run();

    if !is_master {
        return;
    }
    log::debug!(
        "master finished: depth {} nodes {}",
        search.completed_depth,
        search.nodes
    );

    // Under `go infinite` the protocol forbids a bestmove before `stop`
    while infinite && !shared.stop.load(Ordering::Relaxed) {
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    // Pull the helpers out of their deepening loops and wait for them to
    // park before reporting
    shared.stop.store(true, Ordering::Relaxed);
    for helper in helpers {
        helper.wait_while_searching();
    }

    if best.is_none() {
        println!("bestmove (none)");
    } else {
        match ponder {
            Some(p) => println!("bestmove {} ponder {}", move_to_uci(best), move_to_uci(p)),
            None => println!("bestmove {}", move_to_uci(best)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_pool(threads: usize) -> ThreadPool {
        ThreadPool::new(threads, Arc::new(TranspositionTable::new(1)))
    }

    #[test]
    fn pool_spawns_and_shuts_down() {
        let pool = small_pool(2);
        assert_eq!(pool.thread_count(), 2);
        drop(pool);
    }

    #[test]
    fn set_threads_resizes_the_pool() {
        let mut pool = small_pool(1);
        pool.set_threads(3);
        assert_eq!(pool.thread_count(), 3);
        pool.set_threads(1);
        assert_eq!(pool.thread_count(), 1);
    }

    #[test]
    fn search_completes_and_pool_goes_idle() {
        let pool = small_pool(2);
        let limits = SearchLimits {
            depth: Some(3),
            ..SearchLimits::default()
        };
        pool.start_search(&Position::startpos(), &limits);
        pool.wait_for_idle();
        // A second search on the now-idle pool must work too
        pool.start_search(&Position::startpos(), &limits);
        pool.wait_for_idle();
    }

    #[test]
    fn stop_cuts_an_infinite_search_short() {
        let pool = small_pool(1);
        let limits = SearchLimits {
            infinite: true,
            ..SearchLimits::default()
        };
        pool.start_search(&Position::startpos(), &limits);
        std::thread::sleep(std::time::Duration::from_millis(20));
        pool.stop();
        pool.wait_for_idle();
    }
}
