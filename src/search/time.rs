//! Time budgeting for a single search.
//!
//! Two budgets are derived from the clock: `optimum`, after which iterative
//! deepening stops once the current depth completes, and `maximum`, a hard
//! ceiling that sets the stop flag mid-search. An untimed search (`infinite`,
//! fixed depth, fixed nodes) carries no budgets and never expires.

use std::time::{Duration, Instant};

use crate::position::types::Color;
use crate::search::SearchLimits;

/// Reserve for protocol latency so we never flag on the wire
const MOVE_OVERHEAD_MS: u64 = 10;

/// Assumed game horizon when the clock gives no `movestogo`
const DEFAULT_HORIZON: u64 = 40;

pub struct TimeManager {
    start: Instant,
    optimum: Option<Duration>,
    maximum: Option<Duration>,
}

impl TimeManager {
    /// Derive budgets for the side to move from the `go` limits
    #[must_use]
    pub fn new(limits: &SearchLimits, us: Color) -> Self {
        let budgets = if !limits.use_time_management(us) {
            None
        } else if let Some(movetime) = limits.movetime {
            // Explicit movetime is both budgets, shaved by the overhead
            let budget = Duration::from_millis(movetime.saturating_sub(MOVE_OVERHEAD_MS).max(1));
            Some((budget, budget))
        } else {
            let remaining = limits.time_for(us).unwrap_or(0);
            let increment = limits.increment_for(us);
            let horizon = limits.movestogo.unwrap_or(DEFAULT_HORIZON).clamp(1, 50);

            // Time we expect to have for the rest of the horizon
            let slack = remaining.saturating_sub(MOVE_OVERHEAD_MS);
            let estimated = slack.saturating_add(increment.saturating_mul(horizon - 1));

            let optimum = (estimated / (horizon * 2)).max(1);
            let maximum = (estimated / 10).min(slack * 8 / 10).max(optimum).max(1);
            Some((
                Duration::from_millis(optimum),
                Duration::from_millis(maximum),
            ))
        };

        TimeManager {
            start: Instant::now(),
            optimum: budgets.map(|(o, _)| o),
            maximum: budgets.map(|(_, m)| m),
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Hard ceiling breached: the search must stop now
    #[must_use]
    pub fn past_maximum(&self) -> bool {
        self.maximum.is_some_and(|m| self.start.elapsed() >= m)
    }

    /// Soft target breached: stop deepening after the current depth
    #[must_use]
    pub fn past_optimum(&self) -> bool {
        self.optimum.is_some_and(|o| self.start.elapsed() >= o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untimed_never_expires() {
        let tm = TimeManager::new(&SearchLimits::default(), Color::White);
        assert!(tm.maximum.is_none());
        assert!(!tm.past_optimum());
        assert!(!tm.past_maximum());
    }

    #[test]
    fn infinite_ignores_clock_fields() {
        let limits = SearchLimits {
            wtime: Some(60_000),
            infinite: true,
            ..SearchLimits::default()
        };
        let tm = TimeManager::new(&limits, Color::White);
        assert!(tm.maximum.is_none());
        assert!(!tm.past_maximum());
    }

    #[test]
    fn movetime_is_the_budget() {
        let limits = SearchLimits {
            movetime: Some(500),
            ..SearchLimits::default()
        };
        let tm = TimeManager::new(&limits, Color::Black);
        assert_eq!(tm.optimum, tm.maximum);
        assert!(tm.maximum.unwrap() <= Duration::from_millis(500));
    }

    #[test]
    fn clock_budgets_are_ordered_and_bounded() {
        let limits = SearchLimits {
            wtime: Some(60_000),
            winc: Some(1_000),
            ..SearchLimits::default()
        };
        let tm = TimeManager::new(&limits, Color::White);
        let optimum = tm.optimum.unwrap();
        let maximum = tm.maximum.unwrap();
        assert!(optimum <= maximum);
        assert!(maximum < Duration::from_millis(60_000));
    }

    #[test]
    fn movestogo_widens_per_move_share() {
        let base = SearchLimits {
            wtime: Some(60_000),
            ..SearchLimits::default()
        };
        let hurried = SearchLimits {
            movestogo: Some(2),
            ..base.clone()
        };
        let relaxed = TimeManager::new(&base, Color::White);
        let pressed = TimeManager::new(&hurried, Color::White);
        assert!(pressed.optimum.unwrap() > relaxed.optimum.unwrap());
    }
}
