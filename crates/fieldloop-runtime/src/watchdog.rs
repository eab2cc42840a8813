//! [`LoopWatchdog`] – per-cycle overrun detection.
//!
//! The loop driver opens a cycle with [`LoopWatchdog::start_cycle`], marks
//! named epochs as each stage completes, and closes it with
//! [`LoopWatchdog::finish_cycle`].  A cycle that took longer than the budget
//! is logged at `warn` with the per-epoch breakdown so the slow stage is
//! obvious in the console.

use std::time::{Duration, Instant};

use tracing::warn;

pub struct LoopWatchdog {
    budget: Duration,
    cycle_start: Option<Instant>,
    last_mark: Option<Instant>,
    epochs: Vec<(&'static str, Duration)>,
    overruns: u64,
}

impl LoopWatchdog {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            cycle_start: None,
            last_mark: None,
            epochs: Vec::new(),
            overruns: 0,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn start_cycle(&mut self) {
        let now = Instant::now();
        self.cycle_start = Some(now);
        self.last_mark = Some(now);
        self.epochs.clear();
    }

    /// Record the time spent since the previous mark under `name`.
    /// Ignored outside a cycle.
    pub fn add_epoch(&mut self, name: &'static str) {
        let Some(last) = self.last_mark else {
            return;
        };
        let now = Instant::now();
        self.epochs.push((name, now - last));
        self.last_mark = Some(now);
    }

    /// Epochs recorded in the current (or just finished) cycle.
    pub fn epochs(&self) -> &[(&'static str, Duration)] {
        &self.epochs
    }

    /// Close the cycle.  Returns `true` when it overran the budget.
    pub fn finish_cycle(&mut self) -> bool {
        let Some(start) = self.cycle_start.take() else {
            return false;
        };
        self.last_mark = None;
        let elapsed = start.elapsed();
        if elapsed <= self.budget {
            return false;
        }
        self.overruns += 1;
        let breakdown = self
            .epochs
            .iter()
            .map(|(name, d)| format!("{name}={:.3}ms", d.as_secs_f64() * 1e3))
            .collect::<Vec<_>>()
            .join(" ");
        warn!(
            elapsed_ms = elapsed.as_secs_f64() * 1e3,
            budget_ms = self.budget.as_secs_f64() * 1e3,
            %breakdown,
            "loop overrun"
        );
        true
    }

    pub fn overrun_count(&self) -> u64 {
        self.overruns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fast_cycle_is_not_an_overrun() {
        let mut wd = LoopWatchdog::new(Duration::from_secs(5));
        wd.start_cycle();
        wd.add_epoch("user");
        assert!(!wd.finish_cycle());
        assert_eq!(wd.overrun_count(), 0);
    }

    #[test]
    fn slow_cycle_is_counted() {
        let mut wd = LoopWatchdog::new(Duration::from_millis(5));
        wd.start_cycle();
        thread::sleep(Duration::from_millis(15));
        wd.add_epoch("scheduler");
        assert!(wd.finish_cycle());
        assert_eq!(wd.overrun_count(), 1);
        assert_eq!(wd.epochs().len(), 1);
        assert!(wd.epochs()[0].1 >= Duration::from_millis(15));
    }

    #[test]
    fn epochs_reset_each_cycle() {
        let mut wd = LoopWatchdog::new(Duration::from_secs(1));
        wd.start_cycle();
        wd.add_epoch("a");
        wd.add_epoch("b");
        wd.finish_cycle();
        wd.start_cycle();
        wd.add_epoch("c");
        let names: Vec<_> = wd.epochs().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["c"]);
    }

    #[test]
    fn finish_without_start_is_ignored() {
        let mut wd = LoopWatchdog::new(Duration::ZERO);
        wd.add_epoch("orphan");
        assert!(!wd.finish_cycle());
        assert!(wd.epochs().is_empty());
    }
}
