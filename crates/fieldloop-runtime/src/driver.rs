//! [`LoopDriver`] – the fixed-period control loop.
//!
//! The driver owns the [`Logger`] and the loop timing and calls into a
//! [`LifecycleHooks`] implementation once per period.  Per cycle:
//!
//! 1. pick the phase: from the [`PhaseSource`], or from the replayed
//!    `DriverStation/Phase` entry when replaying;
//! 2. logger before-user (a replay that has run out ends the loop);
//! 3. record the phase under [`PHASE_KEY`];
//! 4. on a phase change: exit the old phase, enter the new one;
//! 5. phase-periodic hook, then the periodic hook;
//! 6. logger after-user;
//! 7. watchdog check, then sleep out the rest of the period when pacing.
//!
//! The loop ends when the shutdown flag is raised, the phase source runs
//! out, the replay log is exhausted, or a hook fails.  In every case the
//! exit hook of the current phase runs and the logger is ended.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use fieldloop_logging::Logger;
use fieldloop_types::{FieldError, LogValue, Phase};
use tracing::{info, warn};

use crate::lifecycle::LifecycleHooks;
use crate::watchdog::LoopWatchdog;

pub const DEFAULT_PERIOD: Duration = Duration::from_millis(20);

/// Log key holding the active phase label for every cycle.
pub const PHASE_KEY: &str = "DriverStation/Phase";

/// Supplies the phase for each cycle outside replay.
pub trait PhaseSource {
    /// The phase for the next cycle, or `None` to end the run.
    fn next_phase(&mut self) -> Option<Phase>;
}

/// Scripted phase schedule: each segment holds a phase for a fixed number of
/// cycles.
#[derive(Debug, Clone)]
pub struct MatchTimeline {
    segments: Vec<(Phase, u64)>,
    segment: usize,
    cycle_in_segment: u64,
}

impl MatchTimeline {
    pub fn new(segments: Vec<(Phase, u64)>) -> Self {
        Self {
            segments,
            segment: 0,
            cycle_in_segment: 0,
        }
    }

    /// disabled → autonomous → disabled → teleop, durations in seconds.
    pub fn standard(
        period: Duration,
        disabled_secs: f64,
        autonomous_secs: f64,
        teleop_secs: f64,
    ) -> Self {
        let cycles = |secs: f64| {
            if period.is_zero() {
                0
            } else {
                (secs / period.as_secs_f64()).round() as u64
            }
        };
        Self::new(vec![
            (Phase::Disabled, cycles(disabled_secs)),
            (Phase::Autonomous, cycles(autonomous_secs)),
            (Phase::Disabled, cycles(disabled_secs)),
            (Phase::Teleop, cycles(teleop_secs)),
        ])
    }

    /// Total cycles across every segment.
    pub fn total_cycles(&self) -> u64 {
        self.segments.iter().map(|(_, n)| n).sum()
    }
}

impl PhaseSource for MatchTimeline {
    fn next_phase(&mut self) -> Option<Phase> {
        loop {
            let (phase, length) = *self.segments.get(self.segment)?;
            if self.cycle_in_segment < length {
                self.cycle_in_segment += 1;
                return Some(phase);
            }
            self.segment += 1;
            self.cycle_in_segment = 0;
        }
    }
}

/// Why [`LoopDriver::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    PhaseSourceExhausted,
    ReplayExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub overruns: u64,
    pub reason: StopReason,
}

pub struct LoopDriver {
    logger: Logger,
    period: Duration,
    use_timing: bool,
    watchdog: LoopWatchdog,
    shutdown: Arc<AtomicBool>,
    current: Option<Phase>,
    cycles: u64,
}

impl LoopDriver {
    /// `logger` must already be started.
    pub fn new(logger: Logger, period: Duration, use_timing: bool) -> Self {
        Self {
            logger,
            period,
            use_timing,
            watchdog: LoopWatchdog::new(period),
            shutdown: Arc::new(AtomicBool::new(false)),
            current: None,
            cycles: 0,
        }
    }

    /// Flag that ends the loop after the cycle in progress.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn current_phase(&self) -> Option<Phase> {
        self.current
    }

    /// Run one cycle.  Returns the reason to stop, if the cycle could not be
    /// run.
    pub fn step(
        &mut self,
        hooks: &mut dyn LifecycleHooks,
        source: &mut dyn PhaseSource,
    ) -> Result<Option<StopReason>, FieldError> {
        self.watchdog.start_cycle();

        let live_phase = if self.logger.is_replay() {
            None
        } else {
            match source.next_phase() {
                Some(phase) => Some(phase),
                None => return Ok(Some(StopReason::PhaseSourceExhausted)),
            }
        };

        if !self.logger.periodic_before_user()? {
            return Ok(Some(StopReason::ReplayExhausted));
        }
        let phase = live_phase.unwrap_or_else(|| self.replayed_phase());
        self.logger.record_output(PHASE_KEY, phase.label());
        self.watchdog.add_epoch("logger_before");

        if self.current != Some(phase) {
            info!(from = ?self.current, to = %phase, "phase change");
            if let Some(old) = self.current.take() {
                hooks.on_phase_exit(old)?;
            }
            hooks.on_phase_enter(phase)?;
            self.current = Some(phase);
        }
        hooks.on_phase_periodic(phase)?;
        hooks.on_periodic()?;
        self.watchdog.add_epoch("hooks");

        self.logger.periodic_after_user()?;
        self.watchdog.add_epoch("logger_after");
        self.watchdog.finish_cycle();
        self.cycles += 1;
        Ok(None)
    }

    /// Run cycles until a stop condition, then [`finish`][Self::finish].
    ///
    /// On a failing cycle the exit hook and logger shutdown are still
    /// attempted; the cycle's error is the one returned.
    pub fn run(
        &mut self,
        hooks: &mut dyn LifecycleHooks,
        source: &mut dyn PhaseSource,
    ) -> Result<RunSummary, FieldError> {
        info!(
            period_ms = self.period.as_millis() as u64,
            use_timing = self.use_timing,
            "control loop started"
        );
        let reason = loop {
            if self.shutdown.load(Ordering::SeqCst) {
                break StopReason::Shutdown;
            }
            let cycle_start = Instant::now();
            match self.step(hooks, source) {
                Ok(Some(reason)) => break reason,
                Ok(None) => {}
                Err(e) => {
                    if let Err(finish_err) = self.finish(hooks) {
                        warn!(error = %finish_err, "shutdown after failure also failed");
                    }
                    return Err(e);
                }
            }
            if self.use_timing
                && let Some(rest) = self.period.checked_sub(cycle_start.elapsed())
            {
                thread::sleep(rest);
            }
        };

        self.finish(hooks)?;
        let summary = RunSummary {
            cycles: self.cycles,
            overruns: self.watchdog.overrun_count(),
            reason,
        };
        info!(
            cycles = summary.cycles,
            overruns = summary.overruns,
            reason = ?summary.reason,
            "control loop stopped"
        );
        Ok(summary)
    }

    /// Run the current phase's exit hook and end the logger.  The logger is
    /// ended even when the exit hook fails.
    pub fn finish(&mut self, hooks: &mut dyn LifecycleHooks) -> Result<(), FieldError> {
        let exited = match self.current.take() {
            Some(phase) => hooks.on_phase_exit(phase),
            None => Ok(()),
        };
        let ended = self.logger.end();
        exited.and(ended)
    }

    fn replayed_phase(&self) -> Phase {
        match self.logger.replayed(PHASE_KEY) {
            Some(LogValue::Text(label)) => Phase::from_label(label).unwrap_or(Phase::Disabled),
            _ => Phase::Disabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl LifecycleHooks for Recorder {
        fn on_periodic(&mut self) -> Result<(), FieldError> {
            self.events.push("periodic".into());
            Ok(())
        }

        fn on_phase_enter(&mut self, phase: Phase) -> Result<(), FieldError> {
            self.events.push(format!("enter:{phase}"));
            Ok(())
        }

        fn on_phase_exit(&mut self, phase: Phase) -> Result<(), FieldError> {
            self.events.push(format!("exit:{phase}"));
            Ok(())
        }
    }

    fn started_logger() -> Logger {
        let mut logger = Logger::new();
        logger.start().unwrap();
        logger
    }

    #[test]
    fn timeline_walks_segments_and_skips_empty_ones() {
        let mut t = MatchTimeline::new(vec![
            (Phase::Disabled, 1),
            (Phase::Autonomous, 0),
            (Phase::Teleop, 2),
        ]);
        assert_eq!(t.total_cycles(), 3);
        assert_eq!(t.next_phase(), Some(Phase::Disabled));
        assert_eq!(t.next_phase(), Some(Phase::Teleop));
        assert_eq!(t.next_phase(), Some(Phase::Teleop));
        assert_eq!(t.next_phase(), None);
    }

    #[test]
    fn standard_timeline_converts_seconds_to_cycles() {
        let t = MatchTimeline::standard(Duration::from_millis(20), 0.1, 0.2, 0.4);
        assert_eq!(t.total_cycles(), 5 + 10 + 5 + 20);
    }

    #[test]
    fn phase_changes_fire_exit_then_enter() {
        let mut driver = LoopDriver::new(started_logger(), Duration::from_millis(1), false);
        let mut hooks = Recorder::default();
        let mut source = MatchTimeline::new(vec![(Phase::Disabled, 1), (Phase::Autonomous, 1)]);

        let summary = driver.run(&mut hooks, &mut source).unwrap();
        assert_eq!(summary.cycles, 2);
        assert_eq!(summary.reason, StopReason::PhaseSourceExhausted);
        assert_eq!(
            hooks.events,
            vec![
                "enter:Disabled",
                "periodic",
                "exit:Disabled",
                "enter:Autonomous",
                "periodic",
                "exit:Autonomous",
            ]
        );
        assert!(!driver.logger().is_running());
    }

    #[test]
    fn raised_shutdown_flag_stops_before_first_cycle() {
        let mut driver = LoopDriver::new(started_logger(), DEFAULT_PERIOD, true);
        driver.shutdown_flag().store(true, Ordering::SeqCst);
        let mut hooks = Recorder::default();
        let mut source = MatchTimeline::new(vec![(Phase::Teleop, 100)]);
        let summary = driver.run(&mut hooks, &mut source).unwrap();
        assert_eq!(summary.reason, StopReason::Shutdown);
        assert_eq!(summary.cycles, 0);
        assert!(hooks.events.is_empty());
    }

    #[test]
    fn hook_failure_still_ends_logger() {
        struct Failing;
        impl LifecycleHooks for Failing {
            fn on_periodic(&mut self) -> Result<(), FieldError> {
                Err(FieldError::HardwareFault {
                    component: "left_drive".into(),
                    details: "brownout".into(),
                })
            }
            fn on_phase_enter(&mut self, _: Phase) -> Result<(), FieldError> {
                Ok(())
            }
        }

        let mut driver = LoopDriver::new(started_logger(), DEFAULT_PERIOD, false);
        let mut source = MatchTimeline::new(vec![(Phase::Teleop, 5)]);
        let err = driver.run(&mut Failing, &mut source).unwrap_err();
        assert!(matches!(err, FieldError::HardwareFault { .. }));
        assert!(!driver.logger().is_running());
    }

    #[test]
    fn failed_enter_leaves_no_phase_to_exit() {
        struct RefusesAutonomous(Recorder);
        impl LifecycleHooks for RefusesAutonomous {
            fn on_periodic(&mut self) -> Result<(), FieldError> {
                self.0.on_periodic()
            }
            fn on_phase_enter(&mut self, phase: Phase) -> Result<(), FieldError> {
                if phase == Phase::Autonomous {
                    return Err(FieldError::Command {
                        name: "drive_forward".into(),
                        details: "refused".into(),
                    });
                }
                self.0.on_phase_enter(phase)
            }
            fn on_phase_exit(&mut self, phase: Phase) -> Result<(), FieldError> {
                self.0.on_phase_exit(phase)
            }
        }

        let mut driver = LoopDriver::new(started_logger(), Duration::from_millis(1), false);
        let mut hooks = RefusesAutonomous(Recorder::default());
        let mut source = MatchTimeline::new(vec![(Phase::Disabled, 1), (Phase::Autonomous, 1)]);

        let err = driver.run(&mut hooks, &mut source).unwrap_err();
        assert!(matches!(err, FieldError::Command { .. }));
        assert_eq!(
            hooks.0.events,
            vec!["enter:Disabled", "periodic", "exit:Disabled"]
        );
        assert_eq!(driver.current_phase(), None);
        assert!(!driver.logger().is_running());
    }

    #[test]
    fn paced_loop_takes_at_least_one_period_per_cycle() {
        let period = Duration::from_millis(10);
        let mut driver = LoopDriver::new(started_logger(), period, true);
        let mut hooks = Recorder::default();
        let mut source = MatchTimeline::new(vec![(Phase::Disabled, 3)]);
        let start = Instant::now();
        driver.run(&mut hooks, &mut source).unwrap();
        assert!(start.elapsed() >= period * 3);
    }
}
