//! `fieldloop` – robot control loop binary
//!
//! 1. Loads `fieldloop.toml` (see [`config`]) and resolves the runtime mode
//!    from the hardware marker file.
//! 2. Boots the robot lifecycle: logging sinks for the mode, the drivetrain
//!    telemetry adapter, and the demo container.
//! 3. Serves live telemetry over WebSocket on a background Tokio runtime
//!    (not in replay).
//! 4. Runs the control loop over a scripted match timeline until it ends,
//!    the replay log runs out, or **Ctrl-C** is pressed.

mod config;
mod container;

use colored::Colorize;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::thread;
use tracing::{error, info, warn};

use fieldloop_command::CommandScheduler;
use fieldloop_hal::probe::DEFAULT_HARDWARE_MARKER;
use fieldloop_hal::{MarkerFileProbe, ModeResolver, SIM_MODE, robot_mode};
use fieldloop_logging::{Logger, NetworkPublisher, PublisherServer};
use fieldloop_runtime::{
    DefaultSinkFactory, LoopDriver, MatchTimeline, RobotLifecycle, RunSummary, init_tracing,
};
use fieldloop_types::{FieldError, Mode};

use crate::config::Config;
use crate::container::{DemoContainer, Drivetrain};

/// How long the drive-forward routine drives before stopping.
const DRIVE_FORWARD_SECS: f64 = 2.0;

fn main() {
    let _tracing = init_tracing("fieldloop");
    print_banner();

    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, path = %config::config_path().display(), "invalid configuration");
            std::process::exit(1);
        }
    };

    match run(&cfg) {
        Ok(summary) => {
            println!(
                "  {} {} cycles, {} overruns ({:?})",
                "✓".green().bold(),
                summary.cycles,
                summary.overruns,
                summary.reason
            );
        }
        Err(e) => {
            error!(error = %e, "robot stopped on a fatal error");
            std::process::exit(1);
        }
    }
}

fn run(cfg: &Config) -> Result<RunSummary, FieldError> {
    if cfg.period_ms == 0 {
        return Err(FieldError::Config("period_ms must be positive".to_string()));
    }
    let period = cfg.period();

    let mode = resolve_mode(&cfg.hardware_marker);
    println!("  Mode: {}", mode.to_string().bold());

    let publisher = NetworkPublisher::default();
    if mode != Mode::Replay {
        spawn_publisher_server(publisher.clone(), cfg.publisher_port);
    }

    let drivetrain = Drivetrain::simulated();
    let telemetry = drivetrain.telemetry();
    let drive_periods = (DRIVE_FORWARD_SECS / period.as_secs_f64()).round() as u32;
    let routine = cfg.autonomous;

    let mut logger = Logger::new();
    let mut factory = DefaultSinkFactory::new(&cfg.log_folder, publisher);
    let mut robot = RobotLifecycle::boot(
        mode,
        &mut logger,
        &mut factory,
        Box::new(telemetry),
        CommandScheduler::new(),
        move || Ok(DemoContainer::new(drivetrain, routine, drive_periods)),
    )?;
    if let Some(path) = &robot.boot_outcome().replay_log {
        println!("  Replaying {}", path.display().to_string().bold());
    }

    let mut driver = LoopDriver::new(logger, period, robot.uses_timing());
    let shutdown = driver.shutdown_flag();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping after this cycle …".yellow().bold());
        shutdown.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; the loop can only end on its own");
    }

    let mut timeline = MatchTimeline::standard(
        period,
        cfg.disabled_secs,
        cfg.autonomous_secs,
        cfg.teleop_secs,
    );
    info!(
        cycles = timeline.total_cycles(),
        period_ms = cfg.period_ms,
        "match timeline loaded"
    );
    driver.run(&mut robot, &mut timeline)
}

/// The process-wide mode for the default marker, otherwise a one-off
/// resolution against `marker`.
fn resolve_mode(marker: &Path) -> Mode {
    if marker == Path::new(DEFAULT_HARDWARE_MARKER) {
        robot_mode()
    } else {
        ModeResolver::new(SIM_MODE, MarkerFileProbe::new(marker)).resolve()
    }
}

/// Serve `publisher` over WebSocket from a dedicated Tokio runtime thread.
/// The control loop keeps running if the server cannot start.
fn spawn_publisher_server(publisher: NetworkPublisher, port: u16) {
    let spawned = thread::Builder::new()
        .name("telemetry-publisher".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    warn!(error = %e, "telemetry runtime failed to start");
                    return;
                }
            };
            if let Err(e) = runtime.block_on(PublisherServer::new(publisher).with_port(port).run()) {
                warn!(error = %e, port, "telemetry publisher stopped");
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "telemetry thread failed to spawn");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   ____  _       __    ____              "#.bold().cyan());
    println!("{}", r#"  / __/ (_)___  / /___/ / /  ___  ___  ___ "#.bold().cyan());
    println!("{}", r#" / _/  / // -_)/ // _  / /__/ _ \/ _ \/ _ \"#.bold().cyan());
    println!("{}", r#"/_/   /_/ \__//_/ \_,_/____/\___/\___/ .__/"#.bold().cyan());
    println!("{}", r#"                                    /_/   "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "fieldloop".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Fixed-period robot control loop");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_marker_uses_process_wide_mode() {
        assert_eq!(resolve_mode(Path::new(DEFAULT_HARDWARE_MARKER)), robot_mode());
    }

    #[test]
    fn custom_marker_is_checked_directly() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let marker = dir.path().join("robot");
        assert_eq!(resolve_mode(&marker), SIM_MODE);

        std::fs::write(&marker, "").unwrap();
        assert_eq!(resolve_mode(&marker), Mode::Live);
    }
}
