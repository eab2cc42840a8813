//! [`ModeResolver`] – one-shot classification of the execution environment.
//!
//! # Resolution rule
//!
//! | Probe | Resolved [`Mode`] |
//! |---|---|
//! | hardware present | [`Mode::Live`] |
//! | no hardware | the build-time preference ([`SIM_MODE`]) |
//!
//! The preference is [`Mode::Simulated`] unless the crate is built with the
//! `replay` feature, in which case it is [`Mode::Replay`].
//!
//! # Example
//!
//! ```rust
//! use fieldloop_hal::mode::ModeResolver;
//! use fieldloop_hal::probe::FixedProbe;
//! use fieldloop_types::Mode;
//!
//! let resolver = ModeResolver::new(Mode::Simulated, FixedProbe(false));
//! assert_eq!(resolver.resolve(), Mode::Simulated);
//! assert_eq!(resolver.resolve(), Mode::Simulated); // memoised
//! ```

use std::sync::OnceLock;

use fieldloop_types::Mode;
use tracing::info;

use crate::probe::{HardwareProbe, MarkerFileProbe};

/// Mode used when no hardware is detected.
#[cfg(not(feature = "replay"))]
pub const SIM_MODE: Mode = Mode::Simulated;

/// Mode used when no hardware is detected.
#[cfg(feature = "replay")]
pub const SIM_MODE: Mode = Mode::Replay;

/// Resolves the process [`Mode`] from a preference and a hardware probe.
///
/// The probe is queried at most once; every call to [`resolve`][Self::resolve]
/// after the first returns the memoised value.
pub struct ModeResolver<P> {
    preference: Mode,
    probe: P,
    resolved: OnceLock<Mode>,
}

impl<P: HardwareProbe> ModeResolver<P> {
    /// `preference` is the mode used when the probe finds no hardware.
    /// Passing [`Mode::Live`] is allowed but pointless: the process would
    /// claim to be live without hardware.
    pub fn new(preference: Mode, probe: P) -> Self {
        Self {
            preference,
            probe,
            resolved: OnceLock::new(),
        }
    }

    pub fn resolve(&self) -> Mode {
        *self.resolved.get_or_init(|| {
            let mode = if self.probe.hardware_present() {
                Mode::Live
            } else {
                self.preference
            };
            info!(%mode, "runtime mode resolved");
            mode
        })
    }
}

static ROBOT_MODE: OnceLock<Mode> = OnceLock::new();

/// Process-wide mode, resolved on first call with the default
/// [`MarkerFileProbe`] and [`SIM_MODE`].
///
/// Only valid for callers using the default marker path; a configured
/// marker needs its own [`ModeResolver`].
pub fn robot_mode() -> Mode {
    *ROBOT_MODE.get_or_init(|| ModeResolver::new(SIM_MODE, MarkerFileProbe::default()).resolve())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FixedProbe;
    use std::cell::Cell;

    struct CountingProbe {
        present: bool,
        calls: Cell<u32>,
    }

    impl HardwareProbe for CountingProbe {
        fn hardware_present(&self) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.present
        }
    }

    #[test]
    fn hardware_present_resolves_live() {
        for preference in [Mode::Simulated, Mode::Replay] {
            let resolver = ModeResolver::new(preference, FixedProbe(true));
            assert_eq!(resolver.resolve(), Mode::Live);
        }
    }

    #[test]
    fn no_hardware_resolves_to_preference() {
        let sim = ModeResolver::new(Mode::Simulated, FixedProbe(false));
        assert_eq!(sim.resolve(), Mode::Simulated);

        let replay = ModeResolver::new(Mode::Replay, FixedProbe(false));
        assert_eq!(replay.resolve(), Mode::Replay);
    }

    #[test]
    fn probe_is_queried_once() {
        let resolver = ModeResolver::new(
            Mode::Simulated,
            CountingProbe {
                present: false,
                calls: Cell::new(0),
            },
        );
        for _ in 0..5 {
            assert_eq!(resolver.resolve(), Mode::Simulated);
        }
        assert_eq!(resolver.probe.calls.get(), 1);
    }

    #[test]
    fn robot_mode_is_stable() {
        let first = robot_mode();
        assert_eq!(robot_mode(), first);
    }

    #[cfg(not(feature = "replay"))]
    #[test]
    fn default_preference_is_simulated() {
        assert_eq!(SIM_MODE, Mode::Simulated);
    }
}
