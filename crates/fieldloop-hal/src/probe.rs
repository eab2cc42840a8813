//! Hardware-presence probes.

use std::path::{Path, PathBuf};

/// Marker the robot controller image installs; its presence means the
/// process is running on the real robot.
pub const DEFAULT_HARDWARE_MARKER: &str = "/etc/fieldloop/hardware";

/// Answers whether the process is attached to real actuation hardware.
///
/// Queried once at boot by [`ModeResolver`][crate::mode::ModeResolver].
pub trait HardwareProbe {
    fn hardware_present(&self) -> bool;
}

/// Reports hardware when a marker file exists on disk.
#[derive(Debug, Clone)]
pub struct MarkerFileProbe {
    marker: PathBuf,
}

impl MarkerFileProbe {
    pub fn new(marker: impl Into<PathBuf>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &Path {
        &self.marker
    }
}

impl Default for MarkerFileProbe {
    fn default() -> Self {
        Self::new(DEFAULT_HARDWARE_MARKER)
    }
}

impl HardwareProbe for MarkerFileProbe {
    fn hardware_present(&self) -> bool {
        self.marker.exists()
    }
}

/// A probe with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub bool);

impl HardwareProbe for FixedProbe {
    fn hardware_present(&self) -> bool {
        self.0
    }
}
