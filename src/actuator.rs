//! Duty output to the fan controller's sysfs attributes.

use std::{fs, path::PathBuf};

use crate::error::{FanError, Result};

/// Sink accepting one duty percentage per write.
#[cfg_attr(test, mockall::automock)]
pub trait DutyWriter: Send + Sync {
    /// Writes `duty` (already clamped) to the hardware.
    fn write_duty(&self, duty: u8) -> Result<()>;

    /// Human-readable target for log lines.
    fn describe(&self) -> String;
}

/// Writes the decimal duty as the whole content of a sysfs attribute such as
/// `/sys/devices/platform/fevm-ip3-wmi/fan1_duty`.
///
/// The file is opened for every write; no handle is kept between ticks.
#[derive(Debug, Clone)]
pub struct SysfsActuator {
    path: PathBuf,
}

impl SysfsActuator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DutyWriter for SysfsActuator {
    fn write_duty(&self, duty: u8) -> Result<()> {
        fs::write(&self.path, duty.to_string()).map_err(|source| FanError::Write {
            path: self.path.clone(),
            duty,
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
