//! Configuration management for the fevm_fand daemon.
//!
//! Handles locating, parsing and validating the YAML configuration file that
//! defines fan paths, duty limits, sensor names and fan curves. Every field is
//! optional; a missing file means the built-in defaults apply in full.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use log::{info, warn};
use serde::Deserialize;

use crate::{
    duty::DutyLimits,
    error::{FanError, Result},
    fan_curve::FanCurve,
};

/// Environment variable overriding the configuration path.
pub const CONFIG_ENV: &str = "FEVM_FAND_CONFIG";

/// System-wide configuration path.
pub const SYSTEM_CONFIG: &str = "/etc/fevm_fand/config.yml";

/// TOML file read by the previous fan-curve service. Never parsed.
pub const LEGACY_CONFIG: &str = "/etc/fevm-fan-curve.toml";

/// Main configuration structure for the fevm_fand daemon.
///
/// # Example
///
/// ```yaml
/// version: 1
/// general:
///   fan1_path: /sys/devices/platform/fevm-ip3-wmi/fan1_duty
///   fan2_path: /sys/devices/platform/fevm-ip3-wmi/fan2_duty
///   poll_sec: 1.0
///   min_duty: 20
///   max_duty: 100
///   failsafe_duty: 70
/// sensors:
///   cpu_names: [k10temp]
///   mem_names: [spd5118]
///   mem_fallback_to_cpu: true
/// curves:
///   cpu: [[40, 20], [55, 35], [65, 55], [75, 75], [85, 100]]
///   mem: [[35, 20], [50, 40], [60, 60], [70, 80], [80, 100]]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Configuration version for compatibility checking.
    #[serde(default = "defaults::version")]
    pub version: u8,

    /// Actuator paths, polling and duty bounds.
    #[serde(default)]
    pub general: GeneralCfg,

    /// Logical hwmon names per channel.
    #[serde(default)]
    pub sensors: SensorsCfg,

    /// Temperature to duty curves per channel.
    #[serde(default)]
    pub curves: CurvesCfg,
}

/// Actuator paths, polling interval and duty bounds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneralCfg {
    /// Duty attribute of the CPU fan.
    #[serde(default = "defaults::fan1_path")]
    pub fan1_path: PathBuf,

    /// Duty attribute of the memory fan.
    #[serde(default = "defaults::fan2_path")]
    pub fan2_path: PathBuf,

    /// Delay between ticks in seconds; fractions allowed.
    #[serde(default = "defaults::poll_sec")]
    pub poll_sec: f64,

    #[serde(default = "defaults::min_duty")]
    pub min_duty: u8,

    #[serde(default = "defaults::max_duty")]
    pub max_duty: u8,

    /// Duty written to every fan when sampling or writing fails.
    #[serde(default = "defaults::failsafe_duty")]
    pub failsafe_duty: u8,
}

/// hwmon `name` values to match for each channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SensorsCfg {
    #[serde(default = "defaults::cpu_names")]
    pub cpu_names: Vec<String>,

    #[serde(default = "defaults::mem_names")]
    pub mem_names: Vec<String>,

    /// Reuse the CPU sources when no memory sensor is present.
    #[serde(default = "defaults::mem_fallback_to_cpu")]
    pub mem_fallback_to_cpu: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurvesCfg {
    #[serde(default = "defaults::cpu_curve")]
    pub cpu: FanCurve,

    #[serde(default = "defaults::mem_curve")]
    pub mem: FanCurve,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: defaults::version(),
            general: GeneralCfg::default(),
            sensors: SensorsCfg::default(),
            curves: CurvesCfg::default(),
        }
    }
}

impl Default for GeneralCfg {
    fn default() -> Self {
        Self {
            fan1_path: defaults::fan1_path(),
            fan2_path: defaults::fan2_path(),
            poll_sec: defaults::poll_sec(),
            min_duty: defaults::min_duty(),
            max_duty: defaults::max_duty(),
            failsafe_duty: defaults::failsafe_duty(),
        }
    }
}

impl Default for SensorsCfg {
    fn default() -> Self {
        Self {
            cpu_names: defaults::cpu_names(),
            mem_names: defaults::mem_names(),
            mem_fallback_to_cpu: defaults::mem_fallback_to_cpu(),
        }
    }
}

impl Default for CurvesCfg {
    fn default() -> Self {
        Self {
            cpu: defaults::cpu_curve(),
            mem: defaults::mem_curve(),
        }
    }
}

impl Config {
    /// Loads configuration from `path` or the standard locations.
    ///
    /// Searches in the following order:
    /// 1. Provided path parameter
    /// 2. `FEVM_FAND_CONFIG` environment variable
    /// 3. `$XDG_CONFIG_HOME/fevm_fand/config.yml` or `~/.config/fevm_fand/config.yml`
    /// 4. `/etc/fevm_fand/config.yml`
    ///
    /// When the selected file does not exist the defaults are returned.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fevm_fand::config::Config;
    ///
    /// let config = Config::load(None)?;
    /// println!("polling every {:?}", config.poll_interval()?);
    /// # Ok::<(), fevm_fand::error::FanError>(())
    /// ```
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let path = path.unwrap_or_else(locate_config);

        if !path.exists() {
            info!(
                "No config file at {}, using built-in defaults",
                path.display()
            );
            warn_if_legacy(Path::new(LEGACY_CONFIG));
            return Ok(Self::default());
        }

        info!("Loading config from: {}", path.display());
        Self::from_path(&path)
    }

    /// Reads, parses and validates a configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| FanError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config =
            serde_yaml::from_str(&content).map_err(|source| FanError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for consistency.
    ///
    /// Curves are already checked during deserialization; this covers the
    /// version, poll interval and duty bounds.
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(FanError::UnsupportedVersion(self.version));
        }

        self.poll_interval()?;
        let limits = self.duty_limits()?;

        if !limits.contains(self.general.failsafe_duty) {
            warn!(
                "failsafe_duty {} lies outside [{}, {}] and will be clamped",
                self.general.failsafe_duty,
                limits.min(),
                limits.max()
            );
        }

        Ok(())
    }

    /// Delay between control ticks.
    pub fn poll_interval(&self) -> Result<Duration> {
        let secs = self.general.poll_sec;
        if secs.is_nan() || secs <= 0.0 {
            return Err(FanError::InvalidConfig {
                field: "general.poll_sec",
                reason: format!("{secs} is not a positive number of seconds"),
            });
        }

        Duration::try_from_secs_f64(secs).map_err(|e| FanError::InvalidConfig {
            field: "general.poll_sec",
            reason: e.to_string(),
        })
    }

    pub fn duty_limits(&self) -> Result<DutyLimits> {
        DutyLimits::new(self.general.min_duty, self.general.max_duty)
    }
}

/// Warns when the old TOML config is present but about to be ignored.
fn warn_if_legacy(legacy: &Path) -> bool {
    if !legacy.exists() {
        return false;
    }
    warn!(
        "Ignoring legacy config {}; move its settings to YAML at {}",
        legacy.display(),
        SYSTEM_CONFIG
    );
    true
}

fn locate_config() -> PathBuf {
    if let Some(env_path) = env::var_os(CONFIG_ENV) {
        return PathBuf::from(env_path);
    }

    if let Some(mut cfg_dir) = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|h| Path::new(&h).join(".config")))
    {
        cfg_dir.push("fevm_fand/config.yml");
        if cfg_dir.exists() {
            return cfg_dir;
        }
    }

    PathBuf::from(SYSTEM_CONFIG)
}

mod defaults {
    use std::path::PathBuf;

    use crate::fan_curve::{ControlPoint, FanCurve};

    pub fn version() -> u8 {
        1
    }

    pub fn fan1_path() -> PathBuf {
        PathBuf::from("/sys/devices/platform/fevm-ip3-wmi/fan1_duty")
    }

    pub fn fan2_path() -> PathBuf {
        PathBuf::from("/sys/devices/platform/fevm-ip3-wmi/fan2_duty")
    }

    pub fn poll_sec() -> f64 {
        1.0
    }

    pub fn min_duty() -> u8 {
        20
    }

    pub fn max_duty() -> u8 {
        100
    }

    pub fn failsafe_duty() -> u8 {
        70
    }

    pub fn cpu_names() -> Vec<String> {
        vec!["k10temp".to_string()]
    }

    pub fn mem_names() -> Vec<String> {
        vec!["spd5118".to_string()]
    }

    pub fn mem_fallback_to_cpu() -> bool {
        true
    }

    pub fn cpu_curve() -> FanCurve {
        curve(&[(40.0, 20), (55.0, 35), (65.0, 55), (75.0, 75), (85.0, 100)])
    }

    pub fn mem_curve() -> FanCurve {
        curve(&[(35.0, 20), (50.0, 40), (60.0, 60), (70.0, 80), (80.0, 100)])
    }

    fn curve(points: &[(f64, u8)]) -> FanCurve {
        FanCurve::new(points.iter().copied().map(ControlPoint::from).collect())
            .expect("built-in curve is strictly increasing")
    }
}
