//! Application entry point and builder pattern implementation.

use std::sync::Arc;

use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::{
    actuator::SysfsActuator,
    channel::Channel,
    config::{Config, SensorsCfg},
    control_loop::{ControlLoop, LoopState},
    error::{FanError, Result},
    hwmon::{HwmonRoot, SensorGroup},
};

/// Sensor groups resolved once at startup, one per channel.
#[derive(Debug, Clone)]
pub struct ResolvedSensors {
    pub cpu: Arc<SensorGroup>,
    pub mem: Arc<SensorGroup>,
    /// `true` when the memory channel reuses the CPU sources.
    pub mem_fell_back: bool,
}

/// Resolves both sensor groups, applying the memory-to-CPU fallback.
///
/// A missing CPU group is always fatal. A missing memory group is fatal
/// unless `mem_fallback_to_cpu` is set, in which case the CPU group is shared.
pub fn resolve_sensors(hwmon: &HwmonRoot, cfg: &SensorsCfg) -> Result<ResolvedSensors> {
    let cpu = Arc::new(hwmon.resolve(&cfg.cpu_names)?);

    match hwmon.resolve(&cfg.mem_names) {
        Ok(mem) => Ok(ResolvedSensors {
            cpu,
            mem: Arc::new(mem),
            mem_fell_back: false,
        }),
        Err(FanError::NotFound { names }) if cfg.mem_fallback_to_cpu => {
            warn!("Memory hwmon {names:?} not found, falling back to CPU sensor");
            Ok(ResolvedSensors {
                mem: cpu.clone(),
                cpu,
                mem_fell_back: true,
            })
        }
        Err(e) => Err(e),
    }
}

/// Main application structure: a fully resolved control loop ready to run.
///
/// # Example
///
/// ```no_run
/// use fevm_fand::{application::Application, config::Config};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> anyhow::Result<()> {
/// let app = Application::builder()
///     .with_config(Config::load(None)?)
///     .build()?;
///
/// app.run(CancellationToken::new()).await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Application {
    control_loop: ControlLoop,
}

impl Application {
    /// Creates a new ApplicationBuilder for constructing Application instances.
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn control_loop(&self) -> &ControlLoop {
        &self.control_loop
    }

    /// Runs the control loop until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) -> LoopState {
        self.control_loop.run(shutdown).await;
        info!("Daemon stopped");
        self.control_loop.state()
    }
}

/// Builder pattern for creating Application instances.
///
/// `build` is the `Starting` phase: it validates the configuration, resolves
/// sensor groups and wires the channels. Every error it returns is fatal.
pub struct ApplicationBuilder {
    config: Option<Config>,
    hwmon: HwmonRoot,
}

impl ApplicationBuilder {
    fn new() -> Self {
        Self {
            config: None,
            hwmon: HwmonRoot::default(),
        }
    }

    /// Sets the configuration; defaults are used when never called.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the hwmon class directory (`/sys/class/hwmon`).
    pub fn with_hwmon_root(mut self, hwmon: HwmonRoot) -> Self {
        self.hwmon = hwmon;
        self
    }

    pub fn build(self) -> Result<Application> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let limits = config.duty_limits()?;
        let poll_interval = config.poll_interval()?;
        let sensors = resolve_sensors(&self.hwmon, &config.sensors)?;

        info!(
            "cpu_hwmons={:?} mem_hwmons={:?}",
            sensors.cpu.sources(),
            sensors.mem.sources()
        );
        info!(
            "fan1={} fan2={} poll={:.2}s",
            config.general.fan1_path.display(),
            config.general.fan2_path.display(),
            poll_interval.as_secs_f64()
        );

        let general = &config.general;
        let channels = vec![
            Channel::new(
                "cpu",
                sensors.cpu,
                config.curves.cpu.clone(),
                Box::new(SysfsActuator::new(&general.fan1_path)),
                limits,
                general.failsafe_duty,
            ),
            Channel::new(
                "mem",
                sensors.mem,
                config.curves.mem.clone(),
                Box::new(SysfsActuator::new(&general.fan2_path)),
                limits,
                general.failsafe_duty,
            ),
        ];

        Ok(Application {
            control_loop: ControlLoop::new(channels, poll_interval),
        })
    }
}
