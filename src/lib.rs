//! # fevm_fand
//!
//! A Linux daemon driving the two platform fans of FEVM IP3 mini PCs from
//! hwmon temperatures.
//!
//! ## Features
//!
//! - **Two Channels**: CPU temperature drives `fan1`, memory temperature drives `fan2`
//! - **Piecewise-Linear Curves**: Integer duty percentages interpolated between control points
//! - **Sensor Fallback**: Memory channel can reuse the CPU sensor when no DIMM sensor exists
//! - **Failsafe**: Any sampling or write failure forces every fan to a fixed duty
//! - **Syslog**: Logs to syslog when daemonized, to stderr otherwise
//!
//! ## Architecture
//!
//! - [`HwmonRoot`](hwmon::HwmonRoot) resolves sensor groups once at startup
//! - [`Channel`](channel::Channel) ties a sensor, a curve and an actuator together
//! - [`ControlLoop`](control_loop::ControlLoop) ticks every channel at a fixed interval
//! - [`Application`](application::Application) wires everything from a [`Config`](config::Config)
//!
//! ## Example
//!
//! ```no_run
//! use fevm_fand::{application::Application, config::Config};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = Application::builder()
//!         .with_config(Config::load(None)?)
//!         .build()?;
//!     app.run(CancellationToken::new()).await;
//!     Ok(())
//! }
//! ```

pub mod actuator;
pub mod application;
pub mod channel;
pub mod cli;
pub mod config;
pub mod control_loop;
pub mod duty;
pub mod error;
pub mod fan_curve;
pub mod hwmon;
pub mod logging;
pub mod sensors;
pub mod shutdown;
