//! Periodic sample → curve → clamp → write loop with the failsafe policy.

use std::time::Duration;

use log::{debug, error, info};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{
    channel::{Channel, ChannelReading},
    error::FanError,
};

/// Lifecycle of the control loop.
///
/// `Failsafe` is only held while the failsafe duty is being written inside a
/// tick; the loop is back in `Running` before the next sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Starting,
    Running,
    Failsafe,
    Stopping,
    Stopped,
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Every channel was sampled and written; readings are in channel order.
    Applied(Vec<ChannelReading>),
    /// At least one sample or write failed and every channel got its failsafe duty.
    Failsafe { failures: usize },
}

/// Drives all channels on a fixed period until the shutdown token is cancelled.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use fevm_fand::control_loop::ControlLoop;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(channels: Vec<fevm_fand::channel::Channel>) {
/// let shutdown = CancellationToken::new();
/// let mut control = ControlLoop::new(channels, Duration::from_secs(1));
/// control.run(shutdown).await;
/// # }
/// ```
#[derive(Debug)]
pub struct ControlLoop {
    channels: Vec<Channel>,
    poll_interval: Duration,
    state: LoopState,
}

impl ControlLoop {
    pub fn new(channels: Vec<Channel>, poll_interval: Duration) -> Self {
        Self {
            channels,
            poll_interval,
            state: LoopState::Starting,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Runs ticks until `shutdown` is cancelled.
    ///
    /// The token is only observed between ticks: a tick in progress always
    /// completes, and a cancellation during the sleep ends the loop at once.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        self.state = LoopState::Running;
        info!(
            "Control loop running: {} channels, poll interval {:.2}s",
            self.channels.len(),
            self.poll_interval.as_secs_f64()
        );

        while !shutdown.is_cancelled() {
            self.tick();

            tokio::select! {
                () = shutdown.cancelled() => {}
                () = sleep(self.poll_interval) => {}
            }
        }

        self.state = LoopState::Stopping;
        info!("Shutdown requested, stopping control loop");
        self.state = LoopState::Stopped;
    }

    /// Samples every channel, then writes every channel.
    ///
    /// Writes only start once all channels planned successfully. Any failure
    /// in either phase switches every channel to its failsafe duty for this
    /// tick.
    pub fn tick(&mut self) -> TickOutcome {
        let plans: Vec<Option<ChannelReading>> = self
            .channels
            .iter()
            .map(|channel| {
                channel
                    .plan()
                    .inspect_err(|e| report_failure(channel, "sample", e))
                    .ok()
            })
            .collect();

        let mut failures = plans.iter().filter(|plan| plan.is_none()).count();

        if failures == 0 {
            let readings: Vec<ChannelReading> = plans.into_iter().flatten().collect();
            for (channel, reading) in self.channels.iter().zip(&readings) {
                if let Err(e) = channel.apply(reading.duty) {
                    report_failure(channel, "write", &e);
                    failures += 1;
                }
            }

            if failures == 0 {
                debug!("{}", self.summary(&readings));
                return TickOutcome::Applied(readings);
            }
        }

        self.apply_failsafe(failures);
        TickOutcome::Failsafe { failures }
    }

    fn apply_failsafe(&mut self, failures: usize) {
        self.state = LoopState::Failsafe;
        error!("{failures} channel operation(s) failed; applying failsafe duty to all fans");

        for channel in &self.channels {
            match channel.apply_failsafe() {
                Ok(duty) => debug!("Channel '{}': failsafe duty {duty}%", channel.name()),
                Err(e) => error!(
                    "Channel '{}': failed to write failsafe duty: {e}",
                    channel.name()
                ),
            }
        }

        self.state = LoopState::Running;
    }

    fn summary(&self, readings: &[ChannelReading]) -> String {
        self.channels
            .iter()
            .zip(readings)
            .map(|(channel, reading)| {
                format!(
                    "{}={:.1}°C -> {}%",
                    channel.name(),
                    reading.temperature,
                    reading.duty
                )
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Logs a per-tick failure. Errors outside the recoverable class are flagged
/// as unexpected; the tick still ends in failsafe.
fn report_failure(channel: &Channel, operation: &str, e: &FanError) {
    if e.is_recoverable() {
        error!("Channel '{}': {operation} failed: {e}", channel.name());
    } else {
        error!(
            "Channel '{}': {operation} failed with unexpected error: {e}",
            channel.name()
        );
    }
}
