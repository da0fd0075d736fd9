//! One control lane: sensor, curve, limits and actuator.

use std::sync::Arc;

use crate::{
    actuator::DutyWriter, duty::DutyLimits, error::Result, fan_curve::FanCurve,
    sensors::TemperatureSensor,
};

/// Temperature sampled for a channel and the clamped duty derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelReading {
    pub temperature: f64,
    pub duty: u8,
}

/// Independent sensor/curve/actuator triple driven by the control loop.
///
/// The sensor is shared so that a secondary channel can fall back to the
/// primary channel's sources without resolving them twice.
pub struct Channel {
    name: String,
    sensor: Arc<dyn TemperatureSensor>,
    curve: FanCurve,
    writer: Box<dyn DutyWriter>,
    limits: DutyLimits,
    failsafe_duty: u8,
}

impl Channel {
    pub fn new(
        name: impl Into<String>,
        sensor: Arc<dyn TemperatureSensor>,
        curve: FanCurve,
        writer: Box<dyn DutyWriter>,
        limits: DutyLimits,
        failsafe_duty: u8,
    ) -> Self {
        Self {
            name: name.into(),
            sensor,
            curve,
            writer,
            limits,
            failsafe_duty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn writer(&self) -> &dyn DutyWriter {
        self.writer.as_ref()
    }

    /// Samples the sensor and maps the result through the curve and limits.
    pub fn plan(&self) -> Result<ChannelReading> {
        let temperature = self.sensor.read_temperature()?;
        let duty = self.limits.clamp(self.curve.duty_at(temperature));
        Ok(ChannelReading { temperature, duty })
    }

    pub fn apply(&self, duty: u8) -> Result<()> {
        self.writer.write_duty(self.limits.clamp(duty))
    }

    /// Failsafe duty pulled into the channel's limits.
    pub fn failsafe_duty(&self) -> u8 {
        self.limits.clamp(self.failsafe_duty)
    }

    pub fn apply_failsafe(&self) -> Result<u8> {
        let duty = self.failsafe_duty();
        self.writer.write_duty(duty)?;
        Ok(duty)
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("sensor", &self.sensor.describe())
            .field("writer", &self.writer.describe())
            .field("limits", &self.limits)
            .field("failsafe_duty", &self.failsafe_duty)
            .finish()
    }
}
