use crate::error::Result;

/// Source of one representative temperature per control tick.
#[cfg_attr(test, mockall::automock)]
pub trait TemperatureSensor: Send + Sync {
    /// Current temperature in degrees Celsius.
    fn read_temperature(&self) -> Result<f64>;

    /// Human-readable description for log lines.
    fn describe(&self) -> String;
}
