//! Duty bounds enforcement.

use crate::{
    error::{FanError, Result},
    fan_curve::MAX_DUTY,
};

/// `max(min, min(duty, max))`.
///
/// Unlike [`Ord::clamp`] this never panics; with `min > max` the lower bound wins.
pub fn clamp_duty(duty: u8, min: u8, max: u8) -> u8 {
    min.max(duty.min(max))
}

/// Validated `[min, max]` duty window applied to every value written to a fan.
///
/// # Example
///
/// ```
/// use fevm_fand::duty::DutyLimits;
///
/// let limits = DutyLimits::new(20, 100)?;
/// assert_eq!(limits.clamp(5), 20);
/// assert_eq!(limits.clamp(70), 70);
/// # Ok::<(), fevm_fand::error::FanError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyLimits {
    min: u8,
    max: u8,
}

impl DutyLimits {
    pub fn new(min: u8, max: u8) -> Result<Self> {
        if max > MAX_DUTY {
            return Err(FanError::InvalidConfig {
                field: "general.max_duty",
                reason: format!("{max} exceeds {MAX_DUTY}"),
            });
        }
        if min > max {
            return Err(FanError::InvalidConfig {
                field: "general.min_duty",
                reason: format!("{min} is greater than max_duty {max}"),
            });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    pub fn clamp(&self, duty: u8) -> u8 {
        clamp_duty(duty, self.min, self.max)
    }

    pub fn contains(&self, duty: u8) -> bool {
        (self.min..=self.max).contains(&duty)
    }
}
