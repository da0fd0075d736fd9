//! Fan curve calculations for temperature-based duty control.
//!
//! Implements linear interpolation between temperature points to determine
//! the duty cycle for the current temperature reading.

use serde::Deserialize;

/// Highest duty percentage a control point may carry.
pub const MAX_DUTY: u8 = 100;

/// Temperature to duty coordinate used in curve interpolation.
///
/// Deserializes from a `[temp_c, duty]` pair.
///
/// # Example
///
/// ```
/// use fevm_fand::fan_curve::ControlPoint;
///
/// let point: ControlPoint = (45.0, 60).into(); // 45°C -> 60% duty
/// assert_eq!(point.duty, 60);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "(f64, u8)")]
pub struct ControlPoint {
    pub temp_c: f64,
    pub duty: u8,
}

impl From<(f64, u8)> for ControlPoint {
    fn from(value: (f64, u8)) -> Self {
        Self {
            temp_c: value.0,
            duty: value.1,
        }
    }
}

/// Reasons a point list is refused as a curve.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    #[error("curve must contain at least one point")]
    Empty,

    #[error("point {index} has a non-finite temperature")]
    NonFinite { index: usize },

    #[error("point {index} has duty {duty}, above {MAX_DUTY}")]
    DutyOutOfRange { index: usize, duty: u8 },

    #[error("temperatures must be strictly increasing ({prev} then {next} at point {index})")]
    NotIncreasing { index: usize, prev: f64, next: f64 },
}

/// Piecewise-linear temperature to duty curve.
///
/// The only way to obtain one is [`FanCurve::new`] (deserialization goes
/// through it too), so every instance has at least one point, finite and
/// strictly increasing temperatures, and duties within `0..=100`.
///
/// # Example
///
/// ```
/// use fevm_fand::fan_curve::FanCurve;
///
/// let curve = FanCurve::new(vec![(40.0, 20).into(), (85.0, 100).into()])?;
/// assert_eq!(curve.duty_at(30.0), 20);
/// assert_eq!(curve.duty_at(90.0), 100);
/// # Ok::<(), fevm_fand::fan_curve::CurveError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<ControlPoint>")]
pub struct FanCurve {
    points: Vec<ControlPoint>,
}

impl FanCurve {
    /// Validates `points` and builds the curve. Points are never reordered.
    pub fn new(points: Vec<ControlPoint>) -> Result<Self, CurveError> {
        if points.is_empty() {
            return Err(CurveError::Empty);
        }

        for (index, point) in points.iter().enumerate() {
            if !point.temp_c.is_finite() {
                return Err(CurveError::NonFinite { index });
            }
            if point.duty > MAX_DUTY {
                return Err(CurveError::DutyOutOfRange {
                    index,
                    duty: point.duty,
                });
            }
        }

        if let Some((index, pair)) = points
            .windows(2)
            .enumerate()
            .find(|(_, pair)| pair[1].temp_c <= pair[0].temp_c)
        {
            return Err(CurveError::NotIncreasing {
                index: index + 1,
                prev: pair[0].temp_c,
                next: pair[1].temp_c,
            });
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Duty for `temp_c`.
    ///
    /// Below the first point the first duty is returned, above the last point
    /// the last duty. Inside the range the bracketing segment is interpolated
    /// and rounded half away from zero, so 27.5 becomes 28. A NaN input maps to
    /// the last point's duty.
    pub fn duty_at(&self, temp_c: f64) -> u8 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return MAX_DUTY,
        };

        if temp_c <= first.temp_c {
            return first.duty;
        }
        if temp_c >= last.temp_c {
            return last.duty;
        }

        self.points
            .windows(2)
            .find(|pair| pair[0].temp_c <= temp_c && temp_c <= pair[1].temp_c)
            .map(|pair| interpolate(pair[0], pair[1], temp_c))
            .unwrap_or(last.duty)
    }
}

fn interpolate(lo: ControlPoint, hi: ControlPoint, temp_c: f64) -> u8 {
    let ratio = (temp_c - lo.temp_c) / (hi.temp_c - lo.temp_c);
    let duty = f64::from(lo.duty) + ratio * (f64::from(hi.duty) - f64::from(lo.duty));
    // Both endpoints are within 0..=100, so the rounded value fits.
    duty.round().clamp(0.0, f64::from(MAX_DUTY)) as u8
}

impl TryFrom<Vec<ControlPoint>> for FanCurve {
    type Error = CurveError;

    fn try_from(points: Vec<ControlPoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}
