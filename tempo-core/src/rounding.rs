//! Snapping of frame end timestamps to a minute grid.
//!
//! Only the end of an interval moves; the start is never shifted. The grid is
//! laid on the wall clock of the end timestamp's own UTC offset, so a 15 minute
//! policy snaps to :00, :15, :30 and :45.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::{Duration, OffsetDateTime};

use crate::error::RoundingDomainError;

const NANOS_PER_MINUTE: i128 = 60 * 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum RoundingDirection {
    #[default]
    #[strum(serialize = "none")]
    None,
    #[strum(serialize = "up")]
    Up,
    #[strum(serialize = "down")]
    Down,
    /// Round half-up to the closest grid point. Shown as "up or down" in the
    /// desktop client.
    #[strum(to_string = "nearest", serialize = "up or down")]
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundingPolicy {
    pub direction: RoundingDirection,
    pub minutes: i64,
}

impl RoundingPolicy {
    pub fn new(direction: RoundingDirection, minutes: i64) -> Result<Self, RoundingDomainError> {
        let policy = Self { direction, minutes };
        policy.validate()?;
        Ok(policy)
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), RoundingDomainError> {
        if self.minutes < 0 {
            return Err(RoundingDomainError::NegativeInterval(self.minutes));
        }
        Ok(())
    }

    pub fn is_identity(&self) -> bool {
        self.direction == RoundingDirection::None || self.minutes == 0
    }
}

/// A closed recorded interval, `end >= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl Interval {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        (self.end - self.start).max(Duration::ZERO)
    }
}

/// Rounds the end of `interval` according to `policy`.
///
/// The result never ends before it starts: when snapping would move the end
/// below the start, the end is clamped to the start.
pub fn round(interval: Interval, policy: &RoundingPolicy) -> Result<Interval, RoundingDomainError> {
    policy.validate()?;
    if policy.is_identity() {
        return Ok(interval);
    }

    let end = interval.end;
    let step = i128::from(policy.minutes) * NANOS_PER_MINUTE;
    let local =
        end.unix_timestamp_nanos() + i128::from(end.offset().whole_seconds()) * 1_000_000_000;
    let remainder = local.rem_euclid(step);
    let floor = local - remainder;

    let snapped = match policy.direction {
        RoundingDirection::None => local,
        RoundingDirection::Down => floor,
        RoundingDirection::Up if remainder == 0 => local,
        RoundingDirection::Up => floor + step,
        RoundingDirection::Nearest if remainder * 2 >= step => floor + step,
        RoundingDirection::Nearest => floor,
    };

    let shift = i64::try_from(snapped - local).unwrap_or(0);
    let rounded_end = end
        .checked_add(Duration::nanoseconds(shift))
        .unwrap_or(end)
        .max(interval.start);

    Ok(Interval::new(interval.start, rounded_end))
}
