//! Wall-clock access.
//!
//! Relative dates in patterns and format strings are resolved against a
//! [`Clock`] so callers (and tests) control what "now" means.

use chrono::{DateTime, FixedOffset, Local, Offset, Utc};

/// Source of the current time and the local timezone.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The local timezone offset in effect at [`Clock::now`].
    fn local_offset(&self) -> FixedOffset;

    /// The current instant in local time.
    fn local_now(&self) -> DateTime<FixedOffset> {
        self.now().with_timezone(&self.local_offset())
    }

    /// Convert `t` to local time.
    fn to_local(&self, t: DateTime<Utc>) -> DateTime<FixedOffset> {
        t.with_timezone(&self.local_offset())
    }
}

/// The host clock and timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_offset(&self) -> FixedOffset {
        Local::now().offset().fix()
    }
}

/// A clock frozen at one instant, in a fixed timezone.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    /// The instant returned by [`Clock::now`].
    pub now: DateTime<Utc>,
    /// Local timezone.
    pub offset: FixedOffset,
}

impl FixedClock {
    /// Freeze at `secs` since the epoch, with UTC as the local zone.
    pub fn at(secs: i64) -> Self {
        Self {
            now: DateTime::from_timestamp(secs, 0).unwrap_or_default(),
            offset: Utc.fix(),
        }
    }

    /// Same instant, different local zone (seconds east of UTC).
    pub fn with_offset(mut self, secs: i32) -> Self {
        if let Some(offset) = FixedOffset::east_opt(secs) {
            self.offset = offset;
        }
        self
    }

    /// Move the clock by `secs`.
    pub fn advance(mut self, secs: i64) -> Self {
        self.now = DateTime::from_timestamp(self.now.timestamp() + secs, 0).unwrap_or(self.now);
        self
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn local_offset(&self) -> FixedOffset {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_converts_to_local() {
        let clock = FixedClock::at(1_704_164_645).with_offset(-5 * 3600);
        assert_eq!(clock.local_now().format("%Y-%m-%d %H:%M").to_string(), "2024-01-01 22:04");
        assert_eq!(clock.advance(60).now().timestamp(), 1_704_164_705);
    }
}
