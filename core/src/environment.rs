//! Dependency injection traits
//!
//! All sources of non-determinism the lifecycle needs (the current instant and
//! the random suffix of booking identifiers) are abstracted behind traits and
//! injected through the environment, so reducers and the identifier generator
//! stay deterministic under test.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use rand::Rng;

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```
/// use bmp_core::environment::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let _now = clock.now();
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of uniformly distributed indices.
///
/// Identifier suffixes are drawn through this trait instead of a global
/// generator, so tests can substitute a seeded or scripted source.
pub trait RandomSource: Send + Sync {
    /// Returns an index uniformly distributed in `0..bound`.
    ///
    /// Callers never pass a zero `bound`.
    fn next_index(&self, bound: usize) -> usize;
}

/// Production random source backed by the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_index(&self, bound: usize) -> usize {
        rand::thread_rng().gen_range(0..bound)
    }
}

/// Calendar that decides what "today" means for the business.
///
/// The same offset is used for the date embedded in booking identifiers and for
/// rejecting preferred dates in the past, so both agree at day boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    offset: FixedOffset,
}

impl BusinessCalendar {
    /// Offset of Indian Standard Time in minutes east of UTC.
    pub const IST_OFFSET_MINUTES: i32 = 330;

    /// Creates a calendar for a fixed UTC offset.
    #[must_use]
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Creates a calendar from an offset in minutes east of UTC.
    ///
    /// Returns `None` if the offset is out of range (±24h).
    #[must_use]
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
    }

    /// Calendar in UTC.
    #[must_use]
    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Calendar in Indian Standard Time (UTC+05:30).
    #[must_use]
    pub fn india() -> Self {
        Self::from_offset_minutes(Self::IST_OFFSET_MINUTES).unwrap_or_else(Self::utc)
    }

    /// The configured offset.
    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar date of an instant in this calendar.
    #[must_use]
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Today's date according to the given clock.
    #[must_use]
    pub fn today(&self, clock: &dyn Clock) -> NaiveDate {
        self.date_of(clock.now())
    }

    /// The UTC instant at which `date` begins in this calendar.
    #[must_use]
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let local_midnight = date.and_time(NaiveTime::default());
        (local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()))).and_utc()
    }
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::india()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn india_calendar_rolls_over_before_utc() {
        let calendar = BusinessCalendar::india();
        // 20:00 UTC is 01:30 the next day in IST
        let instant = DateTime::parse_from_rfc3339("2026-02-10T20:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(
            calendar.date_of(instant),
            NaiveDate::from_ymd_opt(2026, 2, 11).unwrap()
        );
        assert_eq!(
            BusinessCalendar::utc().date_of(instant),
            NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()
        );
    }

    #[test]
    fn start_of_day_is_local_midnight() {
        let calendar = BusinessCalendar::india();
        let date = NaiveDate::from_ymd_opt(2026, 2, 11).unwrap();
        let start = calendar.start_of_day(date);

        assert_eq!(start.to_rfc3339(), "2026-02-10T18:30:00+00:00");
        assert_eq!(calendar.date_of(start), date);
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        assert!(BusinessCalendar::from_offset_minutes(24 * 60).is_none());
        assert!(BusinessCalendar::from_offset_minutes(-300).is_some());
    }

    #[test]
    fn thread_random_stays_in_bounds() {
        let random = ThreadRandom;
        for _ in 0..1000 {
            assert!(random.next_index(36) < 36);
        }
    }
}
