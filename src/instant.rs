//! A date-time combined with an opaque, uninspected timezone tag.

use crate::{Date, Time};

/// The default timezone tag: carries no information at all.
///
/// Used as the default `Tz` parameter of [`Instant`], [`crate::Rule`], and
/// [`crate::RuleSet`] for callers who have no timezone layer of their own.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoTimeZone;

/// A date and time, tagged with an opaque `Tz` value that this crate never inspects.
///
/// `Tz` exists so a caller with their own timezone library can parameterize
/// [`crate::Rule<Tz>`]/[`crate::RuleSet<Tz>`] over their own tag type and have it carried
/// through every emitted instant untouched. Equality, ordering, and hashing consider only
/// the date and time, never `Tz` — two instants with different tags but the same
/// wall-clock value are the same instant for every purpose this crate cares about.
#[derive(Debug, Clone, Copy, Default)]
pub struct Instant<Tz = NoTimeZone> {
    date: Date,
    time: Time,
    tz: Tz,
}

impl<Tz> Instant<Tz> {
    /// Combines a date and time with the given timezone tag.
    pub fn with_tz(date: Date, time: Time, tz: Tz) -> Self {
        Self { date, time, tz }
    }

    /// Returns the date component.
    #[inline]
    pub fn date(&self) -> Date {
        self.date
    }

    /// Returns the time-of-day component.
    #[inline]
    pub fn time(&self) -> Time {
        self.time
    }

    /// Returns a reference to the timezone tag.
    #[inline]
    pub fn tz(&self) -> &Tz {
        &self.tz
    }

    /// Returns the year.
    #[inline]
    pub fn year(&self) -> i16 {
        self.date.year()
    }

    /// Returns the month, `1..=12`.
    #[inline]
    pub fn month(&self) -> u8 {
        self.date.month()
    }

    /// Returns the day of month, `1..=31`.
    #[inline]
    pub fn day(&self) -> u8 {
        self.date.day()
    }

    /// Returns the hour, `0..=23`.
    #[inline]
    pub fn hour(&self) -> u8 {
        self.time.hour()
    }

    /// Returns the minute, `0..=59`.
    #[inline]
    pub fn minute(&self) -> u8 {
        self.time.minute()
    }

    /// Returns the second, `0..=59`.
    #[inline]
    pub fn second(&self) -> u8 {
        self.time.second()
    }

    /// Re-tags this instant with a different `Tz` value, keeping the same date and time.
    pub fn retag<Tz2>(self, tz: Tz2) -> Instant<Tz2> {
        Instant {
            date: self.date,
            time: self.time,
            tz,
        }
    }
}

impl Instant<NoTimeZone> {
    /// Combines a date and time with no timezone tag.
    pub fn new(date: Date, time: Time) -> Self {
        Self::with_tz(date, time, NoTimeZone)
    }
}

/// The current instant, truncated to seconds, with no timezone tag.
///
/// Used as the default `dtstart` by [`crate::RuleBuilder::build_or_now`] when the caller
/// never set one.
#[cfg(feature = "std")]
pub fn now() -> Instant<NoTimeZone> {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    let (days, time) = Time::from_total_seconds(duration.as_secs() as i64);
    Instant::new(Date::UNIX_EPOCH.add_days(days), time)
}

// The `Tz` tag is inert data, never part of an instant's identity: two instants
// that differ only in their tag compare and hash identically.
impl<Tz, OtherTz> PartialEq<Instant<OtherTz>> for Instant<Tz> {
    fn eq(&self, other: &Instant<OtherTz>) -> bool {
        self.date == other.date && self.time == other.time
    }
}

impl<Tz> Eq for Instant<Tz> {}

impl<Tz> core::hash::Hash for Instant<Tz> {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.date.hash(state);
        self.time.hash(state);
    }
}

impl<Tz, OtherTz> PartialOrd<Instant<OtherTz>> for Instant<Tz> {
    fn partial_cmp(&self, other: &Instant<OtherTz>) -> Option<core::cmp::Ordering> {
        Some(match self.date.cmp(&other.date) {
            core::cmp::Ordering::Equal => self.time.cmp(&other.time),
            ord => ord,
        })
    }
}

impl<Tz> Ord for Instant<Tz> {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.partial_cmp(other).expect("Instant::partial_cmp is always Some")
    }
}

impl<Tz> core::fmt::Display for Instant<Tz> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}T{}", self.date, self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_tz() {
        #[derive(Clone, Copy)]
        struct Custom(u8);

        let a = Instant::with_tz(Date::new(2020, 1, 1), Time::new(9, 0, 0), NoTimeZone);
        let b = Instant::with_tz(Date::new(2020, 1, 1), Time::new(9, 0, 0), Custom(5));
        assert_eq!(a, b);
    }

    #[test]
    fn ordering_compares_date_then_time() {
        let earlier = Instant::new(Date::new(2020, 1, 1), Time::new(9, 0, 0));
        let later_time = Instant::new(Date::new(2020, 1, 1), Time::new(10, 0, 0));
        let later_date = Instant::new(Date::new(2020, 1, 2), Time::new(0, 0, 0));
        assert!(earlier < later_time);
        assert!(later_time < later_date);
    }
}
