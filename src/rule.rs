//! A single normalized recurrence rule and its lazy expansion.

use crate::easter::easter_sunday;
use crate::freq::Freq;
use crate::instant::{Instant, NoTimeZone};
use crate::weekday_spec::WeekdaySpec;
use crate::{Date, Weekday};

/// Which fields the caller set explicitly, as opposed to ones this crate inferred or
/// defaulted from `dtstart`. Consulted only by the serializer's Normal verbosity mode
/// (see [`crate::serialize::Verbosity`]); never affects expansion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Explicit {
    pub(crate) interval: bool,
    pub(crate) wkst: bool,
    pub(crate) bymonth: bool,
    pub(crate) bymonthday: bool,
    pub(crate) byyearday: bool,
    pub(crate) byweekno: bool,
    pub(crate) byweekday: bool,
    pub(crate) byeaster: bool,
    pub(crate) bysetpos: bool,
    pub(crate) byhour: bool,
    pub(crate) byminute: bool,
    pub(crate) bysecond: bool,
}

/// A normalized recurrence rule: a frequency, an anchor instant, an optional termination,
/// an interval, and a set of `BY*` filters.
///
/// Built via [`crate::RuleBuilder`]; immutable once constructed. Iterating a rule (via
/// [`Rule::iter`]) yields [`Instant<Tz>`] values in strictly ascending order.
#[derive(Debug, Clone)]
pub struct Rule<Tz = NoTimeZone> {
    pub(crate) freq: Freq,
    pub(crate) dtstart: Instant<Tz>,
    pub(crate) interval: u32,
    pub(crate) wkst: Weekday,
    pub(crate) count: Option<u32>,
    pub(crate) until: Option<Instant<Tz>>,
    pub(crate) bysetpos: Vec<i32>,
    pub(crate) bymonth: Vec<u8>,
    pub(crate) bymonthday: Vec<i16>,
    pub(crate) bynmonthday: Vec<i16>,
    pub(crate) byyearday: Vec<i16>,
    pub(crate) byweekno: Vec<i16>,
    pub(crate) byeaster: Vec<i32>,
    pub(crate) byweekday: Vec<Weekday>,
    pub(crate) bynweekday: Vec<(Weekday, i16)>,
    pub(crate) byhour: Vec<u8>,
    pub(crate) byminute: Vec<u8>,
    pub(crate) bysecond: Vec<u8>,
    pub(crate) easter_fn: fn(i16) -> Date,
    pub(crate) explicit: Explicit,
}

impl<Tz> Rule<Tz> {
    /// The frequency this rule repeats at.
    #[inline]
    pub fn freq(&self) -> Freq {
        self.freq
    }

    /// The anchor instant every expansion is measured from.
    #[inline]
    pub fn dtstart(&self) -> &Instant<Tz> {
        &self.dtstart
    }

    /// The repeat interval, always positive.
    #[inline]
    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// The configured week-start weekday.
    #[inline]
    pub fn wkst(&self) -> Weekday {
        self.wkst
    }

    /// The `COUNT` limit, if any.
    #[inline]
    pub fn count_limit(&self) -> Option<u32> {
        self.count
    }

    /// The `UNTIL` bound, if any.
    #[inline]
    pub fn until(&self) -> Option<&Instant<Tz>> {
        self.until.as_ref()
    }

    /// The `BYDAY` values as plain weekdays, ignoring any ordinal qualifiers.
    pub fn byweekday(&self) -> &[Weekday] {
        &self.byweekday
    }

    /// The `BYDAY` values that carry an ordinal qualifier (e.g. `2MO`, `-1SU`).
    pub fn bynweekday(&self) -> &[(Weekday, i16)] {
        &self.bynweekday
    }

    /// All `BYDAY` entries, plain and qualified, in the form the RFC text grammar uses.
    pub fn byday_specs(&self) -> Vec<WeekdaySpec> {
        let mut specs: Vec<WeekdaySpec> = self.byweekday.iter().map(|&d| WeekdaySpec::plain(d)).collect();
        specs.extend(self.bynweekday.iter().map(|&(d, n)| WeekdaySpec::nth(d, n).expect("n is never 0 here")));
        specs
    }
}

pub(crate) fn dedup_sorted<T: Ord + Copy>(values: &mut Vec<T>) {
    values.sort_unstable();
    values.dedup();
}
