//! Accumulate-then-validate construction of a [`Rule`], mirroring the way this crate's
//! date/time layer builds its own compound values: chained setters record only what the
//! caller touched, and normalization/validation happens once, at [`RuleBuilder::build`].

use crate::easter::easter_sunday;
use crate::freq::Freq;
use crate::instant::{Instant, NoTimeZone};
use crate::rule::{dedup_sorted, Explicit, Rule};
use crate::weekday_spec::WeekdaySpec;
use crate::{Error, Weekday};

/// Builds a [`Rule`] from its constituent parts, normalizing and validating them at
/// [`build`](RuleBuilder::build).
#[derive(Debug, Clone)]
#[must_use]
pub struct RuleBuilder<Tz = NoTimeZone> {
    freq: Freq,
    dtstart: Option<Instant<Tz>>,
    interval: u32,
    wkst: Weekday,
    count: Option<u32>,
    until: Option<Instant<Tz>>,
    bysetpos: Vec<i32>,
    bymonth: Vec<u8>,
    bymonthday_raw: Vec<i16>,
    byyearday: Vec<i16>,
    byweekno: Vec<i16>,
    byeaster: Vec<i32>,
    byweekday_raw: Vec<WeekdaySpec>,
    byhour: Option<Vec<u8>>,
    byminute: Option<Vec<u8>>,
    bysecond: Option<Vec<u8>>,
    easter_fn: fn(i16) -> Date,
    explicit: Explicit,
}

use crate::Date;

impl<Tz> RuleBuilder<Tz> {
    /// Starts building a rule with the given frequency. Every other field is optional.
    pub fn new(freq: Freq) -> Self {
        Self {
            freq,
            dtstart: None,
            interval: 1,
            wkst: Weekday::Monday,
            count: None,
            until: None,
            bysetpos: Vec::new(),
            bymonth: Vec::new(),
            bymonthday_raw: Vec::new(),
            byyearday: Vec::new(),
            byweekno: Vec::new(),
            byeaster: Vec::new(),
            byweekday_raw: Vec::new(),
            byhour: None,
            byminute: None,
            bysecond: None,
            easter_fn: easter_sunday,
            explicit: Explicit::default(),
        }
    }

    /// Sets the anchor instant. Defaults to `now` (behind the `std` feature) truncated to
    /// seconds if never called.
    pub fn dtstart(mut self, dtstart: Instant<Tz>) -> Self {
        self.dtstart = Some(dtstart);
        self
    }

    /// Sets the repeat interval. Must be positive or [`build`](Self::build) fails.
    pub fn interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self.explicit.interval = true;
        self
    }

    /// Sets the week-start weekday, used by `BYWEEKNO` and `WEEKLY` advancement.
    pub fn wkst(mut self, wkst: Weekday) -> Self {
        self.wkst = wkst;
        self.explicit.wkst = true;
        self
    }

    /// Sets a `COUNT` termination. Mutually exclusive with [`until`](Self::until).
    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Sets an `UNTIL` termination. Mutually exclusive with [`count`](Self::count).
    pub fn until(mut self, until: Instant<Tz>) -> Self {
        self.until = Some(until);
        self
    }

    /// Sets the `BYSETPOS` positional selector.
    pub fn bysetpos(mut self, positions: impl IntoIterator<Item = i32>) -> Self {
        self.bysetpos = positions.into_iter().collect();
        self.explicit.bysetpos = true;
        self
    }

    /// Sets `BYMONTH`.
    pub fn bymonth(mut self, months: impl IntoIterator<Item = u8>) -> Self {
        self.bymonth = months.into_iter().collect();
        self.explicit.bymonth = true;
        self
    }

    /// Sets `BYMONTHDAY`, accepting both positive (from the start) and negative (from the
    /// end) day-of-month values.
    pub fn bymonthday(mut self, days: impl IntoIterator<Item = i16>) -> Self {
        self.bymonthday_raw = days.into_iter().collect();
        self.explicit.bymonthday = true;
        self
    }

    /// Sets `BYYEARDAY`.
    pub fn byyearday(mut self, days: impl IntoIterator<Item = i16>) -> Self {
        self.byyearday = days.into_iter().collect();
        self.explicit.byyearday = true;
        self
    }

    /// Sets `BYWEEKNO`.
    pub fn byweekno(mut self, weeks: impl IntoIterator<Item = i16>) -> Self {
        self.byweekno = weeks.into_iter().collect();
        self.explicit.byweekno = true;
        self
    }

    /// Sets `BYEASTER`, using this crate's default Gregorian computus.
    pub fn byeaster(self, offsets: impl IntoIterator<Item = i32>) -> Self {
        self.byeaster_with(easter_sunday, offsets)
    }

    /// Sets `BYEASTER` with a caller-supplied Easter Sunday calculator, for callers who
    /// want a different ecclesiastical calendar than this crate's default.
    pub fn byeaster_with(mut self, easter_fn: fn(i16) -> Date, offsets: impl IntoIterator<Item = i32>) -> Self {
        self.byeaster = offsets.into_iter().collect();
        self.easter_fn = easter_fn;
        self.explicit.byeaster = true;
        self
    }

    /// Sets `BYDAY`, accepting plain weekdays or `(weekday, n)` ordinal pairs via
    /// [`WeekdaySpec`]/[`Into<WeekdaySpec>`].
    pub fn byweekday(mut self, days: impl IntoIterator<Item = impl Into<WeekdaySpec>>) -> Self {
        self.byweekday_raw = days.into_iter().map(Into::into).collect();
        self.explicit.byweekday = true;
        self
    }

    /// Sets `BYHOUR`.
    pub fn byhour(mut self, hours: impl IntoIterator<Item = u8>) -> Self {
        self.byhour = Some(hours.into_iter().collect());
        self.explicit.byhour = true;
        self
    }

    /// Sets `BYMINUTE`.
    pub fn byminute(mut self, minutes: impl IntoIterator<Item = u8>) -> Self {
        self.byminute = Some(minutes.into_iter().collect());
        self.explicit.byminute = true;
        self
    }

    /// Sets `BYSECOND`.
    pub fn bysecond(mut self, seconds: impl IntoIterator<Item = u8>) -> Self {
        self.bysecond = Some(seconds.into_iter().collect());
        self.explicit.bysecond = true;
        self
    }
}

impl<Tz: Clone> RuleBuilder<Tz> {
    /// Normalizes and validates the accumulated fields, producing a [`Rule`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `count` and `until` are both set, `interval`
    /// is zero, any `bysetpos` entry is zero or out of `[-366, 366]`, or any `BYDAY` ordinal
    /// is zero.
    pub fn build(self) -> Result<Rule<Tz>, Error>
    where
        Tz: Default,
    {
        self.build_with_dtstart_default(Instant::default)
    }

    fn build_with_dtstart_default(self, default_dtstart: impl FnOnce() -> Instant<Tz>) -> Result<Rule<Tz>, Error> {
        if self.interval == 0 {
            return Err(Error::invalid_parameter("interval must be positive"));
        }
        if self.count.is_some() && self.until.is_some() {
            return Err(Error::invalid_parameter("count and until are mutually exclusive"));
        }
        for &pos in &self.bysetpos {
            if pos == 0 || !(-366..=366).contains(&pos) {
                return Err(Error::invalid_parameter("bysetpos must be nonzero and within [-366, 366]"));
            }
        }

        let dtstart = self.dtstart.unwrap_or_else(default_dtstart);

        let mut bymonth = self.bymonth;
        let mut byyearday = self.byyearday;
        let mut byweekno = self.byweekno;
        let mut byeaster = self.byeaster;

        let mut bymonthday: Vec<i16> = self.bymonthday_raw.iter().copied().filter(|&d| d > 0).collect();
        let mut bynmonthday: Vec<i16> = self.bymonthday_raw.iter().copied().filter(|&d| d < 0).collect();

        let mut byweekday: Vec<Weekday> = Vec::new();
        let mut bynweekday: Vec<(Weekday, i16)> = Vec::new();
        for spec in &self.byweekday_raw {
            match spec.ordinal() {
                Some(n) if self.freq <= Freq::Monthly => bynweekday.push((spec.weekday(), n)),
                _ => byweekday.push(spec.weekday()),
            }
        }

        let no_selector = byweekno.is_empty()
            && byyearday.is_empty()
            && bymonthday.is_empty()
            && bynmonthday.is_empty()
            && byweekday.is_empty()
            && bynweekday.is_empty()
            && byeaster.is_empty();

        if no_selector {
            match self.freq {
                Freq::Yearly => {
                    if bymonth.is_empty() {
                        bymonth.push(dtstart_month(&dtstart));
                    }
                    bymonthday.push(dtstart_day(&dtstart) as i16);
                }
                Freq::Monthly => {
                    bymonthday.push(dtstart_day(&dtstart) as i16);
                }
                Freq::Weekly => {
                    byweekday.push(dtstart_weekday(&dtstart));
                }
                _ => {}
            }
        }

        let byhour = self.byhour.unwrap_or_else(|| {
            if self.freq < Freq::Hourly {
                vec![dtstart_hour(&dtstart)]
            } else {
                Vec::new()
            }
        });
        let byminute = self.byminute.unwrap_or_else(|| {
            if self.freq < Freq::Minutely {
                vec![dtstart_minute(&dtstart)]
            } else {
                Vec::new()
            }
        });
        let bysecond = self.bysecond.unwrap_or_else(|| {
            if self.freq < Freq::Secondly {
                vec![dtstart_second(&dtstart)]
            } else {
                Vec::new()
            }
        });

        dedup_sorted(&mut bymonth);
        dedup_sorted(&mut bymonthday);
        dedup_sorted(&mut bynmonthday);
        dedup_sorted(&mut byyearday);
        dedup_sorted(&mut byweekno);
        dedup_sorted(&mut byeaster);
        let mut byweekday = byweekday;
        byweekday.sort_unstable();
        byweekday.dedup();
        let mut bynweekday = bynweekday;
        bynweekday.sort_unstable();
        bynweekday.dedup();
        let mut byhour = byhour;
        dedup_sorted(&mut byhour);
        let mut byminute = byminute;
        dedup_sorted(&mut byminute);
        let mut bysecond = bysecond;
        dedup_sorted(&mut bysecond);
        let mut bysetpos = self.bysetpos;
        dedup_sorted(&mut bysetpos);

        Ok(Rule {
            freq: self.freq,
            dtstart,
            interval: self.interval,
            wkst: self.wkst,
            count: self.count,
            until: self.until,
            bysetpos,
            bymonth,
            bymonthday,
            bynmonthday,
            byyearday,
            byweekno,
            byeaster,
            byweekday,
            bynweekday,
            byhour,
            byminute,
            bysecond,
            easter_fn: self.easter_fn,
            explicit: self.explicit,
        })
    }
}

fn dtstart_month<Tz>(dt: &Instant<Tz>) -> u8 {
    dt.month()
}
fn dtstart_day<Tz>(dt: &Instant<Tz>) -> u8 {
    dt.day()
}
fn dtstart_weekday<Tz>(dt: &Instant<Tz>) -> Weekday {
    dt.date().weekday()
}
fn dtstart_hour<Tz>(dt: &Instant<Tz>) -> u8 {
    dt.hour()
}
fn dtstart_minute<Tz>(dt: &Instant<Tz>) -> u8 {
    dt.minute()
}
fn dtstart_second<Tz>(dt: &Instant<Tz>) -> u8 {
    dt.second()
}

#[cfg(feature = "std")]
impl RuleBuilder<NoTimeZone> {
    /// Normalizes and validates the accumulated fields, defaulting `dtstart` to the current
    /// time (truncated to seconds) if it was never set.
    pub fn build_or_now(self) -> Result<Rule<NoTimeZone>, Error> {
        self.build_with_dtstart_default(crate::instant::now)
    }
}
