//! The single-rule expander (component E): turns a [`Rule`] into an ascending stream of
//! [`Instant`]s.

use crate::freq::Freq;
use crate::gregorian;
use crate::instant::Instant;
use crate::iterinfo::IterInfo;
use crate::rule::Rule;
use crate::time::Time;
use crate::{Date, Error};

impl<Tz: Clone> Rule<Tz> {
    /// Expands this rule into its (possibly infinite) ascending stream of occurrences.
    pub fn iter(&self) -> RuleIter<'_, Tz> {
        RuleIter::new(self)
    }

    /// Total number of occurrences, or `-1` if the rule has neither `COUNT` nor `UNTIL`
    /// and is therefore infinite.
    pub fn count(&self) -> i64 {
        if self.until().is_none() && self.count_limit().is_none() {
            return -1;
        }
        self.iter().count() as i64
    }

    /// The occurrence at `index`, supporting negative indices counted from the end (which
    /// requires materializing the whole stream).
    pub fn at(&self, index: i64) -> Result<Instant<Tz>, Error> {
        crate::query::at(self.iter(), index)
    }

    /// The last occurrence before (or, if `inclusive`, at-or-before) `dt`.
    pub fn before(&self, dt: &Instant<Tz>, inclusive: bool) -> Option<Instant<Tz>> {
        crate::query::before(self.iter(), dt, inclusive)
    }

    /// The first occurrence after (or, if `inclusive`, at-or-after) `dt`.
    pub fn after(&self, dt: &Instant<Tz>, inclusive: bool) -> Option<Instant<Tz>> {
        crate::query::after(self.iter(), dt, inclusive)
    }

    /// All occurrences within `[start, end]`, or `(start, end)` if not `inclusive`.
    pub fn between(&self, start: &Instant<Tz>, end: &Instant<Tz>, inclusive: bool) -> Vec<Instant<Tz>> {
        crate::query::between(self.iter(), start, end, inclusive)
    }
}

/// Iterator over a single [`Rule`]'s occurrences, in strictly ascending order.
///
/// Mirrors the tick loop of this crate's reference algorithm: each call to [`next`](Iterator::next)
/// may advance the underlying year/month/day/time state several times before a candidate
/// survives every `BY*` filter, `UNTIL` bound, and the `dtstart` floor.
pub struct RuleIter<'r, Tz> {
    rule: &'r Rule<Tz>,
    ii: IterInfo,
    year: i32,
    month: u8,
    day: u8,
    hour: u32,
    minute: u32,
    second: u32,
    timeset: Vec<Time>,
    buffer: Vec<Instant<Tz>>,
    emitted: u32,
    finished: bool,
    started: bool,
}

impl<'r, Tz: Clone> RuleIter<'r, Tz> {
    fn new(rule: &'r Rule<Tz>) -> Self {
        let dtstart = rule.dtstart();
        let mut ii = IterInfo::new();
        ii.rebuild(dtstart.year(), dtstart.month(), rule);

        let timeset = if rule.freq < Freq::Hourly {
            full_timeset(rule)
        } else {
            Vec::new()
        };

        Self {
            rule,
            ii,
            year: dtstart.year() as i32,
            month: dtstart.month(),
            day: dtstart.day(),
            hour: dtstart.hour() as u32,
            minute: dtstart.minute() as u32,
            second: dtstart.second() as u32,
            timeset,
            buffer: Vec::new(),
            emitted: 0,
            finished: false,
            started: false,
        }
    }

    fn current_timeset(&self) -> Vec<Time> {
        match self.rule.freq {
            Freq::Hourly => hourly_timeset(self.rule, self.hour),
            Freq::Minutely => minutely_timeset(self.rule, self.hour, self.minute),
            Freq::Secondly => vec![Time::new(self.hour as u8, self.minute as u8, self.second as u8)],
            _ => self.timeset.clone(),
        }
    }

    /// Runs one tick of the underlying algorithm, appending any surviving candidates to
    /// `self.buffer` and setting `self.finished` if the expansion has run out.
    fn tick(&mut self) {
        if !self.started {
            self.started = true;
            let hour_rejects = !self.rule.byhour.is_empty() && !self.rule.byhour.contains(&(self.hour as u8));
            let minute_rejects = !self.rule.byminute.is_empty() && !self.rule.byminute.contains(&(self.minute as u8));
            let second_rejects = !self.rule.bysecond.is_empty() && !self.rule.bysecond.contains(&(self.second as u8));
            let needs_timeset = match self.rule.freq {
                Freq::Hourly => hour_rejects,
                Freq::Minutely => hour_rejects || minute_rejects,
                Freq::Secondly => hour_rejects || minute_rejects || second_rejects,
                _ => false,
            };
            let timeset = if needs_timeset { Vec::new() } else { self.current_timeset() };
            self.timeset = timeset;
        }

        let (dayset, start, end) = self.dayset();
        let mut filtered_any = false;
        let mut candidates: Vec<i32> = Vec::with_capacity(end.saturating_sub(start));
        for &i in &dayset[start..end] {
            let Some(i) = i else { continue };
            if self.day_is_filtered(i) {
                filtered_any = true;
            } else {
                candidates.push(i);
            }
        }

        let timeset = self.timeset.clone();
        let mut results: Vec<Instant<Tz>> = Vec::new();
        if !self.rule.bysetpos.is_empty() && !timeset.is_empty() {
            for &pos in &self.rule.bysetpos {
                let tlen = timeset.len() as i32;
                let (daypos, timepos) = if pos < 0 {
                    (pos.div_euclid(tlen), pos.rem_euclid(tlen))
                } else {
                    ((pos - 1).div_euclid(tlen), (pos - 1).rem_euclid(tlen))
                };
                let day_idx = if daypos >= 0 {
                    candidates.get(daypos as usize)
                } else {
                    let len = candidates.len() as i32;
                    let idx = len + daypos;
                    if idx >= 0 {
                        candidates.get(idx as usize)
                    } else {
                        None
                    }
                };
                if let (Some(&i), Some(&time)) = (day_idx, timeset.get(timepos as usize)) {
                    let date = Date::from_epoch_days(self.ii.yearordinal + i);
                    let instant = Instant::with_tz(date, time, self.rule.dtstart().tz().clone());
                    if !results.contains(&instant) {
                        results.push(instant);
                    }
                }
            }
            results.sort();
        } else {
            for i in candidates {
                let date = Date::from_epoch_days(self.ii.yearordinal + i);
                for &time in &timeset {
                    results.push(Instant::with_tz(date, time, self.rule.dtstart().tz().clone()));
                }
            }
        }

        for res in results {
            if let Some(until) = self.rule.until() {
                if res > *until {
                    self.finished = true;
                    return;
                }
            }
            if res >= *self.rule.dtstart() {
                if let Some(limit) = self.rule.count_limit() {
                    if self.emitted >= limit {
                        self.finished = true;
                        return;
                    }
                }
                self.emitted += 1;
                self.buffer.push(res);
                if let Some(limit) = self.rule.count_limit() {
                    if self.emitted >= limit {
                        self.finished = true;
                        return;
                    }
                }
            }
        }

        self.advance(filtered_any);
    }

    fn dayset(&mut self) -> (Vec<Option<i32>>, usize, usize) {
        match self.rule.freq {
            Freq::Yearly => {
                let (s, e) = self.ii.ydayset();
                ((s..e).map(|i| Some(i as i32)).collect(), 0, e - s)
            }
            Freq::Monthly => {
                let (s, e) = self.ii.mdayset(self.month);
                let mut set = vec![None; self.ii.yearlen as usize];
                for i in s..e {
                    set[i] = Some(i as i32);
                }
                (set, s, e)
            }
            Freq::Weekly => {
                let today = (gregorian::date_to_epoch_days(self.year as i16, self.month, self.day) - self.ii.yearordinal) as usize;
                let (s, e) = self.ii.wdayset(today, self.rule.wkst);
                let mut set = vec![None; self.ii.yearlen as usize + 7];
                for i in s..e {
                    set[i] = Some(i as i32);
                }
                (set, s, e)
            }
            Freq::Daily | Freq::Hourly | Freq::Minutely | Freq::Secondly => {
                let today = (gregorian::date_to_epoch_days(self.year as i16, self.month, self.day) - self.ii.yearordinal) as usize;
                let (s, e) = self.ii.ddayset(today);
                let mut set = vec![None; self.ii.yearlen as usize];
                set[today] = Some(today as i32);
                (set, s, e)
            }
        }
    }

    /// Whether day-of-year index `i` fails any of the configured `BY*` filters (other than
    /// `BYHOUR`/`BYMINUTE`/`BYSECOND`, which filter the time-set, not the day-set).
    fn day_is_filtered(&self, i: i32) -> bool {
        let rule = self.rule;
        let idx = i as usize;
        if !rule.bymonth.is_empty() && !rule.bymonth.contains(&self.ii.month_at(idx)) {
            return true;
        }
        if !rule.byweekno.is_empty() && !self.ii.weekno_matches(idx) {
            return true;
        }
        if !rule.byweekday.is_empty() && !rule.byweekday.contains(&self.ii.weekday_at(i)) {
            return true;
        }
        if !rule.bynweekday.is_empty() && !self.ii.nweekday_matches(idx) {
            return true;
        }
        if !rule.byeaster.is_empty() && !self.ii.easter_matches(idx) {
            return true;
        }
        if !rule.bymonthday.is_empty() || !rule.bynmonthday.is_empty() {
            let mday = self.ii.mday_at(idx);
            let nmday = self.ii.nmday_at(idx);
            if !rule.bymonthday.contains(&mday) && !rule.bynmonthday.contains(&nmday) {
                return true;
            }
        }
        if !rule.byyearday.is_empty() {
            let yearlen = self.ii.yearlen as i32;
            let matches = if i < yearlen {
                rule.byyearday.contains(&((i + 1) as i16)) || rule.byyearday.contains(&((-yearlen + i) as i16))
            } else {
                let nextyearlen = self.ii.nextyearlen as i32;
                rule.byyearday.contains(&((i + 1 - yearlen) as i16)) || rule.byyearday.contains(&((-nextyearlen + i - yearlen) as i16))
            };
            if !matches {
                return true;
            }
        }
        false
    }

    fn advance(&mut self, filtered: bool) {
        let interval = self.rule.interval as i32;
        let mut fixday = false;

        match self.rule.freq {
            Freq::Yearly => {
                self.year += interval;
                if self.year > i16::MAX as i32 {
                    self.finished = true;
                    return;
                }
                self.ii.rebuild(self.year as i16, self.month, self.rule);
            }
            Freq::Monthly => {
                let mut month = self.month as i32 + interval;
                if month > 12 {
                    let div = (month - 1).div_euclid(12);
                    let m = (month - 1).rem_euclid(12) + 1;
                    month = m;
                    self.year += div;
                    if self.year > i16::MAX as i32 {
                        self.finished = true;
                        return;
                    }
                }
                self.month = month as u8;
                self.ii.rebuild(self.year as i16, self.month, self.rule);
            }
            Freq::Weekly => {
                let weekday = Date::new(self.year as i16, self.month, self.day).weekday().index() as i32;
                let wkst = self.rule.wkst.index() as i32;
                let delta = if wkst > weekday {
                    -(weekday + 1 + (6 - wkst)) + interval * 7
                } else {
                    -(weekday - wkst) + interval * 7
                };
                self.bump_day(delta);
                fixday = true;
            }
            Freq::Daily => {
                self.bump_day(interval);
                fixday = true;
            }
            Freq::Hourly => {
                let mut hour = self.hour as i32;
                if filtered {
                    hour += ((23 - hour) / interval) * interval;
                }
                loop {
                    hour += interval;
                    let div = hour.div_euclid(24);
                    if div != 0 {
                        hour = hour.rem_euclid(24);
                        self.bump_day(div);
                        fixday = true;
                        if self.finished {
                            return;
                        }
                    }
                    if self.rule.byhour.is_empty() || self.rule.byhour.contains(&(hour as u8)) {
                        break;
                    }
                }
                self.hour = hour as u32;
                self.timeset = hourly_timeset(self.rule, self.hour);
            }
            Freq::Minutely => {
                let mut minute = self.minute as i32;
                let mut hour = self.hour as i32;
                let mut filtered = filtered;
                if filtered {
                    minute += ((1439 - (hour * 60 + minute)) / interval) * interval;
                }
                loop {
                    minute += interval;
                    let div = minute.div_euclid(60);
                    if div != 0 {
                        minute = minute.rem_euclid(60);
                        hour += div;
                        let hdiv = hour.div_euclid(24);
                        if hdiv != 0 {
                            hour = hour.rem_euclid(24);
                            self.bump_day(hdiv);
                            fixday = true;
                            filtered = false;
                        }
                    }
                    if (self.rule.byhour.is_empty() || self.rule.byhour.contains(&(hour as u8)))
                        && (self.rule.byminute.is_empty() || self.rule.byminute.contains(&(minute as u8)))
                    {
                        break;
                    }
                }
                self.hour = hour as u32;
                self.minute = minute as u32;
                self.timeset = minutely_timeset(self.rule, self.hour, self.minute);
            }
            Freq::Secondly => {
                let mut second = self.second as i32;
                let mut minute = self.minute as i32;
                let mut hour = self.hour as i32;
                if filtered {
                    second += ((86399 - (hour * 3600 + minute * 60 + second)) / interval) * interval;
                }
                loop {
                    second += interval;
                    let div = second.div_euclid(60);
                    if div != 0 {
                        second = second.rem_euclid(60);
                        minute += div;
                        let mdiv = minute.div_euclid(60);
                        if mdiv != 0 {
                            minute = minute.rem_euclid(60);
                            hour += mdiv;
                            let hdiv = hour.div_euclid(24);
                            if hdiv != 0 {
                                hour = hour.rem_euclid(24);
                                self.bump_day(hdiv);
                                fixday = true;
                            }
                        }
                    }
                    if (self.rule.byhour.is_empty() || self.rule.byhour.contains(&(hour as u8)))
                        && (self.rule.byminute.is_empty() || self.rule.byminute.contains(&(minute as u8)))
                        && (self.rule.bysecond.is_empty() || self.rule.bysecond.contains(&(second as u8)))
                    {
                        break;
                    }
                }
                self.hour = hour as u32;
                self.minute = minute as u32;
                self.second = second as u32;
                self.timeset = vec![Time::new(self.hour as u8, self.minute as u8, self.second as u8)];
            }
        }

        if self.finished {
            return;
        }
        if fixday {
            self.ii.rebuild(self.year as i16, self.month, self.rule);
        }
    }

    /// Adds `delta` days to the tracked `(year, month, day)` via a full epoch-day round
    /// trip, so the result is always a valid calendar date with no separate normalization
    /// pass required. Sets `self.finished` if the result falls outside the representable
    /// year range.
    fn bump_day(&mut self, delta: i32) {
        let days = gregorian::date_to_epoch_days(self.year as i16, self.month, self.day) + delta;
        if days < gregorian::MIN_EPOCH_DAYS || days > gregorian::MAX_EPOCH_DAYS {
            self.finished = true;
            return;
        }
        let (year, month, day) = gregorian::date_from_epoch_days(days);
        self.year = year as i32;
        self.month = month;
        self.day = day;
    }
}

impl<'r, Tz: Clone> Iterator for RuleIter<'r, Tz> {
    type Item = Instant<Tz>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.is_empty() && !self.finished {
            self.tick();
        }
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer.remove(0))
        }
    }
}

fn full_timeset<Tz>(rule: &Rule<Tz>) -> Vec<Time> {
    let mut set = Vec::with_capacity(rule.byhour.len() * rule.byminute.len() * rule.bysecond.len());
    for &h in &rule.byhour {
        for &m in &rule.byminute {
            for &s in &rule.bysecond {
                set.push(Time::new(h, m, s));
            }
        }
    }
    set.sort();
    set
}

fn hourly_timeset<Tz>(rule: &Rule<Tz>, hour: u32) -> Vec<Time> {
    let mut set = Vec::with_capacity(rule.byminute.len() * rule.bysecond.len());
    for &m in &rule.byminute {
        for &s in &rule.bysecond {
            set.push(Time::new(hour as u8, m, s));
        }
    }
    set.sort();
    set
}

fn minutely_timeset<Tz>(rule: &Rule<Tz>, hour: u32, minute: u32) -> Vec<Time> {
    let mut set: Vec<Time> = rule.bysecond.iter().map(|&s| Time::new(hour as u8, minute as u8, s)).collect();
    set.sort();
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Freq as F, RuleBuilder, Time as T, Weekday};

    fn dt(y: i16, m: u8, d: u8, h: u8, mi: u8, s: u8) -> Instant {
        Instant::new(Date::new(y, m, d), T::new(h, mi, s))
    }

    #[test]
    fn daily_with_count() {
        let rule = RuleBuilder::new(F::Daily).dtstart(dt(2013, 1, 1, 9, 0, 0)).count(3).build().unwrap();
        let got: Vec<_> = rule.iter().collect();
        assert_eq!(
            got,
            vec![dt(2013, 1, 1, 9, 0, 0), dt(2013, 1, 2, 9, 0, 0), dt(2013, 1, 3, 9, 0, 0)]
        );
    }

    #[test]
    fn weekly_byday_multiple_weekdays() {
        let rule = RuleBuilder::new(F::Weekly)
            .dtstart(dt(2013, 1, 1, 9, 0, 0)) // Tuesday
            .byweekday([Weekday::Tuesday, Weekday::Thursday])
            .count(4)
            .build()
            .unwrap();
        let got: Vec<_> = rule.iter().collect();
        assert_eq!(
            got,
            vec![
                dt(2013, 1, 1, 9, 0, 0),
                dt(2013, 1, 3, 9, 0, 0),
                dt(2013, 1, 8, 9, 0, 0),
                dt(2013, 1, 10, 9, 0, 0),
            ]
        );
    }

    #[test]
    fn monthly_bymonthday_negative() {
        let rule = RuleBuilder::new(F::Monthly)
            .dtstart(dt(2013, 1, 1, 9, 0, 0))
            .bymonthday([-1])
            .count(3)
            .build()
            .unwrap();
        let got: Vec<_> = rule.iter().collect();
        assert_eq!(
            got,
            vec![dt(2013, 1, 31, 9, 0, 0), dt(2013, 2, 28, 9, 0, 0), dt(2013, 3, 31, 9, 0, 0)]
        );
    }

    #[test]
    fn yearly_until_excludes_boundary() {
        let rule = RuleBuilder::new(F::Yearly)
            .dtstart(dt(2013, 1, 1, 9, 0, 0))
            .until(dt(2015, 1, 1, 9, 0, 0))
            .build()
            .unwrap();
        let got: Vec<_> = rule.iter().collect();
        assert_eq!(
            got,
            vec![dt(2013, 1, 1, 9, 0, 0), dt(2014, 1, 1, 9, 0, 0), dt(2015, 1, 1, 9, 0, 0)]
        );
    }

    #[test]
    fn secondly_byhour_rejects_initial_instant_outside_byhour() {
        let rule = RuleBuilder::new(F::Secondly)
            .dtstart(dt(2013, 1, 1, 9, 0, 0))
            .byhour([10])
            .count(1)
            .build()
            .unwrap();
        let got: Vec<_> = rule.iter().take(1).collect();
        assert_eq!(got, vec![dt(2013, 1, 1, 10, 0, 0)]);
    }

    #[test]
    fn bysetpos_last_weekday_of_month() {
        let rule = RuleBuilder::new(F::Monthly)
            .dtstart(dt(2013, 1, 1, 9, 0, 0))
            .byweekday([Weekday::Monday, Weekday::Tuesday, Weekday::Wednesday, Weekday::Thursday, Weekday::Friday])
            .bysetpos([-1])
            .count(2)
            .build()
            .unwrap();
        let got: Vec<_> = rule.iter().collect();
        assert_eq!(got, vec![dt(2013, 1, 31, 9, 0, 0), dt(2013, 2, 28, 9, 0, 0)]);
    }
}
