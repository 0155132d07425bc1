//! Per-year/per-month derived masks (component B), and the day-set selectors that read
//! them (component C).
//!
//! [`IterInfo`] is mutable scratch owned by a single expansion; it is rebuilt whenever the
//! year or month being examined changes, and is never shared across concurrent iterators.

use crate::freq::Freq;
use crate::gregorian;
use crate::rule::Rule;
use crate::tables::{self, YearTables};
use crate::Weekday;

pub(crate) struct IterInfo {
    lastyear: Option<i16>,
    lastmonth: Option<u8>,
    pub(crate) yearlen: u16,
    pub(crate) nextyearlen: u16,
    /// Epoch-day number of January 1st of the current year.
    pub(crate) yearordinal: i32,
    yearweekday: Weekday,
    mmask: &'static [u8],
    mdaymask: &'static [i16],
    nmdaymask: &'static [i16],
    mrange: &'static [u16; 13],
    wnomask: Option<Vec<u8>>,
    nwdaymask: Option<Vec<u8>>,
    eastermask: Option<Vec<u8>>,
}

impl IterInfo {
    pub(crate) fn new() -> Self {
        Self {
            lastyear: None,
            lastmonth: None,
            yearlen: 365,
            nextyearlen: 365,
            yearordinal: 0,
            yearweekday: Weekday::Monday,
            mmask: &tables::M365MASK,
            mdaymask: &tables::MDAY365MASK,
            nmdaymask: &tables::NMDAY365MASK,
            mrange: &tables::M365RANGE,
            wnomask: None,
            nwdaymask: None,
            eastermask: None,
        }
    }

    /// Month of the given day-of-year index, `1..=12`.
    #[inline]
    pub(crate) fn month_at(&self, i: usize) -> u8 {
        self.mmask[i]
    }

    /// Weekday of the given day-of-year index, derived from `yearweekday` rather than a
    /// materialized table: index 0 always has weekday `yearweekday`. `i` may be negative or
    /// past the end of the year; the weekday cycle is periodic in 7 regardless.
    #[inline]
    pub(crate) fn weekday_at(&self, i: i32) -> Weekday {
        let idx = (self.yearweekday.index() as i32 + i).rem_euclid(7);
        Weekday::from_index(idx as u8).expect("rem_euclid(7) is always in 0..7")
    }

    #[inline]
    pub(crate) fn mday_at(&self, i: usize) -> i16 {
        self.mdaymask[i]
    }

    #[inline]
    pub(crate) fn nmday_at(&self, i: usize) -> i16 {
        self.nmdaymask[i]
    }

    #[inline]
    pub(crate) fn weekno_matches(&self, i: usize) -> bool {
        self.wnomask.as_ref().map(|m| m[i] == 1).unwrap_or(false)
    }

    #[inline]
    pub(crate) fn nweekday_matches(&self, i: usize) -> bool {
        self.nwdaymask.as_ref().map(|m| i < m.len() && m[i] == 1).unwrap_or(false)
    }

    #[inline]
    pub(crate) fn easter_matches(&self, i: usize) -> bool {
        self.eastermask.as_ref().map(|m| i < m.len() && m[i] == 1).unwrap_or(false)
    }

    /// Rebuilds the year-level (and, if needed, month-level) derived masks for `(year,
    /// month)`. A no-op for the parts whose memoization key hasn't changed.
    pub(crate) fn rebuild<Tz>(&mut self, year: i16, month: u8, rule: &Rule<Tz>) {
        if self.lastyear != Some(year) {
            self.yearlen = year_len(year);
            self.nextyearlen = year_len(year + 1);
            self.yearordinal = gregorian::date_to_epoch_days(year, 1, 1);
            let jan1_weekday_idx = gregorian::iso_weekday_from_days(self.yearordinal);
            self.yearweekday = Weekday::from_index(jan1_weekday_idx).expect("iso weekday is always 0..=6");

            let YearTables {
                mmask,
                mdaymask,
                nmdaymask,
                mrange,
            } = tables::tables_for(self.yearlen == 366);
            self.mmask = mmask;
            self.mdaymask = mdaymask;
            self.nmdaymask = nmdaymask;
            self.mrange = mrange;

            self.wnomask = if rule.byweekno.is_empty() {
                None
            } else {
                Some(self.build_wnomask(year, rule))
            };
        }

        if !rule.bynweekday.is_empty() && (self.lastmonth != Some(month) || self.lastyear != Some(year)) {
            self.nwdaymask = self.build_nwdaymask(rule, month);
        }

        if !rule.byeaster.is_empty() && self.lastyear != Some(year) {
            let mut mask = vec![0u8; self.yearlen as usize + 7];
            let easter_day = (rule.easter_fn)(year).epoch_days() - self.yearordinal;
            for &offset in &rule.byeaster {
                let idx = easter_day + offset;
                if idx >= 0 && (idx as usize) < mask.len() {
                    mask[idx as usize] = 1;
                }
            }
            self.eastermask = Some(mask);
        }

        self.lastyear = Some(year);
        self.lastmonth = Some(month);
    }

    fn build_wnomask<Tz>(&self, year: i16, rule: &Rule<Tz>) -> Vec<u8> {
        let mut wnomask = vec![0u8; self.yearlen as usize + 7];
        let wkst = rule.wkst.index() as i32;
        let yearweekday = self.yearweekday.index() as i32;

        let firstwkst = (7 - yearweekday + wkst).rem_euclid(7);
        let mut no1wkst = firstwkst;
        let wyearlen = if no1wkst >= 4 {
            no1wkst = 0;
            self.yearlen as i32 + (yearweekday - wkst).rem_euclid(7)
        } else {
            self.yearlen as i32 - no1wkst
        };
        let numweeks = wyearlen / 7 + (wyearlen % 7) / 4;

        let weekday_at = |i: i32| -> i32 { (yearweekday + i).rem_euclid(7) };

        for &n in &rule.byweekno {
            let mut n = n as i32;
            if n < 0 {
                n += numweeks + 1;
            }
            if !(0 < n && n <= numweeks) {
                continue;
            }
            let mut i = if n > 1 {
                let mut i = no1wkst + (n - 1) * 7;
                if no1wkst != firstwkst {
                    i -= 7 - firstwkst;
                }
                i
            } else {
                no1wkst
            };
            for _ in 0..7 {
                if i >= 0 && (i as usize) < wnomask.len() {
                    wnomask[i as usize] = 1;
                }
                i += 1;
                if weekday_at(i) == wkst {
                    break;
                }
            }
        }

        if rule.byweekno.contains(&1) {
            let mut i = no1wkst + numweeks * 7;
            if no1wkst != firstwkst {
                i -= 7 - firstwkst;
            }
            if i < self.yearlen as i32 {
                for _ in 0..7 {
                    if i >= 0 && (i as usize) < wnomask.len() {
                        wnomask[i as usize] = 1;
                    }
                    i += 1;
                    if weekday_at(i) == wkst {
                        break;
                    }
                }
            }
        }

        if no1wkst != 0 && !rule.byweekno.contains(&-1) {
            let lyearweekday_idx = gregorian::iso_weekday_from_days(gregorian::date_to_epoch_days(year - 1, 1, 1)) as i32;
            let lno1wkst = (7 - lyearweekday_idx + wkst).rem_euclid(7);
            let lyearlen = year_len(year - 1) as i32;
            let lnumweeks = if lno1wkst >= 4 {
                52 + (lyearlen + (lyearweekday_idx - wkst).rem_euclid(7)) % 7 / 4
            } else {
                52 + (self.yearlen as i32 - no1wkst) % 7 / 4
            };
            if rule.byweekno.contains(&(lnumweeks as i16)) {
                for i in 0..no1wkst {
                    wnomask[i as usize] = 1;
                }
            }
        }

        wnomask
    }

    fn build_nwdaymask<Tz>(&self, rule: &Rule<Tz>, month: u8) -> Option<Vec<u8>> {
        let ranges: Vec<(i32, i32)> = match rule.freq {
            Freq::Yearly => {
                if rule.bymonth.is_empty() {
                    vec![(0, self.yearlen as i32)]
                } else {
                    rule.bymonth
                        .iter()
                        .map(|&m| (self.mrange[m as usize - 1] as i32, self.mrange[m as usize] as i32))
                        .collect()
                }
            }
            Freq::Monthly => vec![(self.mrange[month as usize - 1] as i32, self.mrange[month as usize] as i32)],
            _ => return None,
        };

        let mut mask = vec![0u8; self.yearlen as usize];
        for (first, last_exclusive) in ranges {
            let last = last_exclusive - 1;
            for &(weekday, n) in &rule.bynweekday {
                let wday = weekday.index() as i32;
                let i = if n < 0 {
                    let mut i = last + (n as i32 + 1) * 7;
                    i -= (self.weekday_at(i).index() as i32 - wday).rem_euclid(7);
                    i
                } else {
                    let mut i = first + (n as i32 - 1) * 7;
                    i += (7 - self.weekday_at(i).index() as i32 + wday).rem_euclid(7);
                    i
                };
                if first <= i && i <= last {
                    mask[i as usize] = 1;
                }
            }
        }
        Some(mask)
    }

    // --- Day-set selectors (component C). Each returns the inclusive-start/exclusive-end
    // bounds of the candidate window; the caller filters within `[start, end)`.

    pub(crate) fn ydayset(&self) -> (usize, usize) {
        (0, self.yearlen as usize)
    }

    pub(crate) fn mdayset(&self, month: u8) -> (usize, usize) {
        (self.mrange[month as usize - 1] as usize, self.mrange[month as usize] as usize)
    }

    /// Returns `(start, end)` of up to 7 consecutive day-of-year indices starting at
    /// `today`, stopping just before the next occurrence of `wkst`. May read into the
    /// 7-day overhang past year-end.
    pub(crate) fn wdayset(&self, today: usize, wkst: Weekday) -> (usize, usize) {
        let start = today;
        let mut i = today as i32;
        for _ in 0..7 {
            i += 1;
            if self.weekday_at(i) == wkst {
                break;
            }
        }
        (start, i as usize)
    }

    pub(crate) fn ddayset(&self, today: usize) -> (usize, usize) {
        (today, today + 1)
    }
}

fn year_len(year: i16) -> u16 {
    if gregorian::is_leap_year(year) {
        366
    } else {
        365
    }
}
