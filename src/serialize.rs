//! The serializer (component I): the inverse of [`crate::parse`], producing canonical
//! RFC 5545 text for a [`Rule`] or [`RuleSet`].

use crate::instant::{Instant, NoTimeZone};
use crate::rule::Rule;
use crate::set::RuleSet;

/// How much of a rule's state to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Omits `UNTIL` and `DTSTART`; useful for comparing two rules' repeat pattern alone.
    RepetitionOnly,
    /// Includes the keys the caller explicitly set (plus non-default `INTERVAL`), and
    /// `UNTIL`/`DTSTART` if present. The default round-trip mode.
    Normal,
    /// Includes every `BY*` with a non-empty value, even ones this crate defaulted from
    /// `dtstart` rather than the caller setting.
    FullyResolved,
}

const DATETIME_FORMAT_LEN: usize = 15;

fn format_datetime(dt: &Instant<NoTimeZone>) -> String {
    let mut s = String::with_capacity(DATETIME_FORMAT_LEN);
    s.push_str(&format!(
        "{:04}{:02}{:02}T{:02}{:02}{:02}",
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    ));
    s
}

fn push_list<T: core::fmt::Display>(parts: &mut Vec<String>, name: &str, values: &[T]) {
    let joined = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",");
    parts.push(format!("{name}={joined}"));
}

/// Serializes a rule's `KEY=VAL;...` body (no `RRULE:`/`EXRULE:` prefix, no `DTSTART` line).
pub fn serialize_rule(rule: &Rule<NoTimeZone>, verbosity: Verbosity) -> String {
    let explicit = &rule.explicit;
    let mut parts = vec![format!("FREQ={}", rule.freq())];

    let fully_resolved = verbosity == Verbosity::FullyResolved;

    if explicit.wkst || fully_resolved {
        parts.push(format!("WKST={}", rule.wkst()));
    }
    if let Some(count) = rule.count_limit() {
        parts.push(format!("COUNT={count}"));
    }
    if explicit.bysetpos || (fully_resolved && !rule.bysetpos.is_empty()) {
        push_list(&mut parts, "BYSETPOS", &rule.bysetpos);
    }
    if explicit.bymonth || (fully_resolved && !rule.bymonth.is_empty()) {
        push_list(&mut parts, "BYMONTH", &rule.bymonth);
    }
    if explicit.bymonthday || (fully_resolved && (!rule.bymonthday.is_empty() || !rule.bynmonthday.is_empty())) {
        let mut combined: Vec<i16> = rule.bymonthday.iter().chain(rule.bynmonthday.iter()).copied().collect();
        combined.sort_unstable();
        push_list(&mut parts, "BYMONTHDAY", &combined);
    }
    if explicit.byyearday || (fully_resolved && !rule.byyearday.is_empty()) {
        push_list(&mut parts, "BYYEARDAY", &rule.byyearday);
    }
    if explicit.byweekno || (fully_resolved && !rule.byweekno.is_empty()) {
        push_list(&mut parts, "BYWEEKNO", &rule.byweekno);
    }
    if explicit.byeaster || (fully_resolved && !rule.byeaster.is_empty()) {
        push_list(&mut parts, "BYEASTER", &rule.byeaster);
    }
    let byday = rule.byday_specs();
    if explicit.byweekday || (fully_resolved && !byday.is_empty()) {
        push_list(&mut parts, "BYDAY", &byday);
    }
    if explicit.byhour || (fully_resolved && !rule.byhour.is_empty()) {
        push_list(&mut parts, "BYHOUR", &rule.byhour);
    }
    if explicit.byminute || (fully_resolved && !rule.byminute.is_empty()) {
        push_list(&mut parts, "BYMINUTE", &rule.byminute);
    }
    if explicit.bysecond || (fully_resolved && !rule.bysecond.is_empty()) {
        push_list(&mut parts, "BYSECOND", &rule.bysecond);
    }

    if fully_resolved || rule.interval() != 1 {
        parts.push(format!("INTERVAL={}", rule.interval()));
    }
    if verbosity != Verbosity::RepetitionOnly {
        if let Some(until) = rule.until() {
            parts.push(format!("UNTIL={}", format_datetime(until)));
        }
    }
    parts.join(";")
}

fn serialize_with_context(rule: &Rule<NoTimeZone>, context: &str, verbosity: Verbosity) -> String {
    let mut out = String::new();
    if verbosity != Verbosity::RepetitionOnly {
        out.push_str("DTSTART:");
        out.push_str(&format_datetime(rule.dtstart()));
        out.push('\n');
    }
    out.push_str(context);
    out.push(':');
    out.push_str(&serialize_rule(rule, verbosity));
    out
}

impl Rule<NoTimeZone> {
    /// Renders this rule as RFC 5545 text (`DTSTART:...` followed by `RRULE:...`), at
    /// [`Verbosity::Normal`].
    pub fn to_rfc_string(&self) -> String {
        serialize_with_context(self, "RRULE", Verbosity::Normal)
    }

    /// Renders this rule at the given [`Verbosity`].
    pub fn to_rfc_string_with(&self, verbosity: Verbosity) -> String {
        serialize_with_context(self, "RRULE", verbosity)
    }
}

impl RuleSet<NoTimeZone> {
    /// Renders this set as RFC 5545 text: one `DTSTART`/`RRULE`/`EXRULE` block per rule,
    /// plus one `RDATE`/`EXDATE` line per explicit date, joined with CRLF.
    pub fn to_rfc_string(&self) -> String {
        let mut lines = Vec::new();
        for rule in self.rrules() {
            lines.push(serialize_with_context(rule, "RRULE", Verbosity::Normal));
        }
        for rule in self.exrules() {
            lines.push(serialize_with_context(rule, "EXRULE", Verbosity::Normal));
        }
        if !self.rdates().is_empty() {
            let values: Vec<String> = self.rdates().iter().map(format_datetime).collect();
            lines.push(format!("RDATE:{}", values.join(",")));
        }
        if !self.exdates().is_empty() {
            let values: Vec<String> = self.exdates().iter().map(format_datetime).collect();
            lines.push(format!("EXDATE:{}", values.join(",")));
        }
        lines.join("\r\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Date, Freq, RuleBuilder, Time};

    fn dt(y: i16, m: u8, d: u8, h: u8, mi: u8, s: u8) -> Instant<NoTimeZone> {
        Instant::new(Date::new(y, m, d), Time::new(h, mi, s))
    }

    #[test]
    fn weekly_with_count_round_trips_through_rfc_string() {
        let rule = RuleBuilder::new(Freq::Weekly)
            .dtstart(dt(2013, 1, 1, 9, 0, 0))
            .count(3)
            .build()
            .unwrap();
        let text = rule.to_rfc_string();
        assert_eq!(text, "DTSTART:20130101T090000\nRRULE:FREQ=WEEKLY;COUNT=3");

        let reparsed = crate::parse::parse(&text).unwrap();
        match reparsed {
            crate::parse::Parsed::Rule(r2) => {
                assert_eq!(r2.iter().collect::<Vec<_>>(), rule.iter().collect::<Vec<_>>());
            }
            crate::parse::Parsed::Set(_) => panic!("expected a rule"),
        }
    }

    #[test]
    fn repetition_only_omits_dtstart_and_until() {
        let rule = RuleBuilder::new(Freq::Daily)
            .dtstart(dt(2020, 1, 1, 0, 0, 0))
            .until(dt(2020, 2, 1, 0, 0, 0))
            .build()
            .unwrap();
        let text = rule.to_rfc_string_with(Verbosity::RepetitionOnly);
        assert!(!text.contains("DTSTART"));
        assert!(!text.contains("UNTIL"));
        assert_eq!(text, "RRULE:FREQ=DAILY");
    }

    #[test]
    fn fully_resolved_includes_defaulted_byhour() {
        let rule = RuleBuilder::new(Freq::Weekly).dtstart(dt(2013, 1, 1, 9, 0, 0)).build().unwrap();
        let text = rule.to_rfc_string_with(Verbosity::FullyResolved);
        assert!(text.contains("BYHOUR=9"));
        assert!(text.contains("BYDAY=TU"));
    }

    #[test]
    fn normal_mode_omits_implicit_defaults() {
        let rule = RuleBuilder::new(Freq::Weekly).dtstart(dt(2013, 1, 1, 9, 0, 0)).build().unwrap();
        let text = rule.to_rfc_string();
        assert!(!text.contains("BYHOUR"));
        assert!(!text.contains("BYDAY"));
    }

    #[test]
    fn set_serializes_each_component_on_its_own_line() {
        let mut set = RuleSet::new();
        set.add_rrule(
            RuleBuilder::new(Freq::Daily)
                .dtstart(dt(2020, 1, 1, 9, 0, 0))
                .count(3)
                .build()
                .unwrap(),
        );
        set.add_exdate(dt(2020, 1, 2, 9, 0, 0));
        let text = set.to_rfc_string();
        assert!(text.contains("RRULE:FREQ=DAILY;COUNT=3"));
        assert!(text.contains("EXDATE:20200102T090000"));
        assert_eq!(text.lines().count(), 3);
    }
}
