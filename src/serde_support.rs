//! Optional `serde` support (the `serde` feature).
//!
//! Follows this crate's reference date/time layer's own `serde` module: hand-written
//! string-based `Serialize`/`Deserialize` impls rather than deriving over raw fields, so the
//! wire format is a human-readable ISO-ish string instead of a struct-shaped blob. [`Rule`]
//! and [`RuleSet`] serialize through the RFC 5545 text the [`crate::parse`]/[`crate::serialize`]
//! modules already produce and consume, so the `serde` representation is just that text.

use serde::de::{self, Deserialize, Visitor};
use serde::ser::Serialize;

use crate::instant::{Instant, NoTimeZone};
use crate::parse::Parsed;
use crate::serialize::Verbosity;
use crate::set::RuleSet;
use crate::{Date, Rule, Time, Weekday};

fn parse_date(v: &str) -> Result<Date, alloc::string::String> {
    let bytes = v.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(alloc::format!("malformed date, expected YYYY-MM-DD, got: {v}"));
    }
    let year: i16 = v[0..4].parse().map_err(|_| alloc::format!("malformed year in: {v}"))?;
    let month: u8 = v[5..7].parse().map_err(|_| alloc::format!("malformed month in: {v}"))?;
    let day: u8 = v[8..10].parse().map_err(|_| alloc::format!("malformed day in: {v}"))?;
    Date::try_new(year, month, day).map_err(|e| alloc::format!("{e}"))
}

fn parse_time(v: &str) -> Result<Time, alloc::string::String> {
    let bytes = v.as_bytes();
    if bytes.len() != 8 || bytes[2] != b':' || bytes[5] != b':' {
        return Err(alloc::format!("malformed time, expected HH:MM:SS, got: {v}"));
    }
    let hour: u8 = v[0..2].parse().map_err(|_| alloc::format!("malformed hour in: {v}"))?;
    let minute: u8 = v[3..5].parse().map_err(|_| alloc::format!("malformed minute in: {v}"))?;
    let second: u8 = v[6..8].parse().map_err(|_| alloc::format!("malformed second in: {v}"))?;
    Time::try_new(hour, minute, second).map_err(|e| alloc::format!("{e}"))
}

fn parse_instant(v: &str) -> Result<Instant<NoTimeZone>, alloc::string::String> {
    let (date_part, time_part) = v
        .split_once('T')
        .ok_or_else(|| alloc::format!("malformed instant, expected YYYY-MM-DDTHH:MM:SS, got: {v}"))?;
    Ok(Instant::new(parse_date(date_part)?, parse_time(time_part)?))
}

impl Serialize for Date {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl Serialize for Time {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl Serialize for Weekday {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.rfc_code())
    }
}

impl Serialize for Instant<NoTimeZone> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

struct DateVisitor;

impl<'de> Visitor<'de> for DateVisitor {
    type Value = Date;

    fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
        formatter.write_str("a date string in YYYY-MM-DD format")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        parse_date(v).map_err(E::custom)
    }
}

struct TimeVisitor;

impl<'de> Visitor<'de> for TimeVisitor {
    type Value = Time;

    fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
        formatter.write_str("a time string in HH:MM:SS format")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        parse_time(v).map_err(E::custom)
    }
}

struct WeekdayVisitor;

impl<'de> Visitor<'de> for WeekdayVisitor {
    type Value = Weekday;

    fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
        formatter.write_str("a two-letter RFC 5545 weekday code (MO, TU, ..., SU)")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Weekday::from_rfc_code(v).ok_or_else(|| E::custom(alloc::format!("unknown weekday code: {v}")))
    }
}

struct InstantVisitor;

impl<'de> Visitor<'de> for InstantVisitor {
    type Value = Instant<NoTimeZone>;

    fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
        formatter.write_str("an instant string in YYYY-MM-DDTHH:MM:SS format")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        parse_instant(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(DateVisitor)
    }
}

impl<'de> Deserialize<'de> for Time {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(TimeVisitor)
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(WeekdayVisitor)
    }
}

impl<'de> Deserialize<'de> for Instant<NoTimeZone> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(InstantVisitor)
    }
}

/// Serializes as the fully-resolved RFC 5545 text (`DTSTART:...\nRRULE:...`), so the wire
/// representation round-trips through [`crate::parse::parse`] without losing any `BY*`
/// default this crate inferred from `dtstart`.
impl Serialize for Rule<NoTimeZone> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_rfc_string_with(Verbosity::FullyResolved))
    }
}

struct RuleVisitor;

impl<'de> Visitor<'de> for RuleVisitor {
    type Value = Rule<NoTimeZone>;

    fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
        formatter.write_str("RFC 5545 DTSTART/RRULE text for a single rule")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        match crate::parse::parse(v).map_err(|e| E::custom(alloc::format!("{e}")))? {
            Parsed::Rule(rule) => Ok(rule),
            Parsed::Set(_) => Err(E::custom("expected a single RRULE, found multiple properties")),
        }
    }
}

impl<'de> Deserialize<'de> for Rule<NoTimeZone> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(RuleVisitor)
    }
}

/// Serializes as the set's full RFC 5545 text (one `DTSTART`/`RRULE`/`EXRULE` line per
/// component rule, plus `RDATE`/`EXDATE` lines), joined with CRLF per [`RuleSet::to_rfc_string`].
impl Serialize for RuleSet<NoTimeZone> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_rfc_string())
    }
}

struct RuleSetVisitor;

impl<'de> Visitor<'de> for RuleSetVisitor {
    type Value = RuleSet<NoTimeZone>;

    fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
        formatter.write_str("RFC 5545 text for a composed set of rules and dates")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let options = crate::parse::ParseOptions { forceset: true, ..Default::default() };
        match crate::parse::parse_with(v, options).map_err(|e| E::custom(alloc::format!("{e}")))? {
            Parsed::Set(set) => Ok(set),
            Parsed::Rule(_) => unreachable!("forceset always yields a RuleSet"),
        }
    }
}

impl<'de> Deserialize<'de> for RuleSet<NoTimeZone> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(RuleSetVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Freq, RuleBuilder};

    #[test]
    fn date_round_trips_through_json() {
        let d = Date::new(2020, 2, 29);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"2020-02-29\"");
        assert_eq!(serde_json::from_str::<Date>(&json).unwrap(), d);
    }

    #[test]
    fn time_round_trips_through_json() {
        let t = Time::new(9, 5, 30);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"09:05:30\"");
        assert_eq!(serde_json::from_str::<Time>(&json).unwrap(), t);
    }

    #[test]
    fn weekday_round_trips_through_json() {
        let json = serde_json::to_string(&Weekday::Thursday).unwrap();
        assert_eq!(json, "\"TH\"");
        assert_eq!(serde_json::from_str::<Weekday>(&json).unwrap(), Weekday::Thursday);
    }

    #[test]
    fn instant_round_trips_through_json() {
        let dt = Instant::new(Date::new(2013, 1, 1), Time::new(9, 0, 0));
        let json = serde_json::to_string(&dt).unwrap();
        assert_eq!(json, "\"2013-01-01T09:00:00\"");
        assert_eq!(serde_json::from_str::<Instant<NoTimeZone>>(&json).unwrap(), dt);
    }

    #[test]
    fn rule_round_trips_through_json_and_enumerates_identically() {
        let rule = RuleBuilder::new(Freq::Weekly)
            .dtstart(Instant::new(Date::new(2013, 1, 1), Time::new(9, 0, 0)))
            .count(3)
            .build()
            .unwrap();
        let json = serde_json::to_string(&rule).unwrap();
        let reparsed: Rule<NoTimeZone> = serde_json::from_str(&json).unwrap();
        assert_eq!(rule.iter().collect::<alloc::vec::Vec<_>>(), reparsed.iter().collect::<alloc::vec::Vec<_>>());
    }

    #[test]
    fn ruleset_round_trips_through_json() {
        let mut set = RuleSet::new();
        set.add_rrule(
            RuleBuilder::new(Freq::Daily)
                .dtstart(Instant::new(Date::new(2020, 1, 1), Time::new(9, 0, 0)))
                .count(3)
                .build()
                .unwrap(),
        );
        set.add_exdate(Instant::new(Date::new(2020, 1, 2), Time::new(9, 0, 0)));
        let json = serde_json::to_string(&set).unwrap();
        let reparsed: RuleSet<NoTimeZone> = serde_json::from_str(&json).unwrap();
        assert_eq!(set.iter().collect::<alloc::vec::Vec<_>>(), reparsed.iter().collect::<alloc::vec::Vec<_>>());
    }
}
