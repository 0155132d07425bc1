//! The RFC 5545 text parser (component H): turns `RRULE`/`RDATE`/`EXRULE`/`EXDATE`/`DTSTART`
//! property lines into a [`Rule`] or [`RuleSet`].
//!
//! Defined only for [`NoTimeZone`], since the text grammar carries no timezone information
//! beyond an optional trailing `Z`. A caller with its own timezone layer builds a
//! `Rule<Tz>`/`RuleSet<Tz>` programmatically instead (see [`crate::RuleBuilder`]).

use crate::instant::{Instant, NoTimeZone};
use crate::rule::Rule;
use crate::set::RuleSet;
use crate::weekday_spec::WeekdaySpec;
use crate::{Date, Error, Freq, Time, Weekday};

/// Options controlling how RFC 5545 text is interpreted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Join continuation lines (starting with a space or tab) into their predecessor,
    /// per RFC 5545 §3.1's line-folding rule, before splitting on newlines.
    pub unfold: bool,
    /// Always return a [`RuleSet`], even for input that would otherwise parse to a bare
    /// [`Rule`].
    pub forceset: bool,
    /// Also insert the parsed `DTSTART` as an explicit `RDATE`, and imply both `unfold`
    /// and `forceset`. Matches the common need to treat the anchor instant as itself an
    /// occurrence.
    pub compatible: bool,
}

/// The result of parsing RFC 5545 text: either a single rule, or a composed set.
#[derive(Debug, Clone)]
pub enum Parsed {
    /// A single `RRULE`, with no other properties present.
    Rule(Rule<NoTimeZone>),
    /// A composition of multiple properties, or a single property under `forceset`.
    Set(RuleSet<NoTimeZone>),
}

/// Parses RFC 5545 text with default options (no unfolding, no forced set).
pub fn parse(text: &str) -> Result<Parsed, Error> {
    parse_with(text, ParseOptions::default())
}

/// Parses RFC 5545 text under the given [`ParseOptions`].
pub fn parse_with(text: &str, mut options: ParseOptions) -> Result<Parsed, Error> {
    if options.compatible {
        options.unfold = true;
        options.forceset = true;
    }

    let unfolded;
    let text = if options.unfold {
        unfolded = unfold(text);
        unfolded.as_str()
    } else {
        text
    };

    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return Err(Error::parse("empty input"));
    }

    let mut dtstart: Option<Instant<NoTimeZone>> = None;
    let mut rrule_lines: Vec<&str> = Vec::new();
    let mut exrule_lines: Vec<&str> = Vec::new();
    let mut rdates: Vec<Instant<NoTimeZone>> = Vec::new();
    let mut exdates: Vec<Instant<NoTimeZone>> = Vec::new();

    for line in lines {
        let (name, params, value) = split_line(line)?;
        if name.starts_with("X-") {
            continue;
        }
        match name {
            "DTSTART" => {
                check_value_param(&params, name)?;
                dtstart = Some(parse_datetime(value)?);
            }
            "RRULE" => rrule_lines.push(value),
            "EXRULE" => exrule_lines.push(value),
            "RDATE" => {
                check_value_param(&params, name)?;
                for part in value.split(',') {
                    rdates.push(parse_datetime(part)?);
                }
            }
            "EXDATE" => {
                check_value_param(&params, name)?;
                for part in value.split(',') {
                    exdates.push(parse_datetime(part)?);
                }
            }
            other => return Err(Error::unknown_property(other)),
        }
    }

    let bare_rrule =
        !options.forceset && rrule_lines.len() == 1 && exrule_lines.is_empty() && rdates.is_empty() && exdates.is_empty();

    if bare_rrule {
        let rule = parse_rrule_value(rrule_lines[0], dtstart)?;
        return Ok(Parsed::Rule(rule));
    }

    let mut set = RuleSet::new();
    for value in rrule_lines {
        set.add_rrule(parse_rrule_value(value, dtstart)?);
    }
    for value in exrule_lines {
        set.add_exrule(parse_rrule_value(value, dtstart)?);
    }
    for dt in rdates {
        set.add_rdate(dt);
    }
    for dt in exdates {
        set.add_exdate(dt);
    }
    if options.compatible {
        if let Some(dt) = dtstart {
            set.add_rdate(dt);
        }
    }
    Ok(Parsed::Set(set))
}

/// Joins continuation lines (starting with a space or tab) into their predecessor.
fn unfold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if (line.starts_with(' ') || line.starts_with('\t')) && !out.is_empty() {
            out.push_str(line.trim_start_matches([' ', '\t']));
        } else {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(line);
        }
    }
    out
}

/// Splits a property line `NAME[;KEY=VAL;...]:VALUE` into its name, parameter list, and value.
fn split_line(line: &str) -> Result<(&str, Vec<(&str, &str)>, &str), Error> {
    let colon = line.find(':').ok_or_else(|| Error::parse(format!("missing ':' in line: {line}")))?;
    let (head, value) = line.split_at(colon);
    let value = &value[1..];
    let mut parts = head.split(';');
    let name = parts.next().unwrap_or("");
    let mut params = Vec::new();
    for part in parts {
        let (key, val) = part
            .split_once('=')
            .ok_or_else(|| Error::parse(format!("malformed parameter: {part}")))?;
        params.push((key, val));
    }
    Ok((name, params, value))
}

fn check_value_param(params: &[(&str, &str)], property: &str) -> Result<(), Error> {
    for &(key, val) in params {
        if key == "VALUE" && val != "DATE-TIME" {
            return Err(Error::unsupported_parameter(format!("{property} VALUE={val} is not supported")));
        }
    }
    Ok(())
}

/// Parses an `RRULE`/`EXRULE` value (`KEY=VAL;KEY=VAL;...`) into a [`Rule`].
fn parse_rrule_value(value: &str, dtstart: Option<Instant<NoTimeZone>>) -> Result<Rule<NoTimeZone>, Error> {
    let mut freq: Option<Freq> = None;
    let mut interval: Option<u32> = None;
    let mut count: Option<u32> = None;
    let mut until: Option<Instant<NoTimeZone>> = None;
    let mut wkst: Option<Weekday> = None;
    let mut bysetpos: Vec<i32> = Vec::new();
    let mut bymonth: Vec<u8> = Vec::new();
    let mut bymonthday: Vec<i16> = Vec::new();
    let mut byyearday: Vec<i16> = Vec::new();
    let mut byweekno: Vec<i16> = Vec::new();
    let mut byeaster: Vec<i32> = Vec::new();
    let mut byday: Vec<WeekdaySpec> = Vec::new();
    let mut byhour: Option<Vec<u8>> = None;
    let mut byminute: Option<Vec<u8>> = None;
    let mut bysecond: Option<Vec<u8>> = None;

    for pair in value.split(';') {
        if pair.is_empty() {
            continue;
        }
        let (key, val) = pair
            .split_once('=')
            .ok_or_else(|| Error::parse(format!("malformed RRULE key=value pair: {pair}")))?;
        match key {
            "FREQ" => {
                freq = Some(Freq::from_rfc_name(val).ok_or_else(|| Error::invalid_parameter("unknown FREQ value"))?);
            }
            "INTERVAL" => interval = Some(parse_u32(val)?),
            "COUNT" => count = Some(parse_u32(val)?),
            "UNTIL" => until = Some(parse_datetime(val)?),
            "WKST" => wkst = Some(Weekday::from_rfc_code(val).ok_or_else(|| Error::parse(format!("unknown WKST: {val}")))?),
            "BYSETPOS" => bysetpos = parse_int_list::<i32>(val)?,
            "BYMONTH" => bymonth = parse_int_list::<i32>(val)?.into_iter().map(|v| v as u8).collect(),
            "BYMONTHDAY" => bymonthday = parse_int_list::<i16>(val)?,
            "BYYEARDAY" => byyearday = parse_int_list::<i16>(val)?,
            "BYWEEKNO" => byweekno = parse_int_list::<i16>(val)?,
            "BYEASTER" => byeaster = parse_int_list::<i32>(val)?,
            "BYDAY" => byday = parse_byday(val)?,
            "BYHOUR" => byhour = Some(parse_int_list::<i32>(val)?.into_iter().map(|v| v as u8).collect()),
            "BYMINUTE" => byminute = Some(parse_int_list::<i32>(val)?.into_iter().map(|v| v as u8).collect()),
            "BYSECOND" => bysecond = Some(parse_int_list::<i32>(val)?.into_iter().map(|v| v as u8).collect()),
            other => return Err(Error::parse(format!("unknown RRULE key: {other}"))),
        }
    }

    let freq = freq.ok_or_else(|| Error::parse("RRULE is missing FREQ"))?;
    let mut builder = crate::RuleBuilder::new(freq);
    if let Some(dt) = dtstart {
        builder = builder.dtstart(dt);
    }
    if let Some(v) = interval {
        builder = builder.interval(v);
    }
    if let Some(v) = wkst {
        builder = builder.wkst(v);
    }
    if let Some(v) = count {
        builder = builder.count(v);
    }
    if let Some(v) = until {
        builder = builder.until(v);
    }
    if !bysetpos.is_empty() {
        builder = builder.bysetpos(bysetpos);
    }
    if !bymonth.is_empty() {
        builder = builder.bymonth(bymonth);
    }
    if !bymonthday.is_empty() {
        builder = builder.bymonthday(bymonthday);
    }
    if !byyearday.is_empty() {
        builder = builder.byyearday(byyearday);
    }
    if !byweekno.is_empty() {
        builder = builder.byweekno(byweekno);
    }
    if !byeaster.is_empty() {
        builder = builder.byeaster(byeaster);
    }
    if !byday.is_empty() {
        builder = builder.byweekday(byday);
    }
    if let Some(v) = byhour {
        builder = builder.byhour(v);
    }
    if let Some(v) = byminute {
        builder = builder.byminute(v);
    }
    if let Some(v) = bysecond {
        builder = builder.bysecond(v);
    }
    builder.build()
}

fn parse_u32(val: &str) -> Result<u32, Error> {
    val.parse().map_err(|_| Error::parse(format!("expected an integer, got: {val}")))
}

fn parse_int_list<T>(val: &str) -> Result<Vec<T>, Error>
where
    T: core::str::FromStr,
{
    val.split(',')
        .map(|s| s.trim().parse::<T>().map_err(|_| Error::parse(format!("expected an integer, got: {s}"))))
        .collect()
}

/// Parses a `BYDAY` value: a comma list of `[+-N]WKD` tokens.
fn parse_byday(val: &str) -> Result<Vec<WeekdaySpec>, Error> {
    val.split(',').map(parse_byday_token).collect()
}

fn parse_byday_token(token: &str) -> Result<WeekdaySpec, Error> {
    let token = token.trim();
    if token.len() < 2 {
        return Err(Error::parse(format!("malformed BYDAY token: {token}")));
    }
    let (ord_part, code) = token.split_at(token.len() - 2);
    let day = Weekday::from_rfc_code(code).ok_or_else(|| Error::parse(format!("unknown weekday code: {code}")))?;
    if ord_part.is_empty() {
        Ok(WeekdaySpec::plain(day))
    } else {
        let n: i16 = ord_part.parse().map_err(|_| Error::parse(format!("malformed BYDAY ordinal: {ord_part}")))?;
        WeekdaySpec::nth(day, n)
    }
}

/// Parses an RFC 5545 basic-format datetime (`YYYYMMDDTHHMMSS`, with an optional trailing
/// `Z` that this crate accepts but discards since it carries no timezone layer).
fn parse_datetime(val: &str) -> Result<Instant<NoTimeZone>, Error> {
    let val = val.trim().strip_suffix('Z').unwrap_or(val.trim());
    let bytes = val.as_bytes();
    if bytes.len() != 15 || bytes[8] != b'T' {
        return Err(Error::parse(format!("malformed datetime: {val}")));
    }
    let year: i16 = val[0..4].parse().map_err(|_| Error::parse(format!("malformed datetime: {val}")))?;
    let month: u8 = val[4..6].parse().map_err(|_| Error::parse(format!("malformed datetime: {val}")))?;
    let day: u8 = val[6..8].parse().map_err(|_| Error::parse(format!("malformed datetime: {val}")))?;
    let hour: u8 = val[9..11].parse().map_err(|_| Error::parse(format!("malformed datetime: {val}")))?;
    let minute: u8 = val[11..13].parse().map_err(|_| Error::parse(format!("malformed datetime: {val}")))?;
    let second: u8 = val[13..15].parse().map_err(|_| Error::parse(format!("malformed datetime: {val}")))?;
    let date = Date::try_new(year, month, day)?;
    let time = Time::try_new(hour, minute, second)?;
    Ok(Instant::new(date, time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_rrule_with_dtstart_parses_to_rule() {
        let parsed = parse("DTSTART:20130101T090000\nRRULE:FREQ=WEEKLY;COUNT=3").unwrap();
        match parsed {
            Parsed::Rule(rule) => {
                assert_eq!(rule.freq(), Freq::Weekly);
                assert_eq!(rule.count_limit(), Some(3));
                assert_eq!(rule.dtstart().year(), 2013);
            }
            Parsed::Set(_) => panic!("expected a bare rule"),
        }
    }

    #[test]
    fn multiple_properties_produce_a_set() {
        let text = "DTSTART:20130101T090000\nRRULE:FREQ=DAILY;COUNT=3\nEXDATE:20130102T090000";
        let parsed = parse(text).unwrap();
        match parsed {
            Parsed::Set(set) => {
                let occurrences: Vec<_> = set.iter().collect();
                assert_eq!(occurrences.len(), 2);
            }
            Parsed::Rule(_) => panic!("expected a set"),
        }
    }

    #[test]
    fn forceset_always_yields_a_set() {
        let parsed = parse_with("RRULE:FREQ=DAILY;COUNT=1;BYHOUR=9;BYMINUTE=0;BYSECOND=0", ParseOptions { forceset: true, ..Default::default() }).unwrap();
        assert!(matches!(parsed, Parsed::Set(_)));
    }

    #[test]
    fn byday_parses_ordinals_and_plain_days() {
        let rule = parse_rrule_value("FREQ=MONTHLY;COUNT=1;BYDAY=2MO,-1FR", None).unwrap();
        assert!(rule.bynweekday().contains(&(Weekday::Monday, 2)));
        assert!(rule.bynweekday().contains(&(Weekday::Friday, -1)));
    }

    #[test]
    fn unknown_property_is_rejected() {
        let err = parse("BOGUS:xyz").unwrap_err();
        assert!(matches!(err, Error::UnknownProperty(_)));
    }

    #[test]
    fn unknown_rrule_key_is_rejected() {
        let err = parse("RRULE:FREQ=DAILY;BOGUS=1").unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[test]
    fn unknown_freq_is_an_invalid_parameter_not_a_parse_error() {
        let err = parse("RRULE:FREQ=FORTNIGHTLY").unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn x_prefixed_properties_are_ignored() {
        let parsed = parse("X-WR-CALNAME:My calendar\nRRULE:FREQ=DAILY;COUNT=1").unwrap();
        assert!(matches!(parsed, Parsed::Rule(_)));
    }

    #[test]
    fn unfold_joins_continuation_lines() {
        let text = "RRULE:FREQ=DAILY;\n COUNT=1";
        let parsed = parse_with(text, ParseOptions { unfold: true, ..Default::default() }).unwrap();
        match parsed {
            Parsed::Rule(rule) => assert_eq!(rule.count_limit(), Some(1)),
            Parsed::Set(_) => panic!("expected a rule"),
        }
    }

    #[test]
    fn compatible_mode_inserts_dtstart_as_rdate() {
        let parsed = parse_with(
            "DTSTART:20130101T090000\nRRULE:FREQ=WEEKLY;COUNT=2",
            ParseOptions { compatible: true, ..Default::default() },
        )
        .unwrap();
        match parsed {
            // dtstart is already the rrule's own first occurrence, so the inserted
            // RDATE is a duplicate the set composer collapses away.
            Parsed::Set(set) => assert_eq!(set.iter().count(), 2),
            Parsed::Rule(_) => panic!("expected a set under compatible mode"),
        }
    }

    #[test]
    fn rdate_value_date_time_param_is_accepted_others_rejected() {
        assert!(parse("RDATE;VALUE=DATE-TIME:20130101T090000").is_ok());
        let err = parse("RDATE;VALUE=DATE:20130101").unwrap_err();
        assert!(matches!(err, Error::UnsupportedParameter(_)));
    }

    #[test]
    fn empty_input_is_a_parse_error() {
        assert!(matches!(parse(""), Err(Error::ParseError(_))));
    }
}
