//! Black-box scenarios S1-S6 plus the set-algebra, idempotence, and round-trip properties.

use recur::parse::{parse, Parsed};
use recur::serialize::Verbosity;
use recur::{Date, Freq, Instant, RuleBuilder, RuleSet, Time, Weekday};

fn dt(y: i16, m: u8, d: u8, h: u8, mi: u8, s: u8) -> Instant {
    Instant::new(Date::new(y, m, d), Time::new(h, mi, s))
}

fn rule_from_text(text: &str) -> recur::Rule {
    match parse(text).unwrap() {
        Parsed::Rule(r) => r,
        Parsed::Set(_) => panic!("expected a bare rule from: {text}"),
    }
}

#[test]
fn s1_weekly_until() {
    let rule = rule_from_text("DTSTART:20130101T090000\nRRULE:FREQ=WEEKLY;UNTIL=20130124T110000");
    let got: Vec<_> = rule.iter().collect();
    assert_eq!(
        got,
        vec![
            dt(2013, 1, 1, 9, 0, 0),
            dt(2013, 1, 8, 9, 0, 0),
            dt(2013, 1, 15, 9, 0, 0),
            dt(2013, 1, 22, 9, 0, 0),
        ]
    );
}

#[test]
fn s2_redundant_by_star_equals_terse() {
    let terse = rule_from_text("DTSTART:20130101T090000\nRRULE:FREQ=WEEKLY;UNTIL=20130124T110000");
    let verbose = rule_from_text(
        "DTSTART:20130101T090000\nRRULE:FREQ=WEEKLY;BYDAY=TU;BYHOUR=9;BYMINUTE=0;BYSECOND=0;UNTIL=20130124T110000",
    );
    assert_eq!(
        terse.iter().collect::<Vec<_>>(),
        verbose.iter().collect::<Vec<_>>()
    );
}

#[test]
fn s3_two_weekly_rules_merged() {
    let mut set = RuleSet::new();
    set.add_rrule(rule_from_text("DTSTART:20130101T090000\nRRULE:FREQ=WEEKLY;UNTIL=20130124T110000"));
    set.add_rrule(rule_from_text("DTSTART:20130110T110000\nRRULE:FREQ=WEEKLY;UNTIL=20130124T110000"));
    let got: Vec<_> = set.iter().collect();
    assert_eq!(got.len(), 7);
    assert_eq!(got[4], dt(2013, 1, 17, 11, 0, 0));
}

#[test]
fn s4_extra_rdate() {
    let mut set = RuleSet::new();
    set.add_rrule(rule_from_text("DTSTART:20130101T090000\nRRULE:FREQ=WEEKLY;UNTIL=20130124T110000"));
    set.add_rrule(rule_from_text("DTSTART:20130110T110000\nRRULE:FREQ=WEEKLY;UNTIL=20130124T110000"));
    set.add_rdate(dt(2013, 1, 1, 13, 0, 0));
    let got: Vec<_> = set.iter().collect();
    assert_eq!(got.len(), 8);
    assert_eq!(got[4], dt(2013, 1, 15, 9, 0, 0));
}

#[test]
fn s5_monthly_last_day_spans_leap_february() {
    let rule = RuleBuilder::new(Freq::Monthly)
        .dtstart(dt(2020, 1, 31, 0, 0, 0))
        .bymonthday([-1])
        .count(4)
        .build()
        .unwrap();
    let got: Vec<_> = rule.iter().collect();
    assert_eq!(
        got,
        vec![
            dt(2020, 1, 31, 0, 0, 0),
            dt(2020, 2, 29, 0, 0, 0),
            dt(2020, 3, 31, 0, 0, 0),
            dt(2020, 4, 30, 0, 0, 0),
        ]
    );
}

#[test]
fn s6_yearly_bysetpos_last_weekday_of_year() {
    let rule = RuleBuilder::new(Freq::Yearly)
        .dtstart(dt(2020, 1, 1, 0, 0, 0))
        .byweekday([Weekday::Monday, Weekday::Tuesday, Weekday::Wednesday, Weekday::Thursday, Weekday::Friday])
        .bysetpos([-1])
        .count(3)
        .build()
        .unwrap();
    let got: Vec<_> = rule.iter().collect();
    // 2020-12-31 is a Thursday, 2021-12-31 a Friday, 2022-12-30 a Friday (12-31 is Saturday).
    assert_eq!(
        got,
        vec![dt(2020, 12, 31, 0, 0, 0), dt(2021, 12, 31, 0, 0, 0), dt(2022, 12, 30, 0, 0, 0)]
    );
}

#[test]
fn anchor_containment_when_dtstart_satisfies_filters() {
    let rule = RuleBuilder::new(Freq::Weekly)
        .dtstart(dt(2013, 1, 1, 9, 0, 0))
        .count(1)
        .build()
        .unwrap();
    assert_eq!(rule.iter().next(), Some(dt(2013, 1, 1, 9, 0, 0)));
}

#[test]
fn set_algebra_union_minus_exclusions() {
    let mut set = RuleSet::new();
    set.add_rrule(
        RuleBuilder::new(Freq::Daily)
            .dtstart(dt(2020, 1, 1, 9, 0, 0))
            .count(10)
            .build()
            .unwrap(),
    );
    set.add_rdate(dt(2020, 1, 1, 9, 0, 0)); // duplicate of the rrule's own first instance
    set.add_rdate(dt(2020, 2, 1, 9, 0, 0)); // genuinely new inclusion
    set.add_exdate(dt(2020, 1, 5, 9, 0, 0));
    set.add_exrule(
        RuleBuilder::new(Freq::Weekly)
            .dtstart(dt(2020, 1, 3, 9, 0, 0))
            .count(1)
            .build()
            .unwrap(),
    );

    let got: Vec<_> = set.iter().collect();
    let expected = vec![
        dt(2020, 1, 1, 9, 0, 0),
        dt(2020, 1, 2, 9, 0, 0),
        dt(2020, 1, 4, 9, 0, 0),
        dt(2020, 1, 6, 9, 0, 0),
        dt(2020, 1, 7, 9, 0, 0),
        dt(2020, 1, 8, 9, 0, 0),
        dt(2020, 1, 9, 9, 0, 0),
        dt(2020, 1, 10, 9, 0, 0),
        dt(2020, 2, 1, 9, 0, 0),
    ];
    assert_eq!(got, expected);
}

#[test]
fn idempotent_mutators_leave_enumeration_unchanged() {
    let mut set = RuleSet::new();
    set.add_rrule(
        RuleBuilder::new(Freq::Daily)
            .dtstart(dt(2020, 1, 1, 9, 0, 0))
            .count(3)
            .build()
            .unwrap(),
    );
    let before: Vec<_> = set.iter().collect();
    let extra = dt(2025, 5, 5, 5, 5, 5);
    set.add_rdate(extra);
    set.add_exdate(extra);
    let after: Vec<_> = set.iter().collect();
    assert_eq!(before, after);
}

#[test]
fn round_trip_fully_resolved_enumerates_identically() {
    let rule = RuleBuilder::new(Freq::Monthly)
        .dtstart(dt(2020, 1, 31, 9, 0, 0))
        .bymonthday([-1])
        .count(6)
        .build()
        .unwrap();
    let text = format!(
        "DTSTART:{}\nRRULE:{}",
        {
            let d = rule.dtstart();
            format!("{:04}{:02}{:02}T{:02}{:02}{:02}", d.year(), d.month(), d.day(), d.hour(), d.minute(), d.second())
        },
        recur::serialize::serialize_rule(&rule, Verbosity::FullyResolved)
    );
    let reparsed = rule_from_text(&text);
    assert_eq!(rule.iter().collect::<Vec<_>>(), reparsed.iter().collect::<Vec<_>>());
}

#[test]
fn bysetpos_first_and_last_survivor() {
    let first = RuleBuilder::new(Freq::Monthly)
        .dtstart(dt(2020, 1, 1, 9, 0, 0))
        .byweekday([Weekday::Monday, Weekday::Tuesday, Weekday::Wednesday, Weekday::Thursday, Weekday::Friday])
        .bysetpos([1])
        .count(1)
        .build()
        .unwrap();
    assert_eq!(first.iter().next(), Some(dt(2020, 1, 1, 9, 0, 0))); // Jan 1 2020 is a Wednesday

    let last = RuleBuilder::new(Freq::Monthly)
        .dtstart(dt(2020, 1, 1, 9, 0, 0))
        .byweekday([Weekday::Monday, Weekday::Tuesday, Weekday::Wednesday, Weekday::Thursday, Weekday::Friday])
        .bysetpos([-1])
        .count(1)
        .build()
        .unwrap();
    assert_eq!(last.iter().next(), Some(dt(2020, 1, 31, 9, 0, 0)));
}
