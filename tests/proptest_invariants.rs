//! Property tests for the universal quantifications over the input space: monotonicity,
//! termination correctness, and idempotence of the set mutators.

use proptest::prelude::*;
use recur::{Date, Freq, Instant, RuleBuilder, RuleSet, Time};

fn dt(y: i16, m: u8, d: u8, h: u8, mi: u8, s: u8) -> Instant {
    Instant::new(Date::new(y, m, d), Time::new(h, mi, s))
}

fn arb_freq() -> impl Strategy<Value = Freq> {
    prop_oneof![
        Just(Freq::Yearly),
        Just(Freq::Monthly),
        Just(Freq::Weekly),
        Just(Freq::Daily),
        Just(Freq::Hourly),
        Just(Freq::Minutely),
        Just(Freq::Secondly),
    ]
}

proptest! {
    #[test]
    fn monotonicity_holds_for_any_rule(
        freq in arb_freq(),
        year in 2000i16..2030,
        month in 1u8..=12,
        day in 1u8..=28,
        hour in 0u8..24,
        minute in 0u8..60,
        second in 0u8..60,
        interval in 1u32..5,
        count in 1u32..40,
    ) {
        let rule = RuleBuilder::new(freq)
            .dtstart(dt(year, month, day, hour, minute, second))
            .interval(interval)
            .count(count)
            .build()
            .unwrap();
        let occurrences: Vec<_> = rule.iter().collect();
        for pair in occurrences.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn termination_correctness_with_count(
        freq in arb_freq(),
        year in 2000i16..2030,
        month in 1u8..=12,
        day in 1u8..=28,
        interval in 1u32..5,
        count in 1u32..60,
    ) {
        let rule = RuleBuilder::new(freq)
            .dtstart(dt(year, month, day, 0, 0, 0))
            .interval(interval)
            .count(count)
            .build()
            .unwrap();
        let occurrences: Vec<_> = rule.iter().collect();
        prop_assert_eq!(occurrences.len() as u32, count);
    }

    #[test]
    fn termination_correctness_with_until(
        freq in arb_freq(),
        year in 2000i16..2020,
        month in 1u8..=12,
        day in 1u8..=28,
        span_days in 1i32..2000,
    ) {
        let start = dt(year, month, day, 0, 0, 0);
        let until = Instant::new(start.date().add_days(span_days), Time::new(23, 59, 59));
        let rule = RuleBuilder::new(freq).dtstart(start).until(until).build().unwrap();
        for occurrence in rule.iter().take(500) {
            prop_assert!(occurrence <= until);
        }
    }

    #[test]
    fn idempotent_rdate_exdate_pair(
        year in 2000i16..2030,
        month in 1u8..=12,
        day in 1u8..=28,
        count in 1u32..20,
        extra_year in 2000i16..2030,
        extra_month in 1u8..=12,
        extra_day in 1u8..=28,
    ) {
        let mut set = RuleSet::new();
        set.add_rrule(
            RuleBuilder::new(Freq::Daily)
                .dtstart(dt(year, month, day, 9, 0, 0))
                .count(count)
                .build()
                .unwrap(),
        );
        let before: Vec<_> = set.iter().collect();
        let extra = dt(extra_year, extra_month, extra_day, 9, 0, 0);
        set.add_rdate(extra);
        set.add_exdate(extra);
        let after: Vec<_> = set.iter().collect();
        prop_assert_eq!(before, after);
    }
}
