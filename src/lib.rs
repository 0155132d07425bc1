//! `recur`: an RFC 5545 (§3.3.10) recurrence rule expansion engine.
//!
//! Given a [`Rule`] — a frequency, an anchor instant, an optional termination, and a set of
//! `BY*` filters — [`Rule::iter`] yields the rule's occurrences in strictly ascending order.
//! [`RuleSet`] composes several rules and explicit dates, additive and subtractive, into a
//! single merged, de-duplicated stream.
//!
//! The [`parse`] module turns RFC 5545 `RRULE`/`RDATE`/`EXRULE`/`EXDATE`/`DTSTART` text into
//! a [`Rule`] or [`RuleSet`]; the [`serialize`] module is its inverse.
//!
//! This crate has no notion of timezones beyond an opaque tag: [`Instant<Tz>`] carries a
//! generic `Tz` the engine never inspects, so a caller with their own timezone layer can
//! parameterize [`Rule<Tz>`]/[`RuleSet<Tz>`] over their own tag type.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

mod builder;
mod date;
mod easter;
mod error;
mod expand;
mod freq;
pub mod gregorian;
mod instant;
mod iterinfo;
pub mod parse;
mod query;
mod rule;
pub mod serialize;
#[cfg(feature = "serde")]
mod serde_support;
mod set;
mod tables;
mod time;
mod utils;
mod weekday_spec;

pub use builder::RuleBuilder;
pub use date::{Date, Weekday};
pub use easter::easter_sunday;
pub use error::Error;
pub use expand::RuleIter;
pub use freq::Freq;
pub use instant::{Instant, NoTimeZone};
pub use rule::Rule;
pub use set::{RuleSet, SetIter};
pub use time::Time;
pub use weekday_spec::WeekdaySpec;

#[cfg(feature = "std")]
pub use instant::now;
