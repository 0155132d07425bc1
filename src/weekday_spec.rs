//! A `BYDAY` entry: a weekday, optionally qualified by an ordinal occurrence (`-1SU`, `2MO`).

use crate::{Error, Weekday};

/// A single `BYDAY` value: a weekday, optionally paired with a nonzero ordinal selecting
/// its Nth occurrence within the enclosing month or year (e.g. `2MO` is the second Monday,
/// `-1SU` is the last Sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdaySpec {
    pub(crate) day: Weekday,
    pub(crate) nth: Option<i16>,
}

impl WeekdaySpec {
    /// A plain weekday with no ordinal qualifier, e.g. `MO`.
    pub const fn plain(day: Weekday) -> Self {
        Self { day, nth: None }
    }

    /// The Nth occurrence of `day`. `n` must be nonzero.
    pub fn nth(day: Weekday, n: i16) -> Result<Self, Error> {
        if n == 0 {
            return Err(Error::invalid_parameter("weekday ordinal must not be zero"));
        }
        Ok(Self { day, nth: Some(n) })
    }

    /// The underlying weekday, ignoring any ordinal.
    pub const fn weekday(self) -> Weekday {
        self.day
    }

    /// The ordinal qualifier, if any.
    pub const fn ordinal(self) -> Option<i16> {
        self.nth
    }
}

impl From<Weekday> for WeekdaySpec {
    fn from(day: Weekday) -> Self {
        Self::plain(day)
    }
}

impl core::fmt::Display for WeekdaySpec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if let Some(n) = self.nth {
            write!(f, "{n}{}", self.day.rfc_code())
        } else {
            f.write_str(self.day.rfc_code())
        }
    }
}
