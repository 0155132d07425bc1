//! Sequence-algebra helpers shared by the `count`/`at`/`before`/`after`/`between` accessors
//! on both [`crate::Rule`] and [`crate::RuleSet`] — the observable contract a rule and a set
//! both expose, per the external interfaces. Each walks a freshly created iterator rather
//! than assuming a cache, mirroring this crate's reference algorithm's uncached code path.

use crate::instant::Instant;
use crate::Error;

pub(crate) fn at<Tz>(iter: impl Iterator<Item = Instant<Tz>>, index: i64) -> Result<Instant<Tz>, Error> {
    if index >= 0 {
        let mut iter = iter;
        iter.nth(index as usize).ok_or(Error::IndexOutOfRange)
    } else {
        let all: Vec<Instant<Tz>> = iter.collect();
        let len = all.len() as i64;
        let idx = len + index;
        if idx < 0 {
            return Err(Error::IndexOutOfRange);
        }
        all.into_iter().nth(idx as usize).ok_or(Error::IndexOutOfRange)
    }
}

pub(crate) fn before<Tz>(iter: impl Iterator<Item = Instant<Tz>>, dt: &Instant<Tz>, inclusive: bool) -> Option<Instant<Tz>> {
    let mut last = None;
    for item in iter {
        if inclusive {
            if item > *dt {
                break;
            }
        } else if item >= *dt {
            break;
        }
        last = Some(item);
    }
    last
}

pub(crate) fn after<Tz>(iter: impl Iterator<Item = Instant<Tz>>, dt: &Instant<Tz>, inclusive: bool) -> Option<Instant<Tz>> {
    for item in iter {
        if inclusive {
            if item >= *dt {
                return Some(item);
            }
        } else if item > *dt {
            return Some(item);
        }
    }
    None
}

pub(crate) fn between<Tz>(
    iter: impl Iterator<Item = Instant<Tz>>,
    start: &Instant<Tz>,
    end: &Instant<Tz>,
    inclusive: bool,
) -> Vec<Instant<Tz>> {
    let mut result = Vec::new();
    let mut started = false;
    for item in iter {
        if inclusive {
            if item > *end {
                break;
            }
            if started {
                result.push(item);
            } else if item >= *start {
                started = true;
                result.push(item);
            }
        } else {
            if item >= *end {
                break;
            }
            if started {
                result.push(item);
            } else if item > *start {
                started = true;
                result.push(item);
            }
        }
    }
    result
}
