//! The set composer (component G): merges additive rules and dates, subtracts exclusion
//! rules and dates, and de-duplicates the result into a single ascending stream.
//!
//! Where this crate's reference algorithm resumes Python generators behind a pair of
//! `heapq` instances, [`SetIter`] holds a pair of [`std::collections::BinaryHeap`]s of
//! boxed iterators, each wrapping its current head value so the heap orders by the next
//! value each source would produce rather than by the source itself.

use alloc::collections::BinaryHeap;

use crate::instant::Instant;
use crate::rule::Rule;
use crate::Error;

/// A composition of recurrence rules and explicit dates: additive `rrule`s/`rdate`s minus
/// subtractive `exrule`s/`exdate`s.
///
/// Mirrors [`crate::Rule`]'s external contract (`iter`, `count`, `at`, `before`, `after`,
/// `between`), plus the mutators that build up the composition.
#[derive(Debug, Clone)]
pub struct RuleSet<Tz = crate::instant::NoTimeZone> {
    pub(crate) rrules: Vec<Rule<Tz>>,
    pub(crate) rdates: Vec<Instant<Tz>>,
    pub(crate) exrules: Vec<Rule<Tz>>,
    pub(crate) exdates: Vec<Instant<Tz>>,
}

impl<Tz> Default for RuleSet<Tz> {
    fn default() -> Self {
        Self {
            rrules: Vec::new(),
            rdates: Vec::new(),
            exrules: Vec::new(),
            exdates: Vec::new(),
        }
    }
}

impl<Tz> RuleSet<Tz> {
    /// Creates an empty set with no rules or dates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an additive rule.
    pub fn add_rrule(&mut self, rule: Rule<Tz>) {
        self.rrules.push(rule);
    }

    /// Adds a subtractive rule.
    pub fn add_exrule(&mut self, rule: Rule<Tz>) {
        self.exrules.push(rule);
    }

    /// Adds an explicit inclusion date. If it exactly matches a previously added `EXDATE`,
    /// that exclusion is removed instead of inserting a redundant inclusion (the RDATE and
    /// the EXDATE cancel).
    pub fn add_rdate(&mut self, dt: Instant<Tz>) {
        if let Some(pos) = self.exdates.iter().position(|d| *d == dt) {
            self.exdates.remove(pos);
        } else {
            self.rdates.push(dt);
        }
    }

    /// Adds an explicit exclusion date, symmetric to [`add_rdate`](Self::add_rdate).
    pub fn add_exdate(&mut self, dt: Instant<Tz>) {
        if let Some(pos) = self.rdates.iter().position(|d| *d == dt) {
            self.rdates.remove(pos);
        } else {
            self.exdates.push(dt);
        }
    }

    /// Moves an occurrence from `old` to `new`: equivalent to `add_exdate(old)` followed by
    /// `add_rdate(new)`, each already idempotent and cancelling per their own rules.
    pub fn move_instance(&mut self, old: Instant<Tz>, new: Instant<Tz>) {
        self.add_exdate(old);
        self.add_rdate(new);
    }

    /// The additive rules.
    pub fn rrules(&self) -> &[Rule<Tz>] {
        &self.rrules
    }

    /// The explicit inclusion dates.
    pub fn rdates(&self) -> &[Instant<Tz>] {
        &self.rdates
    }

    /// The subtractive rules.
    pub fn exrules(&self) -> &[Rule<Tz>] {
        &self.exrules
    }

    /// The explicit exclusion dates.
    pub fn exdates(&self) -> &[Instant<Tz>] {
        &self.exdates
    }
}

struct HeapItem<'r, Tz> {
    dt: Instant<Tz>,
    iter: Box<dyn Iterator<Item = Instant<Tz>> + 'r>,
}

impl<Tz> PartialEq for HeapItem<'_, Tz> {
    fn eq(&self, other: &Self) -> bool {
        self.dt == other.dt
    }
}

impl<Tz> Eq for HeapItem<'_, Tz> {}

impl<Tz> PartialOrd for HeapItem<'_, Tz> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<Tz> Ord for HeapItem<'_, Tz> {
    // Reversed, so that `BinaryHeap` (a max-heap) pops the smallest `dt` first.
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        other.dt.cmp(&self.dt)
    }
}

fn push_source<'r, Tz>(heap: &mut BinaryHeap<HeapItem<'r, Tz>>, mut iter: Box<dyn Iterator<Item = Instant<Tz>> + 'r>) {
    if let Some(dt) = iter.next() {
        heap.push(HeapItem { dt, iter });
    }
}

/// Lazily merges a [`RuleSet`]'s inclusion sources, subtracts its exclusion sources, and
/// de-duplicates, in strictly ascending order.
pub struct SetIter<'r, Tz> {
    includes: BinaryHeap<HeapItem<'r, Tz>>,
    excludes: BinaryHeap<HeapItem<'r, Tz>>,
    last_emitted: Option<Instant<Tz>>,
}

impl<'r, Tz: Clone> SetIter<'r, Tz> {
    fn new(set: &'r RuleSet<Tz>) -> Self {
        let mut includes = BinaryHeap::new();
        let mut rdates = set.rdates.clone();
        rdates.sort();
        push_source(&mut includes, Box::new(rdates.into_iter()));
        for rule in &set.rrules {
            push_source(&mut includes, Box::new(rule.iter()));
        }

        let mut excludes = BinaryHeap::new();
        let mut exdates = set.exdates.clone();
        exdates.sort();
        push_source(&mut excludes, Box::new(exdates.into_iter()));
        for rule in &set.exrules {
            push_source(&mut excludes, Box::new(rule.iter()));
        }

        Self {
            includes,
            excludes,
            last_emitted: None,
        }
    }
}

impl<'r, Tz: Clone> Iterator for SetIter<'r, Tz> {
    type Item = Instant<Tz>;

    fn next(&mut self) -> Option<Instant<Tz>> {
        loop {
            let top = self.includes.peek()?.dt.clone();

            while let Some(ex_top) = self.excludes.peek() {
                if ex_top.dt < top {
                    let mut item = self.excludes.pop().expect("just peeked");
                    if let Some(next_dt) = item.iter.next() {
                        item.dt = next_dt;
                        self.excludes.push(item);
                    }
                } else {
                    break;
                }
            }
            let excluded = self.excludes.peek().map(|e| e.dt == top).unwrap_or(false);

            let mut item = self.includes.pop().expect("just peeked");
            let dt = item.dt.clone();
            if let Some(next_dt) = item.iter.next() {
                item.dt = next_dt;
                self.includes.push(item);
            }

            if excluded {
                continue;
            }
            if self.last_emitted.as_ref() == Some(&dt) {
                continue;
            }
            self.last_emitted = Some(dt.clone());
            return Some(dt);
        }
    }
}

impl<Tz: Clone> RuleSet<Tz> {
    /// Merges every additive source, subtracts every exclusion source, and de-duplicates,
    /// yielding instants in strictly ascending order.
    pub fn iter(&self) -> SetIter<'_, Tz> {
        SetIter::new(self)
    }

    /// Total number of occurrences, or `-1` if any `rrule` is provably infinite (no `COUNT`
    /// and no `UNTIL`).
    pub fn count(&self) -> i64 {
        for rule in &self.rrules {
            if rule.until().is_none() && rule.count_limit().is_none() {
                return -1;
            }
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
