//! Per-cell evaluation state.
//!
//! ```text
//!   NotStarted ──begin──▶ InProgress ──finish──▶ Done(value)
//!        ▲                    │
//!        └──── reset ─────────┘   (CIRC seen below the top frame, or unwind)
//! ```
//!
//! Entering a cell that is already `InProgress` is a circular reference.
//! The entry is left alone and the caller gets `#CIRC!`.
//!
//! A cell reset because of a cycle keeps answering `#CIRC!` until the
//! request that found the cycle returns, so a cycle costs one evaluation
//! per cell however often its members refer to each other.
//!
//! The cache also remembers which formula cells read which cells, so that
//! a change to one cell drops only the results that depend on it.

use std::cell::{Cell, RefCell};

use rustc_hash::{FxHashMap, FxHashSet};
use sheetcalc_common::{ExcelErrorKind, LiteralValue};

use crate::reference::CellRef;

#[derive(Debug, Clone, PartialEq)]
pub enum CellState {
    NotStarted,
    InProgress,
    Done(LiteralValue),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests served without evaluating the formula.
    pub hits: u64,
    /// Formula cells that had to be evaluated.
    pub misses: u64,
    /// Requests that found their cell already `InProgress`.
    pub cycles: u64,
}

/// Outcome of [`EvalCache::begin`].
pub(crate) enum Entry<'c> {
    Cached(LiteralValue),
    Cycle,
    Started(InProgressGuard<'c>),
}

#[derive(Debug, Default)]
pub(crate) struct EvalCache {
    states: RefCell<FxHashMap<CellRef, CellState>>,
    /// Formula cells being evaluated, innermost last.
    stack: RefCell<Vec<CellRef>>,
    /// `#CIRC!` results below the top frame of the running request.
    circular: RefCell<FxHashMap<CellRef, LiteralValue>>,
    /// Cell to the formula cells that read it.
    dependents: RefCell<FxHashMap<CellRef, FxHashSet<CellRef>>>,
    stats: Cell<CacheStats>,
}

impl EvalCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn state(&self, cell: CellRef) -> CellState {
        self.states
            .borrow()
            .get(&cell)
            .cloned()
            .unwrap_or(CellState::NotStarted)
    }

    pub(crate) fn begin(&self, cell: CellRef) -> Entry<'_> {
        let mut stats = self.stats.get();
        let known = self.states.borrow().get(&cell).cloned();
        let entry = match known {
            Some(CellState::Done(v)) => {
                stats.hits += 1;
                Entry::Cached(v)
            }
            Some(CellState::InProgress) => {
                stats.cycles += 1;
                Entry::Cycle
            }
            Some(CellState::NotStarted) | None => {
                let circ = self.circular.borrow().get(&cell).cloned();
                match circ {
                    Some(v) => {
                        stats.hits += 1;
                        Entry::Cached(v)
                    }
                    None => {
                        stats.misses += 1;
                        self.states.borrow_mut().insert(cell, CellState::InProgress);
                        let mut stack = self.stack.borrow_mut();
                        let top = stack.is_empty();
                        stack.push(cell);
                        Entry::Started(InProgressGuard {
                            cache: self,
                            cell,
                            top,
                            armed: true,
                        })
                    }
                }
            }
        };
        self.stats.set(stats);
        entry
    }

    /// Note that the formula being evaluated reads `cell`.
    pub(crate) fn record_read(&self, cell: CellRef) {
        let Some(&reader) = self.stack.borrow().last() else {
            return;
        };
        if reader != cell {
            self.dependents
                .borrow_mut()
                .entry(cell)
                .or_default()
                .insert(reader);
        }
    }

    /// Drop the result of `cell` and of every formula that read it, directly
    /// or through other formulas. Returns how many results were dropped.
    pub(crate) fn invalidate(&self, cell: CellRef) -> usize {
        let mut states = self.states.borrow_mut();
        let mut dependents = self.dependents.borrow_mut();
        let mut seen = FxHashSet::default();
        let mut pending = vec![cell];
        let mut dropped = 0;
        while let Some(next) = pending.pop() {
            if !seen.insert(next) {
                continue;
            }
            if matches!(states.get(&next), Some(CellState::Done(_))) {
                states.remove(&next);
                dropped += 1;
            }
            if let Some(readers) = dependents.remove(&next) {
                pending.extend(readers);
            }
        }
        dropped
    }

    pub(crate) fn clear(&self) {
        self.states.borrow_mut().clear();
        self.circular.borrow_mut().clear();
        self.dependents.borrow_mut().clear();
    }

    pub(crate) fn stats(&self) -> CacheStats {
        self.stats.get()
    }

    pub(crate) fn len(&self) -> usize {
        self.states.borrow().len()
    }

    fn settle(&self, cell: CellRef, state: CellState) {
        {
            let mut states = self.states.borrow_mut();
            match state {
                CellState::NotStarted => {
                    states.remove(&cell);
                }
                state => {
                    states.insert(cell, state);
                }
            }
        }
        let mut stack = self.stack.borrow_mut();
        stack.pop();
        if stack.is_empty() {
            self.circular.borrow_mut().clear();
        }
    }
}

/// Holds a cell `InProgress`. Dropping it without [`finish`](Self::finish)
/// (a panic unwinding through the evaluator) puts the cell back to
/// `NotStarted`, so the cache never keeps a stale `InProgress` entry.
pub(crate) struct InProgressGuard<'c> {
    cache: &'c EvalCache,
    cell: CellRef,
    top: bool,
    armed: bool,
}

impl InProgressGuard<'_> {
    /// Record the result. A `#CIRC!` result is only kept for the cell the
    /// request started at. Cells further down the cycle answer `#CIRC!` for
    /// the rest of the request and are `NotStarted` afterwards, so that a
    /// later request can take another path.
    pub(crate) fn finish(mut self, value: &LiteralValue) {
        self.armed = false;
        if !self.top && value.error_kind() == Some(ExcelErrorKind::Circ) {
            self.cache
                .circular
                .borrow_mut()
                .insert(self.cell, value.clone());
            self.cache.settle(self.cell, CellState::NotStarted);
        } else {
            self.cache.settle(self.cell, CellState::Done(value.clone()));
        }
    }
}

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.cache.settle(self.cell, CellState::NotStarted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Coord;

    fn cell(row: u32) -> CellRef {
        CellRef::new(0, Coord::new(row, 0))
    }

    #[test]
    fn lifecycle_and_stats() {
        let cache = EvalCache::new();
        let Entry::Started(guard) = cache.begin(cell(0)) else {
            panic!("first visit should start");
        };
        assert_eq!(cache.state(cell(0)), CellState::InProgress);
        assert!(matches!(cache.begin(cell(0)), Entry::Cycle));
        guard.finish(&LiteralValue::Number(3.0));
        assert_eq!(cache.state(cell(0)), CellState::Done(LiteralValue::Number(3.0)));
        assert!(matches!(cache.begin(cell(0)), Entry::Cached(LiteralValue::Number(n)) if n == 3.0));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.cycles), (1, 1, 1));

        cache.clear();
        assert_eq!(cache.state(cell(0)), CellState::NotStarted);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn circ_is_only_kept_at_the_top_frame() {
        let cache = EvalCache::new();
        let circ = LiteralValue::error(ExcelErrorKind::Circ);
        let Entry::Started(outer) = cache.begin(cell(0)) else {
            panic!("outer should start");
        };
        let Entry::Started(inner) = cache.begin(cell(1)) else {
            panic!("inner should start");
        };
        inner.finish(&circ);
        assert_eq!(cache.state(cell(1)), CellState::NotStarted);
        // Still the same request: the inner cell answers without a rerun.
        assert!(matches!(cache.begin(cell(1)), Entry::Cached(v) if v == circ));
        outer.finish(&circ);
        assert_eq!(cache.state(cell(0)), CellState::Done(circ));

        let Entry::Started(retry) = cache.begin(cell(1)) else {
            panic!("a new request should evaluate the inner cell again");
        };
        retry.finish(&LiteralValue::Number(1.0));
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 3));
    }

    #[test]
    fn invalidate_follows_readers() {
        let cache = EvalCache::new();
        let done = |c: CellRef, v: f64| {
            let Entry::Started(g) = cache.begin(c) else {
                panic!("{c} should start");
            };
            g.finish(&LiteralValue::Number(v));
        };
        // cell(2) reads cell(1), which reads cell(0). cell(3) reads cell(9).
        let Entry::Started(g2) = cache.begin(cell(2)) else {
            panic!("cell(2) should start");
        };
        cache.record_read(cell(1));
        let Entry::Started(g1) = cache.begin(cell(1)) else {
            panic!("cell(1) should start");
        };
        cache.record_read(cell(0));
        g1.finish(&LiteralValue::Number(1.0));
        g2.finish(&LiteralValue::Number(2.0));
        let Entry::Started(g3) = cache.begin(cell(3)) else {
            panic!("cell(3) should start");
        };
        cache.record_read(cell(9));
        g3.finish(&LiteralValue::Number(3.0));
        done(cell(4), 4.0);

        assert_eq!(cache.invalidate(cell(0)), 2);
        assert_eq!(cache.state(cell(1)), CellState::NotStarted);
        assert_eq!(cache.state(cell(2)), CellState::NotStarted);
        assert_eq!(cache.state(cell(3)), CellState::Done(LiteralValue::Number(3.0)));
        assert_eq!(cache.state(cell(4)), CellState::Done(LiteralValue::Number(4.0)));
        // Edges were consumed; a second call has nothing to drop.
        assert_eq!(cache.invalidate(cell(0)), 0);
        assert_eq!(cache.invalidate(cell(3)), 1);
    }

    #[test]
    fn dropped_guard_resets_the_cell() {
        let cache = EvalCache::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = match cache.begin(cell(2)) {
                Entry::Started(g) => g,
                _ => unreachable!(),
            };
            panic!("evaluation blew up");
        }));
        assert!(result.is_err());
        assert_eq!(cache.state(cell(2)), CellState::NotStarted);
        assert!(matches!(cache.begin(cell(2)), Entry::Started(_)));
    }
}
