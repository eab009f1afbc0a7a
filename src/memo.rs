//! Write-once length caches for immutable nodes.
//!
//! Nodes are immutable values, but some lengths (line-prefixed content,
//! dynamic code fences) are only known after walking the inner content.
//! [`Memo`] stores such a value in a single atomic word: the first reader
//! computes and publishes it, every later reader sees the same value.
//!
//! Two threads reading an empty memo at the same time may both compute the
//! value. Because the computation is a pure function of immutable content,
//! both store the same number, so the race is a duplicate computation and
//! never a torn or diverging read.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

const EMPTY: usize = usize::MAX;

/// A lazily populated, word-sized cache cell.
///
/// `usize::MAX` is reserved as the "not yet computed" marker; no rendered
/// fragment can reach that length.
pub struct Memo(AtomicUsize);

impl Memo {
    pub const fn new() -> Self {
        Self(AtomicUsize::new(EMPTY))
    }

    /// Return the cached value, computing it with `init` on first access.
    pub fn get_or_init(&self, init: impl FnOnce() -> usize) -> usize {
        let cached = self.0.load(Ordering::Relaxed);
        if cached != EMPTY {
            return cached;
        }
        let value = init();
        debug_assert_ne!(value, EMPTY, "memoized value collides with the empty marker");
        self.0.store(value, Ordering::Relaxed);
        value
    }

    /// The cached value, if it has been computed.
    pub fn get(&self) -> Option<usize> {
        match self.0.load(Ordering::Relaxed) {
            EMPTY => None,
            value => Some(value),
        }
    }
}

impl Default for Memo {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Memo {
    fn clone(&self) -> Self {
        Self(AtomicUsize::new(self.0.load(Ordering::Relaxed)))
    }
}

impl fmt::Debug for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => write!(f, "Memo({value})"),
            None => f.write_str("Memo(<empty>)"),
        }
    }
}

/// Cached `(total, syntax)` lengths of a content-dependent node.
#[derive(Debug, Clone, Default)]
pub struct LengthCache {
    total: Memo,
    syntax: Memo,
}

impl LengthCache {
    pub const fn new() -> Self {
        Self {
            total: Memo::new(),
            syntax: Memo::new(),
        }
    }

    /// Return `(total, syntax)`, running `measure` once if either is missing.
    pub fn get_or_measure(&self, measure: impl FnOnce() -> (usize, usize)) -> (usize, usize) {
        if let (Some(total), Some(syntax)) = (self.total.get(), self.syntax.get()) {
            return (total, syntax);
        }
        let (total, syntax) = measure();
        debug_assert!(syntax <= total);
        let total = self.total.get_or_init(|| total);
        let syntax = self.syntax.get_or_init(|| syntax);
        (total, syntax)
    }
}
