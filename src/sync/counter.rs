//! # Shared counter guarded by semaphore permits.
//!
//! [`SharedCounter`] is the single mutable resource of a run. Every mutation
//! takes a `&Permit`, so the type system enforces that the counter is only
//! touched inside a critical section. The value itself is atomic: with a
//! semaphore capacity above one several holders may add concurrently, and
//! none of their updates is lost.
//!
//! ## Termination check
//! [`SharedCounter::advance`] compares against the target **after** the permit
//! is held and refuses to move a counter that has already reached it:
//! ```text
//! value <  target ──► value += delta ──► Advanced { before, after }
//! value >= target ──► unchanged      ──► AlreadyReached(value)
//! ```
//! Exactly one `advance` call observes the crossing (`before < target <= after`).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::sync::semaphore::Permit;

/// Result of one guarded increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The counter moved from `before` to `after`.
    Advanced {
        /// Value seen by this critical section.
        before: u64,
        /// Value left by this critical section.
        after: u64,
    },
    /// The target was already reached; nothing was added.
    AlreadyReached(u64),
}

impl Advance {
    /// Returns `true` if this call moved the counter onto (or past) `target`.
    pub fn crossed(&self, target: u64) -> bool {
        match *self {
            Advance::Advanced { before, after } => before < target && after >= target,
            Advance::AlreadyReached(_) => false,
        }
    }

    /// Counter value after the call.
    pub fn value(&self) -> u64 {
        match *self {
            Advance::Advanced { after, .. } => after,
            Advance::AlreadyReached(v) => v,
        }
    }
}

/// Integer counter that only changes while a [`Permit`] is held.
#[derive(Debug, Default)]
pub struct SharedCounter {
    value: AtomicU64,
}

impl SharedCounter {
    /// Creates a counter starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Adds `delta` unless the counter already reached `target`.
    pub fn advance(&self, _permit: &Permit, delta: u64, target: u64) -> Advance {
        let res = self
            .value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                if v >= target {
                    None
                } else {
                    Some(v.saturating_add(delta))
                }
            });
        match res {
            Ok(before) => Advance::Advanced {
                before,
                after: before.saturating_add(delta),
            },
            Err(current) => Advance::AlreadyReached(current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_adds_exactly_delta() {
        let c = SharedCounter::new();
        let p = Permit::forged();
        assert_eq!(c.advance(&p, 3, 10), Advance::Advanced { before: 0, after: 3 });
        assert_eq!(c.advance(&p, 3, 10), Advance::Advanced { before: 3, after: 6 });
        assert_eq!(c.get(), 6);
    }

    #[test]
    fn test_advance_stops_at_target() {
        let c = SharedCounter::new();
        let p = Permit::forged();
        for _ in 0..9 {
            assert!(!c.advance(&p, 1, 10).crossed(10));
        }
        let last = c.advance(&p, 1, 10);
        assert!(last.crossed(10));
        assert_eq!(last.value(), 10);

        assert_eq!(c.advance(&p, 1, 10), Advance::AlreadyReached(10));
        assert_eq!(c.get(), 10);
    }

    #[test]
    fn test_uneven_delta_overshoots_once() {
        let c = SharedCounter::new();
        let p = Permit::forged();
        c.advance(&p, 4, 10);
        c.advance(&p, 4, 10);
        let third = c.advance(&p, 4, 10);
        assert!(third.crossed(10));
        assert_eq!(third.value(), 12);
        assert_eq!(c.advance(&p, 4, 10), Advance::AlreadyReached(12));
    }
}
