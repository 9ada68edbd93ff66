//! # Timeout-bounded counting semaphore.
//!
//! [`BoundedSemaphore`] admits at most `capacity` holders at once. Both sides of
//! the permit exchange are bounded in time:
//! - [`BoundedSemaphore::acquire`] waits at most `acquire_timeout` for a free slot;
//! - [`BoundedSemaphore::release`] waits at most `release_timeout` to hand it back.
//!
//! ## Architecture
//! ```text
//!            acquire()                       release(permit)
//!   free ──[take 1, forget]──► held    held ──[take 1, forget]──► free
//!  (C permits at start)       (0 at start)
//!
//!   in_use = C - free.available
//! ```
//!
//! Two [`tokio::sync::Semaphore`]s model the two directions of the exchange:
//! `free` counts empty slots and `held` counts outstanding permits. A timeout
//! on either side leaves both counts untouched.
//!
//! ## Rules
//! - `0 <= in_use <= capacity` at every instant.
//! - A timed-out acquire never reserves a slot.
//! - [`Permit`] is the only proof of a successful acquire; `release` consumes it.
//! - A permit remembers the semaphore that issued it. Handing it to another
//!   semaphore is refused with [`GateError::ForeignPermit`] and frees nothing.
//! - A permit that is dropped without `release` keeps its slot reserved.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use permitgate::BoundedSemaphore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let sem = BoundedSemaphore::new(1, Duration::from_millis(50), Duration::from_millis(50));
//! let permit = sem.acquire().await.expect("free slot");
//! assert_eq!(sem.in_use(), 1);
//! assert!(sem.acquire().await.is_err()); // full: times out
//! sem.release(permit).await.expect("held slot");
//! assert_eq!(sem.in_use(), 0);
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::{sync::Semaphore, time};

use crate::config::Config;
use crate::error::{GateError, GateOp};

/// Proof of one reserved slot in a [`BoundedSemaphore`].
///
/// Hand it back with [`BoundedSemaphore::release`]. It is also the key that
/// unlocks mutation of a [`SharedCounter`](crate::SharedCounter).
#[must_use = "a permit keeps its slot reserved until it is released"]
#[derive(Debug)]
pub struct Permit {
    owner: u64,
}

impl Permit {
    /// Fabricates a permit owned by no semaphore; only for tests.
    #[cfg(test)]
    pub(crate) fn forged() -> Self {
        Self { owner: 0 }
    }

    /// Fabricates a permit claiming to come from `sem` without acquiring; only for tests.
    #[cfg(test)]
    pub(crate) fn forged_for(sem: &BoundedSemaphore) -> Self {
        Self { owner: sem.id }
    }
}

/// Identity source for semaphores; 0 is never handed out.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Counting semaphore with a fixed capacity and timeouts on both acquire and release.
#[derive(Debug)]
pub struct BoundedSemaphore {
    id: u64,
    capacity: usize,
    free: Semaphore,
    held: Semaphore,
    acquire_timeout: Duration,
    release_timeout: Duration,
}

impl BoundedSemaphore {
    /// Creates a semaphore with `capacity` slots, all free.
    ///
    /// `capacity` is clamped to a minimum of 1.
    pub fn new(capacity: usize, acquire_timeout: Duration, release_timeout: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            capacity,
            free: Semaphore::new(capacity),
            held: Semaphore::new(0),
            acquire_timeout,
            release_timeout,
        }
    }

    /// Creates a semaphore from the capacity and timeouts in `cfg`.
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.capacity, cfg.acquire_timeout, cfg.release_timeout)
    }

    /// Reserves one slot.
    ///
    /// Returns immediately when a slot is free; otherwise waits until one frees
    /// or `acquire_timeout` elapses. On timeout nothing is reserved.
    pub async fn acquire(&self) -> Result<Permit, GateError> {
        let timeout = self.acquire_timeout;
        match time::timeout(timeout, self.free.acquire()).await {
            Ok(Ok(slot)) => {
                slot.forget();
                self.held.add_permits(1);
                Ok(Permit { owner: self.id })
            }
            // Neither semaphore is ever closed; a closed one behaves like a wait that never succeeds.
            Ok(Err(_)) | Err(_) => Err(GateError::Timeout {
                op: GateOp::Acquire,
                timeout,
            }),
        }
    }

    /// Returns the slot held by `permit`.
    ///
    /// Waits at most `release_timeout` for an outstanding permit to take back.
    /// On timeout the slot stays reserved.
    ///
    /// A permit issued by another semaphore is refused without waiting; the
    /// slot it stands for stays reserved in the semaphore that issued it.
    pub async fn release(&self, permit: Permit) -> Result<(), GateError> {
        if permit.owner != self.id {
            return Err(GateError::ForeignPermit);
        }
        let timeout = self.release_timeout;
        match time::timeout(timeout, self.held.acquire()).await {
            Ok(Ok(slot)) => {
                slot.forget();
                self.free.add_permits(1);
                drop(permit);
                Ok(())
            }
            Ok(Err(_)) | Err(_) => Err(GateError::Timeout {
                op: GateOp::Release,
                timeout,
            }),
        }
    }

    /// Total number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently reserved.
    #[inline]
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }

    /// Number of slots currently free.
    #[inline]
    pub fn available(&self) -> usize {
        self.free.available_permits().min(self.capacity)
    }

    /// Configured acquire timeout.
    pub fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }

    /// Configured release timeout.
    pub fn release_timeout(&self) -> Duration {
        self.release_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    fn sem(capacity: usize, timeout_ms: u64) -> BoundedSemaphore {
        BoundedSemaphore::new(
            capacity,
            Duration::from_millis(timeout_ms),
            Duration::from_millis(timeout_ms),
        )
    }

    #[tokio::test]
    async fn test_acquire_until_full() {
        let s = sem(3, 50);
        let a = s.acquire().await.unwrap();
        let b = s.acquire().await.unwrap();
        let c = s.acquire().await.unwrap();
        assert_eq!(s.in_use(), 3);
        assert_eq!(s.available(), 0);

        s.release(a).await.unwrap();
        s.release(b).await.unwrap();
        s.release(c).await.unwrap();
        assert_eq!(s.in_use(), 0);
    }

    #[tokio::test]
    async fn test_zero_capacity_clamped_to_one() {
        let s = sem(0, 10);
        assert_eq!(s.capacity(), 1);
        let p = s.acquire().await.unwrap();
        s.release(p).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_timeout_is_not_early() {
        let s = sem(1, 300);
        let held = s.acquire().await.unwrap();

        let started = Instant::now();
        let err = s.acquire().await.unwrap_err();
        let waited = started.elapsed();

        assert_eq!(err.op(), GateOp::Acquire);
        assert!(waited >= Duration::from_millis(300), "returned after {waited:?}");
        assert!(waited < Duration::from_millis(350), "returned after {waited:?}");
        assert_eq!(s.in_use(), 1, "timed-out acquire must not reserve");

        s.release(held).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmatched_release_times_out() {
        let s = sem(2, 100);

        let started = Instant::now();
        let err = s.release(Permit::forged_for(&s)).await.unwrap_err();

        assert_eq!(err.op(), GateOp::Release);
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert_eq!(s.in_use(), 0);
        assert_eq!(s.available(), 2);
    }

    #[tokio::test]
    async fn test_permit_from_other_semaphore_is_refused() {
        let a = sem(1, 20);
        let b = sem(1, 20);
        let pa = a.acquire().await.unwrap();
        let pb = b.acquire().await.unwrap();

        assert_eq!(b.release(pa).await, Err(GateError::ForeignPermit));
        assert_eq!(b.in_use(), 1, "the real holder keeps its slot");
        assert!(b.acquire().await.is_err(), "no extra holder is admitted");
        assert_eq!(a.in_use(), 1);

        b.release(pb).await.unwrap();
        assert_eq!(b.in_use(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_gets_slot_released_in_time() {
        let s = Arc::new(sem(1, 500));
        let held = s.acquire().await.unwrap();

        let waiter = {
            let s = Arc::clone(&s);
            tokio::spawn(async move { s.acquire().await })
        };
        time::sleep(Duration::from_millis(100)).await;
        s.release(held).await.unwrap();

        let p = waiter.await.unwrap().expect("slot freed before timeout");
        assert_eq!(s.in_use(), 1);
        s.release(p).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_holders_never_exceed_capacity() {
        let s = Arc::new(sem(3, 1_000));
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let s = Arc::clone(&s);
            let inside = Arc::clone(&inside);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                for _ in 0..10 {
                    let Ok(p) = s.acquire().await else { continue };
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                    s.release(p).await.unwrap();
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(s.in_use(), 0);
    }
}
