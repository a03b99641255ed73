//! Shared-memory primitives handed across worker threads.
//!
//! Both types are thin handles over a reference-counted backing cell. A
//! handle can be exported with `to_shareable` and rebuilt on another thread
//! with `from_shareable`; every handle built from the same shareable observes
//! the same memory.

use std::sync::atomic::{AtomicI32, AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// Transferable backing memory of a [`SharedI64`].
#[derive(Debug, Clone)]
pub struct ShareableI64(Arc<AtomicI64>);

/// A 64-bit signed integer visible to every thread holding a handle to it.
#[derive(Debug)]
pub struct SharedI64 {
    cell: Arc<AtomicI64>,
}

impl SharedI64 {
    /// A fresh zero-valued integer.
    pub fn new() -> Self {
        Self {
            cell: Arc::new(AtomicI64::new(0)),
        }
    }

    pub fn from_shareable(shareable: ShareableI64) -> Self {
        Self { cell: shareable.0 }
    }

    pub fn to_shareable(&self) -> ShareableI64 {
        ShareableI64(Arc::clone(&self.cell))
    }

    pub fn load(&self) -> i64 {
        self.cell.load(Ordering::Acquire)
    }

    /// Replace the value with `next` if it currently equals `expected`.
    ///
    /// Returns the value observed before the exchange, successful or not.
    pub fn compare_exchange(&self, expected: i64, next: i64) -> i64 {
        match self
            .cell
            .compare_exchange(expected, next, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(previous) | Err(previous) => previous,
        }
    }
}

impl Default for SharedI64 {
    fn default() -> Self {
        Self::new()
    }
}

const FREE: i32 = 0;
const LOCKED: i32 = 1;

/// Lock word plus the wait queue sleeping threads park on.
#[derive(Debug, Default)]
struct MutexState {
    word: AtomicI32,
    waiters: Mutex<()>,
    wakeup: Condvar,
}

/// Transferable backing memory of a [`SharedMutex`].
#[derive(Debug, Clone)]
pub struct ShareableMutex(Arc<MutexState>);

/// Two-state lock living in shared memory.
///
/// Acquisition is a compare-and-exchange from free to locked; contended
/// threads sleep on a condition variable until the holder releases the word,
/// so no waiter spins while the lock is held.
#[derive(Debug)]
pub struct SharedMutex {
    state: Arc<MutexState>,
}

impl SharedMutex {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MutexState::default()),
        }
    }

    pub fn from_shareable(shareable: ShareableMutex) -> Self {
        Self { state: shareable.0 }
    }

    pub fn to_shareable(&self) -> ShareableMutex {
        ShareableMutex(Arc::clone(&self.state))
    }

    /// Block until the lock is ours. Released when the guard is dropped.
    pub fn lock(&self) -> SharedMutexGuard<'_> {
        loop {
            if self.try_acquire() {
                return SharedMutexGuard { mutex: self };
            }
            let mut waiters = self.state.waiters.lock();
            // Re-checked under the wait queue lock: a release that happened
            // after the failed exchange must not be missed.
            if self.state.word.load(Ordering::Acquire) == LOCKED {
                self.state.wakeup.wait(&mut waiters);
            }
        }
    }

    #[cfg(test)]
    fn try_lock(&self) -> Option<SharedMutexGuard<'_>> {
        self.try_acquire().then(|| SharedMutexGuard { mutex: self })
    }

    #[cfg(test)]
    fn is_locked(&self) -> bool {
        self.state.word.load(Ordering::Acquire) == LOCKED
    }

    fn try_acquire(&self) -> bool {
        self.state
            .word
            .compare_exchange(FREE, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Flip the word back to free and wake one sleeper.
    ///
    /// # Panics
    /// Panics if the lock was not held: that is a bug in the caller, never a
    /// recoverable condition.
    fn release(&self) {
        let released = self
            .state
            .word
            .compare_exchange(LOCKED, FREE, Ordering::Release, Ordering::Relaxed)
            .is_ok();
        assert!(
            released,
            "inconsistent lock state: released a mutex that was not held"
        );
        let _waiters = self.state.waiters.lock();
        self.state.wakeup.notify_one();
    }
}

impl Default for SharedMutex {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of holding a [`SharedMutex`].
#[derive(Debug)]
pub struct SharedMutexGuard<'a> {
    mutex: &'a SharedMutex,
}

impl Drop for SharedMutexGuard<'_> {
    fn drop(&mut self) {
        self.mutex.release();
    }
}
