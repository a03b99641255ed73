//! The shared input cursor workers reserve byte ranges from.

use crate::sync::{ShareableI64, ShareableMutex, SharedI64, SharedMutex, SharedMutexGuard};

/// Transferable handle to a [`SharedCursor`]'s backing memory.
#[derive(Debug, Clone)]
pub struct CursorHandle {
    position: ShareableI64,
    lock: ShareableMutex,
}

/// Offset of the first unread byte of the input, shared by all workers.
///
/// The position only moves forward, and only through a [`Reservation`]: the
/// lock is taken before the position is read and released after it has been
/// advanced, so no two workers can ever claim overlapping bytes.
#[derive(Debug)]
pub struct SharedCursor {
    position: SharedI64,
    lock: SharedMutex,
}

impl SharedCursor {
    /// A fresh cursor at offset zero.
    pub fn new() -> Self {
        Self {
            position: SharedI64::new(),
            lock: SharedMutex::new(),
        }
    }

    pub fn from_shareable(handle: CursorHandle) -> Self {
        Self {
            position: SharedI64::from_shareable(handle.position),
            lock: SharedMutex::from_shareable(handle.lock),
        }
    }

    pub fn to_shareable(&self) -> CursorHandle {
        CursorHandle {
            position: self.position.to_shareable(),
            lock: self.lock.to_shareable(),
        }
    }

    /// Current offset, without taking the lock.
    pub fn read(&self) -> u64 {
        self.position.load() as u64
    }

    /// Enter the critical section and observe the current offset.
    ///
    /// Blocks while another worker holds a reservation. Dropping the
    /// reservation without committing leaves the cursor where it was.
    pub fn reserve(&self) -> Reservation<'_> {
        let guard = self.lock.lock();
        let offset = self.position.load();
        Reservation {
            cursor: self,
            offset,
            _guard: guard,
        }
    }
}

impl Default for SharedCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive claim on the cursor, starting at [`Reservation::offset`].
#[derive(Debug)]
pub struct Reservation<'a> {
    cursor: &'a SharedCursor,
    offset: i64,
    _guard: SharedMutexGuard<'a>,
}

impl Reservation<'_> {
    pub fn offset(&self) -> u64 {
        self.offset as u64
    }

    /// Advance the cursor past `consumed` bytes and leave the critical section.
    ///
    /// Returns the new offset.
    pub fn commit(self, consumed: u64) -> u64 {
        let next = self.offset + consumed as i64;
        let previous = self.cursor.position.compare_exchange(self.offset, next);
        assert_eq!(
            previous, self.offset,
            "cursor moved while a reservation was held"
        );
        next as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[test]
    fn test_new_cursor_starts_at_zero() {
        let cursor = SharedCursor::new();
        assert_eq!(cursor.read(), 0);
        assert_eq!(cursor.reserve().offset(), 0);
    }

    #[test]
    fn test_commit_advances() {
        let cursor = SharedCursor::new();
        assert_eq!(cursor.reserve().commit(10), 10);
        assert_eq!(cursor.reserve().commit(5), 15);
        assert_eq!(cursor.read(), 15);
    }

    #[test]
    fn test_abandoned_reservation_leaves_cursor() {
        let cursor = SharedCursor::new();
        cursor.reserve().commit(3);
        {
            let reservation = cursor.reserve();
            assert_eq!(reservation.offset(), 3);
        }
        assert_eq!(cursor.read(), 3);
        // The lock was released with the abandoned reservation.
        assert_eq!(cursor.reserve().commit(1), 4);
    }

    #[test]
    fn test_shared_handles_advance_same_cursor() {
        let cursor = SharedCursor::new();
        let other = SharedCursor::from_shareable(cursor.to_shareable());
        other.reserve().commit(7);
        assert_eq!(cursor.read(), 7);
    }

    #[test]
    fn test_concurrent_reservations_partition_range() {
        let cursor = SharedCursor::new();
        let claimed = Arc::new(Mutex::new(Vec::new()));
        let end = 10_000u64;

        let handles: Vec<_> = (0..6u64)
            .map(|i| {
                let cursor = SharedCursor::from_shareable(cursor.to_shareable());
                let claimed = Arc::clone(&claimed);
                thread::spawn(move || loop {
                    let reservation = cursor.reserve();
                    let offset = reservation.offset();
                    if offset >= end {
                        return;
                    }
                    // Vary the claim size per thread.
                    let len = (7 + i * 3).min(end - offset);
                    reservation.commit(len);
                    claimed.lock().unwrap().push(offset..offset + len);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut ranges = claimed.lock().unwrap().clone();
        ranges.sort_by_key(|r| r.start);
        let mut expected_start = 0;
        for range in &ranges {
            assert_eq!(range.start, expected_start);
            expected_start = range.end;
        }
        assert_eq!(expected_start, end);
        assert_eq!(cursor.read(), end);
    }
}
