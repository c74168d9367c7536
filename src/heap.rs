use crate::error::ShelfError;

/// Default bound on pending reservations per book.
pub const RESERVE_CAPACITY: usize = 20;

/// A single pending reservation for a book.
///
/// Reservations are served in ascending `(priority, requested_at)`
/// order; lower priority numbers win, ties go to the earlier request.
/// `requested_at` is a logical timestamp handed out by the owning
/// [`Shelf`](crate::Shelf), strictly increasing across the index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reservation {
    pub patron: u32,
    pub priority: u32,
    pub requested_at: u64,
}

impl Reservation {
    pub fn new(patron: u32, priority: u32, requested_at: u64) -> Reservation {
        Reservation {
            patron,
            priority,
            requested_at,
        }
    }

    #[inline]
    fn rank(&self) -> (u32, u64) {
        (self.priority, self.requested_at)
    }
}

/// Fixed-capacity binary min-heap of [`Reservation`] entries, stored
/// in a flat slot vector. Pushing beyond capacity is rejected with
/// [`ShelfError::QueueFull`]; the bound is part of the contract, not
/// a sizing hint.
#[derive(Clone, Debug)]
pub struct ReserveHeap {
    slots: Vec<Reservation>,
    capacity: usize,
}

impl Default for ReserveHeap {
    fn default() -> Self {
        ReserveHeap::new(RESERVE_CAPACITY)
    }
}

impl ReserveHeap {
    pub fn new(capacity: usize) -> ReserveHeap {
        ReserveHeap {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check whether `patron` already holds a pending reservation.
    /// Linear scan; the index uses this to reject double reservations
    /// before pushing, the heap itself does not enforce uniqueness.
    pub fn contains(&self, patron: u32) -> bool {
        self.slots.iter().any(|r| r.patron == patron)
    }

    /// Add a reservation, restoring heap order by sift-up.
    pub fn push(&mut self, entry: Reservation) -> Result<(), ShelfError> {
        if self.slots.len() == self.capacity {
            return Err(ShelfError::QueueFull);
        }
        self.slots.push(entry);
        self.sift_up(self.slots.len() - 1);
        Ok(())
    }

    /// Return the reservation with the smallest `(priority, requested_at)`.
    pub fn peek_min(&self) -> Result<&Reservation, ShelfError> {
        self.slots.first().ok_or(ShelfError::QueueEmpty)
    }

    /// Remove and return the minimum reservation. The last slot moves
    /// into the root position and sifts down.
    pub fn pop_min(&mut self) -> Result<Reservation, ShelfError> {
        if self.slots.is_empty() {
            return Err(ShelfError::QueueEmpty);
        }
        let min = self.slots.swap_remove(0);
        if !self.slots.is_empty() {
            self.sift_down(0);
        }
        Ok(min)
    }

    /// Ordered dump of the queue for reporting. Drains a clone through
    /// pop_min(), so the live queue keeps its contents and its exact
    /// subsequent pop order, equal-rank entries included.
    pub fn ordered(&self) -> Vec<Reservation> {
        let mut scratch = self.clone();
        let mut out = Vec::with_capacity(scratch.len());
        while let Ok(entry) = scratch.pop_min() {
            out.push(entry);
        }
        out
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.slots[idx].rank() >= self.slots[parent].rank() {
                break;
            }
            self.slots.swap(idx, parent);
            idx = parent;
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        loop {
            let left = 2 * idx + 1;
            if left >= self.slots.len() {
                break;
            }
            let right = left + 1;
            // prefer the right child only when strictly smaller.
            let child = if right < self.slots.len()
                && self.slots[right].rank() < self.slots[left].rank()
            {
                right
            } else {
                left
            };
            if self.slots[idx].rank() <= self.slots[child].rank() {
                break;
            }
            self.slots.swap(idx, child);
            idx = child;
        }
    }
}
