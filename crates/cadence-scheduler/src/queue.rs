//! Binary min-heap keyed by a numeric priority.
//!
//! Smaller priority means more urgent: the item with the lowest priority sits
//! at the root and is returned first by [`PriorityQueue::peek`] and
//! [`PriorityQueue::pop`]. The queue knows nothing about scheduling.
//!
//! Items with equal priority come out in an unspecified order. The heap is
//! not stable and callers must not rely on insertion order for ties.

use crate::error::{Result, SchedulerError};

/// Anything that can sit in a [`PriorityQueue`].
pub trait Prioritized {
    /// Sort key. `None` (or NaN) means the item has no priority and may not be queued.
    fn priority(&self) -> Option<f64>;
}

impl Prioritized for f64 {
    fn priority(&self) -> Option<f64> {
        Some(*self)
    }
}

/// Min-heap over `T`, backed by a `Vec`.
///
/// push / pop are O(log n), peek / len / clear are O(1). Removal of an
/// arbitrary item is O(n) because the heap is not indexed by item.
#[derive(Debug, Clone)]
pub struct PriorityQueue<T> {
    items: Vec<T>,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Prioritized> PriorityQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Add an item. Fails with [`SchedulerError::MissingPriority`] if the item
    /// has no usable priority; the queue is left untouched in that case.
    pub fn push(&mut self, item: T) -> Result<()> {
        match item.priority() {
            Some(p) if !p.is_nan() => {}
            _ => return Err(SchedulerError::MissingPriority),
        }

        self.items.push(item);
        self.bubble_up(self.items.len() - 1);
        Ok(())
    }

    /// The most urgent item, without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    /// Remove and return the most urgent item.
    pub fn pop(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        // swap_remove moves the last element into the root slot.
        let top = self.items.swap_remove(0);
        if !self.items.is_empty() {
            self.sink_down(0);
        }
        Some(top)
    }

    /// Remove the first item matching `pred`, scanning linearly. No-op when
    /// nothing matches.
    pub fn remove_where<F>(&mut self, mut pred: F) -> Option<T>
    where
        F: FnMut(&T) -> bool,
    {
        let index = self.items.iter().position(|item| pred(item))?;
        let removed = self.items.swap_remove(index);

        // If the removed item was the last one there is no hole to fill.
        // Otherwise the former last element now sits at `index` and may need
        // to move either way; at most one of these does anything.
        if index < self.items.len() {
            self.bubble_up(index);
            self.sink_down(index);
        }
        Some(removed)
    }

    /// Remove a specific item, compared by `PartialEq`.
    pub fn remove(&mut self, item: &T) -> Option<T>
    where
        T: PartialEq,
    {
        self.remove_where(|candidate| candidate == item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterate in heap (not priority) order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    fn key(&self, index: usize) -> f64 {
        // push rejects missing priorities, so the fallback only guards items
        // whose priority changed through interior mutability after insertion.
        self.items[index].priority().unwrap_or(f64::INFINITY)
    }

    fn bubble_up(&mut self, mut n: usize) {
        let priority = self.key(n);
        while n > 0 {
            let parent = (n - 1) / 2;
            if self.key(parent) <= priority {
                break;
            }
            self.items.swap(parent, n);
            n = parent;
        }
    }

    fn sink_down(&mut self, mut n: usize) {
        let len = self.items.len();
        let priority = self.key(n);

        loop {
            let right = (n + 1) * 2;
            let left = right - 1;
            let mut swap = None;
            let mut smallest = priority;

            if left < len && self.key(left) < smallest {
                swap = Some(left);
                smallest = self.key(left);
            }
            if right < len && self.key(right) < smallest {
                swap = Some(right);
            }

            match swap {
                Some(child) => {
                    self.items.swap(n, child);
                    n = child;
                }
                None => break,
            }
        }
    }
}
