//! Binary min-heap keyed by `(priority, tie)`.
//!
//! Ordering is by priority first, then by tie-break key, both ascending.
//! When every live entry carries a distinct key the extraction order is fully
//! determined by the keys, independent of insertion order or of whether the
//! heap was bulk-built.

use crate::error::CompressError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<T> {
    pub priority: u64,
    pub tie: u32,
    pub value: T,
}

impl<T> Entry<T> {
    pub fn new(priority: u64, tie: u32, value: T) -> Self {
        Self { priority, tie, value }
    }

    fn key(&self) -> (u64, u32) {
        (self.priority, self.tie)
    }
}

#[derive(Debug, Clone)]
pub struct MinPriorityQueue<T> {
    heap: Vec<Entry<T>>,
}

impl<T> Default for MinPriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MinPriorityQueue<T> {
    pub fn new() -> Self {
        Self { heap: Vec::new() }
    }

    /// Bulk-load an unordered collection and heapify in O(n).
    pub fn build_from(items: Vec<Entry<T>>) -> Self {
        let mut queue = Self { heap: items };
        for i in (0..queue.heap.len() / 2).rev() {
            queue.sift_down(i);
        }
        queue
    }

    pub fn push(&mut self, priority: u64, tie: u32, value: T) {
        self.heap.push(Entry::new(priority, tie, value));
        self.sift_up(self.heap.len() - 1);
    }

    /// Remove and return the minimum entry.
    pub fn pop(&mut self) -> Result<Entry<T>, CompressError> {
        if self.heap.is_empty() {
            return Err(CompressError::EmptyQueue);
        }
        let entry = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Ok(entry)
    }

    pub fn peek(&self) -> Option<&Entry<T>> {
        self.heap.first()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Read-only view of the live entries in heap order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u32, &T)> {
        self.heap.iter().map(|e| (e.priority, e.tie, &e.value))
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.heap[a].key() < self.heap[b].key()
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.less(index, parent) {
                break;
            }
            self.heap.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let n = self.heap.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;

            if left < n && self.less(left, smallest) {
                smallest = left;
            }
            if right < n && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == index {
                return;
            }
            self.heap.swap(index, smallest);
            index = smallest;
        }
    }
}
