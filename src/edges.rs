//! Candidate edge set.
//!
//! Holds the "frontier" cells the local search tries to relocate: occupied
//! cells that sit at the boundary of both their group's and their
//! professor's occupied run that day.
//!
//! # Algorithm
//!
//! An indexed binary max-heap over random priorities drawn at insertion,
//! plus a side table from cell to heap slot:
//!
//! - `push`: O(1) duplicate check, then sift-up, O(log n)
//! - `pop`: take the top (the member with the highest random draw), O(log n)
//! - `remove`: swap with the last slot, shrink, re-sift, O(log n)
//!
//! The heap order is random, so repeated pops visit members in random
//! order without ever scanning the set.

use std::collections::HashMap;

use rand::Rng;

use crate::models::Cell;

#[derive(Debug, Clone, Copy)]
struct Entry {
    cell: Cell,
    priority: u64,
}

/// Duplicate-free set of candidate cells with randomized pop.
///
/// # Example
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::SmallRng;
/// use u_timetable::edges::EdgeSet;
/// use u_timetable::models::{Cell, Slot};
///
/// let mut rng = SmallRng::seed_from_u64(7);
/// let mut edges = EdgeSet::new();
/// let cell = Cell::new(1, 2, Slot::new(1, 3));
/// assert!(edges.push(cell, &mut rng));
/// assert!(!edges.push(cell, &mut rng)); // already present
/// assert_eq!(edges.pop(), Some(cell));
/// assert!(edges.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EdgeSet {
    heap: Vec<Entry>,
    index: HashMap<Cell, usize>,
}

impl EdgeSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    pub fn contains(&self, cell: &Cell) -> bool {
        self.index.contains_key(cell)
    }

    /// Inserts `cell`; no-op if already present.
    ///
    /// Returns whether the cell was inserted.
    pub fn push<R: Rng + ?Sized>(&mut self, cell: Cell, rng: &mut R) -> bool {
        if self.index.contains_key(&cell) {
            return false;
        }
        let pos = self.heap.len();
        self.heap.push(Entry {
            cell,
            priority: rng.random(),
        });
        self.index.insert(cell, pos);
        self.sift_up(pos);
        true
    }

    /// Removes and returns a random member.
    pub fn pop(&mut self) -> Option<Cell> {
        if self.heap.is_empty() {
            return None;
        }
        Some(self.take(0))
    }

    /// Removes `cell`; no-op if absent.
    ///
    /// Returns whether the cell was present.
    pub fn remove(&mut self, cell: &Cell) -> bool {
        match self.index.get(cell) {
            Some(&pos) => {
                self.take(pos);
                true
            }
            None => false,
        }
    }

    /// Removes every member.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.index.clear();
    }

    /// Members in heap order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.heap.iter().map(|e| &e.cell)
    }

    /// Removes the entry at heap position `pos`.
    fn take(&mut self, pos: usize) -> Cell {
        let entry = self.heap.swap_remove(pos);
        self.index.remove(&entry.cell);
        if pos < self.heap.len() {
            self.index.insert(self.heap[pos].cell, pos);
            self.sift_up(pos);
            self.sift_down(pos);
        }
        entry.cell
    }

    fn swap(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        self.heap.swap(i, j);
        self.index.insert(self.heap[i].cell, i);
        self.index.insert(self.heap[j].cell, j);
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.heap[parent].priority >= self.heap[pos].priority {
                break;
            }
            self.swap(parent, pos);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let n = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut top = pos;
            if left < n && self.heap[left].priority > self.heap[top].priority {
                top = left;
            }
            if right < n && self.heap[right].priority > self.heap[top].priority {
                top = right;
            }
            if top == pos {
                break;
            }
            self.swap(pos, top);
            pos = top;
        }
    }
}
