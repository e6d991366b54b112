//! Bounded binary min-heap with removal by handle.
//!
//! Slots live in an [`Arena`] and record their own position in the heap
//! array. Every move during a sift rewrites that position, which is what lets
//! [`PriorityQueue::delete_at`] find an arbitrary slot in O(1) before
//! restoring order in O(log n).

use crate::arena::{Arena, Handle};
use crate::errors::QueueError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle(Handle);

#[derive(Debug, Clone)]
struct Slot<K, T> {
    key: K,
    item: T,
    pos: usize,
}

#[derive(Debug, Clone)]
pub struct PriorityQueue<K, T> {
    slots: Arena<Slot<K, T>>,
    /// Heap-ordered slot indices.
    order: Vec<usize>,
    capacity: usize,
}

impl<K: Ord + Copy, T> PriorityQueue<K, T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Arena::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.order.len() >= self.capacity
    }

    /// Appends at the next free position and sifts up. A full queue is left
    /// unchanged.
    pub fn insert(&mut self, key: K, item: T) -> Result<SlotHandle, QueueError> {
        if self.is_full() {
            return Err(QueueError::CapacityExceeded(self.capacity));
        }

        let pos = self.order.len();
        let handle = self.slots.insert(Slot { key, item, pos });
        self.order.push(handle.index());
        self.sift_up(pos);

        Ok(SlotHandle(handle))
    }

    pub fn peek(&self) -> Option<(K, &T)> {
        let root = *self.order.first()?;
        let slot = &self.slots[root];
        Some((slot.key, &slot.item))
    }

    pub fn extract_min(&mut self) -> Option<(K, T)> {
        let root = *self.order.first()?;
        let handle = self.slots.handle_at(root)?;

        self.detach(0);
        self.slots.remove(handle).map(|slot| (slot.key, slot.item))
    }

    /// Removes the slot behind `handle` from wherever it currently sits.
    pub fn delete_at(&mut self, handle: SlotHandle) -> Option<(K, T)> {
        let pos = self.slots.get(handle.0)?.pos;

        self.detach(pos);
        self.slots.remove(handle.0).map(|slot| (slot.key, slot.item))
    }

    /// Replaces a slot's key and moves it to restore heap order. Returns the
    /// previous key.
    pub fn rekey(&mut self, handle: SlotHandle, key: K) -> Option<K> {
        let slot = self.slots.get_mut(handle.0)?;
        let previous = std::mem::replace(&mut slot.key, key);
        let pos = slot.pos;

        self.resift(pos);
        Some(previous)
    }

    pub fn get(&self, handle: SlotHandle) -> Option<&T> {
        self.slots.get(handle.0).map(|slot| &slot.item)
    }

    pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut T> {
        self.slots.get_mut(handle.0).map(|slot| &mut slot.item)
    }

    pub fn key(&self, handle: SlotHandle) -> Option<K> {
        self.slots.get(handle.0).map(|slot| slot.key)
    }

    pub fn contains(&self, handle: SlotHandle) -> bool {
        self.slots.contains(handle.0)
    }

    /// Moves the last slot into `pos` and shrinks the heap by one. The slot
    /// previously at `pos` stays in the arena for the caller to free.
    fn detach(&mut self, pos: usize) {
        let last = self.order.len() - 1;
        self.order.swap(pos, last);
        self.order.pop();

        if pos < self.order.len() {
            let moved = self.order[pos];
            self.slots[moved].pos = pos;
            self.resift(pos);
        }
    }

    /// A slot placed at an arbitrary position can be out of order with its
    /// parent or with its children, never both.
    fn resift(&mut self, pos: usize) {
        if pos > 0 && self.key_at(pos) < self.key_at(parent_of(pos)) {
            self.sift_up(pos);
        } else {
            self.sift_down(pos);
        }
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = parent_of(pos);
            if self.key_at(pos) >= self.key_at(parent) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.order.len();
        loop {
            let left = left_child_of(pos);
            if left >= len {
                break;
            }

            // Ties go to the left child.
            let right = left + 1;
            let child = if right < len && self.key_at(right) < self.key_at(left) {
                right
            } else {
                left
            };

            if self.key_at(child) >= self.key_at(pos) {
                break;
            }
            self.swap(pos, child);
            pos = child;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.order.swap(a, b);
        let (slot_a, slot_b) = (self.order[a], self.order[b]);
        self.slots[slot_a].pos = a;
        self.slots[slot_b].pos = b;
    }

    fn key_at(&self, pos: usize) -> K {
        self.slots[self.order[pos]].key
    }
}

#[inline]
fn parent_of(pos: usize) -> usize {
    (pos - 1) / 2
}

#[inline]
fn left_child_of(pos: usize) -> usize {
    2 * pos + 1
}

#[cfg(test)]
impl<K: Ord + Copy + std::fmt::Debug, T> PriorityQueue<K, T> {
    pub(crate) fn assert_invariants(&self) {
        assert!(self.order.len() <= self.capacity);
        assert_eq!(self.order.len(), self.slots.len());

        for (pos, &slot) in self.order.iter().enumerate() {
            assert_eq!(self.slots[slot].pos, pos, "stale position for slot {slot}");
            if pos > 0 {
                let parent = parent_of(pos);
                assert!(
                    self.key_at(parent) <= self.key_at(pos),
                    "{:?} at {} sits above smaller {:?} at {}",
                    self.key_at(parent),
                    parent,
                    self.key_at(pos),
                    pos
                );
            }
        }
    }
}
