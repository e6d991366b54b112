//! Slot arena backing the ride index and the ride queue.
//!
//! Entries are addressed by a [`Handle`] that pairs a slot index with the
//! slot's generation. Removing an entry bumps the generation, so a handle kept
//! past removal stops resolving even after the slot is reused.

use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: usize,
    generation: u32,
}

impl Handle {
    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

#[derive(Debug, Clone)]
pub struct Arena<T> {
    entries: Vec<Entry<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, value: T) -> Handle {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index];
            entry.value = Some(value);
            return Handle {
                index,
                generation: entry.generation,
            };
        }

        let index = self.entries.len();
        self.entries.push(Entry {
            generation: 0,
            value: Some(value),
        });
        Handle {
            index,
            generation: 0,
        }
    }

    /// Removes the entry behind `handle`. Returns `None` for a stale handle.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let entry = self.entries.get_mut(handle.index)?;
        if entry.generation != handle.generation {
            return None;
        }

        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.entries
            .get(handle.index)
            .filter(|entry| entry.generation == handle.generation)
            .and_then(|entry| entry.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.entries
            .get_mut(handle.index)
            .filter(|entry| entry.generation == handle.generation)
            .and_then(|entry| entry.value.as_mut())
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Current handle for an occupied slot.
    pub fn handle_at(&self, index: usize) -> Option<Handle> {
        self.entries.get(index).and_then(|entry| {
            entry.value.as_ref().map(|_| Handle {
                index,
                generation: entry.generation,
            })
        })
    }
}

/// Raw slot access for links held inside a structure. Panics on a vacant slot.
impl<T> Index<usize> for Arena<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.entries[index].value.as_ref() {
            Some(value) => value,
            None => panic!("arena slot {index} is vacant"),
        }
    }
}

impl<T> IndexMut<usize> for Arena<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        match self.entries[index].value.as_mut() {
            Some(value) => value,
            None => panic!("arena slot {index} is vacant"),
        }
    }
}
