//! Key Order Module
//!
//! Tracks the eviction order of keys for the FIFO and LRU policies.

use std::collections::VecDeque;

// == Key Order ==
/// Ordered sequence of cache keys without duplicates.
///
/// Keys are stored in a VecDeque where:
/// - Front (position 0) = next eviction candidate
/// - Back = most recently inserted (FIFO) or used (LRU)
#[derive(Debug, Default)]
pub struct KeyOrder {
    order: VecDeque<String>,
}

impl KeyOrder {
    // == Constructor ==
    /// Creates a new empty key order.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Push ==
    /// Appends a key at the back unless it is already tracked.
    ///
    /// Returns false when the key was already present (its position is kept).
    pub fn push(&mut self, key: &str) -> bool {
        if self.contains(key) {
            return false;
        }
        self.order.push_back(key.to_string());
        true
    }

    // == Touch ==
    /// Moves a key to the back, appending it if it is new.
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.order.push_back(key.to_string());
    }

    // == Remove ==
    /// Removes a key from the order. Returns true if it was tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.order.iter().position(|k| k == key) {
            Some(index) => {
                self.order.remove(index);
                true
            }
            None => false,
        }
    }

    // == Pop Front ==
    /// Returns and removes the eviction candidate.
    ///
    /// Returns None if the order is empty.
    pub fn pop_front(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    /// Returns the eviction candidate without removing it.
    pub fn front(&self) -> Option<&String> {
        self.order.front()
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }

    /// Iterates keys from eviction candidate to newest.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }
}
