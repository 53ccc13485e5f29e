// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License

use crate::Time;
use std::fmt::{Debug, Formatter};
use std::ops::Index;

/// A vector that is kept ordered by a key derived from its elements.
/// Lookups use binary search and always round down to the closest element.
#[derive(Clone)]
pub struct SortedVec<T> {
    items: Vec<T>,
    key: fn(&T) -> Time,
}

impl<T: Debug> Debug for SortedVec<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<T> SortedVec<T> {
    pub fn new(key: fn(&T) -> Time) -> Self {
        Self {
            items: Vec::new(),
            key,
        }
    }

    pub fn with_capacity(capacity: usize, key: fn(&T) -> Time) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            key,
        }
    }

    #[inline]
    pub fn key_of(&self, item: &T) -> Time {
        (self.key)(item)
    }

    /// Inserts `item` after all elements with a key less than or equal to its key.
    /// Returns the position of the new element.
    pub fn insert_sorted(&mut self, item: T) -> usize {
        let key = self.key_of(&item);
        let pos = self.items.partition_point(|e| (self.key)(e) <= key);
        self.items.insert(pos, item);
        pos
    }

    /// Appends `item` without searching. The caller guarantees that its key is not smaller than
    /// the key of the last element.
    #[inline]
    pub fn push(&mut self, item: T) {
        debug_assert!(
            self.items
                .last()
                .map(|last| self.key_of(last) <= self.key_of(&item))
                .unwrap_or(true),
            "keys must be appended in non-decreasing order"
        );
        self.items.push(item);
    }

    /// Index of the last element whose key is less than or equal to `key`.
    /// Returns 0 if the sequence is empty or if `key` precedes all elements.
    pub fn floor_index(&self, key: Time) -> usize {
        self.items
            .partition_point(|e| (self.key)(e) <= key)
            .saturating_sub(1)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn remove(&mut self, index: usize) -> T {
        self.items.remove(index)
    }

    #[inline]
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn shrink_to_fit(&mut self) {
        self.items.shrink_to_fit();
    }
}

impl<T> Index<usize> for SortedVec<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a SortedVec<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
