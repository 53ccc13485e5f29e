// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License

use crate::bitvec::BitVector;
use crate::sorted::SortedVec;
use crate::Time;
use std::fmt::{Debug, Formatter};

/// The value of a net at and after `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Transition {
    timestamp: Time,
    value: BitVector,
}

impl Transition {
    #[inline]
    pub fn timestamp(&self) -> Time {
        self.timestamp
    }

    #[inline]
    pub fn value(&self) -> &BitVector {
        &self.value
    }
}

#[inline]
fn transition_key(t: &Transition) -> Time {
    t.timestamp
}

/// All value changes of a single net, ordered by time.
#[derive(Clone)]
pub struct TransitionVector {
    width: u32,
    transitions: SortedVec<Transition>,
}

impl Debug for TransitionVector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TransitionVector({} bits, {} changes)",
            self.width,
            self.transitions.len()
        )
    }
}

impl TransitionVector {
    pub fn new(width: u32) -> Self {
        Self {
            width,
            transitions: SortedVec::new(transition_key),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Records `value` at `timestamp`. Timestamps must be appended in non-decreasing order,
    /// otherwise lookups return wrong results. Only debug builds check this.
    pub fn append(&mut self, timestamp: Time, value: &BitVector) {
        self.transitions.push(Transition {
            timestamp,
            value: value.clone(),
        });
    }

    /// Positions a cursor on the last transition at or before `timestamp`.
    /// If `timestamp` precedes all transitions, the cursor points to the first one.
    pub fn find_floor(&self, timestamp: Time) -> TransitionCursor<'_> {
        TransitionCursor {
            transitions: self.transitions.as_slice(),
            index: self.transitions.floor_index(timestamp),
        }
    }

    /// Timestamp of the last transition or 0 if there are none.
    pub fn max_timestamp(&self) -> Time {
        self.transitions.last().map(transition_key).unwrap_or(0)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transition> {
        self.transitions.iter()
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.transitions.shrink_to_fit();
    }
}

/// Forward-only cursor over the transitions of one net.
///
/// `current` never moves the cursor. Each call to `next` moves one transition ahead and
/// returns the transition that is now current.
#[derive(Debug, Clone)]
pub struct TransitionCursor<'a> {
    transitions: &'a [Transition],
    index: usize,
}

impl<'a> TransitionCursor<'a> {
    /// Returns `None` only if the net has no transitions.
    #[inline]
    pub fn current(&self) -> Option<&'a Transition> {
        self.transitions.get(self.index)
    }

    #[inline]
    pub fn has_next(&self) -> bool {
        self.index + 1 < self.transitions.len()
    }

    pub fn next_timestamp(&self) -> Option<Time> {
        self.transitions.get(self.index + 1).map(transition_key)
    }

    pub fn prev_timestamp(&self) -> Option<Time> {
        let prev = self.index.checked_sub(1)?;
        self.transitions.get(prev).map(transition_key)
    }

    /// Position of the cursor within the transition vector.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<'a> Iterator for TransitionCursor<'a> {
    type Item = &'a Transition;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() {
            self.index += 1;
            self.current()
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.transitions.len().saturating_sub(self.index + 1);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TransitionCursor<'_> {}
