// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
//
// Named timestamps that a viewer can place on top of a trace.

use crate::sorted::SortedVec;
use crate::Time;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    id: u32,
    description: String,
    timestamp: Time,
}

impl Marker {
    pub fn id(&self) -> u32 {
        self.id
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn timestamp(&self) -> Time {
        self.timestamp
    }
}

#[inline]
fn marker_key(m: &Marker) -> Time {
    m.timestamp
}

#[derive(Debug, Clone)]
pub struct MarkerList {
    markers: SortedVec<Marker>,
    next_id: u32,
}

impl Default for MarkerList {
    fn default() -> Self {
        Self {
            markers: SortedVec::new(marker_key),
            next_id: 1,
        }
    }
}

impl MarkerList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a marker and returns its id. Ids start at 1.
    pub fn add(&mut self, description: impl Into<String>, timestamp: Time) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.markers.insert_sorted(Marker {
            id,
            description: description.into(),
            timestamp,
        });
        id
    }

    /// Index of the last marker at or before `timestamp`, rounding up to the first marker.
    pub fn marker_at(&self, timestamp: Time) -> Option<usize> {
        if self.markers.is_empty() {
            None
        } else {
            Some(self.markers.floor_index(timestamp))
        }
    }

    /// Removes the marker closest to `timestamp` if it is less than `tolerance` away.
    /// Only the floor marker and its successor are considered.
    pub fn remove_near(&mut self, timestamp: Time, tolerance: Time) -> Option<Marker> {
        let index = self.marker_at(timestamp)?;
        let candidates = [Some(index), index.checked_add(1)];
        let hit = candidates
            .into_iter()
            .flatten()
            .filter_map(|ii| self.markers.get(ii).map(|m| (ii, m.timestamp.abs_diff(timestamp))))
            .filter(|(_, distance)| *distance < tolerance)
            .min_by_key(|(_, distance)| *distance)?;
        Some(self.markers.remove(hit.0))
    }

    /// First marker strictly after `timestamp`.
    pub fn next_after(&self, timestamp: Time) -> Option<&Marker> {
        let index = self.marker_at(timestamp)?;
        let m = &self.markers[index];
        if m.timestamp > timestamp {
            Some(m)
        } else {
            self.markers.get(index + 1)
        }
    }

    /// Last marker strictly before `timestamp`.
    pub fn prev_before(&self, timestamp: Time) -> Option<&Marker> {
        let index = self.marker_at(timestamp)?;
        let m = &self.markers[index];
        if m.timestamp < timestamp {
            Some(m)
        } else {
            // walk back over markers that share the query time
            self.markers.as_slice()[..index]
                .iter()
                .rev()
                .find(|m| m.timestamp < timestamp)
        }
    }

    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    /// Removes all markers and restarts ids at 1.
    pub fn clear(&mut self) {
        self.markers.clear();
        self.next_id = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamps(list: &MarkerList) -> Vec<Time> {
        list.iter().map(|m| m.timestamp()).collect()
    }

    #[test]
    fn test_add_keeps_order() {
        let mut list = MarkerList::new();
        assert_eq!(list.add("b", 200), 1);
        assert_eq!(list.add("a", 100), 2);
        assert_eq!(list.add("c", 300), 3);
        assert_eq!(timestamps(&list), [100, 200, 300]);
        assert_eq!(list.get(0).unwrap().description(), "a");
        assert_eq!(list.get(0).unwrap().id(), 2);
    }

    #[test]
    fn test_marker_at() {
        let mut list = MarkerList::new();
        assert_eq!(list.marker_at(10), None);
        list.add("a", 100);
        list.add("b", 200);
        assert_eq!(list.marker_at(50), Some(0));
        assert_eq!(list.marker_at(150), Some(0));
        assert_eq!(list.marker_at(200), Some(1));
        assert_eq!(list.marker_at(1000), Some(1));
    }

    #[test]
    fn test_remove_near() {
        let mut list = MarkerList::new();
        list.add("a", 100);
        list.add("b", 200);
        // too far from both
        assert!(list.remove_near(150, 10).is_none());
        // rounds down to `a`, but `b` is closer
        let removed = list.remove_near(197, 10).unwrap();
        assert_eq!(removed.description(), "b");
        // in front of the first marker
        let removed = list.remove_near(95, 10).unwrap();
        assert_eq!(removed.description(), "a");
        assert!(list.is_empty());
        assert!(list.remove_near(100, 10).is_none());
    }

    #[test]
    fn test_navigation() {
        let mut list = MarkerList::new();
        list.add("a", 100);
        list.add("b", 200);
        list.add("c", 300);
        assert_eq!(list.next_after(0).unwrap().timestamp(), 100);
        assert_eq!(list.next_after(100).unwrap().timestamp(), 200);
        assert_eq!(list.next_after(250).unwrap().timestamp(), 300);
        assert!(list.next_after(300).is_none());

        assert!(list.prev_before(100).is_none());
        assert!(list.prev_before(50).is_none());
        assert_eq!(list.prev_before(200).unwrap().timestamp(), 100);
        assert_eq!(list.prev_before(250).unwrap().timestamp(), 200);
        assert_eq!(list.prev_before(1000).unwrap().timestamp(), 300);
    }

    #[test]
    fn test_clear_resets_ids() {
        let mut list = MarkerList::new();
        list.add("a", 1);
        list.add("b", 2);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.add("c", 3), 1);
    }
}
