use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::ops::Bound;

use geo::GeoFloat;

use crate::context::Context;
use crate::sweep::Storage;

/// Entry of the sweep-line set.
///
/// Holds only the arena key; the ordering is resolved through the storage
/// the entry points into.
pub(crate) struct ActiveEvent<T: GeoFloat, C: Context<T>> {
    key: usize,
    storage: *const Storage<T, C>,
}

impl<T: GeoFloat, C: Context<T>> Debug for ActiveEvent<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveEvent").field("key", &self.key).finish()
    }
}

impl<T: GeoFloat, C: Context<T>> ActiveEvent<T, C> {
    /// Create an entry resolving through `storage`.
    ///
    /// # Safety
    ///
    /// The pointer is dereferenced on every comparison, so `storage` must
    /// stay at the same address for as long as the entry exists (the
    /// driver guarantees this by boxing it). Memory safety ends there;
    /// correctness additionally needs [`Storage::vertical_cmp`] to keep
    /// returning the same answer for every pair of entries in the set
    /// while they coexist — the set's invariants silently break otherwise.
    /// Divisions satisfy this because they only move a fragment's right
    /// end inward along its own carrier line.
    unsafe fn new(key: usize, storage: &Storage<T, C>) -> Self {
        ActiveEvent {
            key,
            storage: storage as *const _,
        }
    }
}

/// Partial equality based on key.
///
/// This is consistent with the `PartialOrd` impl: the vertical order
/// breaks its final tie on the key.
impl<T: GeoFloat, C: Context<T>> PartialEq for ActiveEvent<T, C> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

/// Assert total equality.
impl<T: GeoFloat, C: Context<T>> Eq for ActiveEvent<T, C> {}

impl<T: GeoFloat, C: Context<T>> PartialOrd for ActiveEvent<T, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        debug_assert!(
            std::ptr::eq(self.storage, other.storage),
            "active events compared across storages"
        );
        // Safety: the reference is guaranteed valid by `new`.
        let storage = unsafe { &*self.storage };
        Some(storage.vertical_cmp(self.key, other.key))
    }
}

/// Assert total ordering same as the `PartialOrd` impl.
impl<T: GeoFloat, C: Context<T>> Ord for ActiveEvent<T, C> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap()
    }
}

/// The status structure: left events of the segments currently crossing
/// the sweep line, in their vertical order at the current abscissa.
///
/// The order among the contents is stable between events because no two
/// active segments cross strictly between two consecutive event points;
/// divisions only shorten a fragment along its own carrier line, which
/// preserves every comparison.
pub(crate) struct SweepLine<T: GeoFloat, C: Context<T>> {
    set: BTreeSet<ActiveEvent<T, C>>,
}

impl<T: GeoFloat, C: Context<T>> Default for SweepLine<T, C> {
    fn default() -> Self {
        SweepLine {
            set: BTreeSet::new(),
        }
    }
}

impl<T: GeoFloat, C: Context<T>> SweepLine<T, C> {
    /// Add the left event at `key` to the status.
    ///
    /// # Safety
    ///
    /// `storage` must outlive the entry; see [`ActiveEvent::new`].
    pub(crate) unsafe fn insert(&mut self, key: usize, storage: &Storage<T, C>) {
        debug_assert!(storage.events[key].is_left);
        assert!(self.set.insert(ActiveEvent::new(key, storage)));
    }

    pub(crate) fn remove(&mut self, key: usize, storage: &Storage<T, C>) {
        // Safety: the probe is gone before this borrow of `storage` ends.
        assert!(self.set.remove(&unsafe { ActiveEvent::new(key, storage) }));
    }

    /// The neighbour directly above `key` in the vertical order.
    pub(crate) fn above(&self, key: usize, storage: &Storage<T, C>) -> Option<usize> {
        // Safety: as in `remove`.
        let probe = unsafe { ActiveEvent::new(key, storage) };
        self.set
            .range((Bound::Excluded(probe), Bound::Unbounded))
            .next()
            .map(|entry| entry.key)
    }

    /// The neighbour directly below `key` in the vertical order.
    pub(crate) fn below(&self, key: usize, storage: &Storage<T, C>) -> Option<usize> {
        // Safety: as in `remove`.
        let probe = unsafe { ActiveEvent::new(key, storage) };
        self.set
            .range((Bound::Unbounded, Bound::Excluded(probe)))
            .next_back()
            .map(|entry| entry.key)
    }

    /// An active event carrying exactly the same fragment geometry as
    /// `key`: the event itself if it is in the status, else a fused
    /// stand-in.
    ///
    /// The status never holds two entries with equal geometry (they are
    /// fused on insertion), so after the exact probe it suffices to check
    /// the probe's direct neighbours, which is where the key tie-break
    /// places an equal-geometry entry.
    pub(crate) fn find_equal(&self, key: usize, storage: &Storage<T, C>) -> Option<usize> {
        // Safety: as in `remove`.
        if self.set.contains(&unsafe { ActiveEvent::new(key, storage) }) {
            return Some(key);
        }
        let start = storage.events[key].point;
        let end = storage.end(key);
        [self.below(key, storage), self.above(key, storage)]
            .into_iter()
            .flatten()
            .find(|&other| storage.events[other].point == start && storage.end(other) == end)
    }
}

#[cfg(test)]
mod tests {
    use geo::Line;

    use super::*;
    use crate::context::RobustContext;
    use crate::sweep::Storage;

    fn storage(segments: &[Line<f64>]) -> Storage<f64, RobustContext> {
        Storage::seeded(segments, RobustContext).0
    }

    #[test]
    fn vertical_order_and_neighbours() {
        // Keys: left events land at 0, 2, 4 in seeding order.
        let storage = storage(&[
            Line::from([(0., 0.), (4., 0.)]),
            Line::from([(0., 1.), (4., 1.)]),
            Line::from([(0., 0.), (4., 4.)]),
        ]);
        let mut line = SweepLine::default();
        unsafe {
            line.insert(0, &storage);
            line.insert(2, &storage);
            line.insert(4, &storage);
        }

        assert_eq!(line.below(0, &storage), None);
        assert_eq!(line.above(0, &storage), Some(4));
        assert_eq!(line.above(4, &storage), Some(2));
        assert_eq!(line.above(2, &storage), None);

        line.remove(4, &storage);
        assert_eq!(line.above(0, &storage), Some(2));
        assert_eq!(line.below(2, &storage), Some(0));
    }

    #[test]
    fn find_equal_matches_geometry_only() {
        // Two copies of the same segment and one different one.
        let storage = storage(&[
            Line::from([(0., 0.), (2., 2.)]),
            Line::from([(0., 0.), (2., 2.)]),
            Line::from([(0., 1.), (2., 1.)]),
        ]);
        let mut line = SweepLine::default();
        unsafe {
            line.insert(0, &storage);
            line.insert(4, &storage);
        }

        // A probe outside the status finds the fused stand-in; a probe
        // inside finds itself; no false matches across geometries.
        assert_eq!(line.find_equal(2, &storage), Some(0));
        assert_eq!(line.find_equal(0, &storage), Some(0));
        assert_eq!(line.find_equal(4, &storage), Some(4));
    }
}
