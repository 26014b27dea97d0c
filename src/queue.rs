use std::cmp::Ordering;
use std::collections::BinaryHeap;

use geo_types::CoordFloat;
use slab::Slab;

use crate::events::{Event, SweepPoint};

/// Heap entry ordering the events queue.
///
/// The minimum-first order is: lesser position (lexicographic by `x` then
/// `y`); at equal positions right events before left events, so segments
/// close before new ones open; remaining ties by the opposite endpoint and
/// finally by arena key. The `Ord` impl reverses this so that the std
/// max-heap pops the minimum.
///
/// The position and handedness of an event never change after it is
/// enqueued; the opposite endpoint may shrink when the fragment is divided,
/// in which case the captured value only serves as a tie stabiliser.
#[derive(Debug, Clone)]
pub(crate) struct EventsQueueKey<T: CoordFloat> {
    point: SweepPoint<T>,
    is_left: bool,
    end: SweepPoint<T>,
    event: usize,
}

impl<T: CoordFloat> EventsQueueKey<T> {
    fn min_first(&self, other: &Self) -> Ordering {
        self.point
            .cmp(&other.point)
            .then_with(|| self.is_left.cmp(&other.is_left))
            .then_with(|| self.end.cmp(&other.end))
            .then_with(|| self.event.cmp(&other.event))
    }
}

impl<T: CoordFloat> PartialEq for EventsQueueKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.min_first(other) == Ordering::Equal
    }
}

impl<T: CoordFloat> Eq for EventsQueueKey<T> {}

impl<T: CoordFloat> PartialOrd for EventsQueueKey<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reversed for use in the max-heap.
impl<T: CoordFloat> Ord for EventsQueueKey<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.min_first(other).reverse()
    }
}

/// Min-priority queue over arena events.
pub(crate) struct EventsQueue<T: CoordFloat> {
    heap: BinaryHeap<EventsQueueKey<T>>,
}

impl<T: CoordFloat> EventsQueue<T> {
    pub(crate) fn with_capacity(size: usize) -> Self {
        EventsQueue {
            heap: BinaryHeap::with_capacity(size),
        }
    }

    /// Enqueue the event at `key`, capturing its current geometry.
    pub(crate) fn push(&mut self, key: usize, events: &Slab<Event<T>>) {
        let event = &events[key];
        self.heap.push(EventsQueueKey {
            point: event.point,
            is_left: event.is_left,
            end: events[event.opposite].point,
            event: key,
        });
    }

    /// Pop the arena key of the minimum event.
    pub(crate) fn pop(&mut self) -> Option<usize> {
        self.heap.pop().map(|entry| entry.event)
    }
}

#[cfg(test)]
mod tests {
    use geo_types::Coordinate;

    use super::*;

    fn pair(events: &mut Slab<Event<f64>>, start: (f64, f64), end: (f64, f64)) -> (usize, usize) {
        let start = SweepPoint::from(Coordinate::from(start));
        let end = SweepPoint::from(Coordinate::from(end));
        let (start, end) = if start < end { (start, end) } else { (end, start) };
        let left = events.insert(Event {
            point: start,
            is_left: true,
            opposite: 0,
            ids: vec![0],
        });
        let right = events.insert(Event {
            point: end,
            is_left: false,
            opposite: left,
            ids: vec![0],
        });
        events[left].opposite = right;
        (left, right)
    }

    #[test]
    fn pops_in_sweep_order() {
        let mut events = Slab::new();
        let (l1, r1) = pair(&mut events, (0., 0.), (2., 0.));
        let (l2, r2) = pair(&mut events, (2., 0.), (3., 1.));

        let mut queue = EventsQueue::with_capacity(4);
        for key in [r2, l2, r1, l1] {
            queue.push(key, &events);
        }

        // Left end of the first segment, then its right end; the right
        // event at (2, 0) comes before the left event opening there.
        assert_eq!(queue.pop(), Some(l1));
        assert_eq!(queue.pop(), Some(r1));
        assert_eq!(queue.pop(), Some(l2));
        assert_eq!(queue.pop(), Some(r2));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn equal_points_order_by_opposite_end() {
        let mut events = Slab::new();
        let (flat, _) = pair(&mut events, (0., 0.), (1., 0.));
        let (steep, _) = pair(&mut events, (0., 0.), (0., 1.));

        let mut queue = EventsQueue::with_capacity(2);
        queue.push(flat, &events);
        queue.push(steep, &events);

        // (0, 1) precedes (1, 0) lexicographically.
        assert_eq!(queue.pop(), Some(steep));
        assert_eq!(queue.pop(), Some(flat));
    }
}
