use std::cmp::Ordering;

use geo::kernels::Orientation;
use geo::{GeoFloat, Line};
use log::{debug, trace};
use slab::Slab;

use crate::context::{Context, SegmentsRelation};
use crate::events::{Event, SweepPoint};
use crate::planar::Recorder;
use crate::queue::EventsQueue;
use crate::sweep_line::SweepLine;

/// The event arena together with the injected geometry context.
///
/// Boxed inside [`Sweep`] so that sweep-line entries can hold a stable
/// pointer to it while the arena grows.
pub(crate) struct Storage<T: GeoFloat, C: Context<T>> {
    pub(crate) events: Slab<Event<T>>,
    pub(crate) context: C,
}

impl<T: GeoFloat, C: Context<T>> Storage<T, C> {
    /// Build the arena and the seeded queue: two cross-linked events per
    /// input segment, the lexicographically smaller endpoint on the left.
    ///
    /// Zero-length segments must have been rejected by the caller.
    pub(crate) fn seeded(segments: &[Line<T>], context: C) -> (Self, EventsQueue<T>) {
        let mut events = Slab::with_capacity(4 * segments.len());
        let mut queue = EventsQueue::with_capacity(2 * segments.len());
        for (index, segment) in segments.iter().enumerate() {
            let start = SweepPoint::from(segment.start);
            let end = SweepPoint::from(segment.end);
            debug_assert!(start != end, "zero-length segments are rejected at validation");
            let (start, end) = if start < end { (start, end) } else { (end, start) };
            let left = events.insert(Event {
                point: start,
                is_left: true,
                opposite: usize::MAX,
                ids: vec![index],
            });
            let right = events.insert(Event {
                point: end,
                is_left: false,
                opposite: left,
                ids: vec![index],
            });
            events[left].opposite = right;
            queue.push(left, &events);
            queue.push(right, &events);
        }
        (Storage { events, context }, queue)
    }

    /// The position of the twin event at the other end of the fragment.
    pub(crate) fn end(&self, key: usize) -> SweepPoint<T> {
        self.events[self.events[key].opposite].point
    }

    /// The fragment at a left event as a [`Line`].
    fn line(&self, key: usize) -> Line<T> {
        debug_assert!(self.events[key].is_left);
        Line::new(self.events[key].point.0, self.end(key).0)
    }

    /// Vertical order of two left events at the current sweep abscissa.
    ///
    /// Pre-conditions: both fragments are co-active, i.e. their closed
    /// x-ranges overlap and neither crosses the other strictly inside the
    /// comparison window. Ties (collinear fragments) break on the arena
    /// key, which keeps equal-geometry probes adjacent to their match.
    pub(crate) fn vertical_cmp(&self, a: usize, b: usize) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let (pa, qa) = (self.events[a].point, self.end(a));
        let (pb, qb) = (self.events[b].point, self.end(b));
        let ctx = &self.context;
        match pa.cmp(&pb) {
            Ordering::Equal => orientation_as_ordering(ctx.orientation(pa.0, qa.0, qb.0))
                .then_with(|| a.cmp(&b)),
            Ordering::Less => orientation_as_ordering(ctx.orientation(pa.0, qa.0, pb.0))
                .then_with(|| orientation_as_ordering(ctx.orientation(pa.0, qa.0, qb.0)))
                .then_with(|| a.cmp(&b)),
            Ordering::Greater => self.vertical_cmp(b, a).reverse(),
        }
    }
}

/// Helper to convert orientation-2d into an ordering: a counter-clockwise
/// third point lies above the directed carrier line, so the line orders
/// first.
fn orientation_as_ordering(orientation: Orientation) -> Ordering {
    match orientation {
        Orientation::CounterClockwise => Ordering::Less,
        Orientation::Clockwise => Ordering::Greater,
        Orientation::Collinear => Ordering::Equal,
    }
}

/// All unordered index pairs between the two sides, excluding indices the
/// sides share. Pairs come out with the smaller index first.
fn cross_pairs(a: &[usize], b: &[usize]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for &i in a {
        if b.contains(&i) {
            continue;
        }
        for &j in b {
            if a.contains(&j) {
                continue;
            }
            pairs.push(if i < j { (i, j) } else { (j, i) });
        }
    }
    pairs
}

/// The sweep driver.
///
/// Implements the [Bentley-Ottmann] event loop: pop the minimum event,
/// maintain the status, test newly adjacent fragments, and fold discovered
/// crossings back into the queue by dividing fragments in place. Events
/// popped at the same position form a batch whose pairwise witnesses are
/// completed when the sweep moves past the position.
///
/// [Bentley-Ottmann]: //en.wikipedia.org/wiki/Bentley%E2%80%93Ottmann_algorithm
pub(crate) struct Sweep<T: GeoFloat, C: Context<T>> {
    storage: Box<Storage<T, C>>,
    queue: EventsQueue<T>,
    sweep_line: SweepLine<T, C>,
}

impl<T: GeoFloat, C: Context<T>> Sweep<T, C> {
    pub(crate) fn new(segments: &[Line<T>], context: C) -> Self {
        let (storage, queue) = Storage::seeded(segments, context);
        Sweep {
            storage: Box::new(storage),
            queue,
            sweep_line: SweepLine::default(),
        }
    }

    /// Run the sweep to completion, or until the recorder has seen enough.
    pub(crate) fn run(&mut self, recorder: &mut Recorder<T>) {
        let mut batch: Vec<usize> = Vec::new();
        while let Some(key) = self.queue.pop() {
            let point = self.storage.events[key].point;
            if batch.last().map(|&last| self.storage.events[last].point) != Some(point) {
                self.flush_batch(&batch, recorder);
                if recorder.done() {
                    return;
                }
                batch.clear();
            }
            batch.push(key);
            self.handle_event(key, recorder);
            if recorder.done() {
                return;
            }
        }
        self.flush_batch(&batch, recorder);
    }

    /// Complete the pairwise witnesses of a closed same-position batch.
    ///
    /// Every batch event sits at the position with its own fragment, so any
    /// two events carrying distinct input indices witness all those inputs
    /// meeting here. Indices shared between the two sides come from a fused
    /// overlap and are reported at the fragment endpoints instead.
    fn flush_batch(&self, batch: &[usize], recorder: &mut Recorder<T>) {
        if batch.len() < 2 {
            return;
        }
        let point = self.storage.events[batch[0]].point;
        for (i, &a) in batch.iter().enumerate() {
            for &b in &batch[i + 1..] {
                let pairs = cross_pairs(&self.storage.events[a].ids, &self.storage.events[b].ids);
                if !pairs.is_empty() {
                    recorder.on_touch(point, &pairs);
                }
            }
        }
    }

    fn handle_event(&mut self, key: usize, recorder: &mut Recorder<T>) {
        trace!(
            "handling event {:?} at {:?}",
            key,
            self.storage.events[key].point.0
        );
        if self.storage.events[key].is_left {
            if let Some(equal) = self.sweep_line.find_equal(key, &self.storage) {
                // A collinear fragment of another input already occupies
                // this position in the status; fuse instead of inserting.
                self.merge(equal, key, recorder);
                return;
            }
            // Safety: the boxed storage keeps its address for the life of
            // the driver, which outlives every status entry.
            unsafe {
                self.sweep_line.insert(key, &self.storage);
            }
            if let Some(below) = self.sweep_line.below(key, &self.storage) {
                self.detect_intersection(below, key, recorder);
            }
            if let Some(above) = self.sweep_line.above(key, &self.storage) {
                self.detect_intersection(key, above, recorder);
            }
        } else {
            let left = self.storage.events[key].opposite;
            // Fused fragments leave extra right events in the queue whose
            // status entry is already gone; those are skipped here.
            let active = match self.sweep_line.find_equal(left, &self.storage) {
                Some(active) => active,
                None => return,
            };
            let below = self.sweep_line.below(active, &self.storage);
            let above = self.sweep_line.above(active, &self.storage);
            self.sweep_line.remove(active, &self.storage);
            if let (Some(below), Some(above)) = (below, above) {
                self.detect_intersection(below, above, recorder);
            }
        }
    }

    /// Test two status-adjacent fragments, `below` under `event`.
    ///
    /// Discovered crossings divide the fragments in place so that all
    /// events of the crossing end up at its position; overlaps divide and
    /// fuse so that the shared sub-segment is swept as one fragment
    /// carrying every involved input index.
    fn detect_intersection(&mut self, below: usize, event: usize, recorder: &mut Recorder<T>) {
        let below_line = self.storage.line(below);
        let event_line = self.storage.line(event);
        let relation = self.storage.context.segments_relation(below_line, event_line);
        if relation == SegmentsRelation::Disjoint {
            return;
        }
        debug!(
            "found {:?}: {:?} / {:?}",
            relation, below_line, event_line
        );
        let pairs = cross_pairs(
            &self.storage.events[below].ids,
            &self.storage.events[event].ids,
        );
        debug_assert!(
            !pairs.is_empty(),
            "adjacent fragments of the same inputs cannot be co-active"
        );
        recorder.on_relation(relation, &pairs);

        if relation == SegmentsRelation::Overlap {
            return self.handle_overlap(below, event, recorder);
        }

        let point = self
            .storage
            .context
            .segments_intersection(below_line, event_line)
            .expect("touching or crossing segments must have an intersection point");
        let point = SweepPoint::from(point);

        if point != self.storage.events[below].point && point != self.storage.end(below) {
            let (head_right, tail_left) = self.divide(below, point);
            self.queue.push(head_right, &self.storage.events);
            self.queue.push(tail_left, &self.storage.events);
        }
        if point != self.storage.events[event].point && point != self.storage.end(event) {
            // Shortening `event` to end at `point` can make it identical
            // to its above-neighbour; that neighbour must leave the status
            // before the division and fuse with `event` after it.
            let above = self.sweep_line.above(event, &self.storage);
            let fused = above.filter(|&above| {
                self.storage.events[above].point == self.storage.events[event].point
                    && self.storage.end(above) == point
            });
            if let Some(above) = fused {
                self.sweep_line.remove(above, &self.storage);
            }
            let (head_right, tail_left) = self.divide(event, point);
            self.queue.push(head_right, &self.storage.events);
            self.queue.push(tail_left, &self.storage.events);
            if let Some(above) = fused {
                self.merge(event, above, recorder);
            }
        }
    }

    /// Divide and fuse two collinear overlapping fragments so that their
    /// events align on the shared sub-segment.
    fn handle_overlap(&mut self, below: usize, event: usize, recorder: &mut Recorder<T>) {
        let starts_equal = self.storage.events[event].point == self.storage.events[below].point;
        let (min_start, max_start) = if starts_equal || self.queue_min_first(event, below) {
            (event, below)
        } else {
            (below, event)
        };
        let ends_equal = self.storage.end(event) == self.storage.end(below);
        let event_right = self.storage.events[event].opposite;
        let below_right = self.storage.events[below].opposite;
        let (min_end, max_end) = if ends_equal || self.queue_min_first(event_right, below_right) {
            (event_right, below_right)
        } else {
            (below_right, event_right)
        };

        if starts_equal {
            // Shared left endpoint: shorten the longer fragment to the
            // shorter one and fuse the pair. Equal fragments never reach
            // this point; they fuse on insertion.
            debug_assert!(!ends_equal, "equal fragments fuse before detection");
            let longer = self.storage.events[max_end].opposite;
            self.sweep_line.remove(longer, &self.storage);
            let min_end_point = self.storage.events[min_end].point;
            let (_, tail_left) = self.divide(longer, min_end_point);
            self.queue.push(tail_left, &self.storage.events);
            self.merge(event, below, recorder);
        } else if ends_equal {
            // Shared right endpoint: split the earlier fragment where the
            // later one starts and fuse the aligned halves.
            let max_start_point = self.storage.events[max_start].point;
            let (head_right, tail_left) = self.divide(min_start, max_start_point);
            self.queue.push(head_right, &self.storage.events);
            self.merge(max_start, tail_left, recorder);
        } else if min_start == self.storage.events[max_end].opposite {
            // One fragment contains the other: split the outer one at both
            // inner endpoints, far end first, and fuse the middle part.
            let min_end_point = self.storage.events[min_end].point;
            let (head_right, tail_left) = self.divide(min_start, min_end_point);
            self.queue.push(head_right, &self.storage.events);
            self.queue.push(tail_left, &self.storage.events);
            let max_start_point = self.storage.events[max_start].point;
            let (head_right, middle_left) = self.divide(min_start, max_start_point);
            self.queue.push(head_right, &self.storage.events);
            self.merge(max_start, middle_left, recorder);
        } else {
            // Plain partial overlap: align the later fragment to the
            // earlier one's end, then the earlier to the later's start.
            let min_end_point = self.storage.events[min_end].point;
            let (head_right, tail_left) = self.divide(max_start, min_end_point);
            self.queue.push(head_right, &self.storage.events);
            self.queue.push(tail_left, &self.storage.events);
            let max_start_point = self.storage.events[max_start].point;
            let (head_right, middle_left) = self.divide(min_start, max_start_point);
            self.queue.push(head_right, &self.storage.events);
            self.merge(max_start, middle_left, recorder);
        }
    }

    /// Split the fragment at `key` at an interior `point`.
    ///
    /// The left event keeps its position and is shortened in place, which
    /// preserves its order in the status; the old right event is re-linked
    /// to a fresh left event opening at `point`. Returns the new right and
    /// left events `(head_right, tail_left)`; enqueueing them is the
    /// caller's choice.
    fn divide(&mut self, key: usize, point: SweepPoint<T>) -> (usize, usize) {
        let old_right = self.storage.events[key].opposite;
        debug_assert!(
            self.storage.events[key].point < point && point < self.storage.events[old_right].point,
            "split point must lie strictly inside the fragment"
        );
        trace!(
            "dividing {:?} at {:?}",
            self.storage.line(key),
            point.0
        );
        let ids = self.storage.events[key].ids.clone();
        let tail_left = self.storage.events.insert(Event {
            point,
            is_left: true,
            opposite: old_right,
            ids: ids.clone(),
        });
        let head_right = self.storage.events.insert(Event {
            point,
            is_left: false,
            opposite: key,
            ids,
        });
        self.storage.events[old_right].opposite = tail_left;
        self.storage.events[key].opposite = head_right;
        (head_right, tail_left)
    }

    /// Fuse two left events carrying the same fragment geometry.
    ///
    /// Both pairs end up with the sorted union of their input indices, and
    /// every fresh index pair is reported at both fragment endpoints —
    /// which is how overlap sub-segments appear in the output.
    fn merge(&mut self, a: usize, b: usize, recorder: &mut Recorder<T>) {
        let start = self.storage.events[a].point;
        let end = self.storage.end(a);
        debug_assert!(
            self.storage.events[b].point == start && self.storage.end(b) == end,
            "only equal fragments fuse"
        );
        let fresh = cross_pairs(&self.storage.events[a].ids, &self.storage.events[b].ids);
        if !fresh.is_empty() {
            debug!(
                "fusing fragments over {:?}..{:?}: {:?}",
                start.0, end.0, fresh
            );
            recorder.on_overlap(start, end, &fresh);
        }
        let mut union = self.storage.events[a].ids.clone();
        union.extend_from_slice(&self.storage.events[b].ids);
        union.sort_unstable();
        union.dedup();
        let twins = [
            a,
            self.storage.events[a].opposite,
            b,
            self.storage.events[b].opposite,
        ];
        for key in twins {
            self.storage.events[key].ids = union.clone();
        }
    }

    /// Whether `a` pops before `b` among events of the same handedness:
    /// position, then opposite endpoint, then arena key.
    fn queue_min_first(&self, a: usize, b: usize) -> bool {
        let key = |k: usize| (self.storage.events[k].point, self.storage.end(k), k);
        key(a) < key(b)
    }
}

#[cfg(test)]
mod tests {
    use geo::Coordinate;

    use super::*;
    use crate::context::RobustContext;
    use crate::planar::Recorder;

    fn point(x: f64, y: f64) -> SweepPoint<f64> {
        SweepPoint::from(Coordinate { x, y })
    }

    #[test]
    fn divide_relinks_twins() {
        let mut sweep = Sweep::new(
            &[
                Line::from([(0., 0.), (2., 2.)]),
                Line::from([(0., 2.), (2., 0.)]),
            ],
            RobustContext,
        );

        // Seeding lays out (left, right) pairs at (0, 1) and (2, 3).
        let (head_right, tail_left) = sweep.divide(0, point(1., 1.));
        let events = &sweep.storage.events;

        assert_eq!(events[0].opposite, head_right);
        assert_eq!(events[head_right].opposite, 0);
        assert_eq!(events[tail_left].opposite, 1);
        assert_eq!(events[1].opposite, tail_left);

        assert_eq!(events[head_right].point, point(1., 1.));
        assert!(!events[head_right].is_left);
        assert_eq!(events[tail_left].point, point(1., 1.));
        assert!(events[tail_left].is_left);
        assert_eq!(events[tail_left].ids, vec![0]);
    }

    #[test]
    fn merge_unions_ids_on_both_pairs() {
        let mut sweep = Sweep::new(
            &[
                Line::from([(0., 0.), (2., 0.)]),
                Line::from([(0., 0.), (2., 0.)]),
            ],
            RobustContext,
        );
        let mut recorder = Recorder::enumerate();

        sweep.merge(0, 2, &mut recorder);
        for key in [0, 1, 2, 3] {
            assert_eq!(sweep.storage.events[key].ids, vec![0, 1]);
        }
    }

    #[test]
    fn cross_pairs_skips_shared_indices() {
        assert_eq!(cross_pairs(&[0], &[1]), vec![(0, 1)]);
        assert_eq!(cross_pairs(&[0, 1], &[0]), vec![]);
        assert_eq!(cross_pairs(&[0, 1], &[2]), vec![(0, 2), (1, 2)]);
        assert_eq!(cross_pairs(&[0, 1], &[1, 2]), vec![(0, 2)]);
    }
}
