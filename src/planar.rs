//! The public operations: build events from the input, run the sweep
//! driver, and shape its discoveries into results.

use std::collections::{BTreeMap, BTreeSet};

use geo::{Coordinate, GeoFloat, Line};

use crate::context::{Context, SegmentsRelation};
use crate::events::SweepPoint;
use crate::sweep::Sweep;
use crate::Error;

/// Intersection points mapped to the unordered pairs of input indices
/// meeting there. A pair appears under a point exactly when the point lies
/// on both closed input segments; collinear overlaps contribute both
/// endpoints of the shared sub-segment.
pub type Intersections<T> = BTreeMap<SweepPoint<T>, BTreeSet<(usize, usize)>>;

/// Whether any two distinct input segments intersect.
///
/// Runs the sweep in early-exit mode: the first touch, crossing or overlap
/// between distinct inputs aborts the sweep.
///
/// # Errors
///
/// [`Error::TooFewSegments`] for fewer than two segments and
/// [`Error::DegenerateSegment`] for a zero-length segment. Duplicate
/// segments are accepted and intersect by definition.
pub fn any_intersection<T, C>(segments: &[Line<T>], context: C) -> Result<bool, Error>
where
    T: GeoFloat,
    C: Context<T>,
{
    validate(segments)?;
    let mut recorder = Recorder::detect();
    Sweep::new(segments, context).run(&mut recorder);
    Ok(recorder.found)
}

/// All intersection points, each with every pair of input indices passing
/// through it.
///
/// # Errors
///
/// As for [`any_intersection`].
pub fn all_intersections<T, C>(segments: &[Line<T>], context: C) -> Result<Intersections<T>, Error>
where
    T: GeoFloat,
    C: Context<T>,
{
    validate(segments)?;
    let mut recorder = Recorder::enumerate();
    Sweep::new(segments, context).run(&mut recorder);
    Ok(recorder.points)
}

/// Whether the closed contour through `vertices` self-intersects.
///
/// Edges join consecutive vertices, the last back to the first. Edges
/// adjacent in the cycle are allowed to share exactly their common vertex;
/// every other contact — a crossing, a touch away from the shared vertex,
/// or a collinear overlap — is a self-intersection. A repeated vertex
/// (which covers zero-length edges and contours pinched at a vertex) is
/// reported as self-intersecting without sweeping.
///
/// # Errors
///
/// [`Error::TooFewVertices`] for fewer than three vertices.
pub fn contour_self_intersects<T, C>(vertices: &[Coordinate<T>], context: C) -> Result<bool, Error>
where
    T: GeoFloat,
    C: Context<T>,
{
    if vertices.len() < 3 {
        return Err(Error::TooFewVertices(vertices.len()));
    }
    let mut seen = BTreeSet::new();
    for &vertex in vertices {
        if !seen.insert(SweepPoint::from(vertex)) {
            return Ok(true);
        }
    }
    let edges: Vec<Line<T>> = (0..vertices.len())
        .map(|i| Line::new(vertices[i], vertices[(i + 1) % vertices.len()]))
        .collect();
    let mut recorder = Recorder::contour(edges.len());
    Sweep::new(&edges, context).run(&mut recorder);
    Ok(recorder.found)
}

fn validate<T: GeoFloat>(segments: &[Line<T>]) -> Result<(), Error> {
    if segments.len() < 2 {
        return Err(Error::TooFewSegments(segments.len()));
    }
    for (index, segment) in segments.iter().enumerate() {
        if segment.start == segment.end {
            return Err(Error::DegenerateSegment(index));
        }
    }
    Ok(())
}

enum Mode {
    /// Early-exit boolean: any contact between distinct inputs counts.
    Detect,
    /// Full enumeration into the intersections map.
    Enumerate,
    /// Early-exit contour check over this many cyclic edges.
    Contour { edges: usize },
}

/// The sweep driver's output sink.
///
/// The driver feeds it three kinds of discovery: relations seen between
/// status-adjacent fragments, index pairs witnessed by a same-position
/// event batch, and index pairs introduced by fusing overlapping
/// fragments. Which of these decide the result depends on the mode.
pub(crate) struct Recorder<T: GeoFloat> {
    mode: Mode,
    pub(crate) found: bool,
    pub(crate) points: Intersections<T>,
}

impl<T: GeoFloat> Recorder<T> {
    pub(crate) fn detect() -> Self {
        Recorder::new(Mode::Detect)
    }

    pub(crate) fn enumerate() -> Self {
        Recorder::new(Mode::Enumerate)
    }

    pub(crate) fn contour(edges: usize) -> Self {
        Recorder::new(Mode::Contour { edges })
    }

    fn new(mode: Mode) -> Self {
        Recorder {
            mode,
            found: false,
            points: Intersections::new(),
        }
    }

    /// Whether the sweep can stop early.
    pub(crate) fn done(&self) -> bool {
        self.found && !matches!(self.mode, Mode::Enumerate)
    }

    /// A non-disjoint relation between fragments carrying these pairs of
    /// distinct inputs.
    pub(crate) fn on_relation(&mut self, relation: SegmentsRelation, pairs: &[(usize, usize)]) {
        if pairs.is_empty() {
            return;
        }
        match self.mode {
            Mode::Detect => self.found = true,
            // Points are collected from batches and fusions instead.
            Mode::Enumerate => {}
            Mode::Contour { edges } => match relation {
                // Adjacent edges may touch; the touch point can only be
                // their shared vertex, since a second common point would
                // make them collinear and overlapping.
                SegmentsRelation::Touch => {
                    self.found |= pairs.iter().any(|&(i, j)| !cycle_adjacent(i, j, edges));
                }
                _ => self.found = true,
            },
        }
    }

    /// Index pairs witnessed meeting at `point` by a same-position batch.
    pub(crate) fn on_touch(&mut self, point: SweepPoint<T>, pairs: &[(usize, usize)]) {
        if pairs.is_empty() {
            return;
        }
        match self.mode {
            Mode::Detect => self.found = true,
            Mode::Enumerate => {
                self.points.entry(point).or_default().extend(pairs.iter().copied());
            }
            Mode::Contour { edges } => {
                self.found |= pairs.iter().any(|&(i, j)| !cycle_adjacent(i, j, edges));
            }
        }
    }

    /// Fresh index pairs introduced by fusing two fragments over the
    /// sub-segment from `start` to `end`.
    pub(crate) fn on_overlap(
        &mut self,
        start: SweepPoint<T>,
        end: SweepPoint<T>,
        pairs: &[(usize, usize)],
    ) {
        if pairs.is_empty() {
            return;
        }
        match self.mode {
            // A collinear overlap is always a contact, and for a contour
            // always a defect, shared vertex or not.
            Mode::Detect | Mode::Contour { .. } => self.found = true,
            Mode::Enumerate => {
                self.points.entry(start).or_default().extend(pairs.iter().copied());
                self.points.entry(end).or_default().extend(pairs.iter().copied());
            }
        }
    }
}

fn cycle_adjacent(i: usize, j: usize, edges: usize) -> bool {
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    hi - lo == 1 || (lo == 0 && hi == edges - 1)
}
