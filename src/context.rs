//! The geometry context: every orientation, intersection and containment
//! decision the sweep makes goes through this seam.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{
    kernels::{HasKernel, Kernel, Orientation},
    Coordinate, GeoFloat, Line,
};

use crate::events::SweepPoint;

/// How two closed segments relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentsRelation {
    /// No common point.
    Disjoint,
    /// Exactly one common point, an endpoint of at least one segment.
    Touch,
    /// Exactly one common point, interior to both segments.
    Cross,
    /// Collinear, sharing a sub-segment of positive length.
    Overlap,
}

/// Geometric primitives consumed by the sweep.
///
/// The sweep never inspects coordinates to make a geometric decision; it
/// asks the context. Implementations targeting floating point should use
/// robust predicates (as [`RobustContext`] does), otherwise the handling
/// of near-degenerate inputs is best-effort.
pub trait Context<T: GeoFloat> {
    /// Sign of the cross product `(b - a) x (c - a)`.
    fn orientation(&self, a: Coordinate<T>, b: Coordinate<T>, c: Coordinate<T>) -> Orientation;

    /// Classify the relation between two closed segments.
    fn segments_relation(&self, s: Line<T>, t: Line<T>) -> SegmentsRelation;

    /// The single common point of two segments.
    ///
    /// Only defined when the segments touch or cross; returns `None` when
    /// they are disjoint or overlap on a sub-segment.
    fn segments_intersection(&self, s: Line<T>, t: Line<T>) -> Option<Coordinate<T>>;

    /// Whether `p` lies on the closed segment `s`.
    fn point_in_segment(&self, p: Coordinate<T>, s: Line<T>) -> bool;
}

/// Default context backed by the robust kernel of [`geo`].
///
/// Orientation is exact; proper crossing points are computed with
/// [`line_intersection`] and are subject to floating-point rounding.
/// Intersections at segment endpoints are returned exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct RobustContext;

impl<T: GeoFloat> Context<T> for RobustContext {
    fn orientation(&self, a: Coordinate<T>, b: Coordinate<T>, c: Coordinate<T>) -> Orientation {
        <T as HasKernel>::Ker::orient2d(a, b, c)
    }

    fn segments_relation(&self, s: Line<T>, t: Line<T>) -> SegmentsRelation {
        let t_start = self.orientation(s.start, s.end, t.start);
        let t_end = self.orientation(s.start, s.end, t.end);
        if t_start == Orientation::Collinear && t_end == Orientation::Collinear {
            // Both on the carrier line of `s`; compare the lexicographic
            // intervals along it.
            let (s_lo, s_hi) = ordered(s);
            let (t_lo, t_hi) = ordered(t);
            return if s_hi < t_lo || t_hi < s_lo {
                SegmentsRelation::Disjoint
            } else if s_hi == t_lo || t_hi == s_lo {
                SegmentsRelation::Touch
            } else {
                SegmentsRelation::Overlap
            };
        }
        let s_start = self.orientation(t.start, t.end, s.start);
        let s_end = self.orientation(t.start, t.end, s.end);
        if t_start != t_end && s_start != s_end {
            if t_start == Orientation::Collinear
                || t_end == Orientation::Collinear
                || s_start == Orientation::Collinear
                || s_end == Orientation::Collinear
            {
                SegmentsRelation::Touch
            } else {
                SegmentsRelation::Cross
            }
        } else {
            SegmentsRelation::Disjoint
        }
    }

    fn segments_intersection(&self, s: Line<T>, t: Line<T>) -> Option<Coordinate<T>> {
        // Endpoint incidences first: they are exact, where the parametric
        // computation below may round.
        for p in [t.start, t.end] {
            if self.point_in_segment(p, s) {
                return Some(p);
            }
        }
        for p in [s.start, s.end] {
            if self.point_in_segment(p, t) {
                return Some(p);
            }
        }
        match line_intersection(s, t) {
            Some(LineIntersection::SinglePoint { intersection, .. }) => Some(intersection),
            _ => None,
        }
    }

    fn point_in_segment(&self, p: Coordinate<T>, s: Line<T>) -> bool {
        if self.orientation(s.start, s.end, p) != Orientation::Collinear {
            return false;
        }
        let (lo, hi) = ordered(s);
        let p = SweepPoint::from(p);
        lo <= p && p <= hi
    }
}

fn ordered<T: GeoFloat>(s: Line<T>) -> (SweepPoint<T>, SweepPoint<T>) {
    let start = SweepPoint::from(s.start);
    let end = SweepPoint::from(s.end);
    if start <= end {
        (start, end)
    } else {
        (end, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(a: (f64, f64), b: (f64, f64)) -> Line<f64> {
        Line::from([a, b])
    }

    fn relation(s: Line<f64>, t: Line<f64>) -> SegmentsRelation {
        let forward = RobustContext.segments_relation(s, t);
        // The classification is symmetric.
        assert_eq!(forward, RobustContext.segments_relation(t, s));
        forward
    }

    #[test]
    fn relation_disjoint() {
        assert_eq!(
            relation(line((0., 0.), (1., 0.)), line((2., 0.), (3., 0.))),
            SegmentsRelation::Disjoint
        );
        assert_eq!(
            relation(line((0., 0.), (1., 0.)), line((0., 1.), (1., 1.))),
            SegmentsRelation::Disjoint
        );
        // Collinear with the carrier line but outside the segment.
        assert_eq!(
            relation(line((0., 0.), (1., 0.)), line((2., 0.), (2., 1.))),
            SegmentsRelation::Disjoint
        );
    }

    #[test]
    fn relation_touch() {
        // Shared endpoint.
        assert_eq!(
            relation(line((0., 0.), (1., 0.)), line((0., 0.), (0., 1.))),
            SegmentsRelation::Touch
        );
        // Endpoint on an interior point (a T junction).
        assert_eq!(
            relation(line((0., 0.), (2., 0.)), line((1., 0.), (1., 1.))),
            SegmentsRelation::Touch
        );
        // Collinear, sharing exactly one endpoint.
        assert_eq!(
            relation(line((0., 0.), (1., 0.)), line((1., 0.), (2., 0.))),
            SegmentsRelation::Touch
        );
    }

    #[test]
    fn relation_cross() {
        assert_eq!(
            relation(line((0., 0.), (2., 2.)), line((0., 2.), (2., 0.))),
            SegmentsRelation::Cross
        );
        // A vertical through a horizontal.
        assert_eq!(
            relation(line((1., -1.), (1., 1.)), line((0., 0.), (2., 0.))),
            SegmentsRelation::Cross
        );
    }

    #[test]
    fn relation_overlap() {
        assert_eq!(
            relation(line((0., 0.), (2., 0.)), line((1., 0.), (3., 0.))),
            SegmentsRelation::Overlap
        );
        // Containment and equality are overlaps too.
        assert_eq!(
            relation(line((0., 0.), (4., 0.)), line((1., 0.), (3., 0.))),
            SegmentsRelation::Overlap
        );
        assert_eq!(
            relation(line((0., 0.), (2., 2.)), line((0., 0.), (2., 2.))),
            SegmentsRelation::Overlap
        );
    }

    #[test]
    fn intersection_prefers_exact_endpoints() {
        let s = line((0., 0.), (2., 0.));
        let t = line((1., 0.), (1., 1.));
        assert_eq!(
            RobustContext.segments_intersection(s, t),
            Some(Coordinate::from((1., 0.)))
        );

        let cross = RobustContext
            .segments_intersection(line((0., 0.), (2., 2.)), line((0., 2.), (2., 0.)))
            .unwrap();
        assert_eq!(cross, Coordinate::from((1., 1.)));
    }

    #[test]
    fn point_in_segment_closed() {
        let s = line((0., 0.), (2., 2.));
        let ctx = RobustContext;
        assert!(ctx.point_in_segment((0., 0.).into(), s));
        assert!(ctx.point_in_segment((1., 1.).into(), s));
        assert!(ctx.point_in_segment((2., 2.).into(), s));
        assert!(!ctx.point_in_segment((3., 3.).into(), s));
        assert!(!ctx.point_in_segment((1., 0.).into(), s));

        // Vertical segment, containment decided along y.
        let v = line((1., 0.), (1., 2.));
        assert!(ctx.point_in_segment((1., 1.).into(), v));
        assert!(!ctx.point_in_segment((1., 3.).into(), v));
    }
}
