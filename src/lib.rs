//! Planar line-segment intersections using the [Bentley-Ottmann] sweep.
//!
//! The crate answers three questions about a collection of closed line
//! segments in the plane:
//!
//! - do any two distinct segments intersect ([`any_intersection`]);
//! - where exactly, and between which inputs ([`all_intersections`]);
//! - does a closed polygonal contour self-intersect
//!   ([`contour_self_intersects`]).
//!
//! All geometric decisions are routed through an injected [`Context`]; the
//! provided [`RobustContext`] uses the robust predicates of the [`geo`]
//! crate. Degenerate inputs — vertical segments, collinear overlaps, shared
//! endpoints, many segments concurrent at one point, duplicate segments —
//! are normal inputs and produce correct output.
//!
//! ```
//! use geo::Line;
//! use segment_crossings::{all_intersections, RobustContext};
//!
//! let segments = vec![
//!     Line::from([(0., 0.), (2., 2.)]),
//!     Line::from([(0., 2.), (2., 0.)]),
//! ];
//! let isects = all_intersections(&segments, RobustContext).unwrap();
//! assert_eq!(isects.len(), 1);
//! ```
//!
//! [Bentley-Ottmann]: //en.wikipedia.org/wiki/Bentley%E2%80%93Ottmann_algorithm

use std::fmt;

mod events;
mod queue;
mod sweep;
mod sweep_line;

pub mod context;
pub mod planar;

pub use context::{Context, RobustContext, SegmentsRelation};
pub use events::SweepPoint;
pub use planar::{all_intersections, any_intersection, contour_self_intersects, Intersections};

/// Input validation failures, raised before the sweep begins.
///
/// The sweep itself has no recoverable failure mode; once validation
/// passes, every input produces a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Fewer than two segments were supplied.
    TooFewSegments(usize),
    /// The segment at this input index has equal endpoints.
    DegenerateSegment(usize),
    /// A contour needs at least three vertices.
    TooFewVertices(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TooFewSegments(n) => {
                write!(f, "need at least two segments, got {}", n)
            }
            Error::DegenerateSegment(i) => {
                write!(f, "segment at index {} has equal endpoints", i)
            }
            Error::TooFewVertices(n) => {
                write!(f, "contour needs at least three vertices, got {}", n)
            }
        }
    }
}

impl std::error::Error for Error {}
