//! Finds all intersection points of a collection of line segments.
//!
//! This is an implementation of the [Bentley-Ottman] algorithm: a
//! vertical line sweeps the plane left to right, stopping at segment
//! end points and at predicted crossings. The segments currently cut
//! by the sweep line are kept in a balanced search tree ordered by
//! their height, so only neighbouring segments need to be tested
//! against each other. This runs in O((n + k) log(n)) time for `n`
//! segments and `k` intersections, which is much faster than testing
//! all pairs with [`line_intersection`] when `k` is small compared to
//! n^2.
//!
//! ## Usage
//!
//! Call [`find_intersections`] with an iterator of any type
//! implementing the [`Crossable`] trait. The geo-type [`Line`]
//! implements this trait, as do pairs of [`Coordinate`]s and pairs of
//! `(x, y)` tuples.
//!
//! ```rust
//! use geo::Line;
//! use line_crossings::find_intersections;
//!
//! let input = vec![
//!     Line::from([(0., 0.), (2., 2.)]),
//!     Line::from([(0., 2.), (2., 0.)]),
//!     Line::from([(0., 1.), (2., 1.)]),
//! ];
//! // All three segments pass through (1, 1): reported once.
//! let points = find_intersections(&input).unwrap();
//! assert_eq!(points.len(), 1);
//! assert_eq!(points[0].x_y(), (1., 1.));
//! ```
//!
//! The output is sorted by `x` and then by `y`, and contains each point
//! once. Parallel and overlapping segments contribute no points, and
//! neither do end points shared by both segments; use
//! [`find_intersections_with`] and [`SweepOptions`] to report those.
//!
//! To step through the sweep one event at a time, use [`Sweep`]
//! directly.
//!
//! [Bentley-Ottman]: //en.wikipedia.org/wiki/Bentley%E2%80%93Ottmann_algorithm
//! [`Line`]: geo::Line
//! [`Coordinate`]: geo::Coordinate
//! [`line_intersection`]: geo::algorithm::line_intersection::line_intersection
mod events;
pub use events::{Event, EventType, SweepPoint};

mod crossable;
pub use crossable::Crossable;

mod segments;
pub use segments::{OrderingValue, Segment};

mod queue;
pub use queue::{EventHandle, EventQueue};

mod active;
pub use active::ActiveTree;

mod sweep;
pub use sweep::{Sweep, SweepOptions};

mod crossings;
pub use crossings::{find_intersections, find_intersections_with};

mod error;
pub use error::{EmptyQueue, SweepError};

#[cfg(test)]
#[path = "../benches/utils/random.rs"]
pub mod random;
