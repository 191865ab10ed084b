use std::cmp::Ordering;

use geo::{Coordinate, GeoFloat};

/// Kind of a sweep event.
///
/// The variant only tags the event; the order in which events sharing
/// an x-coordinate are processed is decided by [`Event::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    LeftEndpoint,
    RightEndpoint,
    Intersection,
}

/// A sweep event for the line-crossings sweep.
///
/// Events are value objects: the queue hands out an
/// [`EventHandle`](crate::EventHandle) for every pushed event, and
/// that handle (not the fields) is what identifies it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event<T: GeoFloat> {
    pub point: SweepPoint<T>,
    pub ty: EventType,
    pub segment_key: usize,
    /// Second segment of an intersection event.
    pub other_key: Option<usize>,
    vertical: bool,
}

impl<T: GeoFloat> Event<T> {
    pub fn left(point: SweepPoint<T>, segment_key: usize, vertical: bool) -> Self {
        Event {
            point,
            ty: EventType::LeftEndpoint,
            segment_key,
            other_key: None,
            vertical,
        }
    }

    pub fn right(point: SweepPoint<T>, segment_key: usize) -> Self {
        Event {
            point,
            ty: EventType::RightEndpoint,
            segment_key,
            other_key: None,
            vertical: false,
        }
    }

    pub fn intersection(point: SweepPoint<T>, first: usize, second: usize) -> Self {
        Event {
            point,
            ty: EventType::Intersection,
            segment_key: first,
            other_key: Some(second),
            vertical: false,
        }
    }

    #[inline]
    pub fn is_intersection(&self) -> bool {
        self.ty == EventType::Intersection
    }

    /// Priority among events with the same x-coordinate (lower first).
    ///
    /// Crossings are resolved before segments enter so that refreshed
    /// keys agree with the tree. Vertical segments enter after every
    /// other segment starting at the same x, and segments leave last.
    pub(crate) fn rank(&self) -> u8 {
        match self.ty {
            EventType::Intersection => 0,
            EventType::LeftEndpoint if !self.vertical => 1,
            EventType::LeftEndpoint => 2,
            EventType::RightEndpoint => 3,
        }
    }
}

/// Wraps a [`Coordinate`] to support lexicographic ordering.
///
/// The ordering is by `x` and then by `y`. Implements `PartialOrd`,
/// `Ord` and `Eq` even though `Coordinate` doesn't implement these.
/// This is necessary to support insertion to ordered collections such
/// as the `BTreeSet` collecting the output of the sweep.
///
/// Note that the trait impls exist even when `T` is not `Eq` or
/// `Ord`. Construction checks that both components are finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint<T: GeoFloat>(Coordinate<T>);

impl<T: GeoFloat> SweepPoint<T> {
    #[inline]
    pub fn coord(&self) -> Coordinate<T> {
        self.0
    }

    #[inline]
    pub fn x(&self) -> T {
        self.0.x
    }

    #[inline]
    pub fn y(&self) -> T {
        self.0.y
    }
}

/// Implement lexicographic ordering by `x` and then by `y`
/// coordinate.
impl<T: GeoFloat> PartialOrd for SweepPoint<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.0.x.partial_cmp(&other.0.x) {
            Some(Ordering::Equal) => self.0.y.partial_cmp(&other.0.y),
            o => o,
        }
    }
}

/// Derive `Ord` from `PartialOrd` and expect to not fail.
impl<T: GeoFloat> Ord for SweepPoint<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap()
    }
}

/// We derive `Eq` manually to not require `T: Eq`.
impl<T: GeoFloat> Eq for SweepPoint<T> {}

/// Create from `Coordinate` while checking the components are finite.
impl<T: GeoFloat> From<Coordinate<T>> for SweepPoint<T> {
    fn from(pt: Coordinate<T>) -> Self {
        assert!(
            pt.x.is_finite(),
            "sweep point requires a finite x-coordinate"
        );
        assert!(
            pt.y.is_finite(),
            "sweep point requires a finite y-coordinate"
        );
        SweepPoint(pt)
    }
}

impl<T: GeoFloat> From<(T, T)> for SweepPoint<T> {
    fn from(pt: (T, T)) -> Self {
        Coordinate::from(pt).into()
    }
}
