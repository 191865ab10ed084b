use std::cmp::Ordering;

use geo::{
    kernels::{HasKernel, Kernel, Orientation},
    Coordinate, GeoFloat, Line,
};

use crate::{
    events::{Event, SweepPoint},
    SweepError,
};

/// Height of a segment at the sweep.
///
/// `y` is the height of the segment at the sweep position it was last
/// refreshed at, or at the last point where it met another segment.
/// `slope` orders segments meeting at that height by their order just
/// right of the sweep line. The active tree itself is ordered with exact
/// orientation tests, which agree with this value up to rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderingValue<T: GeoFloat> {
    pub y: T,
    pub slope: T,
}

impl<T: GeoFloat> PartialOrd for OrderingValue<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.y.partial_cmp(&other.y) {
            Some(Ordering::Equal) => self.slope.partial_cmp(&other.slope),
            o => o,
        }
    }
}

/// An input segment with normalized end points.
///
/// The end points are ordered (see [`SweepPoint`]) so that `left` is
/// strictly smaller than `right`. A vertical segment therefore runs
/// from its lower to its upper end point; its ordering value is its
/// lower `y` with an infinite slope, so it sorts above every other
/// segment through that point.
///
/// The active part of the segment runs from `start` to `right`. It
/// begins at `left` and moves up to every point where the segment is
/// found meeting its neighbour, so active parts never cross behind the
/// sweep position.
#[derive(Debug, Clone, Copy)]
pub struct Segment<T: GeoFloat> {
    key: usize,
    left: SweepPoint<T>,
    right: SweepPoint<T>,
    start: SweepPoint<T>,
    value: OrderingValue<T>,
}

impl<T: GeoFloat> Segment<T> {
    /// Validate `line` and build the segment stored at `key`.
    ///
    /// The ordering value is initialized at the left end point.
    pub fn new(key: usize, line: Line<T>) -> Result<Self, SweepError> {
        let finite = [line.start, line.end]
            .iter()
            .all(|c| c.x.is_finite() && c.y.is_finite());
        if !finite {
            return Err(SweepError::NonFiniteCoordinate { index: key });
        }

        let start = SweepPoint::from(line.start);
        let end = SweepPoint::from(line.end);
        let (left, right) = match start.cmp(&end) {
            Ordering::Less => (start, end),
            Ordering::Greater => (end, start),
            Ordering::Equal => return Err(SweepError::DegenerateInput { index: key }),
        };

        let mut segment = Segment {
            key,
            left,
            right,
            start: left,
            value: OrderingValue {
                y: left.y(),
                slope: T::zero(),
            },
        };
        segment.update_value(left.x());
        Ok(segment)
    }

    #[inline]
    pub fn key(&self) -> usize {
        self.key
    }

    #[inline]
    pub fn left(&self) -> SweepPoint<T> {
        self.left
    }

    #[inline]
    pub fn right(&self) -> SweepPoint<T> {
        self.right
    }

    /// Start of the active part.
    #[inline]
    pub fn start(&self) -> SweepPoint<T> {
        self.start
    }

    #[inline]
    pub fn value(&self) -> OrderingValue<T> {
        self.value
    }

    #[inline]
    pub fn set_value(&mut self, value: OrderingValue<T>) {
        self.value = value;
    }

    #[inline]
    pub fn is_vertical(&self) -> bool {
        self.left.x() == self.right.x()
    }

    pub fn line(&self) -> Line<T> {
        Line::new(self.left.coord(), self.right.coord())
    }

    /// Slope of the segment; positive infinity if vertical.
    pub fn slope(&self) -> T {
        if self.is_vertical() {
            T::infinity()
        } else {
            (self.right.y() - self.left.y()) / (self.right.x() - self.left.x())
        }
    }

    /// Height of the segment at `x`, with `x` clamped to the segment's
    /// own x-interval. Vertical segments report their lower end.
    pub fn y_at(&self, x: T) -> T {
        let (p, q) = (self.left.coord(), self.right.coord());
        if self.is_vertical() || x <= p.x {
            p.y
        } else if x >= q.x {
            q.y
        } else {
            p.y + (q.y - p.y) * (x - p.x) / (q.x - p.x)
        }
    }

    /// Refresh the ordering value for the sweep position `x`.
    pub fn update_value(&mut self, x: T) {
        self.value = OrderingValue {
            y: self.y_at(x),
            slope: self.slope(),
        };
    }

    /// Move the start of the active part to `pt`, where the segment
    /// meets another one, and take `pt.y` as the ordering height.
    ///
    /// The active part never moves backwards nor shrinks to a point, so
    /// `pt` is ignored unless it lies strictly between the current start
    /// and the right end point. Vertical segments never move.
    pub fn advance(&mut self, pt: SweepPoint<T>) {
        if self.is_vertical() || pt <= self.start || pt >= self.right {
            return;
        }
        self.start = pt;
        self.value.y = pt.y();
    }

    /// Get an event for the left end-point (start) of this segment.
    pub fn left_event(&self) -> Event<T> {
        Event::left(self.left, self.key, self.is_vertical())
    }

    /// Get an event for the right end-point (end) of this segment.
    pub fn right_event(&self) -> Event<T> {
        Event::right(self.right, self.key)
    }

    /// Get events for both the end-points of this segment.
    pub fn events(&self) -> [Event<T>; 2] {
        [self.left_event(), self.right_event()]
    }

    /// Check if both segments lie on the same line.
    pub fn is_collinear(&self, other: &Self) -> bool {
        let (p, q) = (self.left.coord(), self.right.coord());
        T::Ker::orient2d(p, q, other.left.coord()) == Orientation::Collinear
            && T::Ker::orient2d(p, q, other.right.coord()) == Orientation::Collinear
    }

    /// Check if the segment passes within `tol` of `pt`.
    pub fn passes_near(&self, pt: SweepPoint<T>, tol: T) -> bool {
        let (p, q, c) = (self.left.coord(), self.right.coord(), pt.coord());
        let (y_min, y_max) = (p.y.min(q.y), p.y.max(q.y));
        if c.x < p.x - tol || c.x > q.x + tol || c.y < y_min - tol || c.y > y_max + tol {
            return false;
        }
        let d = q - p;
        cross(d, c - p).abs() <= tol * d.x.hypot(d.y)
    }

    #[inline]
    pub fn has_endpoint(&self, pt: SweepPoint<T>) -> bool {
        pt == self.left || pt == self.right
    }

    /// Check if `pt` lies on the closed segment.
    pub fn contains(&self, pt: Coordinate<T>) -> bool {
        let sp = SweepPoint::from(pt);
        sp >= self.left
            && sp <= self.right
            && T::Ker::orient2d(self.left.coord(), self.right.coord(), pt) == Orientation::Collinear
    }

    /// Intersect with `other` and return the unique common point.
    ///
    /// Parallel and collinear pairs never intersect. A point that is an
    /// end point of both segments is only returned if
    /// `shared_endpoints` is set. An end point lying on the other
    /// segment is returned exactly; a proper crossing is solved from
    /// the 2x2 system of the two supporting lines and clamped to the
    /// common bounding box.
    ///
    /// The pair is put in a canonical order first, so swapping `self`
    /// and `other` yields the same point.
    pub fn intersection(
        &self,
        other: &Self,
        shared_endpoints: bool,
    ) -> Option<SweepPoint<T>> {
        let (first, second) = if (self.left, self.right) <= (other.left, other.right) {
            (self, other)
        } else {
            (other, self)
        };
        let (p, q) = (first.left.coord(), first.right.coord());
        let (r, s) = (second.left.coord(), second.right.coord());

        let denom = cross(q - p, s - r);
        if denom == T::zero() {
            return None;
        }

        let touch = [(r, first), (s, first), (p, second), (q, second)]
            .into_iter()
            .find(|(pt, seg)| seg.contains(*pt))
            .map(|(pt, _)| SweepPoint::from(pt));
        if let Some(pt) = touch {
            if !shared_endpoints && first.has_endpoint(pt) && second.has_endpoint(pt) {
                return None;
            }
            return Some(pt);
        }

        // No end point touches, so only a proper crossing remains.
        if !straddles(p, q, r, s) || !straddles(r, s, p, q) {
            return None;
        }

        let t = cross(r - p, s - r) / denom;
        let x = (p.x + t * (q.x - p.x))
            .max(p.x.max(r.x))
            .min(q.x.min(s.x));
        let y = (p.y + t * (q.y - p.y))
            .max(p.y.min(q.y).max(r.y.min(s.y)))
            .min(p.y.max(q.y).min(r.y.max(s.y)));
        Some(Coordinate { x, y }.into())
    }

    /// Position of `pt` relative to the line of the active part:
    /// `Less` if `pt` is above it, `Greater` if below.
    fn side_of(&self, pt: SweepPoint<T>) -> Ordering {
        match T::Ker::orient2d(self.start.coord(), self.right.coord(), pt.coord()) {
            Orientation::CounterClockwise => Ordering::Less,
            Orientation::Clockwise => Ordering::Greater,
            Orientation::Collinear => Ordering::Equal,
        }
    }

    /// Order of two active segments just right of the sweep position.
    ///
    /// The segment starting later is located against the line of the
    /// other one with exact orientation tests, first by its start and
    /// then by its right end point. A vertical segment sits at its lower
    /// end point, above every other segment through it.
    fn sweep_order(&self, other: &Self) -> Ordering {
        match (self.is_vertical(), other.is_vertical()) {
            (true, true) => self.left.cmp(&other.left),
            (false, true) => self.side_of(other.left).then(Ordering::Less),
            (true, false) => other.sweep_order(self).reverse(),
            (false, false) if self.start <= other.start => self
                .side_of(other.start)
                .then_with(|| self.side_of(other.right)),
            (false, false) => other.sweep_order(self).reverse(),
        }
    }
}

#[inline]
fn cross<T: GeoFloat>(a: Coordinate<T>, b: Coordinate<T>) -> T {
    a.x * b.y - a.y * b.x
}

/// Check that `r` and `s` lie strictly on opposite sides of line `pq`.
fn straddles<T: GeoFloat>(
    p: Coordinate<T>,
    q: Coordinate<T>,
    r: Coordinate<T>,
    s: Coordinate<T>,
) -> bool {
    let o1 = <T as HasKernel>::Ker::orient2d(p, q, r);
    let o2 = <T as HasKernel>::Ker::orient2d(p, q, s);
    o1 != Orientation::Collinear && o2 != Orientation::Collinear && o1 != o2
}

/// Partial equality based on key.
///
/// This is consistent with the `PartialOrd` impl.
impl<T: GeoFloat> PartialEq for Segment<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

/// Assert total equality.
impl<T: GeoFloat> Eq for Segment<T> {}

/// Ordering of active segments as per the sweep, then by key.
///
/// Only meaningful between segments active at the same sweep position.
/// The key keeps the order total for overlapping segments.
impl<T: GeoFloat> PartialOrd for Segment<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: GeoFloat> Ord for Segment<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sweep_order(other).then_with(|| self.key.cmp(&other.key))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::events::EventType;

    fn seg(key: usize, a: (f64, f64), b: (f64, f64)) -> Segment<f64> {
        Segment::new(key, Line::new(a, b)).unwrap()
    }

    #[test]
    fn test_normalized_end_points() {
        let s = seg(0, (2., 0.), (0., 2.));
        assert_eq!(s.left(), SweepPoint::from((0., 2.)));
        assert_eq!(s.right(), SweepPoint::from((2., 0.)));
        assert_eq!(s.value().y, 2.);
        assert_eq!(s.value().slope, -1.);

        let v = seg(1, (1., 3.), (1., -1.));
        assert!(v.is_vertical());
        assert_eq!(v.left(), SweepPoint::from((1., -1.)));
        assert_eq!(v.value().y, -1.);
        assert!(v.value().slope.is_infinite());

        let [l, r] = s.events();
        assert_eq!(l.ty, EventType::LeftEndpoint);
        assert_eq!(r.ty, EventType::RightEndpoint);
        assert_eq!(r.point, s.right());
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert_eq!(
            Segment::new(3, Line::new((1., 1.), (1., 1.))).unwrap_err(),
            SweepError::DegenerateInput { index: 3 }
        );
        assert_eq!(
            Segment::new(4, Line::new((0., f64::NAN), (1., 1.))).unwrap_err(),
            SweepError::NonFiniteCoordinate { index: 4 }
        );
        assert_eq!(
            Segment::new(5, Line::new((0., 0.), (f64::INFINITY, 1.))).unwrap_err(),
            SweepError::NonFiniteCoordinate { index: 5 }
        );
    }

    #[test]
    fn test_interpolation() {
        let s = seg(0, (0., 0.), (4., 2.));
        assert_relative_eq!(s.y_at(1.), 0.5);
        assert_eq!(s.y_at(4.), 2.);
        // Clamped outside the interval.
        assert_eq!(s.y_at(-3.), 0.);
        assert_eq!(s.y_at(10.), 2.);

        let mut s = s;
        s.update_value(2.);
        assert_relative_eq!(s.value().y, 1.);
        assert_relative_eq!(s.value().slope, 0.5);
    }

    #[test]
    fn test_ordering_follows_active_parts() {
        let mut a = seg(0, (0., 0.), (2., 2.));
        let mut b = seg(1, (0., 2.), (2., 0.));
        let c = seg(2, (0., 0.), (2., 2.));
        // Before they meet at (1, 1), `b` is above.
        assert!(a < b);
        // Overlapping segments are ordered by key.
        assert!(a < c);
        assert_eq!(a.cmp(&a), Ordering::Equal);

        let pt = a.intersection(&b, false).unwrap();
        a.advance(pt);
        b.advance(pt);
        assert_eq!(a.start(), pt);
        assert_eq!(a.value().y, 1.);
        assert!(b < a);

        // End points and points behind the start don't move it.
        a.advance(SweepPoint::from((2., 2.)));
        a.advance(SweepPoint::from((0.5, 0.5)));
        assert_eq!(a.start(), pt);
    }

    #[test]
    fn test_ordering_is_exact_near_crossings() {
        // Meet at (11/6, 14/9); heights at that x differ by rounding.
        let mut a = seg(0, (1., 1.), (4., 3.));
        let mut b = seg(1, (0., 4.), (3., 0.));
        assert!(a < b);
        let pt = a.intersection(&b, false).unwrap();
        a.advance(pt);
        b.advance(pt);
        assert!(b < a);

        // Starting on a segment, order is by direction.
        let h = seg(2, (0., 0.), (4., 0.));
        let up = seg(3, (2., 0.), (3., 1.));
        let down = seg(4, (2., 0.), (3., -1.));
        assert!(h < up);
        assert!(down < h);
    }

    #[test]
    fn test_vertical_ordering() {
        let v = seg(0, (1., 0.), (1., 2.));
        let through_bottom = seg(1, (0., -1.), (2., 1.));
        let above = seg(2, (1., 1.), (3., 1.));
        let stacked = seg(3, (1., 2.), (1., 4.));
        assert!(through_bottom < v);
        assert!(v < above);
        assert!(v < stacked);
    }

    #[test]
    fn test_passes_near() {
        let s = seg(0, (0., 0.), (3., 1.));
        let tol = 1e-12;
        assert!(s.passes_near(SweepPoint::from((1.5, 0.5)), tol));
        assert!(s.passes_near(SweepPoint::from((1.5, 0.5 + 1e-13)), tol));
        assert!(!s.passes_near(SweepPoint::from((1.5, 0.6)), tol));
        assert!(!s.passes_near(SweepPoint::from((6., 2.)), tol));

        let v = seg(1, (1., 0.), (1., 2.));
        assert!(v.passes_near(SweepPoint::from((1., 2.)), tol));
        assert!(!v.passes_near(SweepPoint::from((1., 3.)), tol));
    }

    #[test]
    fn test_collinear() {
        let a = seg(0, (0., 1.), (2., 1.));
        assert!(a.is_collinear(&seg(1, (1., 1.), (3., 1.))));
        assert!(a.is_collinear(&seg(2, (5., 1.), (6., 1.))));
        assert!(!a.is_collinear(&seg(3, (0., 0.), (2., 0.))));
        assert!(!a.is_collinear(&seg(4, (1., 1.), (2., 2.))));
    }

    #[test]
    fn test_proper_crossing() {
        let a = seg(0, (0., 0.), (2., 2.));
        let b = seg(1, (0., 2.), (2., 0.));
        let pt = a.intersection(&b, false).unwrap();
        assert_relative_eq!(pt.x(), 1.);
        assert_relative_eq!(pt.y(), 1.);
        assert_eq!(b.intersection(&a, false), Some(pt));
    }

    #[test]
    fn test_disjoint_and_parallel() {
        let a = seg(0, (0., 0.), (2., 0.));
        let b = seg(1, (0., 1.), (2., 1.));
        assert_eq!(a.intersection(&b, false), None);

        // Collinear overlap is not reported.
        let c = seg(2, (1., 0.), (3., 0.));
        assert_eq!(a.intersection(&c, true), None);

        // Lines cross, segments don't.
        let d = seg(3, (3., -1.), (4., 1.));
        assert_eq!(a.intersection(&d, false), None);
    }

    #[test]
    fn test_end_point_touches() {
        let a = seg(0, (0., 0.), (1., 1.));
        let b = seg(1, (1., 1.), (2., 0.));
        assert_eq!(a.intersection(&b, false), None);
        assert_eq!(a.intersection(&b, true), Some(SweepPoint::from((1., 1.))));

        // T-junction: an end point in the interior of the other segment.
        let h = seg(2, (0., 0.), (4., 0.));
        let t = seg(3, (1., 2.), (2., 0.));
        assert_eq!(h.intersection(&t, false), Some(SweepPoint::from((2., 0.))));

        let v = seg(4, (2., -1.), (2., 0.));
        assert_eq!(h.intersection(&v, false), Some(SweepPoint::from((2., 0.))));
    }

    #[test]
    fn test_vertical_crossing() {
        let v = seg(0, (1., -1.), (1., 3.));
        let s = seg(1, (0., 0.), (3., 3.));
        let pt = v.intersection(&s, false).unwrap();
        assert_eq!(pt.x(), 1.);
        assert_relative_eq!(pt.y(), 1.);
    }
}
