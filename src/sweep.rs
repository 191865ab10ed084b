use std::{
    collections::{BTreeSet, HashMap, HashSet},
    iter::successors,
};

use geo::{Coordinate, GeoFloat};
use itertools::Itertools;
use log::{debug, trace, warn};
use slab::Slab;
use smallvec::SmallVec;

use crate::{
    active::ActiveTree,
    events::{Event, EventType, SweepPoint},
    queue::{EventHandle, EventQueue},
    segments::Segment,
    Crossable, EmptyQueue, SweepError,
};

/// Options controlling what the sweep reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOptions {
    shared_endpoints: bool,
}

impl SweepOptions {
    /// Also report points that are an end point of both segments
    /// touching there (off by default).
    pub fn shared_endpoints(mut self, value: bool) -> Self {
        self.shared_endpoints = value;
        self
    }
}

/// Unordered pair of segment keys, smaller key first.
type PairKey = (usize, usize);

#[inline]
fn pair_key(a: usize, b: usize) -> PairKey {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Rounding tolerance of a crossing computed around `pt`.
fn tolerance<T: GeoFloat>(pt: SweepPoint<T>) -> T {
    let scale = T::one().max(pt.x().abs()).max(pt.y().abs());
    scale * T::epsilon() * (T::one() + T::one()).powi(8)
}

#[inline]
fn near<T: GeoFloat>(p: SweepPoint<T>, q: SweepPoint<T>, tol: T) -> bool {
    (p.x() - q.x()).abs() <= tol && (p.y() - q.y()).abs() <= tol
}

/// Sweep algorithm for detecting all crossings.
///
/// This is an implementation of the [Bentley-Ottman] sweep. Maintains
/// a queue of end points and predicted crossings, and the currently
/// active segments ordered by their height at the sweep position.
/// Each active segment carries its own ordering value; the values are
/// refreshed in bulk whenever a segment enters, and reset to the
/// meeting point for the two segments of a crossing.
///
/// The tree itself is ordered with exact orientation tests on the
/// active part of each segment (see [`Segment::advance`]). A crossing
/// found at or behind the current event is applied at once, and
/// segments hidden behind a collinear neighbour are tested too, so
/// concurrent and overlapping segments don't hide each other.
///
/// Pending crossings are tracked per unordered pair of segments, so a
/// pair is never scheduled twice, and a prediction is cancelled as
/// soon as the pair stops being adjacent.
///
/// [Bentley-Ottman]: //en.wikipedia.org/wiki/Bentley%E2%80%93Ottmann_algorithm
pub struct Sweep<T: GeoFloat> {
    segments: Slab<Segment<T>>,
    events: EventQueue<T>,
    active_segments: ActiveTree,
    pending: HashMap<PairKey, EventHandle>,
    output: BTreeSet<SweepPoint<T>>,
    options: SweepOptions,
    position: Option<T>,
}

impl<T: GeoFloat> Sweep<T> {
    pub fn new<C, I>(iter: I) -> Result<Self, SweepError>
    where
        C: Crossable<Scalar = T>,
        I: IntoIterator<Item = C>,
    {
        Self::with_options(iter, SweepOptions::default())
    }

    /// Validate the input and queue the end points of every segment.
    ///
    /// Fails on the first zero-length or non-finite segment; no event
    /// is processed before the whole input has been checked.
    pub fn with_options<C, I>(iter: I, options: SweepOptions) -> Result<Self, SweepError>
    where
        C: Crossable<Scalar = T>,
        I: IntoIterator<Item = C>,
    {
        let iter = iter.into_iter();
        let size = {
            let (min_size, max_size) = iter.size_hint();
            max_size.unwrap_or(min_size)
        };

        let mut segments = Slab::with_capacity(size);
        for (index, crossable) in iter.enumerate() {
            let entry = segments.vacant_entry();
            debug_assert_eq!(entry.key(), index);
            entry.insert(Segment::new(index, crossable.line())?);
        }
        let events = segments
            .iter()
            .flat_map(|(_, segment): (usize, &Segment<T>)| segment.events())
            .collect();

        Ok(Sweep {
            segments,
            events,
            active_segments: ActiveTree::new(),
            pending: HashMap::new(),
            output: BTreeSet::new(),
            options,
            position: None,
        })
    }

    /// The x-coordinate of the last processed event.
    #[inline]
    pub fn position(&self) -> Option<T> {
        self.position
    }

    /// Peek and return the next point in the sweep.
    pub fn peek_point(&mut self) -> Option<SweepPoint<T>> {
        self.events.peek().map(|e| e.point)
    }

    /// Intersections found so far, sorted by `x` and then `y`.
    pub fn intersections(&self) -> impl Iterator<Item = Coordinate<T>> + '_ {
        self.output.iter().map(|pt| pt.coord())
    }

    pub fn into_intersections(self) -> Vec<Coordinate<T>> {
        self.output.into_iter().map(|pt| pt.coord()).collect()
    }

    /// Process all remaining events and return the intersections.
    pub fn run(mut self) -> Vec<Coordinate<T>> {
        while self.next_event().is_some() {}
        self.into_intersections()
    }

    /// Process the next event in the queue.
    ///
    /// Returns the point of the processed event, or `None` once the
    /// sweep is complete.
    pub fn next_event(&mut self) -> Option<SweepPoint<T>> {
        let event = match self.events.pop_min() {
            Ok(event) => event,
            Err(EmptyQueue) => return None,
        };
        let pt = event.point;
        self.handle_event(event);
        Some(pt)
    }

    fn handle_event(&mut self, event: Event<T>) {
        trace!("handling event: {:?}", event);
        let pt = event.point;
        self.position = Some(pt.x());

        match event.ty {
            EventType::LeftEndpoint => self.handle_left(event.segment_key, pt),
            EventType::RightEndpoint => self.handle_right(event.segment_key, pt),
            EventType::Intersection => {
                let other = event
                    .other_key
                    .expect("intersection event without a second segment");
                self.handle_intersection(pt, event.segment_key, other);
            }
        }

        #[cfg(feature = "slow-asserts")]
        self.active_segments.check_invariants(&self.segments);
    }

    fn handle_left(&mut self, key: usize, pt: SweepPoint<T>) {
        let x = pt.x();
        let reseated = self
            .active_segments
            .recompute(&mut self.segments, |segment| segment.update_value(x));
        if reseated {
            warn!("active segments out of order at x = {:?}; re-seated", x);
            self.rescan_adjacent(pt);
        }

        self.segments[key].update_value(x);
        self.attach(key);
        self.check_around(key, pt);

        if self.segments[key].is_vertical() {
            self.scan_vertical(key);
        }
    }

    fn handle_right(&mut self, key: usize, pt: SweepPoint<T>) {
        // The neighbours of the leaving segment become adjacent.
        if let (Some(prev_key), Some(next_key)) = self.detach(key) {
            self.check_adjacent(prev_key, next_key, pt);
        }
    }

    fn handle_intersection(&mut self, pt: SweepPoint<T>, a: usize, b: usize) {
        self.pending.remove(&pair_key(a, b));
        self.record(pt);
        if !(self.active_segments.contains(a) && self.active_segments.contains(b)) {
            warn!("crossing of inactive segments {} and {} at {:?}", a, b, pt);
            return;
        }
        self.meet(a, b, pt, pt);
    }

    /// Insert `key` into the tree, cancelling the crossing of the two
    /// segments it now separates.
    fn attach(&mut self, key: usize) {
        assert!(
            self.active_segments.insert(key, &self.segments),
            "segment {} entered twice",
            key
        );
        let prev = self.active_segments.prev_key(key);
        let next = self.active_segments.next_key(key);
        if let (Some(prev_key), Some(next_key)) = (prev, next) {
            self.cancel(prev_key, next_key);
        }
    }

    /// Remove `key` from the tree along with its pending crossings, and
    /// return its former neighbours.
    fn detach(&mut self, key: usize) -> (Option<usize>, Option<usize>) {
        let prev = self.active_segments.prev_key(key);
        let next = self.active_segments.next_key(key);
        for adj_key in prev.into_iter().chain(next) {
            self.cancel(adj_key, key);
        }
        assert!(
            self.active_segments.remove(key),
            "segment {} left without entering",
            key
        );
        (prev, next)
    }

    /// Let adjacent segments `a` and `b` pass through `pt`, and restore
    /// the order of the tree right of `pt`.
    ///
    /// Every segment next to the pair that passes through `pt` up to
    /// rounding meets there as well. They all restart from the same
    /// point, an end point of one of them if there is one, so they are
    /// ordered by direction alone. If that order differs from the tree's,
    /// they are taken out and inserted again, and each is then tested
    /// against its new neighbours as of the event at `at`.
    fn meet(&mut self, a: usize, b: usize, pt: SweepPoint<T>, at: SweepPoint<T>) {
        let (mut bottom, mut top) = if self.active_segments.next_key(a) == Some(b) {
            (a, b)
        } else if self.active_segments.next_key(b) == Some(a) {
            (b, a)
        } else {
            return;
        };

        let tol = tolerance(pt);
        let mut block: SmallVec<[usize; 4]> = SmallVec::new();
        block.extend([bottom, top]);
        while let Some(k) = self.active_segments.prev_key(bottom) {
            if !self.segments[k].passes_near(pt, tol) {
                break;
            }
            block.push(k);
            bottom = k;
        }
        while let Some(k) = self.active_segments.next_key(top) {
            if !self.segments[k].passes_near(pt, tol) {
                break;
            }
            block.push(k);
            top = k;
        }

        let pt = block
            .iter()
            .flat_map(|&k| [self.segments[k].left(), self.segments[k].right()])
            .find(|&end| near(end, pt, tol))
            .unwrap_or(pt);
        for &k in &block {
            self.segments[k].advance(pt);
        }

        let below = self.active_segments.prev_key(bottom);
        let above = self.active_segments.next_key(top);
        let from = below.unwrap_or(bottom);
        let upto = above.unwrap_or(top);
        let in_order = successors(Some(from), |&k| {
            (k != upto).then(|| self.active_segments.next_key(k)).flatten()
        })
        .tuple_windows()
        .all(|(lo, hi)| self.segments[lo] < self.segments[hi]);
        if in_order {
            return;
        }

        for &k in &block {
            self.detach(k);
        }
        for &k in &block {
            self.attach(k);
        }
        trace!("reordered {:?} at {:?}", block, pt);

        let around = block.iter().copied().chain(below).chain(above);
        for key in around.collect::<SmallVec<[usize; 8]>>() {
            if self.active_segments.contains(key) {
                self.check_around(key, at);
            }
        }
    }

    /// Test `key` against both its current neighbours.
    fn check_around(&mut self, key: usize, at: SweepPoint<T>) {
        if let Some(prev_key) = self.active_segments.prev_key(key) {
            self.check_adjacent(prev_key, key, at);
        }
        if let Some(next_key) = self.active_segments.next_key(key) {
            self.check_adjacent(key, next_key, at);
        }
    }

    /// Test `lower` and the segment `upper` right above it.
    ///
    /// Segments collinear with either of them and lying just beyond
    /// are not adjacent to the other, but may still touch it; those
    /// points are recorded without scheduling anything.
    fn check_adjacent(&mut self, lower: usize, upper: usize, at: SweepPoint<T>) {
        if self.active_segments.next_key(lower) != Some(upper) {
            return;
        }

        let hidden_below = self.collinear_run(lower, false);
        let hidden_above = self.collinear_run(upper, true);
        let hidden = hidden_below
            .into_iter()
            .map(|k| (k, upper))
            .chain(hidden_above.into_iter().map(|k| (lower, k)));
        let points: SmallVec<[SweepPoint<T>; 4]> = hidden
            .filter_map(|(a, b)| self.intersect(a, b))
            .collect();
        for pt in points {
            self.record(pt);
        }

        self.check_pair(lower, upper, at);
    }

    /// Keys next to `key`, going up or down, for as long as they are
    /// collinear with it.
    fn collinear_run(&self, key: usize, upwards: bool) -> SmallVec<[usize; 4]> {
        let base = &self.segments[key];
        let step = |k: usize| {
            if upwards {
                self.active_segments.next_key(k)
            } else {
                self.active_segments.prev_key(k)
            }
        };

        let mut run = SmallVec::new();
        let mut cur = step(key);
        while let Some(k) = cur {
            if !base.is_collinear(&self.segments[k]) {
                break;
            }
            run.push(k);
            cur = step(k);
        }
        run
    }

    /// Test two adjacent segments for intersection.
    ///
    /// A point strictly ahead of the event at `at` is scheduled as an
    /// intersection event, unless one is already pending. A point at or
    /// behind it is recorded, and the pair reordered on the spot.
    /// Crossings with vertical segments are only recorded.
    fn check_pair(&mut self, a: usize, b: usize, at: SweepPoint<T>) {
        let pair = pair_key(a, b);
        if self.pending.contains_key(&pair) {
            return;
        }

        let pt = match self.intersect(a, b) {
            Some(pt) => pt,
            None => return,
        };
        if self.segments[a].is_vertical() || self.segments[b].is_vertical() {
            self.record(pt);
        } else if pt > at {
            debug!("scheduling crossing of {} and {} at {:?}", pair.0, pair.1, pt);
            let handle = self.events.push(Event::intersection(pt, pair.0, pair.1));
            self.pending.insert(pair, handle);
        } else {
            self.record(pt);
            self.meet(a, b, pt, at);
        }
    }

    fn intersect(&self, a: usize, b: usize) -> Option<SweepPoint<T>> {
        self.segments[a].intersection(&self.segments[b], self.options.shared_endpoints)
    }

    /// Record every crossing of the vertical segment at `key`.
    ///
    /// All segments active at its x are in the tree with fresh values,
    /// and those crossing it are the ones around its height range: the
    /// successors up to its top, and predecessors at its bottom. The
    /// heights are rounded, so the scan only stops at a segment that
    /// neither crosses nor lies within range.
    fn scan_vertical(&mut self, key: usize) {
        let vertical = self.segments[key];
        let (bottom, top) = (vertical.left().y(), vertical.right().y());
        let shared_endpoints = self.options.shared_endpoints;

        let mut found: SmallVec<[SweepPoint<T>; 8]> = SmallVec::new();
        for upwards in [true, false] {
            let mut cur = if upwards {
                self.active_segments.next_key(key)
            } else {
                self.active_segments.prev_key(key)
            };
            while let Some(k) = cur {
                let segment = &self.segments[k];
                match vertical.intersection(segment, shared_endpoints) {
                    Some(pt) => found.push(pt),
                    None if upwards && segment.value().y > top => break,
                    None if !upwards && segment.value().y < bottom => break,
                    None => {}
                }
                cur = if upwards {
                    self.active_segments.next_key(k)
                } else {
                    self.active_segments.prev_key(k)
                };
            }
        }

        for pt in found {
            self.record(pt);
        }
    }

    /// Cancel the pending crossing of a pair that is no longer adjacent.
    fn cancel(&mut self, a: usize, b: usize) {
        if let Some(handle) = self.pending.remove(&pair_key(a, b)) {
            if let Some(event) = self.events.remove(handle) {
                debug!("cancelled crossing of {} and {} at {:?}", a, b, event.point);
            }
        }
    }

    /// Re-derive pending crossings after the active order changed
    /// without going through intersection events.
    fn rescan_adjacent(&mut self, at: SweepPoint<T>) {
        let order: Vec<usize> = self.active_segments.keys().collect();
        let adjacent: HashSet<PairKey> = order
            .iter()
            .tuple_windows()
            .map(|(&a, &b)| pair_key(a, b))
            .collect();

        let stale: Vec<PairKey> = self
            .pending
            .keys()
            .filter(|pair| !adjacent.contains(pair))
            .copied()
            .collect();
        for (a, b) in stale {
            self.cancel(a, b);
        }
        for (a, b) in order.into_iter().tuple_windows() {
            self.check_adjacent(a, b, at);
        }
    }

    /// Add `pt` to the output, unless a point equal up to rounding is
    /// already there.
    ///
    /// Segments through one point yield the same crossing from each
    /// pair, computed with different rounding.
    fn record(&mut self, pt: SweepPoint<T>) {
        let tol = tolerance(pt);
        let lo = SweepPoint::from(Coordinate {
            x: pt.x() - tol,
            y: T::min_value(),
        });
        let hi = SweepPoint::from(Coordinate {
            x: pt.x() + tol,
            y: T::max_value(),
        });
        if self.output.range(lo..=hi).any(|&q| near(q, pt, tol)) {
            return;
        }
        debug!("found intersection at {:?}", pt);
        self.output.insert(pt);
    }
}
