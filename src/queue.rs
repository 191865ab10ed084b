use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    iter::FromIterator,
};

use geo::GeoFloat;
use slab::Slab;

use crate::{events::Event, EmptyQueue};

/// Identity of an event pushed into an [`EventQueue`].
///
/// Two events with equal fields (say, two crossings at the same point)
/// still get distinct handles. Handles are never reused: a stale
/// handle stays invalid even after its storage slot is recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle {
    slot: usize,
    seq: u64,
}

#[derive(Debug)]
struct Pending<T: GeoFloat> {
    seq: u64,
    event: Event<T>,
}

/// Heap entry; points at a slot of the event storage.
#[derive(Debug)]
struct Entry<T: GeoFloat> {
    x: T,
    rank: u8,
    y: T,
    handle: EventHandle,
}

impl<T: GeoFloat> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T: GeoFloat> Eq for Entry<T> {}

/// Ordering for use with a max-heap (`BinaryHeap`), so it is the
/// reverse of the processing order: by `x`, then by
/// [`Event::rank`], then by `y`, then by insertion order.
impl<T: GeoFloat> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: GeoFloat> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .partial_cmp(&other.x)
            .expect("event coordinates must be finite")
            .then_with(|| self.rank.cmp(&other.rank))
            .then_with(|| {
                self.y
                    .partial_cmp(&other.y)
                    .expect("event coordinates must be finite")
            })
            .then_with(|| self.handle.seq.cmp(&other.handle.seq))
            .reverse()
    }
}

/// Min-priority queue of sweep events.
///
/// Events live in a slab and the heap only stores handles to them.
/// Removing an event by handle frees its slot right away; the heap
/// entry is dropped lazily when it reaches the top.
#[derive(Debug)]
pub struct EventQueue<T: GeoFloat> {
    events: Slab<Pending<T>>,
    heap: BinaryHeap<Entry<T>>,
    next_seq: u64,
}

impl<T: GeoFloat> Default for EventQueue<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T: GeoFloat> EventQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(size: usize) -> Self {
        EventQueue {
            events: Slab::with_capacity(size),
            heap: BinaryHeap::with_capacity(size),
            next_seq: 0,
        }
    }

    /// Number of pending events.
    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn push(&mut self, event: Event<T>) -> EventHandle {
        let seq = self.next_seq;
        self.next_seq += 1;

        let slot = self.events.insert(Pending { seq, event });
        let handle = EventHandle { slot, seq };
        self.heap.push(Entry {
            x: event.point.x(),
            rank: event.rank(),
            y: event.point.y(),
            handle,
        });
        handle
    }

    /// Get a pending event by handle.
    pub fn get(&self, handle: EventHandle) -> Option<&Event<T>> {
        match self.events.get(handle.slot) {
            Some(p) if p.seq == handle.seq => Some(&p.event),
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, handle: EventHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Remove a pending event by handle.
    ///
    /// Returns `None` if the event was already popped or removed.
    pub fn remove(&mut self, handle: EventHandle) -> Option<Event<T>> {
        if !self.contains(handle) {
            return None;
        }
        Some(self.events.remove(handle.slot).event)
    }

    /// Drop heap entries whose event is no longer pending.
    fn prune(&mut self) {
        while let Some(top) = self.heap.peek() {
            if self.contains(top.handle) {
                break;
            }
            self.heap.pop();
        }
    }

    /// Peek at the next event to be processed.
    pub fn peek(&mut self) -> Option<&Event<T>> {
        self.prune();
        let handle = self.heap.peek()?.handle;
        self.get(handle)
    }

    /// Remove and return the next event to be processed.
    pub fn pop_min(&mut self) -> Result<Event<T>, EmptyQueue> {
        self.prune();
        let entry = self.heap.pop().ok_or(EmptyQueue)?;
        Ok(self.events.remove(entry.handle.slot).event)
    }

    /// Iterate over the pending events in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Event<T>> + '_ {
        self.events.iter().map(|(_, p)| &p.event)
    }
}

impl<T: GeoFloat> FromIterator<Event<T>> for EventQueue<T> {
    fn from_iter<I: IntoIterator<Item = Event<T>>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut queue = EventQueue::with_capacity(iter.size_hint().0);
        queue.extend(iter);
        queue
    }
}

impl<T: GeoFloat> Extend<Event<T>> for EventQueue<T> {
    fn extend<I: IntoIterator<Item = Event<T>>>(&mut self, iter: I) {
        for event in iter {
            self.push(event);
        }
    }
}
