use thiserror::Error;

/// Errors reported for input that cannot be swept.
///
/// Input is validated eagerly when a [`crate::Sweep`] is built, so
/// these are never raised once events start being processed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SweepError {
    #[error("input segment {index} has zero length")]
    DegenerateInput { index: usize },

    #[error("input segment {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },
}

/// Returned by [`crate::EventQueue::pop_min`] once no events remain.
///
/// The sweep treats this as its termination signal.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("event queue is empty")]
pub struct EmptyQueue;
