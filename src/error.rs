use crate::event::EventHash;
use thiserror::Error;

/// Fatal failures of a [`crate::decide::decide`] call.
///
/// A `MalformedHistory` means the caller handed the core a snapshot that
/// violates one of the structural invariants in the data model (a cycle, a
/// `tree_hash` absent from `parent_hash`, or an event with neither a creator
/// nor children). The caller must not retry with the same snapshot; it has
/// to go back to the `EventStore` and figure out why it produced a bad view.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecideError {
  #[error("event {0} violates a structural invariant: {1}")]
  MalformedHistory(EventHash, String),
}

pub type DecideResult<T> = Result<T, DecideError>;
