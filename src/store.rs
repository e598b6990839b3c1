//! `EventStore` (§6): the external snapshot source the core consumes. The
//! core never owns storage — this module only defines the trait contract
//! plus a minimal in-memory fixture used by tests, the demo binary, and
//! `worker`.

use crate::event::{Event, EventHash};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
  #[error("unknown ledger node {0}")]
  UnknownLedgerNode(String),
  #[error("ancestor {0} not found in store")]
  MissingAncestor(EventHash),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Supplies the non-consensus merge-event snapshot `decide` operates on.
///
/// Grounds `loadRecentHistory`/`loadAncestors` (§6) exactly; the core calls
/// neither directly, they exist for the `worker` loop to wire a concrete
/// backend into `decide`.
pub trait EventStore {
  /// All non-consensus merge events known for `ledger_node_id`. Missing
  /// parents are genesis or already-consensus events and are not an error.
  fn load_recent_history(&self, ledger_node_id: &str) -> StoreResult<Vec<Event>>;

  /// Realizes the regular/configuration events referenced only by hash in
  /// `parentHash`, used by the Committer to sweep them into `eventHashes`.
  fn load_ancestors(&self, hashes: &[EventHash]) -> StoreResult<Vec<Event>>;
}

/// A fixture store keyed by ledger node id, backing tests, the demo
/// binary, and the `worker` smoke test. Not a production backend: no
/// persistence, no eviction.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
  events: std::collections::BTreeMap<String, Vec<Event>>,
  ancestors: std::collections::BTreeMap<EventHash, Event>,
}

impl InMemoryEventStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, ledger_node_id: impl Into<String>, events: Vec<Event>) {
    self.events.entry(ledger_node_id.into()).or_default().extend(events);
  }

  pub fn insert_ancestor(&mut self, event: Event) {
    self.ancestors.insert(event.event_hash, event);
  }
}

impl EventStore for InMemoryEventStore {
  fn load_recent_history(&self, ledger_node_id: &str) -> StoreResult<Vec<Event>> {
    self
      .events
      .get(ledger_node_id)
      .cloned()
      .ok_or_else(|| StoreError::UnknownLedgerNode(ledger_node_id.to_string()))
  }

  fn load_ancestors(&self, hashes: &[EventHash]) -> StoreResult<Vec<Event>> {
    hashes
      .iter()
      .map(|h| {
        self
          .ancestors
          .get(h)
          .cloned()
          .ok_or(StoreError::MissingAncestor(*h))
      })
      .collect()
  }
}
