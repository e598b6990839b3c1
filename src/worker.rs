//! The minimal worker loop (§5): wires an [`EventStore`] and an
//! [`ElectorSelector`] through [`decide`] so the core is runnable end to
//! end in tests and the demo binary. Not a production scheduler — no
//! retries, no backoff, no persistence, and no gossip; a real ledger node
//! serializes many more concerns around this single call.

use crate::arena::History;
use crate::decide::{decide, Outcome};
use crate::elector::ElectorSelector;
use crate::error::DecideResult;
use crate::store::{EventStore, StoreError};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum WorkerError {
  #[error(transparent)]
  Store(#[from] StoreError),
  #[error(transparent)]
  Decide(#[from] crate::error::DecideError),
}

/// Drives one ledger node's side of the loop described in §5(a)-(c): load
/// the recent-history snapshot, resolve the round's electors, and invoke
/// `decide`. Steps (d), persisting the block and retracting committed
/// events from the cache, are left to the caller — this crate has no block
/// or storage types of its own.
pub struct Worker<S, E> {
  store: S,
  elector_selector: E,
  ledger_node_id: String,
}

impl<S: EventStore, E: ElectorSelector> Worker<S, E> {
  pub fn new(store: S, elector_selector: E, ledger_node_id: impl Into<String>) -> Self {
    Self {
      store,
      elector_selector,
      ledger_node_id: ledger_node_id.into(),
    }
  }

  /// Runs a single round at `block_height` and returns whatever `decide`
  /// produced. Callers serialize this per ledger node per §5.
  pub fn run_round(&self, block_height: u64) -> Result<Outcome, WorkerError> {
    let events = self.store.load_recent_history(&self.ledger_node_id)?;
    let history = self.build_history(events)?;
    let electors = self.elector_selector.electors_for_block(block_height);

    let outcome = decide(&history, &electors, block_height);
    for report in &outcome.byzantine_reports {
      warn!(elector = %report.elector, kind = ?report.kind, "byzantine elector reported");
    }
    if let Some(decision) = &outcome.decision {
      info!(
        committed = decision.event_hashes.len(),
        proof = decision.consensus_proof_hashes.len(),
        "round decided"
      );
    } else {
      info!("round produced no decision");
    }
    Ok(outcome)
  }

  fn build_history(&self, events: Vec<crate::event::Event>) -> DecideResult<History> {
    History::build(events)
  }
}
