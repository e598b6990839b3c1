//! Committer (§4.4): turns the Y-set the proof protocol converged on into
//! the two hash collections a block actually needs.

use crate::arena::{EventIndex, History};
use crate::candidate::Candidates;
use crate::elector::ElectorSet;
use crate::event::EventHash;
use std::collections::BTreeSet;
use tracing::debug;

/// The committed event hashes and the consensus-proof hashes for one
/// decided round, both deduplicated and in deterministic (lexicographic by
/// hash) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitResult {
  pub event_hashes: Vec<EventHash>,
  pub consensus_proof_hashes: Vec<EventHash>,
}

/// Pairs every Y the proof protocol returned with its elector's X and
/// derives the two output collections.
pub fn commit(
  history: &History,
  candidates: &Candidates,
  electors: &ElectorSet,
  decided_ys: &[EventIndex],
) -> CommitResult {
  let mut xs: Vec<EventIndex> = Vec::new();
  for &y in decided_ys {
    let creator = &history.event(y).creator;
    if let Some(x) = candidates.x_of(creator) {
      xs.push(x);
    }
  }
  xs.sort_by_key(|idx| idx.0);
  xs.dedup();

  let mut committed: BTreeSet<EventHash> = BTreeSet::new();
  for &x in &xs {
    for ancestor in history.build_ancestry_map(x) {
      committed.insert(history.hash(ancestor));
      for parent_hash in &history.event(ancestor).parent_hash {
        committed.insert(*parent_hash);
      }
    }
  }

  let mut proof: BTreeSet<EventHash> = BTreeSet::new();
  if electors.supermajority() <= 1 {
    for &x in &xs {
      proof.insert(history.hash(x));
    }
  } else {
    for &y in decided_ys {
      let creator = &history.event(y).creator;
      if let (Some(x), Some(descendants)) = (candidates.x_of(creator), candidates.x_descendants(creator)) {
        proof.insert(history.hash(x));
        for idx in descendants.flatten(x) {
          proof.insert(history.hash(idx));
        }
      }
    }
  }

  debug!(
    committed = committed.len(),
    proof = proof.len(),
    "committer finished"
  );

  CommitResult {
    event_hashes: committed.into_iter().collect(),
    consensus_proof_hashes: proof.into_iter().collect(),
  }
}
