//! CandidateFinder (§4.2): selects each correct elector's proof pair (X, Y).
//!
//! X is always the elector's branch tail — the "commented-out
//! `_findDiversePedigreeMergeEvent` call" for X selection the spec's design
//! notes (§9) mention is deliberately not implemented here; we follow the
//! active behaviour the source actually runs. Y is the first branch-native
//! descendant of X whose accumulated descendants-in-path endorse a
//! supermajority of electors, found by walking forward via
//! [`find_diverse_pedigree_merge_event`].

use crate::arena::{EventIndex, History};
use crate::branch::Branches;
use crate::elector::ElectorSet;
use crate::event::ElectorId;
use crate::graph_utils::{find_diverse_pedigree_merge_event, DescendantMap};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// The X/Y pair for every correct elector that reached one this round, plus
/// the endorsement path from each X to its Y — the latter is reused
/// unchanged by the Committer (§4.4) to derive the consensus proof.
pub struct Candidates {
  x: BTreeMap<ElectorId, EventIndex>,
  y: BTreeMap<ElectorId, EventIndex>,
  x_descendants: BTreeMap<ElectorId, DescendantMap>,
}

impl Candidates {
  pub fn find(history: &History, branches: &Branches, electors: &ElectorSet) -> Option<Self> {
    let s = electors.supermajority();

    let mut x = BTreeMap::new();
    for elector in branches.correct_electors() {
      if let Some(tail) = branches.tail(elector) {
        x.insert(elector.clone(), tail);
      }
    }
    trace!(tailed = x.len(), needed = s, "x candidates seeded from tails");
    if x.len() < s {
      debug!("fewer than s electors have tails; no consensus this round");
      return None;
    }

    let mut y = BTreeMap::new();
    let mut x_descendants = BTreeMap::new();
    for (elector, &x_idx) in &x {
      let mut descendants = DescendantMap::seed(x_idx);
      if let Some(y_idx) =
        find_diverse_pedigree_merge_event(history, branches, x_idx, electors, &mut descendants)
      {
        trace!(%elector, x = %history.hash(x_idx), y = %history.hash(y_idx), "y found");
        y.insert(elector.clone(), y_idx);
      }
      x_descendants.insert(elector.clone(), descendants);
    }
    debug!(x = x.len(), y = y.len(), needed = s, "candidate search finished");
    if y.len() < s {
      debug!("fewer than s electors reached a Y; no consensus this round");
      return None;
    }

    Some(Self { x, y, x_descendants })
  }

  pub fn x_of(&self, elector: &ElectorId) -> Option<EventIndex> {
    self.x.get(elector).copied()
  }

  pub fn y_of(&self, elector: &ElectorId) -> Option<EventIndex> {
    self.y.get(elector).copied()
  }

  pub fn ys(&self) -> impl Iterator<Item = (&ElectorId, &EventIndex)> {
    self.y.iter()
  }

  pub fn x_descendants(&self, elector: &ElectorId) -> Option<&DescendantMap> {
    self.x_descendants.get(elector)
  }
}
