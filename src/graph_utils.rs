//! Shared graph traversal helpers (§4.5), used by both `candidate` and
//! `proof`: descendants-in-path bookkeeping, flattening, and the
//! supermajority-endorsement tests that drive X/Y selection and confirm
//! point discovery.

use crate::arena::{EventIndex, History};
use crate::branch::Branches;
use crate::elector::ElectorSet;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Memoized descendants-in-path from one ancestor event (an X or a Y) to
/// however-far a search has walked forward so far.
///
/// `edges` holds, for each event on some path from the root to the search
/// frontier, its immediate forward neighbours *within that path* — this is
/// `findDescendantsInPath`'s `descendants` map (§4.5). `expanded` records
/// which events have already had their backward edges discovered, so
/// calling [`DescendantMap::extend_to`] with a later `y` only does
/// incremental work: the map "enlarges monotonically" as the spec requires.
#[derive(Debug, Default)]
pub struct DescendantMap {
  edges: BTreeMap<EventIndex, Vec<EventIndex>>,
  expanded: BTreeSet<EventIndex>,
}

impl DescendantMap {
  pub fn new() -> Self {
    Self::default()
  }

  /// Seeds the map so `root` itself counts as reached by [`Self::flatten`]
  /// even before any path has been walked into it — used to seed
  /// `_initDescendants` with X itself (§4.2).
  pub fn seed(root: EventIndex) -> Self {
    let mut map = Self::new();
    map.expanded.insert(root);
    map
  }

  fn record_edge(&mut self, parent: EventIndex, child: EventIndex) {
    let list = self.edges.entry(parent).or_default();
    if !list.contains(&child) {
      list.push(child);
    }
  }

  /// Extends the map with every event on a path from `root` (exclusive) to
  /// `y` (inclusive), walking backward through `y`'s merge-event parents
  /// and halting at any parent already in `root`'s ancestry.
  pub fn extend_to(
    &mut self,
    history: &History,
    root: EventIndex,
    y: EventIndex,
    ancestry_of_root: &BTreeSet<EventIndex>,
  ) {
    if y == root {
      return;
    }
    let mut stack = vec![y];
    while let Some(cur) = stack.pop() {
      if cur == root || !self.expanded.insert(cur) {
        continue;
      }
      for &parent in history.parents(cur) {
        self.record_edge(parent, cur);
        if !ancestry_of_root.contains(&parent) {
          stack.push(parent);
        }
      }
    }
  }

  /// Forward walk from `root` over the recorded edges, returning every
  /// event reached (excluding `root` itself).
  pub fn flatten(&self, root: EventIndex) -> BTreeSet<EventIndex> {
    let mut reached = BTreeSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(root);
    let mut visited = BTreeSet::new();
    visited.insert(root);
    while let Some(cur) = queue.pop_front() {
      if let Some(children) = self.edges.get(&cur) {
        for &child in children {
          if visited.insert(child) {
            reached.insert(child);
            queue.push_back(child);
          }
        }
      }
    }
    reached
  }

  /// Counts distinct elector creators observed while forward-walking from
  /// `root`, including `root`'s own creator, and reports whether that
  /// count has reached `electors.supermajority()`.
  pub fn has_sufficient_endorsements(
    &self,
    history: &History,
    root: EventIndex,
    electors: &ElectorSet,
  ) -> bool {
    let mut creators = BTreeSet::new();
    let root_creator = &history.event(root).creator;
    if electors.contains(root_creator) {
      creators.insert(root_creator.clone());
    }
    for idx in self.flatten(root) {
      let creator = &history.event(idx).creator;
      if electors.contains(creator) {
        creators.insert(creator.clone());
        if creators.len() >= electors.supermajority() {
          return true;
        }
      }
    }
    creators.len() >= electors.supermajority()
  }
}

/// Finds the earliest branch-native descendant of `root` whose accumulated
/// descendants-in-path endorse a supermajority of electors — the search
/// that both Y selection (§4.2) and confirm-point discovery (§4.3) run,
/// parameterized only by which event they start from.
///
/// `s = 1` short-circuits to `root` itself (a single-elector committee is
/// always trivially diverse).
pub fn find_diverse_pedigree_merge_event(
  history: &History,
  branches: &Branches,
  root: EventIndex,
  electors: &ElectorSet,
  descendants: &mut DescendantMap,
) -> Option<EventIndex> {
  if electors.supermajority() <= 1 {
    return Some(root);
  }
  let ancestry_of_root = history.build_ancestry_map(root);
  let mut queue: VecDeque<EventIndex> =
    branches.tree_children(root).iter().copied().collect();
  let mut visited = BTreeSet::new();
  while let Some(candidate) = queue.pop_front() {
    if !visited.insert(candidate) {
      continue;
    }
    descendants.extend_to(history, root, candidate, &ancestry_of_root);
    if descendants.has_sufficient_endorsements(history, root, electors) {
      return Some(candidate);
    }
    if branches.tree_children(candidate).len() <= 1 {
      queue.extend(branches.tree_children(candidate).iter().copied());
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::elector::ElectorSet;
  use crate::event::{ElectorId, Event, EventHash, EventKind};

  fn merge(tag: &str, creator: &str, parents: &[&str]) -> Event {
    Event {
      event_hash: EventHash::of(tag.as_bytes()),
      creator: ElectorId::new(creator),
      kind: EventKind::Merge,
      tree_hash: parents.first().map(|p| EventHash::of(p.as_bytes())),
      parent_hash: parents.iter().map(|p| EventHash::of(p.as_bytes())).collect(),
    }
  }

  #[test]
  fn descendant_map_flattens_a_diamond() {
    // a1 -> b1 -> c1, a1 -> b2 -> c1 (two paths converging)
    let events = vec![
      merge("a1", "A", &[]),
      merge("b1", "A", &["a1"]),
      merge("b2", "B", &["a1"]),
      merge("c1", "A", &["b1", "b2"]),
    ];
    let history = History::build(events).unwrap();
    let a1 = history.index_of(&EventHash::of(b"a1")).unwrap();
    let c1 = history.index_of(&EventHash::of(b"c1")).unwrap();

    let ancestry = history.build_ancestry_map(a1);
    let mut map = DescendantMap::seed(a1);
    map.extend_to(&history, a1, c1, &ancestry);

    let reached = map.flatten(a1);
    assert!(reached.contains(&c1));

    let electors = ElectorSet::new(vec![ElectorId::new("A"), ElectorId::new("B")]);
    assert!(map.has_sufficient_endorsements(&history, a1, &electors));
  }
}
