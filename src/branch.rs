//! BranchBuilder (§4.1): turns the unordered snapshot into a per-elector
//! forward-linked chain of merge events, each carrying a generation.
//!
//! Grounded on the same shape as the teacher's fork tree construction
//! (`TreeNode::add_child` linking a block under its resolved parent) but
//! walking `tree_hash` instead of `parent()`, and fanning out per creator
//! instead of building one global tree — a DAG has as many tree-linked
//! branches as it has electors.

use crate::arena::{EventIndex, History};
use crate::elector::ElectorSet;
use crate::event::ElectorId;
use crate::fault::{ByzantineReport, FaultKind};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Per-elector branch structure derived from one pass over the snapshot.
///
/// An elector is "byzantine" here precisely when §3's invariant
/// (`_treeChildren.length ≤ 1` and exactly one tail) is violated; its
/// events remain in `tree_children`/`generation` (they're still valid
/// ancestors for everyone else's descendant searches) but it is excluded
/// from [`Branches::tails`] and therefore from X/Y selection (§4.2).
pub struct Branches {
  tree_children: Vec<Vec<EventIndex>>,
  generation: Vec<u32>,
  tails: BTreeMap<ElectorId, Vec<EventIndex>>,
  byzantine: Vec<ElectorId>,
  reports: Vec<ByzantineReport>,
}

impl Branches {
  pub fn build(history: &History, electors: &ElectorSet) -> Self {
    let n = history.len();
    let mut tree_children: Vec<Vec<EventIndex>> = vec![Vec::new(); n];
    let mut tails: BTreeMap<ElectorId, Vec<EventIndex>> = BTreeMap::new();

    for idx in history.indices() {
      let event = history.event(idx);
      if !event.is_merge() || !electors.contains(&event.creator) {
        continue;
      }
      match history.resolved_tree_parent(idx) {
        Some(parent) => tree_children[parent.0].push(idx),
        None => tails.entry(event.creator.clone()).or_default().push(idx),
      }
    }
    for children in &mut tree_children {
      children.sort_by_key(|idx| idx.0);
    }

    let mut byzantine = Vec::new();
    let mut reports = Vec::new();
    for (creator, creator_tails) in &tails {
      if creator_tails.len() > 1 {
        warn!(%creator, "byzantine elector: multiple branch tails");
        byzantine.push(creator.clone());
        reports.push(ByzantineReport::new(
          creator.clone(),
          FaultKind::MultipleTreeChildren,
        ));
      }
    }
    for idx in history.indices() {
      if tree_children[idx.0].len() > 1 {
        let creator = &history.event(idx).creator;
        if electors.contains(creator) && !byzantine.contains(creator) {
          warn!(%creator, event = %history.hash(idx), "byzantine elector: multiple tree children");
          byzantine.push(creator.clone());
          reports.push(ByzantineReport::new(
            creator.clone(),
            FaultKind::MultipleTreeChildren,
          ));
        }
      }
    }

    let mut generation = vec![0u32; n];
    for (creator, creator_tails) in &tails {
      if byzantine.contains(creator) {
        continue;
      }
      let mut queue: std::collections::VecDeque<EventIndex> =
        creator_tails.iter().copied().collect();
      for tail in creator_tails {
        generation[tail.0] = 1;
      }
      while let Some(cur) = queue.pop_front() {
        let gen = generation[cur.0];
        for &child in &tree_children[cur.0] {
          generation[child.0] = gen + 1;
          queue.push_back(child);
        }
      }
    }

    debug!(
      electors = electors.len(),
      tails = tails.len(),
      byzantine = byzantine.len(),
      "branch builder finished"
    );

    Self {
      tree_children,
      generation,
      tails,
      byzantine,
      reports,
    }
  }

  pub fn tree_children(&self, idx: EventIndex) -> &[EventIndex] {
    &self.tree_children[idx.0]
  }

  pub fn generation(&self, idx: EventIndex) -> u32 {
    self.generation[idx.0]
  }

  /// The tail(s) of a correct elector's branch, or `None` if the elector
  /// has no events in this snapshot or was marked byzantine.
  pub fn tail(&self, elector: &ElectorId) -> Option<EventIndex> {
    if self.byzantine.contains(elector) {
      return None;
    }
    self.tails.get(elector).and_then(|tails| {
      if tails.len() == 1 {
        Some(tails[0])
      } else {
        None
      }
    })
  }

  pub fn correct_electors(&self) -> impl Iterator<Item = &ElectorId> {
    self
      .tails
      .keys()
      .filter(move |e| !self.byzantine.contains(e))
  }

  pub fn byzantine_electors(&self) -> &[ElectorId] {
    &self.byzantine
  }

  pub fn is_byzantine(&self, elector: &ElectorId) -> bool {
    self.byzantine.contains(elector)
  }

  pub fn reports(&self) -> &[ByzantineReport] {
    &self.reports
  }
}
