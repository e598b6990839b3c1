//! The event arena: a [`History`] snapshot indexed by stable integer
//! handles instead of the pointer/back-pointer graph the distilled source
//! uses. All traversal in `branch`, `candidate`, `proof` and `commit` goes
//! through [`EventIndex`] — no `Rc`/`RefCell`/raw pointers anywhere in this
//! crate, mirroring the arena-of-indices shape used by DAG-gossip graphs in
//! the wider ecosystem rather than the teacher's own `Rc<RefCell<TreeNode>>`
//! fork tree, which models a single-parent chain and doesn't fit a DAG.

use crate::error::{DecideError, DecideResult};
use crate::event::{Event, EventHash};
use std::collections::BTreeMap;

/// Stable handle into a [`History`]'s event vector. Cheap to copy, valid
/// only for the `History` it was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventIndex(pub(crate) usize);

/// A finite, parent-closed set of non-consensus merge events, plus the
/// subset of non-merge ancestors referenced by them.
///
/// Construction resolves every `parent_hash`/`tree_hash` entry that points
/// at another merge event in the set into an [`EventIndex`], validates the
/// structural invariants from §3, and rejects cycles. Events referenced as
/// parents but absent from the input (genesis or already-consensus events)
/// are recorded only as opaque hashes, never as indices.
#[derive(Debug)]
pub struct History {
  events: Vec<Event>,
  index_of: BTreeMap<EventHash, EventIndex>,
  /// Merge-event parents of each event, resolved to indices and sorted by
  /// hash so forward/backward traversal order is reproducible.
  parents: Vec<Vec<EventIndex>>,
  tree_parent: Vec<Option<EventIndex>>,
}

impl History {
  /// Builds a `History` from an unordered batch of merge events.
  ///
  /// Mirrors `EventStore::loadRecentHistory`'s contract (§6): every event's
  /// `_parents` is materialized eagerly here so the rest of the core never
  /// has to re-resolve a hash.
  pub fn build(events: Vec<Event>) -> DecideResult<Self> {
    let mut index_of = BTreeMap::new();
    for event in &events {
      if !event.well_formed() {
        return Err(DecideError::MalformedHistory(
          event.event_hash,
          "tree_hash is not an element of parent_hash".into(),
        ));
      }
      if index_of
        .insert(event.event_hash, EventIndex(index_of.len()))
        .is_some()
      {
        return Err(DecideError::MalformedHistory(
          event.event_hash,
          "duplicate event hash in snapshot".into(),
        ));
      }
    }

    let mut parents = Vec::with_capacity(events.len());
    let mut tree_parent = Vec::with_capacity(events.len());
    for event in &events {
      let mut resolved: Vec<EventIndex> = event
        .parent_hash
        .iter()
        .filter_map(|h| index_of.get(h).copied())
        .collect();
      resolved.sort_by_key(|idx| events[idx.0].event_hash);
      resolved.dedup();
      tree_parent.push(
        event
          .tree_hash
          .as_ref()
          .and_then(|h| index_of.get(h).copied()),
      );
      parents.push(resolved);
    }

    let history = Self {
      events,
      index_of,
      parents,
      tree_parent,
    };
    history.check_acyclic()?;
    Ok(history)
  }

  fn check_acyclic(&self) -> DecideResult<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
      Unvisited,
      Visiting,
      Done,
    }
    let mut mark = vec![Mark::Unvisited; self.events.len()];

    fn visit(
      idx: usize,
      history: &History,
      mark: &mut [Mark],
    ) -> DecideResult<()> {
      match mark[idx] {
        Mark::Done => return Ok(()),
        Mark::Visiting => {
          return Err(DecideError::MalformedHistory(
            history.events[idx].event_hash,
            "cycle detected in history snapshot".into(),
          ))
        }
        Mark::Unvisited => {}
      }
      mark[idx] = Mark::Visiting;
      for parent in &history.parents[idx] {
        visit(parent.0, history, mark)?;
      }
      mark[idx] = Mark::Done;
      Ok(())
    }

    for idx in 0..self.events.len() {
      visit(idx, self, &mut mark)?;
    }
    Ok(())
  }

  pub fn len(&self) -> usize {
    self.events.len()
  }

  pub fn is_empty(&self) -> bool {
    self.events.is_empty()
  }

  pub fn index_of(&self, hash: &EventHash) -> Option<EventIndex> {
    self.index_of.get(hash).copied()
  }

  pub fn event(&self, idx: EventIndex) -> &Event {
    &self.events[idx.0]
  }

  pub fn hash(&self, idx: EventIndex) -> EventHash {
    self.events[idx.0].event_hash
  }

  /// Merge-event parents present in this snapshot, sorted by hash.
  pub fn parents(&self, idx: EventIndex) -> &[EventIndex] {
    &self.parents[idx.0]
  }

  pub fn tree_parent_hash(&self, idx: EventIndex) -> Option<EventHash> {
    self.events[idx.0].tree_hash
  }

  /// The resolved tree parent, if it is present in this snapshot (it may
  /// not be, if the creator's previous merge event has already reached
  /// consensus and was pruned from the history).
  pub fn resolved_tree_parent(&self, idx: EventIndex) -> Option<EventIndex> {
    self.tree_parent[idx.0]
  }

  pub fn indices(&self) -> impl Iterator<Item = EventIndex> {
    (0..self.events.len()).map(EventIndex)
  }

  /// All ancestor hashes in the snapshot reachable from `idx`, including
  /// `idx` itself. Grounds `buildAncestryMap` (§4.5).
  pub fn build_ancestry_map(&self, idx: EventIndex) -> std::collections::BTreeSet<EventIndex> {
    let mut seen = std::collections::BTreeSet::new();
    let mut stack = vec![idx];
    while let Some(cur) = stack.pop() {
      if seen.insert(cur) {
        stack.extend(self.parents(cur).iter().copied());
      }
    }
    seen
  }

  /// A dependency order over every event in the snapshot: `u` always
  /// precedes `v` if `u` is an ancestor of `v`. The proof protocol (§4.3)
  /// walks events in this order, filtered down to whichever subset it
  /// cares about, so that a vote lookup never references an event whose
  /// state hasn't been computed yet.
  pub fn topological_order(&self) -> Vec<EventIndex> {
    let mut order = Vec::with_capacity(self.events.len());
    let mut done = vec![false; self.events.len()];
    for idx in self.indices() {
      Self::topo_visit(idx, &self.parents, &mut done, &mut order);
    }
    order
  }

  fn topo_visit(
    idx: EventIndex,
    parents: &[Vec<EventIndex>],
    done: &mut [bool],
    order: &mut Vec<EventIndex>,
  ) {
    if done[idx.0] {
      return;
    }
    done[idx.0] = true;
    for &parent in &parents[idx.0] {
      Self::topo_visit(parent, parents, done, order);
    }
    order.push(idx);
  }
}
