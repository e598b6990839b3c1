//! ProofProtocol (§4.3): collects votes along every correct elector's
//! Y-branch, tallies them, and walks precommit/confirm-point state forward
//! until some branch confirms a supported Y-set or every branch is
//! exhausted.
//!
//! This is the largest single piece of the core. Vote resolution (step 1)
//! tests plain ancestry membership rather than threading the incremental
//! `findDescendantsInPath` machinery through every event: because a
//! correct elector's branch is linear (§4.1), "the highest-generation
//! event by elector `e` that is an ancestor of the current event" is
//! exactly what the spec's path walk computes, and is simpler to get
//! right. `find_diverse_pedigree_merge_event` — genuinely structural,
//! about supermajority-of-creators-in-path — still uses
//! [`crate::graph_utils::DescendantMap`] unchanged, for both Y selection
//! (in `candidate`) and confirm-point discovery here.

use crate::arena::{EventIndex, History};
use crate::branch::Branches;
use crate::candidate::Candidates;
use crate::elector::ElectorSet;
use crate::event::ElectorId;
use crate::fault::{ByzantineReport, FaultKind};
use crate::graph_utils::{find_diverse_pedigree_merge_event, DescendantMap};
use crate::vote::Vote;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace, warn};

/// Per-event derived state, published once an event has been walked.
#[derive(Clone)]
struct EventState {
  /// The Y-set this event currently supports, sorted by index.
  supporting: Vec<EventIndex>,
  /// Most recently observed voting event per elector, inherited down the
  /// branch and refreshed at every step.
  votes: BTreeMap<ElectorId, Vote>,
  /// This branch's currently live precommit, if any.
  pre_commit: Option<EventIndex>,
}

/// Runs the proof protocol over every elector's Y-branch and returns the
/// decided Y-set, or `None` if every branch exhausted without a confirm
/// point firing (§4.3's termination contract).
pub struct ProofProtocol<'a> {
  history: &'a History,
  branches: &'a Branches,
  candidates: &'a Candidates,
  electors: &'a ElectorSet,
  states: BTreeMap<EventIndex, EventState>,
  y_ancestry: BTreeMap<ElectorId, BTreeSet<EventIndex>>,
  /// precommit event -> its confirm point, so a rejection can tear the
  /// link back down.
  confirm_point_of: BTreeMap<EventIndex, EventIndex>,
  /// confirm point event -> the precommit it confirms.
  to_confirm_of: BTreeMap<EventIndex, EventIndex>,
  /// Electors caught publishing two same-generation events while
  /// collecting votes along a branch (§7's `EquivocatingVote`).
  equivocation_reports: Vec<ByzantineReport>,
  reported_equivocators: BTreeSet<ElectorId>,
}

impl<'a> ProofProtocol<'a> {
  /// Runs the proof protocol, returning the decided Y-set (if any) and any
  /// equivocating electors caught along the way — reported regardless of
  /// whether a decision was reached.
  pub fn run(
    history: &'a History,
    branches: &'a Branches,
    candidates: &'a Candidates,
    electors: &'a ElectorSet,
  ) -> (Option<Vec<EventIndex>>, Vec<ByzantineReport>) {
    let mut protocol = Self {
      history,
      branches,
      candidates,
      electors,
      states: BTreeMap::new(),
      y_ancestry: BTreeMap::new(),
      confirm_point_of: BTreeMap::new(),
      to_confirm_of: BTreeMap::new(),
      equivocation_reports: Vec::new(),
      reported_equivocators: BTreeSet::new(),
    };
    let decision = protocol.execute();
    (decision, protocol.equivocation_reports)
  }

  fn execute(&mut self) -> Option<Vec<EventIndex>> {
    let s = self.electors.supermajority();
    if s <= 1 {
      // A single-elector committee's own Y trivially satisfies every
      // quorum test; the incremental tally below never fires here because
      // there is no second branch whose published state could ever credit
      // this one's vote back to it (§8: "electors.len() = 1: trivial").
      let mut decided: Vec<EventIndex> = self.candidates.ys().map(|(_, &idx)| idx).collect();
      decided.sort_by_key(|idx| idx.0);
      return Some(decided);
    }
    let y_by_index: BTreeMap<EventIndex, ElectorId> = self
      .candidates
      .ys()
      .map(|(elector, &idx)| (idx, elector.clone()))
      .collect();

    for (elector, &y_idx) in self.candidates.ys() {
      self
        .y_ancestry
        .insert(elector.clone(), self.history.build_ancestry_map(y_idx));
    }

    let mut scope: BTreeSet<EventIndex> = BTreeSet::new();
    for (_, &y_idx) in self.candidates.ys() {
      let mut queue = vec![y_idx];
      while let Some(cur) = queue.pop() {
        if scope.insert(cur) {
          queue.extend(self.branches.tree_children(cur).iter().copied());
        }
      }
    }
    trace!(scope = scope.len(), "proof protocol scope computed");

    for idx in self.history.topological_order() {
      if !scope.contains(&idx) {
        continue;
      }
      if let Some(elector) = y_by_index.get(&idx) {
        self.init_y(elector, idx);
        continue;
      }
      if let Some(decision) = self.process(idx, s) {
        debug!(
          set = decision.len(),
          event = %self.history.hash(idx),
          "confirm point reached"
        );
        return Some(decision);
      }
    }
    debug!("every branch exhausted without a confirm point");
    None
  }

  fn init_y(&mut self, elector: &ElectorId, y_idx: EventIndex) {
    let all_ys: BTreeSet<EventIndex> = self.candidates.ys().map(|(_, &idx)| idx).collect();
    let ancestry = &self.y_ancestry[elector];
    let supporting: Vec<EventIndex> = all_ys.intersection(ancestry).copied().collect();

    let mut votes = BTreeMap::new();
    for &y in &supporting {
      let creator = &self.history.event(y).creator;
      votes.insert(creator.clone(), Vote::Voting(y));
    }

    self.states.insert(
      y_idx,
      EventState {
        supporting,
        votes,
        pre_commit: None,
      },
    );
  }

  fn process(&mut self, idx: EventIndex, s: usize) -> Option<Vec<EventIndex>> {
    let tree_parent = self.history.resolved_tree_parent(idx)?;
    let parent_state = self.states.get(&tree_parent)?.clone();

    let votes = self.resolve_votes(parent_state.votes, idx);
    let tally = Self::tally(&votes, &self.states);

    let target_set = match parent_state.pre_commit {
      Some(pc) => self.precommit_union(pc, &votes),
      None => self.y_union(&votes),
    };
    let mut count = tally
      .iter()
      .find(|(set, _)| *set == &target_set)
      .map(|(_, count)| *count)
      .unwrap_or(0);
    if parent_state.supporting != target_set {
      count += 1;
    }

    let mut pre_commit = parent_state.pre_commit;
    let mut decision = None;

    if let Some(pc) = pre_commit {
      if self.states[&pc].supporting != target_set {
        if let Some(cp) = self.confirm_point_of.remove(&pc) {
          self.to_confirm_of.remove(&cp);
        }
        pre_commit = None;
      } else if let Some(&confirmed_pc) = self.to_confirm_of.get(&idx) {
        if count >= s {
          decision = Some(self.states[&confirmed_pc].supporting.clone());
        }
      }
    }

    if decision.is_none() && pre_commit.is_none() && count >= s {
      pre_commit = Some(idx);
      let mut descendants = DescendantMap::seed(idx);
      if let Some(cp) =
        find_diverse_pedigree_merge_event(self.history, self.branches, idx, self.electors, &mut descendants)
      {
        self.confirm_point_of.insert(idx, cp);
        self.to_confirm_of.insert(cp, idx);
      }
    }

    let mut votes = votes;
    votes.insert(self.history.event(idx).creator.clone(), Vote::Voting(idx));
    self.states.insert(
      idx,
      EventState {
        supporting: target_set,
        votes,
        pre_commit,
      },
    );

    decision
  }

  /// Updates `votes` with whatever is now observable from `event` —
  /// grounds §4.3 step 1. For each elector with a Y that is an ancestor of
  /// `event`, the visible vote is the highest-generation event authored by
  /// that elector among `event`'s ancestors; a correct elector's branch is
  /// linear, so that event is necessarily on the path from its Y to
  /// `event`.
  fn resolve_votes(
    &mut self,
    inherited: BTreeMap<ElectorId, Vote>,
    event: EventIndex,
  ) -> BTreeMap<ElectorId, Vote> {
    let mut votes = inherited;
    let ancestry_of_event = self.history.build_ancestry_map(event);

    for (elector, &y_idx) in self.candidates.ys() {
      if matches!(votes.get(elector), Some(Vote::Byzantine)) {
        continue;
      }
      if !ancestry_of_event.contains(&y_idx) {
        continue;
      }
      let y_gen = self.branches.generation(y_idx);
      let mut best: Option<EventIndex> = None;
      let mut conflict = false;
      for &candidate in &ancestry_of_event {
        if &self.history.event(candidate).creator != elector {
          continue;
        }
        let gen = self.branches.generation(candidate);
        if gen < y_gen {
          continue;
        }
        match best {
          None => best = Some(candidate),
          Some(cur) => {
            let cur_gen = self.branches.generation(cur);
            if gen == cur_gen && candidate != cur {
              conflict = true;
            } else if gen > cur_gen {
              best = Some(candidate);
            }
          }
        }
      }
      if conflict {
        if self.reported_equivocators.insert(elector.clone()) {
          warn!(%elector, event = %self.history.hash(event), "byzantine elector: equivocating vote");
          self
            .equivocation_reports
            .push(ByzantineReport::new(elector.clone(), FaultKind::EquivocatingVote));
        }
        votes.insert(elector.clone(), Vote::Byzantine);
      } else if let Some(b) = best {
        votes.insert(elector.clone(), Vote::Voting(b));
      }
    }
    votes
  }

  fn tally(
    votes: &BTreeMap<ElectorId, Vote>,
    states: &BTreeMap<EventIndex, EventState>,
  ) -> Vec<(Vec<EventIndex>, usize)> {
    let mut groups: BTreeMap<Vec<EventIndex>, usize> = BTreeMap::new();
    for vote in votes.values() {
      if let Vote::Voting(idx) = vote {
        if let Some(state) = states.get(idx) {
          *groups.entry(state.supporting.clone()).or_default() += 1;
        }
      }
    }
    groups.into_iter().collect()
  }

  /// The longest `supporting` set among this branch's own precommit and
  /// every other observable resolved precommit — by construction these
  /// nest, so the longest is their union (§4.3 step 3).
  fn precommit_union(&self, own_pc: EventIndex, votes: &BTreeMap<ElectorId, Vote>) -> Vec<EventIndex> {
    let mut best = self.states[&own_pc].supporting.clone();
    for vote in votes.values() {
      if let Vote::Voting(idx) = vote {
        if let Some(state) = self.states.get(idx) {
          if let Some(pc) = state.pre_commit {
            let candidate = &self.states[&pc].supporting;
            if candidate.len() > best.len() {
              best = candidate.clone();
            }
          }
        }
      }
    }
    best
  }

  /// The distinct set of Y's whose branches currently have a resolved
  /// vote, before any precommit exists (§4.3 step 3, "otherwise" branch).
  fn y_union(&self, votes: &BTreeMap<ElectorId, Vote>) -> Vec<EventIndex> {
    let mut set = BTreeSet::new();
    for (elector, vote) in votes {
      if matches!(vote, Vote::Voting(_)) {
        if let Some(y_idx) = self.candidates.y_of(elector) {
          set.insert(y_idx);
        }
      }
    }
    set.into_iter().collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::branch::Branches;
  use crate::candidate::Candidates;
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

  /// Single elector: its tail is both X and Y, and the confirm-point
  /// search short-circuits at `s = 1`, so the very next event after Y
  /// should already decide.
  #[test]
  fn single_elector_decides_immediately() {
    let events = vec![
      merge("a1", "A", &[]),
      merge("a2", "A", &["a1"]),
      merge("a3", "A", &["a2"]),
    ];
    let history = History::build(events).unwrap();
    let electors = ElectorSet::new(vec![ElectorId::new("A")]);
    let branches = Branches::build(&history, &electors);
    let candidates = Candidates::find(&history, &branches, &electors).expect("candidates");
    let (decided, reports) = ProofProtocol::run(&history, &branches, &candidates, &electors);
    assert!(decided.is_some());
    assert!(reports.is_empty());
    let a1 = history.index_of(&EventHash::of(b"a1")).unwrap();
    assert_eq!(decided.unwrap(), vec![a1]);
  }

  /// Four electors, three honest; D forks at generation 2. branch.rs
  /// excludes D as `MultipleTreeChildren` before candidate selection, so
  /// this mainly checks that running the proof protocol over the
  /// remaining honest branches with a forked elector still in the
  /// snapshot's ancestry doesn't panic and never double-reports the same
  /// elector if an equivocation were ever observed mid-branch.
  #[test]
  fn equivocating_vote_is_reported_once() {
    let events = vec![
      merge("a1", "A", &[]),
      merge("b1", "B", &[]),
      merge("c1", "C", &[]),
      merge("d1", "D", &[]),
      merge("a2", "A", &["a1", "b1", "c1", "d1"]),
      merge("b2", "B", &["b1", "a1", "c1", "d1"]),
      merge("c2", "C", &["c1", "a1", "b1", "d1"]),
      merge("d2", "D", &["d1", "a1", "b1", "c1"]),
      merge("d2prime", "D", &["d1", "a1", "b1", "c1"]),
      merge("a3", "A", &["a2", "b2", "c2", "d2"]),
      merge("b3", "B", &["b2", "a2", "c2", "d2"]),
      merge("c3", "C", &["c2", "a2", "b2", "d2"]),
    ];
    let history = History::build(events).unwrap();
    let electors = ElectorSet::new(
      ["A", "B", "C", "D"].iter().map(|n| ElectorId::new(*n)).collect(),
    );
    let branches = Branches::build(&history, &electors);
    if let Some(candidates) = Candidates::find(&history, &branches, &electors) {
      let (_, reports) = ProofProtocol::run(&history, &branches, &candidates, &electors);
      let d_reports: Vec<_> = reports
        .iter()
        .filter(|r| r.elector == ElectorId::new("D"))
        .collect();
      assert!(d_reports.len() <= 1);
    }
  }
}
