//! Exercises the `Worker` loop itself, rather than `decide` directly: a
//! ledger node's side of loading history and resolving electors.

use continuity_core::{ElectorId, Event, EventHash, EventKind, InMemoryEventStore, StaticElectorSet, Worker};

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
fn worker_decides_a_single_elector_round() {
  let mut store = InMemoryEventStore::new();
  store.insert(
    "node-1",
    vec![
      merge("a1", "A", &[]),
      merge("a2", "A", &["a1"]),
      merge("a3", "A", &["a2"]),
    ],
  );
  let selector = StaticElectorSet::new(vec![ElectorId::new("A")]);
  let worker = Worker::new(store, selector, "node-1");

  let outcome = worker.run_round(1).expect("round must succeed");
  assert!(outcome.decision.is_some());
}

#[test]
fn worker_surfaces_unknown_ledger_node() {
  let store = InMemoryEventStore::new();
  let selector = StaticElectorSet::new(vec![ElectorId::new("A")]);
  let worker = Worker::new(store, selector, "missing-node");

  let result = worker.run_round(1);
  assert!(result.is_err());
}
