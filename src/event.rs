//! The DAG data model: events, their hashes, and elector identities.
//!
//! Events are immutable facts supplied by the external `EventStore`; the
//! core never constructs or mutates one. Only merge events are consulted
//! here — regular events are opaque payloads that show up solely as
//! entries of [`Event::parent_hash`].

use crate::primitives::ToBase58String;
use multihash_codetable::{Code as MultihashCode, Multihash, MultihashDigest, Sha3_256};
use multihash_derive::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content-addressed identifier of an event.
///
/// Wraps a [`Multihash`] rather than a raw digest so the hashing scheme can
/// evolve without changing every call site; equality and ordering are
/// defined over the encoded bytes, which makes the lexicographic ordering
/// required by the spec's determinism guarantees a plain byte comparison.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventHash(#[serde(with = "serde_multihash")] Multihash);

impl EventHash {
  pub fn new(mh: Multihash) -> Self {
    Self(mh)
  }

  /// Hashes arbitrary canonicalized event bytes the same way the teacher's
  /// vote/block hashing does: SHA3-256 wrapped in a multihash envelope.
  pub fn of(bytes: &[u8]) -> Self {
    let mut sha3 = Sha3_256::default();
    sha3.update(bytes);
    Self(
      MultihashCode::Sha3_256
        .wrap(sha3.finalize())
        .expect("digest length matches multihash code"),
    )
  }

  pub fn as_multihash(&self) -> &Multihash {
    &self.0
  }
}

impl ToBase58String for EventHash {
  fn to_b58(&self) -> String {
    self.0.to_b58()
  }
}

impl fmt::Debug for EventHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "EventHash({})", self.to_b58())
  }
}

impl fmt::Display for EventHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.to_b58())
  }
}

mod serde_multihash {
  use multihash_codetable::Multihash;
  use serde::{Deserialize, Deserializer, Serialize, Serializer};

  pub fn serialize<S: Serializer>(mh: &Multihash, s: S) -> Result<S::Ok, S::Error> {
    mh.to_bytes().serialize(s)
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Multihash, D::Error> {
    let bytes = Vec::<u8>::deserialize(d)?;
    Multihash::from_bytes(&bytes).map_err(serde::de::Error::custom)
  }
}

/// Opaque identity of an elector/witness. The core never interprets this
/// beyond equality and ordering; verifying that the bearer of an `ElectorId`
/// actually signed the events attributed to it is the `Crypto` provider's
/// job (§6), performed before an event ever enters a [`crate::arena::History`]
/// snapshot.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElectorId(String);

impl ElectorId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for ElectorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl fmt::Display for ElectorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<&str> for ElectorId {
  fn from(s: &str) -> Self {
    Self::new(s)
  }
}

/// The kind of an event. Only `Merge` events are examined by the core;
/// `Regular` and `Configuration` events are swept in as ancestors by the
/// Committer (§4.4) but never appear in a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
  Regular,
  Merge,
  Configuration,
}

/// A single node of the DAG, as handed to the core by the `EventStore`.
///
/// `parent_hash` is unordered and may include non-merge ancestors (regular
/// events, configuration events); `tree_hash`, when present, must be an
/// element of `parent_hash` — this is `Event::well_formed`'s first check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  pub event_hash: EventHash,
  pub creator: ElectorId,
  pub kind: EventKind,
  /// The creator's immediately prior merge event on its own branch.
  /// Absent only for the genesis event of a branch.
  pub tree_hash: Option<EventHash>,
  pub parent_hash: Vec<EventHash>,
}

impl Event {
  pub fn is_merge(&self) -> bool {
    self.kind == EventKind::Merge
  }

  /// Checks the one structural invariant the core can verify locally,
  /// without consulting the rest of the snapshot: a merge event's tree
  /// parent, if any, must be among its listed parents.
  pub fn well_formed(&self) -> bool {
    match &self.tree_hash {
      Some(tree_hash) => self.parent_hash.contains(tree_hash),
      None => true,
    }
  }
}

impl fmt::Display for Event {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}@{}", self.creator, self.event_hash)
  }
}
