//! Byzantine fault telemetry (§7).
//!
//! Detecting a faulty elector is never fatal to a decision — the elector's
//! vote or branch is excluded and the round proceeds among the remaining
//! `n - 1` electors if that is still `≥ s` (scenario S3). `ByzantineReport`
//! exists purely so the caller can slash, log, or otherwise act on the
//! misbehaviour; the core itself only needs to exclude it.

use crate::event::ElectorId;
use serde::{Deserialize, Serialize};

/// The maximum fraction of electors the protocol tolerates misbehaving
/// while still guaranteeing safety: `f` out of `3f + 1`.
pub const BYZANTINE_FRACTION: f32 = 1.0 / 3.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
  /// The elector published more than one tree child from the same event,
  /// or more than one branch tail — a fork in its own history.
  MultipleTreeChildren,
  /// Two events at the same generation from the same elector were observed
  /// while collecting votes along a branch.
  EquivocatingVote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByzantineReport {
  pub elector: ElectorId,
  pub kind: FaultKind,
}

impl ByzantineReport {
  pub fn new(elector: ElectorId, kind: FaultKind) -> Self {
    Self { elector, kind }
  }
}
