//! `GossipClient` / `GossipServer` (§6): trait-only surfaces for exchanging
//! history with peers. The wire protocol, transport, and peer discovery are
//! explicitly out of scope for this crate — the teacher's `network` module
//! wires this over `libp2p`/`episub`; a real deployment would do the same,
//! but none of that belongs in the consensus core.

use crate::event::{ElectorId, Event, EventHash};
use std::collections::BTreeMap;

/// Per-creator latest-known generation, used by a gossip responder to
/// decide what the requester is missing.
pub type CreatorHeads = BTreeMap<ElectorId, u32>;

/// The single message shape exchanged by gossip round-trips (§6): a probe
/// carrying the sender's view, and a response carrying whatever the
/// responder believes the sender lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GossipMessage {
  pub event_hash: Option<EventHash>,
  pub creator_heads: CreatorHeads,
  pub history: Vec<Event>,
  /// Set when the responder had more to send than it was willing to in one
  /// message; the requester must follow up.
  pub truncated: bool,
}

pub trait GossipClient {
  /// Sends this node's current view to a peer and returns whatever the
  /// peer sent back.
  fn exchange(&self, peer: &str, outgoing: GossipMessage) -> GossipMessage;
}

pub trait GossipServer {
  /// Responds to an incoming probe with the events the probe's
  /// `creator_heads` indicate the peer is missing.
  fn respond(&self, incoming: GossipMessage) -> GossipMessage;
}
