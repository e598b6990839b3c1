mod arena;
mod branch;
mod candidate;
mod commit;
mod crypto;
mod decide;
mod elector;
mod error;
mod event;
mod fault;
mod gossip;
mod graph_utils;
mod primitives;
mod proof;
mod store;
mod vote;
mod worker;

pub use arena::{EventIndex, History};
pub use crypto::{Crypto, CryptoError, Ed25519Crypto};
pub use decide::{decide, Decision, Outcome};
pub use elector::{ElectorSelector, ElectorSet, StaticElectorSet};
pub use error::{DecideError, DecideResult};
pub use event::{ElectorId, Event, EventHash, EventKind};
pub use fault::{ByzantineReport, FaultKind};
pub use gossip::{CreatorHeads, GossipClient, GossipMessage, GossipServer};
pub use store::{EventStore, InMemoryEventStore, StoreError, StoreResult};
pub use worker::{Worker, WorkerError};
