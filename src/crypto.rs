//! `Crypto` (§6): the one external contract the core consults for hashing
//! and signature verification. Verification happens *before* an event ever
//! enters a [`crate::arena::History`] snapshot — the core itself never
//! calls `verify`, it only defines the contract so a ledger node's
//! ingestion path can share one implementation.

use crate::event::EventHash;
use ed25519_dalek::{PublicKey, Signature, Verifier};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
  #[error("malformed public key")]
  MalformedPublicKey,
  #[error("malformed signature")]
  MalformedSignature,
}

pub trait Crypto {
  /// Hashes already-canonicalized event bytes into an [`EventHash`].
  fn hash(&self, canonicalized_event: &[u8]) -> EventHash;

  /// Verifies `signature` over `canonicalized_event` under `public_key`.
  fn verify(
    &self,
    canonicalized_event: &[u8],
    signature: &[u8],
    public_key: &[u8],
  ) -> Result<bool, CryptoError>;
}

/// The default provider: SHA3-256 content hashing (matching
/// [`EventHash::of`]) and Ed25519 signature verification, the same
/// primitives `primitives::b58` wraps for display.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Crypto;

impl Crypto for Ed25519Crypto {
  fn hash(&self, canonicalized_event: &[u8]) -> EventHash {
    EventHash::of(canonicalized_event)
  }

  fn verify(
    &self,
    canonicalized_event: &[u8],
    signature: &[u8],
    public_key: &[u8],
  ) -> Result<bool, CryptoError> {
    let public_key = PublicKey::from_bytes(public_key).map_err(|_| CryptoError::MalformedPublicKey)?;
    let signature = Signature::from_bytes(signature).map_err(|_| CryptoError::MalformedSignature)?;
    Ok(public_key.verify(canonicalized_event, &signature).is_ok())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_matches_event_hash_of() {
    let crypto = Ed25519Crypto;
    assert_eq!(crypto.hash(b"abc"), EventHash::of(b"abc"));
  }
}
