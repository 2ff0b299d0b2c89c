//! In-flight request ledger
//!
//! When several callers miss the cache for the same signature at once, only
//! the first one (the leader) goes to the catalog. Everyone else subscribes
//! to the leader's broadcast and receives the same outcome, success or
//! failure. The ledger entry disappears as soon as the outcome is published.
//!
//! Claiming is a single critical section over both the ledger and the cache,
//! and a leader stores its response in the cache before retiring its ledger
//! entry. A caller can therefore never observe "not cached and not in
//! flight" for a signature whose response has already landed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use hdx_client::CatalogError;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use super::keys::RequestSignature;
use super::response::ResponseCache;

/// Outcome shared with every waiter on a signature
pub type SharedOutcome = Result<Arc<Value>, CatalogError>;

type Waiters = HashMap<RequestSignature, broadcast::Sender<SharedOutcome>>;

/// Ledger of catalog requests currently in flight
#[derive(Debug, Default, Clone)]
pub struct InFlightLedger {
    entries: Arc<Mutex<Waiters>>,
}

/// Result of claiming a signature
#[derive(Debug)]
pub enum Claim {
    /// The response is already cached
    Cached(Arc<Value>),
    /// Another caller is fetching it; wait for their outcome
    Follower(Follower),
    /// Nobody is fetching it; the caller must fetch and complete the guard
    Leader(LeaderGuard),
}

impl InFlightLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(entries: &Mutex<Waiters>) -> MutexGuard<'_, Waiters> {
        // The map holds no invariant a panicking holder could break halfway
        entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Decide who fetches `signature`
    pub fn claim(&self, signature: &RequestSignature, cache: &ResponseCache) -> Claim {
        let mut entries = Self::lock(&self.entries);

        if let Some(value) = cache.get(signature) {
            return Claim::Cached(value);
        }

        if let Some(sender) = entries.get(signature) {
            cache.record_coalesced();
            debug!(
                signature = %signature,
                waiting = sender.receiver_count() + 1,
                "Coalescing with in-flight request"
            );
            return Claim::Follower(Follower {
                signature: signature.clone(),
                receiver: sender.subscribe(),
            });
        }

        let (sender, _) = broadcast::channel(1);
        entries.insert(signature.clone(), sender.clone());
        Claim::Leader(LeaderGuard {
            signature: signature.clone(),
            entries: Arc::clone(&self.entries),
            sender,
            completed: false,
        })
    }

    /// Whether a request for `signature` is outstanding
    pub fn is_in_flight(&self, signature: &RequestSignature) -> bool {
        Self::lock(&self.entries).contains_key(signature)
    }

    /// Number of outstanding requests
    pub fn len(&self) -> usize {
        Self::lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Held by the one caller that fetches a signature.
///
/// Dropping the guard without completing it (the leader was cancelled)
/// retires the entry; followers then see [`Follower::wait`] return `None`
/// and claim again.
#[derive(Debug)]
pub struct LeaderGuard {
    signature: RequestSignature,
    entries: Arc<Mutex<Waiters>>,
    sender: broadcast::Sender<SharedOutcome>,
    completed: bool,
}

impl LeaderGuard {
    pub fn signature(&self) -> &RequestSignature {
        &self.signature
    }

    /// Retire the entry and publish the outcome to every follower.
    ///
    /// A successful response must already be in the cache.
    pub fn complete(mut self, outcome: SharedOutcome) {
        let mut entries = InFlightLedger::lock(&self.entries);
        entries.remove(&self.signature);
        let waiting = self.sender.receiver_count();
        // No receivers is fine: nobody coalesced with us
        let _ = self.sender.send(outcome);
        self.completed = true;
        drop(entries);

        if waiting > 0 {
            debug!(signature = %self.signature, waiting, "Broadcast in-flight outcome");
        }
    }
}

impl Drop for LeaderGuard {
    fn drop(&mut self) {
        if !self.completed {
            InFlightLedger::lock(&self.entries).remove(&self.signature);
            debug!(signature = %self.signature, "In-flight request abandoned");
        }
    }
}

/// Waits on another caller's request
#[derive(Debug)]
pub struct Follower {
    signature: RequestSignature,
    receiver: broadcast::Receiver<SharedOutcome>,
}

impl Follower {
    pub fn signature(&self) -> &RequestSignature {
        &self.signature
    }

    /// Wait for the leader's outcome; `None` if the leader gave up
    pub async fn wait(mut self) -> Option<SharedOutcome> {
        self.receiver.recv().await.ok()
    }
}
