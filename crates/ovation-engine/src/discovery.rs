//! Feed discovery interface and in-memory reference implementation.
//!
//! Discovery of eligible feed entries belongs to the host page; the engine
//! only consumes an ordered sequence of opaque handles. `MemoryFeed` stands
//! in for the host in tests and the demo server.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::error::FeedError;

/// Opaque handle to one eligible feed entry.
///
/// Produced per discovery invocation; consumed at most once by the
/// executor. Exclusion of already-kudoed entries from future discovery is
/// the collaborator's responsibility.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KudoTarget {
    pub id: String,
}

impl KudoTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Collaborator that enumerates and acts on feed entries.
#[async_trait]
pub trait FeedDiscovery: Send + Sync {
    /// The ordered set of entries not yet acted upon, most recent first.
    /// Order is significant; the executor never reorders.
    async fn list_eligible(&self) -> Result<Vec<KudoTarget>, FeedError>;

    /// Give one kudo. Not idempotent: applying twice to the same handle
    /// may be rejected by the host, which callers treat as skippable.
    async fn apply(&self, target: &KudoTarget) -> Result<(), FeedError>;
}

#[derive(Default)]
struct MemoryFeedState {
    pending: Vec<KudoTarget>,
    applied: Vec<KudoTarget>,
    failing: HashSet<String>,
    discovery_down: bool,
}

/// In-memory `FeedDiscovery` implementation.
///
/// Seedable with targets, scriptable failures, and a change signal that
/// fires whenever the set of eligible entries changes.
pub struct MemoryFeed {
    state: Mutex<MemoryFeedState>,
    changed: Arc<Notify>,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryFeedState::default()),
            changed: Arc::new(Notify::new()),
        }
    }

    /// Signal fired whenever eligible content changes.
    pub fn changed(&self) -> Arc<Notify> {
        Arc::clone(&self.changed)
    }

    /// Append targets to the eligible set and fire the change signal.
    pub fn seed(&self, targets: Vec<KudoTarget>) {
        {
            let mut state = self.state.lock().expect("feed lock poisoned");
            state.pending.extend(targets);
        }
        self.changed.notify_one();
    }

    /// Make `apply` fail for the given target id.
    pub fn fail_target(&self, id: impl Into<String>) {
        let mut state = self.state.lock().expect("feed lock poisoned");
        state.failing.insert(id.into());
    }

    /// Make `list_eligible` fail until re-enabled.
    pub fn set_discovery_down(&self, down: bool) {
        let mut state = self.state.lock().expect("feed lock poisoned");
        state.discovery_down = down;
    }

    /// Targets successfully acted upon, in application order.
    pub fn applied(&self) -> Vec<KudoTarget> {
        let state = self.state.lock().expect("feed lock poisoned");
        state.applied.clone()
    }
}

impl Default for MemoryFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedDiscovery for MemoryFeed {
    async fn list_eligible(&self) -> Result<Vec<KudoTarget>, FeedError> {
        let state = self.state.lock().expect("feed lock poisoned");
        if state.discovery_down {
            return Err(FeedError::Unavailable("feed not loaded".to_string()));
        }
        Ok(state.pending.clone())
    }

    async fn apply(&self, target: &KudoTarget) -> Result<(), FeedError> {
        let mut state = self.state.lock().expect("feed lock poisoned");
        if state.failing.contains(&target.id) {
            return Err(FeedError::Rejected(format!(
                "control unavailable for {}",
                target.id
            )));
        }
        let position = state
            .pending
            .iter()
            .position(|t| t == target)
            .ok_or_else(|| FeedError::Rejected(format!("already acted upon: {}", target.id)))?;
        let target = state.pending.remove(position);
        state.applied.push(target);
        drop(state);
        self.changed.notify_one();
        Ok(())
    }
}
