//! In-process change notifications.
//!
//! Mutating handlers publish a [`Topic`] once their change is persisted;
//! anything holding derived state subscribes and re-fetches on its own.
//! Topics carry no payload.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    DataUpdated,
    ProfileUpdated,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::DataUpdated, Topic::ProfileUpdated];

    pub fn as_str(self) -> &'static str {
        match self {
            Topic::DataUpdated => "data-updated",
            Topic::ProfileUpdated => "profile-updated",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Handler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<Topic, Vec<(u64, Handler)>>,
}

/// Publish/subscribe channel shared by cloning.
#[derive(Clone, Default)]
pub struct SyncBus {
    registry: Arc<Mutex<Registry>>,
}

impl SyncBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `topic` until the returned guard is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .handlers
            .entry(topic)
            .or_default()
            .push((id, Arc::new(handler)));
        debug!(%topic, id, "subscribed");

        Subscription {
            registry: Arc::downgrade(&self.registry),
            topic,
            id,
        }
    }

    /// Runs every handler currently subscribed to `topic`, in subscription
    /// order, and returns how many ran. A panicking handler is logged and
    /// skipped.
    pub fn publish(&self, topic: Topic) -> usize {
        // Handlers may subscribe or unsubscribe, so call them unlocked.
        let handlers: Vec<Handler> = self
            .registry
            .lock()
            .handlers
            .get(&topic)
            .map(|entries| entries.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        debug!(%topic, subscribers = handlers.len(), "publish");
        for handler in &handlers {
            if panic::catch_unwind(AssertUnwindSafe(|| handler())).is_err() {
                warn!(%topic, "subscriber panicked while handling publish");
            }
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.registry
            .lock()
            .handlers
            .get(&topic)
            .map_or(0, Vec::len)
    }
}

/// Registration guard returned by [`SyncBus::subscribe`].
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    topic: Topic,
    id: u64,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Releases the registration now instead of at scope end.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock();
        if let Some(entries) = registry.handlers.get_mut(&self.topic) {
            entries.retain(|(id, _)| *id != self.id);
        }
        debug!(topic = %self.topic, id = self.id, "unsubscribed");
    }
}
