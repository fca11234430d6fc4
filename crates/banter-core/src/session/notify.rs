//! Observer registration and synchronous change dispatch.
//!
//! The session manager is renderer-agnostic: anything that wants to follow
//! the session (a terminal loop, a test) subscribes a callback and receives
//! every `SessionChange` in mutation order.

use banter_types::session::SessionChange;

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Handle returned by `subscribe`; pass it back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

type Callback = std::sync::Arc<dyn Fn(&SessionChange) + Send + Sync>;

/// Dispatches session changes to registered observers.
///
/// Callbacks run synchronously on the mutating task, in subscription
/// order, after the session state lock has been released. The subscriber
/// list is snapshotted before dispatch, so a callback may subscribe or
/// unsubscribe; it sees the effect from the next change onward.
pub struct ChangeNotifier {
    next_token: AtomicU64,
    subscribers: Mutex<Vec<(u64, Callback)>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            next_token: AtomicU64::new(0),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a callback for all future changes.
    pub fn subscribe(
        &self,
        callback: impl Fn(&SessionChange) + Send + Sync + 'static,
    ) -> SubscriptionToken {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let mut subscribers = self
            .subscribers
            .lock()
            .expect("notifier subscriber lock poisoned");
        subscribers.push((token, std::sync::Arc::new(callback)));
        SubscriptionToken(token)
    }

    /// Remove a subscription. Unknown tokens are a no-op.
    pub fn unsubscribe(&self, token: SubscriptionToken) {
        let mut subscribers = self
            .subscribers
            .lock()
            .expect("notifier subscriber lock poisoned");
        subscribers.retain(|(id, _)| *id != token.0);
    }

    /// Deliver one change to every current subscriber, in subscription
    /// order.
    pub fn notify(&self, change: &SessionChange) {
        let snapshot: Vec<Callback> = {
            let subscribers = self
                .subscribers
                .lock()
                .expect("notifier subscriber lock poisoned");
            subscribers.iter().map(|(_, cb)| cb.clone()).collect()
        };
        for callback in snapshot {
            callback(change);
        }
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .expect("notifier subscriber lock poisoned")
            .len()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
