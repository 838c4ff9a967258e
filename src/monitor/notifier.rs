//! Change notification ("the environment may have changed").

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Callback invoked on every change notification.
pub type ChangeCallback = dyn Fn() + Send + Sync;

/// Identifies one notifier registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotifierSubscription(Uuid);

impl NotifierSubscription {
    /// Create a new random subscription id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NotifierSubscription {
    fn default() -> Self {
        Self::new()
    }
}

/// Source of change notifications, fired at arbitrary frequency.
pub trait ChangeNotifier: Send + Sync {
    /// Registers `callback`.
    fn subscribe(&self, callback: Arc<ChangeCallback>) -> NotifierSubscription;

    /// Removes a registration. Returns false if it was unknown.
    fn unsubscribe(&self, subscription: NotifierSubscription) -> bool;
}

/// Default [`ChangeNotifier`]: a resize signal fanned out to subscribers.
#[derive(Default)]
pub struct ResizeNotifier {
    subscribers: Mutex<Vec<(NotifierSubscription, Arc<ChangeCallback>)>>,
}

static GLOBAL_RESIZE: OnceLock<Arc<ResizeNotifier>> = OnceLock::new();

impl ResizeNotifier {
    /// Creates a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide notifier trackers attach to by default.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL_RESIZE.get_or_init(|| Arc::new(Self::new())))
    }

    /// Signals a change to every subscriber. Returns how many were called.
    pub fn notify(&self) -> usize {
        let snapshot: Vec<Arc<ChangeCallback>> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for cb in &snapshot {
            cb();
        }
        snapshot.len()
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl ChangeNotifier for ResizeNotifier {
    fn subscribe(&self, callback: Arc<ChangeCallback>) -> NotifierSubscription {
        let id = NotifierSubscription::new();
        self.subscribers.lock().push((id, callback));
        id
    }

    fn unsubscribe(&self, subscription: NotifierSubscription) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(id, _)| *id != subscription);
        subscribers.len() != before
    }
}

impl fmt::Debug for ResizeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
