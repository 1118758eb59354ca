//! State-change notification dispatch.
//!
//! Subscribers are invoked synchronously, in registration order, from
//! whichever task applies the transition. Dispatch happens while the
//! transition lock is held so that notification order always matches
//! transition order; subscribers may read the breaker's state (a lock-free
//! read) but must not call methods that mutate it.

use crate::types::StateChange;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Receives state-change notifications from a breaker
pub trait StateChangeSubscriber: Send + Sync {
    /// Handle a state transition
    fn on_state_change(&self, change: &StateChange);

    /// Subscriber name, used for unregistration and logging
    fn name(&self) -> &str {
        "anonymous"
    }
}

impl<F> StateChangeSubscriber for F
where
    F: Fn(&StateChange) + Send + Sync,
{
    fn on_state_change(&self, change: &StateChange) {
        self(change);
    }
}

/// Ordered subscriber registry for a single breaker
#[derive(Default)]
pub(crate) struct Subscribers {
    entries: Mutex<Vec<Arc<dyn StateChangeSubscriber>>>,
}

impl Subscribers {
    /// Register a subscriber at the end of the dispatch order
    pub(crate) fn register(&self, subscriber: Arc<dyn StateChangeSubscriber>) {
        let mut entries = self.entries.lock();
        entries.push(subscriber);
        debug!(
            subscriber = entries.last().map(|s| s.name()).unwrap_or("anonymous"),
            total_subscribers = entries.len(),
            "registered state-change subscriber"
        );
    }

    /// Remove every subscriber with the given name
    pub(crate) fn unregister(&self, name: &str) {
        let mut entries = self.entries.lock();
        let initial_len = entries.len();
        entries.retain(|subscriber| subscriber.name() != name);
        if entries.len() < initial_len {
            debug!(
                subscriber = name,
                total_subscribers = entries.len(),
                "unregistered state-change subscriber"
            );
        }
    }

    /// Deliver a notification to every subscriber, in registration order.
    /// The list is copied out so a subscriber may register or unregister
    /// re-entrantly without deadlocking the registry.
    pub(crate) fn notify(&self, change: &StateChange) {
        let entries: Vec<_> = self.entries.lock().clone();
        for subscriber in &entries {
            subscriber.on_state_change(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CircuitState;
    use std::sync::Mutex as StdMutex;

    struct Named {
        label: &'static str,
        seen: Arc<StdMutex<Vec<&'static str>>>,
    }

    impl StateChangeSubscriber for Named {
        fn on_state_change(&self, _change: &StateChange) {
            self.seen.lock().unwrap().push(self.label);
        }

        fn name(&self) -> &str {
            self.label
        }
    }

    #[test]
    fn dispatch_follows_registration_order() {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let registry = Subscribers::default();
        registry.register(Arc::new(Named {
            label: "first",
            seen: seen.clone(),
        }));
        registry.register(Arc::new(Named {
            label: "second",
            seen: seen.clone(),
        }));

        registry.notify(&StateChange {
            breaker: "test".to_string(),
            state: CircuitState::Open,
        });

        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn unregister_removes_by_name() {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let registry = Subscribers::default();
        registry.register(Arc::new(Named {
            label: "keep",
            seen: seen.clone(),
        }));
        registry.register(Arc::new(Named {
            label: "drop",
            seen: seen.clone(),
        }));
        registry.unregister("drop");

        registry.notify(&StateChange {
            breaker: "test".to_string(),
            state: CircuitState::Closed,
        });

        assert_eq!(*seen.lock().unwrap(), vec!["keep"]);
    }
}
