//! Cancellable subscription handles.

use std::sync::{Arc, Mutex};

type CancelFn = Box<dyn FnOnce() + Send>;

/// Handle to a live subscription: an event listener, a per-chain balance
/// watch or a transaction observer.
///
/// Dropping the handle does not cancel anything. Clones share one
/// cancellation, which runs at most once.
#[derive(Clone)]
pub struct Subscription {
    cancel: Arc<Mutex<Option<CancelFn>>>,
}

impl Subscription {
    /// Wrap a teardown closure.
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Arc::new(Mutex::new(Some(Box::new(cancel)))),
        }
    }

    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self {
            cancel: Arc::new(Mutex::new(None)),
        }
    }

    /// Combine several handles into one that releases all of them.
    pub fn merge(subscriptions: Vec<Subscription>) -> Self {
        Self::new(move || {
            for subscription in subscriptions {
                subscription.unsubscribe();
            }
        })
    }

    /// Release the underlying subscription. Later calls are no-ops.
    pub fn unsubscribe(&self) {
        let cancel = self
            .cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        if let Some(cancel) = cancel {
            cancel();
        }
    }

    /// Whether `unsubscribe` has not run yet.
    pub fn is_active(&self) -> bool {
        self.cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
