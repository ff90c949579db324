//! Typed publish/subscribe channel.

use dashmap::DashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::lifecycle::Subscription;

/// Key type for an event channel (`created`, `updated`, ...).
pub trait EventKind: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> EventKind for T where T: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

type Listener<P> = Arc<dyn Fn(&P) + Send + Sync>;
type ListenerMap<K, P> = DashMap<K, Vec<(u64, Listener<P>)>>;

/// Delivers payloads of type `P` to the listeners registered for an event kind.
pub struct EventChannel<K: EventKind, P> {
    listeners: Arc<ListenerMap<K, P>>,
    next_id: AtomicU64,
}

impl<K: EventKind, P: Send + Sync + 'static> EventChannel<K, P> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register `callback` for `kind`.
    pub fn subscribe<F>(&self, kind: K, callback: F) -> Subscription
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));

        let listeners = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                if let Some(mut entry) = listeners.get_mut(&kind) {
                    entry.retain(|(listener_id, _)| *listener_id != id);
                }
            }
        })
    }

    /// Deliver `payload` to every listener of `kind`.
    pub fn emit(&self, kind: K, payload: &P) {
        // Snapshot first: listeners may subscribe or emit re-entrantly.
        let snapshot: Vec<Listener<P>> = match self.listeners.get(&kind) {
            Some(entry) => entry.iter().map(|(_, listener)| listener.clone()).collect(),
            None => return,
        };

        for listener in snapshot {
            listener(payload);
        }
    }

    pub fn listener_count(&self, kind: K) -> usize {
        self.listeners.get(&kind).map(|entry| entry.len()).unwrap_or(0)
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.listeners.clear();
    }
}

impl<K: EventKind, P: Send + Sync + 'static> Default for EventChannel<K, P> {
    fn default() -> Self {
        Self::new()
    }
}
