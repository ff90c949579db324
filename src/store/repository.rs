//! Keyed record storage backed by an event channel.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::lifecycle::Subscription;
use crate::store::channel::{EventChannel, EventKind};

/// Event kind appended to a record's log on every status change.
pub const STATUS_UPDATE_EVENT: &str = "status-update";

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Timestamped entry in a record's append-only event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEvent {
    /// Event kind, e.g. `status-update`.
    pub kind: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// Free-form event data.
    pub data: serde_json::Value,
}

/// A domain record that can live in a [`Repository`].
pub trait Record: Clone + Send + Sync + 'static {
    /// Lifecycle status of the record.
    type Status: Copy + PartialEq + Debug + Serialize + Send + Sync;

    fn id(&self) -> &str;
    fn status(&self) -> Self::Status;
    fn set_status(&mut self, status: Self::Status);
    fn events_mut(&mut self) -> &mut Vec<RecordEvent>;

    /// Error message carried by the record, if any.
    fn error(&self) -> Option<&str> {
        None
    }
}

type Projection<T, P> = Box<dyn Fn(&T) -> P + Send + Sync>;

/// Keyed collection of records of type `T` emitting payloads of type `P`
/// on an [`EventChannel`] keyed by `K`.
pub struct Repository<T: Record, K: EventKind, P = T> {
    items: DashMap<String, T>,
    channel: EventChannel<K, P>,
    update_kind: K,
    project: Projection<T, P>,
}

impl<T: Record, K: EventKind> Repository<T, K, T> {
    /// Repository whose listeners receive the record itself.
    pub fn new(update_kind: K) -> Self {
        Self::with_projection(update_kind, |item: &T| item.clone())
    }
}

impl<T: Record, K: EventKind, P: Send + Sync + 'static> Repository<T, K, P> {
    /// Repository whose listeners receive `project(record)`.
    pub fn with_projection<F>(update_kind: K, project: F) -> Self
    where
        F: Fn(&T) -> P + Send + Sync + 'static,
    {
        Self {
            items: DashMap::new(),
            channel: EventChannel::new(),
            update_kind,
            project: Box::new(project),
        }
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.items.get(id).map(|entry| entry.value().clone())
    }

    /// Records matching `predicate`, in no particular order.
    pub fn filter<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.items
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn all(&self) -> Vec<T> {
        self.filter(|_| true)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn remove_by_id(&self, id: &str) -> Option<T> {
        self.items.remove(id).map(|(_, item)| item)
    }

    /// The single mutation point: replace the record and, when `notify`
    /// is set, emit the update event.
    pub fn set(&self, item: T, notify: bool) {
        self.items.insert(item.id().to_string(), item.clone());

        if notify {
            self.emit(self.update_kind, &item);
        }
    }

    /// Patch a record in place. Returns the updated record.
    pub fn update<F>(&self, id: &str, patch: F, notify: bool) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        self.try_update(
            id,
            |item| {
                patch(item);
                true
            },
            notify,
        )
    }

    /// Patch a record in place if `patch` accepts it.
    ///
    /// `patch` runs under the entry lock, so its check and its writes are
    /// atomic with respect to every other mutation of the same id. It must
    /// leave the record untouched when returning `false`, and must not call
    /// back into this repository. Listeners run after the lock is released.
    pub fn try_update<F>(&self, id: &str, patch: F, notify: bool) -> Option<T>
    where
        F: FnOnce(&mut T) -> bool,
    {
        let updated = {
            let mut entry = self.items.get_mut(id)?;
            if !patch(entry.value_mut()) {
                return None;
            }
            entry.value().clone()
        };

        if notify {
            self.emit(self.update_kind, &updated);
        }
        Some(updated)
    }

    /// Append an event to a record's log.
    pub fn add_event(&self, id: &str, kind: &str, data: serde_json::Value) -> Option<T> {
        self.update(
            id,
            |item| {
                item.events_mut().push(RecordEvent {
                    kind: kind.to_string(),
                    timestamp_ms: now_ms(),
                    data,
                })
            },
            true,
        )
    }

    /// Change status, apply `extra`, append a status-update event and emit.
    pub fn update_status<F>(&self, id: &str, status: T::Status, extra: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        self.update(
            id,
            |item| {
                item.set_status(status);
                extra(item);
                let data = serde_json::json!({
                    "status": status,
                    "error": item.error(),
                });
                item.events_mut().push(RecordEvent {
                    kind: STATUS_UPDATE_EVENT.to_string(),
                    timestamp_ms: now_ms(),
                    data,
                });
            },
            true,
        )
    }

    /// Project a record into its event payload.
    pub fn project(&self, item: &T) -> P {
        (self.project)(item)
    }

    /// Emit `kind` with the projected payload of `item`.
    pub fn emit(&self, kind: K, item: &T) {
        let payload = self.project(item);
        self.channel.emit(kind, &payload);
    }

    pub fn subscribe<F>(&self, kind: K, callback: F) -> Subscription
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.channel.subscribe(kind, callback)
    }

    /// Drop all records and listeners.
    pub fn clear(&self) {
        self.items.clear();
        self.channel.clear();
    }
}
