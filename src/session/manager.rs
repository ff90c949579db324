//! Session store.

use crate::lifecycle::Subscription;
use crate::observability::metrics;
use crate::session::types::{SessionCalculation, SessionEventKind, SessionStatus, TeleportSession};
use crate::store::{now_ms, Repository};
use crate::teleport::types::TeleportParams;

/// Owns session records. All mutation goes through these methods.
pub struct SessionManager {
    repo: Repository<TeleportSession, SessionEventKind>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            repo: Repository::new(SessionEventKind::Updated),
        }
    }

    pub fn create_session(
        &self,
        id: String,
        params: TeleportParams,
        status: SessionStatus,
        calculation: SessionCalculation,
        balance_subscription: Option<Subscription>,
    ) -> TeleportSession {
        let session = TeleportSession {
            id,
            status,
            params,
            quotes: calculation.quotes,
            funds: calculation.funds,
            teleport_id: None,
            events: Vec::new(),
            timestamp_ms: now_ms(),
            balance_subscription,
        };

        self.repo.set(session.clone(), false);
        self.repo.emit(SessionEventKind::Created, &session);
        metrics::record_session_event("created");
        tracing::info!(session_id = %session.id, status = %session.status, "Session created");

        session
    }

    pub fn get(&self, id: &str) -> Option<TeleportSession> {
        self.repo.get(id)
    }

    pub fn session_by_teleport_id(&self, teleport_id: &str) -> Option<TeleportSession> {
        self.repo
            .filter(|session| session.teleport_id.as_deref() == Some(teleport_id))
            .into_iter()
            .next()
    }

    /// Patch a session and notify listeners.
    pub fn update_session<F>(&self, id: &str, patch: F) -> Option<TeleportSession>
    where
        F: FnOnce(&mut TeleportSession),
    {
        let updated = self.repo.update(id, patch, true);
        if updated.is_some() {
            metrics::record_session_event("updated");
        }
        updated
    }

    /// Patch a session only if `patch` accepts its current state. The check
    /// and the write happen under the session's entry lock.
    pub fn try_update_session<F>(&self, id: &str, patch: F) -> Option<TeleportSession>
    where
        F: FnOnce(&mut TeleportSession) -> bool,
    {
        let updated = self.repo.try_update(id, patch, true);
        if updated.is_some() {
            metrics::record_session_event("updated");
        }
        updated
    }

    pub fn set_status(&self, id: &str, status: SessionStatus) -> Option<TeleportSession> {
        let updated = self.repo.update_status(id, status, |_| {});
        if updated.is_some() {
            metrics::record_session_event("updated");
            tracing::debug!(session_id = %id, status = %status, "Session status changed");
        }
        updated
    }

    /// Remove a session, releasing its balance watch.
    pub fn remove_session(&self, id: &str) -> Option<TeleportSession> {
        let session = self.repo.remove_by_id(id)?;
        session.unsubscribe();
        self.repo.emit(SessionEventKind::Deleted, &session);
        metrics::record_session_event("deleted");
        Some(session)
    }

    pub fn subscribe<F>(&self, kind: SessionEventKind, callback: F) -> Subscription
    where
        F: Fn(&TeleportSession) + Send + Sync + 'static,
    {
        self.repo.subscribe(kind, callback)
    }

    /// Release every balance watch and drop all sessions and listeners.
    pub fn destroy(&self) {
        for session in self.repo.all() {
            session.unsubscribe();
        }
        self.repo.clear();
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
