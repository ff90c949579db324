//! SDK facade.
//!
//! # Data Flow
//! ```text
//! init_session(raw params)
//!     → params.rs (normalize, validate, amount → U256)
//!     → has_enough_balance? → Ready, no quotes
//!     → else quotes from every adapter (failing adapters contribute nothing)
//!     → best quote selected, balance watch re-quotes on every increase
//!
//! execute_session(id)
//!     → release balance watch → create + initiate teleport
//!     → teleport events mirrored onto the session (Processing / Completed / Failed)
//! ```
//!
//! # Design Decisions
//! - Each SDK instance owns its managers and registry; there is no global state
//! - Validation and session-state errors are returned; execution failures arrive as teleport events
//! - Collaborators (chain backend, executors, signer provider) are injected through the builder

pub mod error;
pub mod params;

pub use error::{SdkError, SdkResult};
pub use params::{prepare_params, RawTeleportParams};

use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::balance::{BalanceOracle, ChainBackend};
use crate::bridges::types::{BridgeProtocol, Quote, SignerProvider, TransferExecutor};
use crate::bridges::{BridgeAdapter, BridgeRegistry, XcmBridge};
use crate::chains;
use crate::config::{validate_config, SdkConfig};
use crate::lifecycle::{Shutdown, Subscription};
use crate::observability::{init_logging, metrics};
use crate::resilience::RetryPolicy;
use crate::session::{
    SessionCalculation, SessionEventKind, SessionFunds, SessionManager, SessionQuotes, SessionStatus,
    TeleportSession,
};
use crate::teleport::{
    select_best_quote, TeleportEventKind, TeleportEventPayload, TeleportManager, TeleportParams,
    TeleportStatus,
};

/// Entry point: sessions, quotes, teleports and their events.
pub struct ParaPortSdk {
    this: Weak<ParaPortSdk>,
    config: Arc<SdkConfig>,
    oracle: BalanceOracle,
    registry: Arc<BridgeRegistry>,
    executors: HashMap<BridgeProtocol, Arc<dyn TransferExecutor>>,
    extra_adapters: Vec<Arc<dyn BridgeAdapter>>,
    signers: Arc<dyn SignerProvider>,
    sessions: Arc<SessionManager>,
    teleports: Arc<TeleportManager>,
    shutdown: Shutdown,
    initialized: AtomicBool,
    destroyed: AtomicBool,
    listeners: Mutex<Vec<Subscription>>,
}

/// Assembles a [`ParaPortSdk`] from its collaborators.
pub struct ParaPortSdkBuilder {
    config: SdkConfig,
    backend: Option<Arc<dyn ChainBackend>>,
    signers: Option<Arc<dyn SignerProvider>>,
    executors: HashMap<BridgeProtocol, Arc<dyn TransferExecutor>>,
    adapters: Vec<Arc<dyn BridgeAdapter>>,
}

impl ParaPortSdkBuilder {
    pub fn backend(mut self, backend: Arc<dyn ChainBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn signer_provider(mut self, signers: Arc<dyn SignerProvider>) -> Self {
        self.signers = Some(signers);
        self
    }

    /// Transaction builder for a built-in protocol adapter.
    pub fn executor(mut self, protocol: BridgeProtocol, executor: Arc<dyn TransferExecutor>) -> Self {
        self.executors.insert(protocol, executor);
        self
    }

    /// An adapter registered alongside the built-in ones.
    pub fn adapter(mut self, adapter: Arc<dyn BridgeAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn build(self) -> SdkResult<Arc<ParaPortSdk>> {
        validate_config(&self.config).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            SdkError::ConfigValidation(messages.join(", "))
        })?;

        let backend = self
            .backend
            .ok_or_else(|| SdkError::ConfigValidation("a chain backend is required".to_string()))?;
        let signers = self
            .signers
            .ok_or_else(|| SdkError::ConfigValidation("a signer provider is required".to_string()))?;

        init_logging(&self.config.log_level);

        let config = Arc::new(self.config);
        let oracle = BalanceOracle::new(backend, RetryPolicy::from(&config.polling));
        let registry = Arc::new(BridgeRegistry::new());
        let shutdown = Shutdown::new();
        let teleports = TeleportManager::new(registry.clone(), oracle.clone(), shutdown.clone());

        Ok(Arc::new_cyclic(|this| ParaPortSdk {
            this: this.clone(),
            config,
            oracle,
            registry,
            executors: self.executors,
            extra_adapters: self.adapters,
            signers,
            sessions: Arc::new(SessionManager::new()),
            teleports,
            shutdown,
            initialized: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            listeners: Mutex::new(Vec::new()),
        }))
    }
}

impl ParaPortSdk {
    pub fn builder(config: SdkConfig) -> ParaPortSdkBuilder {
        ParaPortSdkBuilder {
            config,
            backend: None,
            signers: None,
            executors: HashMap::new(),
            adapters: Vec::new(),
        }
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Register and initialize an adapter for every configured protocol.
    pub async fn initialize(&self) -> SdkResult<()> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(SdkError::Initialization("SDK has been destroyed".to_string()));
        }
        if self.is_initialized() {
            return Err(SdkError::Initialization("SDK already initialized".to_string()));
        }

        for protocol in &self.config.bridge_protocols {
            let executor = self.executors.get(protocol).cloned().ok_or_else(|| {
                SdkError::Initialization(format!(
                    "Failed to initialize SDK: no transfer executor for {}",
                    protocol
                ))
            })?;

            let adapter: Arc<dyn BridgeAdapter> = match protocol {
                BridgeProtocol::Xcm => Arc::new(XcmBridge::new(
                    self.config.clone(),
                    self.oracle.clone(),
                    executor,
                    self.signers.clone(),
                )),
            };
            self.registry.register(adapter);
        }
        for adapter in &self.extra_adapters {
            self.registry.register(adapter.clone());
        }

        let results = join_all(self.registry.all().iter().map(|adapter| adapter.initialize())).await;
        if let Some(e) = results.into_iter().find_map(Result::err) {
            self.registry.clear();
            return Err(SdkError::Initialization(format!("Failed to initialize SDK: {}", e)));
        }

        if self
            .initialized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SdkError::Initialization("SDK already initialized".to_string()));
        }

        self.register_listeners();
        tracing::debug!(adapters = self.registry.len(), "SDK initialized successfully");
        Ok(())
    }

    fn ensure_initialized(&self) -> SdkResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(SdkError::Initialization("SDK is not initialized".to_string()))
        }
    }

    /// Validate params and price them. Sessions that need funds also watch
    /// every route chain and re-quote on each balance increase.
    pub async fn init_session(&self, raw: RawTeleportParams) -> SdkResult<TeleportSession> {
        self.ensure_initialized()?;
        let params = prepare_params(&raw, self.oracle.backend().as_ref())?;

        tracing::debug!(destination = %params.destination, asset = %params.asset, amount = %params.amount, "Calculating teleport");

        let id = uuid::Uuid::new_v4().to_string();
        let calculation = self.calculate(&params).await?;
        let subscription = self.watch_if_needed(&id, &params, &calculation).await;

        Ok(self
            .sessions
            .create_session(id, params, SessionStatus::Ready, calculation, subscription))
    }

    /// Start the teleport for a session's selected quote. Returns the teleport id.
    ///
    /// The session is claimed atomically, so concurrent calls for the same id
    /// start at most one teleport.
    pub async fn execute_session(&self, id: &str) -> SdkResult<String> {
        self.ensure_initialized()?;

        let teleport_id = uuid::Uuid::new_v4().to_string();
        let mut rejection = None;
        let mut released = None;

        let claimed = self.sessions.try_update_session(id, |s| {
            rejection = if !s.funds.needed {
                Some("Session has sufficient funds, no teleport needed")
            } else if s.quotes.selected.is_none() {
                Some("No quote selected for the session")
            } else if s.teleport_id.is_some() {
                Some("Session has already been executed")
            } else {
                None
            };
            if rejection.is_some() {
                return false;
            }
            s.teleport_id = Some(teleport_id.clone());
            released = s.balance_subscription.take();
            true
        });

        let session = match (claimed, rejection) {
            (Some(session), _) => session,
            (None, Some(message)) => return Err(SdkError::InvalidSession(message.to_string())),
            (None, None) => return Err(SdkError::InvalidSession("Session not found".to_string())),
        };
        if let Some(subscription) = released {
            subscription.unsubscribe();
        }

        let Some(quote) = session.quotes.selected.as_ref() else {
            return Err(SdkError::InvalidSession("No quote selected for the session".to_string()));
        };

        let teleport = self.teleports.create_teleport(teleport_id, &session.params, quote);
        self.teleports.initiate_teleport(&teleport, &session.params, quote);

        Ok(teleport.id)
    }

    /// Re-price a session that has not started a teleport.
    pub async fn update_session_params(&self, id: &str, raw: RawTeleportParams) -> SdkResult<TeleportSession> {
        self.ensure_initialized()?;
        let params = prepare_params(&raw, self.oracle.backend().as_ref())?;

        let mut rejection = None;
        let mut released = None;
        let started = self.sessions.try_update_session(id, |s| {
            rejection = if matches!(s.status, SessionStatus::Completed | SessionStatus::Processing) {
                Some("Session is completed or processing")
            } else if s.teleport_id.is_some() {
                Some("Cannot update params after teleport started")
            } else if s.status == SessionStatus::Failed {
                Some("Cannot update params for a failed session")
            } else {
                None
            };
            if rejection.is_some() {
                return false;
            }
            s.status = SessionStatus::Pending;
            released = s.balance_subscription.take();
            true
        });

        match (started, rejection) {
            (Some(_), _) => {}
            (None, Some(message)) => return Err(SdkError::InvalidSession(message.to_string())),
            (None, None) => return Err(SdkError::InvalidSession("Session not found".to_string())),
        }
        if let Some(subscription) = released {
            subscription.unsubscribe();
        }

        let calculation = match self.calculate(&params).await {
            Ok(calculation) => calculation,
            Err(e) => {
                self.sessions.try_update_session(id, |s| {
                    if s.teleport_id.is_some() || s.status != SessionStatus::Pending {
                        return false;
                    }
                    s.status = SessionStatus::Ready;
                    true
                });
                return Err(e);
            }
        };
        let subscription = self.watch_if_needed(id, &params, &calculation).await;

        let mut pending = subscription;
        let updated = self.sessions.try_update_session(id, |s| {
            if s.teleport_id.is_some() {
                return false;
            }
            s.status = SessionStatus::Ready;
            s.params = params;
            s.quotes = calculation.quotes;
            s.funds = calculation.funds;
            s.balance_subscription = pending.take();
            true
        });

        match updated {
            Some(session) => Ok(session),
            None => {
                if let Some(subscription) = pending {
                    subscription.unsubscribe();
                }
                Err(SdkError::InvalidSession(
                    "Cannot update params after teleport started".to_string(),
                ))
            }
        }
    }

    /// Retry the session's failed teleport.
    pub fn retry_session(&self, id: &str) -> SdkResult<()> {
        self.ensure_initialized()?;

        let teleport_id = self.sessions.get(id).and_then(|s| s.teleport_id).ok_or_else(|| {
            SdkError::InvalidSession(format!(
                "Session {} has no teleport ID. The session may not have been executed yet or the teleport creation failed.",
                id
            ))
        })?;

        self.teleports.retry_teleport(&teleport_id)?;
        Ok(())
    }

    pub fn on_session<F>(&self, kind: SessionEventKind, callback: F) -> Subscription
    where
        F: Fn(&TeleportSession) + Send + Sync + 'static,
    {
        self.sessions.subscribe(kind, callback)
    }

    pub fn on_teleport<F>(&self, kind: TeleportEventKind, callback: F) -> Subscription
    where
        F: Fn(&TeleportEventPayload) + Send + Sync + 'static,
    {
        self.teleports.subscribe(kind, callback)
    }

    pub fn get_session(&self, id: &str) -> Option<TeleportSession> {
        self.sessions.get(id)
    }

    pub fn get_teleport(&self, id: &str) -> Option<TeleportEventPayload> {
        self.teleports.get_teleport(id)
    }

    /// Release every subscription, stop background polling and drop all state.
    /// The instance cannot be initialized again.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);

        let listeners: Vec<Subscription> = self
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain(..)
            .collect();
        for listener in listeners {
            listener.unsubscribe();
        }

        self.shutdown.trigger();
        self.sessions.destroy();
        self.teleports.destroy();
        self.registry.clear();
        self.initialized.store(false, Ordering::SeqCst);

        tracing::debug!("SDK destroyed");
    }

    // --------------------------
    // Quoting
    // --------------------------

    async fn calculate(&self, params: &TeleportParams) -> SdkResult<SessionCalculation> {
        let has_enough = self
            .oracle
            .has_enough_balance(params.destination, &params.address, params.asset, params.amount)
            .await?;

        if has_enough {
            return Ok(SessionCalculation::default());
        }

        let quotes = self.get_quotes(params).await;
        let best = select_best_quote(&quotes).cloned();

        Ok(SessionCalculation {
            funds: SessionFunds {
                needed: true,
                available: !quotes.is_empty(),
                no_funds_at_all: quotes.is_empty(),
            },
            quotes: SessionQuotes {
                available: quotes,
                selected: best.clone(),
                best_quote: best,
            },
        })
    }

    /// Quotes from every adapter, concurrently. A failing adapter contributes nothing.
    async fn get_quotes(&self, params: &TeleportParams) -> Vec<Quote> {
        let adapters = self.registry.all();
        let results = join_all(adapters.iter().map(|adapter| async move {
            match adapter.get_quote(params).await {
                Ok(quote) => quote,
                Err(e) => {
                    metrics::record_quote_outcome("error");
                    tracing::warn!(protocol = %adapter.protocol(), error = %e, "Bridge quote failed");
                    None
                }
            }
        }))
        .await;

        results.into_iter().flatten().collect()
    }

    /// Balance watch for a session whose destination lacks funds.
    async fn watch_if_needed(
        &self,
        session_id: &str,
        params: &TeleportParams,
        calculation: &SessionCalculation,
    ) -> Option<Subscription> {
        if !calculation.funds.needed {
            return None;
        }
        Some(self.subscribe_balance_changes(session_id, params).await)
    }

    async fn subscribe_balance_changes(&self, session_id: &str, params: &TeleportParams) -> Subscription {
        let chains: Vec<_> = chains::route_chains(params.destination, params.asset)
            .into_iter()
            .filter(|chain| self.config.is_chain_allowed(*chain))
            .collect();

        let weak = self.this.clone();
        let session_id = session_id.to_string();
        let watched = params.clone();

        self.oracle
            .subscribe_balances(
                &params.address,
                params.asset,
                &chains,
                Arc::new(move |chain| {
                    let Some(sdk) = weak.upgrade() else {
                        return;
                    };
                    tracing::debug!(session_id = %session_id, chain = %chain, "Balance increased, re-quoting");
                    let session_id = session_id.clone();
                    let params = watched.clone();
                    tokio::spawn(async move {
                        sdk.requote(&session_id, &params).await;
                    });
                }),
            )
            .await
    }

    async fn requote(&self, session_id: &str, params: &TeleportParams) {
        let calculation = match self.calculate(params).await {
            Ok(calculation) => calculation,
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Re-quote failed");
                return;
            }
        };

        // Results for replaced params or an executed session are dropped.
        let applied = self.sessions.try_update_session(session_id, |s| {
            if s.teleport_id.is_some() || s.params != *params {
                return false;
            }
            s.quotes = calculation.quotes;
            s.funds = calculation.funds;
            true
        });

        if applied.is_none() {
            tracing::debug!(session_id = %session_id, "Discarded stale re-quote");
        }
    }

    // --------------------------
    // Teleport → session mirroring
    // --------------------------

    fn register_listeners(&self) {
        let mut subscriptions = Vec::new();

        let sessions = self.sessions.clone();
        subscriptions.push(self.teleports.subscribe(TeleportEventKind::Started, move |payload| {
            if let Some(session) = sessions.session_by_teleport_id(&payload.teleport.id) {
                sessions.set_status(&session.id, SessionStatus::Processing);
            }
        }));

        let sessions = self.sessions.clone();
        subscriptions.push(self.teleports.subscribe(TeleportEventKind::Completed, move |payload| {
            if let Some(session) = sessions.session_by_teleport_id(&payload.teleport.id) {
                sessions.set_status(&session.id, SessionStatus::Completed);
            }
        }));

        let sessions = self.sessions.clone();
        subscriptions.push(self.teleports.subscribe(TeleportEventKind::Updated, move |payload| {
            let Some(session) = sessions.session_by_teleport_id(&payload.teleport.id) else {
                return;
            };
            match (payload.teleport.status, session.status) {
                (TeleportStatus::Failed, status) if status != SessionStatus::Failed => {
                    sessions.set_status(&session.id, SessionStatus::Failed);
                }
                (TeleportStatus::Pending, SessionStatus::Failed) => {
                    sessions.set_status(&session.id, SessionStatus::Processing);
                }
                _ => {}
            }
        }));

        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend(subscriptions);
    }
}
