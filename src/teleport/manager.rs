//! Teleport state machine.

use dashmap::DashSet;
use std::sync::{Arc, Mutex, Weak};

use alloy::primitives::U256;

use crate::balance::{BalanceOracle, BalanceResult};
use crate::bridges::types::{Quote, TransactionCallback, TransactionStatus, TransferRequest};
use crate::bridges::BridgeRegistry;
use crate::lifecycle::{Shutdown, Subscription};
use crate::observability::metrics;
use crate::resilience::retry;
use crate::store::{now_ms, Repository};
use crate::teleport::transactions::TransactionSequencer;
use crate::teleport::types::{
    TeleportDetails, TeleportError, TeleportEventKind, TeleportEventPayload, TeleportParams,
    TeleportResult, TeleportStatus, TeleportSummary, TransactionDetails, TransactionEventKind,
    TransactionKind,
};

/// Drives teleports from creation to a confirmed destination balance.
pub struct TeleportManager {
    this: Weak<TeleportManager>,
    repo: Repository<TeleportDetails, TeleportEventKind, TeleportEventPayload>,
    transactions: Arc<TransactionSequencer>,
    registry: Arc<BridgeRegistry>,
    oracle: BalanceOracle,
    shutdown: Shutdown,
    /// Transactions submitted and not yet finalized or failed.
    in_flight: DashSet<String>,
    /// Teleports with a running destination balance check.
    confirming: DashSet<String>,
    /// Teleports whose completion has been announced.
    completed: DashSet<String>,
    listeners: Mutex<Vec<Subscription>>,
}

impl TeleportManager {
    pub fn new(registry: Arc<BridgeRegistry>, oracle: BalanceOracle, shutdown: Shutdown) -> Arc<Self> {
        let transactions = Arc::new(TransactionSequencer::new());

        let manager = Arc::new_cyclic(|this: &Weak<TeleportManager>| {
            let sequencer = transactions.clone();
            let repo = Repository::with_projection(TeleportEventKind::Updated, move |teleport: &TeleportDetails| {
                TeleportEventPayload {
                    teleport: teleport.clone(),
                    transactions: sequencer.transactions_for(&teleport.id),
                }
            });

            TeleportManager {
                this: this.clone(),
                repo,
                transactions: transactions.clone(),
                registry,
                oracle,
                shutdown,
                in_flight: DashSet::new(),
                confirming: DashSet::new(),
                completed: DashSet::new(),
                listeners: Mutex::new(Vec::new()),
            }
        });

        let weak = Arc::downgrade(&manager);
        let listener = transactions.subscribe(TransactionEventKind::Updated, move |tx: &TransactionDetails| {
            if let Some(manager) = weak.upgrade() {
                manager.handle_transaction_update(tx);
            }
        });
        manager.hold(listener);

        manager
    }

    fn hold(&self, subscription: Subscription) {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(subscription);
    }

    // --------------------------
    // Public API
    // --------------------------

    /// Store a new Pending teleport for `quote` under `id`. Nothing is
    /// submitted or emitted.
    pub fn create_teleport(&self, id: String, params: &TeleportParams, quote: &Quote) -> TeleportDetails {
        let teleport = TeleportDetails {
            id,
            status: TeleportStatus::Pending,
            details: TeleportSummary {
                address: params.address.clone(),
                gross_amount: quote.send_amount,
                expected_receive_amount: quote.receive_amount,
                asset: quote.asset,
                route: quote.route,
            },
            events: Vec::new(),
            timestamp_ms: now_ms(),
            checked: false,
            destination_baseline: None,
            error: None,
        };

        self.repo.set(teleport.clone(), false);
        teleport
    }

    /// Create the transfer transaction, announce the start and begin executing.
    pub fn initiate_teleport(&self, teleport: &TeleportDetails, params: &TeleportParams, quote: &Quote) {
        self.transactions.create(
            &teleport.id,
            quote.route.origin,
            TransactionKind::Teleport,
            TransferRequest {
                origin: quote.route.origin,
                destination: quote.route.destination,
                address: params.address.clone(),
                asset: quote.asset,
                amount: quote.send_amount,
            },
        );

        let Some(current) = self.repo.get(&teleport.id) else {
            tracing::warn!(teleport_id = %teleport.id, "Cannot initiate unknown teleport");
            return;
        };

        tracing::info!(
            teleport_id = %current.id,
            origin = %quote.route.origin,
            destination = %quote.route.destination,
            amount = %quote.send_amount,
            "Teleport started"
        );
        self.repo.emit(TeleportEventKind::Started, &current);
        self.process_next_step(&current.id);
    }

    /// Reset failed transactions and resume a Failed teleport.
    pub fn retry_teleport(&self, id: &str) -> TeleportResult<()> {
        let teleport = self
            .repo
            .get(id)
            .ok_or_else(|| TeleportError::NotFound(id.to_string()))?;

        if teleport.status != TeleportStatus::Failed {
            return Err(TeleportError::NotFailed(teleport.status));
        }

        tracing::debug!(teleport_id = %id, "Retrying failed teleport");

        for tx in self.transactions.transactions_for(id) {
            if self.transactions.is_failed(&tx) {
                self.in_flight.remove(&tx.id);
                self.transactions.reset(&tx.id);
            }
        }

        self.transition(id, TeleportStatus::Pending, |teleport| teleport.error = None);
        Ok(())
    }

    /// Lowest total fee wins; the first of equal quotes is kept.
    pub fn select_best_quote<'a>(&self, quotes: &'a [Quote]) -> Option<&'a Quote> {
        select_best_quote(quotes)
    }

    pub fn get_teleport(&self, id: &str) -> Option<TeleportEventPayload> {
        self.repo.get(id).map(|teleport| self.repo.project(&teleport))
    }

    pub fn subscribe<F>(&self, kind: TeleportEventKind, callback: F) -> Subscription
    where
        F: Fn(&TeleportEventPayload) + Send + Sync + 'static,
    {
        self.repo.subscribe(kind, callback)
    }

    /// Drop listeners, observers and state.
    pub fn destroy(&self) {
        let listeners: Vec<Subscription> = self
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain(..)
            .collect();
        for listener in listeners {
            listener.unsubscribe();
        }

        self.transactions.clear();
        self.repo.clear();
        self.in_flight.clear();
        self.confirming.clear();
        self.completed.clear();
    }

    // --------------------------
    // State machine
    // --------------------------

    fn process_next_step(&self, id: &str) {
        let Some(teleport) = self.repo.get(id) else {
            return;
        };

        tracing::debug!(teleport_id = %id, status = %teleport.status, "Processing next step");

        match teleport.status {
            TeleportStatus::Pending => match self.transactions.find_next_pending(id) {
                Some(tx) => self.execute_transaction(tx),
                None if self.transactions.all_succeeded(id) => {
                    self.transition(id, TeleportStatus::Waiting, |_| {});
                }
                None => {}
            },
            TeleportStatus::Waiting => self.confirm_arrival(teleport),
            TeleportStatus::Transferring | TeleportStatus::Completed | TeleportStatus::Failed => {}
        }
    }

    fn next_status(&self, teleport: &TeleportDetails, tx: &TransactionDetails) -> Option<TeleportStatus> {
        let failed = self.transactions.is_failed(tx);

        match teleport.status {
            TeleportStatus::Pending | TeleportStatus::Transferring if failed => Some(TeleportStatus::Failed),
            TeleportStatus::Pending if tx.status != TransactionStatus::Unknown => {
                Some(TeleportStatus::Transferring)
            }
            TeleportStatus::Transferring
                if tx.status == TransactionStatus::Finalized
                    && self.transactions.find_next_in_sequence(tx).is_none() =>
            {
                Some(TeleportStatus::Waiting)
            }
            _ => None,
        }
    }

    fn handle_transaction_update(&self, tx: &TransactionDetails) {
        let Some(mut teleport) = self.repo.get(&tx.teleport_id) else {
            tracing::warn!(transaction_id = %tx.id, "Transaction update for unknown teleport");
            return;
        };

        if tx.status == TransactionStatus::Block {
            tracing::debug!(transaction_id = %tx.id, tx_hash = ?tx.tx_hash, "Transaction in block");
        }

        let failed = self.transactions.is_failed(tx);
        if failed || tx.status == TransactionStatus::Finalized {
            self.in_flight.remove(&tx.id);
        }

        let mut moved = false;
        while let Some(next) = self.next_status(&teleport, tx) {
            let error = tx.error.clone();
            match self.transition(&teleport.id, next, |t| {
                if next == TeleportStatus::Failed {
                    t.error = error;
                }
            }) {
                Some(updated) => teleport = updated,
                None => return,
            }
            moved = true;
        }

        if !moved {
            self.repo.emit(TeleportEventKind::Updated, &teleport);
        }

        if tx.status == TransactionStatus::Finalized && !failed {
            if let Some(next) = self.transactions.find_next_in_sequence(tx) {
                self.execute_transaction(next);
            }
        }
    }

    /// Apply a status change, announce it, and run the new status's action.
    fn transition<F>(&self, id: &str, status: TeleportStatus, patch: F) -> Option<TeleportDetails>
    where
        F: FnOnce(&mut TeleportDetails),
    {
        let teleport = self.repo.update_status(id, status, patch)?;

        metrics::record_teleport_transition(status.as_str());
        tracing::debug!(teleport_id = %id, status = %status, "Teleport transition");

        match status {
            TeleportStatus::Completed => {
                if self.completed.insert(id.to_string()) {
                    tracing::info!(teleport_id = %id, "Teleport completed");
                    self.repo.emit(TeleportEventKind::Completed, &teleport);
                }
            }
            TeleportStatus::Failed => {
                tracing::warn!(teleport_id = %id, error = ?teleport.error, "Teleport failed");
            }
            _ => self.process_next_step(id),
        }

        self.repo.get(id)
    }

    // --------------------------
    // Actions
    // --------------------------

    fn execute_transaction(&self, tx: TransactionDetails) {
        if !self.in_flight.insert(tx.id.clone()) {
            tracing::debug!(transaction_id = %tx.id, "Transaction already in flight");
            return;
        }

        if tx.status != TransactionStatus::Unknown || tx.error.is_some() {
            self.transactions.reset(&tx.id);
        }

        let Some(manager) = self.this.upgrade() else {
            return;
        };

        tokio::spawn(async move {
            manager.submit(tx).await;
        });
    }

    async fn submit(&self, tx: TransactionDetails) {
        let Some(teleport) = self.repo.get(&tx.teleport_id) else {
            self.in_flight.remove(&tx.id);
            return;
        };

        let adapter = match self.registry.get(teleport.details.route.protocol) {
            Ok(adapter) => adapter,
            Err(e) => {
                self.in_flight.remove(&tx.id);
                self.transactions.record_submission_failure(&tx.id, e.to_string());
                return;
            }
        };

        if tx.order == 0 && teleport.destination_baseline.is_none() {
            let details = &teleport.details;
            match self
                .oracle
                .get_balance(details.route.destination, &details.address, details.asset)
                .await
            {
                Ok(balance) => {
                    self.store_baseline(&teleport.id, balance.transferable);
                }
                Err(e) => {
                    tracing::debug!(teleport_id = %teleport.id, error = %e, "Destination baseline deferred to confirmation");
                }
            }
        }

        let sequencer = self.transactions.clone();
        let tx_id = tx.id.clone();
        let callback: TransactionCallback = Arc::new(move |update| {
            sequencer.apply_update(&tx_id, update);
        });

        match adapter.transfer(&tx.details, callback).await {
            Ok(observer) => self.transactions.attach_observer(&tx.id, observer),
            Err(e) => {
                tracing::warn!(transaction_id = %tx.id, error = %e, "Transfer submission failed");
                self.in_flight.remove(&tx.id);
                self.transactions.record_submission_failure(&tx.id, e.to_string());
            }
        }
    }

    fn confirm_arrival(&self, teleport: TeleportDetails) {
        if !self.confirming.insert(teleport.id.clone()) {
            return;
        }

        let Some(manager) = self.this.upgrade() else {
            return;
        };
        let mut shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            let details = &teleport.details;
            let arrival = async {
                let baseline = manager.destination_baseline(&teleport).await?;
                manager
                    .oracle
                    .wait_for_threshold(
                        &details.address,
                        details.asset,
                        details.route.destination,
                        baseline.saturating_add(details.expected_receive_amount),
                    )
                    .await
            };

            tokio::select! {
                result = arrival => match result {
                    Ok(balance) => {
                        tracing::debug!(teleport_id = %teleport.id, transferable = %balance.transferable, "Destination funded");
                        manager.confirming.remove(&teleport.id);
                        manager.transition(&teleport.id, TeleportStatus::Completed, |t| t.checked = true);
                    }
                    Err(e) => {
                        manager.confirming.remove(&teleport.id);
                        manager.transition(&teleport.id, TeleportStatus::Failed, |t| t.error = Some(e.to_string()));
                    }
                },
                _ = shutdown.recv() => {
                    tracing::debug!(teleport_id = %teleport.id, "Confirmation cancelled by shutdown");
                    manager.confirming.remove(&teleport.id);
                }
            }
        });
    }

    fn stored_baseline(&self, id: &str) -> Option<U256> {
        self.repo.get(id).and_then(|t| t.destination_baseline)
    }

    /// Keep the first baseline recorded for a teleport.
    fn store_baseline(&self, id: &str, transferable: U256) -> U256 {
        self.repo
            .update(
                id,
                |t| {
                    t.destination_baseline.get_or_insert(transferable);
                },
                false,
            )
            .and_then(|t| t.destination_baseline)
            .unwrap_or(transferable)
    }

    /// Baseline for confirmation: the pre-transfer reading when one was
    /// taken, otherwise the first successful reading now.
    async fn destination_baseline(&self, teleport: &TeleportDetails) -> BalanceResult<U256> {
        if let Some(baseline) = self.stored_baseline(&teleport.id) {
            return Ok(baseline);
        }

        let details = &teleport.details;
        let balance = retry(self.oracle.policy(), |_| {
            self.oracle
                .get_balance(details.route.destination, &details.address, details.asset)
        })
        .await
        .map_err(|exhausted| exhausted.last_error)?;

        Ok(self.store_baseline(&teleport.id, balance.transferable))
    }
}

/// Lowest total fee wins; the first of equal quotes is kept.
pub fn select_best_quote(quotes: &[Quote]) -> Option<&Quote> {
    quotes.iter().fold(None, |best: Option<&Quote>, quote| match best {
        Some(best) if best.fees.total <= quote.fees.total => Some(best),
        _ => Some(quote),
    })
}
