//! Ordered transactions belonging to a teleport.

use dashmap::DashMap;

use crate::bridges::types::{TransactionStatus, TransactionUpdate, TransferRequest};
use crate::chains::Chain;
use crate::lifecycle::Subscription;
use crate::store::{now_ms, Repository};
use crate::teleport::types::{TransactionDetails, TransactionEventKind, TransactionKind};

/// Tracks each teleport's transactions and their failure state.
pub struct TransactionSequencer {
    repo: Repository<TransactionDetails, TransactionEventKind>,
    next_order: DashMap<String, u32>,
}

impl TransactionSequencer {
    pub fn new() -> Self {
        Self {
            repo: Repository::new(TransactionEventKind::Updated),
            next_order: DashMap::new(),
        }
    }

    /// Append a transaction to `teleport_id`'s sequence. Does not notify.
    pub fn create(
        &self,
        teleport_id: &str,
        chain: Chain,
        kind: TransactionKind,
        details: TransferRequest,
    ) -> TransactionDetails {
        let order = {
            let mut next = self.next_order.entry(teleport_id.to_string()).or_insert(0);
            let order = *next;
            *next += 1;
            order
        };

        let transaction = TransactionDetails {
            id: format!("{}-transaction-{}", teleport_id, order),
            teleport_id: teleport_id.to_string(),
            order,
            chain,
            kind,
            details,
            status: TransactionStatus::Unknown,
            tx_hash: None,
            error: None,
            succeeded: None,
            events: Vec::new(),
            timestamp_ms: now_ms(),
            unsubscribe: None,
        };

        self.repo.set(transaction.clone(), false);
        transaction
    }

    pub fn get(&self, id: &str) -> Option<TransactionDetails> {
        self.repo.get(id)
    }

    /// The teleport's transactions, by order.
    pub fn transactions_for(&self, teleport_id: &str) -> Vec<TransactionDetails> {
        let mut transactions = self.repo.filter(|tx| tx.teleport_id == teleport_id);
        transactions.sort_by_key(|tx| tx.order);
        transactions
    }

    /// Lowest-order transaction that never started or has failed.
    pub fn find_next_pending(&self, teleport_id: &str) -> Option<TransactionDetails> {
        self.transactions_for(teleport_id)
            .into_iter()
            .find(|tx| tx.status == TransactionStatus::Unknown || self.is_failed(tx))
    }

    /// Lowest-order transaction after `after` that never started.
    pub fn find_next_in_sequence(&self, after: &TransactionDetails) -> Option<TransactionDetails> {
        self.transactions_for(&after.teleport_id)
            .into_iter()
            .find(|tx| tx.order > after.order && tx.status == TransactionStatus::Unknown)
    }

    /// Failed once it carries an error and is either finalized or marked unsuccessful.
    pub fn is_failed(&self, tx: &TransactionDetails) -> bool {
        tx.error.is_some() && (tx.status == TransactionStatus::Finalized || tx.succeeded == Some(false))
    }

    /// Whether every transaction of the teleport finalized successfully.
    pub fn all_succeeded(&self, teleport_id: &str) -> bool {
        let transactions = self.transactions_for(teleport_id);
        !transactions.is_empty() && transactions.iter().all(|tx| tx.succeeded == Some(true))
    }

    /// Back to Unknown with no error or hash, releasing the old observer. Does not notify.
    pub fn reset(&self, id: &str) -> Option<TransactionDetails> {
        let observer = self.repo.get(id)?.unsubscribe;
        if let Some(observer) = observer {
            observer.unsubscribe();
        }

        self.repo.update(
            id,
            |tx| {
                tx.status = TransactionStatus::Unknown;
                tx.error = None;
                tx.tx_hash = None;
                tx.succeeded = None;
                tx.unsubscribe = None;
            },
            false,
        )
    }

    /// Record a lifecycle update from the chain and notify listeners.
    ///
    /// An error, once seen, sticks until the transaction is reset.
    pub fn apply_update(&self, id: &str, update: TransactionUpdate) -> Option<TransactionDetails> {
        self.repo.update_status(id, update.status, |tx| {
            if update.tx_hash.is_some() {
                tx.tx_hash = update.tx_hash;
            }
            if update.error.is_some() {
                tx.error = update.error;
            }
            if update.status == TransactionStatus::Finalized {
                tx.succeeded = Some(tx.error.is_none());
            }
        })
    }

    /// The transfer never reached the chain.
    pub fn record_submission_failure(&self, id: &str, message: String) -> Option<TransactionDetails> {
        let status = self.repo.get(id)?.status;
        self.repo.update_status(id, status, |tx| {
            tx.error = Some(message);
            tx.succeeded = Some(false);
        })
    }

    pub fn attach_observer(&self, id: &str, observer: Subscription) {
        if self
            .repo
            .update(id, |tx| tx.unsubscribe = Some(observer.clone()), false)
            .is_none()
        {
            observer.unsubscribe();
        }
    }

    pub fn subscribe<F>(&self, kind: TransactionEventKind, callback: F) -> Subscription
    where
        F: Fn(&TransactionDetails) + Send + Sync + 'static,
    {
        self.repo.subscribe(kind, callback)
    }

    /// Release every observer and drop all transactions.
    pub fn clear(&self) {
        for tx in self.repo.all() {
            if let Some(observer) = tx.unsubscribe {
                observer.unsubscribe();
            }
        }
        self.repo.clear();
        self.next_order.clear();
    }
}

impl Default for TransactionSequencer {
    fn default() -> Self {
        Self::new()
    }
}
