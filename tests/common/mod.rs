//! Shared utilities for integration tests: in-memory chain backend,
//! scriptable transfer executor and signer.

#![allow(dead_code)]

use alloy::primitives::{Bytes, B256, U256};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use futures_util::StreamExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use paraport::balance::{BalanceError, BalanceResult, BalanceStream, ChainBackend};
use paraport::bridges::{
    BridgeError, BridgeProtocol, BridgeResult, BuiltTransaction, DryRunOutcome, FeeEstimate,
    SignerProvider, TransactionSigner, TransactionStatus, TransactionStream, TransactionUpdate,
    TransferExecutor, TransferRequest,
};
use paraport::chains::{Asset, Chain};
use paraport::config::{PollingConfig, SdkConfig};
use paraport::ParaPortSdk;

/// A well-formed SS58 account.
pub const ALICE: &str = "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5";

/// Fee charged by [`MockExecutor`]: 10 at the origin plus 5 at the destination.
pub const FEE: u64 = 15;

pub fn u(value: u64) -> U256 {
    U256::from(value)
}

/// In-memory balances with push-based watches. Existential deposits are zero.
#[derive(Default)]
pub struct MockBackend {
    balances: DashMap<(Chain, Asset), U256>,
    watchers: Mutex<Vec<(Chain, Asset, mpsc::UnboundedSender<U256>)>>,
    failing_reads: DashSet<Chain>,
    failing_watches: DashSet<Chain>,
    pub reads: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_balance(&self, chain: Chain, asset: Asset, amount: U256) {
        self.balances.insert((chain, asset), amount);

        let mut watchers = self.watchers.lock().unwrap();
        watchers.retain(|(c, a, tx)| {
            if *c == chain && *a == asset {
                tx.send(amount).is_ok()
            } else {
                !tx.is_closed()
            }
        });
    }

    pub fn credit(&self, chain: Chain, asset: Asset, amount: U256) {
        let current = self.balance(chain, asset);
        self.set_balance(chain, asset, current + amount);
    }

    pub fn balance(&self, chain: Chain, asset: Asset) -> U256 {
        self.balances.get(&(chain, asset)).map(|b| *b).unwrap_or(U256::ZERO)
    }

    pub fn fail_reads(&self, chain: Chain) {
        self.failing_reads.insert(chain);
    }

    pub fn fail_watches(&self, chain: Chain) {
        self.failing_watches.insert(chain);
    }

    pub fn open_watches(&self) -> usize {
        self.watchers
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, _, tx)| !tx.is_closed())
            .count()
    }
}

#[async_trait]
impl ChainBackend for MockBackend {
    async fn read(&self, chain: Chain, _address: &str, asset: Asset) -> BalanceResult<U256> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing_reads.contains(&chain) {
            return Err(BalanceError::Backend {
                chain,
                message: "connection refused".into(),
            });
        }
        Ok(self.balance(chain, asset))
    }

    async fn watch(&self, chain: Chain, _address: &str, asset: Asset) -> BalanceResult<BalanceStream> {
        if self.failing_watches.contains(&chain) {
            return Err(BalanceError::Watch {
                chain,
                message: "subscription rejected".into(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.watchers.lock().unwrap().push((chain, asset, tx));
        Ok(futures_util::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|v| (v, rx)) }).boxed())
    }

    fn existential_deposit(&self, _chain: Chain, _asset: Asset) -> Option<U256> {
        Some(U256::ZERO)
    }
}

/// How the next submitted transaction behaves.
#[derive(Debug, Clone)]
pub enum Submission {
    /// Broadcast, Block, Finalized; the destination is credited shortly after.
    Succeed,
    /// Finalized with a dispatch error; nothing arrives.
    FailFinalized(String),
    /// `submit_and_sign` itself errors.
    Reject(String),
}

pub struct MockExecutor {
    backend: Arc<MockBackend>,
    fee_failures: DashSet<Chain>,
    dry_run_failure: Mutex<Option<String>>,
    script: Mutex<VecDeque<Submission>>,
    credit_destination: AtomicBool,
    pub fee_calls: Mutex<Vec<(Chain, U256)>>,
    pub submissions: AtomicUsize,
}

impl MockExecutor {
    pub fn new(backend: Arc<MockBackend>) -> Arc<Self> {
        Arc::new(Self {
            backend,
            fee_failures: DashSet::new(),
            dry_run_failure: Mutex::new(None),
            script: Mutex::new(VecDeque::new()),
            credit_destination: AtomicBool::new(true),
            fee_calls: Mutex::new(Vec::new()),
            submissions: AtomicUsize::new(0),
        })
    }

    pub fn fail_fees_from(&self, origin: Chain) {
        self.fee_failures.insert(origin);
    }

    pub fn fail_dry_run(&self, reason: &str) {
        *self.dry_run_failure.lock().unwrap() = Some(reason.to_string());
    }

    pub fn script(&self, submission: Submission) {
        self.script.lock().unwrap().push_back(submission);
    }

    pub fn withhold_arrival(&self) {
        self.credit_destination.store(false, Ordering::SeqCst);
    }
}

fn update(status: TransactionStatus, error: Option<String>) -> TransactionUpdate {
    TransactionUpdate {
        status,
        tx_hash: Some(B256::repeat_byte(0xab)),
        error,
    }
}

#[async_trait]
impl TransferExecutor for MockExecutor {
    async fn estimate_fee(&self, request: &TransferRequest) -> BridgeResult<FeeEstimate> {
        self.fee_calls.lock().unwrap().push((request.origin, request.amount));
        if self.fee_failures.contains(&request.origin) {
            return Err(BridgeError::Fee {
                origin: request.origin,
                message: "no route".into(),
            });
        }
        Ok(FeeEstimate {
            origin_fee: u(10),
            destination_fee: u(5),
        })
    }

    async fn dry_run(&self, _request: &TransferRequest) -> BridgeResult<DryRunOutcome> {
        Ok(DryRunOutcome {
            failure_reason: self.dry_run_failure.lock().unwrap().clone(),
        })
    }

    async fn build(&self, request: &TransferRequest) -> BridgeResult<BuiltTransaction> {
        Ok(BuiltTransaction {
            request: request.clone(),
            call: Bytes::from(vec![0x01, 0x02]),
        })
    }

    async fn submit_and_sign(
        &self,
        transaction: BuiltTransaction,
        signer: Arc<dyn TransactionSigner>,
    ) -> BridgeResult<TransactionStream> {
        signer.sign(&transaction.call).await?;
        self.submissions.fetch_add(1, Ordering::SeqCst);

        let next = self.script.lock().unwrap().pop_front().unwrap_or(Submission::Succeed);
        let updates = match next {
            Submission::Reject(reason) => return Err(BridgeError::Submission(reason)),
            Submission::FailFinalized(reason) => vec![
                update(TransactionStatus::Broadcast, None),
                update(TransactionStatus::Block, None),
                update(TransactionStatus::Finalized, Some(reason)),
            ],
            Submission::Succeed => {
                if self.credit_destination.load(Ordering::SeqCst) {
                    let backend = self.backend.clone();
                    let request = transaction.request.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_millis(40)).await;
                        backend.credit(request.destination, request.asset, request.amount - u(FEE));
                    });
                }
                vec![
                    update(TransactionStatus::Broadcast, None),
                    update(TransactionStatus::Block, None),
                    update(TransactionStatus::Finalized, None),
                ]
            }
        };

        Ok(futures_util::stream::iter(updates).boxed())
    }
}

pub struct MockAccount(String);

#[async_trait]
impl TransactionSigner for MockAccount {
    fn account(&self) -> &str {
        &self.0
    }

    async fn sign(&self, payload: &[u8]) -> BridgeResult<Bytes> {
        Ok(Bytes::from(payload.to_vec()))
    }
}

#[derive(Default)]
pub struct MockSigners {
    pub unavailable: AtomicBool,
}

#[async_trait]
impl SignerProvider for MockSigners {
    async fn signer_for(&self, address: &str) -> BridgeResult<Arc<dyn TransactionSigner>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BridgeError::Signer(format!("no key for {}", address)));
        }
        Ok(Arc::new(MockAccount(address.to_string())))
    }
}

/// Polling fast enough for tests.
pub fn test_config() -> SdkConfig {
    SdkConfig {
        log_level: "debug".into(),
        polling: PollingConfig {
            max_attempts: 50,
            min_interval_ms: 5,
            max_interval_ms: 20,
        },
        ..SdkConfig::default()
    }
}

pub struct Harness {
    pub sdk: Arc<ParaPortSdk>,
    pub backend: Arc<MockBackend>,
    pub executor: Arc<MockExecutor>,
    pub signers: Arc<MockSigners>,
}

/// Initialized SDK over fresh mocks.
pub async fn harness(config: SdkConfig) -> Harness {
    let backend = MockBackend::new();
    let executor = MockExecutor::new(backend.clone());
    let signers = Arc::new(MockSigners::default());

    let sdk = ParaPortSdk::builder(config)
        .backend(backend.clone())
        .signer_provider(signers.clone())
        .executor(BridgeProtocol::Xcm, executor.clone())
        .build()
        .unwrap();
    sdk.initialize().await.unwrap();

    Harness {
        sdk,
        backend,
        executor,
        signers,
    }
}

/// Wait for the next value on `rx`, failing the test after two seconds.
pub async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Poll `check` until it holds, failing the test after two seconds.
pub async fn eventually<F: Fn() -> bool>(check: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
