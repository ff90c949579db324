//! Failure injection: unreachable chains, failing fee estimates, rejected
//! and failed transfers, missing arrivals.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{harness, next, test_config, u, MockBackend, Submission, ALICE};
use paraport::balance::{BalanceError, BalanceOracle};
use paraport::bridges::{BridgeAdapter, BridgeError, BridgeProtocol, BridgeResult, Quote, TransactionCallback, TransferRequest};
use paraport::chains::{Asset, Chain};
use paraport::config::PollingConfig;
use paraport::resilience::RetryPolicy;
use paraport::session::{SessionEventKind, SessionStatus};
use paraport::teleport::{TeleportError, TeleportEventKind, TeleportParams, TeleportStatus};
use paraport::{ParaPortSdk, RawTeleportParams, SdkError, Subscription};
use tokio::sync::mpsc;

fn dot_to_hub(amount: u64) -> RawTeleportParams {
    RawTeleportParams::new(ALICE, Chain::AssetHubPolkadot, amount, Asset::Dot)
}

#[tokio::test]
async fn test_failed_fee_probe_falls_back_to_next_origin() {
    let h = harness(test_config()).await;
    h.backend.set_balance(Chain::Polkadot, Asset::Dot, u(5_000_000));
    h.backend.set_balance(Chain::Hydration, Asset::Dot, u(2_000_000));
    h.executor.fail_fees_from(Chain::Polkadot);

    let session = h.sdk.init_session(dot_to_hub(1_000_000)).await.unwrap();

    let quote = session.quotes.selected.unwrap();
    assert_eq!(quote.route.origin, Chain::Hydration);
    assert_eq!(quote.send_amount, u(1_000_015));
}

#[tokio::test]
async fn test_all_fee_probes_failing_yields_no_quote() {
    let h = harness(test_config()).await;
    h.backend.set_balance(Chain::Polkadot, Asset::Dot, u(5_000_000));
    h.backend.set_balance(Chain::Hydration, Asset::Dot, u(2_000_000));
    h.executor.fail_fees_from(Chain::Polkadot);
    h.executor.fail_fees_from(Chain::Hydration);

    let session = h.sdk.init_session(dot_to_hub(1_000_000)).await.unwrap();

    assert!(session.funds.needed);
    assert!(session.funds.no_funds_at_all);
    assert!(session.quotes.selected.is_none());
}

#[tokio::test]
async fn test_dry_run_failure_yields_no_quote() {
    let h = harness(test_config()).await;
    h.backend.set_balance(Chain::Polkadot, Asset::Dot, u(5_000_000));
    h.executor.fail_dry_run("Barrier");

    let session = h.sdk.init_session(dot_to_hub(1_000_000)).await.unwrap();

    assert!(session.quotes.available.is_empty());
    assert!(session.funds.no_funds_at_all);
}

#[tokio::test]
async fn test_origin_short_of_send_amount_yields_no_quote() {
    let h = harness(test_config()).await;
    h.backend.set_balance(Chain::Polkadot, Asset::Dot, u(1_000_000));

    // Needs 1_000_015 at the origin.
    let session = h.sdk.init_session(dot_to_hub(1_000_000)).await.unwrap();
    assert!(session.funds.no_funds_at_all);
}

#[tokio::test]
async fn test_unreachable_origin_chain_is_swallowed() {
    let h = harness(test_config()).await;
    h.backend.set_balance(Chain::Polkadot, Asset::Dot, u(5_000_000));
    h.backend.fail_reads(Chain::Hydration);

    // The destination read succeeds; the adapter's all-chain read does not.
    let session = h.sdk.init_session(dot_to_hub(1_000_000)).await.unwrap();
    assert!(session.funds.needed);
    assert!(session.funds.no_funds_at_all);
}

#[tokio::test]
async fn test_unreachable_destination_fails_session_creation() {
    let h = harness(test_config()).await;
    h.backend.fail_reads(Chain::AssetHubPolkadot);

    let err = h.sdk.init_session(dot_to_hub(1_000_000)).await.unwrap_err();
    assert!(matches!(err, SdkError::Balance(BalanceError::Backend { .. })));
}

#[tokio::test]
async fn test_failed_watch_is_skipped() {
    let h = harness(test_config()).await;
    h.backend.fail_watches(Chain::Polkadot);

    h.sdk.init_session(dot_to_hub(1_000_000)).await.unwrap();
    assert_eq!(h.backend.open_watches(), 2);
}

#[tokio::test]
async fn test_failed_transaction_then_retry_completes() {
    let h = harness(test_config()).await;
    h.backend.set_balance(Chain::AssetHubPolkadot, Asset::Dot, u(100));
    h.backend.set_balance(Chain::Polkadot, Asset::Dot, u(5_000_000));
    h.executor.script(Submission::FailFinalized("Module(XcmPallet::Filtered)".into()));

    let (failed_tx, mut failed_rx) = mpsc::unbounded_channel();
    let _failed = h.sdk.on_teleport(TeleportEventKind::Updated, move |payload| {
        if payload.teleport.status == TeleportStatus::Failed {
            let _ = failed_tx.send(payload.clone());
        }
    });
    let (completed_tx, mut completed_rx) = mpsc::unbounded_channel();
    let _completed = h.sdk.on_teleport(TeleportEventKind::Completed, move |payload| {
        let _ = completed_tx.send(payload.teleport.id.clone());
    });

    let session = h.sdk.init_session(dot_to_hub(1_000_000)).await.unwrap();
    let teleport_id = h.sdk.execute_session(&session.id).await.unwrap();

    let failed = next(&mut failed_rx).await;
    assert_eq!(failed.teleport.id, teleport_id);
    assert_eq!(failed.teleport.error.as_deref(), Some("Module(XcmPallet::Filtered)"));
    assert_eq!(failed.transactions[0].succeeded, Some(false));
    assert_eq!(h.sdk.get_session(&session.id).unwrap().status, SessionStatus::Failed);

    let (session_tx, mut session_rx) = mpsc::unbounded_channel();
    let _sessions = h.sdk.on_session(SessionEventKind::Updated, move |s| {
        let _ = session_tx.send(s.status);
    });

    h.sdk.retry_session(&session.id).unwrap();
    assert_eq!(next(&mut session_rx).await, SessionStatus::Processing);

    assert_eq!(next(&mut completed_rx).await, teleport_id);
    assert_eq!(h.executor.submissions.load(Ordering::SeqCst), 2);

    let payload = h.sdk.get_teleport(&teleport_id).unwrap();
    assert_eq!(payload.teleport.status, TeleportStatus::Completed);
    assert!(payload.teleport.error.is_none());
    assert_eq!(payload.transactions.len(), 1);
    assert_eq!(payload.transactions[0].succeeded, Some(true));
    assert!(payload.transactions[0].error.is_none());
    assert_eq!(h.sdk.get_session(&session.id).unwrap().status, SessionStatus::Completed);
}

#[tokio::test]
async fn test_rejected_submission_fails_teleport() {
    let h = harness(test_config()).await;
    h.backend.set_balance(Chain::Polkadot, Asset::Dot, u(5_000_000));
    h.executor.script(Submission::Reject("pool full".into()));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = h.sdk.on_teleport(TeleportEventKind::Updated, move |payload| {
        if payload.teleport.status == TeleportStatus::Failed {
            let _ = tx.send(payload.clone());
        }
    });

    let session = h.sdk.init_session(dot_to_hub(1_000_000)).await.unwrap();
    h.sdk.execute_session(&session.id).await.unwrap();

    let failed = next(&mut rx).await;
    assert!(failed.teleport.error.unwrap().contains("pool full"));
    common::eventually(|| h.sdk.get_session(&session.id).map(|s| s.status) == Some(SessionStatus::Failed)).await;
}

#[tokio::test]
async fn test_missing_signer_fails_teleport() {
    let h = harness(test_config()).await;
    h.backend.set_balance(Chain::Polkadot, Asset::Dot, u(5_000_000));
    h.signers.unavailable.store(true, Ordering::SeqCst);

    let session = h.sdk.init_session(dot_to_hub(1_000_000)).await.unwrap();
    let teleport_id = h.sdk.execute_session(&session.id).await.unwrap();

    common::eventually(|| {
        h.sdk.get_teleport(&teleport_id).map(|p| p.teleport.status) == Some(TeleportStatus::Failed)
    })
    .await;
    assert_eq!(h.executor.submissions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_arrival_times_out() {
    let mut config = test_config();
    config.polling = PollingConfig {
        max_attempts: 4,
        min_interval_ms: 5,
        max_interval_ms: 10,
    };
    let h = harness(config).await;
    h.backend.set_balance(Chain::Polkadot, Asset::Dot, u(5_000_000));
    h.executor.withhold_arrival();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = h.sdk.on_teleport(TeleportEventKind::Updated, move |payload| {
        if payload.teleport.status == TeleportStatus::Failed {
            let _ = tx.send(payload.clone());
        }
    });

    let session = h.sdk.init_session(dot_to_hub(1_000_000)).await.unwrap();
    h.sdk.execute_session(&session.id).await.unwrap();

    let failed = next(&mut rx).await;
    assert!(!failed.teleport.checked);
    assert!(failed.teleport.error.unwrap().contains("threshold not met"));
    assert_eq!(failed.transactions[0].succeeded, Some(true));
}

#[tokio::test]
async fn test_retry_after_late_arrival_completes() {
    let mut config = test_config();
    config.polling = PollingConfig {
        max_attempts: 4,
        min_interval_ms: 5,
        max_interval_ms: 10,
    };
    let h = harness(config).await;
    h.backend.set_balance(Chain::AssetHubPolkadot, Asset::Dot, u(100));
    h.backend.set_balance(Chain::Polkadot, Asset::Dot, u(5_000_000));
    h.executor.withhold_arrival();

    let (failed_tx, mut failed_rx) = mpsc::unbounded_channel();
    let _failed = h.sdk.on_teleport(TeleportEventKind::Updated, move |payload| {
        if payload.teleport.status == TeleportStatus::Failed {
            let _ = failed_tx.send(payload.teleport.id.clone());
        }
    });
    let (completed_tx, mut completed_rx) = mpsc::unbounded_channel();
    let _completed = h.sdk.on_teleport(TeleportEventKind::Completed, move |payload| {
        let _ = completed_tx.send(payload.teleport.id.clone());
    });

    let session = h.sdk.init_session(dot_to_hub(1_000_000)).await.unwrap();
    let teleport_id = h.sdk.execute_session(&session.id).await.unwrap();
    assert_eq!(next(&mut failed_rx).await, teleport_id);

    // The funds land after confirmation gave up.
    h.backend.credit(Chain::AssetHubPolkadot, Asset::Dot, u(999_900));
    h.sdk.retry_session(&session.id).unwrap();

    assert_eq!(next(&mut completed_rx).await, teleport_id);
    let payload = h.sdk.get_teleport(&teleport_id).unwrap();
    assert!(payload.teleport.checked);
    assert_eq!(payload.teleport.destination_baseline, Some(u(100)));
    assert_eq!(h.executor.submissions.load(Ordering::SeqCst), 1);
    assert_eq!(h.sdk.get_session(&session.id).unwrap().status, SessionStatus::Completed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_execution_starts_one_teleport() {
    let h = harness(test_config()).await;
    h.backend.set_balance(Chain::Polkadot, Asset::Dot, u(50_000_000));
    h.executor.withhold_arrival();

    let rounds = 50;
    for _ in 0..rounds {
        let session = h.sdk.init_session(dot_to_hub(1_000)).await.unwrap();

        let calls: Vec<_> = (0..2)
            .map(|_| {
                let sdk = h.sdk.clone();
                let id = session.id.clone();
                tokio::spawn(async move { sdk.execute_session(&id).await })
            })
            .collect();

        let mut started = Vec::new();
        for call in calls {
            match call.await.unwrap() {
                Ok(teleport_id) => started.push(teleport_id),
                Err(e) => assert_eq!(e.to_string(), "Session has already been executed"),
            }
        }

        assert_eq!(started.len(), 1);
        assert_eq!(
            h.sdk.get_session(&session.id).unwrap().teleport_id.as_deref(),
            Some(started[0].as_str())
        );
    }

    common::eventually(|| h.executor.submissions.load(Ordering::SeqCst) == rounds).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_requote_racing_execution_keeps_teleport_link() {
    let h = harness(test_config()).await;
    h.backend.set_balance(Chain::Polkadot, Asset::Dot, u(50_000_000));
    h.executor.withhold_arrival();

    for round in 1..=30u64 {
        let session = h.sdk.init_session(dot_to_hub(1_000)).await.unwrap();

        let backend = h.backend.clone();
        let bump = tokio::spawn(async move {
            backend.set_balance(Chain::Hydration, Asset::Dot, u(round * 10_000));
        });
        let teleport_id = h.sdk.execute_session(&session.id).await.unwrap();
        bump.await.unwrap();

        // Let any re-quote triggered by the bump finish.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let stored = h.sdk.get_session(&session.id).unwrap();
        assert_eq!(stored.teleport_id.as_deref(), Some(teleport_id.as_str()));
        assert_eq!(stored.status, SessionStatus::Processing);
        assert!(stored.balance_subscription.is_none());
    }
}

#[tokio::test]
async fn test_retry_requires_failed_teleport() {
    let h = harness(test_config()).await;
    h.backend.set_balance(Chain::Polkadot, Asset::Dot, u(5_000_000));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = h.sdk.on_teleport(TeleportEventKind::Completed, move |payload| {
        let _ = tx.send(payload.teleport.id.clone());
    });

    let session = h.sdk.init_session(dot_to_hub(1_000_000)).await.unwrap();

    let err = h.sdk.retry_session(&session.id).unwrap_err();
    assert!(err.to_string().contains("has no teleport ID"));

    h.sdk.execute_session(&session.id).await.unwrap();
    next(&mut rx).await;

    let err = h.sdk.retry_session(&session.id).unwrap_err();
    assert!(matches!(
        err,
        SdkError::Teleport(TeleportError::NotFailed(TeleportStatus::Completed))
    ));
}

#[tokio::test]
async fn test_get_balances_fails_on_any_chain() {
    let backend = MockBackend::new();
    backend.set_balance(Chain::Polkadot, Asset::Dot, u(10));
    backend.fail_reads(Chain::Hydration);
    let oracle = BalanceOracle::new(backend.clone(), RetryPolicy::default());

    let result = oracle
        .get_balances(ALICE, Asset::Dot, &[Chain::Polkadot, Chain::Hydration])
        .await;
    assert!(matches!(result, Err(BalanceError::Backend { chain: Chain::Hydration, .. })));

    let ok = oracle.get_balances(ALICE, Asset::Dot, &[Chain::Polkadot]).await.unwrap();
    assert_eq!(ok[0].transferable, u(10));
}

#[tokio::test]
async fn test_wait_for_threshold_exhausts() {
    let backend = MockBackend::new();
    backend.set_balance(Chain::Polkadot, Asset::Dot, u(10));
    let policy = RetryPolicy {
        max_attempts: 3,
        min_interval_ms: 1,
        max_interval_ms: 2,
    };
    let oracle = BalanceOracle::new(backend.clone(), policy);

    let err = oracle
        .wait_for_threshold(ALICE, Asset::Dot, Chain::Polkadot, u(50))
        .await
        .unwrap_err();

    match err {
        BalanceError::ThresholdNotMet { target, last_seen, attempts, .. } => {
            assert_eq!(target, Some(u(50)));
            assert_eq!(last_seen, Some(u(10)));
            assert_eq!(attempts, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(backend.reads.load(Ordering::SeqCst), 3);
}

struct BrokenAdapter;

#[async_trait::async_trait]
impl BridgeAdapter for BrokenAdapter {
    fn protocol(&self) -> BridgeProtocol {
        BridgeProtocol::Xcm
    }

    async fn get_quote(&self, _params: &TeleportParams) -> BridgeResult<Option<Quote>> {
        Err(BridgeError::Submission("unreachable".into()))
    }

    async fn transfer(&self, _request: &TransferRequest, _callback: TransactionCallback) -> BridgeResult<Subscription> {
        Err(BridgeError::Submission("unreachable".into()))
    }

    async fn initialize(&self) -> BridgeResult<()> {
        Err(BridgeError::Submission("endpoint down".into()))
    }
}

#[tokio::test]
async fn test_duplicate_adapter_is_ignored() {
    let backend = MockBackend::new();
    backend.set_balance(Chain::Polkadot, Asset::Dot, u(5_000_000));
    let executor = common::MockExecutor::new(backend.clone());

    let sdk = ParaPortSdk::builder(test_config())
        .backend(backend)
        .signer_provider(Arc::new(common::MockSigners::default()))
        .executor(BridgeProtocol::Xcm, executor)
        .adapter(Arc::new(BrokenAdapter))
        .build()
        .unwrap();

    // The built-in XCM adapter is registered first, so the broken one is
    // never initialized or asked for quotes.
    sdk.initialize().await.unwrap();
    let session = sdk.init_session(dot_to_hub(1_000_000)).await.unwrap();
    assert_eq!(session.quotes.available.len(), 1);

    let err = sdk.initialize().await.unwrap_err();
    assert_eq!(err.to_string(), "SDK already initialized");
}

#[tokio::test]
async fn test_invalid_params_are_reported_together() {
    let h = harness(test_config()).await;

    let raw = RawTeleportParams::new("not-an-address", Chain::AssetHubPolkadot, "0", Asset::Ksm);
    let err = h.sdk.init_session(raw).await.unwrap_err();

    assert!(matches!(err, SdkError::InvalidParams(_)));
    assert_eq!(
        err.to_string(),
        "Invalid teleport parameters: Invalid address format, Amount must be greater than 0, \
         Asset not supported on the specified chain"
    );
}
