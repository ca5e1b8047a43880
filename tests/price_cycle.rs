mod common;

use common::*;
use indexboard::broadcast::BroadcastEvent;
use indexboard::errors::{CycleError, OracleError, StoreError};
use indexboard::pipeline::{CycleOutcome, CycleState, PriceUpdater, UpdaterSettings};
use indexboard::storage::{BundleStore, StoreResult, TokenStore};
use indexboard::tokens::{Token, TokenAddress};
use indexboard::bundles::{Bundle, CreatorKey};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

fn settings(batch_size: usize) -> UpdaterSettings {
    UpdaterSettings {
        batch_size,
        batch_delay: Duration::ZERO,
    }
}

fn updater(
    db: Arc<indexboard::storage::Database>,
    oracle: Arc<dyn indexboard::apis::PriceOracle>,
    broadcaster: Arc<RecordingBroadcaster>,
    batch_size: usize,
) -> PriceUpdater {
    PriceUpdater::new(db.clone(), db, oracle, broadcaster, settings(batch_size))
}

fn completed(outcome: CycleOutcome) -> indexboard::pipeline::CycleSummary {
    match outcome {
        CycleOutcome::Completed(summary) => summary,
        other => panic!("expected a completed cycle, got {:?}", other),
    }
}

#[tokio::test]
async fn end_to_end_prices_and_bundle_metrics() {
    let db = seeded_database(
        &[token("A", 10.0), token("B", 5.0)],
        &[bundle("X", &["A", "B"], 12.0)],
    )
    .await;
    let oracle = Arc::new(ScriptedOracle::with_prices(&[("A", 12.0), ("B", 6.0)]));
    let broadcaster = Arc::new(RecordingBroadcaster::default());
    let updater = updater(db.clone(), oracle.clone(), broadcaster.clone(), 100);

    let summary = completed(updater.run_cycle().await.unwrap());

    assert!(summary.success);
    assert_eq!(summary.updated, 2);
    assert_eq!(summary.errors, 0);
    assert_eq!(token_price(&db, "A").await, 12.0);
    assert_eq!(token_price(&db, "B").await, 6.0);

    let x = stored_bundle(&db, "X").await;
    assert_eq!(x.current_price, 18.0);
    assert_eq!(x.price_change_percent, 50.0);
    assert_eq!(x.initial_price, 12.0);

    let events = broadcaster.events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        BroadcastEvent::PricesUpdated {
            updated_tokens,
            updated_bundles,
        } => {
            assert_eq!(updated_tokens.len(), 2);
            assert_eq!(updated_bundles.len(), 1);
            assert_eq!(updated_bundles[0].current_price, 18.0);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(updater.state(), CycleState::Idle);
}

#[tokio::test]
async fn bundle_with_unknown_member_uses_known_prices_only() {
    let db = seeded_database(
        &[token("A", 10.0)],
        &[bundle("Y", &["A", "C"], 10.0)],
    )
    .await;
    let oracle = Arc::new(ScriptedOracle::with_prices(&[("A", 12.0)]));
    let broadcaster = Arc::new(RecordingBroadcaster::default());

    let summary = completed(
        updater(db.clone(), oracle, broadcaster, 100)
            .run_cycle()
            .await
            .unwrap(),
    );

    assert_eq!(summary.errors, 0);
    let y = stored_bundle(&db, "Y").await;
    assert_eq!(y.current_price, 12.0);
    assert!((y.price_change_percent - 20.0).abs() < 1e-9);
}

#[tokio::test]
async fn failed_batch_is_isolated() {
    // 7 tokens in batches of 3: [T0..T2], [T3..T5], [T6]
    let tokens: Vec<Token> = (0..7).map(|i| token(&format!("T{}", i), 1.0)).collect();
    let prices: Vec<(String, f64)> = (0..7).map(|i| (format!("T{}", i), 2.0)).collect();
    let prices: Vec<(&str, f64)> = prices.iter().map(|(a, p)| (a.as_str(), *p)).collect();

    let db = seeded_database(&tokens, &[bundle("ALL", &["T0", "T3", "T6"], 3.0)]).await;
    let oracle = Arc::new(ScriptedOracle::with_prices(&prices).failing_on(1));
    let broadcaster = Arc::new(RecordingBroadcaster::default());

    let summary = completed(
        updater(db.clone(), oracle.clone(), broadcaster, 3)
            .run_cycle()
            .await
            .unwrap(),
    );

    assert_eq!(oracle.batch_sizes(), vec![3, 3, 1]);
    assert_eq!(summary.updated, 4);
    assert_eq!(summary.errors, 1);
    assert!(summary.error_details[0].is_batch_level());
    assert!(summary.error_details[0].error.contains("503"));

    // Batch 2 kept its prior prices
    assert_eq!(token_price(&db, "T3").await, 1.0);
    assert_eq!(token_price(&db, "T0").await, 2.0);
    assert_eq!(token_price(&db, "T6").await, 2.0);

    let all = stored_bundle(&db, "ALL").await;
    assert_eq!(all.current_price, 5.0);
}

#[tokio::test]
async fn repeated_cycle_with_same_prices_is_stable() {
    let db = seeded_database(
        &[token("A", 10.0), token("B", 5.0)],
        &[bundle("X", &["A", "B"], 12.0)],
    )
    .await;
    let oracle = Arc::new(ScriptedOracle::with_prices(&[("A", 12.0), ("B", 6.0)]));
    let updater = updater(
        db.clone(),
        oracle,
        Arc::new(RecordingBroadcaster::default()),
        100,
    );

    updater.run_cycle().await.unwrap();
    let first = stored_bundle(&db, "X").await;
    updater.run_cycle().await.unwrap();
    let second = stored_bundle(&db, "X").await;

    assert_eq!(first.current_price, second.current_price);
    assert_eq!(first.price_change_percent, second.price_change_percent);
}

#[tokio::test]
async fn empty_token_store_is_a_successful_no_op() {
    let db = seeded_database(&[], &[bundle("X", &["A"], 1.0)]).await;
    let oracle = Arc::new(ScriptedOracle::default());
    let broadcaster = Arc::new(RecordingBroadcaster::default());

    let outcome = updater(db.clone(), oracle.clone(), broadcaster.clone(), 100)
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(outcome, CycleOutcome::no_tokens());
    assert_eq!(oracle.call_count(), 0);
    assert!(broadcaster.events().is_empty());
    assert_eq!(stored_bundle(&db, "X").await.current_price, 1.0);
}

#[tokio::test]
async fn unsolicited_and_invalid_prices() {
    let db = seeded_database(&[token("A", 1.0), token("B", 1.0)], &[]).await;
    let mut oracle = ScriptedOracle::with_prices(&[("A", 3.0), ("B", -1.0)]);
    oracle.unsolicited = vec![(TokenAddress::new("STRANGER"), 9.0)];
    let oracle = Arc::new(oracle);

    let summary = completed(
        updater(db.clone(), oracle, Arc::new(RecordingBroadcaster::default()), 100)
            .run_cycle()
            .await
            .unwrap(),
    );

    assert_eq!(summary.updated, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(
        summary.error_details[0].address,
        Some(TokenAddress::new("B"))
    );
    assert_eq!(token_price(&db, "B").await, 1.0);
    assert!(TokenStore::get(db.as_ref(), &TokenAddress::new("STRANGER"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn oracle_addresses_match_ignoring_case() {
    let db = seeded_database(&[token("AbC", 1.0)], &[]).await;
    let oracle = Arc::new(ScriptedOracle::with_prices(&[("abc", 4.0)]));

    let summary = completed(
        updater(db.clone(), oracle, Arc::new(RecordingBroadcaster::default()), 100)
            .run_cycle()
            .await
            .unwrap(),
    );

    assert_eq!(summary.updated, 1);
    assert_eq!(summary.updated_tokens[0].address.as_str(), "AbC");
    assert_eq!(token_price(&db, "AbC").await, 4.0);
}

#[tokio::test(start_paused = true)]
async fn pacing_delay_follows_every_batch() {
    let tokens: Vec<Token> = (0..250).map(|i| token(&format!("P{}", i), 1.0)).collect();
    let db = seeded_database(&tokens, &[]).await;
    let oracle = Arc::new(ScriptedOracle::default().failing_on(0));

    let updater = PriceUpdater::new(
        db.clone(),
        db,
        oracle.clone(),
        Arc::new(RecordingBroadcaster::default()),
        UpdaterSettings {
            batch_size: 100,
            batch_delay: Duration::from_secs(1),
        },
    );

    let started = tokio::time::Instant::now();
    let summary = completed(updater.run_cycle().await.unwrap());

    assert_eq!(oracle.batch_sizes(), vec![100, 100, 50]);
    assert_eq!(summary.errors, 1);
    // Three batches, one pause after each (failures included)
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn batch_size_is_capped_by_the_oracle() {
    let tokens: Vec<Token> = (0..150).map(|i| token(&format!("Q{}", i), 1.0)).collect();
    let db = seeded_database(&tokens, &[]).await;
    let oracle = Arc::new(ScriptedOracle::default());

    let updater = updater(db, oracle.clone(), Arc::new(RecordingBroadcaster::default()), 500);
    assert_eq!(updater.settings().batch_size, 100);

    updater.run_cycle().await.unwrap();
    assert_eq!(oracle.batch_sizes(), vec![100, 50]);
}

// ---------------------------------------------------------------------------
// Re-entrancy
// ---------------------------------------------------------------------------

/// Holds every call until released
struct GatedOracle {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl indexboard::apis::PriceOracle for GatedOracle {
    async fn fetch_prices(
        &self,
        addresses: &[TokenAddress],
    ) -> Result<HashMap<TokenAddress, f64>, OracleError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(addresses.iter().map(|a| (a.clone(), 7.0)).collect())
    }
}

#[tokio::test]
async fn overlapping_trigger_is_rejected() {
    let db = seeded_database(&[token("A", 1.0)], &[]).await;
    let oracle = Arc::new(GatedOracle {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let updater = Arc::new(PriceUpdater::new(
        db.clone(),
        db.clone(),
        oracle.clone(),
        Arc::new(RecordingBroadcaster::default()),
        settings(100),
    ));

    let running = {
        let updater = updater.clone();
        tokio::spawn(async move { updater.run_cycle().await })
    };

    oracle.entered.notified().await;
    assert!(updater.is_running());
    assert_eq!(updater.state(), CycleState::BatchingPrices);
    assert!(matches!(
        updater.run_cycle().await,
        Err(CycleError::AlreadyRunning)
    ));

    oracle.release.notify_one();
    let summary = completed(running.await.unwrap().unwrap());
    assert_eq!(summary.updated, 1);
    assert!(!updater.is_running());
    assert_eq!(token_price(&db, "A").await, 7.0);

    // Slot is free again
    oracle.release.notify_one();
    assert!(updater.run_cycle().await.is_ok());
}

// ---------------------------------------------------------------------------
// Fatal and per-record storage failures
// ---------------------------------------------------------------------------

/// Token store whose listing always fails
struct BrokenTokenStore;

#[async_trait]
impl TokenStore for BrokenTokenStore {
    async fn list_all(&self) -> StoreResult<Vec<Token>> {
        Err(StoreError::Lock("poisoned".to_string()))
    }

    async fn update_price(&self, _: &TokenAddress, _: f64, _: DateTime<Utc>) -> StoreResult<()> {
        Ok(())
    }

    async fn get(&self, _: &TokenAddress) -> StoreResult<Option<Token>> {
        Ok(None)
    }

    async fn get_many(&self, _: &[TokenAddress]) -> StoreResult<Vec<Token>> {
        Ok(Vec::new())
    }

    async fn upsert(&self, _: &Token) -> StoreResult<()> {
        Ok(())
    }
}

/// Bundle store that refuses metric writes for one id, or every listing
struct RefusingBundleStore {
    inner: Arc<indexboard::storage::Database>,
    refuse: &'static str,
    refuse_listing: bool,
}

#[async_trait]
impl BundleStore for RefusingBundleStore {
    async fn list_all(&self) -> StoreResult<Vec<Bundle>> {
        if self.refuse_listing {
            return Err(StoreError::Lock("poisoned".to_string()));
        }
        BundleStore::list_all(self.inner.as_ref()).await
    }

    async fn update_metrics(
        &self,
        bundle_id: &str,
        current_price: f64,
        price_change_percent: f64,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<()> {
        if bundle_id == self.refuse {
            return Err(StoreError::Lock("busy".to_string()));
        }
        self.inner
            .update_metrics(bundle_id, current_price, price_change_percent, timestamp)
            .await
    }

    async fn insert(&self, bundle: &Bundle) -> StoreResult<()> {
        self.inner.insert(bundle).await
    }

    async fn get(&self, bundle_id: &str) -> StoreResult<Option<Bundle>> {
        BundleStore::get(self.inner.as_ref(), bundle_id).await
    }

    async fn list_active(&self, user_id: Option<&str>) -> StoreResult<Vec<Bundle>> {
        self.inner.list_active(user_id).await
    }

    async fn count_active_by_creator(&self, creator: &CreatorKey) -> StoreResult<usize> {
        self.inner.count_active_by_creator(creator).await
    }

    async fn deactivate(&self, bundle_id: &str) -> StoreResult<()> {
        self.inner.deactivate(bundle_id).await
    }

    async fn deactivate_all(&self) -> StoreResult<usize> {
        self.inner.deactivate_all().await
    }
}

#[tokio::test]
async fn token_listing_failure_is_fatal() {
    let db = seeded_database(&[], &[]).await;
    let oracle = Arc::new(ScriptedOracle::default());
    let updater = PriceUpdater::new(
        Arc::new(BrokenTokenStore),
        db,
        oracle.clone(),
        Arc::new(RecordingBroadcaster::default()),
        settings(100),
    );

    let err = updater.run_cycle().await.unwrap_err();
    assert!(matches!(err, CycleError::TokenLoad(_)));
    assert_eq!(oracle.call_count(), 0);
    assert_eq!(updater.state(), CycleState::Idle);
    assert!(!updater.is_running());
}

#[tokio::test]
async fn bundle_listing_failure_is_fatal_after_prices_are_stored() {
    let db = seeded_database(&[token("A", 1.0)], &[bundle("X", &["A"], 1.0)]).await;
    let bundles = Arc::new(RefusingBundleStore {
        inner: db.clone(),
        refuse: "",
        refuse_listing: true,
    });
    let broadcaster = Arc::new(RecordingBroadcaster::default());
    let updater = PriceUpdater::new(
        db.clone(),
        bundles,
        Arc::new(ScriptedOracle::with_prices(&[("A", 2.0)])),
        broadcaster.clone(),
        settings(100),
    );

    let err = updater.run_cycle().await.unwrap_err();
    assert!(matches!(err, CycleError::BundleLoad(_)));
    assert_eq!(token_price(&db, "A").await, 2.0);
    assert_eq!(stored_bundle(&db, "X").await.current_price, 1.0);
    assert!(broadcaster.events().is_empty());
    assert_eq!(updater.state(), CycleState::Idle);
    assert!(!updater.is_running());
}

#[tokio::test]
async fn updated_tokens_follow_store_order() {
    let symbols = ["A", "B", "C", "D", "E", "F", "G", "H"];
    let tokens: Vec<_> = symbols.iter().map(|s| token(s, 1.0)).collect();
    let db = seeded_database(&tokens, &[]).await;
    let prices: Vec<(&str, f64)> = symbols.iter().rev().map(|s| (*s, 2.0)).collect();

    let summary = completed(
        updater(
            db,
            Arc::new(ScriptedOracle::with_prices(&prices)),
            Arc::new(RecordingBroadcaster::default()),
            3,
        )
        .run_cycle()
        .await
        .unwrap(),
    );

    let order: Vec<_> = summary.updated_tokens.iter().map(|t| t.symbol.as_str()).collect();
    assert_eq!(order, symbols);
}

#[tokio::test]
async fn bundle_write_failure_is_reported_and_not_broadcast() {
    let db = seeded_database(
        &[token("A", 1.0), token("B", 1.0)],
        &[bundle("OK", &["A"], 1.0), bundle("BAD", &["B"], 1.0)],
    )
    .await;
    let bundles = Arc::new(RefusingBundleStore {
        inner: db.clone(),
        refuse: "BAD",
        refuse_listing: false,
    });
    let broadcaster = Arc::new(RecordingBroadcaster::default());
    let updater = PriceUpdater::new(
        db.clone(),
        bundles,
        Arc::new(ScriptedOracle::with_prices(&[("A", 2.0), ("B", 2.0)])),
        broadcaster.clone(),
        settings(100),
    );

    let summary = completed(updater.run_cycle().await.unwrap());
    assert_eq!(summary.updated, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.error_details[0].bundle_id.as_deref(), Some("BAD"));

    let ids: Vec<_> = summary.updated_bundles.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["OK"]);
    assert_eq!(stored_bundle(&db, "BAD").await.current_price, 1.0);

    match &broadcaster.events()[0] {
        BroadcastEvent::PricesUpdated { updated_bundles, .. } => {
            assert_eq!(updated_bundles.len(), 1)
        }
        other => panic!("unexpected event {:?}", other),
    }
}
