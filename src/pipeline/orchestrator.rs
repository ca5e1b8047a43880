//! Price-update cycle orchestration
//!
//! One cycle: load tokens, fetch prices batch by batch (strictly sequential,
//! paced), write each price, recompute every bundle from the updated store,
//! persist bundle metrics, publish one `prices:updated` event.
//!
//! Only failing to list tokens or bundles aborts a cycle. Batch, token and
//! bundle failures are collected into the [`CycleSummary`].

use super::batching::{batch_count, partition};
use super::state::{CycleState, StateCell};
use super::summary::{BatchOutcome, CycleOutcome, CycleSummary, ErrorDetail};
use crate::apis::PriceOracle;
use crate::broadcast::{BroadcastEvent, Broadcaster, UpdatedBundle, UpdatedToken};
use crate::bundles::Bundle;
use crate::config::OracleConfig;
use crate::errors::CycleError;
use crate::logger::{self, LogTag};
use crate::pricing;
use crate::storage::{BundleStore, TokenStore};
use crate::tokens::{is_valid_price, Token, TokenAddress};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Batch sizing and pacing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdaterSettings {
    pub batch_size: usize,
    /// Slept after every batch, success or failure
    pub batch_delay: Duration,
}

impl Default for UpdaterSettings {
    fn default() -> Self {
        Self {
            batch_size: crate::apis::MAX_BATCH_SIZE,
            batch_delay: Duration::from_millis(1000),
        }
    }
}

impl UpdaterSettings {
    pub fn from_config(config: &OracleConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            batch_delay: Duration::from_millis(config.batch_delay_ms),
        }
    }
}

pub struct PriceUpdater {
    token_store: Arc<dyn TokenStore>,
    bundle_store: Arc<dyn BundleStore>,
    oracle: Arc<dyn PriceOracle>,
    broadcaster: Arc<dyn Broadcaster>,
    settings: UpdaterSettings,
    running: AtomicBool,
    state: StateCell,
}

/// Releases the single cycle slot and resets the state on drop
struct CycleGuard<'a> {
    updater: &'a PriceUpdater,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.updater.transition(CycleState::Idle);
        self.updater.running.store(false, Ordering::Release);
    }
}

impl PriceUpdater {
    pub fn new(
        token_store: Arc<dyn TokenStore>,
        bundle_store: Arc<dyn BundleStore>,
        oracle: Arc<dyn PriceOracle>,
        broadcaster: Arc<dyn Broadcaster>,
        settings: UpdaterSettings,
    ) -> Self {
        // Never exceed what the oracle accepts in one call
        let batch_size = settings.batch_size.clamp(1, oracle.max_batch_size().max(1));

        Self {
            token_store,
            bundle_store,
            oracle,
            broadcaster,
            settings: UpdaterSettings {
                batch_size,
                ..settings
            },
            running: AtomicBool::new(false),
            state: StateCell::new(),
        }
    }

    pub fn state(&self) -> CycleState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn settings(&self) -> UpdaterSettings {
        self.settings
    }

    fn transition(&self, next: CycleState) {
        let previous = self.state.set(next);
        if previous != next {
            logger::debug(
                LogTag::Pipeline,
                &format!("State {} -> {}", previous, next),
            );
        }
    }

    fn try_begin(&self) -> Result<CycleGuard<'_>, CycleError> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CycleError::AlreadyRunning)?;
        Ok(CycleGuard { updater: self })
    }

    /// Run one complete price-update cycle
    ///
    /// Returns [`CycleError::AlreadyRunning`] without touching any store when
    /// another cycle holds the slot.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let _guard = match self.try_begin() {
            Ok(guard) => guard,
            Err(e) => {
                logger::warning(LogTag::Pipeline, "Cycle requested while one is running, skipping");
                return Err(e);
            }
        };
        let started = Instant::now();

        self.transition(CycleState::LoadingTokens);
        let tokens = self.token_store.list_all().await.map_err(|e| {
            logger::error(LogTag::Pipeline, &format!("Failed to load tokens: {}", e));
            CycleError::TokenLoad(e)
        })?;

        if tokens.is_empty() {
            logger::info(LogTag::Pipeline, "No tokens found to update");
            return Ok(CycleOutcome::no_tokens());
        }

        self.transition(CycleState::BatchingPrices);
        let total_batches = batch_count(tokens.len(), self.settings.batch_size);
        logger::info(
            LogTag::Pipeline,
            &format!(
                "Updating {} tokens in {} batches",
                tokens.len(),
                total_batches
            ),
        );

        let batches = partition(&tokens, self.settings.batch_size);
        let outcome = stream::iter(batches.into_iter().enumerate())
            .fold(BatchOutcome::default(), move |acc, (index, batch)| async move {
                self.process_batch(acc, index, total_batches, batch).await
            })
            .await;

        self.transition(CycleState::RecomputingBundles);
        let bundles = self.bundle_store.list_all().await.map_err(|e| {
            logger::error(LogTag::Pipeline, &format!("Failed to load bundles: {}", e));
            CycleError::BundleLoad(e)
        })?;
        let (updated_bundles, bundle_errors) = self.update_bundles(&bundles).await;

        self.transition(CycleState::Broadcasting);
        self.broadcaster.publish(BroadcastEvent::PricesUpdated {
            updated_tokens: outcome.updated_tokens.clone(),
            updated_bundles: updated_bundles.clone(),
        });

        let summary = CycleSummary::new(
            outcome,
            bundle_errors,
            updated_bundles,
            started.elapsed().as_millis() as u64,
        );

        logger::info(
            LogTag::Pipeline,
            &format!(
                "Cycle complete: {} tokens updated, {} bundles updated, {} errors in {}ms",
                summary.updated,
                summary.updated_bundles.len(),
                summary.errors,
                summary.duration_ms
            ),
        );

        Ok(CycleOutcome::Completed(summary))
    }

    /// Fetch one batch and fold its writes into `acc`, then pace
    async fn process_batch(
        &self,
        acc: BatchOutcome,
        index: usize,
        total: usize,
        batch: Vec<Token>,
    ) -> BatchOutcome {
        self.transition(CycleState::BatchingPrices);
        let addresses: Vec<TokenAddress> = batch.iter().map(|t| t.address.clone()).collect();

        logger::debug(
            LogTag::Pipeline,
            &format!(
                "Batch {}/{}: fetching {} prices",
                index + 1,
                total,
                addresses.len()
            ),
        );

        let acc = match self.oracle.fetch_prices(&addresses).await {
            Ok(prices) => {
                self.transition(CycleState::UpdatingTokenStore);
                self.apply_prices(acc, &batch, prices).await
            }
            Err(e) => {
                logger::warning(
                    LogTag::Oracle,
                    &format!("Batch {}/{} failed: {}", index + 1, total, e),
                );
                acc.with_error(ErrorDetail::batch(e.to_string()))
            }
        };

        if !self.settings.batch_delay.is_zero() {
            tokio::time::sleep(self.settings.batch_delay).await;
        }

        acc
    }

    /// Write every returned price that belongs to this batch
    async fn apply_prices(
        &self,
        acc: BatchOutcome,
        batch: &[Token],
        prices: HashMap<TokenAddress, f64>,
    ) -> BatchOutcome {
        for address in prices.keys() {
            if !batch.iter().any(|t| &t.address == address) {
                logger::debug(
                    LogTag::Pipeline,
                    &format!("Token not found in batch: {}", address),
                );
            }
        }

        let mut acc = acc;
        for token in batch {
            let price = match prices.get(&token.address) {
                Some(price) => *price,
                None => continue,
            };

            if !is_valid_price(price) {
                acc = acc.with_error(ErrorDetail::token(
                    token.address.clone(),
                    format!("Invalid price: {}", price),
                ));
                continue;
            }

            acc = match self
                .token_store
                .update_price(&token.address, price, Utc::now())
                .await
            {
                Ok(()) => {
                    logger::verbose(
                        LogTag::Tokens,
                        &format!("{} ({}) -> {}", token.symbol, token.address, price),
                    );
                    acc.with_token(UpdatedToken {
                        address: token.address.clone(),
                        symbol: token.symbol.clone(),
                        price,
                    })
                }
                Err(e) => {
                    logger::warning(
                        LogTag::Tokens,
                        &format!("Failed to store price for {}: {}", token.address, e),
                    );
                    acc.with_error(ErrorDetail::token(token.address.clone(), e.to_string()))
                }
            };
        }
        acc
    }

    /// Recompute and persist every bundle against the updated token store
    async fn update_bundles(&self, bundles: &[Bundle]) -> (Vec<UpdatedBundle>, Vec<ErrorDetail>) {
        let mut updated = Vec::with_capacity(bundles.len());
        let mut errors = Vec::new();

        for bundle in bundles {
            let members = match self.token_store.get_many(&bundle.token_addresses).await {
                Ok(members) => members,
                Err(e) => {
                    errors.push(ErrorDetail::bundle(&bundle.id, e.to_string()));
                    continue;
                }
            };
            let prices: HashMap<TokenAddress, f64> = members
                .into_iter()
                .map(|t| (t.address, t.price))
                .collect();

            let metrics = pricing::recompute(bundle, &prices);

            self.transition(CycleState::UpdatingBundleStore);
            let now = Utc::now();
            match self
                .bundle_store
                .update_metrics(
                    &bundle.id,
                    metrics.current_price,
                    metrics.price_change_percent,
                    now,
                )
                .await
            {
                Ok(()) => {
                    logger::debug(
                        LogTag::Bundles,
                        &format!(
                            "{}: initial {} current {} ({:.2}%)",
                            bundle.title,
                            bundle.initial_price,
                            metrics.current_price,
                            metrics.price_change_percent
                        ),
                    );
                    updated.push(UpdatedBundle {
                        id: bundle.id.clone(),
                        title: bundle.title.clone(),
                        current_price: metrics.current_price,
                        price_change_percent: metrics.price_change_percent,
                        last_updated: now,
                    });
                }
                Err(e) => {
                    logger::warning(
                        LogTag::Bundles,
                        &format!("Failed to store metrics for {}: {}", bundle.id, e),
                    );
                    errors.push(ErrorDetail::bundle(&bundle.id, e.to_string()));
                }
            }
            self.transition(CycleState::RecomputingBundles);
        }

        (updated, errors)
    }
}
