use crate::config::Config;
use crate::errors::CycleError;
use crate::logger::{self, LogTag};
use crate::pipeline::{CycleOutcome, PriceUpdater};
use crate::services::{Service, ServiceHealth};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Runs a price-update cycle on a fixed interval
pub struct PriceUpdateService {
    updater: Arc<PriceUpdater>,
    interval: Duration,
    run_on_start: bool,
    /// Error of the most recent cycle, cleared on success
    last_error: Arc<Mutex<Option<String>>>,
}

impl PriceUpdateService {
    pub fn new(updater: Arc<PriceUpdater>, interval: Duration, run_on_start: bool) -> Self {
        Self {
            updater,
            interval,
            run_on_start,
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_config(updater: Arc<PriceUpdater>, config: &Config) -> Self {
        Self::new(
            updater,
            Duration::from_secs(config.scheduler.interval_secs),
            config.scheduler.run_on_start,
        )
    }
}

async fn run_scheduled_cycle(updater: &PriceUpdater, last_error: &Mutex<Option<String>>) {
    let error = match updater.run_cycle().await {
        Ok(CycleOutcome::Completed(summary)) => {
            if summary.errors > 0 {
                logger::warning(
                    LogTag::Pipeline,
                    &format!("Scheduled cycle finished with {} errors", summary.errors),
                );
            }
            None
        }
        Ok(CycleOutcome::NoTokens { .. }) => None,
        // Another trigger (HTTP) is running a cycle right now
        Err(CycleError::AlreadyRunning) => return,
        Err(e) => {
            logger::error(LogTag::Pipeline, &format!("Scheduled cycle failed: {}", e));
            Some(e.to_string())
        }
    };

    if let Ok(mut slot) = last_error.lock() {
        *slot = error;
    }
}

#[async_trait]
impl Service for PriceUpdateService {
    fn name(&self) -> &'static str {
        "price_updater"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn is_enabled(&self, config: &Config) -> bool {
        config.scheduler.enabled
    }

    async fn start(&mut self, shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String> {
        if self.interval.is_zero() {
            return Err("scheduler.interval_secs must be greater than 0".to_string());
        }

        let updater = self.updater.clone();
        let last_error = self.last_error.clone();
        let period = self.interval;
        let run_on_start = self.run_on_start;

        logger::info(
            LogTag::Pipeline,
            &format!("Price updates scheduled every {}s", period.as_secs()),
        );

        // Registered before spawning so an early shutdown is not missed
        let stop = shutdown.notified_owned();
        let handle = tokio::spawn(async move {
            tokio::pin!(stop);

            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            if !run_on_start {
                // The first tick completes immediately
                ticker.tick().await;
            }

            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    _ = ticker.tick() => {
                        run_scheduled_cycle(&updater, &last_error).await;
                    }
                }
            }

            logger::debug(LogTag::Pipeline, "Price update scheduler stopped");
        });

        Ok(vec![handle])
    }

    async fn health(&self) -> ServiceHealth {
        match self.last_error.lock() {
            Ok(slot) => match slot.as_ref() {
                Some(error) => ServiceHealth::Degraded(error.clone()),
                None => ServiceHealth::Healthy,
            },
            Err(_) => ServiceHealth::Unhealthy("state lock poisoned".to_string()),
        }
    }
}
