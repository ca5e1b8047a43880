#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use indexboard::apis::PriceOracle;
use indexboard::broadcast::{BroadcastEvent, Broadcaster};
use indexboard::bundles::Bundle;
use indexboard::errors::OracleError;
use indexboard::storage::{BundleStore, Database, TokenStore};
use indexboard::tokens::{Token, TokenAddress};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Oracle answering from a fixed price table
///
/// Calls listed in `failing_calls` (0-based) fail as a whole batch.
#[derive(Default)]
pub struct ScriptedOracle {
    pub prices: HashMap<TokenAddress, f64>,
    /// Returned on every successful call whether requested or not
    pub unsolicited: Vec<(TokenAddress, f64)>,
    pub failing_calls: HashSet<usize>,
    pub calls: Mutex<Vec<Vec<TokenAddress>>>,
}

impl ScriptedOracle {
    pub fn with_prices(prices: &[(&str, f64)]) -> Self {
        Self {
            prices: prices
                .iter()
                .map(|(a, p)| (TokenAddress::new(*a), *p))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing_on(mut self, call: usize) -> Self {
        self.failing_calls.insert(call);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(Vec::len).collect()
    }
}

#[async_trait]
impl PriceOracle for ScriptedOracle {
    async fn fetch_prices(
        &self,
        addresses: &[TokenAddress],
    ) -> Result<HashMap<TokenAddress, f64>, OracleError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(addresses.to_vec());
            calls.len() - 1
        };

        if self.failing_calls.contains(&call) {
            return Err(OracleError::HttpStatus {
                status: 503,
                body: "upstream unavailable".to_string(),
            });
        }

        let mut result: HashMap<TokenAddress, f64> = addresses
            .iter()
            .filter_map(|a| self.prices.get(a).map(|p| (a.clone(), *p)))
            .collect();
        result.extend(self.unsolicited.iter().cloned());
        Ok(result)
    }
}

/// Broadcaster that keeps every published event
#[derive(Default)]
pub struct RecordingBroadcaster {
    pub events: Mutex<Vec<BroadcastEvent>>,
}

impl RecordingBroadcaster {
    pub fn events(&self) -> Vec<BroadcastEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn publish(&self, event: BroadcastEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn token(address: &str, price: f64) -> Token {
    Token {
        address: TokenAddress::new(address),
        name: format!("{} token", address),
        symbol: address.to_uppercase(),
        decimals: 9,
        price,
        logo_uri: None,
        last_updated: Utc::now() - Duration::minutes(5),
    }
}

pub fn bundle(id: &str, members: &[&str], initial_price: f64) -> Bundle {
    let created = Utc::now() - Duration::hours(1);
    Bundle {
        id: id.to_string(),
        title: format!("Bundle {}", id),
        description: None,
        image_url: None,
        token_addresses: members.iter().map(|a| TokenAddress::new(*a)).collect(),
        initial_price,
        current_price: initial_price,
        price_change_percent: 0.0,
        created_at: created,
        last_updated: created,
        user_id: None,
        twitter_username: None,
        is_active: true,
    }
}

pub async fn seeded_database(tokens: &[Token], bundles: &[Bundle]) -> Arc<Database> {
    let db = Arc::new(Database::open_in_memory().unwrap());
    for t in tokens {
        db.upsert(t).await.unwrap();
    }
    for b in bundles {
        db.insert(b).await.unwrap();
    }
    db
}

pub async fn token_price(db: &Database, address: &str) -> f64 {
    TokenStore::get(db, &TokenAddress::new(address))
        .await
        .unwrap()
        .unwrap()
        .price
}

pub async fn stored_bundle(db: &Database, id: &str) -> Bundle {
    BundleStore::get(db, id).await.unwrap().unwrap()
}
