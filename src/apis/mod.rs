/// External API clients
///
/// The pipeline depends on the [`PriceOracle`] trait only; [`birdeye`]
/// provides the production implementation.
pub mod birdeye;
pub mod client;

pub use birdeye::BirdeyeClient;
pub use client::HttpClient;

use crate::errors::OracleError;
use crate::tokens::TokenAddress;
use async_trait::async_trait;
use std::collections::HashMap;

/// Maximum addresses accepted by one multi-price call
pub const MAX_BATCH_SIZE: usize = 100;

/// Batch price source
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Largest batch accepted by [`PriceOracle::fetch_prices`]
    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }

    /// Current USD prices for one batch
    ///
    /// Unrecognised addresses are absent from the map. Any failure applies to
    /// the whole batch.
    async fn fetch_prices(
        &self,
        addresses: &[TokenAddress],
    ) -> Result<HashMap<TokenAddress, f64>, OracleError>;
}

/// Token details as reported by the data provider, defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct TokenOverview {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub price: f64,
    pub logo_uri: Option<String>,
}

/// Single-token detail source
#[async_trait]
pub trait TokenInfoSource: Send + Sync {
    async fn fetch_token_overview(&self, address: &TokenAddress)
        -> Result<TokenOverview, OracleError>;
}
