/// Token detail lookup: stored record when fresh, provider otherwise
use super::types::{is_valid_price, Token, TokenAddress};
use super::validation::is_valid_solana_address;
use crate::apis::TokenInfoSource;
use crate::errors::{LookupError, OracleError};
use crate::logger::{self, LogTag};
use crate::storage::TokenStore;
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Upper bound for the freshness window (ten years)
pub const MAX_FRESHNESS_HOURS: i64 = 87_600;

/// Where a lookup result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupSource {
    Database,
    Birdeye,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenLookupResult {
    pub token: Token,
    pub source: LookupSource,
}

pub struct TokenLookup {
    store: Arc<dyn TokenStore>,
    source: Arc<dyn TokenInfoSource>,
    freshness: Duration,
}

impl TokenLookup {
    pub fn new(
        store: Arc<dyn TokenStore>,
        source: Arc<dyn TokenInfoSource>,
        freshness_hours: i64,
    ) -> Self {
        Self {
            store,
            source,
            freshness: Duration::hours(freshness_hours.clamp(0, MAX_FRESHNESS_HOURS)),
        }
    }

    /// Resolve `address`, refreshing from the provider when the stored copy is stale
    pub async fn lookup(&self, address: &str) -> Result<TokenLookupResult, LookupError> {
        let address = address.trim();
        if !is_valid_solana_address(address) {
            return Err(LookupError::InvalidAddress(address.to_string()));
        }
        let address = TokenAddress::new(address);
        let now = Utc::now();

        if let Some(stored) = self.store.get(&address).await? {
            if stored.age(now) < self.freshness {
                logger::debug(
                    LogTag::Tokens,
                    &format!("Serving {} from database", stored.symbol),
                );
                return Ok(TokenLookupResult {
                    token: stored,
                    source: LookupSource::Database,
                });
            }
            logger::debug(
                LogTag::Tokens,
                &format!("Stored details for {} are stale, refreshing", address),
            );
        }

        let overview = match self.source.fetch_token_overview(&address).await {
            Ok(overview) => overview,
            Err(OracleError::Rejected(message)) => return Err(LookupError::NotFound(message)),
            Err(e) => return Err(LookupError::Oracle(e)),
        };
        if !is_valid_price(overview.price) {
            logger::warning(
                LogTag::Tokens,
                &format!("Birdeye returned price {} for {}, not saving", overview.price, address),
            );
            return Err(LookupError::Oracle(OracleError::InvalidResponse(format!(
                "invalid price {} for {}",
                overview.price, address
            ))));
        }

        let token = Token {
            address,
            name: overview.name,
            symbol: overview.symbol,
            decimals: overview.decimals,
            price: overview.price,
            logo_uri: overview.logo_uri,
            last_updated: now,
        };
        self.store.upsert(&token).await?;

        logger::info(
            LogTag::Tokens,
            &format!("Saved token {} ({}) from Birdeye", token.symbol, token.address),
        );

        Ok(TokenLookupResult {
            token,
            source: LookupSource::Birdeye,
        })
    }
}
