/// Birdeye API client
///
/// API Documentation: https://docs.birdeye.so/
///
/// Endpoints implemented:
/// 1. POST /defi/multi_price - Prices for up to 100 addresses
/// 2. GET /defi/token_overview - Name, symbol, decimals, price and logo
pub mod types;

use self::types::{MultiPriceResponse, TokenOverviewResponse};
use super::{PriceOracle, TokenInfoSource, TokenOverview, MAX_BATCH_SIZE};
use crate::apis::client::HttpClient;
use crate::config::OracleConfig;
use crate::errors::OracleError;
use crate::logger::{self, LogTag};
use crate::tokens::TokenAddress;
use async_trait::async_trait;
use std::collections::HashMap;

const MULTI_PRICE_PATH: &str = "/defi/multi_price";
const TOKEN_OVERVIEW_PATH: &str = "/defi/token_overview";

pub struct BirdeyeClient {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
    chain: String,
    enabled: bool,
}

impl BirdeyeClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        chain: &str,
        timeout_secs: u64,
        enabled: bool,
    ) -> Result<Self, String> {
        Ok(Self {
            http_client: HttpClient::new(timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            chain: chain.to_string(),
            enabled,
        })
    }

    pub fn from_config(config: &OracleConfig) -> Result<Self, String> {
        if config.enabled && config.api_key.is_empty() {
            logger::warning(
                LogTag::Oracle,
                "No Birdeye API key configured (set BIRDEYE_API_KEY); requests will likely be rejected",
            );
        }
        Self::new(
            &config.base_url,
            &config.api_key,
            &config.chain,
            config.timeout_secs,
            config.enabled,
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Prices for one batch of at most [`MAX_BATCH_SIZE`] addresses
    pub async fn fetch_multi_price(
        &self,
        addresses: &[TokenAddress],
    ) -> Result<HashMap<TokenAddress, f64>, OracleError> {
        if !self.enabled {
            return Err(OracleError::Disabled);
        }
        if addresses.len() > MAX_BATCH_SIZE {
            return Err(OracleError::BatchTooLarge {
                size: addresses.len(),
                max: MAX_BATCH_SIZE,
            });
        }
        if addresses.is_empty() {
            return Ok(HashMap::new());
        }

        let list_address = addresses
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(",");

        logger::debug(
            LogTag::Oracle,
            &format!("multi_price request for {} addresses", addresses.len()),
        );

        let request = self
            .http_client
            .client()
            .post(format!("{}{}", self.base_url, MULTI_PRICE_PATH))
            .header("accept", "application/json")
            .header("x-chain", &self.chain)
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({ "list_address": list_address }));

        let body = self.http_client.send_text(request, MULTI_PRICE_PATH).await?;
        decode_multi_price(&body)
    }

    pub async fn fetch_overview(
        &self,
        address: &TokenAddress,
    ) -> Result<TokenOverview, OracleError> {
        if !self.enabled {
            return Err(OracleError::Disabled);
        }

        let request = self
            .http_client
            .client()
            .get(format!("{}{}", self.base_url, TOKEN_OVERVIEW_PATH))
            .query(&[("address", address.as_str())])
            .header("accept", "application/json")
            .header("x-chain", &self.chain)
            .header("X-API-KEY", &self.api_key);

        let body = self
            .http_client
            .send_text(request, TOKEN_OVERVIEW_PATH)
            .await?;
        decode_token_overview(&body)
    }
}

#[async_trait]
impl PriceOracle for BirdeyeClient {
    async fn fetch_prices(
        &self,
        addresses: &[TokenAddress],
    ) -> Result<HashMap<TokenAddress, f64>, OracleError> {
        self.fetch_multi_price(addresses).await
    }
}

#[async_trait]
impl TokenInfoSource for BirdeyeClient {
    async fn fetch_token_overview(
        &self,
        address: &TokenAddress,
    ) -> Result<TokenOverview, OracleError> {
        self.fetch_overview(address).await
    }
}

// ============================================================================
// RESPONSE DECODING
// ============================================================================

/// Decode a multi_price body into address -> USD price
///
/// `null` entries are dropped, a missing `value` reads as 0.
pub fn decode_multi_price(body: &str) -> Result<HashMap<TokenAddress, f64>, OracleError> {
    let response: MultiPriceResponse = serde_json::from_str(body)
        .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

    if !response.success {
        return Err(OracleError::Rejected(
            response
                .message
                .unwrap_or_else(|| "Invalid response from Birdeye API".to_string()),
        ));
    }

    let data = response.data.ok_or_else(|| {
        OracleError::InvalidResponse("Invalid response from Birdeye API".to_string())
    })?;

    Ok(data
        .into_iter()
        .filter_map(|(address, entry)| {
            entry.map(|entry| (TokenAddress::new(address), entry.value.unwrap_or(0.0)))
        })
        .collect())
}

/// Decode a token_overview body, applying defaults for missing fields
pub fn decode_token_overview(body: &str) -> Result<TokenOverview, OracleError> {
    let response: TokenOverviewResponse = serde_json::from_str(body)
        .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

    let data = match (response.success, response.data) {
        (true, Some(data)) => data,
        (_, _) => {
            return Err(OracleError::Rejected(response.message.unwrap_or_else(|| {
                "Failed to fetch token details from Birdeye".to_string()
            })))
        }
    };

    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    Ok(TokenOverview {
        name: non_empty(data.name).unwrap_or_else(|| "Unknown".to_string()),
        symbol: non_empty(data.symbol).unwrap_or_else(|| "Unknown".to_string()),
        decimals: data
            .decimals
            .and_then(|d| u8::try_from(d).ok())
            .unwrap_or(0),
        price: data.price.unwrap_or(0.0),
        logo_uri: non_empty(data.logo_uri).or_else(|| non_empty(data.logo)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_multi_price() {
        let body = r#"{
            "success": true,
            "data": {
                "AAA": {"value": 12.0, "updateUnixTime": 1700000000},
                "BBB": {"updateUnixTime": 1700000000},
                "CCC": null
            }
        }"#;
        let prices = decode_multi_price(body).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices.get(&TokenAddress::new("aaa")), Some(&12.0));
        assert_eq!(prices.get(&TokenAddress::new("BBB")), Some(&0.0));
        assert!(!prices.contains_key(&TokenAddress::new("CCC")));
    }

    #[test]
    fn test_decode_multi_price_failures() {
        let rejected = decode_multi_price(r#"{"success": false, "message": "Unauthorized"}"#);
        assert_eq!(rejected, Err(OracleError::Rejected("Unauthorized".to_string())));

        let missing_data = decode_multi_price(r#"{"success": true}"#);
        assert!(matches!(missing_data, Err(OracleError::InvalidResponse(_))));

        let garbage = decode_multi_price("<html>bad gateway</html>");
        assert!(matches!(garbage, Err(OracleError::InvalidResponse(_))));
    }

    #[test]
    fn test_decode_token_overview_defaults() {
        let body = r#"{
            "success": true,
            "data": {"symbol": "", "price": 1.5, "logo": "https://img/x.png", "decimals": 6}
        }"#;
        let overview = decode_token_overview(body).unwrap();
        assert_eq!(overview.name, "Unknown");
        assert_eq!(overview.symbol, "Unknown");
        assert_eq!(overview.decimals, 6);
        assert_eq!(overview.price, 1.5);
        assert_eq!(overview.logo_uri.as_deref(), Some("https://img/x.png"));

        let missing = decode_token_overview(r#"{"success": true, "data": null}"#);
        assert_eq!(
            missing,
            Err(OracleError::Rejected(
                "Failed to fetch token details from Birdeye".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_guards_run_before_network() {
        // Unroutable base URL: any network call would fail with Network
        let client = BirdeyeClient::new("http://127.0.0.1:9", "", "solana", 1, true).unwrap();
        let batch: Vec<TokenAddress> = (0..101).map(|i| TokenAddress::new(format!("T{}", i))).collect();
        assert_eq!(
            client.fetch_prices(&batch).await,
            Err(OracleError::BatchTooLarge { size: 101, max: 100 })
        );
        assert!(client.fetch_prices(&[]).await.unwrap().is_empty());

        let disabled = BirdeyeClient::new("http://127.0.0.1:9", "", "solana", 1, false).unwrap();
        assert_eq!(
            disabled.fetch_prices(&batch[..1]).await,
            Err(OracleError::Disabled)
        );
    }
}
