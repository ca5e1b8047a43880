/// Birdeye API response types
use serde::Deserialize;
use std::collections::HashMap;

/// `POST /defi/multi_price`
#[derive(Debug, Clone, Deserialize)]
pub struct MultiPriceResponse {
    #[serde(default)]
    pub success: bool,
    /// Keyed by address; unknown tokens come back as `null`
    #[serde(default)]
    pub data: Option<HashMap<String, Option<PriceEntry>>>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntry {
    #[serde(default)]
    pub value: Option<f64>,
}

/// `GET /defi/token_overview`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenOverviewResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<TokenOverviewData>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenOverviewData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub decimals: Option<i64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, rename = "logoURI")]
    pub logo_uri: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}
