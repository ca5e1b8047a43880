/// Core token types
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

// ============================================================================
// TOKEN ADDRESS
// ============================================================================

/// On-chain token address
///
/// Equality and hashing ignore ASCII case; the original spelling is kept for
/// display, storage and oracle requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenAddress(String);

impl TokenAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl PartialEq for TokenAddress {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for TokenAddress {}

impl Hash for TokenAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TokenAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TokenAddress {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TokenAddress {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// TOKEN
// ============================================================================

/// A tracked token with its latest known USD price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub address: TokenAddress,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// USD, never negative
    pub price: f64,
    #[serde(rename = "logoURI", skip_serializing_if = "Option::is_none", default)]
    pub logo_uri: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl Token {
    /// Age of the stored price data
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_updated
    }
}

/// Prices are USD floats; anything negative or non-finite is rejected
pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price >= 0.0
}
