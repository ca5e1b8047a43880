/// Bundle metrics recomputation
///
/// Pure functions: no I/O, same inputs give the same outputs. Values are raw
/// USD floats; rounding is left to whoever displays them.
use crate::bundles::Bundle;
use crate::tokens::TokenAddress;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleMetrics {
    pub current_price: f64,
    pub price_change_percent: f64,
}

/// Aggregate value of `bundle` under `token_prices`
///
/// Members missing from the map contribute 0 (the bundle is undervalued by
/// that member, it is not an error).
pub fn recompute(bundle: &Bundle, token_prices: &HashMap<TokenAddress, f64>) -> BundleMetrics {
    let current_price: f64 = bundle
        .token_addresses
        .iter()
        .map(|address| token_prices.get(address).copied().unwrap_or(0.0))
        .sum();

    BundleMetrics {
        current_price,
        price_change_percent: price_change_percent(current_price, bundle.initial_price),
    }
}

/// Percent change from `initial_price`; 0 when `initial_price` is 0
pub fn price_change_percent(current_price: f64, initial_price: f64) -> f64 {
    if initial_price == 0.0 {
        return 0.0;
    }
    ((current_price - initial_price) / initial_price) * 100.0
}
