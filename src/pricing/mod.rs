//! Bundle valuation

pub mod metrics;

pub use metrics::{price_change_percent, recompute, BundleMetrics};
