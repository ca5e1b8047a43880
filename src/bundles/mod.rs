/// Bundles ("token indexes"): types and creation/listing service
pub mod service;
pub mod types;

pub use service::{BundleDetail, BundleDetailMetrics, BundleService};
pub use types::{Bundle, CreatorKey, DeleteBundle, NewBundle};
