//! Price-update pipeline

pub mod batching;
pub mod orchestrator;
pub mod state;
pub mod summary;

pub use batching::{batch_count, partition};
pub use orchestrator::{PriceUpdater, UpdaterSettings};
pub use state::CycleState;
pub use summary::{BatchOutcome, CycleOutcome, CycleSummary, ErrorDetail, NO_TOKENS_MESSAGE};
