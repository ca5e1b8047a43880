/// Price-update cycle states
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CycleState {
    Idle = 0,
    LoadingTokens = 1,
    BatchingPrices = 2,
    UpdatingTokenStore = 3,
    RecomputingBundles = 4,
    UpdatingBundleStore = 5,
    Broadcasting = 6,
}

impl CycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleState::Idle => "idle",
            CycleState::LoadingTokens => "loading_tokens",
            CycleState::BatchingPrices => "batching_prices",
            CycleState::UpdatingTokenStore => "updating_token_store",
            CycleState::RecomputingBundles => "recomputing_bundles",
            CycleState::UpdatingBundleStore => "updating_bundle_store",
            CycleState::Broadcasting => "broadcasting",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => CycleState::LoadingTokens,
            2 => CycleState::BatchingPrices,
            3 => CycleState::UpdatingTokenStore,
            4 => CycleState::RecomputingBundles,
            5 => CycleState::UpdatingBundleStore,
            6 => CycleState::Broadcasting,
            _ => CycleState::Idle,
        }
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock-free holder for the current state
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(CycleState::Idle as u8))
    }

    pub fn get(&self) -> CycleState {
        CycleState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Store `next`, returning the previous state
    pub fn set(&self, next: CycleState) -> CycleState {
        CycleState::from_u8(self.0.swap(next as u8, Ordering::AcqRel))
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
