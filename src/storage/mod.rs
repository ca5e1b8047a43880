//! Persistence contracts and the SQLite implementation
//!
//! The pipeline only talks to [`TokenStore`] and [`BundleStore`]; the
//! [`Database`] type implements those and [`UserStore`] on one SQLite file.

pub mod bundles;
pub mod database;
pub mod tokens;
pub mod users;

pub use database::Database;

use crate::bundles::{Bundle, CreatorKey};
use crate::errors::StoreError;
use crate::tokens::{Token, TokenAddress};
use crate::users::{UserProfile, UserUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable token records keyed by address (case-insensitive)
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn list_all(&self) -> StoreResult<Vec<Token>>;

    /// Idempotent, last write wins
    async fn update_price(
        &self,
        address: &TokenAddress,
        new_price: f64,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn get(&self, address: &TokenAddress) -> StoreResult<Option<Token>>;

    /// Records for the given addresses; unknown addresses are skipped
    async fn get_many(&self, addresses: &[TokenAddress]) -> StoreResult<Vec<Token>>;

    /// Insert or replace the full record
    async fn upsert(&self, token: &Token) -> StoreResult<()>;
}

/// Durable bundle records keyed by generated id
#[async_trait]
pub trait BundleStore: Send + Sync {
    async fn list_all(&self) -> StoreResult<Vec<Bundle>>;

    async fn update_metrics(
        &self,
        bundle_id: &str,
        current_price: f64,
        price_change_percent: f64,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn insert(&self, bundle: &Bundle) -> StoreResult<()>;

    async fn get(&self, bundle_id: &str) -> StoreResult<Option<Bundle>>;

    /// Active bundles, newest first, optionally restricted to one creator
    async fn list_active(&self, user_id: Option<&str>) -> StoreResult<Vec<Bundle>>;

    /// Active bundles attributed to `creator`
    async fn count_active_by_creator(&self, creator: &CreatorKey) -> StoreResult<usize>;

    /// Soft delete; `NotFound` when no bundle has this id
    async fn deactivate(&self, bundle_id: &str) -> StoreResult<()>;

    /// Soft-delete every bundle; returns how many changed
    async fn deactivate_all(&self) -> StoreResult<usize>;
}

/// Creator profiles keyed by external user id
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert with zero rewards, or overwrite only the fields `update` carries.
    /// `login_at` becomes `lastLoginAt` either way and `createdAt` on insert.
    async fn upsert(
        &self,
        user_id: &str,
        update: &UserUpdate,
        login_at: DateTime<Utc>,
    ) -> StoreResult<UserProfile>;

    async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Option<UserProfile>>;

    /// Case-insensitive match on the Twitter handle
    async fn find_by_twitter_username(&self, username: &str)
        -> StoreResult<Option<UserProfile>>;
}
