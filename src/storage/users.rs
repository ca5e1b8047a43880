// User profile persistence on SQLite
use super::database::{format_timestamp, parse_timestamp, Database};
use super::{StoreResult, UserStore};
use crate::errors::StoreError;
use crate::users::{UserProfile, UserUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_COLUMNS: &str = "user_id, twitter_username, twitter_profile_image_url, email, \
     display_name, solana_address, total_rewards, created_at, last_login_at";

struct UserRow {
    user_id: String,
    twitter_username: Option<String>,
    twitter_profile_image_url: Option<String>,
    email: Option<String>,
    display_name: Option<String>,
    solana_address: Option<String>,
    total_rewards: f64,
    created_at: String,
    last_login_at: String,
}

impl UserRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            twitter_username: row.get(1)?,
            twitter_profile_image_url: row.get(2)?,
            email: row.get(3)?,
            display_name: row.get(4)?,
            solana_address: row.get(5)?,
            total_rewards: row.get(6)?,
            created_at: row.get(7)?,
            last_login_at: row.get(8)?,
        })
    }

    fn into_profile(self) -> StoreResult<UserProfile> {
        Ok(UserProfile {
            user_id: self.user_id,
            twitter_username: self.twitter_username,
            twitter_profile_image_url: self.twitter_profile_image_url,
            email: self.email,
            display_name: self.display_name,
            solana_address: self.solana_address,
            total_rewards: self.total_rewards,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            last_login_at: parse_timestamp("last_login_at", &self.last_login_at)?,
        })
    }
}

fn query_user(conn: &Connection, filter: &str, value: &str) -> StoreResult<Option<UserRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE {} LIMIT 1", USER_COLUMNS, filter),
            params![value],
            UserRow::from_row,
        )
        .optional()?;
    Ok(row)
}

#[async_trait]
impl UserStore for Database {
    async fn upsert(
        &self,
        user_id: &str,
        update: &UserUpdate,
        login_at: DateTime<Utc>,
    ) -> StoreResult<UserProfile> {
        let user_id = user_id.to_string();
        let update = update.clone();
        let login_at = format_timestamp(&login_at);

        let row = self
            .with_connection(move |conn| {
                conn.execute(
                    "INSERT INTO users (user_id, twitter_username, twitter_profile_image_url,
                         email, display_name, solana_address, total_rewards, created_at, last_login_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?7)
                     ON CONFLICT(user_id) DO UPDATE SET
                         twitter_username = COALESCE(excluded.twitter_username, users.twitter_username),
                         twitter_profile_image_url = COALESCE(excluded.twitter_profile_image_url, users.twitter_profile_image_url),
                         email = COALESCE(excluded.email, users.email),
                         display_name = COALESCE(excluded.display_name, users.display_name),
                         solana_address = COALESCE(excluded.solana_address, users.solana_address),
                         last_login_at = excluded.last_login_at",
                    params![
                        user_id,
                        update.twitter_username,
                        update.twitter_profile_image_url,
                        update.email,
                        update.display_name,
                        update.solana_address,
                        login_at,
                    ],
                )?;
                query_user(conn, "user_id = ?1", &user_id)?
                    .ok_or_else(|| StoreError::NotFound {
                        entity: "User",
                        key: user_id.clone(),
                    })
            })
            .await?;

        row.into_profile()
    }

    async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        let user_id = user_id.to_string();
        self.with_connection(move |conn| query_user(conn, "user_id = ?1", &user_id))
            .await?
            .map(UserRow::into_profile)
            .transpose()
    }

    async fn find_by_twitter_username(
        &self,
        username: &str,
    ) -> StoreResult<Option<UserProfile>> {
        let username = username.to_string();
        self.with_connection(move |conn| {
            query_user(conn, "twitter_username = ?1 COLLATE NOCASE", &username)
        })
        .await?
        .map(UserRow::into_profile)
        .transpose()
    }
}
