// Bundle persistence on SQLite
use super::database::{format_timestamp, parse_timestamp, Database};
use super::{BundleStore, StoreResult};
use crate::bundles::{Bundle, CreatorKey};
use crate::errors::StoreError;
use crate::logger::{self, LogTag};
use crate::tokens::TokenAddress;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

const BUNDLE_COLUMNS: &str = "id, title, description, image_url, token_addresses, initial_price, \
     current_price, price_change_percent, created_at, last_updated, user_id, twitter_username, is_active";

struct BundleRow {
    id: String,
    title: String,
    description: Option<String>,
    image_url: Option<String>,
    token_addresses: String,
    initial_price: f64,
    current_price: f64,
    price_change_percent: f64,
    created_at: String,
    last_updated: String,
    user_id: Option<String>,
    twitter_username: Option<String>,
    is_active: bool,
}

impl BundleRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            image_url: row.get(3)?,
            token_addresses: row.get(4)?,
            initial_price: row.get(5)?,
            current_price: row.get(6)?,
            price_change_percent: row.get(7)?,
            created_at: row.get(8)?,
            last_updated: row.get(9)?,
            user_id: row.get(10)?,
            twitter_username: row.get(11)?,
            is_active: row.get(12)?,
        })
    }

    fn into_bundle(self) -> StoreResult<Bundle> {
        let token_addresses: Vec<TokenAddress> = serde_json::from_str(&self.token_addresses)?;

        Ok(Bundle {
            id: self.id,
            title: self.title,
            description: self.description,
            image_url: self.image_url,
            token_addresses,
            initial_price: self.initial_price,
            current_price: self.current_price,
            price_change_percent: self.price_change_percent,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            last_updated: parse_timestamp("last_updated", &self.last_updated)?,
            user_id: self.user_id,
            twitter_username: self.twitter_username,
            is_active: self.is_active,
        })
    }
}

fn collect_bundles(rows: Vec<BundleRow>) -> StoreResult<Vec<Bundle>> {
    rows.into_iter().map(BundleRow::into_bundle).collect()
}

fn query_bundles<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> StoreResult<Vec<BundleRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, BundleRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[async_trait]
impl BundleStore for Database {
    async fn list_all(&self) -> StoreResult<Vec<Bundle>> {
        let rows = self
            .with_connection(|conn| {
                query_bundles(
                    conn,
                    &format!("SELECT {} FROM bundles ORDER BY created_at", BUNDLE_COLUMNS),
                    [],
                )
            })
            .await?;

        collect_bundles(rows)
    }

    async fn update_metrics(
        &self,
        bundle_id: &str,
        current_price: f64,
        price_change_percent: f64,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<()> {
        let id = bundle_id.to_string();
        let changed = self
            .with_connection(move |conn| {
                Ok(conn.execute(
                    "UPDATE bundles SET current_price = ?1, price_change_percent = ?2, last_updated = ?3
                     WHERE id = ?4",
                    params![
                        current_price,
                        price_change_percent,
                        format_timestamp(&timestamp),
                        id
                    ],
                )?)
            })
            .await?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "Bundle",
                key: bundle_id.to_string(),
            });
        }
        Ok(())
    }

    async fn insert(&self, bundle: &Bundle) -> StoreResult<()> {
        let token_addresses = serde_json::to_string(&bundle.token_addresses)?;
        let row = bundle.clone();

        self.with_connection(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO bundles ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    BUNDLE_COLUMNS
                ),
                params![
                    row.id,
                    row.title,
                    row.description,
                    row.image_url,
                    token_addresses,
                    row.initial_price,
                    row.current_price,
                    row.price_change_percent,
                    format_timestamp(&row.created_at),
                    format_timestamp(&row.last_updated),
                    row.user_id,
                    row.twitter_username,
                    row.is_active,
                ],
            )?;
            Ok(())
        })
        .await?;

        logger::debug(
            LogTag::Database,
            &format!("Inserted bundle {} ({})", bundle.id, bundle.title),
        );
        Ok(())
    }

    async fn get(&self, bundle_id: &str) -> StoreResult<Option<Bundle>> {
        let id = bundle_id.to_string();
        let row = self
            .with_connection(move |conn| {
                Ok(conn
                    .query_row(
                        &format!("SELECT {} FROM bundles WHERE id = ?1", BUNDLE_COLUMNS),
                        params![id],
                        BundleRow::from_row,
                    )
                    .optional()?)
            })
            .await?;

        row.map(BundleRow::into_bundle).transpose()
    }

    async fn list_active(&self, user_id: Option<&str>) -> StoreResult<Vec<Bundle>> {
        let user_id = user_id.map(str::to_string);
        let rows = self
            .with_connection(move |conn| match user_id {
                Some(user_id) => query_bundles(
                    conn,
                    &format!(
                        "SELECT {} FROM bundles WHERE is_active = 1 AND user_id = ?1
                         ORDER BY created_at DESC",
                        BUNDLE_COLUMNS
                    ),
                    params![user_id],
                ),
                None => query_bundles(
                    conn,
                    &format!(
                        "SELECT {} FROM bundles WHERE is_active = 1 ORDER BY created_at DESC",
                        BUNDLE_COLUMNS
                    ),
                    [],
                ),
            })
            .await?;

        collect_bundles(rows)
    }

    async fn count_active_by_creator(&self, creator: &CreatorKey) -> StoreResult<usize> {
        let (column, value) = match creator {
            CreatorKey::UserId(id) => ("user_id", id.clone()),
            CreatorKey::TwitterUsername(name) => ("twitter_username", name.clone()),
        };

        let count: i64 = self
            .with_connection(move |conn| {
                Ok(conn.query_row(
                    &format!(
                        "SELECT COUNT(*) FROM bundles WHERE is_active = 1 AND {} = ?1",
                        column
                    ),
                    params![value],
                    |row| row.get(0),
                )?)
            })
            .await?;

        Ok(count.max(0) as usize)
    }

    async fn deactivate(&self, bundle_id: &str) -> StoreResult<()> {
        let id = bundle_id.to_string();
        let changed = self
            .with_connection(move |conn| {
                Ok(conn.execute("UPDATE bundles SET is_active = 0 WHERE id = ?1", params![id])?)
            })
            .await?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "Bundle",
                key: bundle_id.to_string(),
            });
        }
        Ok(())
    }

    async fn deactivate_all(&self) -> StoreResult<usize> {
        let changed = self
            .with_connection(|conn| {
                Ok(conn.execute("UPDATE bundles SET is_active = 0 WHERE is_active = 1", [])?)
            })
            .await?;

        logger::info(
            LogTag::Database,
            &format!("Deactivated {} bundles", changed),
        );
        Ok(changed)
    }
}
