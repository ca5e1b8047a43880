// Token persistence on SQLite
use super::database::{format_timestamp, parse_timestamp, Database};
use super::{StoreResult, TokenStore};
use crate::errors::StoreError;
use crate::logger::{self, LogTag};
use crate::tokens::{Token, TokenAddress};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

const TOKEN_COLUMNS: &str = "address, name, symbol, decimals, price, logo_uri, last_updated";

/// Row as stored, before validation
struct TokenRow {
    address: String,
    name: String,
    symbol: String,
    decimals: i64,
    price: f64,
    logo_uri: Option<String>,
    last_updated: String,
}

impl TokenRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            address: row.get(0)?,
            name: row.get(1)?,
            symbol: row.get(2)?,
            decimals: row.get(3)?,
            price: row.get(4)?,
            logo_uri: row.get(5)?,
            last_updated: row.get(6)?,
        })
    }

    fn into_token(self) -> StoreResult<Token> {
        let decimals = u8::try_from(self.decimals).map_err(|_| StoreError::InvalidValue {
            column: "decimals",
            value: self.decimals.to_string(),
        })?;

        Ok(Token {
            address: TokenAddress::new(self.address),
            name: self.name,
            symbol: self.symbol,
            decimals,
            price: self.price,
            logo_uri: self.logo_uri,
            last_updated: parse_timestamp("last_updated", &self.last_updated)?,
        })
    }
}

fn collect_tokens(rows: Vec<TokenRow>) -> StoreResult<Vec<Token>> {
    rows.into_iter().map(TokenRow::into_token).collect()
}

#[async_trait]
impl TokenStore for Database {
    async fn list_all(&self) -> StoreResult<Vec<Token>> {
        let rows = self
            .with_connection(|conn| {
                let mut stmt = conn
                    .prepare(&format!("SELECT {} FROM tokens ORDER BY symbol", TOKEN_COLUMNS))?;
                let rows = stmt
                    .query_map([], TokenRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        collect_tokens(rows)
    }

    async fn update_price(
        &self,
        address: &TokenAddress,
        new_price: f64,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<()> {
        let key = address.as_str().to_string();
        let changed = self
            .with_connection(move |conn| {
                Ok(conn.execute(
                    "UPDATE tokens SET price = ?1, last_updated = ?2 WHERE address = ?3",
                    params![new_price, format_timestamp(&timestamp), key],
                )?)
            })
            .await?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "Token",
                key: address.to_string(),
            });
        }

        if logger::is_debug_enabled(LogTag::Database) {
            logger::debug(
                LogTag::Database,
                &format!("Stored price {} for {}", new_price, address),
            );
        }
        Ok(())
    }

    async fn get(&self, address: &TokenAddress) -> StoreResult<Option<Token>> {
        let key = address.as_str().to_string();
        let row = self
            .with_connection(move |conn| {
                Ok(conn
                    .query_row(
                        &format!("SELECT {} FROM tokens WHERE address = ?1", TOKEN_COLUMNS),
                        params![key],
                        TokenRow::from_row,
                    )
                    .optional()?)
            })
            .await?;

        row.map(TokenRow::into_token).transpose()
    }

    async fn get_many(&self, addresses: &[TokenAddress]) -> StoreResult<Vec<Token>> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = addresses.iter().map(|a| a.as_str().to_string()).collect();
        let rows = self
            .with_connection(move |conn| {
                let placeholders = vec!["?"; keys.len()].join(", ");
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM tokens WHERE address IN ({})",
                    TOKEN_COLUMNS, placeholders
                ))?;
                let rows = stmt
                    .query_map(params_from_iter(keys.iter()), TokenRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        collect_tokens(rows)
    }

    async fn upsert(&self, token: &Token) -> StoreResult<()> {
        let token = token.clone();
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO tokens (address, name, symbol, decimals, price, logo_uri, last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(address) DO UPDATE SET
                    name = excluded.name,
                    symbol = excluded.symbol,
                    decimals = excluded.decimals,
                    price = excluded.price,
                    logo_uri = excluded.logo_uri,
                    last_updated = excluded.last_updated",
                params![
                    token.address.as_str(),
                    token.name,
                    token.symbol,
                    token.decimals as i64,
                    token.price,
                    token.logo_uri,
                    format_timestamp(&token.last_updated),
                ],
            )?;
            Ok(())
        })
        .await
    }
}
