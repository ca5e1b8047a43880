/// Bundle ("token index") types
use crate::tokens::TokenAddress;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named basket of token addresses tracked against its value at creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image_url: Option<String>,
    pub token_addresses: Vec<TokenAddress>,
    /// Sum of member prices at creation; never rewritten
    pub initial_price: f64,
    pub current_price: f64,
    pub price_change_percent: f64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub twitter_username: Option<String>,
    pub is_active: bool,
}

/// Request payload for creating a bundle
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBundle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub token_addresses: Vec<TokenAddress>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub twitter_username: Option<String>,
}

impl NewBundle {
    /// Who the per-creator cap is counted against; the user id wins over the handle
    pub fn creator_key(&self) -> Option<CreatorKey> {
        let non_empty = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        non_empty(&self.user_id)
            .map(CreatorKey::UserId)
            .or_else(|| non_empty(&self.twitter_username).map(CreatorKey::TwitterUsername))
    }
}

/// Identity a bundle is attributed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatorKey {
    UserId(String),
    TwitterUsername(String),
}

/// Optional body of a delete request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBundle {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creator_key_prefers_user_id() {
        let mut request = NewBundle {
            user_id: Some("  ".to_string()),
            twitter_username: Some("handle".to_string()),
            ..NewBundle::default()
        };
        assert_eq!(
            request.creator_key(),
            Some(CreatorKey::TwitterUsername("handle".to_string()))
        );

        request.user_id = Some("u1".to_string());
        assert_eq!(request.creator_key(), Some(CreatorKey::UserId("u1".to_string())));

        assert_eq!(NewBundle::default().creator_key(), None);
    }
}
