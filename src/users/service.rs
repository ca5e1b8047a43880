/// Profile upsert on login and lookup by id or handle
use super::types::{UserLookup, UserProfile, UserUpdate};
use crate::errors::UserError;
use crate::logger::{self, LogTag};
use crate::storage::UserStore;
use chrono::Utc;
use std::sync::Arc;

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Create or refresh a profile; the login time is always bumped
    pub async fn sync(&self, update: UserUpdate) -> Result<UserProfile, UserError> {
        let user_id = non_empty(update.user_id.clone()).ok_or(UserError::MissingUserId)?;
        let update = UserUpdate {
            user_id: Some(user_id.clone()),
            twitter_username: non_empty(update.twitter_username),
            twitter_profile_image_url: non_empty(update.twitter_profile_image_url),
            email: non_empty(update.email),
            display_name: non_empty(update.display_name),
            solana_address: non_empty(update.solana_address),
        };

        let profile = self.store.upsert(&user_id, &update, Utc::now()).await?;
        logger::debug(
            LogTag::Users,
            &format!("Synced profile for user {}", profile.user_id),
        );
        Ok(profile)
    }

    /// By user id when given, otherwise by Twitter handle
    pub async fn find(&self, query: UserLookup) -> Result<UserProfile, UserError> {
        let found = match (non_empty(query.user_id), non_empty(query.twitter_username)) {
            (Some(user_id), _) => self.store.find_by_user_id(&user_id).await?,
            (None, Some(handle)) => self.store.find_by_twitter_username(&handle).await?,
            (None, None) => return Err(UserError::MissingLookupKey),
        };
        found.ok_or(UserError::NotFound)
    }
}
