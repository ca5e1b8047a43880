/// Bundle creation, listing, leaderboard and reset
use super::types::{Bundle, NewBundle};
use crate::broadcast::{BroadcastEvent, Broadcaster};
use crate::config::BundlesConfig;
use crate::errors::BundleError;
use crate::logger::{self, LogTag};
use crate::storage::{BundleStore, TokenStore};
use crate::tokens::{Token, TokenAddress};
use chrono::Utc;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Stored metrics next to the live sum of member prices
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleDetailMetrics {
    pub initial_price: f64,
    pub current_price: f64,
    pub price_change_percent: f64,
    pub total_price: f64,
    pub token_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BundleDetail {
    pub bundle: Bundle,
    pub tokens: Vec<Token>,
    pub metrics: BundleDetailMetrics,
}

pub struct BundleService {
    token_store: Arc<dyn TokenStore>,
    bundle_store: Arc<dyn BundleStore>,
    broadcaster: Arc<dyn Broadcaster>,
    min_tokens: usize,
    max_tokens: usize,
    max_active_per_creator: usize,
}

impl BundleService {
    pub fn new(
        token_store: Arc<dyn TokenStore>,
        bundle_store: Arc<dyn BundleStore>,
        broadcaster: Arc<dyn Broadcaster>,
        limits: &BundlesConfig,
    ) -> Self {
        Self {
            token_store,
            bundle_store,
            broadcaster,
            min_tokens: limits.min_tokens,
            max_tokens: limits.max_tokens,
            max_active_per_creator: limits.max_active_per_creator,
        }
    }

    /// Validate and store a new bundle valued at the current member prices
    pub async fn create(&self, request: NewBundle) -> Result<Bundle, BundleError> {
        let title = request.title.trim().to_string();
        if title.is_empty() || request.token_addresses.is_empty() {
            return Err(BundleError::MissingTitle);
        }

        let count = request.token_addresses.len();
        if count < self.min_tokens {
            return Err(BundleError::TooFewTokens {
                min: self.min_tokens,
                actual: count,
            });
        }
        if count > self.max_tokens {
            return Err(BundleError::TooManyTokens {
                max: self.max_tokens,
                actual: count,
            });
        }

        let mut seen = HashSet::with_capacity(count);
        for address in &request.token_addresses {
            if !seen.insert(address) {
                return Err(BundleError::DuplicateToken(address.to_string()));
            }
        }

        if self.max_active_per_creator > 0 {
            if let Some(creator) = request.creator_key() {
                let active = self.bundle_store.count_active_by_creator(&creator).await?;
                if active >= self.max_active_per_creator {
                    return Err(BundleError::CreatorLimit {
                        max: self.max_active_per_creator,
                    });
                }
            }
        }

        let members = self.token_store.get_many(&request.token_addresses).await?;
        let known: HashMap<&TokenAddress, f64> =
            members.iter().map(|t| (&t.address, t.price)).collect();

        let unknown: Vec<String> = request
            .token_addresses
            .iter()
            .filter(|a| !known.contains_key(a))
            .map(|a| a.to_string())
            .collect();
        if !unknown.is_empty() {
            return Err(BundleError::UnknownTokens(unknown));
        }

        let initial_price: f64 = members.iter().map(|t| t.price).sum();
        let now = Utc::now();

        let bundle = Bundle {
            id: uuid::Uuid::new_v4().simple().to_string(),
            title,
            description: request.description.filter(|d| !d.trim().is_empty()),
            image_url: request.image_url.filter(|u| !u.trim().is_empty()),
            token_addresses: request.token_addresses,
            initial_price,
            current_price: initial_price,
            price_change_percent: 0.0,
            created_at: now,
            last_updated: now,
            user_id: request.user_id,
            twitter_username: request.twitter_username,
            is_active: true,
        };

        self.bundle_store.insert(&bundle).await?;
        logger::info(
            LogTag::Bundles,
            &format!(
                "Created bundle '{}' ({} tokens, initial {:.6})",
                bundle.title,
                bundle.token_addresses.len(),
                bundle.initial_price
            ),
        );

        self.broadcaster.publish(BroadcastEvent::BundleCreated {
            bundle: bundle.clone(),
        });

        Ok(bundle)
    }

    pub async fn get(&self, id: &str) -> Result<Bundle, BundleError> {
        self.bundle_store
            .get(id)
            .await?
            .ok_or_else(|| BundleError::NotFound(id.to_string()))
    }

    /// Bundle with its member tokens
    pub async fn detail(&self, id: &str) -> Result<BundleDetail, BundleError> {
        let bundle = self.get(id).await?;
        let tokens = self.token_store.get_many(&bundle.token_addresses).await?;
        let total_price: f64 = tokens.iter().map(|t| t.price).sum();

        Ok(BundleDetail {
            metrics: BundleDetailMetrics {
                initial_price: bundle.initial_price,
                current_price: bundle.current_price,
                price_change_percent: bundle.price_change_percent,
                total_price,
                token_count: tokens.len(),
            },
            bundle,
            tokens,
        })
    }

    /// Active bundles newest first, optionally only one creator's
    pub async fn list(&self, user_id: Option<&str>) -> Result<Vec<Bundle>, BundleError> {
        let user_id = user_id.map(str::trim).filter(|u| !u.is_empty());
        Ok(self.bundle_store.list_active(user_id).await?)
    }

    /// Retire a bundle. A requester that names a different owner is refused.
    pub async fn delete(&self, id: &str, requester: Option<&str>) -> Result<(), BundleError> {
        let bundle = self.get(id).await?;

        let requester = requester.map(str::trim).filter(|u| !u.is_empty());
        if let (Some(requester), Some(owner)) = (requester, bundle.user_id.as_deref()) {
            if requester != owner {
                logger::warning(
                    LogTag::Bundles,
                    &format!("Refused delete of bundle {} by {}", id, requester),
                );
                return Err(BundleError::Forbidden);
            }
        }

        self.bundle_store.deactivate(id).await?;
        logger::info(
            LogTag::Bundles,
            &format!("Deleted bundle '{}' ({})", bundle.title, bundle.id),
        );
        Ok(())
    }

    /// Active bundles, best performers first
    pub async fn leaderboard(&self, limit: Option<usize>) -> Result<Vec<Bundle>, BundleError> {
        let mut active: Vec<Bundle> = self
            .bundle_store
            .list_all()
            .await?
            .into_iter()
            .filter(|b| b.is_active)
            .collect();

        active.sort_by(|a, b| {
            b.price_change_percent
                .partial_cmp(&a.price_change_percent)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        if let Some(limit) = limit {
            active.truncate(limit);
        }
        Ok(active)
    }

    /// Mark every bundle inactive; returns how many changed
    pub async fn reset_leaderboard(&self) -> Result<usize, BundleError> {
        let count = self.bundle_store.deactivate_all().await?;
        logger::info(
            LogTag::Bundles,
            &format!("Leaderboard reset, {} bundles marked inactive", count),
        );
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::ChannelBroadcaster;
    use crate::storage::Database;

    async fn setup() -> (Arc<Database>, ChannelBroadcaster, BundleService) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        for (i, price) in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0].iter().enumerate() {
            db.upsert(&Token {
                address: TokenAddress::new(format!("T{}", i)),
                name: format!("Token {}", i),
                symbol: format!("T{}", i),
                decimals: 6,
                price: *price,
                logo_uri: None,
                last_updated: Utc::now(),
            })
            .await
            .unwrap();
        }
        let broadcaster = ChannelBroadcaster::new(4);
        let service = BundleService::new(
            db.clone(),
            db.clone(),
            Arc::new(broadcaster.clone()),
            &BundlesConfig::default(),
        );
        (db, broadcaster, service)
    }

    fn request(addresses: &[&str]) -> NewBundle {
        NewBundle {
            title: "  Blue chips ".to_string(),
            token_addresses: addresses.iter().map(|a| TokenAddress::new(*a)).collect(),
            user_id: Some("u1".to_string()),
            ..NewBundle::default()
        }
    }

    #[tokio::test]
    async fn test_create_values_bundle_and_broadcasts() {
        let (_, broadcaster, service) = setup().await;
        let mut events = broadcaster.subscribe();

        let bundle = service
            .create(request(&["T0", "T1", "T2", "T3", "t4"]))
            .await
            .unwrap();
        assert_eq!(bundle.title, "Blue chips");
        assert_eq!(bundle.initial_price, 15.0);
        assert_eq!(bundle.current_price, 15.0);
        assert_eq!(bundle.price_change_percent, 0.0);
        assert!(bundle.is_active);

        let event = events.recv().await.unwrap();
        assert_eq!(event.name(), "bundle:created");

        let detail = service.detail(&bundle.id).await.unwrap();
        assert_eq!(detail.bundle.id, bundle.id);
        assert_eq!(detail.tokens.len(), 5);
        assert_eq!(detail.metrics.total_price, 15.0);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (_, _, service) = setup().await;

        let mut missing_title = request(&["T0", "T1", "T2", "T3", "T4"]);
        missing_title.title = "   ".to_string();
        assert!(matches!(
            service.create(missing_title).await,
            Err(BundleError::MissingTitle)
        ));

        assert!(matches!(
            service.create(request(&["T0", "T1"])).await,
            Err(BundleError::TooFewTokens { min: 5, actual: 2 })
        ));

        let many: Vec<String> = (0..21).map(|i| format!("X{}", i)).collect();
        let many: Vec<&str> = many.iter().map(String::as_str).collect();
        assert!(matches!(
            service.create(request(&many)).await,
            Err(BundleError::TooManyTokens { max: 20, actual: 21 })
        ));

        assert!(matches!(
            service.create(request(&["T0", "T1", "T2", "T3", "t0"])).await,
            Err(BundleError::DuplicateToken(_))
        ));

        match service.create(request(&["T0", "T1", "T2", "T3", "NOPE"])).await {
            Err(BundleError::UnknownTokens(unknown)) => assert_eq!(unknown, vec!["NOPE"]),
            other => panic!("unexpected result: {:?}", other.map(|b| b.id)),
        }
    }

    #[tokio::test]
    async fn test_leaderboard_and_reset() {
        let (db, _, service) = setup().await;
        let low = service.create(request(&["T0", "T1", "T2", "T3", "T4"])).await.unwrap();
        let high = service.create(request(&["T1", "T2", "T3", "T4", "T5"])).await.unwrap();

        db.update_metrics(&low.id, 10.0, -33.0, Utc::now()).await.unwrap();
        db.update_metrics(&high.id, 40.0, 100.0, Utc::now()).await.unwrap();

        let ranked = service.leaderboard(None).await.unwrap();
        let ids: Vec<_> = ranked.iter().map(|b| b.id.clone()).collect();
        assert_eq!(ids, vec![high.id.clone(), low.id.clone()]);
        assert_eq!(service.leaderboard(Some(1)).await.unwrap().len(), 1);

        assert_eq!(service.reset_leaderboard().await.unwrap(), 2);
        assert!(service.leaderboard(None).await.unwrap().is_empty());
        assert!(service.list(Some("u1")).await.unwrap().is_empty());
        assert!(matches!(
            service.get("missing").await,
            Err(BundleError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_creator_limit_counts_active_bundles() {
        let (_, _, service) = setup().await;
        let members = ["T0", "T1", "T2", "T3", "T4"];

        let mut created = Vec::new();
        for _ in 0..5 {
            created.push(service.create(request(&members)).await.unwrap());
        }
        let err = service.create(request(&members)).await.unwrap_err();
        assert!(matches!(err, BundleError::CreatorLimit { max: 5 }));
        assert!(err.is_validation());

        // Another creator is unaffected
        let mut other = request(&members);
        other.user_id = None;
        other.twitter_username = Some("someone".to_string());
        assert!(service.create(other).await.is_ok());

        // Retiring one frees a slot
        service.delete(&created[0].id, Some("u1")).await.unwrap();
        assert!(service.create(request(&members)).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_checks_owner() {
        let (_, _, service) = setup().await;
        let bundle = service
            .create(request(&["T0", "T1", "T2", "T3", "T4"]))
            .await
            .unwrap();

        let err = service.delete(&bundle.id, Some("intruder")).await.unwrap_err();
        assert!(matches!(err, BundleError::Forbidden));
        assert!(!err.is_validation());
        assert!(service.get(&bundle.id).await.unwrap().is_active);

        service.delete(&bundle.id, None).await.unwrap();
        assert!(!service.get(&bundle.id).await.unwrap().is_active);
        assert!(service.list(None).await.unwrap().is_empty());

        assert!(matches!(
            service.delete("missing", None).await,
            Err(BundleError::NotFound(_))
        ));
    }
}
