/// Real-time event payloads
use crate::bundles::Bundle;
use crate::tokens::TokenAddress;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token whose price was written during a cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatedToken {
    pub address: TokenAddress,
    pub symbol: String,
    pub price: f64,
}

/// Bundle whose metrics were written during a cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedBundle {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub current_price: f64,
    pub price_change_percent: f64,
    pub last_updated: DateTime<Utc>,
}

/// Events pushed to subscribers
///
/// Serialized as `{"event": "<name>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum BroadcastEvent {
    #[serde(rename = "prices:updated", rename_all = "camelCase")]
    PricesUpdated {
        updated_tokens: Vec<UpdatedToken>,
        updated_bundles: Vec<UpdatedBundle>,
    },

    #[serde(rename = "bundle:created")]
    BundleCreated { bundle: Bundle },
}

impl BroadcastEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BroadcastEvent::PricesUpdated { .. } => "prices:updated",
            BroadcastEvent::BundleCreated { .. } => "bundle:created",
        }
    }

    /// JSON text frame for WebSocket clients
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
