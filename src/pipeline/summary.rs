/// Cycle results
use crate::broadcast::{UpdatedBundle, UpdatedToken};
use crate::tokens::TokenAddress;
use serde::Serialize;

pub const NO_TOKENS_MESSAGE: &str = "No tokens found to update";

/// A non-fatal failure recorded during a cycle
///
/// Batch-level failures carry neither an address nor a bundle id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<TokenAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    pub error: String,
}

impl ErrorDetail {
    pub fn batch(error: impl Into<String>) -> Self {
        Self {
            address: None,
            bundle_id: None,
            error: error.into(),
        }
    }

    pub fn token(address: TokenAddress, error: impl Into<String>) -> Self {
        Self {
            address: Some(address),
            bundle_id: None,
            error: error.into(),
        }
    }

    pub fn bundle(bundle_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            address: None,
            bundle_id: Some(bundle_id.into()),
            error: error.into(),
        }
    }

    pub fn is_batch_level(&self) -> bool {
        self.address.is_none() && self.bundle_id.is_none()
    }
}

/// Accumulator folded over the batches of one cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub updated_tokens: Vec<UpdatedToken>,
    pub errors: Vec<ErrorDetail>,
}

impl BatchOutcome {
    pub fn with_token(mut self, token: UpdatedToken) -> Self {
        self.updated_tokens.push(token);
        self
    }

    pub fn with_error(mut self, error: ErrorDetail) -> Self {
        self.errors.push(error);
        self
    }
}

/// Result of a completed cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    pub success: bool,
    pub updated: usize,
    pub errors: usize,
    pub updated_tokens: Vec<UpdatedToken>,
    pub error_details: Vec<ErrorDetail>,
    pub updated_bundles: Vec<UpdatedBundle>,
    pub duration_ms: u64,
}

impl CycleSummary {
    pub fn new(
        outcome: BatchOutcome,
        bundle_errors: Vec<ErrorDetail>,
        updated_bundles: Vec<UpdatedBundle>,
        duration_ms: u64,
    ) -> Self {
        let BatchOutcome {
            updated_tokens,
            mut errors,
        } = outcome;
        errors.extend(bundle_errors);

        Self {
            success: true,
            updated: updated_tokens.len(),
            errors: errors.len(),
            updated_tokens,
            error_details: errors,
            updated_bundles,
            duration_ms,
        }
    }
}

/// What `run_cycle` hands back to the trigger
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CycleOutcome {
    /// The token store was empty; nothing was fetched or written
    NoTokens { success: bool, message: String },
    Completed(CycleSummary),
}

impl CycleOutcome {
    pub fn no_tokens() -> Self {
        CycleOutcome::NoTokens {
            success: true,
            message: NO_TOKENS_MESSAGE.to_string(),
        }
    }

    pub fn summary(&self) -> Option<&CycleSummary> {
        match self {
            CycleOutcome::Completed(summary) => Some(summary),
            CycleOutcome::NoTokens { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_tokens_shape() {
        assert_eq!(
            serde_json::to_value(CycleOutcome::no_tokens()).unwrap(),
            json!({"success": true, "message": "No tokens found to update"})
        );
    }

    #[test]
    fn test_summary_counts_and_shape() {
        let outcome = BatchOutcome::default()
            .with_token(UpdatedToken {
                address: "A".into(),
                symbol: "AAA".to_string(),
                price: 1.0,
            })
            .with_error(ErrorDetail::batch("Request failed: timeout"))
            .with_error(ErrorDetail::token("B".into(), "Invalid price: NaN"));
        let summary = CycleSummary::new(outcome, vec![ErrorDetail::bundle("b1", "locked")], vec![], 42);

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.errors, 3);

        let value = serde_json::to_value(CycleOutcome::Completed(summary)).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["errorDetails"][0], json!({"error": "Request failed: timeout"}));
        assert_eq!(value["errorDetails"][1]["address"], "B");
        assert_eq!(value["errorDetails"][2]["bundleId"], "b1");
        assert_eq!(value["durationMs"], 42);
        assert!(value.get("updatedBundles").is_some());
    }
}
