/// Error types for IndexBoard
///
/// Every fallible library operation returns one of these enums. The route
/// layer maps them to HTTP statuses; the binaries wrap them in `anyhow`.
use thiserror::Error;

// =============================================================================
// PRICE ORACLE
// =============================================================================

/// Failure of one oracle call. Always batch-level: no partial success.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("Price oracle disabled via configuration")]
    Disabled,

    #[error("Too many addresses in one batch: {size} (max {max})")]
    BatchTooLarge { size: usize, max: usize },

    #[error("Request failed: {0}")]
    Network(String),

    #[error("Birdeye API request failed with status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    InvalidResponse(String),

    /// The oracle answered but reported `success: false`
    #[error("{0}")]
    Rejected(String),
}

// =============================================================================
// STORAGE
// =============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to lock connection: {0}")]
    Lock(String),

    #[error("Database task failed: {0}")]
    Task(String),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Invalid stored value in column '{column}': {value}")]
    InvalidValue { column: &'static str, value: String },
}

// =============================================================================
// PRICE-UPDATE CYCLE
// =============================================================================

/// Fatal cycle outcomes. Everything else is reported inside the summary.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("Failed to load tokens: {0}")]
    TokenLoad(#[source] StoreError),

    #[error("Failed to load bundles: {0}")]
    BundleLoad(#[source] StoreError),

    #[error("A price update cycle is already running")]
    AlreadyRunning,
}

// =============================================================================
// BUNDLES
// =============================================================================

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Title and token addresses array are required")]
    MissingTitle,

    #[error("Bundle must contain at least {min} tokens")]
    TooFewTokens { min: usize, actual: usize },

    #[error("Bundle cannot contain more than {max} tokens")]
    TooManyTokens { max: usize, actual: usize },

    #[error("Duplicate token address in bundle: {0}")]
    DuplicateToken(String),

    #[error("One or more token addresses are invalid or not in the database")]
    UnknownTokens(Vec<String>),

    #[error("You have reached the maximum limit of {max} active bundles per user for this leaderboard session")]
    CreatorLimit { max: usize },

    #[error("You are not authorized to delete this bundle")]
    Forbidden,

    #[error("Bundle not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BundleError {
    /// Caller mistakes, as opposed to storage failures
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            BundleError::Store(_) | BundleError::NotFound(_) | BundleError::Forbidden
        )
    }
}

// =============================================================================
// USERS
// =============================================================================

#[derive(Error, Debug)]
pub enum UserError {
    #[error("User ID is required")]
    MissingUserId,

    #[error("Either userId or twitterUsername is required")]
    MissingLookupKey,

    #[error("User not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

// =============================================================================
// TOKEN LOOKUP
// =============================================================================

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Invalid Solana token address format")]
    InvalidAddress(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
