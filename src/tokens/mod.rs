/// Tracked tokens: core types, address validation and detail lookup
pub mod lookup;
pub mod types;
pub mod validation;

pub use lookup::{LookupSource, TokenLookup, TokenLookupResult, MAX_FRESHNESS_HOURS};
pub use types::{is_valid_price, Token, TokenAddress};
pub use validation::is_valid_solana_address;
