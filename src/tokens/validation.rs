/// Solana address validation
use once_cell::sync::Lazy;
use regex::Regex;

/// Base58 alphabet, 32 to 44 characters
static SOLANA_ADDRESS_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").ok());

/// True if `address` looks like a Solana public key and decodes to 32 bytes
pub fn is_valid_solana_address(address: &str) -> bool {
    let matches_format = SOLANA_ADDRESS_RE
        .as_ref()
        .map(|re| re.is_match(address))
        .unwrap_or(false);

    if !matches_format {
        return false;
    }

    matches!(bs58::decode(address).into_vec(), Ok(bytes) if bytes.len() == 32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        assert!(is_valid_solana_address(
            "So11111111111111111111111111111111111111112"
        ));
        assert!(is_valid_solana_address(
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
        ));
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(!is_valid_solana_address(""));
        assert!(!is_valid_solana_address("0x1234"));
        // '0', 'O', 'I' and 'l' are not in the base58 alphabet
        assert!(!is_valid_solana_address(
            "O011111111111111111111111111111111111111112"
        ));
        // Right charset, wrong decoded length
        assert!(!is_valid_solana_address("11111111111111111111111111111111111"));
    }
}
