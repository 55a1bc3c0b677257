//! Form trigger token generation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;

/// Number of raw random bytes behind a generated token. 24 bytes
/// base64url-encodes (no padding) to a fresh 32-character URL-safe token.
const TOKEN_BYTES: usize = 24;

/// Generate a fresh, URL-safe, 32-character token.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_token_is_32_chars() {
        assert_eq!(generate_token().len(), 32);
    }

    #[test]
    fn generated_token_is_url_safe() {
        let token = generate_token();
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn tokens_are_not_repeated() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
    }
}
