//! Cryptographic utilities for invitation token generation and hashing.

use sha2::{Digest, Sha256};

/// Length of generated invitation tokens.
pub const INVITE_TOKEN_LEN: usize = 32;

/// Computes SHA-256 hash of the input and returns it as a hex string.
///
/// Used to store invitation tokens as digests rather than plaintext;
/// validation hashes the presented token and compares digests.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates an opaque single-use invitation token.
///
/// The charset omits visually ambiguous characters (0, O, 1, l, I) so the
/// token survives being read aloud or retyped from an email.
pub fn generate_invite_token() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789";
    let mut rng = rand::thread_rng();

    (0..INVITE_TOKEN_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_deterministic() {
        assert_eq!(sha256_hex("same_input"), sha256_hex("same_input"));
    }

    #[test]
    fn test_sha256_hex_different_inputs() {
        assert_ne!(sha256_hex("input1"), sha256_hex("input2"));
    }

    #[test]
    fn test_generate_invite_token_length() {
        let token = generate_invite_token();
        assert_eq!(token.len(), INVITE_TOKEN_LEN);
    }

    #[test]
    fn test_generate_invite_token_unique() {
        assert_ne!(generate_invite_token(), generate_invite_token());
    }

    #[test]
    fn test_generate_invite_token_charset() {
        let token = generate_invite_token();
        // Should not contain confusing characters (0, O, 1, l, I)
        assert!(!token.contains('0'));
        assert!(!token.contains('O'));
        assert!(!token.contains('1'));
        assert!(!token.contains('l'));
        assert!(!token.contains('I'));
    }

    #[test]
    fn test_token_digest_round_trip() {
        let token = generate_invite_token();
        let digest = sha256_hex(&token);
        assert_eq!(digest, sha256_hex(&token));
        assert_ne!(digest, sha256_hex("some-other-token"));
    }
}
