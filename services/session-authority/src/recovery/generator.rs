use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

/// Random bytes behind each recovery token.
pub const RECOVERY_TOKEN_BYTES: usize = 32;

pub struct RecoveryTokenGenerator;

impl RecoveryTokenGenerator {
    /// 32 bytes from the OS CSPRNG, hex encoded.
    pub fn generate() -> Zeroizing<String> {
        let mut bytes = Zeroizing::new([0u8; RECOVERY_TOKEN_BYTES]);
        OsRng.fill_bytes(&mut bytes[..]);
        Zeroizing::new(hex::encode(&bytes[..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_tokens() {
        let token1 = RecoveryTokenGenerator::generate();
        let token2 = RecoveryTokenGenerator::generate();
        assert_ne!(*token1, *token2);
        assert_eq!(token1.len(), 64); // Hex encoded 32 bytes
    }

    #[test]
    fn test_token_is_lowercase_hex() {
        let token = RecoveryTokenGenerator::generate();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
