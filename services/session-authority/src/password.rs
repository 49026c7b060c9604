//! Password hashing with bcrypt.
//!
//! bcrypt is the only primitive used for stored credentials. Hashing is
//! CPU-bound, so the async entry points run it on the blocking pool.

use crate::error::AuthError;
use tokio::task;

/// Adaptive password hasher with a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    #[must_use]
    pub const fn new(cost: u32) -> Self {
        Self { cost }
    }

    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password, returning the modular crypt string.
    pub async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let cost = self.cost;
        let password = password.to_string();

        task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AuthError::internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| AuthError::internal(format!("Password hashing failed: {e}")))
    }

    /// Check a password against a stored hash. Unparseable hashes never match.
    pub async fn verify(&self, password: &str, hash: &str) -> bool {
        if hash.is_empty() {
            return false;
        }
        let password = password.to_string();
        let hash = hash.to_string();

        task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(TEST_COST);
        let hash = hasher.hash("correct horse").await.unwrap();

        assert!(hash.starts_with("$2"));
        assert!(hasher.verify("correct horse", &hash).await);
        assert!(!hasher.verify("battery staple", &hash).await);
    }

    #[tokio::test]
    async fn test_hash_is_salted() {
        let hasher = PasswordHasher::new(TEST_COST);
        let first = hasher.hash("password").await.unwrap();
        let second = hasher.hash("password").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_garbage_hash_never_matches() {
        let hasher = PasswordHasher::new(TEST_COST);

        assert!(!hasher.verify("password", "").await);
        assert!(!hasher.verify("password", "not-a-bcrypt-hash").await);
    }

    #[test]
    fn test_default_cost() {
        assert_eq!(PasswordHasher::default().cost(), bcrypt::DEFAULT_COST);
    }
}
