use rand::Rng;
use rand::distributions::Alphanumeric;

/// Length of every generated secret (user hash, repo signer and secret).
pub const SECRET_LENGTH: usize = 32;

/// Generates the opaque secrets the target schema expects on users and repos.
///
/// Values are fresh on every call and never derived from legacy data.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecretGenerator;

impl SecretGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Internal API hash for a user.
    #[must_use]
    pub fn user_hash(&self) -> String {
        generate_secret(SECRET_LENGTH)
    }

    /// Signer and secret pair for a repository.
    #[must_use]
    pub fn repo_keys(&self) -> (String, String) {
        (generate_secret(SECRET_LENGTH), generate_secret(SECRET_LENGTH))
    }
}

/// Generates a cryptographically secure random alphanumeric string
#[must_use]
fn generate_secret(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_hash_format() {
        let hash = SecretGenerator::new().user_hash();
        assert_eq!(hash.len(), SECRET_LENGTH);
        assert!(hash.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_secrets_are_fresh() {
        let generator = SecretGenerator::new();
        let (signer, secret) = generator.repo_keys();
        assert_ne!(signer, secret);
        assert_ne!(generator.user_hash(), generator.user_hash());
    }
}
