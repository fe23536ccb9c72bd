//! Credential hashing

/// Default bcrypt cost factor
pub const BCRYPT_COST: u32 = 12;

/// bcrypt ignores input past this many bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Hash a password with bcrypt
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Verify a password against a bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

/// Whether a stored credential is already a bcrypt hash
///
/// Older snapshots kept plaintext passwords; those need re-hashing.
pub fn is_bcrypt_hash(value: &str) -> bool {
    value.len() == 60
        && ["$2a$", "$2b$", "$2x$", "$2y$"]
            .iter()
            .any(|prefix| value.starts_with(prefix))
}
