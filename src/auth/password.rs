//! Password hashing with bcrypt.
//!
//! Stored values are standard modular-crypt bcrypt strings (`$2b$12$...`),
//! salt and cost included. Both functions are CPU-bound; async callers run
//! them on the blocking pool.

use crate::error::RelayError;

/// Work factor for new hashes.
pub const PASSWORD_COST: u32 = bcrypt::DEFAULT_COST;

/// Hashes `password` with a fresh random salt.
///
/// # Errors
///
/// Returns [`RelayError::Internal`] if the hasher fails.
pub fn hash_password(password: &str) -> Result<String, RelayError> {
    bcrypt::hash(password, PASSWORD_COST).map_err(|e| RelayError::Internal(e.to_string()))
}

/// Returns `true` if `password` matches the stored hash.
///
/// Malformed stored values never match.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn hashed(password: &str) -> String {
        let Ok(stored) = hash_password(password) else {
            panic!("hash failed");
        };
        stored
    }

    #[test]
    fn correct_password_verifies() {
        let stored = hashed("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hashed("same"), hashed("same"));
    }

    #[test]
    fn stored_hash_carries_cost() {
        let stored = hashed("hunter2");
        assert!(stored.starts_with(&format!("$2b${PASSWORD_COST}$")));
        assert!(!stored.contains("hunter2"));
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify_password("x", "no-separator"));
        assert!(!verify_password("x", "!!!$???"));
        assert!(!verify_password("x", ""));
    }
}
