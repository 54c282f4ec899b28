//! Password and Token Hashing
//!
//! Credentials are hashed with HMAC-SHA256 keyed by a server-side secret.
//! A database leak alone is not enough to run an offline dictionary attack;
//! the attacker also needs the signing key from the server environment.
//!
//! Two hash domains live here, each keyed by its own secret:
//! - password hashes: HMAC(password_hash_secret, password || salt)
//! - refresh tokens at rest: HMAC(refresh_store_secret, token)

use crate::auth::SigningSecret;
use crate::error::{ApiError, ApiResult};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of generated password salts in raw bytes (hex-encoded to 32 chars).
const SALT_BYTES: usize = 16;

/// Generate a fresh random salt, hex-encoded.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn keyed_mac(secret: &SigningSecret) -> ApiResult<HmacSha256> {
    HmacSha256::new_from_slice(secret.expose().as_bytes())
        .map_err(|_| ApiError::internal_error("Hashing key is unusable"))
}

/// Hash a password with its salt, keyed by the password-hash secret.
///
/// Returns the hex-encoded digest. The salt is appended to the password
/// before hashing, so equal passwords with different salts produce
/// unrelated digests.
pub fn hash_password(
    secret: &SigningSecret,
    password: &str,
    salt: &str,
) -> ApiResult<String> {
    let mut mac = keyed_mac(secret)?;
    mac.update(password.as_bytes());
    mac.update(salt.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a password against a stored hex-encoded hash.
///
/// Comparison happens inside `Mac::verify_slice`, which is constant-time.
/// A malformed stored hash verifies as false rather than erroring; the
/// caller treats it like any wrong password.
pub fn verify_password(
    secret: &SigningSecret,
    password: &str,
    salt: &str,
    stored_hash: &str,
) -> ApiResult<bool> {
    let Ok(expected) = hex::decode(stored_hash) else {
        return Ok(false);
    };

    let mut mac = keyed_mac(secret)?;
    mac.update(password.as_bytes());
    mac.update(salt.as_bytes());
    Ok(mac.verify_slice(&expected).is_ok())
}

/// Hash a refresh token for storage, keyed by the refresh-store secret.
///
/// The raw token never touches the database; lookups and deletes match
/// on this digest.
pub fn hash_refresh_token(secret: &SigningSecret, token: &str) -> ApiResult<String> {
    let mut mac = keyed_mac(secret)?;
    mac.update(token.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SigningSecret {
        SigningSecret::new("test_hash_secret".to_string())
    }

    #[test]
    fn test_salt_is_hex_and_fresh() {
        let a = generate_salt();
        let b = generate_salt();

        assert_eq!(a.len(), SALT_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_and_verify_round_trip() -> ApiResult<()> {
        let secret = secret();
        let salt = generate_salt();

        let hash = hash_password(&secret, "correct horse battery", &salt)?;

        assert!(verify_password(&secret, "correct horse battery", &salt, &hash)?);
        assert!(!verify_password(&secret, "wrong password", &salt, &hash)?);
        Ok(())
    }

    #[test]
    fn test_salt_changes_digest() -> ApiResult<()> {
        let secret = secret();

        let a = hash_password(&secret, "same password", "aaaa")?;
        let b = hash_password(&secret, "same password", "bbbb")?;
        assert_ne!(a, b);
        Ok(())
    }

    #[test]
    fn test_secret_changes_digest() -> ApiResult<()> {
        let a = hash_password(&secret(), "password", "salt")?;
        let b = hash_password(
            &SigningSecret::new("another_secret".to_string()),
            "password",
            "salt",
        )?;
        assert_ne!(a, b);
        Ok(())
    }

    #[test]
    fn test_malformed_stored_hash_verifies_false() -> ApiResult<()> {
        let secret = secret();
        assert!(!verify_password(&secret, "password", "salt", "not-hex!!")?);
        assert!(!verify_password(&secret, "password", "salt", "")?);
        Ok(())
    }

    #[test]
    fn test_refresh_token_hash_is_deterministic() -> ApiResult<()> {
        let secret = secret();

        let a = hash_refresh_token(&secret, "some.jwt.token")?;
        let b = hash_refresh_token(&secret, "some.jwt.token")?;
        let c = hash_refresh_token(&secret, "other.jwt.token")?;

        // Deterministic per token so logout can find the stored row.
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        Ok(())
    }
}
