use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use once_cell::sync::Lazy;

use super::AuthError;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash verified when the login name is unknown, so both failure paths cost
/// one Argon2 verification.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| {
    hash_password("dummy-password-for-unknown-users").unwrap_or_default()
});

fn hasher() -> Result<Argon2<'static>, AuthError> {
    // OWASP baseline: m=19 MiB, t=2, p=1
    let params = Params::new(19456, 2, 1, None).map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify `password` against a PHC-format hash.
///
/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hashing(format!("invalid hash format: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Hashing(format!("verify error: {e}"))),
    }
}

/// Burn one verification for a login name that matched no user.
pub fn verify_dummy(password: &str) {
    let _ = verify_password(password, &DUMMY_HASH);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordPolicyError {
    TooShort,
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
}

impl std::fmt::Display for PasswordPolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::TooShort => "Password must be at least 8 characters long",
            Self::MissingUppercase => "Password must contain at least one uppercase letter",
            Self::MissingLowercase => "Password must contain at least one lowercase letter",
            Self::MissingDigit => "Password must contain at least one digit",
        };
        f.write_str(msg)
    }
}

pub fn check_password_policy(password: &str) -> Result<(), PasswordPolicyError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordPolicyError::TooShort);
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(PasswordPolicyError::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(PasswordPolicyError::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordPolicyError::MissingDigit);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("Secret123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Secret123", &hash).unwrap());
        assert!(!verify_password("secret123", &hash).unwrap());
    }

    #[test]
    fn salts_differ() {
        assert_ne!(hash_password("Secret123").unwrap(), hash_password("Secret123").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("Secret123", "not-a-hash").is_err());
    }

    #[test]
    fn dummy_hash_is_usable() {
        assert!(DUMMY_HASH.starts_with("$argon2id$"));
        assert!(!verify_password("Secret123", &DUMMY_HASH).unwrap());
    }

    #[test]
    fn policy() {
        assert_eq!(check_password_policy("Ab1"), Err(PasswordPolicyError::TooShort));
        assert_eq!(check_password_policy("abcdefg1"), Err(PasswordPolicyError::MissingUppercase));
        assert_eq!(check_password_policy("ABCDEFG1"), Err(PasswordPolicyError::MissingLowercase));
        assert_eq!(check_password_policy("Abcdefgh"), Err(PasswordPolicyError::MissingDigit));
        assert!(check_password_policy("Abcdefg1").is_ok());
    }
}
