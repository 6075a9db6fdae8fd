//! PIN hashing and shape policy

use sha2::{Digest, Sha256};
use shared::error::{AppError, ErrorCode};

/// bcrypt cost for stored PIN hashes
pub const PIN_HASH_COST: u32 = 10;

/// Accepted PIN shapes. The self-unlock path is stricter than the
/// admin-set path and the two are kept apart on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinPolicy {
    /// Admin setting a location or runner PIN: 4 to 8 digits
    AdminSet,
    /// Location or runner unlocking itself: 4 to 6 digits
    Unlock,
}

impl PinPolicy {
    fn bounds(&self) -> (usize, usize) {
        match self {
            Self::AdminSet => (4, 8),
            Self::Unlock => (4, 6),
        }
    }

    /// Whether an already trimmed PIN is all ASCII digits within bounds
    pub fn accepts(&self, pin: &str) -> bool {
        let (min, max) = self.bounds();
        (min..=max).contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit())
    }

    /// Trim and validate, returning the normalized PIN
    pub fn validate<'a>(&self, pin: &'a str) -> Result<&'a str, AppError> {
        let pin = pin.trim();
        if self.accepts(pin) {
            Ok(pin)
        } else {
            let (min, max) = self.bounds();
            Err(AppError::with_message(
                ErrorCode::InvalidPinFormat,
                format!("PIN must be {min} to {max} digits"),
            ))
        }
    }
}

/// Hash a PIN with a fresh random salt
pub fn hash_pin(pin: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(pin, PIN_HASH_COST)
}

/// Compare a PIN against a stored hash. A malformed hash never matches.
pub fn verify_pin(pin: &str, hash: &str) -> bool {
    bcrypt::verify(pin, hash).unwrap_or(false)
}

/// [`hash_pin`] off the async runtime
pub async fn hash_pin_blocking(pin: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_pin(&pin))
        .await
        .map_err(|e| {
            tracing::error!("spawn_blocking join error: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .map_err(|e| AppError::internal(format!("PIN hashing failed: {e}")))
}

/// [`verify_pin`] off the async runtime
pub async fn verify_pin_blocking(pin: String, hash: String) -> bool {
    tokio::task::spawn_blocking(move || verify_pin(&pin, &hash))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("spawn_blocking join error: {e}");
            false
        })
}

/// Compare a PIN against a configured plain value via fixed-length digests
pub fn matches_configured(pin: &str, configured: &str) -> bool {
    let a = Sha256::digest(pin.as_bytes());
    let b = Sha256::digest(configured.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_policy_bounds() {
        assert!(PinPolicy::Unlock.accepts("1234"));
        assert!(PinPolicy::Unlock.accepts("123456"));
        assert!(!PinPolicy::Unlock.accepts("123"));
        assert!(!PinPolicy::Unlock.accepts("1234567"));
        assert!(!PinPolicy::Unlock.accepts("12a4"));
        assert!(!PinPolicy::Unlock.accepts("１２３４"));
    }

    #[test]
    fn test_admin_set_policy_bounds() {
        assert!(PinPolicy::AdminSet.accepts("1234567"));
        assert!(PinPolicy::AdminSet.accepts("12345678"));
        assert!(!PinPolicy::AdminSet.accepts("123456789"));
        assert!(!PinPolicy::AdminSet.accepts(""));
    }

    #[test]
    fn test_validate_trims() {
        assert_eq!(PinPolicy::Unlock.validate(" 4711 \n").unwrap(), "4711");
        let err = PinPolicy::Unlock.validate("47 11").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPinFormat);
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_pin("4711").unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_pin("4711", &hash));
        assert!(!verify_pin("4712", &hash));
        assert_ne!(hash, hash_pin("4711").unwrap());
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!verify_pin("4711", "not-a-hash"));
        assert!(!verify_pin("4711", ""));
    }

    #[test]
    fn test_matches_configured() {
        assert!(matches_configured("9999", "9999"));
        assert!(!matches_configured("9999", "99990"));
        assert!(!matches_configured("", "9999"));
    }
}
