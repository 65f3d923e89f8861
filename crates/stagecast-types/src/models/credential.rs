//! Short-lived client credential.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Authentication token issued for the session's client identity.
///
/// A credential is never mutated: a refresh produces a new value that
/// supersedes the old one in the credential store.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    /// Opaque bearer token
    pub token: String,
    /// Identity the token was issued for
    pub identity: String,
    /// Absolute expiry
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(
        token: impl Into<String>,
        identity: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self { token: token.into(), identity: identity.into(), expires_at }
    }

    /// Create a credential valid for `lifetime` from now.
    pub fn with_lifetime(
        token: impl Into<String>,
        identity: impl Into<String>,
        lifetime: Duration,
    ) -> Self {
        Self::new(token, identity, Utc::now() + lifetime)
    }

    /// Remaining validity as seen at `now` (negative once expired).
    pub fn lifetime_at(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

// Keep tokens out of logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("identity", &self.identity)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_expiry_check() {
        let now = Utc::now();
        let cred = Credential::new("tok", "projector-1", now + Duration::minutes(9));

        assert!(!cred.is_expired_at(now));
        assert!(cred.is_expired_at(now + Duration::minutes(9)));
        assert_eq!(cred.lifetime_at(now), Duration::minutes(9));
        assert!(cred.lifetime_at(now + Duration::minutes(10)) < Duration::zero());
    }

    #[test]
    fn test_debug_redacts_token() {
        let cred = Credential::with_lifetime("secret-token", "projector-1", Duration::hours(1));
        let rendered = format!("{:?}", cred);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("projector-1"));
    }
}
