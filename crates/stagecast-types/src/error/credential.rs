//! Credential issuer errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by a credential issuer or the credential store.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum CredentialError {
    /// Issuer could not be reached (DNS, TCP, TLS, timeout)
    #[error("Credential issuer unreachable: {message}")]
    Unreachable {
        /// Description of the network failure
        message: String,
    },

    /// Issuer refused to issue a credential for this identity
    #[error("Credential issuer rejected identity ({status}): {message}")]
    Rejected {
        /// HTTP-style status code returned by the issuer
        status: u16,
        /// Error message from the issuer
        message: String,
    },

    /// Issuer answered with something that is not a credential
    #[error("Invalid credential response: {message}")]
    InvalidResponse {
        /// Description of the decode failure
        message: String,
    },

    /// A credential was offered that is already past its expiry
    #[error("Credential already expired at {expires_at}")]
    AlreadyExpired {
        /// Expiry of the offending credential
        expires_at: DateTime<Utc>,
    },
}

impl CredentialError {
    /// Check if this is a temporary error that may resolve on retry.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::InvalidResponse { .. })
    }
}
