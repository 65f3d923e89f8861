//! Adapter construction errors.
//!
//! Runtime failures are reported through the core's `CredentialError` and
//! `ChannelError`; only building an adapter can fail with [`ClientError`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Endpoint is not a usable URL.
    #[error("Invalid endpoint URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// HTTP client could not be built (TLS backend, etc).
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}
