//! Push/fallback transport errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by either delivery channel's transport.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ChannelError {
    /// Connection or subscription could not be established
    #[error("Connect failed: {message}")]
    Connect {
        /// Description of the failure
        message: String,
    },

    /// Server refused the connection (bad or expired token, unknown document)
    #[error("Rejected by server ({status}): {message}")]
    Rejected {
        /// HTTP-style status code
        status: u16,
        /// Error message from the server
        message: String,
    },

    /// An established stream broke
    #[error("Stream interrupted: {message}")]
    Interrupted {
        /// Description of the failure
        message: String,
    },

    /// A frame or event could not be decoded
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the decode failure
        message: String,
    },

    /// Server closed the stream
    #[error("Stream closed by server")]
    Closed,
}

impl ChannelError {
    /// Check if the error ends the current stream (as opposed to one bad frame).
    pub const fn is_disconnect(&self) -> bool {
        !matches!(self, Self::Decode { .. })
    }
}
