//! Error types for the checkout handshake.

use std::time::Duration;

/// Input errors that prevent a checkout handshake from starting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    /// The session carries no authorization URL.
    #[error("checkout session has no authorization URL")]
    MissingAuthorizationUrl,

    /// The authorization URL could not be parsed.
    #[error("invalid authorization URL {url:?}: {reason}")]
    InvalidAuthorizationUrl {
        /// The offending URL as received.
        url: String,
        /// Parser error text.
        reason: String,
    },

    /// The authorization URL does not use an encrypted transport.
    #[error("authorization URL must use https, got scheme {scheme:?}")]
    InsecureAuthorizationUrl {
        /// The scheme that was found.
        scheme: String,
    },

    /// [`Handshake::start`](crate::Handshake::start) was called on a handshake
    /// that already left `Idle`.
    #[error("checkout handshake already started")]
    AlreadyStarted,
}

/// Failure to obtain an answer from the verification endpoint.
///
/// A verifier that receives an explicit failure status from the backend
/// returns [`VerificationResult::Failure`](crate::VerificationResult::Failure)
/// instead; this type covers the cases where no authoritative answer exists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// The backend answered with an error status and a readable error text.
    #[error("{message}")]
    Server {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Error text taken from the response body.
        message: String,
    },

    /// Network, HTTP or decoding failure without a server-provided message.
    #[error("{0}")]
    Transport(String),

    /// The verification call did not finish in time.
    #[error("Payment verification timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl VerifyError {
    /// Creates a transport error from any displayable error.
    #[must_use]
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}
