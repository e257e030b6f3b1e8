//! Error types for the SAML SSO module.

use thiserror::Error;

/// Errors that cross the boundary between the SAML SSO core and its collaborators.
#[derive(Debug, Clone, Error)]
pub enum SamlSsoError {
    /// The request path names no known protocol operation.
    #[error("unknown operation: '{0}'")]
    UnknownOperation(String),

    /// A protocol command failed (malformed assertion, bad signature, ...).
    #[error("command failed: {0}")]
    Command(String),

    /// Relay data could not be protected or unprotected.
    #[error("data protection failed: {0}")]
    Protection(String),

    /// The host authentication pipeline rejected a call.
    #[error("host pipeline error: {0}")]
    Host(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}
