//! Collaborator traits consumed by the SAML SSO core.
//!
//! The core never parses, signs, or encrypts anything itself. Protocol work
//! is delegated to [`SamlCommand`] implementations, relay data protection to a
//! [`DataProtector`], and ticket persistence to the host's
//! [`AuthenticationManager`].

use async_trait::async_trait;

use crate::error::SamlSsoError;
use crate::models::{AuthenticationTicket, CommandRequest, CommandResult, RelayData, RequestData};
use crate::options::SamlOptions;
use crate::response::ResponseSink;

/// A single protocol operation (assertion consumption, sign-in, logout, metadata).
///
/// ```ignore
/// struct MetadataCommand;
///
/// #[async_trait]
/// impl SamlCommand for MetadataCommand {
///     async fn run(
///         &self,
///         _req: &CommandRequest<'_>,
///         _response: &mut ResponseSink,
///         options: &SamlOptions,
///     ) -> Result<CommandResult, SamlSsoError> {
///         Ok(CommandResult {
///             content: Some(render_metadata(&options.entity_id)),
///             content_type: Some("application/samlmetadata+xml".to_owned()),
///             ..CommandResult::default()
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait SamlCommand: Send + Sync {
    /// Execute the operation.
    ///
    /// A command that answers the browser itself (for example a sign-in
    /// redirect it builds on its own) writes to `response` and returns
    /// [`CommandResult::handled`]. Otherwise it leaves `response` alone and
    /// the result is applied after it returns.
    ///
    /// # Errors
    ///
    /// Returns `Command` for protocol-level failures (malformed or unsigned
    /// messages, expired conditions) and `Protection` if relay data cannot be read.
    async fn run(
        &self,
        request: &CommandRequest<'_>,
        response: &mut ResponseSink,
        options: &SamlOptions,
    ) -> Result<CommandResult, SamlSsoError>;
}

/// Protects relay data that has to survive a round trip through the browser.
pub trait DataProtector: Send + Sync {
    /// Turn relay data into an opaque token.
    ///
    /// # Errors
    ///
    /// Returns `Protection` if the data cannot be encoded.
    fn protect(&self, data: &RelayData) -> Result<String, SamlSsoError>;

    /// Recover relay data from a token produced by [`DataProtector::protect`].
    ///
    /// # Errors
    ///
    /// Returns `Protection` if the token is malformed or was tampered with.
    fn unprotect(&self, token: &str) -> Result<RelayData, SamlSsoError>;
}

/// The host's authentication pipeline: ticket lookup and persistence by scheme.
#[async_trait]
pub trait AuthenticationManager: Send + Sync {
    /// Current ticket for `scheme`, if the request carries one.
    ///
    /// # Errors
    ///
    /// Returns `Host` if the scheme's state cannot be read.
    async fn authenticate(
        &self,
        request: &RequestData,
        scheme: &str,
    ) -> Result<Option<AuthenticationTicket>, SamlSsoError>;

    /// Persist `ticket` under its scheme.
    ///
    /// # Errors
    ///
    /// Returns `Host` if the ticket cannot be persisted.
    async fn sign_in(
        &self,
        response: &mut ResponseSink,
        ticket: AuthenticationTicket,
    ) -> Result<(), SamlSsoError>;

    /// Drop the ticket stored under `scheme`.
    ///
    /// # Errors
    ///
    /// Returns `Host` if the scheme's state cannot be cleared.
    async fn sign_out(&self, response: &mut ResponseSink, scheme: &str)
    -> Result<(), SamlSsoError>;
}
