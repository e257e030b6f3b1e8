//! Immutable protocol options shared by every request.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::api::DataProtector;

/// Protocol configuration handed to every command.
///
/// Built once at startup and shared behind an `Arc`; nothing in it changes
/// after construction.
#[derive(Clone)]
pub struct SamlOptions {
    /// URL prefix reserved for this protocol, e.g. `/Saml2`.
    pub module_path: String,
    /// Scheme name of this protocol handler, recorded as the login provider.
    pub authentication_scheme: String,
    /// Scheme under which the externally authenticated identity is persisted.
    pub sign_in_as_scheme: String,
    /// Entity id of this service provider.
    pub entity_id: String,
    /// Public origin of the application. Derived from the request when absent.
    pub public_origin: Option<Url>,
    /// Whether `X-Forwarded-Proto` may decide the request scheme.
    pub trust_forwarded_headers: bool,
    /// Default destination after sign-in when the caller gives none.
    pub return_url: Option<Url>,
    /// Prefix of the cookie that stores protected relay data.
    pub relay_cookie_prefix: String,
    pub data_protector: Arc<dyn DataProtector>,
}

impl SamlOptions {
    /// Name of the cookie that stores relay data for `relay_state`.
    #[must_use]
    pub fn relay_cookie_name(&self, relay_state: &str) -> String {
        format!("{}{relay_state}", self.relay_cookie_prefix)
    }
}

impl fmt::Debug for SamlOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamlOptions")
            .field("module_path", &self.module_path)
            .field("authentication_scheme", &self.authentication_scheme)
            .field("sign_in_as_scheme", &self.sign_in_as_scheme)
            .field("entity_id", &self.entity_id)
            .field("public_origin", &self.public_origin)
            .field("trust_forwarded_headers", &self.trust_forwarded_headers)
            .field("return_url", &self.return_url)
            .field("relay_cookie_prefix", &self.relay_cookie_prefix)
            .field("data_protector", &"<dyn DataProtector>")
            .finish()
    }
}
