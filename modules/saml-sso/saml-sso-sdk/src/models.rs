//! Request and result value objects exchanged with the SAML commands and the host pipeline.

use std::collections::BTreeMap;
use std::fmt;

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::claims::Principal;

/// Opaque relay data round-tripped through the identity provider.
pub type RelayData = BTreeMap<String, String>;

/// Name of the query/form parameter carrying the relay state token.
pub const RELAY_STATE_PARAM: &str = "RelayState";

/// Entity id of an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only view of an inbound HTTP request.
#[derive(Debug, Clone)]
pub struct RequestData {
    method: Method,
    url: Url,
    path: String,
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
    cookies: BTreeMap<String, String>,
    relay_state: Option<String>,
    stored_request_state: Option<RelayData>,
}

impl RequestData {
    #[must_use]
    pub fn builder(method: Method, url: Url) -> RequestDataBuilder {
        RequestDataBuilder {
            path: url.path().to_owned(),
            method,
            url,
            form: Vec::new(),
            cookies: BTreeMap::new(),
            stored_request_state: None,
        }
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute URL of the request.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request path relative to the application root.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        find_pair(&self.query, name)
    }

    #[must_use]
    pub fn form_param(&self, name: &str) -> Option<&str> {
        find_pair(&self.form, name)
    }

    #[must_use]
    pub fn form(&self) -> &[(String, String)] {
        &self.form
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn relay_state(&self) -> Option<&str> {
        self.relay_state.as_deref()
    }

    /// Relay data recovered from the relay cookie, if one was presented.
    #[must_use]
    pub fn stored_request_state(&self) -> Option<&RelayData> {
        self.stored_request_state.as_ref()
    }

    #[must_use]
    pub fn with_stored_request_state(mut self, state: RelayData) -> Self {
        self.stored_request_state = Some(state);
        self
    }
}

fn find_pair<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

#[derive(Debug)]
pub struct RequestDataBuilder {
    method: Method,
    url: Url,
    path: String,
    form: Vec<(String, String)>,
    cookies: BTreeMap<String, String>,
    stored_request_state: Option<RelayData>,
}

impl RequestDataBuilder {
    /// Override the application-relative path (defaults to the URL path).
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn form(mut self, form: Vec<(String, String)>) -> Self {
        self.form = form;
        self
    }

    #[must_use]
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn stored_request_state(mut self, state: RelayData) -> Self {
        self.stored_request_state = Some(state);
        self
    }

    #[must_use]
    pub fn build(self) -> RequestData {
        let query: Vec<(String, String)> = self
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let relay_state = find_pair(&query, RELAY_STATE_PARAM)
            .or_else(|| find_pair(&self.form, RELAY_STATE_PARAM))
            .map(str::to_owned);

        RequestData {
            method: self.method,
            url: self.url,
            path: self.path,
            query,
            form: self.form,
            cookies: self.cookies,
            relay_state,
            stored_request_state: self.stored_request_state,
        }
    }
}

/// Input of a single command invocation.
///
/// The dispatcher leaves every optional field empty; sign-in and logout
/// initiation fill in the identity provider, return URL, and relay data.
#[derive(Debug, Clone, Copy)]
pub struct CommandRequest<'a> {
    pub data: &'a RequestData,
    pub idp: Option<&'a EntityId>,
    pub return_url: Option<&'a str>,
    pub relay_data: Option<&'a RelayData>,
}

impl<'a> CommandRequest<'a> {
    #[must_use]
    pub fn new(data: &'a RequestData) -> Self {
        Self {
            data,
            idp: None,
            return_url: None,
            relay_data: None,
        }
    }
}

/// Result produced by a command. Consumed exactly once by the reconciler.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub http_status: StatusCode,
    /// Redirect target.
    pub location: Option<String>,
    /// In-band response body, e.g. a metadata document.
    pub content: Option<String>,
    pub content_type: Option<String>,
    pub principal: Option<Principal>,
    pub relay_data: RelayData,
    pub relay_state: Option<String>,
    /// Cookie that receives `request_state`, protected with the data protector.
    pub set_cookie_name: Option<String>,
    pub request_state: Option<RelayData>,
    pub clear_cookie_name: Option<String>,
    /// The command already wrote the response itself.
    pub handled_result: bool,
    /// The local session must be terminated (logout completed).
    pub terminate_local_session: bool,
}

impl Default for CommandResult {
    fn default() -> Self {
        Self {
            http_status: StatusCode::OK,
            location: None,
            content: None,
            content_type: None,
            principal: None,
            relay_data: RelayData::new(),
            relay_state: None,
            set_cookie_name: None,
            request_state: None,
            clear_cookie_name: None,
            handled_result: false,
            terminate_local_session: false,
        }
    }
}

impl CommandResult {
    /// A `303 See Other` redirect to `location`.
    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Self {
            http_status: StatusCode::SEE_OTHER,
            location: Some(location.into()),
            ..Self::default()
        }
    }

    /// A successful sign-in carrying `principal`.
    #[must_use]
    pub fn signed_in(principal: Principal, location: impl Into<String>) -> Self {
        Self {
            http_status: StatusCode::SEE_OTHER,
            location: Some(location.into()),
            principal: Some(principal),
            ..Self::default()
        }
    }

    /// The command already finalized the response.
    #[must_use]
    pub fn handled() -> Self {
        Self {
            handled_result: true,
            ..Self::default()
        }
    }
}

/// Properties attached to a challenge, sign-in, or sign-out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProperties {
    pub items: BTreeMap<String, String>,
    pub redirect_uri: Option<String>,
}

impl AuthProperties {
    #[must_use]
    pub fn new(items: BTreeMap<String, String>) -> Self {
        Self {
            items,
            redirect_uri: None,
        }
    }
}

/// What the host pipeline persists after a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationTicket {
    pub principal: Principal,
    pub properties: AuthProperties,
    pub scheme: String,
}

/// Authentication result handed to the host pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticateOutcome {
    Success(Box<AuthenticationTicket>),
    /// The request does not belong to this protocol.
    Skip,
    Fail(String),
}

impl AuthenticateOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub fn ticket(&self) -> Option<&AuthenticationTicket> {
        match self {
            Self::Success(ticket) => Some(ticket),
            Self::Skip | Self::Fail(_) => None,
        }
    }
}
