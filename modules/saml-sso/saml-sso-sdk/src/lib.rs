//! SAML SSO SDK
//!
//! Public contracts of the `saml_sso` module:
//!
//! - [`SamlCommand`] - one protocol operation (ACS, sign-in, logout, metadata)
//! - [`DataProtector`] - protect/unprotect relay data
//! - [`AuthenticationManager`] - the host pipeline's ticket store
//! - [`Principal`], [`Identity`], [`Claim`] - claim model
//! - [`CommandResult`], [`AuthenticateOutcome`] - operation and pipeline results
//! - [`SamlSsoError`] - error type
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod claims;
pub mod error;
pub mod models;
pub mod options;
pub mod response;

pub use api::{AuthenticationManager, DataProtector, SamlCommand};
pub use claims::{Claim, ClaimValueKind, Identity, Principal, claim_types};
pub use error::SamlSsoError;
pub use models::{
    AuthProperties, AuthenticateOutcome, AuthenticationTicket, CommandRequest, CommandResult,
    EntityId, RELAY_STATE_PARAM, RelayData, RequestData, RequestDataBuilder,
};
pub use options::SamlOptions;
pub use response::ResponseSink;
