//! HTTP adapter mounting the SAML SSO handler in front of an axum router.

mod middleware;
mod problem;

pub use middleware::{SamlSsoState, saml_sso_middleware};
pub use problem::Problem;
