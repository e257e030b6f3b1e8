//! SAML 2.0 service-provider integration for the authentication pipeline.
//!
//! Routes requests under the configured module path to the SAML commands,
//! folds command results into responses or authentication tickets, and keeps
//! the identity provider's session index and name identifier on the local
//! grant so that a later logout can address the right session.
//!
//! Protocol work (XML, signatures, bindings) lives behind
//! [`saml_sso_sdk::SamlCommand`]; ticket storage behind
//! [`saml_sso_sdk::AuthenticationManager`].
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod config;
pub mod domain;
pub mod module;

pub use config::SamlSsoConfig;
pub use domain::{DomainError, HttpContext, SamlSsoHandler};
pub use module::{SamlSso, SamlSsoDeps};
