//! Configuration for the SAML SSO module.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use saml_sso_sdk::{DataProtector, SamlOptions};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::DomainError;

/// Prefix of environment variables that override file configuration.
pub const ENV_PREFIX: &str = "SAML_SSO__";

/// Module configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamlSsoConfig {
    /// URL prefix reserved for SAML endpoints. Starts with `/`, no trailing `/`.
    pub module_path: String,

    /// Scheme name of this handler.
    pub authentication_scheme: String,

    /// Scheme under which the externally authenticated identity is signed in.
    pub sign_in_as_scheme: String,

    /// Entity id of this service provider.
    pub entity_id: String,

    /// Public origin of the application, e.g. `https://app.example.com/`.
    /// When absent it is derived from each request's `Host` header, which the
    /// client controls. Set it whenever the service is reachable other than
    /// through a proxy that rewrites `Host`.
    pub public_origin: Option<Url>,

    /// Take the request scheme from `X-Forwarded-Proto`. Enable only behind a
    /// proxy that overwrites the header.
    pub trust_forwarded_headers: bool,

    /// Default post sign-in destination.
    pub return_url: Option<Url>,

    /// Prefix of the relay-data cookie name.
    pub relay_cookie_prefix: String,

    /// Largest request body buffered by the HTTP adapter.
    pub max_form_bytes: usize,
}

impl Default for SamlSsoConfig {
    fn default() -> Self {
        Self {
            module_path: "/Saml2".to_owned(),
            authentication_scheme: "Saml2".to_owned(),
            sign_in_as_scheme: "Identity.External".to_owned(),
            entity_id: String::new(),
            public_origin: None,
            trust_forwarded_headers: false,
            return_url: None,
            relay_cookie_prefix: "Saml2.".to_owned(),
            max_form_bytes: 1024 * 1024,
        }
    }
}

impl SamlSsoConfig {
    /// Load from a YAML file, then apply `SAML_SSO__*` environment overrides.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be parsed, contains unknown keys, or the
    /// resulting configuration does not pass [`SamlSsoConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let cfg: Self = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .with_context(|| format!("failed to load SAML SSO config from {}", path.display()))?;
        cfg.validate()
            .with_context(|| format!("invalid SAML SSO config in {}", path.display()))?;
        Ok(cfg)
    }

    /// Check the invariants the request router relies on.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first violated rule.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.module_path.starts_with('/') {
            return Err(DomainError::invalid_config(format!(
                "module_path '{}' must start with '/'",
                self.module_path
            )));
        }
        if self.module_path.len() > 1 && self.module_path.ends_with('/') {
            return Err(DomainError::invalid_config(format!(
                "module_path '{}' must not end with '/'",
                self.module_path
            )));
        }
        if self.authentication_scheme.trim().is_empty() {
            return Err(DomainError::invalid_config(
                "authentication_scheme must not be empty",
            ));
        }
        if self.sign_in_as_scheme.trim().is_empty() {
            return Err(DomainError::invalid_config(
                "sign_in_as_scheme must not be empty",
            ));
        }
        if self.max_form_bytes == 0 {
            return Err(DomainError::invalid_config(
                "max_form_bytes must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Freeze into the options shared with every command.
    #[must_use]
    pub fn to_options(&self, data_protector: Arc<dyn DataProtector>) -> SamlOptions {
        SamlOptions {
            module_path: self.module_path.clone(),
            authentication_scheme: self.authentication_scheme.clone(),
            sign_in_as_scheme: self.sign_in_as_scheme.clone(),
            entity_id: self.entity_id.clone(),
            public_origin: self.public_origin.clone(),
            trust_forwarded_headers: self.trust_forwarded_headers,
            return_url: self.return_url.clone(),
            relay_cookie_prefix: self.relay_cookie_prefix.clone(),
            data_protector,
        }
    }
}
