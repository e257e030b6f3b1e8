//! SAML SSO module.

use std::sync::{Arc, OnceLock};

use saml_sso_sdk::{AuthenticationManager, DataProtector};
use tracing::info;

use crate::api::rest::SamlSsoState;
use crate::config::SamlSsoConfig;
use crate::domain::{CommandRegistry, SamlSsoHandler};

/// Collaborators supplied by the host when the module starts.
pub struct SamlSsoDeps {
    pub commands: CommandRegistry,
    pub auth: Arc<dyn AuthenticationManager>,
    pub data_protector: Arc<dyn DataProtector>,
}

/// SAML SSO module.
///
/// Holds the handler built once at startup. The options inside it are
/// read-only afterwards and shared by all requests.
#[derive(Debug, Default)]
pub struct SamlSso {
    state: OnceLock<SamlSsoState>,
}

impl SamlSso {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `cfg` and build the handler.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the module was already initialized.
    #[tracing::instrument(skip_all, fields(module_path = %cfg.module_path))]
    pub fn init(&self, cfg: &SamlSsoConfig, deps: SamlSsoDeps) -> anyhow::Result<()> {
        cfg.validate()?;
        info!(
            scheme = %cfg.authentication_scheme,
            sign_in_as = %cfg.sign_in_as_scheme,
            "Initializing saml_sso"
        );

        let options = Arc::new(cfg.to_options(deps.data_protector));
        let handler = Arc::new(SamlSsoHandler::new(options, deps.commands, deps.auth));

        self.state
            .set(SamlSsoState {
                handler,
                max_form_bytes: cfg.max_form_bytes,
            })
            .map_err(|_| anyhow::anyhow!("Handler already initialized"))?;

        info!("SAML SSO handler initialized");
        Ok(())
    }

    /// The handler built by [`SamlSso::init`].
    ///
    /// # Errors
    ///
    /// Fails if the module has not been initialized.
    pub fn handler(&self) -> anyhow::Result<Arc<SamlSsoHandler>> {
        self.middleware_state().map(|state| state.handler)
    }

    /// State for [`crate::api::rest::saml_sso_middleware`].
    ///
    /// # Errors
    ///
    /// Fails if the module has not been initialized.
    pub fn middleware_state(&self) -> anyhow::Result<SamlSsoState> {
        self.state
            .get()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Handler not initialized"))
    }
}
