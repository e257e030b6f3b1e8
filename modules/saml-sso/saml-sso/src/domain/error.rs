//! Domain errors for the SAML SSO module.

use saml_sso_sdk::SamlSsoError;

/// Internal domain errors.
#[derive(thiserror::Error, Debug)]
pub enum DomainError {
    /// The path is under the module path but names no known operation.
    #[error("unknown operation '{name}'")]
    UnknownOperation { name: String },

    /// A command returned neither a principal, a redirect, nor content
    /// without marking itself handled.
    #[error("cannot reconcile command result: {0}")]
    Reconciliation(String),

    #[error("no command registered for operation '{name}'")]
    MissingCommand { name: String },

    #[error("invalid redirect target '{url}': {reason}")]
    InvalidRedirect { url: String, reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("data protection failed: {0}")]
    Protection(String),

    #[error("command failed: {0}")]
    Command(String),

    #[error("host pipeline error: {0}")]
    Host(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn unknown_operation(name: impl Into<String>) -> Self {
        Self::UnknownOperation { name: name.into() }
    }

    pub fn reconciliation(message: impl Into<String>) -> Self {
        Self::Reconciliation(message.into())
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn invalid_redirect(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidRedirect {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<SamlSsoError> for DomainError {
    fn from(e: SamlSsoError) -> Self {
        match e {
            SamlSsoError::UnknownOperation(name) => Self::UnknownOperation { name },
            SamlSsoError::Command(msg) => Self::Command(msg),
            SamlSsoError::Protection(msg) => Self::Protection(msg),
            SamlSsoError::Host(msg) => Self::Host(msg),
            SamlSsoError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<DomainError> for SamlSsoError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::UnknownOperation { name } => Self::UnknownOperation(name),
            DomainError::Command(msg) | DomainError::InvalidRequest(msg) => Self::Command(msg),
            DomainError::Protection(msg) => Self::Protection(msg),
            DomainError::Host(msg) => Self::Host(msg),
            DomainError::InvalidRedirect { url, reason } => {
                Self::Internal(format!("invalid redirect target '{url}': {reason}"))
            }
            other @ (DomainError::Reconciliation(_)
            | DomainError::MissingCommand { .. }
            | DomainError::InvalidConfig(_)
            | DomainError::Internal(_)) => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn unknown_operation_survives_round_trip() {
        let sdk: SamlSsoError = DomainError::unknown_operation("Nope").into();
        assert!(matches!(sdk, SamlSsoError::UnknownOperation(ref n) if n == "Nope"));

        let back: DomainError = sdk.into();
        assert!(matches!(back, DomainError::UnknownOperation { ref name } if name == "Nope"));
    }

    #[test]
    fn reconciliation_maps_to_internal() {
        let sdk: SamlSsoError = DomainError::reconciliation("empty result").into();
        match sdk {
            SamlSsoError::Internal(msg) => assert!(msg.contains("empty result")),
            other => panic!("Expected Internal, got: {other:?}"),
        }
    }
}
