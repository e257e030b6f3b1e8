//! Plaintext relay data protector for development and testing.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use saml_sso_sdk::{DataProtector, RelayData, SamlSsoError};

/// Encodes relay data as base64url JSON.
///
/// Provides no confidentiality or integrity. Anything the browser sends back
/// is trusted as-is, so never use it outside development and tests.
#[derive(Debug, Clone, Copy)]
pub struct PlaintextDataProtector;

impl PlaintextDataProtector {
    #[must_use]
    pub fn new() -> Self {
        tracing::warn!(
            "Plaintext data protector in use: relay data is neither encrypted nor signed. \
             Do NOT use this protector in production."
        );
        Self
    }
}

impl Default for PlaintextDataProtector {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProtector for PlaintextDataProtector {
    fn protect(&self, data: &RelayData) -> Result<String, SamlSsoError> {
        let json =
            serde_json::to_vec(data).map_err(|e| SamlSsoError::Protection(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    fn unprotect(&self, token: &str) -> Result<RelayData, SamlSsoError> {
        let json = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| SamlSsoError::Protection(format!("invalid token encoding: {e}")))?;
        serde_json::from_slice(&json)
            .map_err(|e| SamlSsoError::Protection(format!("invalid token payload: {e}")))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn unprotect_recovers_protected_data() {
        let protector = PlaintextDataProtector::new();
        let mut data = RelayData::new();
        data.insert("returnUrl".to_owned(), "https://app.test/after?x=1".to_owned());
        data.insert("idp".to_owned(), "https://idp.test".to_owned());

        let token = protector.protect(&data).unwrap();

        assert!(!token.contains('='));
        assert_eq!(protector.unprotect(&token).unwrap(), data);
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let protector = PlaintextDataProtector::new();

        assert!(matches!(
            protector.unprotect("***"),
            Err(SamlSsoError::Protection(_))
        ));
        let not_json = URL_SAFE_NO_PAD.encode(b"not json");
        assert!(matches!(
            protector.unprotect(&not_json),
            Err(SamlSsoError::Protection(_))
        ));
    }

    #[tracing_test::traced_test]
    #[test]
    fn construction_warns() {
        let _protector = PlaintextDataProtector::new();
        assert!(logs_contain("Do NOT use this protector in production"));
    }
}
