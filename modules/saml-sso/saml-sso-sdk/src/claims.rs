//! Claim, identity, and principal model.
//!
//! A [`Principal`] is an ordered list of [`Identity`] values, each of which is an
//! ordered list of [`Claim`]s. Identities are append-only: augmenting a principal
//! adds a new identity and never rewrites the claims of an existing one.

use serde::{Deserialize, Serialize};

/// Claim types understood by the SAML service provider.
///
/// The values are part of the interop surface with any component that replays
/// these claims into an outgoing `LogoutRequest`, so they must match exactly.
pub mod claim_types {
    /// Session index assigned by the identity provider to the authenticated session.
    pub const SESSION_INDEX: &str = "http://kentor.se/AuthServices/SessionIndex";

    /// Name identifier copied from the external identity for later logout.
    pub const LOGOUT_NAME_IDENTIFIER: &str = "http://kentor.se/AuthServices/LogoutNameIdentifier";

    /// Generic name identifier claim produced by assertion consumption.
    pub const NAME_IDENTIFIER: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";
}

/// Issuer used when a claim is created without an explicit issuer.
pub const DEFAULT_ISSUER: &str = "LOCAL AUTHORITY";

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";

/// Kind of value carried by a claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimValueKind {
    #[default]
    String,
    Integer,
    Boolean,
    DateTime,
    /// Any other value type, identified by its type URI.
    Other(String),
}

impl ClaimValueKind {
    /// Type URI for this kind.
    #[must_use]
    pub fn as_uri(&self) -> &str {
        match self {
            Self::String => XSD_STRING,
            Self::Integer => XSD_INTEGER,
            Self::Boolean => XSD_BOOLEAN,
            Self::DateTime => XSD_DATE_TIME,
            Self::Other(uri) => uri,
        }
    }

    /// Maps a type URI back to a kind. Unknown URIs become [`ClaimValueKind::Other`].
    #[must_use]
    pub fn from_uri(uri: &str) -> Self {
        match uri {
            XSD_STRING => Self::String,
            XSD_INTEGER => Self::Integer,
            XSD_BOOLEAN => Self::Boolean,
            XSD_DATE_TIME => Self::DateTime,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// A single statement about a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
    pub value_kind: ClaimValueKind,
    pub issuer: String,
    /// Claim-level properties in insertion order.
    #[serde(default)]
    pub properties: Vec<(String, String)>,
}

impl Claim {
    /// Create a string-valued claim issued by [`DEFAULT_ISSUER`].
    #[must_use]
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
            value_kind: ClaimValueKind::String,
            issuer: DEFAULT_ISSUER.to_owned(),
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_value_kind(mut self, kind: ClaimValueKind) -> Self {
        self.value_kind = kind;
        self
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Append a property. Later entries never replace earlier ones.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    /// Look up the first property with the given key.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// An ordered set of claims scoped by an authentication type label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub authentication_type: Option<String>,
    pub claims: Vec<Claim>,
}

impl Identity {
    #[must_use]
    pub fn new(authentication_type: impl Into<String>, claims: Vec<Claim>) -> Self {
        Self {
            authentication_type: Some(authentication_type.into()),
            claims,
        }
    }

    /// An identity is authenticated when it carries an authentication type.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authentication_type.is_some()
    }

    #[must_use]
    pub fn find_first(&self, claim_type: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.claim_type == claim_type)
    }
}

/// The subject of a request: one or more identities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    identities: Vec<Identity>,
}

impl Principal {
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self {
            identities: vec![identity],
        }
    }

    #[must_use]
    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    /// The first identity, used as the template for linked sub-identities.
    #[must_use]
    pub fn primary_identity(&self) -> Option<&Identity> {
        self.identities.first()
    }

    /// All claims across identities, in identity order.
    pub fn claims(&self) -> impl Iterator<Item = &Claim> {
        self.identities.iter().flat_map(|i| i.claims.iter())
    }

    #[must_use]
    pub fn find_first(&self, claim_type: &str) -> Option<&Claim> {
        self.claims().find(|c| c.claim_type == claim_type)
    }

    /// Append an identity. Existing identities are left untouched.
    pub fn add_identity(&mut self, identity: Identity) {
        self.identities.push(identity);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn value_kind_uri_mapping() {
        assert_eq!(ClaimValueKind::String.as_uri(), XSD_STRING);
        assert_eq!(
            ClaimValueKind::from_uri(XSD_DATE_TIME),
            ClaimValueKind::DateTime
        );
        let other = ClaimValueKind::from_uri("urn:custom");
        assert_eq!(other, ClaimValueKind::Other("urn:custom".to_owned()));
        assert_eq!(other.as_uri(), "urn:custom");
    }

    #[test]
    fn claim_properties_keep_insertion_order() {
        let claim = Claim::new(claim_types::NAME_IDENTIFIER, "alice")
            .with_property("b", "2")
            .with_property("a", "1");

        assert_eq!(
            claim.properties,
            vec![
                ("b".to_owned(), "2".to_owned()),
                ("a".to_owned(), "1".to_owned())
            ]
        );
        assert_eq!(claim.property("a"), Some("1"));
        assert_eq!(claim.property("c"), None);
        assert_eq!(claim.issuer, DEFAULT_ISSUER);
    }

    #[test]
    fn principal_find_first_searches_identities_in_order() {
        let mut principal = Principal::new(Identity::new(
            "Cookies",
            vec![Claim::new("role", "admin")],
        ));
        principal.add_identity(Identity::new(
            "Cookies",
            vec![Claim::new("role", "user"), Claim::new("email", "a@b.c")],
        ));

        assert_eq!(principal.identities().len(), 2);
        assert_eq!(principal.find_first("role").map(|c| c.value.as_str()), Some("admin"));
        assert_eq!(principal.find_first("email").map(|c| c.value.as_str()), Some("a@b.c"));
        assert_eq!(principal.claims().count(), 3);
        assert!(principal.find_first("missing").is_none());
    }

    #[test]
    fn unlabelled_identity_is_not_authenticated() {
        assert!(!Identity::default().is_authenticated());
        assert!(Identity::new("Saml2", vec![]).is_authenticated());
    }
}
