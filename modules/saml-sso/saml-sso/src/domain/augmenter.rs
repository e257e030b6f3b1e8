//! Copies logout correlation claims from the external identity onto the local grant.
//!
//! A later logout request is authenticated only by the local session, so the
//! identity provider's session index and name identifier have to travel with
//! the grant to build a correct `LogoutRequest`.

use saml_sso_sdk::{
    AuthenticationManager, Claim, Identity, Principal, RequestData, ResponseSink, SamlOptions,
    claim_types,
};

/// Identity holding copies of the session-index and logout name-identifier claims.
///
/// Returns `None` when `external` lacks either source claim. The identity takes
/// the authentication type of the grant's primary identity.
#[must_use]
pub fn logout_correlation_identity(grant: &Principal, external: &Principal) -> Option<Identity> {
    let session_index = external.find_first(claim_types::SESSION_INDEX)?;
    let name_id = external.find_first(claim_types::NAME_IDENTIFIER)?;

    let session_claim = Claim {
        claim_type: session_index.claim_type.clone(),
        value: session_index.value.clone(),
        value_kind: session_index.value_kind.clone(),
        issuer: session_index.issuer.clone(),
        properties: Vec::new(),
    };

    let logout_name_id_claim = Claim {
        claim_type: claim_types::LOGOUT_NAME_IDENTIFIER.to_owned(),
        value: name_id.value.clone(),
        value_kind: name_id.value_kind.clone(),
        issuer: name_id.issuer.clone(),
        properties: name_id.properties.clone(),
    };

    Some(Identity {
        authentication_type: grant
            .primary_identity()
            .and_then(|i| i.authentication_type.clone()),
        claims: vec![session_claim, logout_name_id_claim],
    })
}

/// Append the correlation identity to `grant`. Returns whether anything was added.
pub fn augment_principal(grant: &mut Principal, external: &Principal) -> bool {
    match logout_correlation_identity(grant, external) {
        Some(identity) => {
            grant.add_identity(identity);
            true
        }
        None => false,
    }
}

/// Look up both identities in the host pipeline and re-persist the augmented grant.
///
/// The grant is read under `authentication_scheme`, the external identity
/// under `sign_in_as_scheme`. Correlation is best-effort: missing tickets,
/// missing claims, or host failures are logged and skipped so that sign-in
/// still succeeds. Returns whether the grant was augmented.
#[tracing::instrument(skip_all, fields(grant_scheme = %options.authentication_scheme))]
pub async fn augment_grant_with_logout_claims(
    auth: &dyn AuthenticationManager,
    request: &RequestData,
    response: &mut ResponseSink,
    options: &SamlOptions,
) -> bool {
    let grant = auth
        .authenticate(request, &options.authentication_scheme)
        .await;
    let external = auth.authenticate(request, &options.sign_in_as_scheme).await;

    let (mut grant, external) = match (grant, external) {
        (Ok(Some(grant)), Ok(Some(external))) => (grant, external),
        (Ok(_), Ok(_)) => {
            tracing::debug!("grant or external identity missing; skipping logout correlation");
            return false;
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "failed to read identities; skipping logout correlation");
            return false;
        }
    };

    if !augment_principal(&mut grant.principal, &external.principal) {
        tracing::debug!(
            "external identity lacks session index or name identifier; skipping logout correlation"
        );
        return false;
    }

    match auth.sign_in(response, grant).await {
        Ok(()) => {
            tracing::debug!("grant augmented with logout correlation claims");
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to persist augmented grant");
            false
        }
    }
}
