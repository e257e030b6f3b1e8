//! Folds a command result into either a written response or an authentication ticket.

use std::time::UNIX_EPOCH;

use http::StatusCode;
use saml_sso_sdk::{
    AuthProperties, AuthenticationTicket, CommandResult, Principal, ResponseSink, SamlOptions,
};

use super::DomainError;

/// Item key under which the handler's scheme name is recorded on the ticket.
pub const LOGIN_PROVIDER_KEY: &str = "LoginProvider";

/// What the reconciler did with a command result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The command had already finalized the response. Nothing was written.
    AlreadyHandled,
    /// A principal was produced; the host must sign this ticket in.
    Authenticated(Box<AuthenticationTicket>),
    /// A redirect or in-band body was written to the response.
    Applied,
}

/// Reconcile `result` with the outgoing response.
///
/// # Errors
///
/// - `Reconciliation` if an unhandled result carries no principal, redirect, or content
/// - `Protection` if relay data cannot be protected into its cookie
/// - `Internal` if a header value is invalid
pub fn reconcile(
    mut result: CommandResult,
    response: &mut ResponseSink,
    options: &SamlOptions,
) -> Result<Reconciliation, DomainError> {
    if result.handled_result {
        tracing::debug!("command already handled the response");
        return Ok(Reconciliation::AlreadyHandled);
    }

    if let Some(principal) = result.principal.take() {
        if let Some(name) = &result.clear_cookie_name {
            response.append_cookie(&clear_cookie(name))?;
        }
        let ticket = build_ticket(principal, result, options);
        tracing::debug!(scheme = %ticket.scheme, "command produced a principal");
        return Ok(Reconciliation::Authenticated(Box::new(ticket)));
    }

    if result.location.is_some() || result.content.is_some() {
        // Staged so a failed write leaves `response` untouched.
        let mut staged = response.clone();
        apply(&result, &mut staged, options)?;
        *response = staged;
        return Ok(Reconciliation::Applied);
    }

    tracing::error!("command result has neither principal, redirect nor content");
    Err(DomainError::reconciliation(
        "unhandled command result carries neither a principal nor a redirect target",
    ))
}

fn build_ticket(
    principal: Principal,
    result: CommandResult,
    options: &SamlOptions,
) -> AuthenticationTicket {
    let mut properties = AuthProperties::new(result.relay_data);
    properties.redirect_uri = result.location;
    properties.items.insert(
        LOGIN_PROVIDER_KEY.to_owned(),
        options.authentication_scheme.clone(),
    );

    AuthenticationTicket {
        principal,
        properties,
        scheme: options.sign_in_as_scheme.clone(),
    }
}

fn apply(
    result: &CommandResult,
    response: &mut ResponseSink,
    options: &SamlOptions,
) -> Result<(), DomainError> {
    if let Some(location) = result.location.as_deref() {
        let status = if result.http_status.is_redirection() {
            result.http_status
        } else {
            StatusCode::SEE_OTHER
        };
        response.redirect(status, location)?;
        write_relay_cookies(result, response, options)?;
        tracing::debug!(status = status.as_u16(), "applied redirect");
    } else if let Some(content) = result.content.as_deref() {
        response.set_status(result.http_status);
        response.write_body(result.content_type.as_deref(), content.to_owned())?;
        write_relay_cookies(result, response, options)?;
        tracing::debug!(status = result.http_status.as_u16(), "applied in-band content");
    }
    Ok(())
}

fn write_relay_cookies(
    result: &CommandResult,
    response: &mut ResponseSink,
    options: &SamlOptions,
) -> Result<(), DomainError> {
    if let (Some(name), Some(state)) = (&result.set_cookie_name, &result.request_state) {
        let token = options.data_protector.protect(state)?;
        response.append_cookie(&format!("{name}={token}; Path=/; HttpOnly"))?;
    }
    if let Some(name) = &result.clear_cookie_name {
        response.append_cookie(&clear_cookie(name))?;
    }
    Ok(())
}

fn clear_cookie(name: &str) -> String {
    format!(
        "{name}=; Path=/; Expires={}; HttpOnly",
        httpdate::fmt_http_date(UNIX_EPOCH)
    )
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;

    use http::header::SET_COOKIE;
    use saml_sso_sdk::{Claim, DataProtector, Identity, RelayData};

    use super::*;
    use crate::config::SamlSsoConfig;
    use crate::domain::protector::PlaintextDataProtector;

    fn options() -> SamlOptions {
        SamlSsoConfig::default().to_options(Arc::new(PlaintextDataProtector::new()))
    }

    fn principal() -> Principal {
        Principal::new(Identity::new("Saml2", vec![Claim::new("sub", "alice")]))
    }

    #[test]
    fn handled_result_writes_nothing() {
        let mut response = ResponseSink::new();
        let result = CommandResult {
            principal: Some(principal()),
            location: Some("https://idp.test/".to_owned()),
            ..CommandResult::handled()
        };

        let outcome = reconcile(result, &mut response, &options()).unwrap();

        assert_eq!(outcome, Reconciliation::AlreadyHandled);
        assert_eq!(response.write_count(), 0);
    }

    #[test]
    fn principal_becomes_ticket_with_login_provider() {
        let mut response = ResponseSink::new();
        let mut relay = RelayData::new();
        relay.insert("tenant".to_owned(), "acme".to_owned());
        let result = CommandResult {
            relay_data: relay,
            ..CommandResult::signed_in(principal(), "https://app.test/home")
        };

        let Reconciliation::Authenticated(ticket) =
            reconcile(result, &mut response, &options()).unwrap()
        else {
            panic!("expected a ticket");
        };

        assert_eq!(ticket.scheme, "Identity.External");
        assert_eq!(
            ticket.properties.redirect_uri.as_deref(),
            Some("https://app.test/home")
        );
        assert_eq!(
            ticket.properties.items.get(LOGIN_PROVIDER_KEY).map(String::as_str),
            Some("Saml2")
        );
        assert_eq!(
            ticket.properties.items.get("tenant").map(String::as_str),
            Some("acme")
        );
        assert_eq!(ticket.principal, principal());
        assert_eq!(response.write_count(), 0);
    }

    #[test]
    fn redirect_is_written_with_protected_relay_cookie() {
        let opts = options();
        let mut response = ResponseSink::new();
        let mut state = RelayData::new();
        state.insert("returnUrl".to_owned(), "/after".to_owned());
        let result = CommandResult {
            set_cookie_name: Some(opts.relay_cookie_name("abc")),
            request_state: Some(state.clone()),
            ..CommandResult::redirect("https://idp.test/sso?SAMLRequest=x")
        };

        let outcome = reconcile(result, &mut response, &opts).unwrap();

        assert_eq!(outcome, Reconciliation::Applied);
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.location(), Some("https://idp.test/sso?SAMLRequest=x"));

        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        let token = cookie
            .strip_prefix("Saml2.abc=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        assert_eq!(opts.data_protector.unprotect(token).unwrap(), state);
    }

    #[test]
    fn non_redirect_status_is_coerced_for_location() {
        let mut response = ResponseSink::new();
        let result = CommandResult {
            location: Some("/next".to_owned()),
            ..CommandResult::default()
        };

        reconcile(result, &mut response, &options()).unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[test]
    fn content_is_written_in_band() {
        let mut response = ResponseSink::new();
        let result = CommandResult {
            content: Some("<EntityDescriptor/>".to_owned()),
            content_type: Some("application/samlmetadata+xml".to_owned()),
            ..CommandResult::default()
        };

        let outcome = reconcile(result, &mut response, &options()).unwrap();

        assert_eq!(outcome, Reconciliation::Applied);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.body().map(|b| b.as_ref()),
            Some(b"<EntityDescriptor/>".as_slice())
        );
    }

    #[test]
    fn clear_cookie_is_applied_alongside_ticket() {
        let mut response = ResponseSink::new();
        let result = CommandResult {
            clear_cookie_name: Some("Saml2.abc".to_owned()),
            ..CommandResult::signed_in(principal(), "/")
        };

        let outcome = reconcile(result, &mut response, &options()).unwrap();

        assert!(matches!(outcome, Reconciliation::Authenticated(_)));
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("Saml2.abc=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }

    #[test]
    fn invalid_location_leaves_response_untouched() {
        let opts = options();
        let mut response = ResponseSink::new();
        let mut state = RelayData::new();
        state.insert("k".to_owned(), "v".to_owned());
        let result = CommandResult {
            set_cookie_name: Some(opts.relay_cookie_name("rs")),
            request_state: Some(state),
            ..CommandResult::redirect("https://idp.test/\nbad")
        };

        let err = reconcile(result, &mut response, &opts).unwrap_err();

        assert!(matches!(err, DomainError::Internal(_)));
        assert_eq!(response.write_count(), 0);
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert!(response.location().is_none());
    }

    #[test]
    fn invalid_content_type_leaves_response_untouched() {
        let mut response = ResponseSink::new();
        let result = CommandResult {
            content: Some("<EntityDescriptor/>".to_owned()),
            content_type: Some("text/xml\r\n".to_owned()),
            clear_cookie_name: Some("Saml2.abc".to_owned()),
            ..CommandResult::default()
        };

        reconcile(result, &mut response, &options()).unwrap_err();

        assert_eq!(response.write_count(), 0);
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body().is_none());
        assert!(response.headers().is_empty());
    }

    #[test]
    fn empty_result_is_a_reconciliation_error() {
        let mut response = ResponseSink::new();

        let err = reconcile(CommandResult::default(), &mut response, &options()).unwrap_err();

        assert!(matches!(err, DomainError::Reconciliation(_)));
        assert_eq!(response.write_count(), 0);
    }
}
