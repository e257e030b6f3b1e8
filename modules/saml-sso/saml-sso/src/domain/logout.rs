//! Post-logout redirect resolution.

use saml_sso_sdk::{RequestData, ResponseSink, SamlOptions};
use url::Url;

use super::DomainError;

/// Absolute URL of the application root, always ending in `/`.
///
/// Uses the configured public origin when present. Otherwise it is derived
/// from the request URL minus the application-relative path.
#[must_use]
pub fn application_url(options: &SamlOptions, request: &RequestData) -> Url {
    if let Some(origin) = &options.public_origin {
        return origin.clone();
    }

    let mut url = request.url().clone();
    let base_path = url
        .path()
        .strip_suffix(request.path())
        .unwrap_or_default()
        .trim_end_matches('/')
        .to_owned();
    url.set_path(&format!("{base_path}/"));
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Where the user lands after logout.
///
/// An explicit redirect wins unchanged. Otherwise, if the response is already
/// a 3xx, its `Location` is resolved against the current page URL; failing
/// that, the current page URL itself is used.
///
/// # Errors
///
/// Returns `InvalidRedirect` if the combined URL or the `Location` value
/// cannot be parsed.
pub fn resolve_logout_redirect(
    explicit: Option<&str>,
    response: &ResponseSink,
    application_url: &Url,
    request_path: &str,
) -> Result<String, DomainError> {
    if let Some(explicit) = explicit.filter(|s| !s.is_empty()) {
        return Ok(explicit.to_owned());
    }

    let current = join_base_and_path(application_url.as_str(), request_path);
    let current_url =
        Url::parse(&current).map_err(|e| DomainError::invalid_redirect(&current, e))?;

    if response.status().is_redirection() {
        let location = response.location().unwrap_or_default();
        let resolved = current_url
            .join(location)
            .map_err(|e| DomainError::invalid_redirect(location, e))?;
        return Ok(resolved.into());
    }

    Ok(current_url.into())
}

fn join_base_and_path(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
