//! Builds [`RequestData`] from raw HTTP parts, recovering protected relay data.

use http::header::{CONTENT_TYPE, COOKIE, HOST};
use http::request::Parts;
use saml_sso_sdk::{RequestData, SamlOptions};
use url::Url;

use super::DomainError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Read the request into the form the commands consume.
///
/// The relay state is taken from the query, then the form. When the browser
/// presents the matching relay cookie, its value is unprotected with the
/// configured data protector.
///
/// # Errors
///
/// - `InvalidRequest` if the URL or the form body cannot be parsed
/// - `Protection` if the relay cookie does not unprotect
#[tracing::instrument(skip_all, fields(method = %parts.method, path = %parts.uri.path()))]
pub fn read_request_data(
    parts: &Parts,
    body: &[u8],
    options: &SamlOptions,
) -> Result<RequestData, DomainError> {
    let url = request_url(parts, options)?;
    let form = read_form(parts, body)?;

    let data = read_cookies(parts)
        .into_iter()
        .fold(
            RequestData::builder(parts.method.clone(), url).form(form),
            |builder, (name, value)| builder.cookie(name, value),
        )
        .build();

    let Some(state) = data
        .relay_state()
        .and_then(|rs| data.cookie(&options.relay_cookie_name(rs)))
        .map(|token| options.data_protector.unprotect(token))
        .transpose()?
    else {
        return Ok(data);
    };
    tracing::debug!(entries = state.len(), "recovered stored request state");
    Ok(data.with_stored_request_state(state))
}

fn request_url(parts: &Parts, options: &SamlOptions) -> Result<Url, DomainError> {
    let forwarded = options
        .trust_forwarded_headers
        .then(|| parts.headers.get(FORWARDED_PROTO))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .map(str::trim);
    let scheme = forwarded
        .or_else(|| parts.uri.scheme_str())
        .or_else(|| options.public_origin.as_ref().map(Url::scheme))
        .unwrap_or("http");
    let host = parts
        .headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| parts.uri.authority().map(http::uri::Authority::as_str))
        .unwrap_or("localhost");
    let path_and_query = parts
        .uri
        .path_and_query()
        .map_or("/", http::uri::PathAndQuery::as_str);

    let raw = format!("{scheme}://{host}{path_and_query}");
    Url::parse(&raw).map_err(|e| DomainError::InvalidRequest(format!("bad request URL '{raw}': {e}")))
}

fn read_form(parts: &Parts, body: &[u8]) -> Result<Vec<(String, String)>, DomainError> {
    let is_form = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE));
    if !is_form || body.is_empty() {
        return Ok(Vec::new());
    }
    serde_urlencoded::from_bytes(body)
        .map_err(|e| DomainError::InvalidRequest(format!("malformed form body: {e}")))
}

fn read_cookies(parts: &Parts) -> Vec<(String, String)> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(k, v)| (k.trim().to_owned(), v.trim().to_owned()))
        .collect()
}
