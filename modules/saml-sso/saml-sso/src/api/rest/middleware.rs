use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;

use super::problem::Problem;
use crate::domain::{Dispatch, DomainError, HttpContext, SamlSsoHandler, dispatch, read_request_data};

/// Shared state for [`saml_sso_middleware`].
#[derive(Debug, Clone)]
pub struct SamlSsoState {
    pub handler: Arc<SamlSsoHandler>,
    /// Largest body buffered for requests under the module path.
    pub max_form_bytes: usize,
}

/// Answers requests under the module path; everything else passes through untouched.
///
/// Mount with `axum::middleware::from_fn_with_state`. Bodies of SAML
/// requests are buffered up to `max_form_bytes` so the form can be read and
/// still be handed on if the handler declines the request.
pub async fn saml_sso_middleware(
    State(state): State<SamlSsoState>,
    req: Request,
    next: Next,
) -> Response {
    let module_path = &state.handler.options().module_path;
    if matches!(
        dispatch(module_path, req.uri().path()),
        Ok(Dispatch::NotApplicable)
    ) {
        return next.run(req).await;
    }

    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, state.max_form_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => return body_error_to_response(&e, state.max_form_bytes),
    };

    let request = match read_request_data(&parts, &bytes, state.handler.options()) {
        Ok(request) => request,
        Err(e) => return domain_error_to_response(&e),
    };

    let mut ctx = HttpContext::new(request);
    match state.handler.handle_request(&mut ctx).await {
        Ok(true) => {
            let (status, headers, body) = ctx.response.into_parts();
            let mut response = Response::new(body.map_or_else(Body::empty, Body::from));
            *response.status_mut() = status;
            *response.headers_mut() = headers;
            response
        }
        Ok(false) => next.run(Request::from_parts(parts, Body::from(bytes))).await,
        Err(e) => domain_error_to_response(&e),
    }
}

fn body_error_to_response(err: &axum::Error, limit: usize) -> Response {
    if is_length_limit(err) {
        tracing::warn!(limit, "SAML request body over the limit");
        return Problem::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Payload Too Large",
            format!("Request body exceeds {limit} bytes"),
        )
        .into_response();
    }
    tracing::warn!(error = %err, "failed to read SAML request body");
    Problem::new(
        StatusCode::BAD_REQUEST,
        "Bad Request",
        "Failed to read request body",
    )
    .into_response()
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Convert `DomainError` to an RFC-9457 Problem Details response.
fn domain_error_to_response(err: &DomainError) -> Response {
    let (status, title, detail) = match err {
        DomainError::UnknownOperation { name } => {
            tracing::debug!(operation = %name, "unknown SAML operation");
            (
                StatusCode::NOT_FOUND,
                "Not Found",
                format!("Unknown SAML operation '{name}'"),
            )
        }
        DomainError::InvalidRequest(_) | DomainError::Protection(_) => {
            tracing::warn!(error = %err, "malformed SAML request");
            (
                StatusCode::BAD_REQUEST,
                "Bad Request",
                "Malformed SAML request".to_owned(),
            )
        }
        _ => {
            tracing::error!(error = %err, "SAML request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "SAML processing failed".to_owned(),
            )
        }
    };
    Problem::new(status, title, detail).into_response()
}
