//! Maps a request path onto a protocol operation.

use super::DomainError;
use super::command::CommandKind;

/// Routing decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The path is outside the module path; the request is not ours.
    NotApplicable,
    /// `<module_path>/acs`.
    AssertionConsumer,
    Operation(CommandKind),
}

/// Decide which operation, if any, handles `path`.
///
/// Only the path is inspected; method and payload are the operation's concern.
///
/// # Errors
///
/// Returns `UnknownOperation` when the path is under `module_path` but its
/// remainder names no operation.
pub fn dispatch(module_path: &str, path: &str) -> Result<Dispatch, DomainError> {
    let Some(remaining) = strip_segments(path, module_path) else {
        return Ok(Dispatch::NotApplicable);
    };

    match CommandKind::from_name(remaining) {
        Some(CommandKind::Acs) => Ok(Dispatch::AssertionConsumer),
        Some(kind) => Ok(Dispatch::Operation(kind)),
        None => Err(DomainError::unknown_operation(remaining)),
    }
}

/// Whether `path` is exactly the assertion consumer endpoint.
#[must_use]
pub fn is_acs_path(module_path: &str, path: &str) -> bool {
    matches!(dispatch(module_path, path), Ok(Dispatch::AssertionConsumer))
}

/// Segment-aware, ASCII case-insensitive prefix match.
///
/// Returns the remainder (empty or starting with `/`) when `path` equals
/// `prefix` or continues it with a new segment. `/Saml2x` does not match `/Saml2`.
#[must_use]
pub fn strip_segments<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return Some(path);
    }

    let head = path.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }

    let rest = &path[prefix.len()..];
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}
