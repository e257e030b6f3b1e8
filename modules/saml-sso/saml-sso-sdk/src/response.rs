//! Explicit response writer passed through every call instead of ambient context.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION, SET_COOKIE};
use http::{HeaderMap, HeaderValue, StatusCode};

use crate::error::SamlSsoError;

/// Accumulates the response for one request.
///
/// Every mutating call bumps a write counter, so callers can assert that a
/// component left the response alone.
#[derive(Debug, Clone)]
pub struct ResponseSink {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
    writes: usize,
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: None,
            writes: 0,
        }
    }
}

impl ResponseSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Value of the `Location` header, if set and valid UTF-8.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }

    /// Number of writes performed so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
        self.writes += 1;
    }

    /// Set `status` and the `Location` header.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if `location` is not a valid header value.
    pub fn redirect(&mut self, status: StatusCode, location: &str) -> Result<(), SamlSsoError> {
        let value = header_value(location)?;
        self.status = status;
        self.headers.insert(LOCATION, value);
        self.writes += 1;
        Ok(())
    }

    /// Append a raw `Set-Cookie` header.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if `cookie` is not a valid header value.
    pub fn append_cookie(&mut self, cookie: &str) -> Result<(), SamlSsoError> {
        let value = header_value(cookie)?;
        self.headers.append(SET_COOKIE, value);
        self.writes += 1;
        Ok(())
    }

    /// Write an in-band body.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if `content_type` is not a valid header value.
    pub fn write_body(
        &mut self,
        content_type: Option<&str>,
        body: impl Into<Bytes>,
    ) -> Result<(), SamlSsoError> {
        if let Some(ct) = content_type {
            self.headers.insert(CONTENT_TYPE, header_value(ct)?);
        }
        self.body = Some(body.into());
        self.writes += 1;
        Ok(())
    }

    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Option<Bytes>) {
        (self.status, self.headers, self.body)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, SamlSsoError> {
    HeaderValue::from_str(value)
        .map_err(|e| SamlSsoError::Internal(format!("invalid header value: {e}")))
}
