//! Caller identity extraction.
//!
//! Authentication lives in front of this service; requests arrive with the
//! authenticated principal in the `X-User-Id` header. The engine trusts the
//! header's value and only validates its shape.

use actix_web::HttpRequest;

use crate::domain::{Error, UserId};

/// Header carrying the authenticated caller's identifier.
pub const CALLER_HEADER: &str = "X-User-Id";

/// Extract the caller when the header is present.
pub fn optional_caller(request: &HttpRequest) -> Result<Option<UserId>, Error> {
    let Some(value) = request.headers().get(CALLER_HEADER) else {
        return Ok(None);
    };
    let text = value
        .to_str()
        .map_err(|_| Error::invalid_request(format!("{CALLER_HEADER} header must be UTF-8")))?;
    text.parse()
        .map(Some)
        .map_err(|_| Error::invalid_request(format!("{CALLER_HEADER} header must be a valid UUID")))
}

/// Extract the caller, rejecting requests without the header.
pub fn require_caller(request: &HttpRequest) -> Result<UserId, Error> {
    optional_caller(request)?
        .ok_or_else(|| Error::invalid_request(format!("{CALLER_HEADER} header is required")))
}
