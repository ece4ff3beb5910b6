//! HTTP routes. Thin layer: parse, authorize, delegate to the domain,
//! map outcomes to statuses.

pub mod dead_letter;
pub mod health;
pub mod intake;
pub mod moderation;
pub mod sources;

use axum::http::{header, HeaderMap};

/// Pull the token out of an `Authorization: Bearer ...` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
