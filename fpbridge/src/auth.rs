//! Bearer-token authentication for the admin API.
//!
//! The admin API has a single shared credential, `admin.api_token`, passed as
//! `Authorization: Bearer <token>`.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

use crate::AppState;
use crate::errors::{Error, Result};

/// Proof that the request carried the admin token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminToken;

/// Compare without short-circuiting on the first differing byte.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn bearer_token(parts: &Parts) -> Result<&str> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(Error::Unauthenticated { message: None })?;

    let value = header.to_str().map_err(|e| Error::BadRequest {
        message: format!("Invalid authorization header: {e}"),
    })?;

    value.strip_prefix("Bearer ").map(str::trim).ok_or(Error::Unauthenticated {
        message: Some("Expected a Bearer token".to_string()),
    })
}

impl FromRequestParts<AppState> for AdminToken {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Routes are only mounted with a token configured; a missing one locks everything out
        let Some(expected) = state.config.admin.api_token.as_deref() else {
            return Err(Error::Unauthenticated { message: None });
        };

        let presented = bearer_token(parts)?;
        if tokens_match(presented, expected) {
            trace!("Admin token accepted");
            Ok(AdminToken)
        } else {
            Err(Error::Unauthenticated {
                message: Some("Invalid admin token".to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/admin/api/v1/settings");
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("secret", "secret"));
        assert!(!tokens_match("secret", "secreT"));
        assert!(!tokens_match("secret", "secret2"));
        assert!(!tokens_match("", "secret"));
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc"))).unwrap(), "abc");
        assert!(matches!(
            bearer_token(&parts(None)),
            Err(Error::Unauthenticated { message: None })
        ));
        assert!(matches!(
            bearer_token(&parts(Some("Basic dXNlcjpwYXNz"))),
            Err(Error::Unauthenticated { message: Some(_) })
        ));
    }
}
