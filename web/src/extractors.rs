//! Custom Axum extractors.

use crate::error::AppError;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

/// Bearer token from the `Authorization` header.
///
/// The token is opaque here; verifying it is the identity provider's job.
///
/// # Example
///
/// ```ignore
/// async fn handler(State(state): State<AppState>, token: BearerToken) -> Result<..., AppError> {
///     let buyer = state.identity.verify(token.as_str()).await?;
///     ...
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

impl BearerToken {
    /// The raw token
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

        parse_bearer(header)
            .map(|token| Self(token.to_string()))
            .ok_or_else(|| AppError::unauthorized("Expected 'Authorization: Bearer <token>'"))
    }
}

fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn extract(header: Option<&str>) -> Result<BearerToken, AppError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        BearerToken::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn extracts_bearer_token() {
        let token = extract(Some("Bearer abc-123")).await.unwrap();
        assert_eq!(token.as_str(), "abc-123");
    }

    #[tokio::test]
    async fn scheme_is_case_insensitive() {
        let token = extract(Some("bearer xyz")).await.unwrap();
        assert_eq!(token.as_str(), "xyz");
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let err = extract(None).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn other_schemes_are_rejected() {
        assert!(extract(Some("Basic dXNlcjpwYXNz")).await.is_err());
        assert!(extract(Some("Bearer ")).await.is_err());
    }
}
