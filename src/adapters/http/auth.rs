//! Authenticated user extraction.
//!
//! Token verification happens upstream; the gateway forwards the verified
//! user id in the `X-User-Id` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::domain::foundation::UserId;

use super::error::ErrorResponse;

pub const USER_ID_HEADER: &str = "X-User-Id";

/// Authenticated user context extracted from the request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection type for AuthenticatedUser extraction.
#[derive(Debug)]
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| UserId::new(s).ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AuthenticatedUser { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<AuthenticatedUser, AuthenticationRequired> {
        let (mut parts, _) = request.into_parts();
        AuthenticatedUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_user_id_header() {
        let request = Request::builder()
            .header(USER_ID_HEADER, "user-1")
            .body(())
            .unwrap();

        let user = extract(request).await.unwrap();

        assert_eq!(user.user_id.as_str(), "user-1");
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let request = Request::builder().body(()).unwrap();

        let rejection = extract(request).await.unwrap_err();

        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
