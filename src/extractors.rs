//! Request extractors shared by the REST handlers.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the authenticated user's id, set by the upstream gateway.
const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's display name.
const USER_NAME_HEADER: &str = "x-user-name";

/// Identity of the authenticated requester.
///
/// Authentication itself happens upstream; the gateway forwards the verified
/// identity as trusted headers, and requests without them are rejected as
/// unauthorized.
#[derive(Debug, Clone)]
pub struct RequesterIdentity {
    pub user_id: Uuid,
    pub username: String,
}

impl<S> FromRequestParts<S> for RequesterIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing user identity header".into()))?;
        let user_id = Uuid::parse_str(user_id)
            .map_err(|_| AppError::Unauthorized("malformed user identity header".into()))?;

        let username = parts
            .headers
            .get(USER_NAME_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| AppError::Unauthorized("missing user name header".into()))?
            .to_owned();

        Ok(Self { user_id, username })
    }
}
