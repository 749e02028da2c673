use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;
use zipline_core::Owner;

use crate::error::AppError;

/// Header carrying the caller's user id. The value stands in for an
/// authenticated principal; absence means an anonymous caller.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity extracted from [`USER_ID_HEADER`].
pub struct Caller(pub Owner);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(Self(Owner::Anonymous));
        };

        let user = value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or_else(|| {
                AppError::BadRequest(format!("{} must be a valid uuid", USER_ID_HEADER))
            })?;
        Ok(Self(Owner::User(user)))
    }
}
