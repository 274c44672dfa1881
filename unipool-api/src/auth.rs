use crate::error::AppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

pub const USER_HEADER: &str = "x-user-id";

/// Acting user, as established by the campus SSO gateway upstream and
/// forwarded on a trusted header. Credential checking is the gateway's job;
/// this service only needs a stable user id.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthenticated(format!("missing {} header", USER_HEADER))
            })?;

        let user_id = Uuid::parse_str(raw).map_err(|_| {
            AppError::Unauthenticated(format!("invalid {} header", USER_HEADER))
        })?;

        Ok(CurrentUser(user_id))
    }
}
