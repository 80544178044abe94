/// Request extractors
///
/// - [`Presented`]: the Basic credential exactly as the client sent it
/// - [`Owner`]: the Basic credential of the caller, already salted
/// - [`PathId`]: a positive integer path parameter such as `taskId`

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Basic, Authorization},
    TypedHeader,
};
use tasktrack_shared::auth::{BasicCredentials, Credential};
use tracing::debug;

use crate::app::AppState;
use crate::error::{ApiError, ErrorType};

/// Basic credentials read from the `Authorization` header
///
/// Rejects with 401 and the Basic challenge when the header is absent, uses
/// another scheme, or does not decode to `username:password`.
#[derive(Debug, Clone)]
pub struct Presented(pub BasicCredentials);

#[async_trait]
impl<S> FromRequestParts<S> for Presented
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(basic)) =
            TypedHeader::<Authorization<Basic>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    debug!(reason = ?rejection.reason(), "Rejected authorization header");
                    ApiError::Unauthorized
                })?;

        Ok(Presented(BasicCredentials::new(
            basic.username(),
            basic.password(),
        )))
    }
}

/// Credential of the calling task owner
///
/// Rejects with 401 and the Basic challenge when no usable credential was
/// presented. Whether it matches an account is decided by the store.
#[derive(Debug, Clone)]
pub struct Owner(pub Credential);

#[async_trait]
impl FromRequestParts<AppState> for Owner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Presented(presented) = Presented::from_request_parts(parts, state).await?;

        Ok(Owner(state.salter.credential(&presented)))
    }
}

/// Positive integer taken from the single path parameter
///
/// Anything else is rejected with `PARAMETER_REQUIRED` naming the parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::bad_request(ErrorType::ParameterRequired, "id"))?;

        let (name, raw) = params
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::bad_request(ErrorType::ParameterRequired, "id"))?;

        raw.parse::<i64>()
            .ok()
            .filter(|id| *id >= 1)
            .map(PathId)
            .ok_or_else(|| ApiError::bad_request(ErrorType::ParameterRequired, name))
    }
}
