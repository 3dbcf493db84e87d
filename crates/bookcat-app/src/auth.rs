//! Bearer-token authentication for mutating endpoints.

use axum::{extract::FromRequestParts, RequestPartsExt};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use http::request::Parts;
use tracing::{debug, error};

use bookcat_types::claim::{ApiClaim, Authorization as _, Role};

use crate::{error::ApiError, state::AppState};

impl FromRequestParts<AppState> for ApiClaim {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| {
                debug!("No bearer token in request");
                ApiError::Unauthorized
            })?;

        let claim = state
            .tokens()
            .validate::<ApiClaim>(header.0.token())
            .map_err(|e| {
                error!("Failed to validate token: {e}");
                ApiError::Unauthorized
            })?;
        Ok(claim)
    }
}

/// Role gate used by handlers behind authentication.
pub fn require_role(claim: &ApiClaim, role: Role) -> Result<(), ApiError> {
    if claim.has_role(role) {
        Ok(())
    } else {
        debug!("Token for {} lacks role {role}", claim.sub);
        Err(ApiError::Forbidden)
    }
}
