use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::{errors::AppError, handlers::AppState};

/// Identity of the caller, taken from a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .ok_or_else(|| AppError::Auth("Authentication required".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Auth("Expected a bearer token".to_string()))?;

        let claims = state.jwt.verify_access_token(token).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            AppError::Auth("Invalid or expired token".to_string())
        })?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
        })
    }
}
