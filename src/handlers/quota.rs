use axum::{extract::State, response::Json};

use crate::{
    errors::Result,
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::QuotaResponse,
};

#[utoipa::path(
    get,
    path = "/quota",
    responses(
        (status = 200, description = "Remaining challenge quota", body = QuotaResponse),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = [])),
    tag = "quota"
)]
pub async fn get_quota(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<QuotaResponse>> {
    Ok(Json(state.quotas.current(&user.user_id).await?))
}
