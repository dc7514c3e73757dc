use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};

use crate::{
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::{ChallengeResponse, GenerateChallengeRequest, HistoryResponse},
};

// Free-form, but it ends up inside the prompt.
const MAX_DIFFICULTY_LEN: usize = 32;

#[utoipa::path(
    post,
    path = "/generate-challenge",
    request_body = GenerateChallengeRequest,
    responses(
        (status = 200, description = "Challenge generated", body = ChallengeResponse),
        (status = 400, description = "Malformed body, blank or oversized difficulty"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 429, description = "Challenge quota exhausted"),
        (status = 500, description = "Generation failed")
    ),
    security(("bearer" = [])),
    tag = "challenges"
)]
pub async fn generate_challenge(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    payload: std::result::Result<Json<GenerateChallengeRequest>, JsonRejection>,
) -> Result<Json<ChallengeResponse>> {
    let Json(request) = payload?;
    validate_difficulty(&request.difficulty)?;

    // Stored and echoed exactly as sent.
    let challenge = state
        .challenges
        .generate(&user.user_id, &request.difficulty)
        .await?;

    Ok(Json(challenge))
}

fn validate_difficulty(difficulty: &str) -> Result<()> {
    let length = difficulty.trim().chars().count();
    if length == 0 || length > MAX_DIFFICULTY_LEN {
        return Err(AppError::Validation(format!(
            "difficulty must be between 1 and {} characters",
            MAX_DIFFICULTY_LEN
        )));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/my-history",
    responses(
        (status = 200, description = "Caller's challenges, newest first", body = HistoryResponse),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = [])),
    tag = "challenges"
)]
pub async fn my_history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<HistoryResponse>> {
    Ok(Json(state.challenges.history(&user.user_id).await?))
}
