use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::{handlers::AppState, services::metrics::RequestTimer};

pub async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let timer = RequestTimer::start();
    let method = request.method().clone();
    // Matched route template, so path parameters don't explode label cardinality.
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    state.metrics.record_request(
        method.as_str(),
        &route,
        response.status().as_u16(),
        timer.elapsed(),
    );

    response
}
