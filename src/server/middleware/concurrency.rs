use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::server::{
    error::{intercept::InterceptError, AppError},
    routing::ResolvedRoute,
    state::AppState,
};

/// Enforces the per-route concurrency ceiling.
///
/// The in-flight count is held by a guard for the whole inner call and released on
/// every exit, including rejections and cancelled requests.
pub async fn limit_concurrency(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(key) = req.extensions().get::<ResolvedRoute>().map(ResolvedRoute::key) else {
        return Ok(next.run(req).await);
    };
    let Some(guard) = state.dynamic.router_concurrency.acquire(&key) else {
        return Ok(next.run(req).await);
    };

    if guard.exceeded() {
        return Err(InterceptError::TooManyRequests {
            key: guard.key().to_string(),
            current: guard.current(),
            max: guard.max(),
        }
        .into());
    }

    let response = next.run(req).await;
    drop(guard);

    Ok(response)
}
