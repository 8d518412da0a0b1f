use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use crate::server::{
    error::{intercept::InterceptError, AppError},
    middleware::session::AccountSession,
    routing::ResolvedRoute,
    state::AppState,
};

/// Rejects requests with 503 while the session interceptor is active.
///
/// Allowed accounts and allowed route templates pass. The session is only read while
/// an interceptor is configured.
pub async fn intercept_session(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.dynamic.session_interceptor.is_active() {
        return Ok(next.run(req).await);
    }

    let account = match req.extensions().get::<Session>().cloned() {
        Some(session) => AccountSession::new(&session).get_account().await?,
        None => None,
    };
    let route = req
        .extensions()
        .get::<ResolvedRoute>()
        .map(|route| route.route.clone())
        .unwrap_or_else(|| req.uri().path().to_string());

    if let Some(message) = state
        .dynamic
        .session_interceptor
        .check(account.as_deref(), &route)
    {
        return Err(InterceptError::SessionIntercepted { message }.into());
    }

    Ok(next.run(req).await)
}
