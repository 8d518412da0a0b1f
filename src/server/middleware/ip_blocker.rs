use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::server::{
    error::{intercept::InterceptError, AppError},
    middleware::client_ip::ClientIp,
    state::AppState,
};

/// Rejects requests whose client IP is on the blocklist with 403.
pub async fn block_ip(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(ClientIp(ip)) = req.extensions().get::<ClientIp>() {
        if state.dynamic.ip_blocker.is_blocked(ip) {
            return Err(InterceptError::BlockedIp(ip.clone()).into());
        }
    }

    Ok(next.run(req).await)
}
