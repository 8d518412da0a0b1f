use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Duration;
use tracing::{debug, warn};

use crate::server::{dynamic::router_mock::RouterMock, routing::ResolvedRoute, state::AppState};

const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Answers requests of mocked routes.
///
/// The mock delay is applied first. A delay-only mock then lets the request continue
/// to the handler.
pub async fn mock_router(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(key) = req.extensions().get::<ResolvedRoute>().map(ResolvedRoute::key) else {
        return next.run(req).await;
    };
    let uri = req
        .uri()
        .path_and_query()
        .map(|path_and_query| path_and_query.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let Some(mock) = state.dynamic.router_mocks.find(&key, &uri) else {
        return next.run(req).await;
    };

    if mock.delay_seconds > 0 {
        tokio::time::sleep(Duration::from_secs(mock.delay_seconds)).await;
    }

    if mock.is_delay_only() {
        return next.run(req).await;
    }

    debug!(router = %mock.router, "Request answered by router mock");
    mocked_response(&mock)
}

fn mocked_response(mock: &RouterMock) -> Response {
    let status = StatusCode::from_u16(mock.status).unwrap_or_else(|_| {
        warn!(router = %mock.router, status = mock.status, "Invalid router mock status");
        StatusCode::INTERNAL_SERVER_ERROR
    });
    let content_type = if mock.content_type.is_empty() {
        DEFAULT_CONTENT_TYPE
    } else {
        mock.content_type.as_str()
    };
    let content_type = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    (
        status,
        [(header::CONTENT_TYPE, content_type)],
        Body::from(mock.response.clone()),
    )
        .into_response()
}
