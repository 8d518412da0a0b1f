use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::server::state::AppState;

/// Inserts the [`ResolvedRoute`](crate::server::routing::ResolvedRoute) of the request.
///
/// Requests that match no API route pass through without one, so the layers keyed by
/// route skip them.
pub async fn resolve_route(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if let Some(route) = state.routes.resolve(req.method(), req.uri().path()) {
        req.extensions_mut().insert(route);
    }

    next.run(req).await
}
