use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::server::{
    error::AppError,
    interceptor::facade::{RequestFacade, ResponseFacade},
    middleware::client_ip::ClientIp,
    routing::ResolvedRoute,
    state::AppState,
    util::cookie::parse_cookies,
};

/// Largest request or response body buffered for a script.
const MAX_INTERCEPTED_BODY: usize = 8 * 1024 * 1024;

/// Runs the server interceptor scripts of the resolved route.
///
/// Requests without a descriptor, or whose IP and cookies do not satisfy its
/// predicates, pass through untouched. A "before" script that sets `resp.status`
/// answers the request without calling the handler; otherwise its modifications are
/// written back before the inner router routes the request. An "after" script
/// rewrites the handler's response. A failing script yields a 500 response.
pub async fn intercept_http(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(mut route) = req.extensions().get::<ResolvedRoute>().cloned() else {
        return Ok(next.run(req).await);
    };
    let Some(descriptor) = state.dynamic.server_interceptors.lookup(&route.key()) else {
        return Ok(next.run(req).await);
    };

    let ip = req
        .extensions()
        .get::<ClientIp>()
        .map(|ClientIp(ip)| ip.clone())
        .unwrap_or_default();
    if !descriptor
        .predicates
        .matches(&ip, &parse_cookies(req.headers()))
    {
        return Ok(next.run(req).await);
    }

    let (mut parts, body) = req.into_parts();
    let mut body = to_bytes(body, MAX_INTERCEPTED_BODY)
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read request body: {}", e)))?;
    let mut facade = RequestFacade::from_server(&parts, &route, &ip, &body);

    if let Some(script) = descriptor.before() {
        let mut resp = ResponseFacade::default();
        state.dynamic.engine.run(script, &mut facade, &mut resp)?;

        if resp.is_short_circuit() {
            debug!(key = %descriptor.key, "Request answered by interceptor");
            return Ok(resp.to_response());
        }

        facade.apply_to_server(&mut parts, &mut route, &mut body);
        parts.extensions.insert(route);
    }

    let response = next.run(Request::from_parts(parts, Body::from(body))).await;

    let Some(script) = descriptor.after() else {
        return Ok(response);
    };

    let (mut parts, body) = response.into_parts();
    let mut body = to_bytes(body, MAX_INTERCEPTED_BODY)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to read response body: {}", e)))?;
    let mut resp = ResponseFacade::from_response(parts.status.as_u16(), &parts.headers, &body);
    state.dynamic.engine.run(script, &mut facade, &mut resp)?;
    resp.apply(&mut parts.status, &mut parts.headers, &mut body);

    Ok(Response::from_parts(parts, Body::from(body)))
}
