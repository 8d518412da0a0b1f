use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    model::api::ErrorDto,
    server::{error::AppError, service::location::LocationService, state::AppState},
};

/// Tag for grouping common endpoints in OpenAPI documentation
pub static COMMON_TAG: &str = "common";

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/ping",
    tag = COMMON_TAG,
    responses(
        (status = 200, description = "Server is up", body = String)
    ),
)]
pub async fn ping() -> &'static str {
    "pong"
}

/// Look up the location of an IP address.
///
/// The lookup goes through the intercepted HTTP client, so the answer may come from
/// the upstream or from a client interceptor script. Status, content type and body are
/// passed through.
///
/// # Returns
/// - Upstream status - Location data
/// - `400 Bad Request` - Blank IP
/// - `500 Internal Server Error` - Upstream unreachable or interceptor script failed
#[utoipa::path(
    get,
    path = "/commons/v1/ip-locations/{ip}",
    tag = COMMON_TAG,
    params(
        ("ip" = String, Path, description = "IPv4 or IPv6 address")
    ),
    responses(
        (status = 200, description = "Location data of the upstream"),
        (status = 400, description = "Invalid IP", body = ErrorDto),
        (status = 500, description = "Internal server error", body = ErrorDto)
    ),
)]
pub async fn get_ip_location(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let location = LocationService::new(&state.location).lookup(&ip).await?;

    let mut response = Response::new(Body::from(location.body));
    *response.status_mut() = location.status;
    if let Some(content_type) = location.headers.get(header::CONTENT_TYPE) {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type.clone());
    }

    Ok(response)
}
