use axum::{extract::Extension, response::IntoResponse, Json};
use tower_sessions::Session;

use crate::{
    model::{api::ErrorDto, user::AccountDto},
    server::{error::AppError, middleware::session::AccountSession, middleware::tracker::TrackId},
};

/// Tag for grouping user endpoints in OpenAPI documentation
pub static USER_TAG: &str = "user";

/// Get the current caller.
///
/// Returns the account stored in the session, if any, and the tracking id of the
/// signed `jt` cookie.
///
/// # Returns
/// - `200 OK` - Caller identity
/// - `500 Internal Server Error` - Session store error
#[utoipa::path(
    get,
    path = "/users/v1/me",
    tag = USER_TAG,
    responses(
        (status = 200, description = "Current caller", body = AccountDto),
        (status = 500, description = "Internal server error", body = ErrorDto)
    ),
)]
pub async fn get_me(
    session: Session,
    track_id: Option<Extension<TrackId>>,
) -> Result<impl IntoResponse, AppError> {
    let account = AccountSession::new(&session).get_account().await?;

    Ok(Json(AccountDto {
        account,
        track_id: track_id.map(|Extension(TrackId(id))| id),
    }))
}
