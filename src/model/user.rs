use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identity of the caller as seen by the session and tracking middleware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    /// Account stored in the session, `None` for anonymous callers.
    pub account: Option<String>,
    /// Tracking id from the signed `jt` cookie.
    pub track_id: Option<String>,
}
