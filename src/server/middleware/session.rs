//! Type-safe session management wrapper.
//!
//! The session only carries the caller's account, which the session interceptor checks
//! against its allow lists. Keeping the key behind a wrapper prevents typos and keeps
//! the stored type consistent between writers and readers.

use tower_sessions::Session;

use crate::server::error::AppError;

// Session key constants
const SESSION_AUTH_ACCOUNT: &str = "auth:account";

/// Account session management.
///
/// Handles storing and retrieving the account of the caller and clearing the session.
pub struct AccountSession<'a> {
    /// The underlying tower-sessions Session instance.
    session: &'a Session,
}

impl<'a> AccountSession<'a> {
    /// Creates a new AccountSession wrapper.
    ///
    /// # Arguments
    /// - `session` - Reference to the tower-sessions Session to wrap
    ///
    /// # Returns
    /// A new AccountSession instance
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Stores the caller's account in the session.
    ///
    /// # Arguments
    /// - `account` - Account name
    ///
    /// # Returns
    /// - `Ok(())` - Account successfully stored
    /// - `Err(AppError::SessionErr(_))` - Failed to store in session
    pub async fn set_account(&self, account: &str) -> Result<(), AppError> {
        self.session
            .insert(SESSION_AUTH_ACCOUNT, account.to_string())
            .await?;
        Ok(())
    }

    /// Retrieves the caller's account from the session.
    ///
    /// # Returns
    /// - `Ok(Some(account))` - Account stored in the session
    /// - `Ok(None)` - Anonymous caller
    /// - `Err(AppError::SessionErr(_))` - Failed to access session
    pub async fn get_account(&self) -> Result<Option<String>, AppError> {
        Ok(self.session.get::<String>(SESSION_AUTH_ACCOUNT).await?)
    }

    /// Clears all data from the session.
    pub async fn clear(&self) {
        self.session.clear().await;
    }
}
