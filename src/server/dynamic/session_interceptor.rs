//! Maintenance gate that rejects requests unless the account or route is allow-listed.

use arc_swap::ArcSwapOption;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::error;

use crate::model::configuration::SessionInterceptorDto;

/// A `sessionInterceptor` configuration row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionInterceptorConfig {
    /// Message returned with the 503 response.
    pub message: String,
    /// Comma-separated account list.
    pub allow_account: String,
    pub allow_accounts: Vec<String>,
    /// Route templates that bypass the gate.
    pub allow_routes: Vec<String>,
}

#[derive(Debug)]
struct ActiveInterceptor {
    message: String,
    accounts: HashSet<String>,
    routes: HashSet<String>,
}

impl From<SessionInterceptorConfig> for ActiveInterceptor {
    fn from(config: SessionInterceptorConfig) -> Self {
        let accounts = config
            .allow_accounts
            .into_iter()
            .chain(config.allow_account.split(',').map(str::to_string))
            .map(|account| account.trim().to_string())
            .filter(|account| !account.is_empty())
            .collect();

        Self {
            message: config.message,
            accounts,
            routes: config.allow_routes.into_iter().collect(),
        }
    }
}

/// The session gate currently in effect, if any.
#[derive(Debug, Default)]
pub struct SessionInterceptor {
    active: ArcSwapOption<ActiveInterceptor>,
}

impl SessionInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the gate from a raw JSON row.
    ///
    /// # Returns
    /// - `true` - Gate installed
    /// - `false` - Undecodable row, previous gate kept
    pub fn set(&self, raw: &str) -> bool {
        match serde_json::from_str::<SessionInterceptorConfig>(raw) {
            Ok(config) => {
                self.active.store(Some(Arc::new(config.into())));
                true
            }
            Err(e) => {
                error!(category = "sessionInterceptor", "Invalid session interceptor: {}", e);
                false
            }
        }
    }

    /// Removes the gate.
    pub fn unset(&self) {
        self.active.store(None);
    }

    /// Checks a request against the gate.
    ///
    /// # Arguments
    /// - `account` - Account of the session, if signed in
    /// - `route` - Resolved route template
    ///
    /// # Returns
    /// - `None` - Request may proceed
    /// - `Some(String)` - Request is rejected with this message
    pub fn check(&self, account: Option<&str>, route: &str) -> Option<String> {
        let guard = self.active.load();
        let active = guard.as_deref()?;

        if active.routes.contains(route) {
            return None;
        }
        if account.is_some_and(|account| active.accounts.contains(account)) {
            return None;
        }

        Some(active.message.clone())
    }

    pub fn is_active(&self) -> bool {
        self.active.load().is_some()
    }

    pub fn to_dto(&self) -> Option<SessionInterceptorDto> {
        self.active.load().as_deref().map(|active| {
            let mut allow_accounts: Vec<String> = active.accounts.iter().cloned().collect();
            allow_accounts.sort();
            let mut allow_routes: Vec<String> = active.routes.iter().cloned().collect();
            allow_routes.sort();

            SessionInterceptorDto {
                message: active.message.clone(),
                allow_accounts,
                allow_routes,
            }
        })
    }
}
