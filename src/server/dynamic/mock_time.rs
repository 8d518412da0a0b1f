//! Operator-controlled clock override.

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::error;

/// Clock that reports a configured instant instead of the wall clock while a
/// `mockTime` row is active.
#[derive(Debug, Default)]
pub struct MockTime {
    value: ArcSwapOption<DateTime<Utc>>,
}

impl MockTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a mock instant parsed from RFC 3339.
    ///
    /// # Returns
    /// - `true` - Mock time installed
    /// - `false` - Unparsable value, previous state kept
    pub fn set(&self, raw: &str) -> bool {
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(value) => {
                self.value.store(Some(Arc::new(value.with_timezone(&Utc))));
                true
            }
            Err(e) => {
                error!(category = "mockTime", value = %raw, "Invalid mock time: {}", e);
                false
            }
        }
    }

    /// Removes the override.
    pub fn clear(&self) {
        self.value.store(None);
    }

    /// The override currently in effect, if any.
    pub fn get(&self) -> Option<DateTime<Utc>> {
        self.value.load().as_deref().copied()
    }

    /// Current time, honouring the override.
    pub fn now(&self) -> DateTime<Utc> {
        self.get().unwrap_or_else(Utc::now)
    }
}
