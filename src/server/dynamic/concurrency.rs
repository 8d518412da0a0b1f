//! Per-route in-flight request limiter.
//!
//! The set of tracked routes is fixed when the router is built; refreshes only move
//! the ceilings. Counters are plain atomics so the hot path never takes a lock.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

use crate::server::routing::route_key;

/// A `routerConcurrency` configuration row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouterConcurrencyConfig {
    pub route: String,
    pub method: String,
    /// Ceiling of in-flight requests, `0` for unlimited.
    #[serde(default)]
    pub max: u32,
}

#[derive(Debug, Default)]
struct ConcurrencyEntry {
    current: AtomicU32,
    max: AtomicU32,
}

/// In-flight counters and ceilings keyed by `METHOD ROUTE`.
#[derive(Debug, Default)]
pub struct RouterConcurrency {
    entries: HashMap<String, Arc<ConcurrencyEntry>>,
}

impl RouterConcurrency {
    /// Registers every route key that will be tracked, all unlimited.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = keys
            .into_iter()
            .map(|key| (key.into(), Arc::new(ConcurrencyEntry::default())))
            .collect();

        Self { entries }
    }

    /// Increments the in-flight count of a route.
    ///
    /// # Returns
    /// - `(current, max)` - Count after the increment and the configured ceiling
    /// - `(0, 0)` - Unknown route, nothing was counted
    pub fn inc(&self, key: &str) -> (u32, u32) {
        match self.entries.get(key) {
            Some(entry) => {
                let current = entry.current.fetch_add(1, Ordering::AcqRel) + 1;
                (current, entry.max.load(Ordering::Acquire))
            }
            None => (0, 0),
        }
    }

    /// Decrements the in-flight count of a route. Must pair with a counted [`inc`](Self::inc).
    pub fn dec(&self, key: &str) {
        if let Some(entry) = self.entries.get(key) {
            // saturating so a stray call cannot wrap the counter
            let _ = entry
                .current
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_sub(1));
        }
    }

    /// Increments the count and returns a guard that decrements it when dropped.
    ///
    /// # Returns
    /// - `Some(ConcurrencyGuard)` - Route is tracked
    /// - `None` - Unknown route
    pub fn acquire(self: &Arc<Self>, key: &str) -> Option<ConcurrencyGuard> {
        if !self.entries.contains_key(key) {
            return None;
        }

        let (current, max) = self.inc(key);
        Some(ConcurrencyGuard {
            limiter: self.clone(),
            key: key.to_string(),
            current,
            max,
        })
    }

    /// Replaces every ceiling from the given rows.
    ///
    /// Rows come newest first; the first row of a route wins. Routes absent from
    /// `configs` fall back to unlimited. In-flight counts are untouched.
    pub fn reset(&self, configs: &[RouterConcurrencyConfig]) {
        let mut ceilings: HashMap<String, u32> = HashMap::with_capacity(configs.len());
        for config in configs {
            let key = route_key(&config.method, &config.route);
            if ceilings.contains_key(&key) {
                debug!(category = "routerConcurrency", key = %key, "Older concurrency limit ignored");
                continue;
            }
            ceilings.insert(key, config.max);
        }

        for (key, entry) in &self.entries {
            entry
                .max
                .store(ceilings.remove(key).unwrap_or(0), Ordering::Release);
        }

        for key in ceilings.keys() {
            debug!(category = "routerConcurrency", key = %key, "Concurrency limit for unregistered route");
        }
    }

    /// Decodes raw JSON rows and applies them with [`reset`](Self::reset).
    ///
    /// # Returns
    /// - `usize` - Number of rows that decoded
    pub fn reset_raw(&self, raw: &[String]) -> usize {
        let configs: Vec<RouterConcurrencyConfig> = raw
            .iter()
            .filter_map(|data| match serde_json::from_str(data) {
                Ok(config) => Some(config),
                Err(e) => {
                    error!(category = "routerConcurrency", "Invalid router concurrency: {}", e);
                    None
                }
            })
            .collect();

        self.reset(&configs);
        configs.len()
    }

    /// `(current, max)` of a route.
    pub fn get(&self, key: &str) -> Option<(u32, u32)> {
        self.entries.get(key).map(|entry| {
            (
                entry.current.load(Ordering::Acquire),
                entry.max.load(Ordering::Acquire),
            )
        })
    }

    /// `(key, current, max)` of every tracked route, sorted by key.
    pub fn snapshot(&self) -> Vec<(String, u32, u32)> {
        let mut entries: Vec<(String, u32, u32)> = self
            .entries
            .iter()
            .map(|(key, entry)| {
                (
                    key.clone(),
                    entry.current.load(Ordering::Acquire),
                    entry.max.load(Ordering::Acquire),
                )
            })
            .collect();
        entries.sort();
        entries
    }
}

/// Counted slot of a route; the count is released when the guard drops.
#[derive(Debug)]
pub struct ConcurrencyGuard {
    limiter: Arc<RouterConcurrency>,
    key: String,
    current: u32,
    max: u32,
}

impl ConcurrencyGuard {
    /// Whether the request pushed the route over its ceiling.
    pub fn exceeded(&self) -> bool {
        self.max != 0 && self.current > self.max
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}

impl Drop for ConcurrencyGuard {
    fn drop(&mut self) {
        self.limiter.dec(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTE_A: &str = "GET /a";
    const ROUTE_B: &str = "POST /b";

    fn limiter() -> Arc<RouterConcurrency> {
        Arc::new(RouterConcurrency::new([ROUTE_A, ROUTE_B]))
    }

    fn config(method: &str, route: &str, max: u32) -> RouterConcurrencyConfig {
        RouterConcurrencyConfig {
            route: route.to_string(),
            method: method.to_string(),
            max,
        }
    }

    /// Tests that unknown keys count nothing.
    #[test]
    fn unknown_key_is_noop() {
        let limiter = limiter();
        assert_eq!(limiter.inc("GET /unknown"), (0, 0));
        limiter.dec("GET /unknown");
        assert!(limiter.acquire("GET /unknown").is_none());
    }

    /// Tests that reset is total.
    ///
    /// Expected: a route missing from the second reset goes back to unlimited
    #[test]
    fn reset_is_total() {
        let limiter = limiter();
        limiter.reset(&[config("GET", "/a", 5), config("POST", "/b", 10)]);
        assert_eq!(limiter.get(ROUTE_B), Some((0, 10)));

        limiter.reset(&[config("GET", "/a", 5)]);
        assert_eq!(limiter.get(ROUTE_A), Some((0, 5)));
        assert_eq!(limiter.get(ROUTE_B), Some((0, 0)));
    }

    /// Tests that a reset keeps in-flight counts.
    #[test]
    fn reset_keeps_current() {
        let limiter = limiter();
        let _guard = limiter.acquire(ROUTE_A).unwrap();

        limiter.reset(&[config("get", "/a", 1)]);
        assert_eq!(limiter.get(ROUTE_A), Some((1, 1)));
    }

    /// Tests that the guard reports requests over the ceiling.
    #[test]
    fn guard_reports_exceeded() {
        let limiter = limiter();
        limiter.reset(&[config("GET", "/a", 1)]);

        let first = limiter.acquire(ROUTE_A).unwrap();
        assert!(!first.exceeded());

        let second = limiter.acquire(ROUTE_A).unwrap();
        assert!(second.exceeded());
        assert_eq!((second.current(), second.max()), (2, 1));

        drop(second);
        drop(first);
        assert_eq!(limiter.get(ROUTE_A), Some((0, 1)));
    }

    /// Tests counter balance across threads with panicking holders.
    ///
    /// Expected: current returns to zero after every thread finished, panicked or not
    #[test]
    fn counter_balances_with_panics() {
        let limiter = limiter();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let _guard = limiter.acquire(ROUTE_A);
                    }
                    let _guard = limiter.acquire(ROUTE_A);
                    if i % 2 == 0 {
                        panic!("handler failed");
                    }
                })
            })
            .collect();

        let panicked = handles
            .into_iter()
            .map(|handle| handle.join())
            .filter(Result::is_err)
            .count();

        assert_eq!(panicked, 8);
        assert_eq!(limiter.get(ROUTE_A), Some((0, 0)));
    }

    /// Tests that malformed raw rows are skipped.
    #[test]
    fn reset_raw_skips_bad_rows() {
        let limiter = limiter();
        let applied = limiter.reset_raw(&[
            r#"{"route":"/a","method":"GET","max":3}"#.to_string(),
            r#"{"route":"/b""#.to_string(),
        ]);

        assert_eq!(applied, 1);
        assert_eq!(limiter.get(ROUTE_A), Some((0, 3)));
        assert_eq!(limiter.get(ROUTE_B), Some((0, 0)));
    }

    /// Tests that the newest of several rows for one route wins.
    ///
    /// Expected: the ceiling of the first row, rows being ordered newest first
    #[test]
    fn newest_duplicate_row_wins() {
        let limiter = limiter();
        limiter.reset_raw(&[
            r#"{"route":"/a","method":"GET","max":5}"#.to_string(),
            r#"{"route":"/a","method":"get","max":1}"#.to_string(),
        ]);

        assert_eq!(limiter.get(ROUTE_A), Some((0, 5)));
    }
}
