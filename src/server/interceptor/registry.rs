//! Routing-key to script dispatch tables.
//!
//! One registry exists per direction. A refresh compiles a complete new generation
//! off to the side and publishes it with a single store, so lookups see either the
//! old or the new table and never a mix.

use arc_swap::ArcSwap;
use serde::{de::DeserializeOwned, Deserialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

use crate::server::{
    error::script::ScriptError,
    interceptor::engine::{Script, ScriptEngine},
    routing::{client_key, parse_router, route_key},
};

/// Extra conditions a request must meet before a descriptor applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchPredicates {
    /// Exact client IP, when set.
    pub ip: Option<String>,
    /// `name=value` pairs that must all be present.
    pub cookies: Vec<(String, String)>,
}

impl MatchPredicates {
    /// Parses the `cookie` field of a server interceptor: `k=v;k2=v2`.
    fn parse_cookies(raw: &str) -> Vec<(String, String)> {
        raw.split(';')
            .filter_map(|pair| pair.split_once('='))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .filter(|(name, _)| !name.is_empty())
            .collect()
    }

    pub fn matches(&self, ip: &str, cookies: &HashMap<String, String>) -> bool {
        if let Some(required) = &self.ip {
            if required != ip {
                return false;
            }
        }

        self.cookies
            .iter()
            .all(|(name, value)| cookies.get(name) == Some(value))
    }
}

/// Shape shared by the interceptor configuration rows of both directions.
pub trait InterceptorConfig: DeserializeOwned {
    /// Category name used in log fields.
    const CATEGORY: &'static str;

    /// Routing key of the row, `None` when a required part is missing.
    fn routing_key(&self) -> Option<String>;

    fn before(&self) -> &str;

    fn after(&self) -> &str;

    fn predicates(&self) -> MatchPredicates {
        MatchPredicates::default()
    }
}

/// `httpServerInterceptor` row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerInterceptorConfig {
    /// `METHOD /route/template`
    pub router: String,
    pub before: String,
    pub after: String,
    pub ip: String,
    pub cookie: String,
}

impl InterceptorConfig for ServerInterceptorConfig {
    const CATEGORY: &'static str = "httpServerInterceptor";

    fn routing_key(&self) -> Option<String> {
        parse_router(&self.router).map(|(method, route)| route_key(&method, &route))
    }

    fn before(&self) -> &str {
        &self.before
    }

    fn after(&self) -> &str {
        &self.after
    }

    fn predicates(&self) -> MatchPredicates {
        let ip = self.ip.trim();
        MatchPredicates {
            ip: (!ip.is_empty()).then(|| ip.to_string()),
            cookies: MatchPredicates::parse_cookies(&self.cookie),
        }
    }
}

/// `httpClientInterceptor` row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientInterceptorConfig {
    pub service: String,
    pub method: String,
    pub route: String,
    pub before: String,
    pub after: String,
}

impl InterceptorConfig for ClientInterceptorConfig {
    const CATEGORY: &'static str = "httpClientInterceptor";

    fn routing_key(&self) -> Option<String> {
        if [&self.service, &self.method, &self.route]
            .iter()
            .any(|part| part.trim().is_empty())
        {
            return None;
        }
        Some(client_key(&self.service, &self.method, &self.route))
    }

    fn before(&self) -> &str {
        &self.before
    }

    fn after(&self) -> &str {
        &self.after
    }
}

/// Compiled scripts of one routing key. Immutable once built.
#[derive(Debug)]
pub struct ScriptDescriptor {
    pub key: String,
    pub before_source: String,
    pub after_source: String,
    pub predicates: MatchPredicates,
    before: Option<Script>,
    after: Option<Script>,
}

impl ScriptDescriptor {
    /// Compiles a descriptor from a decoded row. Blank sources are no-ops.
    pub fn build<C: InterceptorConfig>(
        engine: &ScriptEngine,
        key: String,
        config: &C,
    ) -> Result<Self, ScriptError> {
        let compile = |source: &str| -> Result<Option<Script>, ScriptError> {
            if source.trim().is_empty() {
                Ok(None)
            } else {
                engine.compile(source).map(Some)
            }
        };

        Ok(Self {
            before: compile(config.before())?,
            after: compile(config.after())?,
            key,
            before_source: config.before().to_string(),
            after_source: config.after().to_string(),
            predicates: config.predicates(),
        })
    }

    pub fn before(&self) -> Option<&Script> {
        self.before.as_ref()
    }

    pub fn after(&self) -> Option<&Script> {
        self.after.as_ref()
    }
}

/// Descriptors compare by their configuration; compiled ASTs follow from it.
impl PartialEq for ScriptDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.before_source == other.before_source
            && self.after_source == other.after_source
            && self.predicates == other.predicates
    }
}

impl Eq for ScriptDescriptor {}

/// One generation of descriptors keyed by routing key.
pub type Generation = HashMap<String, Arc<ScriptDescriptor>>;

/// Atomically swappable script table.
#[derive(Debug)]
pub struct ScriptRegistry {
    generation: ArcSwap<Generation>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self {
            generation: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Builds a new generation from raw JSON rows and publishes it.
    ///
    /// Rows without a routing key are dropped. Rows that fail to decode or compile are
    /// logged and skipped. When a key repeats, the first row wins; rows arrive newest
    /// first.
    ///
    /// # Returns
    /// - `usize` - Number of descriptors in the new generation
    pub fn update<C: InterceptorConfig>(&self, engine: &ScriptEngine, raw: &[String]) -> usize {
        let mut generation: Generation = HashMap::with_capacity(raw.len());

        for data in raw {
            let config = match serde_json::from_str::<C>(data) {
                Ok(config) => config,
                Err(e) => {
                    error!(category = C::CATEGORY, "Invalid interceptor: {}", e);
                    continue;
                }
            };
            let Some(key) = config.routing_key() else {
                debug!(category = C::CATEGORY, "Interceptor without routing key");
                continue;
            };
            if generation.contains_key(&key) {
                debug!(category = C::CATEGORY, key = %key, "Duplicate interceptor ignored");
                continue;
            }

            match ScriptDescriptor::build(engine, key.clone(), &config) {
                Ok(descriptor) => {
                    generation.insert(key, Arc::new(descriptor));
                }
                Err(e) => error!(category = C::CATEGORY, key = %key, "Interceptor script rejected: {}", e),
            }
        }

        let count = generation.len();
        self.generation.store(Arc::new(generation));
        count
    }

    /// Looks a routing key up in the current generation.
    pub fn lookup(&self, key: &str) -> Option<Arc<ScriptDescriptor>> {
        self.generation.load().get(key).cloned()
    }

    /// The current generation as a whole.
    pub fn generation(&self) -> Arc<Generation> {
        self.generation.load_full()
    }

    /// Routing keys of the current generation, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.generation.load().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for ScriptRegistry {
    fn default() -> Self {
        Self::new()
    }
}
