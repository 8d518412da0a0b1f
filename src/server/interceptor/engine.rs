//! Embedded rhai evaluator for interceptor scripts.
//!
//! One engine is shared by every request. It holds no per-run state: each run gets a
//! fresh `Scope` with its own `req` and `resp` bindings, so nothing leaks between
//! requests.

use rhai::{
    serde::{from_dynamic, to_dynamic},
    Dynamic, Engine, Map, Scope, AST,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::server::{
    dynamic::mock_time::MockTime,
    error::script::ScriptError,
    interceptor::facade::{RequestFacade, ResponseFacade},
};

/// Helpers available to every script.
const PRELUDE: &str = r#"
fn has_prefix(value, prefix) {
    value.starts_with(prefix)
}

fn pick(map, keys) {
    let out = #{};
    for key in keys {
        if key in map {
            out[key] = map[key];
        }
    }
    out
}

fn omit(map, keys) {
    let out = map;
    for key in keys {
        out.remove(key);
    }
    out
}
"#;

const MAX_CALL_LEVELS: usize = 32;
const MAX_EXPR_DEPTH: usize = 64;
const MAX_FUNCTION_EXPR_DEPTH: usize = 32;
const MAX_STRING_SIZE: usize = 1 << 20;
const MAX_COLLECTION_SIZE: usize = 10_000;

/// A compiled interceptor script.
#[derive(Debug, Clone)]
pub struct Script {
    ast: AST,
}

fn to_string_map<'a, I>(entries: I) -> Map
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.as_str().into(), Dynamic::from(value.clone())))
        .collect()
}

fn from_string_map(map: Map) -> BTreeMap<String, String> {
    map.into_iter()
        .map(|(key, value)| {
            let value = if value.is_string() {
                value.into_string().unwrap_or_default()
            } else {
                value.to_string()
            };
            (key.to_string(), value)
        })
        .collect()
}

fn to_json_map(body: &serde_json::Map<String, Value>) -> Dynamic {
    to_dynamic(body).unwrap_or_else(|_| Dynamic::from(Map::new()))
}

/// Converts a script value back to a JSON object; anything else is rejected.
fn from_json_map(value: &Dynamic) -> Option<serde_json::Map<String, Value>> {
    match from_dynamic::<Value>(value) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn register_request(engine: &mut Engine) {
    engine
        .register_type_with_name::<RequestFacade>("Request")
        .register_get("uri", |req: &mut RequestFacade| req.uri.clone())
        .register_get("ip", |req: &mut RequestFacade| req.ip.clone())
        .register_get("cookies", |req: &mut RequestFacade| {
            to_string_map(req.cookies.iter())
        })
        .register_get_set(
            "params",
            |req: &mut RequestFacade| to_string_map(req.params.iter()),
            |req: &mut RequestFacade, params: Map| req.set_params(from_string_map(params)),
        )
        .register_get_set(
            "query",
            |req: &mut RequestFacade| to_string_map(req.query.iter()),
            |req: &mut RequestFacade, query: Map| req.set_query(from_string_map(query)),
        )
        .register_get_set(
            "body",
            |req: &mut RequestFacade| to_json_map(&req.body),
            |req: &mut RequestFacade, body: Dynamic| {
                if let Some(body) = from_json_map(&body) {
                    req.set_body(body);
                }
            },
        );
}

fn register_response(engine: &mut Engine) {
    engine
        .register_type_with_name::<ResponseFacade>("Response")
        .register_get_set(
            "status",
            |resp: &mut ResponseFacade| resp.status,
            |resp: &mut ResponseFacade, status: i64| resp.set_status(status),
        )
        .register_get_set(
            "header",
            |resp: &mut ResponseFacade| to_string_map(resp.header.iter()),
            |resp: &mut ResponseFacade, header: Map| resp.set_header(from_string_map(header)),
        )
        .register_get_set(
            "body",
            |resp: &mut ResponseFacade| to_json_map(&resp.body),
            |resp: &mut ResponseFacade, body: Dynamic| {
                if let Some(body) = from_json_map(&body) {
                    resp.set_body(body);
                }
            },
        );
}

/// Compiles and runs interceptor scripts.
pub struct ScriptEngine {
    engine: Engine,
}

impl ScriptEngine {
    /// Creates the shared engine.
    ///
    /// # Arguments
    /// - `clock` - Clock behind the `now()` helper, honours mock time
    /// - `max_operations` - Operation budget of a single run
    pub fn new(clock: Arc<MockTime>, max_operations: u64) -> Self {
        let mut engine = Engine::new();

        engine.set_max_operations(max_operations);
        engine.set_max_call_levels(MAX_CALL_LEVELS);
        engine.set_max_expr_depths(MAX_EXPR_DEPTH, MAX_FUNCTION_EXPR_DEPTH);
        engine.set_max_string_size(MAX_STRING_SIZE);
        engine.set_max_array_size(MAX_COLLECTION_SIZE);
        engine.set_max_map_size(MAX_COLLECTION_SIZE);

        engine.on_print(|text| info!(target: "interceptor", "{}", text));
        engine.register_fn("now", move || clock.now().to_rfc3339());

        register_request(&mut engine);
        register_response(&mut engine);

        Self { engine }
    }

    /// Compiles a script with the shared prelude in front of it.
    ///
    /// # Returns
    /// - `Ok(Script)` - Compiled script
    /// - `Err(ScriptError::Compile)` - Syntax error
    pub fn compile(&self, source: &str) -> Result<Script, ScriptError> {
        let ast = self.engine.compile(format!("{}\n{}", PRELUDE, source))?;
        Ok(Script { ast })
    }

    /// Runs a script with `req` and `resp` bound.
    ///
    /// The facades are written back even when the script fails half-way, so whatever
    /// was assigned before the failure is visible to the caller. Exceeding the operation
    /// budget is a runtime error.
    ///
    /// # Returns
    /// - `Ok(())` - Script completed
    /// - `Err(ScriptError::Runtime)` - Script threw, hit a type error or ran out of budget
    pub fn run(
        &self,
        script: &Script,
        req: &mut RequestFacade,
        resp: &mut ResponseFacade,
    ) -> Result<(), ScriptError> {
        let mut scope = Scope::new();
        scope.push("req", req.clone());
        scope.push("resp", resp.clone());

        let result = self.engine.run_ast_with_scope(&mut scope, &script.ast);

        if let Some(value) = scope.get_value::<RequestFacade>("req") {
            *req = value;
        }
        if let Some(value) = scope.get_value::<ResponseFacade>("resp") {
            *resp = value;
        }

        result.map_err(ScriptError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> ScriptEngine {
        ScriptEngine::new(Arc::new(MockTime::new()), 10_000)
    }

    fn run(source: &str, req: &mut RequestFacade, resp: &mut ResponseFacade) -> Result<(), ScriptError> {
        let engine = engine();
        let script = engine.compile(source)?;
        engine.run(&script, req, resp)
    }

    /// Tests that reading never flips a modified flag.
    #[test]
    fn reads_do_not_mark_fields_modified() {
        let mut req = RequestFacade {
            uri: "/users/v1/me?page=1".to_string(),
            query: BTreeMap::from([("page".to_string(), "1".to_string())]),
            ..Default::default()
        };
        let mut resp = ResponseFacade::default();

        run(
            r#"if req.query.page == "1" && has_prefix(req.uri, "/users") { resp.status = 204; }"#,
            &mut req,
            &mut resp,
        )
        .unwrap();

        assert_eq!(resp.status, 204);
        assert!(resp.modified_status);
        assert!(!req.modified_query && !req.modified_params && !req.modified_body);
    }

    /// Tests that nested assignments go through the setters.
    #[test]
    fn nested_assignment_marks_field_modified() {
        let mut req = RequestFacade::default();
        let mut resp = ResponseFacade::default();

        run(
            r#"req.query.page = "2"; req.body.user = #{ name: "ann", tags: [1, 2] };"#,
            &mut req,
            &mut resp,
        )
        .unwrap();

        assert!(req.modified_query);
        assert!(req.modified_body);
        assert!(!req.modified_params);
        assert_eq!(req.query.get("page").map(String::as_str), Some("2"));
        assert_eq!(req.body.get("user"), Some(&json!({"name": "ann", "tags": [1, 2]})));
    }

    /// Tests the prelude helpers.
    #[test]
    fn prelude_helpers() {
        let mut req = RequestFacade::default();
        req.body.insert("a".to_string(), json!(1));
        req.body.insert("b".to_string(), json!(2));
        req.body.insert("secret".to_string(), json!("x"));
        let mut resp = ResponseFacade::default();

        run(
            r#"resp.body = omit(req.body, ["secret"]); req.body = pick(req.body, ["a", "missing"]);"#,
            &mut req,
            &mut resp,
        )
        .unwrap();

        assert_eq!(serde_json::Value::Object(req.body), json!({"a": 1}));
        assert_eq!(serde_json::Value::Object(resp.body), json!({"a": 1, "b": 2}));
    }

    /// Tests that a non-object body assignment is ignored.
    #[test]
    fn rejects_non_object_body() {
        let mut req = RequestFacade::default();
        let mut resp = ResponseFacade::default();

        run(r#"req.body = 42;"#, &mut req, &mut resp).unwrap();
        assert!(!req.modified_body);
    }

    /// Tests the error surface: syntax errors, thrown errors and the operation budget.
    #[test]
    fn surfaces_script_errors() {
        let engine = engine();
        assert!(matches!(
            engine.compile("let = ;"),
            Err(ScriptError::Compile(_))
        ));

        let mut req = RequestFacade::default();
        let mut resp = ResponseFacade::default();

        let thrown = engine.compile(r#"resp.status = 418; throw "boom";"#).unwrap();
        assert!(matches!(
            engine.run(&thrown, &mut req, &mut resp),
            Err(ScriptError::Runtime(_))
        ));
        assert_eq!(resp.status, 418);

        let endless = engine.compile("loop { }").unwrap();
        assert!(matches!(
            engine.run(&endless, &mut req, &mut resp),
            Err(ScriptError::Runtime(_))
        ));
    }

    /// Tests that `now()` follows mock time.
    #[test]
    fn now_uses_mock_time() {
        let clock = Arc::new(MockTime::new());
        clock.set("2030-01-01T00:00:00Z");
        let engine = ScriptEngine::new(clock, 10_000);
        let script = engine.compile(r#"resp.header = #{ "x-now": now() };"#).unwrap();

        let mut req = RequestFacade::default();
        let mut resp = ResponseFacade::default();
        engine.run(&script, &mut req, &mut resp).unwrap();

        assert_eq!(
            resp.header.get("x-now").map(String::as_str),
            Some("2030-01-01T00:00:00+00:00")
        );
    }

    /// Tests that top-level return ends the script early.
    #[test]
    fn supports_early_return() {
        let mut req = RequestFacade::default();
        let mut resp = ResponseFacade::default();

        run(r#"if req.ip == "" { return; } resp.status = 500;"#, &mut req, &mut resp).unwrap();
        assert_eq!(resp.status, 0);
    }
}
