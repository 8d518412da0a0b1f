use thiserror::Error;

/// Failures of the embedded interceptor script engine.
///
/// Compile errors are normally caught while a configuration refresh builds a new
/// registry generation, so at request time only runtime errors are expected.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// The script source (including the shared prelude) is not valid syntax.
    #[error("Failed to compile interceptor script: {0}")]
    Compile(#[from] rhai::ParseError),

    /// The script threw, hit a type error, or exceeded its operation budget.
    #[error("Interceptor script failed: {0}")]
    Runtime(#[from] Box<rhai::EvalAltResult>),
}
