//! Rhai-backed filter sandbox
//!
//! Filter scripts see the pipeline value as the `input` variable and must
//! evaluate to a string. A small immutable preamble (JSON helpers) is
//! registered once on the shared engine; per-invocation state lives in a
//! fresh `Scope`, so nothing carries over between values.
//!
//! Example filter:
//! ```rhai
//! let obj = json_parse(input);
//! obj.classid = "com.example.TypeB";
//! json_stringify(obj)
//! ```

use crate::error::{IopipeError, IopipeResult};
use crate::sandbox::{Filter, FilterSandbox};
use rhai::{Dynamic, Engine, Scope, AST};
use std::sync::Arc;

/// Filter sandbox backed by a shared, immutable Rhai engine.
pub struct ScriptSandbox {
    engine: Arc<Engine>,
}

impl ScriptSandbox {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine);
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Safety limits plus the helper preamble. Registered functions are
    /// pure; the engine holds no mutable state after construction.
    fn configure_engine(engine: &mut Engine) {
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(32);
        engine.set_max_operations(1_000_000);
        engine.set_max_string_size(10_000_000);
        engine.set_max_array_size(100_000);
        engine.set_max_map_size(100_000);

        engine.register_fn(
            "json_parse",
            |text: &str| -> Result<rhai::Map, Box<rhai::EvalAltResult>> {
                Engine::new().parse_json(text, true)
            },
        );
        engine.register_fn("json_stringify", |map: rhai::Map| {
            rhai::format_map_as_json(&map)
        });
    }
}

impl Default for ScriptSandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterSandbox for ScriptSandbox {
    fn compile(&self, source: &str) -> IopipeResult<Box<dyn Filter>> {
        let ast = self
            .engine
            .compile(source)
            .map_err(|e| IopipeError::Compile(e.to_string()))?;
        Ok(Box::new(CompiledScript {
            engine: self.engine.clone(),
            ast,
        }))
    }
}

/// One compiled filter script.
struct CompiledScript {
    engine: Arc<Engine>,
    ast: AST,
}

impl std::fmt::Debug for CompiledScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledScript")
            .field("ast", &self.ast)
            .finish_non_exhaustive()
    }
}

impl Filter for CompiledScript {
    fn invoke(&self, input: &str) -> IopipeResult<String> {
        let mut scope = Scope::new();
        scope.push("input", input.to_string());

        let value: Dynamic = self
            .engine
            .eval_ast_with_scope(&mut scope, &self.ast)
            .map_err(|e| IopipeError::Runtime(e.to_string()))?;

        value.into_string().map_err(|actual_type| {
            IopipeError::Runtime(format!(
                "filter must evaluate to a string, got {}",
                actual_type
            ))
        })
    }
}
