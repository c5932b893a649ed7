//! Sandboxed filter execution
//!
//! A filter is a short, pure, single-input/single-output transformation
//! over pipeline values. The [`FilterSandbox`] trait is the seam between
//! the pipeline and the concrete script engine: compile once, invoke per
//! value, with a fresh execution environment for every invocation so no
//! state leaks between values. The shipped engine is Rhai
//! ([`ScriptSandbox`]); swapping engines is an implementation detail behind
//! the trait.

pub mod script;

use crate::error::IopipeResult;

pub use script::ScriptSandbox;

/// A compiled filter, ready to apply to pipeline values.
pub trait Filter: std::fmt::Debug {
    /// Apply the filter to one input value
    ///
    /// Each call runs in a fresh environment; separate calls on the same
    /// compiled filter share nothing.
    fn invoke(&self, input: &str) -> IopipeResult<String>;
}

/// Compiles filter source into an executable [`Filter`].
pub trait FilterSandbox {
    /// Compile `source`, surfacing syntax errors as `Compile` failures.
    fn compile(&self, source: &str) -> IopipeResult<Box<dyn Filter>>;
}
