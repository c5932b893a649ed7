//! iopipe — cross-API interoperability & data manager
//!
//! Chains heterogeneous stages (remote resource reads/writes, raw stdin,
//! and named transformation filters) into a single left-to-right pipeline:
//! the output of each stage becomes the input of the next. Filters are
//! content-addressed by SHA-256 digest, cached locally, and executed in a
//! sandboxed script engine.

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod object;
pub mod pipeline;
pub mod sandbox;

pub use cache::FilterCache;
pub use config::Config;
pub use error::{IopipeError, IopipeResult};
pub use gateway::{Gateway, ObjectReference};
pub use pipeline::Pipeline;
