//! Pipeline execution: stage classification and sequential value threading
//!
//! A pipeline is an ordered list of stage tokens evaluated left to right.
//! Each token is classified into a concrete [`Stage`] (remote reference,
//! stdin, or named filter); the output of each stage becomes the input of
//! the next. Execution is single-threaded, synchronous, and fail-fast.
//!
//! # Example
//! ```no_run
//! use iopipe::config::Config;
//! use iopipe::pipeline::Pipeline;
//!
//! let config = Config::load()?;
//! let mut pipeline = Pipeline::new(&config)?;
//! let out = pipeline.execute(&[
//!     "https://example.test/resource".to_string(),
//!     "com.example.TypeA/com.example.TypeB".to_string(),
//! ])?;
//! println!("{}", out);
//! # Ok::<(), iopipe::error::IopipeError>(())
//! ```

pub mod executor;
pub mod stage;

pub use executor::Pipeline;
pub use stage::{Stage, StageResolver};
