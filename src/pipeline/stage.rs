use crate::error::IopipeResult;
use crate::gateway::ObjectReference;
use std::io::Read;
use url::Url;

/// One classified operation within a pipeline
///
/// Built once per pipeline argument; immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// An absolute `http`/`https` locator: read at index 0, update after.
    RemoteRef(ObjectReference),
    /// Literal `-` at index 0: the raw stdin stream is the produced value.
    StdinRaw,
    /// Literal `-` after index 0: stdin is inline filter source, compiled
    /// fresh and applied to the previous value. Never persisted to the
    /// cache.
    StdinScript(String),
    /// Anything else: a cache key, alias, or registry reference.
    NamedFilter(String),
}

/// Classifies one pipeline argument into a concrete stage
///
/// Precedence, first match wins: absolute http(s) URL, then literal `-`,
/// then named filter as the catch-all. The resolver holds no state across
/// stages.
pub struct StageResolver;

impl StageResolver {
    /// Classify `argument` for position `index`. Reads `stdin` to
    /// exhaustion only when the argument is `-` past index 0.
    pub fn classify(argument: &str, index: usize, stdin: &mut dyn Read) -> IopipeResult<Stage> {
        if let Ok(url) = Url::parse(argument) {
            if url.scheme() == "http" || url.scheme() == "https" {
                return Ok(Stage::RemoteRef(ObjectReference::parse(argument)?));
            }
        }
        if argument == "-" {
            if index == 0 {
                return Ok(Stage::StdinRaw);
            }
            let mut source = String::new();
            stdin.read_to_string(&mut source)?;
            return Ok(Stage::StdinScript(source));
        }
        Ok(Stage::NamedFilter(argument.to_string()))
    }
}
