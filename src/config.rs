use crate::error::{IopipeError, IopipeResult};
use std::path::PathBuf;
use url::Url;

/// Default filter registry location.
pub const DEFAULT_REGISTRY_BASE: &str = "http://192.241.174.50/filters/";

/// Cache directory relative to the user's home directory.
const CACHE_DIR_PARTS: [&str; 2] = [".iopipe", "filter_cache"];

/// HTTP verb used by the gateway's update operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateVerb {
    #[default]
    Post,
    Put,
}

/// Explicit configuration threaded into the components that need it
///
/// Replaces process-wide mutable state (global cache root, global debug
/// flag) with one value constructed by the CLI and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of the content-addressed filter cache.
    pub cache_root: PathBuf,

    /// Base location of the remote filter registry. Filter references are
    /// resolved against this by simple path joining.
    pub registry_base: Url,

    /// Verb used when a pipeline stage updates a remote resource.
    pub update_verb: UpdateVerb,
}

impl Config {
    /// Build a configuration with the default cache root (under the user's
    /// home directory) and the default registry.
    pub fn load() -> IopipeResult<Self> {
        let home = dirs_next::home_dir()
            .ok_or_else(|| IopipeError::Config("Cannot determine home directory".to_string()))?;
        let mut cache_root = home;
        for part in CACHE_DIR_PARTS {
            cache_root.push(part);
        }
        Ok(Self {
            cache_root,
            registry_base: Url::parse(DEFAULT_REGISTRY_BASE)
                .map_err(|e| IopipeError::Config(e.to_string()))?,
            update_verb: UpdateVerb::default(),
        })
    }

    /// Override the cache root.
    pub fn with_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = root.into();
        self
    }

    /// Override the registry base location.
    pub fn with_registry_base(mut self, base: Url) -> Self {
        self.registry_base = base;
        self
    }

    /// Use PUT instead of POST for remote updates.
    pub fn with_update_verb(mut self, verb: UpdateVerb) -> Self {
        self.update_verb = verb;
        self
    }
}
