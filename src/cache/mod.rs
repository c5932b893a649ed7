//! Content-addressed filter cache with a remote registry fallback
//!
//! Filter source lives in a single flat namespace (digests plus aliases)
//! under one root directory. A local hit always short-circuits the network:
//! only on `NotFound` is the registry consulted, and fetched source is
//! verified and written to the store before first use.

pub mod registry;
pub mod store;

use crate::config::Config;
use crate::error::{IopipeError, IopipeResult};
use log::debug;

pub use registry::FilterRegistry;
pub use store::{digest, is_digest, FilterStore};

/// The filter cache a pipeline resolves named filters against.
pub struct FilterCache {
    store: FilterStore,
    registry: FilterRegistry,
}

impl FilterCache {
    pub fn open(config: &Config) -> IopipeResult<Self> {
        Ok(Self {
            store: FilterStore::open(&config.cache_root)?,
            registry: FilterRegistry::new(config.registry_base.clone()),
        })
    }

    pub fn store(&self) -> &FilterStore {
        &self.store
    }

    /// Resolve `reference` (digest, alias, or registry lookup key) to filter
    /// source bytes.
    pub fn resolve(&self, reference: &str) -> IopipeResult<Vec<u8>> {
        match self.store.read(reference) {
            Ok(source) => {
                debug!("filter cache hit: {}", reference);
                Ok(source)
            }
            Err(IopipeError::NotFound(_)) => {
                debug!("filter cache miss, consulting registry: {}", reference);
                let source = self.registry.fetch(reference)?;
                let id = self.store.write(&source)?;
                // Non-digest references get an alias so the next resolution
                // is a local hit. Last-writer-wins on refresh.
                if reference != id {
                    self.store.retag(&id, reference)?;
                }
                Ok(source)
            }
            Err(e) => Err(e),
        }
    }
}
