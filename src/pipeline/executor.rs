use crate::cache::FilterCache;
use crate::config::Config;
use crate::error::{IopipeError, IopipeResult};
use crate::gateway::Gateway;
use crate::pipeline::stage::{Stage, StageResolver};
use crate::sandbox::{FilterSandbox, ScriptSandbox};
use log::{debug, info};
use std::io::Read;

/// Pipeline executor: drives an ordered sequence of stage arguments,
/// threading a single opaque string value through them
///
/// Execution is strictly sequential and fail-fast: the first error aborts
/// the run, no later stage executes, and no partial result is surfaced as
/// success. Side effects of stages that already completed (a remote update
/// already sent, a filter already cached) are not rolled back.
pub struct Pipeline {
    gateway: Gateway,
    cache: FilterCache,
    sandbox: Box<dyn FilterSandbox>,
    input: Box<dyn Read>,
}

impl Pipeline {
    /// Build a pipeline bound to the configured gateway, cache, and
    /// sandbox, reading `-` stages from the process stdin.
    pub fn new(config: &Config) -> IopipeResult<Self> {
        Ok(Self {
            gateway: Gateway::new(config.update_verb),
            cache: FilterCache::open(config)?,
            sandbox: Box::new(ScriptSandbox::new()),
            input: Box::new(std::io::stdin()),
        })
    }

    /// Replace the stdin source. Used by tests and embedding callers.
    pub fn with_input(mut self, input: impl Read + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    /// Execute the pipeline and return the final value
    ///
    /// `value` starts empty; stage `i` consumes the output of stage `i-1`,
    /// except that an inherent producer at index 0 (remote read, raw
    /// stdin) ignores its input. A zero-length sequence is valid and yields
    /// the empty string.
    pub fn execute(&mut self, args: &[String]) -> IopipeResult<String> {
        info!("executing pipeline with {} stages", args.len());
        let mut value = String::new();

        for (index, arg) in args.iter().enumerate() {
            debug!("pipe[{}]: {}", index, arg);
            let stage = StageResolver::classify(arg, index, &mut self.input)?;
            value = self.apply(stage, index, value)?;
            debug!("pipe[{}][raw]: {}", index, value);
        }
        Ok(value)
    }

    fn apply(&mut self, stage: Stage, index: usize, value: String) -> IopipeResult<String> {
        match stage {
            // Read at the head of the pipeline, update with the previous
            // value everywhere else.
            Stage::RemoteRef(reference) => {
                if index == 0 {
                    self.gateway.read(&reference)
                } else {
                    self.gateway.update(&reference, &value)
                }
            }
            Stage::StdinRaw => {
                let mut raw = String::new();
                self.input.read_to_string(&mut raw)?;
                Ok(raw)
            }
            Stage::StdinScript(source) => {
                let filter = self.sandbox.compile(&source)?;
                filter.invoke(&value)
            }
            Stage::NamedFilter(reference) => {
                let source = self.cache.resolve(&reference)?;
                let source = String::from_utf8(source).map_err(|_| {
                    IopipeError::Compile(format!(
                        "filter source for '{}' is not valid UTF-8",
                        reference
                    ))
                })?;
                let filter = self.sandbox.compile(&source)?;
                filter.invoke(&value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;
    use url::Url;

    /// Config pointing at a temp cache and a registry that refuses
    /// connections, so any accidental network fallback fails loudly.
    fn test_config(dir: &TempDir) -> Config {
        Config::load()
            .unwrap()
            .with_cache_root(dir.path())
            .with_registry_base(Url::parse("http://127.0.0.1:1/filters/").unwrap())
    }

    fn pipeline(config: &Config) -> Pipeline {
        Pipeline::new(config).unwrap().with_input(Cursor::new(""))
    }

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_pipeline_yields_empty_string() {
        let dir = TempDir::new().unwrap();
        let mut pipeline = pipeline(&test_config(&dir));
        assert_eq!(pipeline.execute(&[]).unwrap(), "");
    }

    #[test]
    fn test_stdin_passthrough() {
        let dir = TempDir::new().unwrap();
        let mut pipeline = Pipeline::new(&test_config(&dir))
            .unwrap()
            .with_input(Cursor::new("hello"));
        assert_eq!(pipeline.execute(&args(&["-"])).unwrap(), "hello");
    }

    #[test]
    fn test_first_filter_stage_receives_empty_input() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let cache = FilterCache::open(&config).unwrap();
        let id = cache.store().write(br#""saw:" + input"#).unwrap();

        let mut pipeline = pipeline(&config);
        assert_eq!(pipeline.execute(&args(&[&id])).unwrap(), "saw:");
    }

    #[test]
    fn test_cached_filter_resolves_without_network() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let cache = FilterCache::open(&config).unwrap();
        let id = cache.store().write(b"input + \"!\"").unwrap();
        cache.store().alias(&id, "shout").unwrap();

        // The registry base is unreachable; a cache hit (by digest or by
        // alias) must short-circuit the network call.
        let mut pipeline = Pipeline::new(&config)
            .unwrap()
            .with_input(Cursor::new("hey"));
        assert_eq!(pipeline.execute(&args(&["-", "shout"])).unwrap(), "hey!");
    }

    #[test]
    fn test_inline_stdin_script_applies_to_previous_value() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let cache = FilterCache::open(&config).unwrap();
        let id = cache.store().write(br#""abc""#).unwrap();

        let mut pipeline = Pipeline::new(&config)
            .unwrap()
            .with_input(Cursor::new("input.to_upper()"));
        assert_eq!(pipeline.execute(&args(&[&id, "-"])).unwrap(), "ABC");
        // Inline source is never persisted to the cache.
        assert_eq!(cache.store().list().unwrap(), vec![id]);
    }

    #[test]
    fn test_fail_fast_chaining() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let cache = FilterCache::open(&config).unwrap();
        let a = cache.store().write(br#""from a""#).unwrap();
        let b = cache.store().write(b"this is not ( valid").unwrap();
        // Stage C would fail at runtime if it ever ran; the pipeline must
        // stop at B with B's compile error instead.
        let c = cache.store().write(b"no_such_function(input)").unwrap();

        let mut pipeline = pipeline(&config);
        let err = pipeline.execute(&args(&[&a, &b, &c])).unwrap_err();
        assert!(matches!(err, IopipeError::Compile(_)));
    }

    #[test]
    fn test_unknown_filter_without_registry_fails() {
        let dir = TempDir::new().unwrap();
        let mut pipeline = pipeline(&test_config(&dir));
        let err = pipeline.execute(&args(&["no-such-filter"])).unwrap_err();
        assert!(matches!(err, IopipeError::Network(_)));
    }
}
