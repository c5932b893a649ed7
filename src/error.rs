use thiserror::Error;

/// Central error type for iopipe
///
/// Every failure is fatal to the in-flight pipeline: there is no local
/// recovery, no automatic retry, and no silent skip of a failing stage.
#[derive(Error, Debug)]
pub enum IopipeError {
    // ============================================================================
    // Locator / classification errors
    // ============================================================================
    #[error("Invalid object reference '{reference}': {message}")]
    ParseError { reference: String, message: String },

    /// Unreachable given the resolver's catch-all, but modeled for robustness.
    #[error("No stage classification matched argument: {0}")]
    UnresolvedStage(String),

    // ============================================================================
    // Gateway / registry errors
    // ============================================================================
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: status {status} from {url}")]
    Http { status: u16, url: String },

    /// Integrity failure on a fetched filter. Security-relevant: never
    /// downgraded to a warning, and the offending bytes are never cached.
    #[error("Digest mismatch for filter '{reference}': computed {computed}")]
    DigestMismatch { reference: String, computed: String },

    // ============================================================================
    // Filter cache errors
    // ============================================================================
    #[error("Not found in filter cache: {0}")]
    NotFound(String),

    #[error("Alias '{name}' already points at {existing}")]
    AliasConflict { name: String, existing: String },

    // ============================================================================
    // Filter sandbox errors
    // ============================================================================
    #[error("Filter compilation failed: {0}")]
    Compile(String),

    #[error("Filter execution failed: {0}")]
    Runtime(String),

    // ============================================================================
    // Generic/system errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for IopipeError {
    fn from(err: reqwest::Error) -> Self {
        IopipeError::Network(err.to_string())
    }
}

impl From<url::ParseError> for IopipeError {
    fn from(err: url::ParseError) -> Self {
        IopipeError::ParseError {
            reference: String::new(),
            message: err.to_string(),
        }
    }
}

// Implement conversion to String for CLI reporting
impl From<IopipeError> for String {
    fn from(error: IopipeError) -> Self {
        error.to_string()
    }
}

/// Helper type alias for Results
pub type IopipeResult<T> = Result<T, IopipeError>;
