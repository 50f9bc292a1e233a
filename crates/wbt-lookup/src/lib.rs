use wbt_types::{ProviderStatus, SearchMode};

pub mod datamuse;

pub use datamuse::DatamuseClient;

/// Word lookup service interface
#[async_trait::async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Ordered candidate words for `query`, capped at `query.max_results`
    async fn suggest(&self, query: &LookupQuery) -> Result<Vec<String>, LookupError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery {
    pub term: String,
    pub mode: SearchMode,
    pub max_results: usize,
}

impl LookupQuery {
    pub fn new(term: impl Into<String>, mode: SearchMode, max_results: usize) -> Self {
        Self {
            term: term.into(),
            mode,
            max_results,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("lookup timed out")]
    Timeout,

    #[error("lookup service unreachable: {0}")]
    Unavailable(String),

    #[error("lookup service error: {0}")]
    Api(String),

    #[error("malformed lookup response: {0}")]
    Decode(String),
}

impl LookupError {
    /// Indicator shown for this failure
    pub fn status(&self) -> ProviderStatus {
        match self {
            LookupError::Timeout => ProviderStatus::Timeout,
            LookupError::Unavailable(_) => ProviderStatus::Offline,
            LookupError::Api(_) | LookupError::Decode(_) => ProviderStatus::Error,
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LookupError::Timeout
        } else if e.is_connect() {
            LookupError::Unavailable(e.to_string())
        } else if e.is_decode() {
            LookupError::Decode(e.to_string())
        } else {
            LookupError::Api(e.to_string())
        }
    }
}
