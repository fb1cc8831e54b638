/// Raised when a gateway cannot be built. Fatal: nothing is sent.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no API key configured for provider '{provider}' (set PORTFOLIO_API_KEY or OPENAI_API_KEY)")]
    MissingApiKey { provider: String },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

/// A single completion call that did not produce text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompletionError {
    #[error("{0}")]
    Provider(String),

    #[error("model returned no text")]
    EmptyResponse,
}

/// Why one seeding batch produced no records.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of records")]
    NotAnArray,
}
