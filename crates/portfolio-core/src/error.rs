#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid portfolio JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("application {0} not found")]
    ApplicationNotFound(u64),

    #[error("integration {0} not found")]
    IntegrationNotFound(u64),

    #[error("validation error: {0}")]
    Validation(String),
}
