//! AI features over the portfolio: risk summaries, Q&A, self-checked Mermaid
//! diagrams and sample-data seeding, all through one completion gateway.

pub mod analyzer;
pub mod budget;
pub mod context;
pub mod engine;
pub mod error;
pub mod mermaid;
mod parse;
pub mod prompt;
pub mod sanitize;
pub mod seed;

pub use analyzer::{DiagramArtifact, PortfolioAnalyzer};
pub use budget::ContextBudget;
pub use engine::{CompletionGateway, GatewayConfig, LlmGateway, Prompt};
pub use error::{CompletionError, ConfigError};
pub use seed::{SeedOptions, SeedReport, Seeder};

/// Text to show where an answer would appear: the completion itself, or
/// `"Error: <description>"`.
pub fn render_completion(result: Result<String, CompletionError>) -> String {
    result.unwrap_or_else(|e| format!("Error: {e}"))
}
