use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::budget::ContextBudget;
use crate::engine::CompletionGateway;
use crate::error::CompletionError;
use crate::mermaid::{self, DiagramIssue};
use crate::{prompt, sanitize};

/// Mermaid source ready for rendering, plus what the validator found in it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DiagramArtifact {
    pub code: String,
    pub issues: Vec<DiagramIssue>,
}

impl DiagramArtifact {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Portfolio-level prompts driven over a completion gateway.
pub struct PortfolioAnalyzer {
    gateway: Arc<dyn CompletionGateway>,
    budget: ContextBudget,
}

impl PortfolioAnalyzer {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self {
            gateway,
            budget: ContextBudget::default(),
        }
    }

    pub fn with_budget(mut self, budget: ContextBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Top risks and tech-debt areas for the whole inventory. Returned as the
    /// model wrote it.
    pub async fn summarize_portfolio(&self, apps_data: &str) -> Result<String, CompletionError> {
        let apps_data = self.budget.fit(apps_data);
        info!(context_chars = apps_data.len(), "summarizing portfolio");
        self.gateway.complete(&prompt::portfolio_summary(&apps_data)).await
    }

    pub async fn answer_question(
        &self,
        question: &str,
        context: &str,
    ) -> Result<String, CompletionError> {
        let context = self.budget.fit(context);
        info!(question_chars = question.len(), "answering portfolio question");
        self.gateway
            .complete(&prompt::portfolio_question(question, &context))
            .await
    }

    /// Draft, let the model check and fix its own draft, strip fences, then
    /// validate. When the fix breaks a draft that was valid, the draft wins.
    pub async fn generate_verified_diagram(
        &self,
        app_name: &str,
        integration_context: &str,
    ) -> Result<DiagramArtifact, CompletionError> {
        info!(app = app_name, "generating diagram");
        let draft = self
            .gateway
            .complete(&prompt::diagram_draft(app_name, integration_context))
            .await?;
        debug!(draft_chars = draft.len(), "diagram drafted");

        let fixed = self.gateway.complete(&prompt::diagram_check(&draft)).await?;
        let code = sanitize::clean(&fixed);
        let issues = mermaid::validate(&code);
        if issues.is_empty() {
            return Ok(DiagramArtifact { code, issues });
        }

        let draft_code = sanitize::clean(&draft);
        if mermaid::validate(&draft_code).is_empty() {
            warn!(
                app = app_name,
                issues = issues.len(),
                "checked diagram failed validation, keeping the draft"
            );
            return Ok(DiagramArtifact {
                code: draft_code,
                issues: Vec::new(),
            });
        }

        warn!(app = app_name, issues = issues.len(), "diagram failed validation");
        Ok(DiagramArtifact { code, issues })
    }
}
