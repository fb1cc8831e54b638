use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{info, warn};

use portfolio_core::{
    validate_question, FileStore, Integration, IntegrationData, Portfolio, PortfolioStats,
    PortfolioStore, CHAT_HISTORY_LIMIT,
};
use portfolio_suggest::context::{diagram_context, qa_context, summary_context};
use portfolio_suggest::{render_completion, PortfolioAnalyzer};

const INSTRUCTIONS: &str = "\
Tools over a bank's application portfolio: applications, the integrations between them, \
and AI analysis of the estate.

- Use dashboard for headline counts, list_applications / get_application to browse.
- delete_application removes an application together with its integrations.
- Integrations connect two existing application ids; add_integration and delete_integration edit them.
- analyze_portfolio returns the top risks and tech-debt areas.
- ask_portfolio answers a question (max 500 characters) and keeps a chat transcript; chat_history shows it.
- generate_diagram returns a Mermaid flowchart of one application's integrations.

AI answers that failed come back as text starting with \"Error: \".";

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ListApplicationsRequest {
    /// Only applications whose domain contains this text (case-insensitive)
    domain: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ApplicationRequest {
    /// Numeric id of the application
    app_id: u64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AddIntegrationRequest {
    /// Id of the application sending data
    source_app_id: u64,
    /// Id of the application receiving data
    target_app_id: u64,
    /// "API", "File", "Message", ...
    integration_type: String,
    /// "Inbound" or "Outbound"
    direction: String,
    /// e.g. "1M/day", "High"
    data_volume: Option<String>,
    /// e.g. "GDPR", "Internal", "Public"
    data_sensitivity: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct DeleteIntegrationRequest {
    /// Numeric id of the integration
    integration_id: u64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AskRequest {
    /// Free-text question about the portfolio
    question: String,
}

// --- Views ---

/// Integration with both endpoint names resolved.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IntegrationView<'a> {
    id: u64,
    source_app_id: u64,
    source_app: String,
    target_app_id: u64,
    target_app: String,
    #[serde(flatten)]
    data: &'a IntegrationData,
}

fn integration_view<'a>(p: &Portfolio, i: &'a Integration) -> IntegrationView<'a> {
    IntegrationView {
        id: i.id,
        source_app_id: i.source_app_id,
        source_app: p.name_of(i.source_app_id),
        target_app_id: i.target_app_id,
        target_app: p.name_of(i.target_app_id),
        data: &i.data,
    }
}

#[derive(Debug, Serialize)]
struct DiagramView<'a> {
    app: &'a str,
    mermaid: String,
    /// `"line N: message"` per validator finding
    issues: Vec<String>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| e.to_string())
}

fn reply(result: Result<String, String>) -> Result<CallToolResult, McpError> {
    Ok(match result {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => CallToolResult::error(vec![Content::text(e)]),
    })
}

// --- Server ---

#[derive(Clone)]
pub struct PortfolioServer {
    store: Arc<Mutex<FileStore>>,
    /// The configuration error text when no gateway could be built.
    analyzer: Result<Arc<PortfolioAnalyzer>, String>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl PortfolioServer {
    pub fn new(store: FileStore, analyzer: Result<PortfolioAnalyzer, String>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            analyzer: analyzer.map(Arc::new),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Headline counts: total applications, High/Medium/Low criticality, cloud-hosted count and percentage, integration count, and applications per domain."
    )]
    async fn dashboard(&self) -> Result<CallToolResult, McpError> {
        reply(self.dashboard_text().await)
    }

    #[tool(
        description = "List applications as JSON [{id, data: {name, domain, criticality, lifecycle, businessOwner, itOwner, vendor?, programmingLanguages, database, hostingEnvironment, capabilities, technicalDependencies, techDebtScore}}]. Optionally filter by domain."
    )]
    async fn list_applications(
        &self,
        Parameters(req): Parameters<ListApplicationsRequest>,
    ) -> Result<CallToolResult, McpError> {
        reply(self.applications_text(req.domain.as_deref()).await)
    }

    #[tool(
        description = "Get one application with every integration where it is source or target (endpoint names included)."
    )]
    async fn get_application(
        &self,
        Parameters(req): Parameters<ApplicationRequest>,
    ) -> Result<CallToolResult, McpError> {
        reply(self.application_text(req.app_id).await)
    }

    #[tool(
        description = "Delete an application by id. Every integration where it is source or target is deleted with it."
    )]
    async fn delete_application(
        &self,
        Parameters(req): Parameters<ApplicationRequest>,
    ) -> Result<CallToolResult, McpError> {
        reply(self.delete_application_text(req.app_id).await)
    }

    #[tool(description = "List all integrations with source and target application names.")]
    async fn list_integrations(&self) -> Result<CallToolResult, McpError> {
        reply(self.integrations_text().await)
    }

    #[tool(description = "Create an integration between two existing applications.")]
    async fn add_integration(
        &self,
        Parameters(req): Parameters<AddIntegrationRequest>,
    ) -> Result<CallToolResult, McpError> {
        let data = IntegrationData {
            integration_type: req.integration_type,
            direction: req.direction,
            data_volume: req.data_volume.unwrap_or_default(),
            data_sensitivity: req.data_sensitivity.unwrap_or_default(),
        };
        reply(
            self.add_integration_text(req.source_app_id, req.target_app_id, data)
                .await,
        )
    }

    #[tool(description = "Delete an integration by id.")]
    async fn delete_integration(
        &self,
        Parameters(req): Parameters<DeleteIntegrationRequest>,
    ) -> Result<CallToolResult, McpError> {
        reply(self.delete_integration_text(req.integration_id).await)
    }

    #[tool(
        description = "Ask the AI for the top 5 risks and tech-debt areas across the whole portfolio. Returns the report as written."
    )]
    async fn analyze_portfolio(&self) -> Result<CallToolResult, McpError> {
        reply(self.analysis_text().await)
    }

    #[tool(
        description = "Ask a question about the portfolio (max 500 characters). The answer is saved to the chat transcript; returns the 10 most recent messages, newest first."
    )]
    async fn ask_portfolio(
        &self,
        Parameters(req): Parameters<AskRequest>,
    ) -> Result<CallToolResult, McpError> {
        reply(self.ask_text(&req.question).await)
    }

    #[tool(description = "The 10 most recent chat messages, newest first.")]
    async fn chat_history(&self) -> Result<CallToolResult, McpError> {
        reply(self.chat_text().await)
    }

    #[tool(
        description = "Generate a Mermaid flowchart of one application's integrations. Returns {app, mermaid, issues}; issues lists problems the syntax check still found."
    )]
    async fn generate_diagram(
        &self,
        Parameters(req): Parameters<ApplicationRequest>,
    ) -> Result<CallToolResult, McpError> {
        reply(self.diagram_text(req.app_id).await)
    }
}

impl PortfolioServer {
    fn analyzer(&self) -> Result<&PortfolioAnalyzer, String> {
        self.analyzer
            .as_deref()
            .map_err(|e| format!("AI is not configured: {e}"))
    }

    async fn dashboard_text(&self) -> Result<String, String> {
        let store = self.store.lock().await;
        to_json(&PortfolioStats::compute(store.portfolio()))
    }

    async fn applications_text(&self, domain: Option<&str>) -> Result<String, String> {
        let store = self.store.lock().await;
        let p = store.portfolio();
        match domain.map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => to_json(&p.applications_in_domain(d)),
            None => to_json(&p.applications),
        }
    }

    async fn application_text(&self, app_id: u64) -> Result<String, String> {
        let store = self.store.lock().await;
        let p = store.portfolio();
        let app = p
            .application(app_id)
            .ok_or_else(|| format!("Application {app_id} not found"))?;
        let integrations: Vec<_> = p
            .integrations_for(app_id)
            .into_iter()
            .map(|i| integration_view(p, i))
            .collect();
        to_json(&json!({ "application": app, "integrations": integrations }))
    }

    async fn delete_application_text(&self, app_id: u64) -> Result<String, String> {
        let mut store = self.store.lock().await;
        let name = store.portfolio().name_of(app_id);
        let before = store.portfolio().integrations.len();
        store
            .modify(|p| p.delete_application(app_id))
            .map_err(|e| e.to_string())?;
        let removed = before - store.portfolio().integrations.len();
        info!(id = app_id, removed, "application deleted");
        Ok(format!(
            "Deleted application {app_id} ({name}) and {removed} integration(s)"
        ))
    }

    async fn integrations_text(&self) -> Result<String, String> {
        let store = self.store.lock().await;
        let p = store.portfolio();
        let views: Vec<_> = p.integrations.iter().map(|i| integration_view(p, i)).collect();
        to_json(&views)
    }

    async fn add_integration_text(
        &self,
        source: u64,
        target: u64,
        data: IntegrationData,
    ) -> Result<String, String> {
        let mut store = self.store.lock().await;
        let created = store
            .modify(|p| p.create_integration(source, target, data))
            .map_err(|e| e.to_string())?;
        info!(id = created.id, source, target, "integration added");
        to_json(&integration_view(store.portfolio(), &created))
    }

    async fn delete_integration_text(&self, id: u64) -> Result<String, String> {
        let mut store = self.store.lock().await;
        store
            .modify(|p| p.delete_integration(id))
            .map_err(|e| e.to_string())?;
        info!(id, "integration deleted");
        Ok(format!("Deleted integration {id}"))
    }

    async fn analysis_text(&self) -> Result<String, String> {
        let analyzer = self.analyzer()?;
        let context = {
            let store = self.store.lock().await;
            summary_context(&store.portfolio().applications)
        };
        Ok(render_completion(analyzer.summarize_portfolio(&context).await))
    }

    async fn ask_text(&self, question: &str) -> Result<String, String> {
        let question = validate_question(question).map_err(|e| e.to_string())?;
        let analyzer = self.analyzer()?;
        let context = {
            let store = self.store.lock().await;
            qa_context(&store.portfolio().applications)
        };
        let answer = render_completion(analyzer.answer_question(question, &context).await);

        let mut store = self.store.lock().await;
        store
            .modify(|p| Ok(p.record_chat(question, &answer)))
            .map_err(|e| e.to_string())?;
        to_json(&store.portfolio().recent_chat(CHAT_HISTORY_LIMIT))
    }

    async fn chat_text(&self) -> Result<String, String> {
        let store = self.store.lock().await;
        to_json(&store.portfolio().recent_chat(CHAT_HISTORY_LIMIT))
    }

    async fn diagram_text(&self, app_id: u64) -> Result<String, String> {
        let analyzer = self.analyzer()?;
        let (name, context) = {
            let store = self.store.lock().await;
            let p = store.portfolio();
            let app = p
                .application(app_id)
                .ok_or_else(|| format!("Application {app_id} not found"))?;
            (app.data.name.clone(), diagram_context(app, p))
        };

        let view = match analyzer.generate_verified_diagram(&name, &context).await {
            Ok(artifact) => {
                if !artifact.is_valid() {
                    warn!(app = %name, issues = artifact.issues.len(), "diagram still has issues");
                }
                DiagramView {
                    app: &name,
                    mermaid: artifact.code,
                    issues: artifact.issues.iter().map(ToString::to_string).collect(),
                }
            }
            Err(e) => DiagramView {
                app: &name,
                mermaid: render_completion(Err(e)),
                issues: Vec::new(),
            },
        };
        to_json(&view)
    }
}

#[tool_handler]
impl ServerHandler for PortfolioServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use portfolio_core::{ApplicationData, Criticality};
    use portfolio_suggest::{CompletionError, CompletionGateway, Prompt};
    use serde_json::Value;

    struct Echo;

    #[async_trait]
    impl CompletionGateway for Echo {
        async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError> {
            Ok(prompt.user.clone())
        }
    }

    struct Down;

    #[async_trait]
    impl CompletionGateway for Down {
        async fn complete(&self, _prompt: &Prompt) -> Result<String, CompletionError> {
            Err(CompletionError::Provider("connection refused".into()))
        }
    }

    fn server(
        dir: &tempfile::TempDir,
        gateway: Option<Arc<dyn CompletionGateway>>,
    ) -> PortfolioServer {
        let mut store = FileStore::open_in(dir.path()).unwrap();
        store
            .modify(|p| {
                let mut core = ApplicationData::new("Core Banking", Criticality::High);
                core.domain = "Retail Banking".into();
                core.hosting_environment = "Cloud".into();
                core.capabilities = "Accounts, Payments".into();
                let mut fraud = ApplicationData::new("Fraud Detection", Criticality::Medium);
                fraud.domain = "Risk".into();
                fraud.hosting_environment = "On-Premises".into();
                let core = p.create_application(core)?;
                let fraud = p.create_application(fraud)?;
                p.create_integration(
                    core.id,
                    fraud.id,
                    IntegrationData {
                        integration_type: "API".into(),
                        direction: "Outbound".into(),
                        data_volume: String::new(),
                        data_sensitivity: "Internal".into(),
                    },
                )?;
                Ok(())
            })
            .unwrap();
        let analyzer = gateway
            .map(PortfolioAnalyzer::new)
            .ok_or_else(|| "no API key configured for provider 'openai'".to_string());
        PortfolioServer::new(store, analyzer)
    }

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn dashboard_counts_applications() {
        let dir = tempfile::tempdir().unwrap();
        let s = server(&dir, None);
        let stats = parse(&s.dashboard_text().await.unwrap());
        assert_eq!(stats["totalApps"], 2);
        assert_eq!(stats["cloudApps"], 1);
        assert_eq!(stats["cloudPercentage"], 50);
        assert_eq!(stats["integrationsCount"], 1);
    }

    #[tokio::test]
    async fn list_filters_by_domain() {
        let dir = tempfile::tempdir().unwrap();
        let s = server(&dir, None);
        let apps = parse(&s.applications_text(Some("risk")).await.unwrap());
        assert_eq!(apps.as_array().unwrap().len(), 1);
        assert_eq!(apps[0]["data"]["name"], "Fraud Detection");

        let all = parse(&s.applications_text(Some("  ")).await.unwrap());
        assert_eq!(all.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn application_includes_named_integrations() {
        let dir = tempfile::tempdir().unwrap();
        let s = server(&dir, None);
        let v = parse(&s.application_text(2).await.unwrap());
        assert_eq!(v["application"]["data"]["name"], "Fraud Detection");
        assert_eq!(v["integrations"][0]["sourceApp"], "Core Banking");
        assert_eq!(v["integrations"][0]["integrationType"], "API");

        assert_eq!(
            s.application_text(99).await.unwrap_err(),
            "Application 99 not found"
        );
    }

    #[tokio::test]
    async fn integration_edits_persist() {
        let dir = tempfile::tempdir().unwrap();
        let s = server(&dir, None);
        let data = IntegrationData {
            integration_type: "File".into(),
            direction: "Inbound".into(),
            data_volume: String::new(),
            data_sensitivity: String::new(),
        };
        let created = parse(&s.add_integration_text(2, 1, data.clone()).await.unwrap());
        assert_eq!(created["targetApp"], "Core Banking");
        assert!(s.add_integration_text(2, 42, data).await.is_err());

        s.delete_integration_text(1).await.unwrap();
        assert!(s.delete_integration_text(1).await.is_err());

        let reopened = FileStore::open_in(dir.path()).unwrap();
        assert_eq!(reopened.portfolio().integrations.len(), 1);
        assert_eq!(reopened.portfolio().integrations[0].data.integration_type, "File");
    }

    #[tokio::test]
    async fn ask_records_chat_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let s = server(&dir, Some(Arc::new(Echo)));
        s.ask_text("first?").await.unwrap();
        let history = parse(&s.ask_text("  Who handles payments?  ").await.unwrap());
        assert_eq!(history.as_array().unwrap().len(), 2);
        assert_eq!(history[0]["question"], "Who handles payments?");
        assert!(history[0]["answer"]
            .as_str()
            .unwrap()
            .contains("Core Banking: Accounts, Payments"));
        assert_eq!(history[1]["question"], "first?");
    }

    #[tokio::test]
    async fn ask_rejects_invalid_questions() {
        let dir = tempfile::tempdir().unwrap();
        let s = server(&dir, Some(Arc::new(Echo)));
        assert!(s.ask_text("   ").await.is_err());
        assert!(s.ask_text(&"x".repeat(501)).await.is_err());
        assert_eq!(parse(&s.chat_text().await.unwrap()), json!([]));
    }

    #[tokio::test]
    async fn provider_failure_is_saved_as_error_text() {
        let dir = tempfile::tempdir().unwrap();
        let s = server(&dir, Some(Arc::new(Down)));
        let history = parse(&s.ask_text("anything?").await.unwrap());
        assert_eq!(history[0]["answer"], "Error: connection refused");

        let report = s.analysis_text().await.unwrap();
        assert_eq!(report, "Error: connection refused");

        let diagram = parse(&s.diagram_text(1).await.unwrap());
        assert_eq!(diagram["mermaid"], "Error: connection refused");
    }

    #[tokio::test]
    async fn missing_configuration_only_blocks_ai_tools() {
        let dir = tempfile::tempdir().unwrap();
        let s = server(&dir, None);
        let err = s.analysis_text().await.unwrap_err();
        assert!(err.starts_with("AI is not configured"), "{err}");
        assert!(s.ask_text("hello?").await.is_err());
        assert!(s.diagram_text(1).await.is_err());
        assert!(s.integrations_text().await.is_ok());
    }

    #[tokio::test]
    async fn diagram_uses_application_connections() {
        let dir = tempfile::tempdir().unwrap();
        let s = server(&dir, Some(Arc::new(Echo)));
        let v = parse(&s.diagram_text(1).await.unwrap());
        assert_eq!(v["app"], "Core Banking");
        // the echoed check prompt is not Mermaid, so the validator reports it
        assert!(v["mermaid"]
            .as_str()
            .unwrap()
            .contains("Core Banking -> Fraud Detection"));
        let issues = v["issues"].as_array().unwrap();
        assert!(!issues.is_empty());
        assert!(issues[0].as_str().unwrap().starts_with("line 1: unknown diagram type"));
    }

    #[tokio::test]
    async fn deleting_application_removes_its_integrations() {
        let dir = tempfile::tempdir().unwrap();
        let s = server(&dir, None);
        let msg = s.delete_application_text(1).await.unwrap();
        assert_eq!(msg, "Deleted application 1 (Core Banking) and 1 integration(s)");
        assert_eq!(
            s.delete_application_text(1).await.unwrap_err(),
            "application 1 not found"
        );

        let reopened = FileStore::open_in(dir.path()).unwrap();
        assert_eq!(reopened.portfolio().applications.len(), 1);
        assert!(reopened.portfolio().integrations.is_empty());
    }
}
