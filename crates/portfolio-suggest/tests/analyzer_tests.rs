mod common;

use std::sync::Arc;

use common::{EchoGateway, FailingGateway, ScriptedGateway};
use portfolio_core::{ApplicationData, Criticality, IntegrationData, Portfolio};
use portfolio_suggest::context::{diagram_context, qa_context, summary_context};
use portfolio_suggest::{
    render_completion, CompletionError, ContextBudget, PortfolioAnalyzer,
};

const FLOWCHART: &str = "graph TD\n  A[Core Banking] --> B[Fraud Detection]";

fn estate() -> Portfolio {
    let mut p = Portfolio::default();
    let mut core = ApplicationData::new("Core Banking", Criticality::High);
    core.hosting_environment = "Cloud".into();
    core.capabilities = "Accounts, Payments".into();
    let mut fraud = ApplicationData::new("Fraud Detection", Criticality::Medium);
    fraud.hosting_environment = "On-Premises".into();
    fraud.capabilities = "Transaction scoring".into();
    let core = p.create_application(core).unwrap();
    let fraud = p.create_application(fraud).unwrap();
    p.create_integration(
        core.id,
        fraud.id,
        IntegrationData {
            integration_type: "Message".into(),
            direction: "Outbound".into(),
            data_volume: "1M/day".into(),
            data_sensitivity: "Internal".into(),
        },
    )
    .unwrap();
    p
}

#[tokio::test]
async fn summary_prompt_carries_names_and_criticality() {
    let p = estate();
    let analyzer = PortfolioAnalyzer::new(Arc::new(EchoGateway));
    let report = analyzer
        .summarize_portfolio(&summary_context(&p.applications))
        .await
        .unwrap();
    assert!(report.contains("top 5 risks"));
    assert!(report.contains("Core Banking"));
    assert!(report.contains("Fraud Detection"));
    assert!(report.contains("High"));
    assert!(report.contains("Medium"));
    assert!(report.contains("On-Premises"));
}

#[tokio::test]
async fn question_prompt_embeds_context_and_question() {
    let p = estate();
    let gw = Arc::new(ScriptedGateway::new(["Core Banking handles payments."]));
    let analyzer = PortfolioAnalyzer::new(gw.clone());
    let answer = analyzer
        .answer_question("Which app handles payments?", &qa_context(&p.applications))
        .await
        .unwrap();
    assert_eq!(answer, "Core Banking handles payments.");

    let prompts = gw.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].system, "You are a helpful assistant.");
    assert!(prompts[0].user.contains("Core Banking: Accounts, Payments"));
    assert!(prompts[0].user.contains("Question: Which app handles payments?"));
    assert!(prompts[0].user.ends_with("Answer briefly with references to app names."));
}

#[tokio::test]
async fn failures_render_as_error_text() {
    let analyzer = PortfolioAnalyzer::new(Arc::new(FailingGateway));

    let summary = render_completion(analyzer.summarize_portfolio("A (High, Cloud)").await);
    assert!(summary.starts_with("Error: "), "{summary}");

    let answer = render_completion(analyzer.answer_question("why?", "A: x").await);
    assert!(answer.starts_with("Error: "), "{answer}");

    let diagram = render_completion(
        analyzer
            .generate_verified_diagram("A", "App A has these connections: ")
            .await
            .map(|d| d.code),
    );
    assert_eq!(diagram, "Error: connection refused");
}

#[tokio::test]
async fn unchanged_diagram_is_returned_sanitized() {
    let fenced = format!("```mermaid\n{FLOWCHART}\n```");
    let gw = Arc::new(ScriptedGateway::new([fenced.clone(), fenced]));
    let analyzer = PortfolioAnalyzer::new(gw.clone());
    let artifact = analyzer
        .generate_verified_diagram("Core Banking", "App Core Banking has these connections: ")
        .await
        .unwrap();
    assert_eq!(artifact.code, FLOWCHART);
    assert!(artifact.is_valid());
    assert_eq!(gw.prompts().len(), 2);
}

#[tokio::test]
async fn diagram_runs_draft_then_check() {
    let p = estate();
    let core = p.application_by_name("Core Banking").unwrap();
    let ctx = diagram_context(core, &p);
    assert_eq!(
        ctx,
        "App Core Banking has these connections: Core Banking -> Fraud Detection"
    );

    let gw = Arc::new(ScriptedGateway::new(["graph TD\n A-->B[", FLOWCHART]));
    let analyzer = PortfolioAnalyzer::new(gw.clone());
    let artifact = analyzer
        .generate_verified_diagram("Core Banking", &ctx)
        .await
        .unwrap();
    assert_eq!(artifact.code, FLOWCHART);

    let prompts = gw.prompts();
    assert_eq!(prompts[0].system, "Return ONLY Mermaid code.");
    assert!(prompts[0].user.contains("Core Banking -> Fraud Detection"));
    assert_eq!(prompts[1].system, "Return ONLY the corrected Mermaid code.");
    assert!(prompts[1].user.ends_with("graph TD\n A-->B["));
}

#[tokio::test]
async fn broken_fix_falls_back_to_valid_draft() {
    let gw = Arc::new(ScriptedGateway::new([FLOWCHART, "Here is the fixed diagram"]));
    let analyzer = PortfolioAnalyzer::new(gw);
    let artifact = analyzer.generate_verified_diagram("A", "").await.unwrap();
    assert_eq!(artifact.code, FLOWCHART);
    assert!(artifact.is_valid());
}

#[tokio::test]
async fn fixed_diagram_with_line_breaks_is_kept() {
    let draft = "graph TD\n  A[Core Banking] --> B[Fraud]";
    let fixed = "graph TD\n  A[Core<br>Banking] --> B[Fraud<br/>Detection]";
    let gw = Arc::new(ScriptedGateway::new([draft, fixed]));
    let analyzer = PortfolioAnalyzer::new(gw);
    let artifact = analyzer.generate_verified_diagram("A", "").await.unwrap();
    assert_eq!(artifact.code, fixed);
    assert!(artifact.is_valid());
}

#[tokio::test]
async fn invalid_fix_and_draft_report_issues() {
    let gw = Arc::new(ScriptedGateway::new(["nonsense", "graph TD\n  A[x --> B"]));
    let analyzer = PortfolioAnalyzer::new(gw);
    let artifact = analyzer.generate_verified_diagram("A", "").await.unwrap();
    assert_eq!(artifact.code, "graph TD\n  A[x --> B");
    assert_eq!(artifact.issues.len(), 1);
    assert_eq!(artifact.issues[0].line, 2);
}

#[tokio::test]
async fn draft_failure_skips_check() {
    let gw = Arc::new(ScriptedGateway::with_results([
        Err(CompletionError::Provider("rate limited".into())),
        Ok(FLOWCHART.to_string()),
    ]));
    let analyzer = PortfolioAnalyzer::new(gw.clone());
    let err = analyzer.generate_verified_diagram("A", "").await.unwrap_err();
    assert_eq!(err, CompletionError::Provider("rate limited".into()));
    assert_eq!(gw.prompts().len(), 1);
}

#[tokio::test]
async fn context_is_fitted_to_budget() {
    let gw = Arc::new(ScriptedGateway::new(["ok"]));
    let analyzer = PortfolioAnalyzer::new(gw.clone()).with_budget(ContextBudget::new(40));
    let context = (0..50)
        .map(|i| format!("App {i} (Low, Cloud)"))
        .collect::<Vec<_>>()
        .join("\n");
    analyzer.summarize_portfolio(&context).await.unwrap();

    let user = &gw.prompts()[0].user;
    assert!(user.contains("App 0 (Low, Cloud)"));
    assert!(!user.contains("App 49"));
    assert!(user.contains("more)"));
}

#[tokio::test]
async fn empty_response_renders_as_error() {
    let gw = Arc::new(ScriptedGateway::with_results([Err(CompletionError::EmptyResponse)]));
    let analyzer = PortfolioAnalyzer::new(gw);
    let text = render_completion(analyzer.summarize_portfolio("").await);
    assert_eq!(text, "Error: model returned no text");
}
