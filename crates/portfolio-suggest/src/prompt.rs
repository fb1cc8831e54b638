use crate::engine::Prompt;

const DIAGRAM_DRAFT_SYSTEM: &str = "Return ONLY Mermaid code.";
const DIAGRAM_CHECK_SYSTEM: &str = "Return ONLY the corrected Mermaid code.";

pub fn portfolio_summary(apps_data: &str) -> Prompt {
    Prompt::new(format!(
        "Analyze this bank portfolio and list top 5 risks and tech debt areas:\n{apps_data}"
    ))
}

pub fn portfolio_question(question: &str, context: &str) -> Prompt {
    Prompt::new(format!(
        "Context:\n{context}\nQuestion: {question}\nAnswer briefly with references to app names."
    ))
}

pub fn diagram_draft(app_name: &str, integration_context: &str) -> Prompt {
    Prompt::new(format!(
        "Generate Mermaid diagram code for {app_name} and its neighbors: {integration_context}"
    ))
    .with_system(DIAGRAM_DRAFT_SYSTEM)
}

pub fn diagram_check(draft: &str) -> Prompt {
    Prompt::new(format!(
        "Check this Mermaid code for syntax errors and return it fixed. \
If it is fine, return it as is: {draft}"
    ))
    .with_system(DIAGRAM_CHECK_SYSTEM)
}

pub fn seed_applications(batch_size: usize) -> Prompt {
    Prompt::new(format!(
        "Generate a JSON list of {batch_size} unique bank applications.\n\
Include fields: \"name\", \"domain\", \"criticality\" (High/Medium/Low), \"lifecycle\", \
\"business_owner\", \"it_owner\", \"vendor\", \"programming_languages\", \
\"database\", \"hosting_environment\", \"capabilities\", \"technical_dependencies\", \
\"tech_debt_score\" (1-10).\n\
Return ONLY raw JSON array."
    ))
}

pub fn seed_integrations(batch_size: usize, app_names: &[String]) -> Prompt {
    let names = serde_json::to_string(app_names).unwrap_or_else(|_| app_names.join(", "));
    Prompt::new(format!(
        "Based on these apps: {names}\n\
Generate a JSON list of {batch_size} unique integrations.\n\
Fields: \"source_app_name\", \"target_app_name\", \"integration_type\", \"direction\", \
\"data_volume\", \"data_sensitivity\".\n\
Return ONLY raw JSON array."
    ))
}
