//! Compact text renderings of the inventory for prompt context.

use portfolio_core::{Application, Portfolio};

/// One application per line, so budgeting can drop whole entries.
pub const ENTRY_SEPARATOR: &str = "\n";

const LINK_SEPARATOR: &str = ", ";

/// `"Name (Criticality, Hosting)"` per application, for the risk summary.
pub fn summary_context<'a>(apps: impl IntoIterator<Item = &'a Application>) -> String {
    apps.into_iter()
        .map(|a| {
            format!(
                "{} ({}, {})",
                a.data.name, a.data.criticality, a.data.hosting_environment
            )
        })
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}

/// `"Name: capabilities"` per application, for Q&A.
pub fn qa_context<'a>(apps: impl IntoIterator<Item = &'a Application>) -> String {
    apps.into_iter()
        .map(|a| format!("{}: {}", a.data.name, a.data.capabilities))
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}

/// Every integration where `app` is source or target, as `"A -> B"`.
pub fn diagram_context(app: &Application, portfolio: &Portfolio) -> String {
    let links: Vec<String> = portfolio
        .integrations_for(app.id)
        .iter()
        .map(|i| {
            format!(
                "{} -> {}",
                portfolio.name_of(i.source_app_id),
                portfolio.name_of(i.target_app_id)
            )
        })
        .collect();
    format!(
        "App {} has these connections: {}",
        app.data.name,
        links.join(LINK_SEPARATOR)
    )
}
