pub mod error;
pub mod settings;
pub mod stats;
pub mod storage;

pub use error::CoreError;
pub use settings::AiSettings;
pub use stats::{DomainCount, PortfolioStats};
pub use storage::{data_dir, FileStore, PortfolioStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest question the Q&A flow accepts, in characters.
pub const MAX_QUESTION_LEN: usize = 500;

/// How many transcript entries the Q&A flow shows.
pub const CHAT_HISTORY_LIMIT: usize = 10;

// --- Types ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Criticality {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
}

impl Criticality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criticality::High => "High",
            Criticality::Medium => "Medium",
            Criticality::Low => "Low",
        }
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationData {
    pub name: String,
    /// Business area, e.g. "Retail Banking"
    #[serde(default)]
    pub domain: String,
    pub criticality: Criticality,
    /// e.g. "Development", "Production", "Maintenance"
    #[serde(default)]
    pub lifecycle: String,
    #[serde(default)]
    pub business_owner: String,
    #[serde(default)]
    pub it_owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default)]
    pub programming_languages: String,
    #[serde(default)]
    pub database: String,
    /// e.g. "On-Premises", "Cloud", "Hybrid"
    #[serde(default)]
    pub hosting_environment: String,
    #[serde(default)]
    pub capabilities: String,
    #[serde(default)]
    pub technical_dependencies: String,
    #[serde(default)]
    pub tech_debt_score: i32,
}

impl ApplicationData {
    /// Minimal record with every free-text field empty.
    pub fn new(name: impl Into<String>, criticality: Criticality) -> Self {
        Self {
            name: name.into(),
            domain: String::new(),
            criticality,
            lifecycle: String::new(),
            business_owner: String::new(),
            it_owner: String::new(),
            vendor: None,
            programming_languages: String::new(),
            database: String::new(),
            hosting_environment: String::new(),
            capabilities: String::new(),
            technical_dependencies: String::new(),
            tech_debt_score: 0,
        }
    }

    pub fn is_cloud_hosted(&self) -> bool {
        self.hosting_environment.to_lowercase().contains("cloud")
    }
}

/// A bank application or satellite system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: u64,
    pub data: ApplicationData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationData {
    /// API, File, Message...
    pub integration_type: String,
    /// Inbound or Outbound
    pub direction: String,
    #[serde(default)]
    pub data_volume: String,
    /// e.g. GDPR, Internal, Public
    #[serde(default)]
    pub data_sensitivity: String,
}

/// Data flow from one application to another.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    pub id: u64,
    pub source_app_id: u64,
    pub target_app_id: u64,
    pub data: IntegrationData,
}

impl Integration {
    pub fn touches(&self, app_id: u64) -> bool {
        self.source_app_id == app_id || self.target_app_id == app_id
    }
}

/// One question/answer exchange from the Q&A flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: u64,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    #[serde(default)]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub integrations: Vec<Integration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chat_messages: Vec<ChatMessage>,
}

// --- Applications ---

impl Portfolio {
    pub fn application(&self, id: u64) -> Option<&Application> {
        self.applications.iter().find(|a| a.id == id)
    }

    /// Exact name lookup. Names are assumed unique; the first match wins.
    pub fn application_by_name(&self, name: &str) -> Option<&Application> {
        self.applications.iter().find(|a| a.data.name == name)
    }

    pub fn application_names(&self) -> Vec<String> {
        self.applications.iter().map(|a| a.data.name.clone()).collect()
    }

    /// Display name for an application id, falling back to the id itself.
    pub fn name_of(&self, id: u64) -> String {
        self.application(id)
            .map(|a| a.data.name.clone())
            .unwrap_or_else(|| format!("#{id}"))
    }

    /// Case-insensitive substring filter on the domain field.
    pub fn applications_in_domain(&self, domain: &str) -> Vec<&Application> {
        let needle = domain.to_lowercase();
        self.applications
            .iter()
            .filter(|a| a.data.domain.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn create_application(&mut self, data: ApplicationData) -> Result<Application, CoreError> {
        if data.name.trim().is_empty() {
            return Err(CoreError::Validation("application name must not be empty".into()));
        }
        let app = Application {
            id: next_application_id(self),
            data,
        };
        self.applications.push(app.clone());
        Ok(app)
    }

    /// Delete an application and every integration that references it.
    pub fn delete_application(&mut self, id: u64) -> Result<(), CoreError> {
        if self.application(id).is_none() {
            return Err(CoreError::ApplicationNotFound(id));
        }
        self.integrations.retain(|i| !i.touches(id));
        self.applications.retain(|a| a.id != id);
        Ok(())
    }

    /// Remove all applications (and, by cascade, all integrations).
    /// Returns the number of applications removed.
    pub fn clear_applications(&mut self) -> usize {
        let n = self.applications.len();
        self.integrations.clear();
        self.applications.clear();
        n
    }
}

// --- Integrations ---

impl Portfolio {
    pub fn integration(&self, id: u64) -> Option<&Integration> {
        self.integrations.iter().find(|i| i.id == id)
    }

    /// Integrations where the application is either source or target.
    pub fn integrations_for(&self, app_id: u64) -> Vec<&Integration> {
        self.integrations.iter().filter(|i| i.touches(app_id)).collect()
    }

    pub fn create_integration(
        &mut self,
        source_app_id: u64,
        target_app_id: u64,
        data: IntegrationData,
    ) -> Result<Integration, CoreError> {
        for id in [source_app_id, target_app_id] {
            if self.application(id).is_none() {
                return Err(CoreError::ApplicationNotFound(id));
            }
        }
        let integration = Integration {
            id: next_integration_id(self),
            source_app_id,
            target_app_id,
            data,
        };
        self.integrations.push(integration.clone());
        Ok(integration)
    }

    pub fn delete_integration(&mut self, id: u64) -> Result<(), CoreError> {
        let before = self.integrations.len();
        self.integrations.retain(|i| i.id != id);
        if self.integrations.len() == before {
            return Err(CoreError::IntegrationNotFound(id));
        }
        Ok(())
    }

    pub fn clear_integrations(&mut self) -> usize {
        let n = self.integrations.len();
        self.integrations.clear();
        n
    }
}

// --- Chat transcript ---

impl Portfolio {
    pub fn record_chat(&mut self, question: &str, answer: &str) -> ChatMessage {
        let msg = ChatMessage {
            id: next_chat_id(self),
            question: question.to_string(),
            answer: answer.to_string(),
            created_at: Utc::now(),
        };
        self.chat_messages.push(msg.clone());
        msg
    }

    /// Most recent messages, newest first.
    pub fn recent_chat(&self, limit: usize) -> Vec<&ChatMessage> {
        let mut msgs: Vec<&ChatMessage> = self.chat_messages.iter().collect();
        msgs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        msgs.truncate(limit);
        msgs
    }
}

/// Trim a Q&A question and check it against the accepted length.
pub fn validate_question(question: &str) -> Result<&str, CoreError> {
    let q = question.trim();
    if q.is_empty() {
        return Err(CoreError::Validation("question must not be empty".into()));
    }
    if q.chars().count() > MAX_QUESTION_LEN {
        return Err(CoreError::Validation(format!(
            "question exceeds {MAX_QUESTION_LEN} characters"
        )));
    }
    Ok(q)
}

// --- IDs ---

pub fn next_application_id(portfolio: &Portfolio) -> u64 {
    portfolio.applications.iter().map(|a| a.id).max().unwrap_or(0) + 1
}

pub fn next_integration_id(portfolio: &Portfolio) -> u64 {
    portfolio.integrations.iter().map(|i| i.id).max().unwrap_or(0) + 1
}

fn next_chat_id(portfolio: &Portfolio) -> u64 {
    portfolio.chat_messages.iter().map(|m| m.id).max().unwrap_or(0) + 1
}
