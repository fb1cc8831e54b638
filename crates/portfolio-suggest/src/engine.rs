use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;
use tracing::{debug, warn};

use portfolio_core::AiSettings;

use crate::error::{CompletionError, ConfigError};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// System instruction plus task prompt for one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
            user: user.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }
}

/// One request, one answer. Implementations never retry.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
}

impl GatewayConfig {
    pub fn from_settings(settings: &AiSettings) -> Self {
        Self {
            provider: settings.provider.clone(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

fn map_backend(provider: &str) -> Result<LLMBackend, ConfigError> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(ConfigError::UnknownProvider(other.to_string())),
    }
}

/// Gateway over the `llm` crate backends.
pub struct LlmGateway {
    config: GatewayConfig,
    backend: LLMBackend,
}

impl std::fmt::Debug for LlmGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmGateway")
            .field("provider", &self.config.provider)
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

impl LlmGateway {
    /// Fails when the provider is unknown or needs a key that is not set.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let backend = map_backend(&config.provider)?;
        if config.provider != "ollama" && config.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey {
                provider: config.provider.clone(),
            });
        }
        Ok(Self { config, backend })
    }
}

#[async_trait]
impl CompletionGateway for LlmGateway {
    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError> {
        debug!(
            provider = %self.config.provider,
            model = %self.config.model,
            system_len = prompt.system.len(),
            user_len = prompt.user.len(),
            "sending completion"
        );

        let mut builder = LLMBuilder::new()
            .backend(self.backend.clone())
            .model(&self.config.model)
            .system(&prompt.system)
            .temperature(self.config.temperature);

        if !self.config.api_key.is_empty() {
            builder = builder.api_key(&self.config.api_key);
        }

        let llm = builder
            .build()
            .map_err(|e| CompletionError::Provider(format!("build LLM: {e}")))?;

        let messages = vec![ChatMessage::user().content(&prompt.user).build()];

        let response = llm.chat(&messages).await.map_err(|e| {
            warn!(error = %e, "completion failed");
            CompletionError::Provider(e.to_string())
        })?;

        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => {
                warn!("completion returned no text");
                Err(CompletionError::EmptyResponse)
            }
        }
    }
}
