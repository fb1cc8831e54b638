#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use portfolio_suggest::{CompletionError, CompletionGateway, Prompt};

/// Replays canned responses in order and records every prompt it was sent.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<String, CompletionError>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedGateway {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_results(responses.into_iter().map(|s| Ok(s.into())))
    }

    pub fn with_results(results: impl IntoIterator<Item = Result<String, CompletionError>>) -> Self {
        Self {
            responses: Mutex::new(results.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::Provider("script exhausted".into())))
    }
}

/// Answers with the user prompt it was given.
pub struct EchoGateway;

#[async_trait]
impl CompletionGateway for EchoGateway {
    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError> {
        Ok(prompt.user.clone())
    }
}

/// Fails every call the way an unreachable provider would.
pub struct FailingGateway;

#[async_trait]
impl CompletionGateway for FailingGateway {
    async fn complete(&self, _prompt: &Prompt) -> Result<String, CompletionError> {
        Err(CompletionError::Provider("connection refused".into()))
    }
}
