use crate::GenerateError;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Overrides the generator's configured temperature.
    pub temperature: Option<f64>,
}

impl CompletionRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature: None,
        }
    }
}

/// A service that turns a prompt into free text.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerateError>;
}

pub type SharedTextGenerator = Arc<dyn TextGenerator>;
