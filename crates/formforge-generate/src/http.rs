use crate::{CompletionRequest, GenerateError, TextGenerator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_COMPLETION_URL: &str =
    "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_COMPLETION_URL: &str = "FORMFORGE_GENERATOR_URL";
pub const ENV_API_KEY: &str = "FORMFORGE_GENERATOR_API_KEY";
pub const ENV_FOLDER_ID: &str = "FORMFORGE_GENERATOR_FOLDER_ID";
pub const ENV_MODEL_URI: &str = "FORMFORGE_GENERATOR_MODEL_URI";
pub const ENV_TEMPERATURE: &str = "FORMFORGE_GENERATOR_TEMPERATURE";
pub const ENV_MAX_TOKENS: &str = "FORMFORGE_GENERATOR_MAX_TOKENS";
pub const ENV_TIMEOUT_SECS: &str = "FORMFORGE_GENERATOR_TIMEOUT_SECS";

#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorConfig {
    pub completion_url: String,
    pub api_key: String,
    pub folder_id: Option<String>,
    pub model_uri: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl GeneratorConfig {
    pub fn from_env() -> Result<Self, GenerateError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any variable source; blank values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GenerateError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = var(ENV_API_KEY)
            .ok_or_else(|| GenerateError::Configuration(format!("{ENV_API_KEY} is not set")))?;
        let folder_id = var(ENV_FOLDER_ID);
        let model_uri = match (var(ENV_MODEL_URI), &folder_id) {
            (Some(model_uri), _) => model_uri,
            (None, Some(folder_id)) => format!("gpt://{folder_id}/yandexgpt"),
            (None, None) => {
                return Err(GenerateError::Configuration(format!(
                    "set {ENV_MODEL_URI} or {ENV_FOLDER_ID}"
                )));
            }
        };

        Ok(Self {
            completion_url: var(ENV_COMPLETION_URL)
                .unwrap_or_else(|| DEFAULT_COMPLETION_URL.to_string()),
            api_key,
            folder_id,
            model_uri,
            temperature: parse_var(&var, ENV_TEMPERATURE)?.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: parse_var(&var, ENV_MAX_TOKENS)?,
            timeout: Duration::from_secs(
                parse_var(&var, ENV_TIMEOUT_SECS)?.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, GenerateError> {
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| GenerateError::Configuration(format!("{key} has invalid value '{raw}'")))
        })
        .transpose()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionBody {
    pub model_uri: String,
    pub completion_options: CompletionOptions,
    pub messages: Vec<CompletionMessage>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    pub stream: bool,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    result: CompletionResult,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionResult {
    #[serde(default)]
    alternatives: Vec<CompletionAlternative>,
}

#[derive(Debug, Deserialize)]
struct CompletionAlternative {
    message: CompletionMessage,
}

pub fn completion_body(config: &GeneratorConfig, request: &CompletionRequest) -> CompletionBody {
    CompletionBody {
        model_uri: config.model_uri.clone(),
        completion_options: CompletionOptions {
            stream: false,
            temperature: request.temperature.unwrap_or(config.temperature),
            max_tokens: config.max_tokens,
        },
        messages: vec![
            CompletionMessage {
                role: "system".to_string(),
                text: request.system_prompt.clone(),
            },
            CompletionMessage {
                role: "user".to_string(),
                text: request.user_prompt.clone(),
            },
        ],
    }
}

/// Text of the first alternative in a completion response.
pub fn completion_text(raw: &[u8]) -> Result<String, GenerateError> {
    let response: CompletionResponse = serde_json::from_slice(raw)
        .map_err(|err| GenerateError::Http(format!("invalid completion response: {err}")))?;
    let text = response
        .result
        .alternatives
        .into_iter()
        .next()
        .map(|alternative| alternative.message.text)
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(GenerateError::EmptyCompletion);
    }
    Ok(text)
}

#[derive(Clone, Debug)]
pub struct HttpCompletionGenerator {
    client: reqwest::Client,
    config: GeneratorConfig,
}

impl HttpCompletionGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerateError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| GenerateError::Configuration(format!("http client build failed: {err}")))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, GenerateError> {
        Self::new(GeneratorConfig::from_env()?)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl TextGenerator for HttpCompletionGenerator {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerateError> {
        let body = completion_body(&self.config, &request);
        let mut builder = self
            .client
            .post(&self.config.completion_url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Api-Key {}", self.config.api_key),
            )
            .json(&body);
        if let Some(folder_id) = &self.config.folder_id {
            builder = builder.header("x-folder-id", folder_id);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| GenerateError::Http(format!("completion request failed: {err}")))?;
        let status = response.status();
        let raw = response
            .bytes()
            .await
            .map_err(|err| GenerateError::Http(format!("reading completion failed: {err}")))?;
        if !status.is_success() {
            return Err(GenerateError::Http(format!(
                "completion request failed with status {status}: {}",
                String::from_utf8_lossy(&raw)
            )));
        }

        let text = completion_text(&raw)?;
        tracing::debug!(
            chars = text.chars().count(),
            preview = %text.chars().take(100).collect::<String>(),
            "completion received"
        );
        Ok(text)
    }
}
