use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};
use tracing::{error, span, Instrument, Level, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::services::llm::client_config::ClientConfig;
use crate::services::llm::models::base::{Message, Role};
use crate::services::llm::models::chat::{ChatRequest, ChatResponse};
use crate::services::llm::models::errors::ModelClientError;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Client for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    label: &'static str,
}

impl OpenAiClient {
    pub fn new(cfg: ClientConfig) -> Result<Self, ModelClientError> {
        Self::with_defaults(cfg, OPENAI_BASE_URL, "OpenAI")
    }

    pub fn openrouter(cfg: ClientConfig) -> Result<Self, ModelClientError> {
        Self::with_defaults(cfg, OPENROUTER_BASE_URL, "OpenRouter")
    }

    fn with_defaults(
        cfg: ClientConfig,
        default_base_url: &str,
        label: &'static str,
    ) -> Result<Self, ModelClientError> {
        let api_key = cfg
            .api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ModelClientError::Config(format!("{label} requires api_key")))?;
        let base_url = cfg
            .base_url
            .unwrap_or_else(|| default_base_url.to_string());

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| ModelClientError::Config(format!("Invalid api_key header: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self { client, base_url, label })
    }

    pub async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, ModelClientError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = OaChatRequest::from(req);

        let span = span!(
            Level::INFO,
            "OpenAI HTTP Request",
            "langfuse.observation.name" = "POST /chat/completions",
            "langfuse.observation.type" = "generation",
            "gen_ai.request.model" = body.model.as_str(),
            "http.request.method" = "POST",
            "url.full" = url.as_str(),
        );

        if let Ok(raw) = serde_json::to_string(&body) {
            span.set_attribute("langfuse.observation.input", raw);
        }

        self.send(&url, &body).instrument(span).await
    }

    async fn send(&self, url: &str, body: &OaChatRequest) -> Result<ChatResponse, ModelClientError> {
        let resp = self.client.post(url).json(body).send().await.map_err(|e| {
            Span::current().set_status(opentelemetry::trace::Status::Error {
                description: e.to_string().into(),
            });
            ModelClientError::Request(e.to_string())
        })?;

        let status = resp.status();
        Span::current().set_attribute("http.response.status_code", status.as_u16() as i64);
        let text = resp.text().await?;

        if !status.is_success() {
            error!(%status, body = %text, "request failed");
            Span::current().set_status(opentelemetry::trace::Status::Error {
                description: format!("HTTP {status}").into(),
            });
            if let Some(e) = parse_error_envelope(self.label, &text) {
                return Err(e);
            }
            return Err(ModelClientError::Api(format!(
                "{} request failed: {status} - {text}",
                self.label
            )));
        }

        // some gateways answer 200 with an error body
        if let Some(e) = parse_error_envelope(self.label, &text) {
            return Err(e);
        }

        Span::current().set_attribute("langfuse.observation.output", text.clone());

        let parsed: OaChatResponse = serde_json::from_str(&text).map_err(|e| {
            error!(%e, raw = %text, "deserialization error");
            ModelClientError::Serialization(format!("decode error: {e}; raw: {text}"))
        })?;

        Ok(ChatResponse::from(parsed))
    }
}

#[derive(Serialize, Debug)]
struct OaChatRequest {
    model: String,
    messages: Vec<OaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

impl From<ChatRequest> for OaChatRequest {
    fn from(value: ChatRequest) -> Self {
        let ChatRequest { base, messages } = value;
        let opts = base.options.unwrap_or_default();
        Self {
            model: base.model,
            messages: messages
                .into_iter()
                .map(|m| OaMessage {
                    role: m.role,
                    content: m.content.unwrap_or_default(),
                })
                .collect(),
            temperature: opts.temperature,
            top_p: opts.top_p,
            max_tokens: opts.max_tokens,
            seed: opts.seed,
            stop: opts.stop.filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct OaMessage {
    role: Role,
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct OaChoice {
    message: OaResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OaResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OaUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct OaChatResponse {
    model: String,
    choices: Vec<OaChoice>,
    usage: Option<OaUsage>,
}

impl From<OaChatResponse> for ChatResponse {
    fn from(value: OaChatResponse) -> Self {
        let first = value.choices.into_iter().next();
        let (content, done_reason) = match first {
            Some(c) => (c.message.content.unwrap_or_default(), c.finish_reason),
            None => (String::new(), None),
        };
        ChatResponse {
            model: value.model,
            message: Message::assistant(content),
            done_reason,
            prompt_tokens: value.usage.as_ref().and_then(|u| u.prompt_tokens),
            completion_tokens: value.usage.as_ref().and_then(|u| u.completion_tokens),
        }
    }
}

#[derive(Deserialize, Debug)]
struct OaErrorEnvelope {
    error: OaErrorBody,
}

#[derive(Deserialize, Debug)]
struct OaErrorBody {
    message: String,
    #[serde(default)]
    code: serde_json::Value,
}

fn parse_error_envelope(label: &str, text: &str) -> Option<ModelClientError> {
    let s = text.trim_start();
    if !s.starts_with('{') || !s.contains("\"error\"") {
        return None;
    }
    serde_json::from_str::<OaErrorEnvelope>(s).ok().map(|env| {
        ModelClientError::Api(format!("{label} error {}: {}", env.error.code, env.error.message))
    })
}
