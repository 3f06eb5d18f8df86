use std::fmt;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{error, span, Instrument, Level, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::services::llm::client_config::ClientConfig;
use crate::services::llm::models::{
    base::Message,
    chat::{ChatRequest, ChatResponse},
    errors::ModelClientError,
};

#[derive(Debug, Clone)]
pub struct OllamaClient {
    pub client: Client,
    pub base_url: String,
}

impl OllamaClient {
    pub fn new(cfg: ClientConfig) -> Result<Self, ModelClientError> {
        let base_url = cfg.base_url.unwrap_or("http://localhost:11434".into());
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    async fn post<T, R>(&self, endpoint: &str, request_body: &T) -> Result<R, ModelClientError>
    where
        T: Serialize + fmt::Debug,
        R: DeserializeOwned + fmt::Debug,
    {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), endpoint);

        let span = span!(
            Level::INFO,
            "Ollama HTTP Request",
            "langfuse.observation.name" = format!("POST {}", endpoint).as_str(),
            "langfuse.observation.type" = "span",
            "http.request.method" = "POST",
            "url.full" = url.as_str(),
            "server.address" = self.base_url.as_str(),
        );

        if let Ok(body) = serde_json::to_string(request_body) {
            span.set_attribute("langfuse.observation.input", body);
        }

        self.send(&url, request_body).instrument(span).await
    }

    async fn send<T, R>(&self, url: &str, request_body: &T) -> Result<R, ModelClientError>
    where
        T: Serialize + fmt::Debug,
        R: DeserializeOwned + fmt::Debug,
    {
        let response = self
            .client
            .post(url)
            .json(request_body)
            .send()
            .await
            .map_err(|e| {
                Span::current().set_status(opentelemetry::trace::Status::Error {
                    description: e.to_string().into(),
                });
                ModelClientError::Request(e.to_string())
            })?;

        let status = response.status();
        Span::current().set_attribute("http.response.status_code", status.as_u16() as i64);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".into());

            error!(%status, body = %error_text, "request failed");

            Span::current().set_status(opentelemetry::trace::Status::Error {
                description: format!("HTTP {}", status).into(),
            });
            Span::current().set_attribute("langfuse.observation.status_message", error_text.clone());

            return Err(ModelClientError::Api(format!(
                "Ollama request failed: {status} - {error_text}"
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ModelClientError::Api(format!("Failed to read response text: {e}")))?;

        Span::current().set_attribute("langfuse.observation.output", response_text.clone());

        serde_json::from_str::<R>(&response_text).map_err(|e| {
            error!(%e, raw = %response_text, "deserialization error");
            Span::current().set_status(opentelemetry::trace::Status::Error {
                description: "Deserialization Error".into(),
            });
            ModelClientError::Serialization(format!(
                "Error decoding response body: {e}. Raw JSON was: '{response_text}'"
            ))
        })
    }

    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ModelClientError> {
        let body = OllamaChatRequest::from(request);
        let resp: OllamaChatResponse = self.post("/api/chat", &body).await?;
        Ok(resp.into())
    }
}

#[derive(Serialize, Debug)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize, Debug, Default)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

impl From<ChatRequest> for OllamaChatRequest {
    fn from(value: ChatRequest) -> Self {
        let ChatRequest { base, messages } = value;
        let options = base.options.map(|o| OllamaOptions {
            temperature: o.temperature,
            top_p: o.top_p,
            seed: o.seed,
            num_predict: o.max_tokens,
            stop: o.stop,
        });
        Self {
            model: base.model,
            messages,
            stream: false,
            options,
        }
    }
}

#[derive(Deserialize, Debug)]
struct OllamaChatResponse {
    model: String,
    message: Message,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl From<OllamaChatResponse> for ChatResponse {
    fn from(value: OllamaChatResponse) -> Self {
        ChatResponse {
            model: value.model,
            message: value.message,
            done_reason: value.done_reason,
            prompt_tokens: value.prompt_eval_count,
            completion_tokens: value.eval_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::{BaseRequest, InferenceOptions};

    #[test]
    fn options_are_nested_and_stream_disabled() {
        let req = ChatRequest {
            base: BaseRequest {
                model: "qwen3:0.6b".into(),
                options: Some(InferenceOptions {
                    max_tokens: Some(256),
                    stop: Some(vec!["\nObservation".into()]),
                    ..Default::default()
                }),
            },
            messages: vec![Message::user("hi")],
        };
        let body = serde_json::to_value(OllamaChatRequest::from(req)).unwrap();
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 256);
        assert_eq!(body["options"]["stop"][0], "\nObservation");
        assert!(body["options"].get("temperature").is_none());
    }

    #[test]
    fn response_maps_eval_counts() {
        let raw = r#"{
            "model": "qwen3:0.6b",
            "created_at": "2025-01-01T00:00:00Z",
            "message": {"role": "assistant", "content": "Thought: done"},
            "done": true,
            "done_reason": "stop",
            "prompt_eval_count": 12,
            "eval_count": 4
        }"#;
        let parsed: OllamaChatResponse = serde_json::from_str(raw).unwrap();
        let resp = ChatResponse::from(parsed);
        assert_eq!(resp.message.text(), "Thought: done");
        assert_eq!(resp.prompt_tokens, Some(12));
        assert_eq!(resp.completion_tokens, Some(4));
    }
}
