use std::{fmt, future::Future, pin::Pin, str::FromStr, sync::Arc};

use crate::services::llm::{
    client_config::ClientConfig,
    models::{
        chat::{ChatRequest, ChatResponse},
        errors::ModelClientError,
    },
    providers::{ollama::OllamaClient, openai::OpenAiClient},
};

pub type ChatFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ChatResponse, ModelClientError>> + Send + 'a>>;

/// Anything that can answer a chat request.
///
/// [`InferenceClient`] is the network-backed implementation; the agent
/// loop only ever talks to this trait.
pub trait ChatModel: Send + Sync + fmt::Debug {
    fn chat(&self, req: ChatRequest) -> ChatFuture<'_>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Provider {
    #[default]
    OpenAi,
    Ollama,
    OpenRouter,
}

impl FromStr for Provider {
    type Err = ModelClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "ollama" => Ok(Provider::Ollama),
            "openrouter" => Ok(Provider::OpenRouter),
            other => Err(ModelClientError::Config(format!("Unknown provider: {other}"))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Ollama => write!(f, "ollama"),
            Provider::OpenRouter => write!(f, "openrouter"),
        }
    }
}

#[derive(Debug, Clone)]
enum ClientInner {
    OpenAi(OpenAiClient),
    Ollama(OllamaClient),
}

/// Provider-dispatching model client; cheap to clone.
#[derive(Clone, Debug)]
pub struct InferenceClient {
    inner: Arc<ClientInner>,
}

impl InferenceClient {
    pub async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, ModelClientError> {
        match &*self.inner {
            ClientInner::OpenAi(c) => c.chat(req).await,
            ClientInner::Ollama(c) => c.chat(req).await,
        }
    }
}

impl ChatModel for InferenceClient {
    fn chat(&self, req: ChatRequest) -> ChatFuture<'_> {
        Box::pin(InferenceClient::chat(self, req))
    }
}

impl TryFrom<ClientConfig> for InferenceClient {
    type Error = ModelClientError;

    fn try_from(cfg: ClientConfig) -> Result<Self, Self::Error> {
        let inner = match cfg.provider {
            Provider::OpenAi => ClientInner::OpenAi(OpenAiClient::new(cfg)?),
            Provider::OpenRouter => ClientInner::OpenAi(OpenAiClient::openrouter(cfg)?),
            Provider::Ollama => ClientInner::Ollama(OllamaClient::new(cfg)?),
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }
}
