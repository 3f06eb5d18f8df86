use crate::services::llm::{InferenceClient, ModelClientError, Provider};

/// Connection details for one model provider.
///
/// Unset fields fall back to the provider's defaults when the client is
/// built: the public endpoint for `base_url`, no credential for `api_key`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientConfig {
    pub provider: Provider,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl ClientConfig {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: Option<impl Into<String>>) -> Self {
        self.base_url = base_url.map(Into::into);
        self
    }

    pub fn with_api_key(mut self, api_key: Option<impl Into<String>>) -> Self {
        self.api_key = api_key.map(Into::into);
        self
    }

    /// Build the provider client. Hosted providers reject a missing key here.
    pub fn build(self) -> Result<InferenceClient, ModelClientError> {
        InferenceClient::try_from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosted_providers_need_a_key_at_build_time() {
        for provider in [Provider::OpenAi, Provider::OpenRouter] {
            let err = ClientConfig::new(provider.clone())
                .with_api_key(None::<String>)
                .build()
                .unwrap_err();
            assert!(matches!(err, ModelClientError::Config(ref m) if m.contains("api_key")));

            let blank = ClientConfig::new(provider).with_api_key(Some("")).build();
            assert!(blank.is_err());
        }
    }

    #[test]
    fn setters_keep_the_provider() {
        let cfg = ClientConfig::new(Provider::Ollama)
            .with_base_url(Some("http://gpu-box:11434"))
            .with_api_key(None::<&str>);
        assert_eq!(cfg.provider, Provider::Ollama);
        assert_eq!(cfg.base_url.as_deref(), Some("http://gpu-box:11434"));
        assert!(cfg.build().is_ok());
    }
}
