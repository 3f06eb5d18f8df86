//! Runtime settings, read from the process environment.
//!
//! A `.env` file in the working directory is loaded first when present.
//!
//! - `LABS_PROVIDER`: `openai` (default), `ollama` or `openrouter`.
//! - `LABS_MODEL`: model identifier. Defaults to `gpt-4o-mini`.
//! - `OPENAI_API_KEY` / `OPENROUTER_API_KEY`: credential for the provider.
//! - `LABS_BASE_URL`: optional endpoint override.
//! - `LABS_TEMPERATURE`: optional sampling temperature.
//! - `LABS_PROMPT_PATH`: ReAct prompt file. Defaults to `prompts/tutorial.react-prompt.md`.
//! - `LABS_MAX_ITERATIONS`: decision loop cap. Defaults to `15`.
//! - `LABS_BIND`: web form address. Defaults to `127.0.0.1:8501`.
//! - `LANGFUSE_PUBLIC_KEY`, `LANGFUSE_SECRET_KEY`, `LANGFUSE_HOST`: optional trace export.

use std::{net::SocketAddr, path::PathBuf};

use crate::services::llm::{ClientConfig, Provider};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_PROMPT_PATH: &str = "prompts/tutorial.react-prompt.md";
pub const DEFAULT_MAX_ITERATIONS: usize = 15;
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `(variable, offending value)`
    InvalidValue(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(name, value) => {
                write!(f, "Invalid value for {name}: {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LangfuseSettings {
    pub public_key: Option<String>,
    pub secret_key: Option<String>,
    pub host: Option<String>,
}

impl LangfuseSettings {
    pub fn is_enabled(&self) -> bool {
        self.public_key.is_some() && self.secret_key.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub provider: Provider,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub prompt_path: PathBuf,
    pub max_iterations: usize,
    pub bind: SocketAddr,
    pub langfuse: LangfuseSettings,
}

impl Settings {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenv::dotenv() {
            tracing::debug!(error = %e, "no .env file loaded");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match var("LABS_PROVIDER") {
            Some(raw) => raw
                .parse::<Provider>()
                .map_err(|_| ConfigError::InvalidValue("LABS_PROVIDER".into(), raw))?,
            None => Provider::default(),
        };

        let api_key = match provider {
            Provider::OpenAi => var("OPENAI_API_KEY"),
            Provider::OpenRouter => var("OPENROUTER_API_KEY"),
            Provider::Ollama => None,
        };

        let temperature = var("LABS_TEMPERATURE")
            .map(|raw| {
                raw.trim()
                    .parse::<f32>()
                    .map_err(|_| ConfigError::InvalidValue("LABS_TEMPERATURE".into(), raw))
            })
            .transpose()?;

        let max_iterations = match var("LABS_MAX_ITERATIONS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidValue("LABS_MAX_ITERATIONS".into(), raw)),
            },
            None => DEFAULT_MAX_ITERATIONS,
        };

        let bind_raw = var("LABS_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue("LABS_BIND".into(), bind_raw.clone()))?;

        Ok(Self {
            provider,
            model: var("LABS_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
            base_url: var("LABS_BASE_URL"),
            temperature,
            prompt_path: var("LABS_PROMPT_PATH")
                .unwrap_or_else(|| DEFAULT_PROMPT_PATH.to_string())
                .into(),
            max_iterations,
            bind,
            langfuse: LangfuseSettings {
                public_key: var("LANGFUSE_PUBLIC_KEY"),
                secret_key: var("LANGFUSE_SECRET_KEY"),
                host: var("LANGFUSE_HOST"),
            },
        })
    }

    /// Client configuration for [`crate::services::llm::InferenceClient`].
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.provider.clone())
            .with_base_url(self.base_url.clone())
            .with_api_key(self.api_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_to_empty_environment() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.provider, Provider::OpenAi);
        assert_eq!(s.model, DEFAULT_MODEL);
        assert_eq!(s.api_key, None);
        assert_eq!(s.prompt_path, PathBuf::from(DEFAULT_PROMPT_PATH));
        assert_eq!(s.max_iterations, 15);
        assert_eq!(s.bind.to_string(), DEFAULT_BIND);
        assert!(!s.langfuse.is_enabled());
    }

    #[test]
    fn credential_follows_provider() {
        let vars = [
            ("OPENAI_API_KEY", "sk-openai"),
            ("OPENROUTER_API_KEY", "sk-or"),
        ];
        assert_eq!(settings(&vars).unwrap().api_key.as_deref(), Some("sk-openai"));

        let mut routed = vars.to_vec();
        routed.push(("LABS_PROVIDER", "OpenRouter"));
        let s = settings(&routed).unwrap();
        assert_eq!(s.provider, Provider::OpenRouter);
        assert_eq!(s.api_key.as_deref(), Some("sk-or"));

        let mut local = vars.to_vec();
        local.push(("LABS_PROVIDER", "ollama"));
        assert_eq!(settings(&local).unwrap().api_key, None);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let s = settings(&[("LABS_MODEL", "  "), ("OPENAI_API_KEY", "")]).unwrap();
        assert_eq!(s.model, DEFAULT_MODEL);
        assert_eq!(s.api_key, None);
    }

    #[test]
    fn invalid_values_are_reported_with_their_name() {
        assert_eq!(
            settings(&[("LABS_MAX_ITERATIONS", "0")]).unwrap_err(),
            ConfigError::InvalidValue("LABS_MAX_ITERATIONS".into(), "0".into())
        );
        assert_eq!(
            settings(&[("LABS_TEMPERATURE", "warm")]).unwrap_err(),
            ConfigError::InvalidValue("LABS_TEMPERATURE".into(), "warm".into())
        );
        assert!(settings(&[("LABS_PROVIDER", "bedrock")]).is_err());
        assert!(settings(&[("LABS_BIND", "localhost")]).is_err());
    }

    #[test]
    fn client_config_carries_provider_and_key() {
        let s = settings(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("LABS_BASE_URL", "http://127.0.0.1:9999/v1"),
        ])
        .unwrap();
        let cfg = s.client_config();
        assert_eq!(cfg.provider, Provider::OpenAi);
        assert_eq!(cfg.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.base_url.as_deref(), Some("http://127.0.0.1:9999/v1"));
    }
}
