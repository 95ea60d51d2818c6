//! Builds the configured upstream client.

use std::sync::Arc;

use serde::Deserialize;

use crate::error::{AiError, Result};
use crate::llm::{LlmClient, MockLlmClient, OpenAIClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Zhipu,
    OpenAI,
    Mock,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zhipu => "zhipu",
            Self::OpenAI => "openai",
            Self::Mock => "mock",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "zhipu" | "glm" => Ok(Self::Zhipu),
            "openai" => Ok(Self::OpenAI),
            "mock" => Ok(Self::Mock),
            other => Err(AiError::Config(format!("unknown llm provider: {}", other))),
        }
    }

    /// Environment variable consulted when no key is configured.
    pub fn default_api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::Zhipu => Some("ZHIPU_API_KEY"),
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Mock => None,
        }
    }
}

/// Upstream provider settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub api_key_env: Option<String>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: None,
            base_url: None,
            api_key: None,
            api_key_env: None,
            temperature: 0.7,
            max_tokens: None,
        }
    }
}

impl LlmSettings {
    /// Resolve the API key from the settings or the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_deref()
            && !key.trim().is_empty()
        {
            return Some(key.trim().to_string());
        }

        let env_name = self
            .api_key_env
            .as_deref()
            .or_else(|| self.provider.default_api_key_env())?;
        std::env::var(env_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Create the configured client, or `None` when the provider needs a key
/// that cannot be resolved.
pub fn create_client(settings: &LlmSettings) -> Option<Arc<dyn LlmClient>> {
    if settings.provider == LlmProvider::Mock {
        let model = settings.model.clone().unwrap_or_else(|| "mock".to_string());
        return Some(Arc::new(MockLlmClient::new(model)));
    }

    let Some(api_key) = settings.resolve_api_key() else {
        tracing::warn!(
            provider = settings.provider.as_str(),
            "No API key configured for LLM provider"
        );
        return None;
    };

    let mut client = match settings.provider {
        LlmProvider::Zhipu => OpenAIClient::zhipu(api_key),
        _ => OpenAIClient::new(api_key),
    };
    if let Some(model) = settings.model.as_deref() {
        client = client.with_model(model);
    }
    if let Some(base_url) = settings.base_url.as_deref() {
        client = client.with_base_url(base_url);
    }

    Some(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!(LlmProvider::parse("Zhipu").unwrap(), LlmProvider::Zhipu);
        assert_eq!(LlmProvider::parse("openai").unwrap(), LlmProvider::OpenAI);
        assert_eq!(LlmProvider::parse(" mock ").unwrap(), LlmProvider::Mock);
        assert!(LlmProvider::parse("anthropic").is_err());
    }

    #[test]
    fn test_explicit_key_wins() {
        let settings = LlmSettings {
            api_key: Some("  sk-test ".to_string()),
            api_key_env: Some("ROLECHAT_TEST_UNSET_KEY_VAR".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.resolve_api_key().as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_missing_key_yields_no_client() {
        let settings = LlmSettings {
            api_key: Some("   ".to_string()),
            api_key_env: Some("ROLECHAT_TEST_UNSET_KEY_VAR".to_string()),
            ..Default::default()
        };
        assert!(create_client(&settings).is_none());
    }

    #[test]
    fn test_mock_needs_no_key() {
        let settings = LlmSettings {
            provider: LlmProvider::Mock,
            ..Default::default()
        };
        let client = create_client(&settings).unwrap();
        assert_eq!(client.provider(), "mock");
        assert_eq!(client.model(), "mock");
    }

    #[test]
    fn test_zhipu_client_overrides() {
        let settings = LlmSettings {
            api_key: Some("k".to_string()),
            model: Some("glm-4-flash".to_string()),
            ..Default::default()
        };
        let client = create_client(&settings).unwrap();
        assert_eq!(client.provider(), "zhipu");
        assert_eq!(client.model(), "glm-4-flash");
    }

    #[test]
    fn test_settings_deserialize_defaults() {
        let settings: LlmSettings = serde_json::from_value(serde_json::json!({
            "provider": "openai",
            "model": "gpt-4o-mini"
        }))
        .unwrap();
        assert_eq!(settings.provider, LlmProvider::OpenAI);
        assert_eq!(settings.temperature, 0.7);
        assert!(settings.max_tokens.is_none());
    }
}
