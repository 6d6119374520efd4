//! Provider construction from configuration.
//!
//! One OpenAI-compatible backend, selected by `api_base`, wrapped in the
//! shared completion limit and retry policy.

use std::sync::Arc;
use vidscout_config::AppConfig;
use vidscout_core::error::ProviderError;
use vidscout_core::provider::Provider;
use vidscout_core::retry::RetryingCaller;

use crate::openai_compat::OpenAiCompatProvider;
use crate::retrying::RetryingProvider;

/// Well-known backends, keyed by a fragment of their base URL.
const KNOWN_BACKENDS: &[(&str, &str)] = &[
    ("api.openai.com", "openai"),
    ("api.deepseek.com", "deepseek"),
    ("openrouter.ai", "openrouter"),
    ("api.groq.com", "groq"),
    ("api.together.xyz", "together"),
    ("localhost:11434", "ollama"),
];

/// A short display name for the backend behind `base_url`.
pub fn provider_name_for(base_url: &str) -> &'static str {
    KNOWN_BACKENDS
        .iter()
        .find(|(fragment, _)| base_url.contains(fragment))
        .map(|(_, name)| *name)
        .unwrap_or("custom")
}

fn is_local(base_url: &str) -> bool {
    base_url.contains("://localhost") || base_url.contains("://127.0.0.1")
}

/// Build the completion provider every round and tool will share.
///
/// `caller` must be the process-wide instance so the completion ceiling
/// holds across tasks.
pub fn build_from_config(
    config: &AppConfig,
    caller: RetryingCaller,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = match (&config.api_key, is_local(&config.api_base)) {
        (Some(key), _) => key.clone(),
        (None, true) => String::new(),
        (None, false) => {
            return Err(ProviderError::NotConfigured(
                "no API key: set VIDSCOUT_API_KEY (or OPENAI_API_KEY) or api_key in config.toml".into(),
            ));
        }
    };

    let base = OpenAiCompatProvider::new(
        provider_name_for(&config.api_base),
        &config.api_base,
        api_key,
    );

    Ok(Arc::new(
        RetryingProvider::new(Arc::new(base), caller, config.completion_open_timeout())
            .with_idle_timeout(config.completion_idle_timeout()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_backend_names() {
        assert_eq!(provider_name_for("https://api.openai.com/v1"), "openai");
        assert_eq!(provider_name_for("https://api.deepseek.com/v1"), "deepseek");
        assert_eq!(provider_name_for("http://localhost:11434/v1"), "ollama");
        assert_eq!(provider_name_for("https://llm.internal.example/v1"), "custom");
    }

    #[test]
    fn missing_key_is_not_configured() {
        let config = AppConfig::default();
        let err = build_from_config(&config, RetryingCaller::default())
            .err()
            .unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn local_endpoint_needs_no_key() {
        let config = AppConfig {
            api_base: "http://localhost:11434/v1".into(),
            ..AppConfig::default()
        };
        let provider = build_from_config(&config, RetryingCaller::default()).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn build_with_key() {
        let config = AppConfig {
            api_key: Some("sk-test".into()),
            api_base: "https://api.deepseek.com/v1".into(),
            ..AppConfig::default()
        };
        let provider = build_from_config(&config, RetryingCaller::default()).unwrap();
        assert_eq!(provider.name(), "deepseek");
    }
}
