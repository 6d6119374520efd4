//! Configuration loading, validation, and management for vidscout.
//!
//! Loads configuration from `~/.vidscout/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use vidscout_core::limits::ConcurrencyLimits;
use vidscout_core::retry::{RetryPolicy, RetryingCaller};
use vidscout_core::tool::ToolSettings;

/// The root configuration structure.
///
/// Maps directly to `~/.vidscout/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible completion API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model used for every round and for tool-internal summarization
    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per completion response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub rounds: RoundsConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub video: VideoConfig,

    #[serde(default)]
    pub reports: ReportsConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_base", &self.api_base)
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("rounds", &self.rounds)
            .field("limits", &self.limits)
            .field("retry", &self.retry)
            .field("timeouts", &self.timeouts)
            .field("cache", &self.cache)
            .field("search", &self.search)
            .field("video", &self.video)
            .field("reports", &self.reports)
            .field("gateway", &self.gateway)
            .finish()
    }
}

/// Round ceilings per task kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundsConfig {
    #[serde(default = "default_interactive_rounds")]
    pub interactive: u32,

    #[serde(default = "default_research_rounds")]
    pub research: u32,
}

fn default_interactive_rounds() -> u32 {
    15
}
fn default_research_rounds() -> u32 {
    100
}

impl Default for RoundsConfig {
    fn default() -> Self {
        Self {
            interactive: default_interactive_rounds(),
            research: default_research_rounds(),
        }
    }
}

/// Process-wide concurrency ceilings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_completion_limit")]
    pub completion: usize,

    #[serde(default = "default_web_search_limit")]
    pub web_search: usize,

    #[serde(default = "default_frame_limit")]
    pub frame_extraction: usize,

    /// Upper bound on workers for one batch round
    #[serde(default = "default_batch_workers")]
    pub batch_workers: usize,
}

fn default_completion_limit() -> usize {
    4
}
fn default_web_search_limit() -> usize {
    3
}
fn default_frame_limit() -> usize {
    2
}
fn default_batch_workers() -> usize {
    5
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            completion: default_completion_limit(),
            web_search: default_web_search_limit(),
            frame_extraction: default_frame_limit(),
            batch_workers: default_batch_workers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    8000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        RetryPolicy::new(
            cfg.max_retries,
            Duration::from_millis(cfg.base_delay_ms),
            Duration::from_millis(cfg.max_delay_ms),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Time allowed for a completion stream to open
    #[serde(default = "default_completion_open_secs")]
    pub completion_open_secs: u64,

    /// Longest silence allowed between chunks of an open completion stream
    #[serde(default = "default_completion_idle_secs")]
    pub completion_idle_secs: u64,

    #[serde(default = "default_search_secs")]
    pub search_secs: u64,

    /// Video metadata / subtitle / comment calls
    #[serde(default = "default_metadata_secs")]
    pub metadata_secs: u64,
}

fn default_completion_open_secs() -> u64 {
    120
}
fn default_completion_idle_secs() -> u64 {
    90
}
fn default_search_secs() -> u64 {
    15
}
fn default_metadata_secs() -> u64 {
    20
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            completion_open_secs: default_completion_open_secs(),
            completion_idle_secs: default_completion_idle_secs(),
            search_secs: default_search_secs(),
            metadata_secs: default_metadata_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for cached web searches; 0 keeps entries forever
    #[serde(default = "default_search_ttl_secs")]
    pub search_ttl_secs: u64,
}

fn default_search_ttl_secs() -> u64 {
    600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search_ttl_secs: default_search_ttl_secs(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            max_results: default_max_results(),
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("max_results", &self.max_results)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Comments fetched per analyzed video
    #[serde(default = "default_comment_limit")]
    pub comment_limit: usize,

    /// Frames requested when frame extraction is enabled
    #[serde(default = "default_frame_count")]
    pub frame_count: usize,
}

fn default_comment_limit() -> usize {
    20
}
fn default_frame_count() -> usize {
    4
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            comment_limit: default_comment_limit(),
            frame_count: default_frame_count(),
        }
    }
}

impl std::fmt::Debug for VideoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("comment_limit", &self.comment_limit)
            .field("frame_count", &self.frame_count)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportsConfig {
    /// Where finished research reports are written (default `~/.vidscout/reports`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    42680
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.vidscout/config.toml).
    ///
    /// Environment variables override the file:
    /// - `VIDSCOUT_API_KEY` (falls back to `OPENAI_API_KEY`)
    /// - `VIDSCOUT_API_BASE`
    /// - `VIDSCOUT_MODEL`
    /// - `VIDSCOUT_SEARCH_API_KEY`
    /// - `VIDSCOUT_VIDEO_API_URL`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("VIDSCOUT_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(base) = lookup("VIDSCOUT_API_BASE") {
            self.api_base = base;
        }
        if let Some(model) = lookup("VIDSCOUT_MODEL") {
            self.default_model = model;
        }
        if let Some(key) = lookup("VIDSCOUT_SEARCH_API_KEY") {
            self.search.api_key = Some(key);
        }
        if let Some(url) = lookup("VIDSCOUT_VIDEO_API_URL") {
            self.video.api_url = Some(url);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".vidscout")
    }

    /// Directory research reports are written to.
    pub fn reports_dir(&self) -> PathBuf {
        self.reports
            .dir
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("reports"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.rounds.interactive == 0 || self.rounds.research == 0 {
            return Err(ConfigError::ValidationError(
                "round ceilings must be at least 1".into(),
            ));
        }

        let l = &self.limits;
        if l.completion == 0 || l.web_search == 0 || l.frame_extraction == 0 || l.batch_workers == 0 {
            return Err(ConfigError::ValidationError(
                "concurrency limits must be at least 1".into(),
            ));
        }

        if self.timeouts.completion_open_secs == 0 || self.timeouts.completion_idle_secs == 0 {
            return Err(ConfigError::ValidationError(
                "completion timeouts must be at least 1 second".into(),
            ));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::ValidationError(
                "retry.base_delay_ms must not exceed retry.max_delay_ms".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// The shared semaphores sized from `[limits]`.
    pub fn concurrency_limits(&self) -> ConcurrencyLimits {
        ConcurrencyLimits::new(
            self.limits.completion,
            self.limits.web_search,
            self.limits.frame_extraction,
        )
    }

    /// A caller bound to fresh limits and the configured retry policy.
    pub fn retrying_caller(&self) -> RetryingCaller {
        RetryingCaller::new(self.concurrency_limits(), RetryPolicy::from(&self.retry))
    }

    pub fn completion_open_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.completion_open_secs)
    }

    pub fn completion_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.completion_idle_secs)
    }

    /// Tool tunables derived from `[timeouts]`, `[cache]`, `[search]` and `[video]`.
    pub fn tool_settings(&self) -> ToolSettings {
        ToolSettings {
            search_ttl: Duration::from_secs(self.cache.search_ttl_secs),
            search_timeout: Duration::from_secs(self.timeouts.search_secs),
            metadata_timeout: Duration::from_secs(self.timeouts.metadata_secs),
            max_search_results: self.search.max_results,
            comment_limit: self.video.comment_limit,
            frame_count: self.video.frame_count,
        }
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            rounds: RoundsConfig::default(),
            limits: LimitsConfig::default(),
            retry: RetryConfig::default(),
            timeouts: TimeoutsConfig::default(),
            cache: CacheConfig::default(),
            search: SearchConfig::default(),
            video: VideoConfig::default(),
            reports: ReportsConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api_base, "https://api.openai.com/v1");
        assert_eq!(config.gateway.port, 42680);
        assert_eq!(config.rounds.interactive, 15);
        assert_eq!(config.rounds.research, 100);
        assert_eq!(config.limits.batch_workers, 5);
        assert_eq!(config.search.max_results, 5);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_model, config.default_model);
        assert_eq!(parsed.limits.web_search, 3);
        assert_eq!(parsed.timeouts.completion_open_secs, 120);
        assert_eq!(parsed.timeouts.completion_idle_secs, 90);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.cache.search_ttl_secs, 600);
        assert_eq!(config.video.comment_limit, 20);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            default_model = "deepseek-reasoner"

            [rounds]
            research = 40

            [limits]
            completion = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.default_model, "deepseek-reasoner");
        assert_eq!(config.rounds.research, 40);
        assert_eq!(config.rounds.interactive, 15);
        assert_eq!(config.limits.completion, 8);
        assert_eq!(config.limits.frame_extraction, 2);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 3.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_round_ceiling_rejected() {
        let mut config = AppConfig::default();
        config.rounds.interactive = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_idle_timeout_rejected() {
        let mut config = AppConfig::default();
        config.timeouts.completion_idle_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_limit_rejected() {
        let mut config = AppConfig::default();
        config.limits.batch_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gateway]\nport = 9000\n\n[cache]\nsearch_ttl_secs = 0\n").unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.tool_settings().search_ttl, Duration::ZERO);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "temperature = \"hot\"").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("OPENAI_API_KEY", "sk-fallback"),
            ("VIDSCOUT_API_BASE", "https://api.deepseek.com/v1"),
            ("VIDSCOUT_MODEL", "deepseek-reasoner"),
            ("VIDSCOUT_VIDEO_API_URL", "http://localhost:9000"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_key.as_deref(), Some("sk-fallback"));
        assert_eq!(config.api_base, "https://api.deepseek.com/v1");
        assert_eq!(config.default_model, "deepseek-reasoner");
        assert_eq!(config.video.api_url.as_deref(), Some("http://localhost:9000"));
        assert!(config.search.api_key.is_none());
    }

    #[test]
    fn vidscout_key_wins_over_openai_key() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("OPENAI_API_KEY", "sk-openai"), ("VIDSCOUT_API_KEY", "sk-vid")]);
        let mut config = AppConfig::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_key.as_deref(), Some("sk-vid"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        config.search.api_key = Some("search-secret".into());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(!rendered.contains("search-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn retry_config_converts_to_policy() {
        let policy = RetryPolicy::from(&RetryConfig::default());
        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn default_toml_generation() {
        let toml = AppConfig::default_toml();
        assert!(toml.contains("api_base"));
        assert!(toml.contains("[limits]"));
    }
}
