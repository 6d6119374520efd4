//! Process-wide wiring from configuration.
//!
//! One provider, one `RetryingCaller` (so the per-dependency admission
//! ceilings hold across every task), one search cache, and a tool registry
//! per task kind. Gateway handlers and CLI commands share a single
//! `Runtime`.

use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use vidscout_config::AppConfig;
use vidscout_core::cache::TtlCache;
use vidscout_core::error::ProviderError;
use vidscout_core::provider::Provider;
use vidscout_core::report::ReportStore;
use vidscout_core::tool::{ToolRegistry, ToolServices};
use vidscout_tools::{FileReportStore, HttpSearchBackend, HttpVideoPlatform};

use crate::loop_runner::{AgentLoop, DEFAULT_BATCH_WORKERS, DEFAULT_INTERACTIVE_ROUNDS, DEFAULT_RESEARCH_ROUNDS};
use crate::stream_event::AgentEvent;
use crate::task::{TaskKind, TaskRequest};

/// Knobs shared by both agent loops.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub interactive_rounds: u32,
    pub research_rounds: u32,
    pub batch_workers: usize,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".into(),
            temperature: 0.7,
            max_tokens: None,
            interactive_rounds: DEFAULT_INTERACTIVE_ROUNDS,
            research_rounds: DEFAULT_RESEARCH_ROUNDS,
            batch_workers: DEFAULT_BATCH_WORKERS,
        }
    }
}

impl From<&AppConfig> for LoopSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            model: config.default_model.clone(),
            temperature: config.temperature,
            max_tokens: Some(config.max_tokens),
            interactive_rounds: config.rounds.interactive,
            research_rounds: config.rounds.research,
            batch_workers: config.limits.batch_workers,
        }
    }
}

pub struct Runtime {
    provider: Arc<dyn Provider>,
    interactive: AgentLoop,
    research: AgentLoop,
}

impl Runtime {
    /// Build the provider, service clients and both agent loops.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let caller = config.retrying_caller();
        let provider = vidscout_providers::build_from_config(config, caller.clone())?;

        let mut services = ToolServices::new(caller)
            .with_completion(provider.clone(), &config.default_model)
            .with_cache(Arc::new(TtlCache::new()))
            .with_settings(config.tool_settings());

        match &config.video.api_url {
            Some(url) => {
                services = services.with_video(Arc::new(HttpVideoPlatform::new(url, config.video.api_key.clone())));
            }
            None => warn!("No video platform configured ([video] api_url), video tools will report errors"),
        }
        match &config.search.api_url {
            Some(url) => {
                services = services.with_search(Arc::new(HttpSearchBackend::new(url, config.search.api_key.clone())));
            }
            None => warn!("No search backend configured ([search] api_url), web_search will report errors"),
        }

        let store: Arc<dyn ReportStore> = Arc::new(FileReportStore::new(config.reports_dir()));
        info!(
            provider = provider.name(),
            model = %config.default_model,
            reports = %config.reports_dir().display(),
            "Runtime ready"
        );
        Ok(Self::assemble(provider, services, LoopSettings::from(config), Some(store)))
    }

    /// Wire already-built parts together.
    pub fn assemble(
        provider: Arc<dyn Provider>,
        services: ToolServices,
        settings: LoopSettings,
        report_store: Option<Arc<dyn ReportStore>>,
    ) -> Self {
        let interactive_tools = vidscout_tools::interactive_registry();
        interactive_tools.set_services(&services);
        let research_tools = vidscout_tools::research_registry();
        research_tools.set_services(&services);

        let build = |tools: ToolRegistry, kind: TaskKind, rounds: u32| {
            let mut agent = AgentLoop::new(provider.clone(), &settings.model, Arc::new(tools), kind)
                .with_temperature(settings.temperature)
                .with_max_rounds(rounds)
                .with_batch_workers(settings.batch_workers);
            if let Some(max_tokens) = settings.max_tokens {
                agent = agent.with_max_tokens(max_tokens);
            }
            agent
        };

        let interactive = build(interactive_tools, TaskKind::Interactive, settings.interactive_rounds);
        let mut research = build(research_tools, TaskKind::Research, settings.research_rounds);
        if let Some(store) = report_store {
            research = research.with_report_store(store);
        }

        Self {
            provider,
            interactive,
            research,
        }
    }

    pub fn agent(&self, kind: TaskKind) -> &AgentLoop {
        match kind {
            TaskKind::Interactive => &self.interactive,
            TaskKind::Research => &self.research,
        }
    }

    pub fn tools(&self, kind: TaskKind) -> &Arc<ToolRegistry> {
        self.agent(kind).tools()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Start `request` on the loop for its kind.
    pub fn run(&self, request: TaskRequest) -> ReceiverStream<AgentEvent> {
        self.agent(request.kind).run(request.task, request.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use vidscout_core::retry::RetryingCaller;
    use vidscout_tools::FINISH_TOOL;

    fn runtime(provider: Arc<ScriptedProvider>, store: Option<Arc<dyn ReportStore>>) -> Runtime {
        let settings = LoopSettings {
            model: "scripted-model".into(),
            interactive_rounds: 4,
            research_rounds: 9,
            ..LoopSettings::default()
        };
        Runtime::assemble(provider, ToolServices::new(RetryingCaller::default()), settings, store)
    }

    #[test]
    fn registries_differ_by_kind() {
        let rt = runtime(Arc::new(ScriptedProvider::new(vec![])), None);
        assert!(!rt.tools(TaskKind::Interactive).has(FINISH_TOOL));
        assert!(rt.tools(TaskKind::Research).has(FINISH_TOOL));
        assert_eq!(rt.agent(TaskKind::Interactive).max_rounds(), 4);
        assert_eq!(rt.agent(TaskKind::Research).max_rounds(), 9);
        assert_eq!(rt.provider_name(), "scripted");
    }

    #[tokio::test]
    async fn run_dispatches_by_kind() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_turn(&[("f", "finish_research", r#"{"summary":"s"}"#)]),
            text_turn("the report"),
        ]));
        let store = Arc::new(MemoryReportStore::default());
        let rt = runtime(provider.clone(), Some(store.clone()));

        let events = collect(rt.run(TaskRequest::new(TaskKind::Research, "mics"))).await;

        assert_eq!(count(&events, "report_start"), 1);
        assert_eq!(store.saved().len(), 1);
        let first = &provider.requests()[0];
        assert_eq!(first.model, "scripted-model");
        assert_eq!(first.tools.len(), 5);
    }

    #[tokio::test]
    async fn tools_without_services_fail_softly() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_turn(&[("s", "search_videos", r#"{"keyword":"mics"}"#)]),
            text_turn("no data"),
        ]));
        let rt = runtime(provider, None);

        let events = collect(rt.run(TaskRequest::new(TaskKind::Interactive, "mics"))).await;

        assert!(events.iter().any(|e| matches!(
            e,
            AgentEvent::ToolResult { success: false, data, .. }
                if data["error"].as_str().unwrap_or("").contains("no video platform configured")
        )));
        assert_eq!(events.last(), Some(&AgentEvent::Done));
    }

    #[test]
    fn from_config_requires_a_key_for_remote_backends() {
        let config = AppConfig::default();
        assert!(matches!(
            Runtime::from_config(&config),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn from_config_wires_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.api_key = Some("sk-test".into());
        config.reports.dir = Some(dir.path().to_path_buf());
        config.video.api_url = Some("http://127.0.0.1:9/video".into());
        config.rounds.research = 7;

        let rt = Runtime::from_config(&config).unwrap();
        assert_eq!(rt.provider_name(), "openai");
        assert_eq!(rt.agent(TaskKind::Research).max_rounds(), 7);
        assert_eq!(rt.tools(TaskKind::Interactive).len(), 4);
    }

    #[test]
    fn settings_follow_config() {
        let mut config = AppConfig::default();
        config.default_model = "deepseek-reasoner".into();
        config.limits.batch_workers = 3;
        let settings = LoopSettings::from(&config);
        assert_eq!(settings.model, "deepseek-reasoner");
        assert_eq!(settings.batch_workers, 3);
        assert_eq!(settings.interactive_rounds, 15);
        assert_eq!(settings.research_rounds, 100);
    }
}
