use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::DEFAULT_STANDARDS;

/// Runtime configuration for the pipeline and its collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsroomConfig {
    pub gateway_url: String,
    #[serde(skip_serializing)]
    pub gateway_api_key: Option<String>,
    pub agent_timeout_secs: u64,
    pub use_deep_research: bool,
    pub skip_sensitivity_check: bool,
    pub render_callback_url: Option<String>,
    pub render_seconds_per_scene: u64,
    pub chat_history_window: usize,
    pub standards: Vec<String>,
}

impl Default for NewsroomConfig {
    fn default() -> Self {
        Self {
            gateway_url: std::env::var("GENERATION_GATEWAY_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8100".into()),
            gateway_api_key: std::env::var("GENERATION_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            agent_timeout_secs: env_parse("AGENT_TIMEOUT", 60),
            use_deep_research: env_flag("USE_DEEP_RESEARCH", true),
            skip_sensitivity_check: env_flag("SKIP_SENSITIVITY_CHECK", false),
            render_callback_url: std::env::var("RENDER_CALLBACK_URL").ok(),
            render_seconds_per_scene: env_parse("RENDER_SECONDS_PER_SCENE", 45),
            chat_history_window: env_parse("CHAT_HISTORY_WINDOW", 10),
            standards: DEFAULT_STANDARDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl NewsroomConfig {
    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_secs.max(1))
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn for_tests() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:0".into(),
            gateway_api_key: None,
            agent_timeout_secs: 5,
            use_deep_research: false,
            skip_sensitivity_check: false,
            render_callback_url: None,
            render_seconds_per_scene: 45,
            chat_history_window: 10,
            standards: DEFAULT_STANDARDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
