use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::error::ConfigError;

/// Development backend URL; overridden via config file or `TUTORIA_BASE_URL`.
const DEFAULT_BASE_URL: &str = "http://localhost:4000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Base URL of the backend REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Finite request timeout; timeouts surface as a distinct error from
    /// other network failures.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub rules: RuleConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub debug: bool,
}

fn default_working_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn default_data_dir() -> String {
    ".tutoria".into()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            working_dir: default_working_dir(),
            data_dir: default_data_dir(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            rules: RuleConfig::default(),
            sync: SyncConfig::default(),
            debug: false,
        }
    }
}

/// Scheduling rules the tutor adapter enforces before requesting a
/// transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Minimum lead time between now and a proposed session time.
    #[serde(default = "default_min_notice_hours")]
    pub min_notice_hours: u32,

    /// Per-tutor cap on accepted sessions per calendar date.
    #[serde(default = "default_max_daily_sessions")]
    pub max_daily_sessions: u32,
}

fn default_min_notice_hours() -> u32 {
    12
}

fn default_max_daily_sessions() -> u32 {
    8
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            min_notice_hours: default_min_notice_hours(),
            max_daily_sessions: default_max_daily_sessions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Student dashboard re-fetch interval.
    #[serde(default = "default_student_poll_secs")]
    pub student_poll_secs: u64,

    /// Tutor dashboard re-fetch interval.
    #[serde(default = "default_tutor_poll_secs")]
    pub tutor_poll_secs: u64,
}

fn default_student_poll_secs() -> u64 {
    30
}

fn default_tutor_poll_secs() -> u64 {
    60
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            student_poll_secs: default_student_poll_secs(),
            tutor_poll_secs: default_tutor_poll_secs(),
        }
    }
}

pub fn load_config(working_dir: Option<PathBuf>) -> Result<ClientConfig, ConfigError> {
    let wd = working_dir.unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    let mut config = ClientConfig::default();
    config.working_dir = wd.clone();

    // Try loading global config
    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("tutoria").join("config.json");
        if global_path.exists() {
            let content = std::fs::read_to_string(&global_path)
                .map_err(|e| ConfigError::File(e.to_string()))?;
            let file_config: ClientConfig = serde_json::from_str(&content)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            merge_config(&mut config, file_config);
        }
    }

    // Try loading local project config
    let local_path = wd.join("tutoria.json");
    if local_path.exists() {
        let content = std::fs::read_to_string(&local_path)
            .map_err(|e| ConfigError::File(e.to_string()))?;
        let file_config: ClientConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        merge_config(&mut config, file_config);
    }

    detect_base_url(&mut config);

    Ok(config)
}

fn merge_config(base: &mut ClientConfig, overlay: ClientConfig) {
    if overlay.base_url != default_base_url() {
        base.base_url = overlay.base_url;
    }
    if overlay.request_timeout_secs != default_request_timeout_secs() {
        base.request_timeout_secs = overlay.request_timeout_secs;
    }
    if overlay.rules.min_notice_hours != default_min_notice_hours() {
        base.rules.min_notice_hours = overlay.rules.min_notice_hours;
    }
    if overlay.rules.max_daily_sessions != default_max_daily_sessions() {
        base.rules.max_daily_sessions = overlay.rules.max_daily_sessions;
    }
    if overlay.sync.student_poll_secs != default_student_poll_secs() {
        base.sync.student_poll_secs = overlay.sync.student_poll_secs;
    }
    if overlay.sync.tutor_poll_secs != default_tutor_poll_secs() {
        base.sync.tutor_poll_secs = overlay.sync.tutor_poll_secs;
    }
    if overlay.data_dir != default_data_dir() {
        base.data_dir = overlay.data_dir;
    }
    if overlay.debug {
        base.debug = true;
    }
}

fn detect_base_url(config: &mut ClientConfig) {
    if let Ok(url) = std::env::var("TUTORIA_BASE_URL") {
        if !url.is_empty() {
            config.base_url = url;
        }
    }
}

impl ClientConfig {
    pub fn data_path(&self) -> PathBuf {
        self.working_dir.join(&self.data_dir)
    }
}
