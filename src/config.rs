//! Configuration for callqa.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CALLQA_API_URL, CALLQA_DEMO_DATA)
//! 2. Config file (.callqa/config.yaml)
//! 3. Defaults (local backend on port 8000, dashboard polling budgets)
//!
//! Config file discovery:
//! - Searches current directory and parents for .callqa/config.yaml
//! - Paths in config file are relative to the project root (parent of .callqa/)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::{PollPolicy, PollProfile};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub api: Option<ApiConfig>,
    #[serde(default)]
    pub polling: Option<PollingConfig>,
    #[serde(default)]
    pub demo: Option<DemoConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub interval_ms: Option<u64>,
    pub not_found_retry_budget: Option<u32>,
    #[serde(default)]
    pub profiles: ProfilesConfig,
}

/// Max attempts per call site
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilesConfig {
    pub live: Option<u32>,
    pub upload: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    /// Demo catalog file (relative to project root)
    pub data_file: Option<String>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Analysis service settings
    pub api: ApiSettings,
    /// Polling budgets
    pub polling: PollingSettings,
    /// Demo catalog file, if any
    pub demo_data: Option<PathBuf>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub request_timeout_seconds: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingSettings {
    pub interval_ms: u64,
    pub not_found_retry_budget: u32,
    pub live_max_attempts: u32,
    pub upload_max_attempts: u32,
}

impl Default for PollingSettings {
    fn default() -> Self {
        let live = PollPolicy::live();
        let upload = PollPolicy::upload();
        Self {
            interval_ms: live.poll_interval_ms,
            not_found_retry_budget: live.not_found_retry_budget,
            live_max_attempts: live.max_attempts,
            upload_max_attempts: upload.max_attempts,
        }
    }
}

impl PollingSettings {
    /// Poll policy for a call site
    pub fn policy(&self, profile: PollProfile) -> PollPolicy {
        let max_attempts = match profile {
            PollProfile::Live => self.live_max_attempts,
            PollProfile::Upload => self.upload_max_attempts,
        };

        PollPolicy {
            poll_interval_ms: self.interval_ms,
            max_attempts,
            not_found_retry_budget: self.not_found_retry_budget,
        }
    }
}

impl ResolvedConfig {
    /// Poll policy for a call site
    pub fn policy(&self, profile: PollProfile) -> PollPolicy {
        self.polling.policy(profile)
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".callqa").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge a parsed config file (if any) with environment overrides
fn resolve(
    file: Option<(&Path, ConfigFile)>,
    env_api_url: Option<String>,
    env_demo_data: Option<String>,
) -> ResolvedConfig {
    let mut api = ApiSettings::default();
    let mut polling = PollingSettings::default();
    let mut demo_data = None;
    let mut config_file = None;

    if let Some((config_path, config)) = file {
        // Base directory is the parent of .callqa/
        let base_dir = config_path
            .parent()
            .and_then(|p| p.parent())
            .unwrap_or(Path::new("."));

        if let Some(section) = config.api {
            if let Some(url) = section.base_url {
                api.base_url = url;
            }
            if let Some(timeout) = section.request_timeout_seconds {
                api.request_timeout_seconds = timeout;
            }
        }

        if let Some(section) = config.polling {
            polling.interval_ms = section.interval_ms.unwrap_or(polling.interval_ms);
            polling.not_found_retry_budget = section
                .not_found_retry_budget
                .unwrap_or(polling.not_found_retry_budget);
            polling.live_max_attempts = section.profiles.live.unwrap_or(polling.live_max_attempts);
            polling.upload_max_attempts = section
                .profiles
                .upload
                .unwrap_or(polling.upload_max_attempts);
        }

        demo_data = config
            .demo
            .and_then(|d| d.data_file)
            .map(|file| resolve_path(base_dir, &file));

        config_file = Some(config_path.to_path_buf());
    }

    if let Some(url) = env_api_url.filter(|u| !u.trim().is_empty()) {
        api.base_url = url;
    }
    if let Some(path) = env_demo_data.filter(|p| !p.trim().is_empty()) {
        demo_data = Some(PathBuf::from(path));
    }

    ResolvedConfig {
        api,
        polling,
        demo_data,
        config_file,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_path = find_config_file();

    let parsed = match config_path {
        Some(ref path) => Some((path.as_path(), load_config_file(path)?)),
        None => None,
    };

    Ok(resolve(
        parsed,
        std::env::var("CALLQA_API_URL").ok(),
        std::env::var("CALLQA_DEMO_DATA").ok(),
    ))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
