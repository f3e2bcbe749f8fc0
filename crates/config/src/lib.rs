use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "chatsync.toml",
    "config/chatsync.toml",
    "crates/config/chatsync.toml",
    "../chatsync.toml",
    "../config/chatsync.toml",
    "../crates/config/chatsync.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Tuning for the real-time synchronization loop.
///
/// ```
/// use chatsync_config::RealtimeConfig;
///
/// let realtime = RealtimeConfig::default();
/// assert_eq!(realtime.typing_ttl_ms, 5_000);
/// assert_eq!(realtime.typing_ttl().as_secs(), 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// How long a typing indicator survives without a refresh.
    #[serde(default = "RealtimeConfig::default_typing_ttl")]
    pub typing_ttl_ms: u64,
    #[serde(default = "RealtimeConfig::default_sweep_interval")]
    pub sweep_interval_ms: u64,
    /// Capacity of the inbound frame queue between transport and session.
    #[serde(default = "RealtimeConfig::default_frame_buffer")]
    pub frame_buffer: usize,
}

impl RealtimeConfig {
    const fn default_typing_ttl() -> u64 {
        5_000
    }

    const fn default_sweep_interval() -> u64 {
        1_000
    }

    const fn default_frame_buffer() -> usize {
        256
    }

    pub fn typing_ttl(&self) -> Duration {
        Duration::from_millis(self.typing_ttl_ms)
    }

    /// Sweep period, never shorter than one millisecond.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            typing_ttl_ms: Self::default_typing_ttl(),
            sweep_interval_ms: Self::default_sweep_interval(),
            frame_buffer: Self::default_frame_buffer(),
        }
    }
}

/// Settings for the REST collaborator used to fetch the conversation baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "ApiConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ApiConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "ApiConfig::default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub token: Option<String>,
}

impl ApiConfig {
    fn default_base_url() -> String {
        "http://127.0.0.1:5001/api".to_string()
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    const fn default_page_size() -> u32 {
        50
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            request_timeout_seconds: Self::default_request_timeout(),
            page_size: Self::default_page_size(),
            token: None,
        }
    }
}

fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Load the client configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use chatsync_config::load;
///
/// std::env::remove_var("CHATSYNC_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.api.base_url.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default(
            "realtime.typing_ttl_ms",
            clamp_to_i64(defaults.realtime.typing_ttl_ms),
        )
        .context("invalid default for realtime.typing_ttl_ms")?
        .set_default(
            "realtime.sweep_interval_ms",
            clamp_to_i64(defaults.realtime.sweep_interval_ms),
        )
        .context("invalid default for realtime.sweep_interval_ms")?
        .set_default(
            "realtime.frame_buffer",
            clamp_to_i64(defaults.realtime.frame_buffer as u64),
        )
        .context("invalid default for realtime.frame_buffer")?
        .set_default("api.base_url", defaults.api.base_url.clone())
        .context("invalid default for api.base_url")?
        .set_default(
            "api.request_timeout_seconds",
            clamp_to_i64(defaults.api.request_timeout_seconds),
        )
        .context("invalid default for api.request_timeout_seconds")?
        .set_default("api.page_size", i64::from(defaults.api.page_size))
        .context("invalid default for api.page_size")?;

    let environment_overrides = config::Environment::with_prefix("CHATSYNC").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("CHATSYNC_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via CHATSYNC_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.realtime.frame_buffer == 0 {
        config.realtime.frame_buffer = 1;
    }

    debug!(?config, "loaded client configuration");
    Ok(config)
}
