use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CogflareConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub atomspace: AtomSpaceConfig,
    pub scheduler: SchedulerConfig,
    pub reasoning: ReasoningConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory; instances live under `atomspace/` and `mindagent/`.
    pub data_dir: String,
    /// Keep every instance in memory (nothing survives a restart).
    pub in_memory: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AtomSpaceConfig {
    pub default_instance: String,
    /// Reject truth values outside `[0, 1]` instead of storing them as given.
    pub strict_truth_values: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SchedulerConfig {
    pub default_instance: String,
    /// The atomspace instance that agent behaviors read and mutate.
    pub atomspace_instance: String,
    /// Start the timer loop as soon as an instance is activated.
    pub autostart: bool,
    /// Pause between an emptied queue and the next replenish pass.
    pub rescan_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReasoningConfig {
    /// `"none"` or `"openai"` (any OpenAI-compatible chat completions endpoint).
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub system_prompt: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8787,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_cogflare_dir().to_string_lossy().into_owned(),
            in_memory: false,
        }
    }
}

impl Default for AtomSpaceConfig {
    fn default() -> Self {
        Self {
            default_instance: "primary".into(),
            strict_truth_values: true,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_instance: "primary".into(),
            atomspace_instance: "primary".into(),
            autostart: true,
            rescan_interval_ms: 1000,
        }
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            provider: "none".into(),
            endpoint: "https://api.openai.com/v1/chat/completions".into(),
            model: "gpt-4o-mini".into(),
            api_key_env: "COGFLARE_AI_API_KEY".into(),
            timeout_secs: 60,
            system_prompt: "You are a cognitive reasoning engine. Analyze the query in the \
                            context of a cognitive architecture and provide insights."
                .into(),
        }
    }
}

/// Returns `~/.cogflare/`, or `./.cogflare/` when no home directory is known.
pub fn default_cogflare_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cogflare")
}

/// Returns the default config file path: `~/.cogflare/config.toml`
pub fn default_config_path() -> PathBuf {
    default_cogflare_dir().join("config.toml")
}

impl CogflareConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            CogflareConfig::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// A config that keeps every instance in memory. Used by tests and `--ephemeral` runs.
    pub fn ephemeral() -> Self {
        let mut config = Self::default();
        config.storage.in_memory = true;
        config
    }

    /// Apply environment variable overrides (COGFLARE_DATA_DIR, COGFLARE_HOST,
    /// COGFLARE_PORT, COGFLARE_LOG_LEVEL, COGFLARE_AI_ENDPOINT).
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("COGFLARE_DATA_DIR") {
            self.storage.data_dir = val;
        }
        if let Ok(val) = std::env::var("COGFLARE_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("COGFLARE_PORT") {
            self.server.port = val
                .parse()
                .with_context(|| format!("COGFLARE_PORT is not a port number: {val}"))?;
        }
        if let Ok(val) = std::env::var("COGFLARE_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("COGFLARE_AI_ENDPOINT") {
            self.reasoning.endpoint = val;
            if self.reasoning.provider == "none" {
                self.reasoning.provider = "openai".into();
            }
        }
        Ok(())
    }

    /// Resolve the data directory, expanding `~` if needed.
    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.data_dir)
    }

    /// Database file for a named atomspace instance.
    pub fn atomspace_db_path(&self, instance: &str) -> PathBuf {
        self.resolved_data_dir()
            .join("atomspace")
            .join(format!("{instance}.db"))
    }

    /// Database file for a named mind-agent instance.
    pub fn mindagent_db_path(&self, instance: &str) -> PathBuf {
        self.resolved_data_dir()
            .join("mindagent")
            .join(format!("{instance}.db"))
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
