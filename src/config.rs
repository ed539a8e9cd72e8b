use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for lifecycle-hooks
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// How command identifiers are minted
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or `EnvFilter` directives
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Namespace segment of every command id
    pub namespace: String,
    /// Scope segment of every command id
    pub scope: String,
    /// Optional version suffix
    pub version: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            namespace: "lifecycle".to_string(),
            scope: "default".to_string(),
            version: None,
        }
    }
}

impl LifecycleConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (lifecycle-hooks.toml)
    /// 3. Environment variables (prefixed with LIFECYCLE_HOOKS_)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("lifecycle-hooks.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        // Override with environment variables, e.g. LIFECYCLE_HOOKS_IDENTITY__NAMESPACE
        builder = builder.add_source(
            Environment::with_prefix("LIFECYCLE_HOOKS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<LifecycleConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = LifecycleConfig::load_env_file();
        LifecycleConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static LifecycleConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<&'static LifecycleConfig> {
    let config = config()?;
    tracing::debug!("Configuration loaded successfully");
    Ok(config)
}
