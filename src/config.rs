use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for the CourseForge segment orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Orchestration behavior settings
    pub orchestrator: OrchestratorConfig,

    /// Course/segment store settings
    pub store: StoreConfig,

    /// Segment generator settings
    pub generator: GeneratorConfig,

    /// HTTP server settings
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Seconds a segment may sit in `processing` before the reaper
    /// demotes it to `failed`
    pub stuck_timeout_seconds: u64,

    /// Question budget passed to the generator per segment
    pub max_questions_per_segment: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the hosted course/segment store API
    pub base_url: String,

    /// API key for the store (sent as a bearer token)
    pub api_key: Option<String>,

    /// Request timeout for store calls (seconds)
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Endpoint of the segment-generation service
    pub endpoint: String,

    /// API key for the generator (sent as a bearer token)
    pub api_key: Option<String>,

    /// Request timeout for dispatch calls (seconds)
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port for the HTTP API
    pub port: u16,

    /// Allow cross-origin requests (the web UI polls this service directly)
    pub enable_cors: bool,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        // Try to load from various locations
        let config_paths = [
            "courseforge.toml",
            "config/courseforge.toml",
            "~/.config/courseforge/config.toml",
            "/etc/courseforge/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        // Try environment variables
        if let Ok(config) = Self::from_env() {
            return Ok(config);
        }

        Err(anyhow!("No configuration file found"))
    }

    /// Load configuration from an explicit file path
    pub fn load_from(path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;
        let config = toml::from_str(&config_str)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;
        tracing::info!("📄 Loaded configuration from: {}", path);
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("COURSEFORGE_STORE_URL") {
            config.store.base_url = base_url;
        }

        if let Ok(api_key) = std::env::var("COURSEFORGE_STORE_API_KEY") {
            config.store.api_key = Some(api_key);
        }

        if let Ok(endpoint) = std::env::var("COURSEFORGE_GENERATOR_URL") {
            config.generator.endpoint = endpoint;
        }

        if let Ok(api_key) = std::env::var("COURSEFORGE_GENERATOR_API_KEY") {
            config.generator.api_key = Some(api_key);
        }

        if let Ok(port) = std::env::var("COURSEFORGE_PORT") {
            config.server.port = port.parse().unwrap_or(config.server.port);
        }

        if let Ok(timeout) = std::env::var("COURSEFORGE_STUCK_TIMEOUT_SECONDS") {
            config.orchestrator.stuck_timeout_seconds = timeout
                .parse()
                .unwrap_or(config.orchestrator.stuck_timeout_seconds);
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.orchestrator.stuck_timeout_seconds == 0 {
            return Err(anyhow!("stuck_timeout_seconds must be greater than 0"));
        }

        if self.orchestrator.max_questions_per_segment == 0 {
            return Err(anyhow!("max_questions_per_segment must be greater than 0"));
        }

        Url::parse(&self.store.base_url)
            .map_err(|e| anyhow!("store.base_url is not a valid URL: {}", e))?;

        Url::parse(&self.generator.endpoint)
            .map_err(|e| anyhow!("generator.endpoint is not a valid URL: {}", e))?;

        if self.store.timeout_seconds == 0 || self.generator.timeout_seconds == 0 {
            return Err(anyhow!("collaborator timeouts must be greater than 0"));
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "CourseForge Orchestrator Configuration:\n\
            - Stuck Timeout: {}s\n\
            - Questions Per Segment: {}\n\
            - Store: {}\n\
            - Generator: {}\n\
            - Server Port: {}\n\
            - CORS Enabled: {}",
            self.orchestrator.stuck_timeout_seconds,
            self.orchestrator.max_questions_per_segment,
            self.store.base_url,
            self.generator.endpoint,
            self.server.port,
            self.server.enable_cors
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            orchestrator: OrchestratorConfig {
                stuck_timeout_seconds: 300, // 5 minutes
                max_questions_per_segment: 5,
            },
            store: StoreConfig {
                base_url: "http://localhost:8000/api/v1".to_string(),
                api_key: None,
                timeout_seconds: 30,
            },
            generator: GeneratorConfig {
                endpoint: "http://localhost:8001/api/generate-segment".to_string(),
                api_key: None,
                timeout_seconds: 60,
            },
            server: ServerConfig {
                port: 8090,
                enable_cors: true,
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_stuck_timeout(mut self, seconds: u64) -> Self {
        self.config.orchestrator.stuck_timeout_seconds = seconds;
        self
    }

    pub fn with_max_questions(mut self, max_questions: u32) -> Self {
        self.config.orchestrator.max_questions_per_segment = max_questions;
        self
    }

    pub fn with_store_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.store.base_url = base_url.into();
        self
    }

    pub fn with_generator_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.generator.endpoint = endpoint.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.orchestrator.stuck_timeout_seconds, 300);
        assert_eq!(config.orchestrator.max_questions_per_segment, 5);
        assert!(config.server.enable_cors);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_stuck_timeout(120)
            .with_max_questions(10)
            .with_port(9000)
            .build();

        assert_eq!(config.orchestrator.stuck_timeout_seconds, 120);
        assert_eq!(config.orchestrator.max_questions_per_segment, 10);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        let zero_timeout = ConfigBuilder::new().with_stuck_timeout(0).build();
        assert!(zero_timeout.validate().is_err());

        let bad_url = ConfigBuilder::new().with_store_url("not a url").build();
        assert!(bad_url.validate().is_err());
    }

    #[test]
    fn test_config_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courseforge.toml");
        let path_str = path.to_str().unwrap();

        let config = ConfigBuilder::new().with_stuck_timeout(600).build();
        config.save(path_str).unwrap();

        let loaded = Config::load_from(path_str).unwrap();
        assert_eq!(loaded.orchestrator.stuck_timeout_seconds, 600);
    }

    #[test]
    fn test_load_from_missing_file_errors() {
        assert!(Config::load_from("/nonexistent/courseforge.toml").is_err());
    }
}
