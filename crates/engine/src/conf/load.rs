//! Load — config loading from file and environment variables.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::model::EngineConfig;

impl EngineConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("ENGINE_CONFIG_FILE")
            .unwrap_or_else(|_| "/etc/logsift/engine.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::debug!(
                "Config file not found at {}, using environment variables",
                config_path
            );
            Self::from_env()
        };

        // Environment variables override file config
        if let Some(v) = env_parse("ENGINE_SAMPLE_LINES") {
            config.detection_sample_lines = v;
        }
        if let Some(v) = env_parse("ENGINE_BOUND_SCAN_LINES") {
            config.max_bound_scan_lines = v;
        }
        if let Some(v) = env_parse("ENGINE_TAIL_READ_BYTES") {
            config.tail_read_bytes = v;
        }
        if let Some(v) = env_parse("ENGINE_DEFAULT_BIN_COUNT") {
            config.default_bin_count = v;
        }
        if let Some(v) = env_parse("ENGINE_MIN_MATCH_COUNT") {
            config.min_match_count = v;
        }
        if let Some(v) = env_parse("ENGINE_MIN_CONFIDENCE") {
            config.min_confidence = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: EngineConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            detection_sample_lines: env_parse("ENGINE_SAMPLE_LINES")
                .unwrap_or(defaults.detection_sample_lines),
            max_bound_scan_lines: env_parse("ENGINE_BOUND_SCAN_LINES")
                .unwrap_or(defaults.max_bound_scan_lines),
            tail_read_bytes: env_parse("ENGINE_TAIL_READ_BYTES")
                .unwrap_or(defaults.tail_read_bytes),
            default_bin_count: env_parse("ENGINE_DEFAULT_BIN_COUNT")
                .unwrap_or(defaults.default_bin_count),
            min_match_count: env_parse("ENGINE_MIN_MATCH_COUNT")
                .unwrap_or(defaults.min_match_count),
            min_confidence: env_parse("ENGINE_MIN_CONFIDENCE")
                .unwrap_or(defaults.min_confidence),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
