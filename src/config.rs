use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub review: ReviewConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` for console output, `json` for structured logs
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReviewConfig {
    /// Exit with an error when the plan still has pending or manual conflicts
    #[serde(default)]
    pub fail_on_unresolved: bool,
    /// Scale substituted quantities by the rule ratio in the resolved plan
    #[serde(default = "default_apply_quantity_ratio")]
    pub apply_quantity_ratio: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            fail_on_unresolved: false,
            apply_quantity_ratio: default_apply_quantity_ratio(),
        }
    }
}

fn default_apply_quantity_ratio() -> bool {
    true
}

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (COACHPLAN__LOGGING__LEVEL, etc.)
    /// 2. Config file specified by path, COACHPLAN_CONFIG, or config/default.toml
    /// 3. Hardcoded defaults
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder()
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            .set_default("review.fail_on_unresolved", false)?
            .set_default("review.apply_quantity_ratio", default_apply_quantity_ratio())?;

        let explicit = config_path.or_else(|| env::var("COACHPLAN_CONFIG").ok());

        match explicit {
            // An explicitly requested file must exist
            Some(path) => builder = builder.add_source(File::with_name(&path)),
            None => {
                if std::path::Path::new("config/default.toml").exists() {
                    builder = builder.add_source(File::with_name("config/default.toml"));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("COACHPLAN")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.logging.level.trim().is_empty() {
            return Err("Log level must not be empty".to_string());
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(format!(
                "Unknown log format '{}', expected 'pretty' or 'json'",
                self.logging.format
            ));
        }
        Ok(())
    }
}
