use ::config::{Config, Environment};

use crate::board::FailurePolicy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Remote Task API base URL. `None` runs the bridge against the
    /// in-memory demo backend.
    pub task_api_url: Option<String>,
    pub task_api_token: Option<String>,
    pub port: u16,
    pub environment: String,
    pub frontend_urls: Vec<String>,
    pub per_page: u32,
    pub failure_policy: FailurePolicy,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidFormat(String),
    Source(::config::ConfigError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            ConfigError::Source(err) => write!(f, "Configuration error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<::config::ConfigError> for ConfigError {
    fn from(err: ::config::ConfigError) -> Self {
        ConfigError::Source(err)
    }
}

const MAX_PER_PAGE: u32 = 100;

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let settings = Self::defaults()?
            .add_source(Environment::default())
            .build()?;

        Self::from_settings(&settings)
    }

    fn defaults() -> Result<::config::ConfigBuilder<::config::builder::DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("server_port", "8080")?
            .set_default("environment", "development")?
            .set_default("cors_allowed_origins", "http://localhost:3000")?
            .set_default("board_per_page", "10")?
            .set_default("board_failure_policy", "keep")?)
    }

    fn from_settings(settings: &Config) -> Result<Self, ConfigError> {
        let task_api_url = optional(settings, "task_api_url");
        let task_api_token = optional(settings, "task_api_token");
        let environment = settings.get_string("environment")?;

        let port = settings
            .get_string("server_port")?
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidFormat("SERVER_PORT must be a valid port number".to_string()))?;

        let per_page = settings
            .get_string("board_per_page")?
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| (1..=MAX_PER_PAGE).contains(n))
            .ok_or_else(|| {
                ConfigError::InvalidFormat(format!("BOARD_PER_PAGE must be between 1 and {}", MAX_PER_PAGE))
            })?;

        let failure_policy = parse_failure_policy(&settings.get_string("board_failure_policy")?)?;

        // Parse allowed origins
        let frontend_urls = settings
            .get_string("cors_allowed_origins")?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(AppConfig {
            task_api_url,
            task_api_token,
            port,
            environment,
            frontend_urls,
            per_page,
            failure_policy,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn optional(settings: &Config, key: &str) -> Option<String> {
    settings
        .get_string(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_failure_policy(raw: &str) -> Result<FailurePolicy, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "keep" | "keep_optimistic" => Ok(FailurePolicy::KeepOptimistic),
        "rollback" => Ok(FailurePolicy::Rollback),
        other => Err(ConfigError::InvalidFormat(format!(
            "BOARD_FAILURE_POLICY must be 'keep' or 'rollback', got '{}'",
            other
        ))),
    }
}
