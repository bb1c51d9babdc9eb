use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::ConfigError;

pub const DEFAULT_TOPIC: &str = "plant-based milk in North America";
pub const DEFAULT_STARTUP_TOPIC: &str = "M-Pesa ecosystem analysis, market expansion, competition from Airtel Money, T-Kash, and international players in Kenya";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Where log output goes. Loki shipping needs the `loki` cargo feature.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: String,
    /// Loki push endpoint; `None` keeps logging on the console only
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,tower_http=info".to_string(),
            loki_url: None,
            service_name: "market-intel".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Settings for the Gemini client
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub static_dir: PathBuf,
    pub default_topic: String,
    /// Topic warmed in the background once the listener is up; `None` skips it
    pub startup_topic: Option<String>,
    /// 6-field cron expression (sec min hour day month weekday)
    pub refresh_schedule: Option<String>,
    pub refresh_topic: String,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_var("PORT", 3000)?;
        let bind_addr = parse_var("BIND_ADDR", IpAddr::from([0, 0, 0, 0]))?;
        let timeout_secs = parse_var("LLM_TIMEOUT_SECS", 120)?;
        let startup_fetch = parse_var("STARTUP_FETCH", true)?;
        let loki_enabled = parse_var("LOKI_ENABLED", false)?;

        let api_key = non_empty_var("GOOGLE_GENERATIVE_AI_API_KEY")
            .or_else(|| non_empty_var("GEMINI_API_KEY"));

        let startup_topic = non_empty_var("STARTUP_TOPIC")
            .unwrap_or_else(|| DEFAULT_STARTUP_TOPIC.to_string());

        let config = Self {
            bind_addr,
            port,
            static_dir: non_empty_var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            default_topic: non_empty_var("DEFAULT_TOPIC")
                .unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
            refresh_schedule: non_empty_var("REFRESH_SCHEDULE"),
            refresh_topic: non_empty_var("REFRESH_TOPIC")
                .unwrap_or_else(|| startup_topic.clone()),
            startup_topic: startup_fetch.then_some(startup_topic),
            llm: LlmConfig {
                api_key,
                model: non_empty_var("GEMINI_MODEL")
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: non_empty_var("GEMINI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
                timeout_secs,
            },
            logging: LoggingConfig {
                filter: non_empty_var("RUST_LOG")
                    .unwrap_or_else(|| LoggingConfig::default().filter),
                loki_url: if loki_enabled {
                    Some(non_empty_var("LOKI_URL").ok_or(ConfigError::Invalid {
                        name: "LOKI_URL",
                        value: "<unset> while LOKI_ENABLED=true".to_string(),
                    })?)
                } else {
                    None
                },
                service_name: non_empty_var("SERVICE_NAME")
                    .unwrap_or_else(|| LoggingConfig::default().service_name),
                environment: non_empty_var("ENVIRONMENT")
                    .unwrap_or_else(|| LoggingConfig::default().environment),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "LLM_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        if let Some(schedule) = &self.refresh_schedule {
            // tokio-cron-scheduler wants seconds as the first field
            if schedule.split_whitespace().count() < 6 {
                return Err(ConfigError::Invalid {
                    name: "REFRESH_SCHEDULE",
                    value: schedule.clone(),
                });
            }
        }
        if let Some(loki_url) = &self.logging.loki_url {
            if url::Url::parse(loki_url).is_err() {
                return Err(ConfigError::Invalid {
                    name: "LOKI_URL",
                    value: loki_url.clone(),
                });
            }
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(name) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}
