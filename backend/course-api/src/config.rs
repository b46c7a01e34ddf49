use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mongo_uri: String,
    pub mongo_database: String,
    pub bind_addr: String,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
const DEFAULT_MONGO_DATABASE: &str = "inculearn";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8081";
const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 4000;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Local .env is optional; real deployments inject env vars directly
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Self::from_settings(&settings)
    }

    fn from_settings(settings: &config::Config) -> Result<Self, config::ConfigError> {
        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI").or_else(|_| env::var("MONGODB_URI")))
            .unwrap_or_else(|_| DEFAULT_MONGO_URI.to_string());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| DEFAULT_MONGO_DATABASE.to_string());

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let api_key = settings
            .get_string("llm.api_key")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .map_err(|_| config::ConfigError::NotFound("llm.api_key (OPENAI_API_KEY)".into()))?;

        let base_url = settings
            .get_string("llm.base_url")
            .or_else(|_| env::var("OPENAI_BASE_URL"))
            .unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.to_string());

        let model = settings
            .get_string("llm.model")
            .or_else(|_| env::var("OPENAI_MODEL"))
            .unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string());

        let max_tokens = settings
            .get_int("llm.max_tokens")
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let temperature = settings
            .get_float("llm.temperature")
            .map(|v| v as f32)
            .unwrap_or(DEFAULT_TEMPERATURE);

        let timeout_secs = settings
            .get_int("llm.timeout_secs")
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS);

        Ok(Config {
            mongo_uri,
            mongo_database,
            bind_addr,
            llm: LlmConfig {
                api_key,
                base_url: base_url.trim_end_matches('/').to_string(),
                model,
                max_tokens,
                temperature,
                timeout_secs,
            },
        })
    }
}
