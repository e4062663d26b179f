// Configuration loading: defaults, then config.toml, then APP_* environment variables

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::models::Language;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_address: String,
    // Root of the dealership REST API (the /api/cars/* endpoints live under it)
    pub api_base_url: String,
    // Bearer token attached to every API request, if set
    pub api_token: Option<String>,
    pub proxy_url: Option<String>,
    pub language: Language,
    // How long identical API responses are served from memory
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let builder = Config::builder()
            .set_default("server_address", "127.0.0.1:3000")?
            .set_default("api_base_url", "http://localhost:3000")?
            .set_default("language", "mm")?
            .set_default("cache_ttl_secs", 60)?
            .set_default("request_timeout_secs", 10)?
            // Load from a configuration file (e.g., config.toml)
            .add_source(File::with_name("config").required(false))
            // Load from environment variables (e.g., APP_API_BASE_URL)
            .add_source(Environment::with_prefix("APP").try_parsing(true));

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
impl Settings {
    pub fn for_tests(api_base_url: &str) -> Self {
        Settings {
            server_address: "127.0.0.1:0".to_string(),
            api_base_url: api_base_url.to_string(),
            api_token: None,
            proxy_url: None,
            language: Language::En,
            cache_ttl_secs: 60,
            request_timeout_secs: 5,
        }
    }
}
