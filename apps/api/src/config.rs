use anyhow::{Context, Result};

use crate::llm_client::Model;
use crate::templates::migration::SchemaGeneration;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Which template schema generation is canonical for this deployment.
    pub template_generation: SchemaGeneration,
    /// Seed missing templates from the bundled defaults at boot.
    pub init_templates_on_startup: bool,
    pub default_model: Model,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            anthropic_api_key: require("ANTHROPIC_API_KEY")?,
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            template_generation: lookup("TEMPLATE_GENERATION")
                .map(|v| v.parse::<SchemaGeneration>())
                .transpose()
                .map_err(anyhow::Error::msg)
                .context("TEMPLATE_GENERATION is invalid")?
                .unwrap_or_default(),
            init_templates_on_startup: lookup("INIT_TEMPLATES_ON_STARTUP")
                .map(|v| parse_bool(&v))
                .transpose()
                .context("INIT_TEMPLATES_ON_STARTUP must be true or false")?
                .unwrap_or(true),
            default_model: lookup("DEFAULT_MODEL")
                .map(|v| v.parse::<Model>())
                .transpose()
                .map_err(anyhow::Error::msg)
                .context("DEFAULT_MODEL is invalid")?
                .unwrap_or_default(),
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("'{other}' is not a boolean"),
    }
}
