//! Process configuration loaded from environment variables.
//!
//! Credentials are read once at startup and never mutated afterwards; every
//! component that needs a setting gets a clone of this struct.

use serde::{Deserialize, Serialize};
use tracing::warn;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Azure OpenAI
    pub azure_openai_endpoint: String,
    pub azure_openai_api_key: String,
    pub azure_openai_deployment_name: String,
    pub azure_openai_api_version: String,

    // Warehouse (Snowflake SQL REST API)
    pub snowflake_account: String,
    pub snowflake_user: String,
    pub snowflake_token: String,
    pub snowflake_warehouse: String,
    pub snowflake_database: String,
    pub snowflake_schema: String,

    // Invoice collaborator service
    pub invoice_api_base: String,

    // HTTP server
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            azure_openai_endpoint: env_or("AZURE_OPENAI_ENDPOINT", ""),
            azure_openai_api_key: env_or("AZURE_OPENAI_API_KEY", ""),
            azure_openai_deployment_name: env_or("AZURE_OPENAI_DEPLOYMENT_NAME", "gpt-4o"),
            azure_openai_api_version: env_or("AZURE_OPENAI_API_VERSION", "2024-12-01-preview"),
            snowflake_account: env_or("SNOWFLAKE_ACCOUNT", ""),
            snowflake_user: env_or("SNOWFLAKE_USER", ""),
            snowflake_token: env_or("SNOWFLAKE_TOKEN", ""),
            snowflake_warehouse: env_or("SNOWFLAKE_WAREHOUSE", ""),
            snowflake_database: env_or("SNOWFLAKE_DATABASE", "financial_demo"),
            snowflake_schema: env_or("SNOWFLAKE_SCHEMA", "public"),
            invoice_api_base: env_or("INVOICE_API_BASE", "http://localhost:5000"),
            host: env_or("HOST", "0.0.0.0"),
            port: env_or("PORT", "8000").parse().unwrap_or(8000),
        }
    }

    /// Log warnings for missing credentials. The process still starts so the
    /// classifier and mocked endpoints stay usable without backends.
    pub fn warn_on_missing_credentials(&self) {
        if self.azure_openai_endpoint.is_empty() || self.azure_openai_api_key.is_empty() {
            warn!("No Azure OpenAI credentials found; completion calls will fail");
            warn!("Set AZURE_OPENAI_ENDPOINT and AZURE_OPENAI_API_KEY");
        }
        if self.snowflake_account.is_empty() || self.snowflake_token.is_empty() {
            warn!("No warehouse credentials found; SQL execution will fail");
            warn!("Set SNOWFLAKE_ACCOUNT, SNOWFLAKE_USER, SNOWFLAKE_TOKEN");
        }
    }

    pub fn has_openai_credentials(&self) -> bool {
        !self.azure_openai_endpoint.is_empty() && !self.azure_openai_api_key.is_empty()
    }

    pub fn has_warehouse_credentials(&self) -> bool {
        !self.snowflake_account.is_empty()
            && !self.snowflake_user.is_empty()
            && !self.snowflake_token.is_empty()
    }
}
