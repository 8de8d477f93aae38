use std::env;

use anyhow::Context;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// HMAC secret shared with the identity service that issues bearer tokens.
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            host: env::var("APP_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: match env::var("APP_PORT") {
                Ok(raw) => raw
                    .parse()
                    .with_context(|| format!("APP_PORT is not a port number: {raw}"))?,
                Err(_) => DEFAULT_PORT,
            },
        })
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .with_context(|| format!("{name} is not set"))
}
